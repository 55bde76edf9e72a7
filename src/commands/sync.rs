//! The `sync` command: one synchronization pass.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::watch;

use crate::{
    cli::JobArgs,
    config::{resolve_database_path, resolve_league_id, resolve_username, SyncConfig},
    sleeper::RetryPolicy,
    sync::{self, JobState, RunReport},
    Result,
};

/// Parameters for the sync command
#[derive(Debug, Clone)]
pub struct SyncParams {
    pub jobs: JobArgs,
    pub username: Option<String>,
    pub database: Option<PathBuf>,
    pub concurrency: usize,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub dry_run: bool,
}

impl SyncParams {
    fn into_config(self, database: PathBuf) -> SyncConfig {
        SyncConfig {
            database,
            sport: self.jobs.sport,
            season_type: self.jobs.season_type,
            stats_season: self.jobs.stats_season,
            matchup_week: self.jobs.matchup_week,
            max_concurrency: self.concurrency,
            base_url: self.base_url,
            timeout: Duration::from_secs(self.timeout_secs),
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                ..RetryPolicy::default()
            },
            dry_run: self.dry_run,
        }
    }
}

/// Handle the sync command and print a per-job summary.
pub async fn handle_sync(params: SyncParams, cancel: watch::Receiver<bool>) -> Result<RunReport> {
    let league_id = resolve_league_id(params.jobs.league_id.clone())?;
    let username = resolve_username(params.username.clone());
    let database = resolve_database_path(params.database.clone())?;
    let config = params.into_config(database);

    if config.dry_run {
        println!("Dry run for league {league_id}: nothing will be written");
    } else {
        println!(
            "Synchronizing league {league_id} into {}",
            config.database.display()
        );
    }

    let report = sync::run(league_id, username.as_deref(), &config, cancel).await?;
    for line in report_lines(&report) {
        println!("{line}");
    }
    Ok(report)
}

/// One line per job plus a closing summary.
pub fn report_lines(report: &RunReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .outcomes
        .iter()
        .map(|outcome| {
            let marker = match outcome.state {
                JobState::Done { .. } => "✓",
                JobState::Skipped { .. } => "-",
                _ => "✗",
            };
            format!("{marker} {:<26} {}", outcome.job.name(), outcome.state)
        })
        .collect();

    let failed = report.failures().count();
    lines.push(if failed == 0 {
        format!("All {} jobs done, {} rows written", report.outcomes.len(), report.rows_written())
    } else {
        format!(
            "{failed} of {} jobs did not finish, {} rows written",
            report.outcomes.len(),
            report.rows_written()
        )
    });
    lines
}
