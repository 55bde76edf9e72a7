//! Synchronization runs.
//!
//! A run resolves the job graph, then fetches, transforms and upserts every
//! job with bounded concurrency. A failing job never stops independent jobs;
//! its dependents are skipped. The outcome of every job is collected into a
//! [`RunReport`].

pub mod dag;
pub mod jobs;
pub mod orchestrator;

#[cfg(test)]
mod tests;

use tokio::sync::watch;
use tracing::info;

use crate::{
    cli::types::LeagueId,
    config::SyncConfig,
    error::Result,
    sleeper::{SleeperClient, Source},
    storage::{DryRun, LeagueDatabase, Sink},
};

pub use dag::{DagError, JobGraph};
pub use jobs::{Job, JobBoard, JobParams, JobState};
pub use orchestrator::Orchestrator;

/// Terminal state of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub job: Job,
    pub state: JobState,
}

/// Per-job results of a run, in topological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcomes: Vec<JobOutcome>,
}

impl RunReport {
    /// True when every job finished `Done`.
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.state.is_done())
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.state.is_done())
    }

    pub fn rows_written(&self) -> usize {
        self.outcomes
            .iter()
            .map(|outcome| match outcome.state {
                JobState::Done { rows } => rows,
                _ => 0,
            })
            .sum()
    }

    pub fn outcome(&self, job: Job) -> Option<&JobState> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.job == job)
            .map(|outcome| &outcome.state)
    }
}

/// Run one synchronization pass for `league_id`.
///
/// Configuration problems (invalid settings, a store that cannot be opened)
/// fail before any job runs. Everything after that is reported per job. Safe
/// to call repeatedly: every write is an upsert.
pub async fn run(
    league_id: LeagueId,
    username: Option<&str>,
    config: &SyncConfig,
    cancel: watch::Receiver<bool>,
) -> Result<RunReport> {
    config.validate()?;
    let client = SleeperClient::new(&config.base_url, config.timeout, config.retry)?;
    let params = config.job_params(league_id);

    info!(
        league_id = %params.league_id,
        username = username.unwrap_or("-"),
        base_url = %client.base_url(),
        dry_run = config.dry_run,
        "synchronizing league"
    );

    if config.dry_run {
        execute(client, DryRun::new(), params, config, cancel).await
    } else {
        let store = LeagueDatabase::open(&config.database)?;
        execute(client, store, params, config, cancel).await
    }
}

async fn execute<S: Source, K: Sink>(
    source: S,
    sink: K,
    params: JobParams,
    config: &SyncConfig,
    cancel: watch::Receiver<bool>,
) -> Result<RunReport> {
    let orchestrator =
        Orchestrator::new(source, sink, params)?.with_max_concurrency(config.max_concurrency);
    Ok(orchestrator.run(cancel).await)
}
