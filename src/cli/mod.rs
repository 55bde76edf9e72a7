//! CLI argument definitions and parsing.

pub mod types;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use types::{LeagueId, Season, SeasonType, Sport, Week};

/// Arguments that decide which endpoints the jobs read.
#[derive(Debug, Clone, Args)]
pub struct JobArgs {
    /// League ID (or set `SLEEPER_LEAGUE_ID` env var).
    #[clap(long, short)]
    pub league_id: Option<LeagueId>,

    /// Sport segment of the Sleeper endpoints.
    #[clap(long, default_value_t = Sport::default())]
    pub sport: Sport,

    /// Season type used by the statistics endpoints (`regular`, `post`, `pre`).
    #[clap(long, default_value_t = SeasonType::default())]
    pub season_type: SeasonType,

    /// Season year used by the statistics endpoints.
    #[clap(long, default_value_t = Season::default())]
    pub stats_season: Season,

    /// Week whose matchups are synchronized.
    #[clap(long, short = 'w', default_value_t = Week::default())]
    pub matchup_week: Week,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one synchronization pass from the Sleeper API into the local store.
    ///
    /// Every table is upserted by its natural key, so the command is safe to
    /// re-run. Ctrl-C cancels jobs that have not finished fetching.
    Sync {
        #[clap(flatten)]
        jobs: JobArgs,

        /// Sleeper username (or set `SLEEPER_USERNAME` env var).
        #[clap(long, short)]
        username: Option<String>,

        /// SQLite database file (or set `SLEEPER_SYNC_DATABASE` env var).
        #[clap(long, short)]
        database: Option<PathBuf>,

        /// Maximum number of jobs in flight.
        #[clap(long, short, default_value_t = 4)]
        concurrency: usize,

        /// Sleeper API base URL.
        #[clap(long, default_value = crate::sleeper::SLEEPER_BASE_URL)]
        base_url: String,

        /// Per-request timeout in seconds.
        #[clap(long, default_value_t = 30)]
        timeout_secs: u64,

        /// Attempts per request, including the first (1 disables retries).
        #[clap(long, default_value_t = 3)]
        max_attempts: u32,

        /// Fetch and transform everything, but write nothing.
        #[clap(long)]
        dry_run: bool,
    },

    /// Print the resolved job order with prerequisites, tables and endpoints.
    Plan {
        #[clap(flatten)]
        jobs: JobArgs,
    },

    /// Print row counts for every synchronized table.
    Status {
        /// SQLite database file (or set `SLEEPER_SYNC_DATABASE` env var).
        #[clap(long, short)]
        database: Option<PathBuf>,
    },
}

#[derive(Debug, Parser)]
#[clap(
    name = "sleeper-sync",
    version,
    about = "Synchronize Sleeper fantasy league data into SQLite"
)]
pub struct SleeperSync {
    #[clap(subcommand)]
    pub command: Commands,
}
