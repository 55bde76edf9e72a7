//! Sleeper Fantasy League Sync Library
//!
//! Pulls league, roster, user, player, trending, statistics and matchup data
//! from the public Sleeper API and upserts it into a local SQLite store, one
//! table per entity.
//!
//! ## Architecture
//!
//! - **Source** ([`sleeper`]): fetches one endpoint as raw JSON, retrying
//!   transient failures
//! - **Transformer** ([`transform`]): maps a payload to flat, fixed-width rows
//!   using declarative table schemas
//! - **Sink** ([`storage`]): upserts rows by natural key inside one
//!   transaction per batch
//! - **Orchestrator** ([`sync`]): runs the nine jobs over a dependency graph
//!   with bounded concurrency and reports each job's outcome
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sleeper_sync::{config::SyncConfig, sync, LeagueId};
//!
//! # async fn example() -> sleeper_sync::Result<()> {
//! let config = SyncConfig::new("league.db");
//! let league_id = LeagueId::new("1048271523413569536")?;
//! let (_cancel, cancelled) = tokio::sync::watch::channel(false);
//!
//! let report = sync::run(league_id, None, &config, cancelled).await?;
//! println!("{} rows written", report.rows_written());
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Configuration
//!
//! Set your league ID to avoid passing it in every command:
//! ```bash
//! export SLEEPER_LEAGUE_ID=1048271523413569536
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod sleeper;
pub mod storage;
pub mod sync;
pub mod transform;

// Re-export commonly used types
pub use cli::types::{LeagueId, Season, SeasonType, Sport, Week};
pub use error::{ErrorKind, Result, SyncError};
pub use sync::{Job, JobState, RunReport};
pub use transform::{Row, Table, TransformContext};

pub const LEAGUE_ID_ENV_VAR: &str = "SLEEPER_LEAGUE_ID";
pub const USERNAME_ENV_VAR: &str = "SLEEPER_USERNAME";
pub const DATABASE_ENV_VAR: &str = "SLEEPER_SYNC_DATABASE";
