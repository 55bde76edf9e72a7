//! Run configuration and its resolution from flags, environment and defaults.

use std::path::PathBuf;
use std::time::Duration;

use dirs::cache_dir;

use crate::{
    cli::types::{LeagueId, Season, SeasonType, Sport, Week},
    error::{Result, SyncError},
    sleeper::{RetryPolicy, SLEEPER_BASE_URL},
    sync::{jobs::JobParams, orchestrator::DEFAULT_MAX_CONCURRENCY},
    DATABASE_ENV_VAR, LEAGUE_ID_ENV_VAR, USERNAME_ENV_VAR,
};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Load variables from a `.env` file in the working directory, if present.
pub fn load_dotenv() {
    dotenv::dotenv().ok();
}

/// Settings for one synchronization run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// SQLite database file.
    pub database: PathBuf,
    pub sport: Sport,
    pub season_type: SeasonType,
    pub stats_season: Season,
    pub matchup_week: Week,
    pub max_concurrency: usize,
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Transform everything but persist nothing.
    pub dry_run: bool,
}

impl SyncConfig {
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            sport: Sport::default(),
            season_type: SeasonType::default(),
            stats_season: Season::default(),
            matchup_week: Week::default(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            base_url: SLEEPER_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            dry_run: false,
        }
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(SyncError::configuration("concurrency must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(SyncError::configuration("max attempts must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(SyncError::configuration("timeout must be positive"));
        }
        let base_url = self.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(SyncError::configuration(format!(
                "base URL must be http or https, got {base_url:?}"
            )));
        }
        if self.database.as_os_str().is_empty() {
            return Err(SyncError::configuration("database path is empty"));
        }
        Ok(())
    }

    pub fn job_params(&self, league_id: LeagueId) -> JobParams {
        JobParams {
            league_id,
            sport: self.sport.clone(),
            season_type: self.season_type.clone(),
            stats_season: self.stats_season,
            matchup_week: self.matchup_week,
        }
    }
}

/// Resolve league ID from the flag or the environment variable.
pub fn resolve_league_id(league_id: Option<LeagueId>) -> Result<LeagueId> {
    league_id
        .or_else(|| {
            std::env::var(LEAGUE_ID_ENV_VAR)
                .ok()
                .and_then(|s| s.parse::<LeagueId>().ok())
        })
        .ok_or_else(|| SyncError::MissingLeagueId {
            env_var: LEAGUE_ID_ENV_VAR.to_string(),
        })
}

/// Resolve the optional username from the flag or the environment variable.
pub fn resolve_username(username: Option<String>) -> Option<String> {
    username
        .or_else(|| std::env::var(USERNAME_ENV_VAR).ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Resolve the database path from the flag, the environment variable, or the
/// per-user cache directory.
pub fn resolve_database_path(database: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = database.or_else(|| std::env::var_os(DATABASE_ENV_VAR).map(PathBuf::from)) {
        return Ok(path);
    }
    default_database_path()
}

/// `<cache dir>/sleeper-sync/league.db`
pub fn default_database_path() -> Result<PathBuf> {
    let cache_dir = cache_dir().ok_or_else(|| {
        SyncError::configuration(format!(
            "could not determine cache directory; pass --database or set {DATABASE_ENV_VAR}"
        ))
    })?;
    Ok(cache_dir.join("sleeper-sync").join("league.db"))
}
