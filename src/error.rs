//! Error types for the Sleeper synchronization pipeline

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;


/// Coarse classification used for job reports and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Upstream,
    SchemaMismatch,
    Persistence,
    Configuration,
    Cancelled,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Upstream => "upstream",
            ErrorKind::SchemaMismatch => "schema mismatch",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Sleeper API returned status {status} for {url}")]
    Upstream { url: String, status: u16 },

    #[error("{table}: expected {expected}, found {found}")]
    SchemaMismatch {
        table: &'static str,
        expected: String,
        found: String,
    },

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to persist rows into {table}: {source}")]
    Persistence {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store lane for {table} is unavailable (lock poisoned)")]
    StorePoisoned { table: &'static str },

    #[error("Store has no connection for {table}")]
    MissingLane { table: &'static str },

    #[error("League ID not provided and {env_var} environment variable not set")]
    MissingLeagueId { env_var: String },

    #[error("Invalid league ID: {value:?}")]
    InvalidLeagueId { value: String },

    #[error("Failed to parse number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Job graph error: {0}")]
    Graph(#[from] crate::sync::dag::DagError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Job {job} cannot move from {from} to {to}")]
    IllegalTransition {
        job: &'static str,
        from: &'static str,
        to: &'static str,
    },

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Run cancelled")]
    Cancelled,
}

impl SyncError {
    pub fn configuration(message: impl Into<String>) -> Self {
        SyncError::Configuration {
            message: message.into(),
        }
    }

    pub fn schema_mismatch(
        table: &'static str,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        SyncError::SchemaMismatch {
            table,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Transport { .. } => ErrorKind::Transport,
            SyncError::Upstream { .. } => ErrorKind::Upstream,
            SyncError::SchemaMismatch { .. } | SyncError::Json(_) => ErrorKind::SchemaMismatch,
            SyncError::Persistence { .. } | SyncError::Database(_) => ErrorKind::Persistence,
            SyncError::MissingLeagueId { .. }
            | SyncError::InvalidLeagueId { .. }
            | SyncError::InvalidNumber(_)
            | SyncError::Configuration { .. }
            | SyncError::Graph(_) => ErrorKind::Configuration,
            SyncError::Cancelled => ErrorKind::Cancelled,
            SyncError::StorePoisoned { .. }
            | SyncError::MissingLane { .. }
            | SyncError::IllegalTransition { .. }
            | SyncError::Io(_)
            | SyncError::Task(_) => ErrorKind::Internal,
        }
    }

    /// Transport failures, rate limiting and server-side errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { .. } => true,
            SyncError::Upstream { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }

    /// Configuration problems abort the whole run before any job executes.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}
