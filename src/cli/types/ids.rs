//! ID types for Sleeper leagues.

use crate::error::{Result, SyncError};
use std::fmt;
use std::str::FromStr;

/// Type-safe wrapper for Sleeper League IDs.
///
/// Sleeper league ids are long numeric strings (they overflow `u32` and are
/// sent as JSON strings), so the id is kept as text and only checked for
/// being a single non-empty path segment.
///
/// # Examples
///
/// ```rust
/// use sleeper_sync::LeagueId;
///
/// let league_id: LeagueId = "1048271523413569536".parse().unwrap();
/// assert_eq!(league_id.as_str(), "1048271523413569536");
/// assert!("".parse::<LeagueId>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeagueId(String);

impl LeagueId {
    /// Create a new LeagueId, rejecting blank values and path separators.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() || trimmed.contains('/') || trimmed.contains(char::is_whitespace) {
            return Err(SyncError::InvalidLeagueId { value: id });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeagueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LeagueId {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
