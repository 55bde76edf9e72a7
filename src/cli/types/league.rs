//! Sport and season-type selectors used in Sleeper endpoint paths.

use crate::error::{Result, SyncError};
use std::fmt;
use std::str::FromStr;

/// Sport segment of Sleeper endpoints (`nba`, `nfl`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sport(String);

impl Sport {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Sport {
    fn default() -> Self {
        Self("nba".to_string())
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Sport {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        path_segment(s, "sport").map(Self)
    }
}

/// Season type segment of the stats endpoints (`regular`, `post`, `pre`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeasonType(String);

impl SeasonType {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SeasonType {
    fn default() -> Self {
        Self("regular".to_string())
    }
}

impl fmt::Display for SeasonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SeasonType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        path_segment(s, "season type").map(Self)
    }
}

fn path_segment(raw: &str, what: &str) -> Result<String> {
    let value = raw.trim().to_ascii_lowercase();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SyncError::configuration(format!("invalid {what}: {raw:?}")));
    }
    Ok(value)
}
