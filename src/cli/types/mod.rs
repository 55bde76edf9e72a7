//! Type-safe wrappers for Sleeper identifiers and endpoint selectors.

pub mod ids;
pub mod league;
pub mod time;

pub use ids::LeagueId;
pub use league::{SeasonType, Sport};
pub use time::{Season, Week};
