//! Sleeper API endpoints, as paths relative to the API base URL.

use std::fmt;

use crate::cli::types::{LeagueId, Season, SeasonType, Sport, Week};

/// One Sleeper endpoint. Every endpoint returns a single JSON document; none
/// are paginated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Full player catalog keyed by player id.
    Players { sport: Sport },
    /// Current season, week and season type for a sport.
    State { sport: Sport },
    League { league_id: LeagueId },
    Rosters { league_id: LeagueId },
    Users { league_id: LeagueId },
    /// Most-added players over the last day.
    TrendingAdd { sport: Sport },
    SeasonStats {
        sport: Sport,
        season_type: SeasonType,
        season: Season,
    },
    WeeklyStats {
        sport: Sport,
        season_type: SeasonType,
        season: Season,
        week: Week,
    },
    Matchups { league_id: LeagueId, week: Week },
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::Players { sport } => format!("players/{sport}"),
            Endpoint::State { sport } => format!("state/{sport}"),
            Endpoint::League { league_id } => format!("league/{league_id}"),
            Endpoint::Rosters { league_id } => format!("league/{league_id}/rosters"),
            Endpoint::Users { league_id } => format!("league/{league_id}/users"),
            Endpoint::TrendingAdd { sport } => format!("players/{sport}/trending/add"),
            Endpoint::SeasonStats {
                sport,
                season_type,
                season,
            } => format!("stats/{sport}/{season_type}/{season}"),
            Endpoint::WeeklyStats {
                sport,
                season_type,
                season,
                week,
            } => format!("stats/{sport}/{season_type}/{season}/{week}"),
            Endpoint::Matchups { league_id, week } => {
                format!("league/{league_id}/matchups/{week}")
            }
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
