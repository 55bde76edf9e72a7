//! Synchronization jobs and their per-run state machine.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

use tracing::debug;

use crate::cli::types::{LeagueId, Season, SeasonType, Sport, Week};
use crate::error::{ErrorKind, Result, SyncError};
use crate::sleeper::Endpoint;
use crate::transform::{Table, TransformContext};

/// One extraction: fetch an endpoint, map it and upsert it into one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Job {
    LeagueInformation,
    Players,
    LeagueState,
    LeagueRosters,
    LeagueUsers,
    TrendingPlayers,
    PlayerStatistics,
    Matchups,
    /// Reads league state itself to find the current week.
    WeeklyPlayerStatistics,
}

impl Job {
    pub const ALL: [Job; 9] = [
        Job::LeagueInformation,
        Job::Players,
        Job::LeagueState,
        Job::LeagueRosters,
        Job::LeagueUsers,
        Job::TrendingPlayers,
        Job::PlayerStatistics,
        Job::Matchups,
        Job::WeeklyPlayerStatistics,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Job::LeagueInformation => "league_information",
            Job::Players => "players",
            Job::LeagueState => "league_state",
            Job::LeagueRosters => "league_rosters",
            Job::LeagueUsers => "league_users",
            Job::TrendingPlayers => "trending_players",
            Job::PlayerStatistics => "player_statistics",
            Job::Matchups => "matchups",
            Job::WeeklyPlayerStatistics => "weekly_player_statistics",
        }
    }

    /// Destination table.
    pub fn table(&self) -> Table {
        match self {
            Job::LeagueInformation => Table::LeagueInformation,
            Job::Players => Table::Players,
            Job::LeagueState => Table::LeagueState,
            Job::LeagueRosters => Table::LeagueRosters,
            Job::LeagueUsers => Table::LeagueUsers,
            Job::TrendingPlayers => Table::TrendingPlayers,
            Job::PlayerStatistics => Table::PlayerStatistics,
            Job::Matchups => Table::Matchups,
            Job::WeeklyPlayerStatistics => Table::WeeklyPlayerStatistics,
        }
    }

    pub fn prerequisites(&self) -> &'static [Job] {
        match self {
            Job::WeeklyPlayerStatistics => &[Job::LeagueState],
            _ => &[],
        }
    }

    /// The endpoint this job fetches. `None` for weekly statistics, whose
    /// week is only known once league state has been read.
    pub fn endpoint(&self, params: &JobParams) -> Option<Endpoint> {
        let sport = params.sport.clone();
        let league_id = params.league_id.clone();
        let endpoint = match self {
            Job::LeagueInformation => Endpoint::League { league_id },
            Job::Players => Endpoint::Players { sport },
            Job::LeagueState => Endpoint::State { sport },
            Job::LeagueRosters => Endpoint::Rosters { league_id },
            Job::LeagueUsers => Endpoint::Users { league_id },
            Job::TrendingPlayers => Endpoint::TrendingAdd { sport },
            Job::PlayerStatistics => Endpoint::SeasonStats {
                sport,
                season_type: params.season_type.clone(),
                season: params.stats_season,
            },
            Job::Matchups => Endpoint::Matchups {
                league_id,
                week: params.matchup_week,
            },
            Job::WeeklyPlayerStatistics => return None,
        };
        Some(endpoint)
    }

    /// Transform context for jobs that need nothing from a prior read.
    pub fn context(&self, params: &JobParams) -> TransformContext {
        match self {
            Job::LeagueRosters | Job::LeagueUsers | Job::Matchups => {
                TransformContext::for_league(params.league_id.clone())
            }
            _ => TransformContext::default(),
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a run's jobs need to build their requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobParams {
    pub league_id: LeagueId,
    pub sport: Sport,
    pub season_type: SeasonType,
    /// Season used in the statistics endpoint paths.
    pub stats_season: Season,
    pub matchup_week: Week,
}

impl JobParams {
    pub fn new(league_id: LeagueId) -> Self {
        Self {
            league_id,
            sport: Sport::default(),
            season_type: SeasonType::default(),
            stats_season: Season::default(),
            matchup_week: Week::default(),
        }
    }
}

/// Lifecycle of one job within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Fetching,
    Transforming,
    Persisting,
    Done { rows: usize },
    Failed { kind: ErrorKind, message: String },
    /// Not run because a prerequisite did not finish.
    Skipped { prerequisite: Job },
}

impl JobState {
    pub fn failed(error: &SyncError) -> Self {
        JobState::Failed {
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Fetching => "fetching",
            JobState::Transforming => "transforming",
            JobState::Persisting => "persisting",
            JobState::Done { .. } => "done",
            JobState::Failed { .. } => "failed",
            JobState::Skipped { .. } => "skipped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Done { .. } | JobState::Failed { .. } | JobState::Skipped { .. }
        )
    }

    pub fn is_done(&self) -> bool {
        matches!(self, JobState::Done { .. })
    }

    pub fn can_transition_to(&self, next: &JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Pending, Fetching)
                | (Pending, Skipped { .. })
                | (Pending, Failed { .. })
                | (Fetching, Transforming)
                | (Fetching, Failed { .. })
                | (Transforming, Persisting)
                | (Transforming, Failed { .. })
                | (Persisting, Done { .. })
                | (Persisting, Failed { .. })
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Done { rows } => write!(f, "done ({rows} rows)"),
            JobState::Failed { kind, message } => write!(f, "failed [{kind}]: {message}"),
            JobState::Skipped { prerequisite } => write!(f, "skipped ({prerequisite} did not finish)"),
            other => f.write_str(other.label()),
        }
    }
}

/// Shared record of every job's current state for one run.
#[derive(Debug)]
pub struct JobBoard {
    states: Mutex<BTreeMap<Job, JobState>>,
}

impl JobBoard {
    pub fn new(jobs: &[Job]) -> Self {
        Self {
            states: Mutex::new(jobs.iter().map(|job| (*job, JobState::Pending)).collect()),
        }
    }

    /// Move `job` to `next`, refusing transitions the state machine does not allow.
    pub fn advance(&self, job: Job, next: JobState) -> Result<()> {
        let mut states = self.lock();
        let current = states.entry(job).or_insert(JobState::Pending);
        if !current.can_transition_to(&next) {
            return Err(SyncError::IllegalTransition {
                job: job.name(),
                from: current.label(),
                to: next.label(),
            });
        }
        debug!(job = job.name(), from = current.label(), to = next.label(), "job transition");
        *current = next;
        Ok(())
    }

    pub fn state(&self, job: Job) -> JobState {
        self.lock().get(&job).cloned().unwrap_or(JobState::Pending)
    }

    pub fn snapshot(&self) -> BTreeMap<Job, JobState> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<Job, JobState>> {
        // The map is never left half-updated, so a poisoned lock is still usable
        self.states
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
