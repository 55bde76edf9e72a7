//! Dependency-ordered, bounded-concurrency execution of the sync jobs.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

use super::dag::JobGraph;
use super::jobs::{Job, JobBoard, JobParams, JobState};
use super::{JobOutcome, RunReport};
use crate::cli::types::{Season, Week};
use crate::error::{ErrorKind, Result, SyncError};
use crate::sleeper::{Endpoint, Source};
use crate::storage::Sink;
use crate::transform::{Table, TransformContext};

/// Default number of jobs allowed in flight at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Runs the job graph against a source and a sink.
pub struct Orchestrator<S, K> {
    source: Arc<S>,
    sink: Arc<K>,
    params: Arc<JobParams>,
    graph: JobGraph,
    max_concurrency: usize,
}

impl<S: Source, K: Sink> Orchestrator<S, K> {
    pub fn new(source: S, sink: K, params: JobParams) -> Result<Self> {
        Ok(Self {
            source: Arc::new(source),
            sink: Arc::new(sink),
            params: Arc::new(params),
            graph: JobGraph::standard()?,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        })
    }

    /// Bound the number of jobs in flight. `1` runs jobs strictly in order.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn graph(&self) -> &JobGraph {
        &self.graph
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Run every job once. Individual job failures are recorded in the
    /// report; setting `cancel` to `true` fails jobs that have not started
    /// and interrupts in-flight fetches, but never an in-flight upsert.
    #[instrument(skip_all, fields(league_id = %self.params.league_id))]
    pub async fn run(&self, cancel: watch::Receiver<bool>) -> RunReport {
        let board = Arc::new(JobBoard::new(self.graph.order()));
        let mut pending: Vec<Job> = self.graph.order().to_vec();
        let mut in_flight: JoinSet<(Job, Result<usize>)> = JoinSet::new();

        info!(jobs = pending.len(), max_concurrency = self.max_concurrency, "starting sync run");

        loop {
            if is_cancelled(&cancel) {
                for job in pending.drain(..) {
                    record(&board, job, Err(SyncError::Cancelled));
                }
            }

            let mut waiting = Vec::with_capacity(pending.len());
            for job in pending.drain(..) {
                match self.readiness(&board, job) {
                    Readiness::Blocked(prerequisite) => {
                        warn!(job = job.name(), %prerequisite, "skipping job");
                        if let Err(e) = board.advance(job, JobState::Skipped { prerequisite }) {
                            error!(job = job.name(), error = %e, "failed to record skip");
                        }
                    }
                    Readiness::Ready if in_flight.len() < self.max_concurrency => {
                        self.dispatch(&mut in_flight, &board, job, cancel.clone());
                    }
                    _ => waiting.push(job),
                }
            }
            pending = waiting;

            match in_flight.join_next().await {
                Some(Ok((job, result))) => record(&board, job, result),
                Some(Err(join_error)) => {
                    error!(error = %join_error, "job task ended abnormally");
                }
                None => break,
            }
        }

        self.settle(&board);
        let states = board.snapshot();
        let outcomes = self
            .graph
            .order()
            .iter()
            .map(|job| JobOutcome {
                job: *job,
                state: states.get(job).cloned().unwrap_or(JobState::Pending),
            })
            .collect();
        let report = RunReport { outcomes };

        info!(
            succeeded = report.succeeded(),
            rows = report.rows_written(),
            failed = report.failures().count(),
            "sync run finished"
        );
        report
    }

    fn readiness(&self, board: &JobBoard, job: Job) -> Readiness {
        let mut ready = true;
        for prerequisite in self.graph.prerequisites(job) {
            match board.state(*prerequisite) {
                JobState::Done { .. } => {}
                JobState::Failed { .. } | JobState::Skipped { .. } => {
                    return Readiness::Blocked(*prerequisite)
                }
                _ => ready = false,
            }
        }
        if ready {
            Readiness::Ready
        } else {
            Readiness::Waiting
        }
    }

    fn dispatch(
        &self,
        in_flight: &mut JoinSet<(Job, Result<usize>)>,
        board: &Arc<JobBoard>,
        job: Job,
        cancel: watch::Receiver<bool>,
    ) {
        let source = Arc::clone(&self.source);
        let sink = Arc::clone(&self.sink);
        let params = Arc::clone(&self.params);
        let board = Arc::clone(board);

        in_flight.spawn(async move {
            let result = execute(job, source, sink, params, &board, cancel).await;
            (job, result)
        });
    }

    /// Give every job a terminal state, even when its task never reported.
    fn settle(&self, board: &JobBoard) {
        for job in self.graph.order() {
            let state = board.state(*job);
            if state.is_terminal() {
                continue;
            }
            let next = match (state, self.readiness(board, *job)) {
                (JobState::Pending, Readiness::Blocked(prerequisite)) => {
                    JobState::Skipped { prerequisite }
                }
                _ => JobState::Failed {
                    kind: ErrorKind::Internal,
                    message: "job task ended without reporting a result".to_string(),
                },
            };
            if let Err(e) = board.advance(*job, next) {
                error!(job = job.name(), error = %e, "failed to settle job");
            }
        }
    }
}

enum Readiness {
    Ready,
    Waiting,
    Blocked(Job),
}

fn record(board: &JobBoard, job: Job, result: Result<usize>) {
    let next = match result {
        Ok(rows) => {
            info!(job = job.name(), table = job.table().name(), rows, "job done");
            JobState::Done { rows }
        }
        Err(e) => {
            error!(
                job = job.name(),
                table = job.table().name(),
                kind = %e.kind(),
                error = %e,
                "job failed"
            );
            JobState::failed(&e)
        }
    };
    if let Err(e) = board.advance(job, next) {
        error!(job = job.name(), error = %e, "failed to record job result");
    }
}

/// Fetch, transform and persist one job.
async fn execute<S: Source, K: Sink>(
    job: Job,
    source: Arc<S>,
    sink: Arc<K>,
    params: Arc<JobParams>,
    board: &JobBoard,
    mut cancel: watch::Receiver<bool>,
) -> Result<usize> {
    if is_cancelled(&cancel) {
        return Err(SyncError::Cancelled);
    }
    board.advance(job, JobState::Fetching)?;

    let (payload, context) = tokio::select! {
        biased;
        _ = cancelled(&mut cancel) => return Err(SyncError::Cancelled),
        fetched = fetch(job, source.as_ref(), &params) => fetched?,
    };
    if is_cancelled(&cancel) {
        return Err(SyncError::Cancelled);
    }

    board.advance(job, JobState::Transforming)?;
    let table = job.table();
    let rows = tokio::task::spawn_blocking(move || table.transform(&payload, &context)).await??;

    // Upserts run to completion once started
    board.advance(job, JobState::Persisting)?;
    let written = tokio::task::spawn_blocking(move || sink.upsert(table, &rows)).await??;
    Ok(written)
}

async fn fetch<S: Source>(
    job: Job,
    source: &S,
    params: &JobParams,
) -> Result<(Value, TransformContext)> {
    if let Some(endpoint) = job.endpoint(params) {
        let payload = source.fetch(&endpoint).await?;
        return Ok((payload, job.context(params)));
    }

    // Weekly statistics: read the current week from league state first
    let state = source
        .fetch(&Endpoint::State {
            sport: params.sport.clone(),
        })
        .await?;
    let (season, week) = current_period(&state)?;
    let endpoint = Endpoint::WeeklyStats {
        sport: params.sport.clone(),
        season_type: params.season_type.clone(),
        season: params.stats_season,
        week,
    };
    let payload = source.fetch(&endpoint).await?;
    let context = TransformContext::for_league(params.league_id.clone()).with_period(season, week);
    Ok((payload, context))
}

/// Season and week from a league state payload.
pub(crate) fn current_period(state: &Value) -> Result<(Season, Week)> {
    let table = Table::LeagueState.name();
    let number = |field: &str| -> Option<u16> {
        match state.get(field)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u16::MAX))
                        .map(|f| f as u64)
                })
                .and_then(|n| u16::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    };

    let week = number("week").ok_or_else(|| {
        SyncError::schema_mismatch(table, "a numeric week", found(state.get("week")))
    })?;
    let season = number("season").ok_or_else(|| {
        SyncError::schema_mismatch(table, "a season year", found(state.get("season")))
    })?;
    Ok((Season::new(season), Week::new(week)))
}

fn found(value: Option<&Value>) -> String {
    match value {
        None => "nothing".to_string(),
        Some(value) => value.to_string(),
    }
}

fn is_cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow()
}

/// Resolves once the run is cancelled; never resolves if the sender is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let closed = cancel.wait_for(|cancelled| *cancelled).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
