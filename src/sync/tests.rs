//! Unit tests for orchestrated sync runs

use super::*;
use crate::cli::types::{Season, Week};
use crate::error::{ErrorKind, SyncError};
use crate::sleeper::Endpoint;
use crate::storage::Sink;
use crate::transform::Table;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory source serving canned payloads by endpoint path.
#[derive(Default)]
struct FakeSource {
    payloads: HashMap<String, Value>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    delay: Option<Duration>,
    requests: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeSource {
    fn league() -> Self {
        let payloads = [
            ("league/L1", json!({"league_id": "L1", "name": "Test League", "total_rosters": 2})),
            ("players/nba", json!({"1": {"full_name": "A"}, "2": {"player_id": "2"}})),
            ("state/nba", json!({"season": "2024", "week": 5, "season_type": "regular"})),
            ("league/L1/rosters", json!([{"roster_id": 1}, {"roster_id": 2}])),
            ("league/L1/users", json!([{"user_id": "u1", "is_owner": true}])),
            ("players/nba/trending/add", json!([{"player_id": "1", "count": 4}])),
            ("stats/nba/regular/2025", json!({"1": {"pts": 100.0}})),
            ("league/L1/matchups/13", json!([{"roster_id": 1, "matchup_id": 1}])),
            ("stats/nba/regular/2025/5", json!({"1": {"pts": 10.0}, "2": null})),
        ];
        Self {
            payloads: payloads
                .into_iter()
                .map(|(path, payload)| (path.to_string(), payload))
                .collect(),
            ..Self::default()
        }
    }

    fn failing(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    fn hanging(mut self, path: &str) -> Self {
        self.hanging.insert(path.to_string());
        self
    }

    fn with_payload(mut self, path: &str, payload: Value) -> Self {
        self.payloads.insert(path.to_string(), payload);
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Source for FakeSource {
    async fn fetch(&self, endpoint: &Endpoint) -> crate::error::Result<Value> {
        let path = endpoint.path();
        self.requests.lock().unwrap().push(path.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.hanging.contains(&path) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(&path) {
            let source = reqwest::Client::new().get("not a url").build().unwrap_err();
            return Err(SyncError::Transport { url: path, source });
        }
        self.payloads
            .get(&path)
            .cloned()
            .ok_or(SyncError::Upstream {
                url: path,
                status: 404,
            })
    }
}

fn params() -> JobParams {
    JobParams::new(LeagueId::new("L1").unwrap())
}

fn build(source: FakeSource) -> Orchestrator<FakeSource, LeagueDatabase> {
    Orchestrator::new(source, LeagueDatabase::open_in_memory().unwrap(), params()).unwrap()
}

fn not_cancelled() -> watch::Receiver<bool> {
    let (sender, receiver) = watch::channel(false);
    // Keep the channel open for the whole test
    std::mem::forget(sender);
    receiver
}

#[tokio::test]
async fn test_full_run_persists_every_table() {
    let orchestrator = build(FakeSource::league());

    let report = orchestrator.run(not_cancelled()).await;

    assert!(report.succeeded(), "{report:?}");
    assert_eq!(report.outcomes.len(), 9);
    assert_eq!(
        report.outcomes.iter().map(|o| o.job).collect::<Vec<_>>(),
        Job::ALL.to_vec()
    );
    assert_eq!(report.outcome(Job::Players), Some(&JobState::Done { rows: 2 }));
    assert_eq!(report.rows_written(), 1 + 2 + 1 + 2 + 1 + 1 + 1 + 1 + 2);

    let db = orchestrator.sink();
    assert_eq!(db.row_count(Table::LeagueRosters).unwrap(), 2);
    let weekly = db.fetch_rows(Table::WeeklyPlayerStatistics).unwrap();
    assert_eq!(weekly.len(), 2);
    assert_eq!(weekly[0]["league_id"], json!("L1"));
    assert_eq!(weekly[0]["season"], json!("2024"));
    assert_eq!(weekly[0]["week"], json!(5));
}

#[tokio::test]
async fn test_statistics_failure_is_isolated() {
    let source = FakeSource::league().failing("stats/nba/regular/2025");
    let orchestrator = build(source);

    let report = orchestrator.run(not_cancelled()).await;

    assert!(!report.succeeded());
    match report.outcome(Job::PlayerStatistics) {
        Some(JobState::Failed { kind, .. }) => assert_eq!(*kind, ErrorKind::Transport),
        other => panic!("expected a transport failure, got {other:?}"),
    }
    for job in [Job::LeagueInformation, Job::LeagueRosters, Job::LeagueUsers] {
        assert!(report.outcome(job).unwrap().is_done(), "{job}");
    }

    let db = orchestrator.sink();
    assert_eq!(db.row_count(Table::LeagueInformation).unwrap(), 1);
    assert_eq!(db.row_count(Table::LeagueRosters).unwrap(), 2);
    assert_eq!(db.row_count(Table::LeagueUsers).unwrap(), 1);
    assert_eq!(db.row_count(Table::PlayerStatistics).unwrap(), 0);
    assert_eq!(report.failures().count(), 1);
}

#[tokio::test]
async fn test_failed_state_skips_weekly_statistics() {
    let source = FakeSource::league().failing("state/nba");
    let orchestrator = build(source);

    let report = orchestrator.run(not_cancelled()).await;

    assert!(matches!(
        report.outcome(Job::LeagueState),
        Some(JobState::Failed { .. })
    ));
    assert_eq!(
        report.outcome(Job::WeeklyPlayerStatistics),
        Some(&JobState::Skipped {
            prerequisite: Job::LeagueState
        })
    );
    assert!(report.outcome(Job::Matchups).unwrap().is_done());
    assert_eq!(report.failures().count(), 2);
}

#[tokio::test]
async fn test_state_without_week_fails_weekly_statistics() {
    let source = FakeSource::league().with_payload("state/nba", json!({"season": "2024"}));
    let orchestrator = build(source);

    let report = orchestrator.run(not_cancelled()).await;

    assert!(report.outcome(Job::LeagueState).unwrap().is_done());
    match report.outcome(Job::WeeklyPlayerStatistics) {
        Some(JobState::Failed { kind, message }) => {
            assert_eq!(*kind, ErrorKind::SchemaMismatch);
            assert!(message.contains("week"));
        }
        other => panic!("expected a schema mismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unexpected_payload_shape_fails_only_that_job() {
    let source = FakeSource::league().with_payload("league/L1/users", json!({"not": "a list"}));
    let orchestrator = build(source);

    let report = orchestrator.run(not_cancelled()).await;

    match report.outcome(Job::LeagueUsers) {
        Some(JobState::Failed { kind, .. }) => assert_eq!(*kind, ErrorKind::SchemaMismatch),
        other => panic!("expected a schema mismatch, got {other:?}"),
    }
    assert_eq!(report.failures().count(), 1);
}

#[tokio::test]
async fn test_cancelled_before_start_persists_nothing() {
    let (sender, receiver) = watch::channel(false);
    sender.send(true).unwrap();
    let orchestrator = build(FakeSource::league());

    let report = orchestrator.run(receiver).await;

    for outcome in &report.outcomes {
        match &outcome.state {
            JobState::Failed { kind, .. } => assert_eq!(*kind, ErrorKind::Cancelled),
            other => panic!("{} ended {other:?}", outcome.job),
        }
    }
    for (table, count) in orchestrator.sink().row_counts().unwrap() {
        assert_eq!(count, 0, "{table}");
    }
}

#[tokio::test]
async fn test_cancel_interrupts_hanging_fetch() {
    let source = FakeSource::league().hanging("players/nba");
    let orchestrator = build(source);
    let (sender, receiver) = watch::channel(false);

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        sender.send(true).unwrap();
        sender
    });
    let report = tokio::time::timeout(Duration::from_secs(5), orchestrator.run(receiver))
        .await
        .expect("cancellation should end the run");
    drop(canceller.await.unwrap());

    assert_eq!(
        report.outcome(Job::Players),
        Some(&JobState::Failed {
            kind: ErrorKind::Cancelled,
            message: "Run cancelled".to_string()
        })
    );
    assert!(report.outcome(Job::LeagueInformation).unwrap().is_done());
    assert_eq!(orchestrator.sink().row_count(Table::Players).unwrap(), 0);
}

/// Store whose upserts block for a while after announcing they have begun.
struct SlowSink {
    inner: LeagueDatabase,
    delay: Duration,
    started: std::sync::Arc<tokio::sync::Notify>,
}

impl Sink for SlowSink {
    fn upsert(&self, table: Table, rows: &[crate::transform::Row]) -> crate::error::Result<usize> {
        self.started.notify_one();
        std::thread::sleep(self.delay);
        self.inner.upsert(table, rows)
    }
}

#[tokio::test]
async fn test_cancel_during_upsert_lets_it_commit() {
    let started = std::sync::Arc::new(tokio::sync::Notify::new());
    let sink = SlowSink {
        inner: LeagueDatabase::open_in_memory().unwrap(),
        delay: Duration::from_millis(300),
        started: std::sync::Arc::clone(&started),
    };
    let orchestrator = Orchestrator::new(FakeSource::league(), sink, params())
        .unwrap()
        .with_max_concurrency(1);
    let (sender, receiver) = watch::channel(false);

    let canceller = tokio::spawn(async move {
        started.notified().await;
        sender.send(true).unwrap();
        sender
    });
    let report = tokio::time::timeout(Duration::from_secs(5), orchestrator.run(receiver))
        .await
        .expect("cancellation should end the run");
    drop(canceller.await.unwrap());

    assert_eq!(
        report.outcome(Job::LeagueInformation),
        Some(&JobState::Done { rows: 1 })
    );
    assert_eq!(
        orchestrator
            .sink()
            .inner
            .row_count(Table::LeagueInformation)
            .unwrap(),
        1
    );
    for outcome in report.outcomes.iter().skip(1) {
        match &outcome.state {
            JobState::Failed { kind, .. } => assert_eq!(*kind, ErrorKind::Cancelled),
            JobState::Skipped { .. } => {}
            other => panic!("{} ended {other:?}", outcome.job),
        }
    }
    assert_eq!(orchestrator.sink().inner.row_count(Table::Players).unwrap(), 0);
}

#[tokio::test]
async fn test_single_worker_runs_in_topological_order() {
    let orchestrator = build(FakeSource::league()).with_max_concurrency(1);

    let report = orchestrator.run(not_cancelled()).await;

    assert!(report.succeeded());
    let requests = orchestrator_requests(&orchestrator);
    assert_eq!(
        requests,
        vec![
            "league/L1",
            "players/nba",
            "state/nba",
            "league/L1/rosters",
            "league/L1/users",
            "players/nba/trending/add",
            "stats/nba/regular/2025",
            "league/L1/matchups/13",
            "state/nba",
            "stats/nba/regular/2025/5",
        ]
    );
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let source = FakeSource::league().with_delay(Duration::from_millis(20));
    let orchestrator = build(source).with_max_concurrency(2);

    let report = orchestrator.run(not_cancelled()).await;

    assert!(report.succeeded());
    let peak = orchestrator_source(&orchestrator).peak.load(Ordering::SeqCst);
    assert!(peak <= 2, "peak concurrency {peak}");
}

#[tokio::test]
async fn test_configured_period_reaches_endpoints() {
    let mut params = params();
    params.matchup_week = Week::new(2);
    params.stats_season = Season::new(2024);
    let source = FakeSource::league()
        .with_payload("league/L1/matchups/2", json!([]))
        .with_payload("stats/nba/regular/2024", json!({}))
        .with_payload("stats/nba/regular/2024/5", json!({}));
    let orchestrator =
        Orchestrator::new(source, LeagueDatabase::open_in_memory().unwrap(), params).unwrap();

    let report = orchestrator.run(not_cancelled()).await;

    assert!(report.succeeded(), "{report:?}");
    assert_eq!(report.outcome(Job::Matchups), Some(&JobState::Done { rows: 0 }));
}

#[tokio::test]
async fn test_dry_run_sink_counts_rows() {
    let orchestrator = Orchestrator::new(FakeSource::league(), DryRun::new(), params()).unwrap();

    let report = orchestrator.run(not_cancelled()).await;

    assert!(report.succeeded());
    let counts = orchestrator.sink().counts();
    assert_eq!(counts.get(&Table::Players), Some(&2));
    assert_eq!(counts.values().sum::<usize>(), report.rows_written());
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let orchestrator = build(FakeSource::league());

    orchestrator.run(not_cancelled()).await;
    let first: Vec<_> = Table::ALL
        .iter()
        .map(|t| orchestrator.sink().fetch_rows(*t).unwrap())
        .collect();
    orchestrator.run(not_cancelled()).await;
    let second: Vec<_> = Table::ALL
        .iter()
        .map(|t| orchestrator.sink().fetch_rows(*t).unwrap())
        .collect();

    assert_eq!(first, second);
}

#[test]
fn test_current_period_parsing() {
    let (season, week) =
        orchestrator::current_period(&json!({"season": "2024", "week": 5})).unwrap();
    assert_eq!((season, week), (Season::new(2024), Week::new(5)));

    let (season, week) = orchestrator::current_period(&json!({"season": 2023, "week": "7"})).unwrap();
    assert_eq!((season, week), (Season::new(2023), Week::new(7)));

    let (season, week) =
        orchestrator::current_period(&json!({"season": 2024.0, "week": 5.0})).unwrap();
    assert_eq!((season, week), (Season::new(2024), Week::new(5)));
    assert!(orchestrator::current_period(&json!({"season": "2024", "week": 5.5})).is_err());
    assert!(orchestrator::current_period(&json!({"season": "2024", "week": -1})).is_err());

    let error = orchestrator::current_period(&json!({"week": 5})).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::SchemaMismatch);
    assert!(orchestrator::current_period(&json!({"season": "2024", "week": null})).is_err());
}

#[test]
fn test_report_helpers() {
    let report = RunReport {
        outcomes: vec![
            JobOutcome {
                job: Job::Players,
                state: JobState::Done { rows: 3 },
            },
            JobOutcome {
                job: Job::LeagueState,
                state: JobState::failed(&SyncError::Cancelled),
            },
        ],
    };

    assert!(!report.succeeded());
    assert_eq!(report.rows_written(), 3);
    assert_eq!(report.failures().next().unwrap().job, Job::LeagueState);
    assert_eq!(report.outcome(Job::Matchups), None);
}

fn orchestrator_source(orchestrator: &Orchestrator<FakeSource, LeagueDatabase>) -> &FakeSource {
    orchestrator.source()
}

fn orchestrator_requests(orchestrator: &Orchestrator<FakeSource, LeagueDatabase>) -> Vec<String> {
    orchestrator_source(orchestrator).requests.lock().unwrap().clone()
}
