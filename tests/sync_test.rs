//! End-to-end synchronization against a mocked Sleeper API

use serde_json::{json, Value};
use sleeper_sync::{
    config::SyncConfig, sleeper::RetryPolicy, storage::LeagueDatabase, sync, ErrorKind, Job,
    JobState, LeagueId, Table,
};
use std::time::Duration;
use tokio::sync::watch;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const LEAGUE: &str = "1048271523413569536";

fn fixtures() -> Vec<(String, Value)> {
    vec![
        (
            format!("/v1/league/{LEAGUE}"),
            json!({
                "league_id": LEAGUE,
                "name": "Hoops League",
                "status": "in_season",
                "sport": "nba",
                "season": "2025",
                "season_type": "regular",
                "total_rosters": 2,
                "settings": {"playoff_teams": 6},
                "scoring_settings": {"pts": 1.0, "reb": 1.2},
                "roster_positions": ["PG", "SG", "G", "BN"]
            }),
        ),
        (
            "/v1/players/nba".to_string(),
            json!({
                "4034": {"player_id": "4034", "full_name": "Player One", "fantasy_positions": ["SF", "PF"]},
                "1352": {"full_name": "Player Two", "college": " State "}
            }),
        ),
        (
            "/v1/state/nba".to_string(),
            json!({"season": "2025", "week": 5, "season_type": "regular", "display_week": 5}),
        ),
        (
            format!("/v1/league/{LEAGUE}/rosters"),
            json!([
                {"roster_id": 1, "owner_id": "u1", "starters": ["4034"], "players": ["4034", "1352"],
                 "settings": {"wins": 3, "losses": 1, "fpts": 410}},
                {"roster_id": 2, "owner_id": "u2", "starters": [], "players": []}
            ]),
        ),
        (
            format!("/v1/league/{LEAGUE}/users"),
            json!([
                {"user_id": "u1", "display_name": "Owner", "is_owner": true},
                {"user_id": "u2", "display_name": "Member", "metadata": {"team_name": "Bench Mob"}}
            ]),
        ),
        (
            "/v1/players/nba/trending/add".to_string(),
            json!([{"player_id": "1352", "count": 87}]),
        ),
        (
            "/v1/stats/nba/regular/2025".to_string(),
            json!({"4034": {"pts": 410.0, "reb": 120.0, "to": 30.0}}),
        ),
        (
            format!("/v1/league/{LEAGUE}/matchups/13"),
            json!([
                {"roster_id": 1, "matchup_id": 1, "starters": ["4034"], "points": 101.5},
                {"roster_id": 2, "matchup_id": 1, "starters": [], "points": 99.0}
            ]),
        ),
        (
            "/v1/stats/nba/regular/2025/5".to_string(),
            json!({"4034": {"pts": 31.0, "q4_pts": 12.0}, "1352": null}),
        ),
    ]
}

async fn mock_sleeper(skip: Option<&str>) -> MockServer {
    let server = MockServer::start().await;
    for (route, body) in fixtures() {
        if Some(route.as_str()) == skip {
            continue;
        }
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
    }
    server
}

fn config_for(server: &MockServer, database: &std::path::Path) -> SyncConfig {
    let mut config = SyncConfig::new(database);
    config.base_url = format!("{}/v1/", server.uri());
    config.timeout = Duration::from_secs(5);
    config.retry = RetryPolicy {
        max_attempts: 2,
        initial_interval: Duration::from_millis(5),
        max_interval: Duration::from_millis(10),
    };
    config
}

fn snapshot(db: &LeagueDatabase) -> Vec<Vec<Value>> {
    Table::ALL
        .iter()
        .map(|table| db.fetch_rows(*table).unwrap())
        .collect()
}

#[tokio::test]
async fn test_sync_twice_is_idempotent() {
    let server = mock_sleeper(None).await;
    let dir = tempfile::tempdir().unwrap();
    let database = dir.path().join("league.db");
    let config = config_for(&server, &database);
    let (_cancel, cancelled) = watch::channel(false);

    let first = sync::run(LeagueId::new(LEAGUE).unwrap(), Some("owner"), &config, cancelled.clone())
        .await
        .unwrap();
    assert!(first.succeeded(), "{first:?}");
    let after_first = snapshot(&LeagueDatabase::open(&database).unwrap());

    let second = sync::run(LeagueId::new(LEAGUE).unwrap(), None, &config, cancelled)
        .await
        .unwrap();
    assert!(second.succeeded());
    assert_eq!(first.rows_written(), second.rows_written());

    let db = LeagueDatabase::open(&database).unwrap();
    assert_eq!(snapshot(&db), after_first);

    let users = db.fetch_rows(Table::LeagueUsers).unwrap();
    assert_eq!(
        users[0],
        json!({
            "league_id": LEAGUE,
            "user_id": "u1",
            "username": null,
            "display_name": "Owner",
            "avatar": null,
            "metadata": {},
            "is_owner": true
        })
    );
    assert_eq!(users[1]["metadata"], json!({"team_name": "Bench Mob"}));

    let state = db.fetch_rows(Table::LeagueState).unwrap();
    assert_eq!(state.len(), 1);
    assert_eq!(state[0]["week"], json!(5));

    let rosters = db.fetch_rows(Table::LeagueRosters).unwrap();
    assert_eq!(rosters[0]["league_id"], json!(LEAGUE));
    assert_eq!(rosters[0]["wins"], json!(3));
    assert_eq!(rosters[0]["players"], json!(["4034", "1352"]));

    let players = db.fetch_rows(Table::Players).unwrap();
    assert_eq!(players.len(), 2);
    assert_eq!(players[0]["player_id"], json!("1352"));
    assert_eq!(players[0]["college"], json!("State"));
    assert_eq!(players[1]["primary_fantasy_position"], json!("SF"));

    let season = db.fetch_rows(Table::PlayerStatistics).unwrap();
    assert_eq!(season[0]["turnovers"], json!(30.0));

    let weekly = db.fetch_rows(Table::WeeklyPlayerStatistics).unwrap();
    assert_eq!(weekly.len(), 2);
    assert!(weekly.iter().all(|row| row["week"] == json!(5)));
    assert!(weekly.iter().all(|row| row["season"] == json!("2025")));

    assert_eq!(db.row_count(Table::Matchups).unwrap(), 2);
}

#[tokio::test]
async fn test_missing_statistics_do_not_block_league_tables() {
    let server = mock_sleeper(Some("/v1/stats/nba/regular/2025")).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, &dir.path().join("league.db"));
    let (_cancel, cancelled) = watch::channel(false);

    let report = sync::run(LeagueId::new(LEAGUE).unwrap(), None, &config, cancelled)
        .await
        .unwrap();

    assert!(!report.succeeded());
    match report.outcome(Job::PlayerStatistics) {
        Some(JobState::Failed { kind, .. }) => assert_eq!(*kind, ErrorKind::Upstream),
        other => panic!("expected an upstream failure, got {other:?}"),
    }
    assert_eq!(report.failures().count(), 1);

    let db = LeagueDatabase::open(&config.database).unwrap();
    assert_eq!(db.row_count(Table::LeagueInformation).unwrap(), 1);
    assert_eq!(db.row_count(Table::LeagueRosters).unwrap(), 2);
    assert_eq!(db.row_count(Table::LeagueUsers).unwrap(), 2);
    assert_eq!(db.row_count(Table::PlayerStatistics).unwrap(), 0);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let server = mock_sleeper(None).await;
    let dir = tempfile::tempdir().unwrap();
    let database = dir.path().join("league.db");
    let mut config = config_for(&server, &database);
    config.dry_run = true;
    let (_cancel, cancelled) = watch::channel(false);

    let report = sync::run(LeagueId::new(LEAGUE).unwrap(), None, &config, cancelled)
        .await
        .unwrap();

    assert!(report.succeeded());
    assert!(report.rows_written() > 0);
    assert!(!database.exists());
}

#[tokio::test]
async fn test_invalid_configuration_fails_before_any_job() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = SyncConfig::new(dir.path().join("league.db"));
    config.max_concurrency = 0;
    let (_cancel, cancelled) = watch::channel(false);

    let error = sync::run(LeagueId::new(LEAGUE).unwrap(), None, &config, cancelled)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Configuration);
    assert!(!config.database.exists());
}

#[tokio::test]
async fn test_unopenable_store_fails_before_any_job() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    // The directory itself is not a database file
    let config = config_for(&server, dir.path());
    let (_cancel, cancelled) = watch::channel(false);

    let error = sync::run(LeagueId::new(LEAGUE).unwrap(), None, &config, cancelled)
        .await
        .unwrap_err();

    assert!(error.is_fatal());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
