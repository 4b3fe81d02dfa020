use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use fitplay::{
    ActionOutcome, ClientConfig, DashboardClient, GameError, GamesClient, ManualClock,
    SessionController, SessionEvent, SessionStatus, VariantKind,
};
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::time::{sleep, timeout, Instant};

#[derive(Debug, Default)]
struct Recorded {
    starts: Vec<String>,
    scores: Vec<u32>,
    ends: usize,
}

/// In-process stand-in for the FitPlay server.
#[derive(Clone)]
struct Stub {
    catalog: Arc<Value>,
    recorded: Arc<Mutex<Recorded>>,
    fail_start: Arc<AtomicBool>,
    fail_update: Arc<AtomicBool>,
    fail_end: Arc<AtomicBool>,
}

impl Stub {
    fn new(catalog: Value) -> Self {
        Self {
            catalog: Arc::new(catalog),
            recorded: Arc::new(Mutex::new(Recorded::default())),
            fail_start: Arc::new(AtomicBool::new(false)),
            fail_update: Arc::new(AtomicBool::new(false)),
            fail_end: Arc::new(AtomicBool::new(false)),
        }
    }
}

fn full_catalog() -> Value {
    json!({
        "squat_tap": {"name": "Squat Tap Challenge", "description": "Tap the screen while doing", "icon": "fa-arrows-alt-v", "target_score": 50, "time_limit": 120, "points_per_unit": 2, "calories_per_unit": 0.5},
        "jump_counter": {"name": "Jump Counter", "description": "Jump and tap to count your jumps!", "icon": "fa-arrow-up", "target_score": 30, "time_limit": 60},
        "plank_timer": {"name": "Plank Timer", "description": "Hold your plank and beat the timer!", "icon": "fa-clock", "target_score": 60, "time_limit": 120},
        "burpee_challenge": {"name": "Burpee Challenge", "description": "Burpees!", "icon": "fa-dumbbell", "target_score": 15, "time_limit": 90}
    })
}

async fn game_data(State(stub): State<Stub>) -> Json<Value> {
    Json((*stub.catalog).clone())
}

async fn start_game(State(stub): State<Stub>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if stub.fail_start.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"error": "down"})));
    }
    let game_type = body["game_type"].as_str().unwrap_or_default().to_string();
    stub.recorded.lock().await.starts.push(game_type.clone());
    (
        StatusCode::OK,
        Json(json!({"status": "success", "game_type": game_type, "session_id": "sam_1", "tracking_method": "manual"})),
    )
}

async fn update_score(State(stub): State<Stub>, Json(body): Json<Value>) -> StatusCode {
    if stub.fail_update.load(Ordering::SeqCst) {
        return StatusCode::BAD_REQUEST;
    }
    let score = body["score"].as_u64().unwrap_or_default() as u32;
    stub.recorded.lock().await.scores.push(score);
    StatusCode::OK
}

async fn end_game(State(stub): State<Stub>) -> (StatusCode, Json<Value>) {
    stub.recorded.lock().await.ends += 1;
    if stub.fail_end.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "points_earned": 100,
            "calories_burned": 25.0,
            "new_badges": ["first_workout"],
            "best_score": 50,
            "is_personal_best": true
        })),
    )
}

async fn leaderboard(Path(game_type): Path<String>) -> Json<Value> {
    if game_type == "squat_tap" {
        Json(json!([
            {"username": "sam", "best_score": 50, "games_played": 4, "average_score": 41.5},
            {"username": "ali", "best_score": 38, "games_played": 2, "average_score": 30.0}
        ]))
    } else {
        Json(json!([]))
    }
}

async fn spawn_stub(stub: Stub) -> String {
    let app = Router::new()
        .route("/games/game_data", get(game_data))
        .route("/games/start_game", post(start_game))
        .route("/games/update_score", post(update_score))
        .route("/games/end_game", post(end_game))
        .route("/games/leaderboard/:game_type", get(leaderboard))
        .route(
            "/dashboard/stats",
            get(|| async {
                Json(json!({"points": 340, "badges": 2, "workouts_completed": 5, "calories_burned": 112.5, "time_active": 42.0, "daily_usage": 1}))
            }),
        )
        .route(
            "/dashboard/weekly_progress",
            get(|| async {
                Json(json!([
                    {"day": "Monday", "calories": 16, "workouts": 1, "time_active": 6},
                    {"day": "Tuesday", "calories": 0, "workouts": 0, "time_active": 0}
                ]))
            }),
        )
        .route(
            "/dashboard/achievement_progress",
            get(|| async {
                Json(json!({
                    "next_workout": {"name": "Workout Streak", "description": "Complete 7 workouts", "current": 5, "target": 7, "progress": 71.4}
                }))
            }),
        )
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn config(base_url: &str) -> ClientConfig {
    let mut config = ClientConfig::default().with_base_url(base_url);
    config.tick_interval = Duration::from_millis(10);
    config.request_timeout = Duration::from_secs(2);
    config
}

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 5, 7, 30, 0).unwrap())
}

async fn connect(stub: &Stub, clock: &ManualClock) -> SessionController {
    let base_url = spawn_stub(stub.clone()).await;
    SessionController::connect(&config(&base_url), Arc::new(clock.clone()))
        .await
        .expect("connect to stub")
}

async fn next_finished(
    events: &mut broadcast::Receiver<SessionEvent>,
) -> (fitplay::SessionSnapshot, Result<fitplay::models::GameResult, String>) {
    timeout(Duration::from_secs(3), async {
        loop {
            match events.recv().await {
                Ok(SessionEvent::Finished { snapshot, outcome }) => return (snapshot, outcome),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("session did not finish")
}

async fn wait_for_scores(stub: &Stub, expected: &[u32]) {
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if stub.recorded.lock().await.scores == expected {
            return;
        }
        if Instant::now() > deadline {
            panic!(
                "score updates were {:?}, expected {expected:?}",
                stub.recorded.lock().await.scores
            );
        }
        sleep(Duration::from_millis(10)).await;
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[tokio::test]
async fn squat_tap_reaches_target_and_finalizes() {
    let stub = Stub::new(full_catalog());
    let clock = clock();
    let controller = connect(&stub, &clock).await;
    let mut events = controller.subscribe();

    let started = controller.start("squat_tap").await.unwrap();
    assert_eq!(started.kind, VariantKind::SquatTap);
    assert_eq!(started.target_score, 50);

    for rep in 1..50u32 {
        match controller.submit_action().await.unwrap() {
            ActionOutcome::Recorded(snapshot) => assert_eq!(snapshot.score, rep),
            other => panic!("rep {rep} gave {other:?}"),
        }
        clock.advance(ChronoDuration::seconds(1));
    }

    let ActionOutcome::Completed { snapshot, result } = controller.submit_action().await.unwrap() else {
        panic!("fiftieth rep should complete the game");
    };
    assert_eq!(snapshot.score, 50);
    assert_eq!(snapshot.status, SessionStatus::Completed);
    assert_eq!(snapshot.metrics.points, 100);
    assert_eq!(snapshot.metrics.calories, 25);
    let result = result.expect("server result");
    assert_eq!(result.points_earned, 100);
    assert_eq!(result.new_badges, vec!["first_workout".to_string()]);
    assert_eq!(result.is_personal_best, Some(true));

    assert!(!controller.is_active().await);
    assert!(controller.snapshot().await.is_none());
    assert_eq!(controller.submit_action().await.unwrap(), ActionOutcome::NoSession);
    assert_eq!(controller.finalize().await.unwrap(), None);

    let (finished, outcome) = next_finished(&mut events).await;
    assert_eq!(finished.score, 50);
    assert!(outcome.is_ok());

    let expected: Vec<u32> = (1..=50).collect();
    wait_for_scores(&stub, &expected).await;
    assert_eq!(stub.recorded.lock().await.ends, 1);
    assert_eq!(stub.recorded.lock().await.starts, vec!["squat_tap".to_string()]);
}

#[tokio::test]
async fn plank_completes_on_tick_at_target_duration() {
    let stub = Stub::new(full_catalog());
    let clock = clock();
    let controller = connect(&stub, &clock).await;
    let mut events = controller.subscribe();

    controller.start("plank_timer").await.unwrap();
    clock.advance(ChronoDuration::seconds(60));

    let (snapshot, outcome) = next_finished(&mut events).await;
    assert_eq!(snapshot.kind, VariantKind::PlankTimer);
    assert_eq!(snapshot.status, SessionStatus::Completed);
    assert_eq!(snapshot.progress, 1.0);
    assert_eq!(snapshot.score, 60);
    assert_eq!(outcome.unwrap().points_earned, 100);
    assert!(!controller.is_active().await);
    assert_eq!(stub.recorded.lock().await.ends, 1);
}

#[tokio::test]
async fn time_limit_ends_tap_game_without_actions() {
    let stub = Stub::new(full_catalog());
    let clock = clock();
    let controller = connect(&stub, &clock).await;
    let mut events = controller.subscribe();

    controller.start("jump_counter").await.unwrap();
    controller.submit_action().await.unwrap();
    clock.advance(ChronoDuration::seconds(59));
    sleep(Duration::from_millis(50)).await;
    assert!(controller.is_active().await);

    clock.advance(ChronoDuration::seconds(1));
    let (snapshot, _) = next_finished(&mut events).await;
    assert_eq!(snapshot.score, 1);
    assert_eq!(snapshot.elapsed_seconds, 60);
    assert_eq!(snapshot.status, SessionStatus::Completed);
    assert_eq!(stub.recorded.lock().await.ends, 1);
}

#[tokio::test]
async fn restarting_discards_previous_session_without_ending_it() {
    let stub = Stub::new(full_catalog());
    let clock = clock();
    let controller = connect(&stub, &clock).await;

    controller.start("jump_counter").await.unwrap();
    for _ in 0..3 {
        controller.submit_action().await.unwrap();
    }

    let snapshot = controller.start("burpee_challenge").await.unwrap();
    assert_eq!(snapshot.kind, VariantKind::BurpeeChallenge);
    assert_eq!(snapshot.score, 0);

    // Past the jump counter's limit but inside the burpee one.
    clock.advance(ChronoDuration::seconds(70));
    sleep(Duration::from_millis(50)).await;
    assert!(controller.is_active().await);

    let recorded = stub.recorded.lock().await;
    assert_eq!(recorded.ends, 0);
    assert_eq!(
        recorded.starts,
        vec!["jump_counter".to_string(), "burpee_challenge".to_string()]
    );
}

#[tokio::test]
async fn unknown_or_missing_variant_is_rejected() {
    // Same shape as the production catalog, which ships no burpee entry.
    let mut catalog = full_catalog();
    catalog.as_object_mut().unwrap().remove("burpee_challenge");
    let stub = Stub::new(catalog);
    let controller = connect(&stub, &clock()).await;

    let err = controller.start("burpee_challenge").await.unwrap_err();
    assert!(matches!(err, GameError::InvalidVariant(ref id) if id == "burpee_challenge"));
    assert!(controller.start("yoga_flow").await.unwrap_err().is_invalid_variant());

    assert!(stub.recorded.lock().await.starts.is_empty());
    assert!(!controller.is_active().await);
}

#[tokio::test]
async fn failed_start_creates_no_session() {
    let stub = Stub::new(full_catalog());
    let controller = connect(&stub, &clock()).await;
    stub.fail_start.store(true, Ordering::SeqCst);

    let err = controller.start("squat_tap").await.unwrap_err();
    assert!(err.is_server_unavailable());
    assert!(controller.snapshot().await.is_none());
    assert_eq!(controller.submit_action().await.unwrap(), ActionOutcome::NoSession);
}

#[tokio::test]
async fn failed_finalize_still_clears_local_session() {
    let stub = Stub::new(full_catalog());
    let controller = connect(&stub, &clock()).await;
    let mut events = controller.subscribe();

    controller.start("squat_tap").await.unwrap();
    controller.submit_action().await.unwrap();
    stub.fail_end.store(true, Ordering::SeqCst);

    let err = controller.finalize().await.unwrap_err();
    assert!(err.is_server_unavailable());
    assert!(!controller.is_active().await);
    assert_eq!(controller.finalize().await.unwrap(), None);

    let (snapshot, outcome) = next_finished(&mut events).await;
    assert_eq!(snapshot.score, 1);
    assert!(outcome.is_err());
    assert_eq!(stub.recorded.lock().await.ends, 1);
}

#[tokio::test]
async fn dropped_score_updates_do_not_affect_local_state() {
    let stub = Stub::new(full_catalog());
    let controller = connect(&stub, &clock()).await;
    stub.fail_update.store(true, Ordering::SeqCst);

    controller.start("burpee_challenge").await.unwrap();
    for rep in 1..=3u32 {
        let ActionOutcome::Recorded(snapshot) = controller.submit_action().await.unwrap() else {
            panic!("expected a recorded action");
        };
        assert_eq!(snapshot.score, rep);
    }
    sleep(Duration::from_millis(50)).await;
    assert_eq!(controller.snapshot().await.unwrap().score, 3);
    assert!(stub.recorded.lock().await.scores.is_empty());
}

#[tokio::test]
async fn abandon_stops_session_without_ending_it() {
    let stub = Stub::new(full_catalog());
    let clock = clock();
    let controller = connect(&stub, &clock).await;

    controller.start("jump_counter").await.unwrap();
    controller.abandon().await;
    clock.advance(ChronoDuration::seconds(120));
    sleep(Duration::from_millis(50)).await;

    assert!(controller.snapshot().await.is_none());
    assert_eq!(stub.recorded.lock().await.ends, 0);
}

#[tokio::test]
async fn connect_fails_when_server_is_down() {
    let base_url = format!("http://127.0.0.1:{}", pick_free_port());
    let result = SessionController::connect(&config(&base_url), Arc::new(clock())).await;
    assert!(matches!(result, Err(GameError::ServerUnavailable(_))));
}

#[tokio::test]
async fn leaderboard_and_dashboard_endpoints_decode() {
    let base_url = spawn_stub(Stub::new(full_catalog())).await;
    let config = config(&base_url);

    let games = GamesClient::new(&config).unwrap();
    let board = games.leaderboard(VariantKind::SquatTap).await.unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].username, "sam");
    assert!(games.leaderboard(VariantKind::PlankTimer).await.unwrap().is_empty());

    let dashboard = DashboardClient::new(&config).unwrap();
    let stats = dashboard.stats().await.unwrap();
    assert_eq!(stats.points, 340);
    assert_eq!(stats.workouts_completed, 5);

    let week = dashboard.weekly_progress().await.unwrap();
    assert_eq!(week[0].day, "Monday");
    assert_eq!(week[0].workouts, 1);

    let progress = dashboard.achievement_progress().await.unwrap();
    assert_eq!(progress["next_workout"].current, 5.0);
    assert_eq!(progress["next_workout"].progress, 71.4);
}

#[tokio::test]
async fn dashboard_poller_publishes_refreshes() {
    let base_url = spawn_stub(Stub::new(full_catalog())).await;
    let client = DashboardClient::new(&config(&base_url)).unwrap();
    let poller = fitplay::dashboard::DashboardPoller::spawn(client, Duration::from_millis(20));
    let mut view = poller.view();

    timeout(Duration::from_secs(3), async {
        loop {
            view.changed().await.unwrap();
            if view.borrow().refreshes >= 2 {
                break;
            }
        }
    })
    .await
    .expect("poller did not refresh twice");

    let current = view.borrow().clone();
    assert_eq!(current.stats.unwrap().badges, 2);
    assert!(current.achievements.unwrap().contains_key("next_workout"));
    poller.stop();
}
