use axum::http::StatusCode;
use routine_core::config::Config;
use routine_core::store::{keys, FileStore, KeyValueStore};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn init_project(dir: &TempDir) {
    routine_core::config::init_project(dir.path()).unwrap();
}

fn app(dir: &TempDir) -> axum::Router {
    routine_server::build_router(dir.path().to_path_buf())
}

async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(serde_json::to_vec(&b).unwrap()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, None).await
}

async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(body)).await
}

async fn set_goal(dir: &TempDir) -> serde_json::Value {
    let (status, goal) = send(
        app(dir),
        "PUT",
        "/api/goal",
        Some(serde_json::json!({ "title": "아침 운동", "duration": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{goal}");
    goal
}

/// Point the coach at `base_url` and store `key` with `failures` recorded.
fn use_coach(dir: &TempDir, base_url: &str, key: &str, failures: u32) {
    let mut config = Config::load(dir.path()).unwrap();
    config.coach.base_url = base_url.to_string();
    config.save(dir.path()).unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();
    store.set(keys::API_KEY, key).unwrap();
    if failures > 0 {
        store.set(keys::KEY_FAILURES, &failures.to_string()).unwrap();
    }
}

fn stored(dir: &TempDir, key: &str) -> Option<String> {
    FileStore::open(dir.path()).unwrap().get(key)
}

const COACH_REPLY: &str = r#"{"candidates":[{"content":{"parts":[{"text":"오늘도 잘했어요!"}]}}]}"#;

// ---------------------------------------------------------------------------
// Init / goal
// ---------------------------------------------------------------------------

#[tokio::test]
async fn uninitialized_root_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let (status, body) = get(app(&dir), "/api/goal").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not initialized"));
}

#[tokio::test]
async fn init_then_goal_roundtrip() {
    let dir = TempDir::new().unwrap();
    let (status, body) = post_json(app(&dir), "/api/init", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], true);

    let (status, _) = get(app(&dir), "/api/goal").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let created = set_goal(&dir).await;
    let (status, goal) = get(app(&dir), "/api/goal").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(goal["id"], created["id"]);
    assert_eq!(goal["title"], "아침 운동");
    assert_eq!(goal["time"], "08:00");
}

#[tokio::test]
async fn put_goal_rejects_bad_time() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let (status, _) = send(
        app(&dir),
        "PUT",
        "/api/goal",
        Some(serde_json::json!({ "title": "독서", "time": "25:99" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn suggestions_need_no_project() {
    let dir = TempDir::new().unwrap();
    let (status, body) = get(app(&dir), "/api/goal/suggestions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["goals"].as_array().unwrap().len(), 4);
}

// ---------------------------------------------------------------------------
// Status / stats
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mark_days_and_read_stats() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    set_goal(&dir).await;

    for date in ["2024-03-04", "2024-03-05"] {
        let (status, _) = post_json(
            app(&dir),
            &format!("/api/status?date={date}"),
            serde_json::json!({ "status": "completed" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = post_json(
        app(&dir),
        "/api/status?date=2024-03-06",
        serde_json::json!({ "status": "skipped" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["streak"], 0);
    assert_eq!(body["total_days"], 2);

    let (_, body) = get(app(&dir), "/api/status?date=2024-03-05").await;
    assert_eq!(body["status"], "completed");
    let (_, body) = get(app(&dir), "/api/status?date=2024-03-07").await;
    assert!(body["status"].is_null());

    let (status, body) = get(app(&dir), "/api/stats?date=2024-03-06").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["total_days"], 3);
    assert_eq!(body["stats"]["completed_days"], 2);

    let (_, week) = get(app(&dir), "/api/stats/week?date=2024-03-06").await;
    assert_eq!(week["days"].as_array().unwrap().len(), 7);
    assert_eq!(week["completed"], 2);
    assert_eq!(week["skipped"], 1);
}

#[tokio::test]
async fn mark_rejects_unknown_status() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    set_goal(&dir).await;
    let (status, _) = post_json(
        app(&dir),
        "/api/status",
        serde_json::json!({ "status": "maybe" }),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn bad_date_is_bad_request() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    set_goal(&dir).await;
    let (status, _) = get(app(&dir), "/api/stats?date=03-04-2024").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Routines / calendar
// ---------------------------------------------------------------------------

#[tokio::test]
async fn routines_crud_and_calendar() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let (status, routine) = post_json(
        app(&dir),
        "/api/routines",
        serde_json::json!({ "title": "독서", "duration": 20 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = routine["id"].as_u64().unwrap();

    let (status, updated) = send(
        app(&dir),
        "PUT",
        &format!("/api/routines/{id}"),
        Some(serde_json::json!({ "title": "독서 30분", "duration": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "독서 30분");
    assert_eq!(updated["color"], routine["color"]);

    let (status, marked) = post_json(
        app(&dir),
        &format!("/api/routines/{id}/status?date=2024-03-04"),
        serde_json::json!({ "status": "completed" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(marked["streak"], 1);

    let (_, stats) = get(app(&dir), &format!("/api/routines/{id}/stats?date=2024-03-04")).await;
    assert_eq!(stats["stats"]["completed_days"], 1);
    let (_, scoped) = get(app(&dir), &format!("/api/stats?routine={id}&date=2024-03-04")).await;
    assert_eq!(scoped, stats);

    let (status, _) = get(app(&dir), "/api/routines/999/stats").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, days) = get(app(&dir), "/api/calendar?year=2024&month=3").await;
    assert_eq!(status, StatusCode::OK);
    let days = days.as_array().unwrap();
    assert_eq!(days.len(), 31);
    assert_eq!(days[3]["marks"][0]["routine_id"], id);

    let (status, _) = get(app(&dir), "/api/calendar?year=2024&month=13").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app(&dir), "DELETE", &format!("/api/routines/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(app(&dir), "DELETE", &format!("/api/routines/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Reflections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn classify_endpoint() {
    let dir = TempDir::new().unwrap();
    let (status, ids) = post_json(
        app(&dir),
        "/api/classify",
        serde_json::json!({ "text": "깜빡 잊었어" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids, serde_json::json!(["forgot"]));
}

#[tokio::test]
async fn reflection_falls_back_without_key() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    set_goal(&dir).await;
    post_json(
        app(&dir),
        "/api/status?date=2024-03-04",
        serde_json::json!({ "status": "skipped" }),
    )
    .await;

    let (status, record) = post_json(
        app(&dir),
        "/api/reflections?date=2024-03-04",
        serde_json::json!({ "text": "감기 때문에 쉬었어" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{record}");
    assert_eq!(record["failure_reasons"], serde_json::json!(["health_issue"]));
    assert!(!record["ai_response"].as_str().unwrap().is_empty());

    let (status, stored) = get(app(&dir), "/api/reflections?date=2024-03-04").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["reflection"], "감기 때문에 쉬었어");

    let (status, _) = get(app(&dir), "/api/reflections?date=2024-03-05").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, failures) = get(app(&dir), "/api/stats/failures?date=2024-03-04").await;
    assert_eq!(failures["total"], 1);
}

#[tokio::test]
async fn reflection_requires_marked_day() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    set_goal(&dir).await;
    let (status, _) = post_json(
        app(&dir),
        "/api/reflections?date=2024-03-04",
        serde_json::json!({ "text": "좋았어" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn weekly_second_submit_conflicts() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    set_goal(&dir).await;

    let (status, record) = post_json(
        app(&dir),
        "/api/weekly?date=2024-03-06",
        serde_json::json!({ "reflection": "힘들었지만 버텼어", "mood": "stressed" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{record}");
    assert!(!record["ai_insight"].as_str().unwrap().is_empty());

    let (_, shown) = get(app(&dir), "/api/weekly?date=2024-03-08").await;
    assert_eq!(shown["reflection"]["mood"], "stressed");

    let (status, _) = post_json(
        app(&dir),
        "/api/weekly?date=2024-03-07",
        serde_json::json!({ "reflection": "again" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Coach
// ---------------------------------------------------------------------------

#[tokio::test]
async fn chat_offline_without_key() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    set_goal(&dir).await;

    let (_, panel) = get(app(&dir), "/api/chat").await;
    assert_eq!(panel["has_key"], false);

    let (status, body) = post_json(
        app(&dir),
        "/api/chat",
        serde_json::json!({ "message": "동기부여가 필요해" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "offline");

    let (status, _) = post_json(app(&dir), "/api/chat", serde_json::json!({ "message": " " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn key_lifecycle_without_verification() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let (status, _) = send(
        app(&dir),
        "PUT",
        "/api/key",
        Some(serde_json::json!({ "key": "short", "skip_verify": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        app(&dir),
        "PUT",
        "/api/key",
        Some(serde_json::json!({ "key": "abcdefghijklmnop", "skip_verify": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = get(app(&dir), "/api/key").await;
    assert_eq!(body["stored"], true);
    assert!(body.get("key").is_none());

    send(app(&dir), "DELETE", "/api/key", None).await;
    let (_, body) = get(app(&dir), "/api/key").await;
    assert_eq!(body["stored"], false);
}

#[tokio::test]
async fn config_endpoint_reports_defaults() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let (status, body) = get(app(&dir), "/api/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["stats"]["window_days"], 30);
    assert!(body["warnings"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Coach calls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn chat_reply_comes_from_the_coach() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", mockito::Matcher::Regex(":generateContent".into()))
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(COACH_REPLY)
        .expect(1)
        .create_async()
        .await;
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    set_goal(&dir).await;
    use_coach(&dir, &server.url(), "abcdefghijklmnop", 2);

    let (status, body) =
        post_json(app(&dir), "/api/chat", serde_json::json!({ "message": "힘들어요" })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["source"], "coach");
    assert_eq!(body["reply"], "오늘도 잘했어요!");
    assert_eq!(stored(&dir, keys::KEY_FAILURES), None);
    mock.assert_async().await;
}

#[tokio::test]
async fn exhausted_key_is_not_sent_from_chat_or_reflections() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", mockito::Matcher::Any)
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(COACH_REPLY)
        .expect(0)
        .create_async()
        .await;
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    set_goal(&dir).await;
    use_coach(&dir, &server.url(), "abcdefghijklmnop", 3);

    let (status, _) =
        post_json(app(&dir), "/api/chat", serde_json::json!({ "message": "안녕" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    post_json(
        app(&dir),
        "/api/status?date=2024-03-04",
        serde_json::json!({ "status": "completed" }),
    )
    .await;
    let (status, record) = post_json(
        app(&dir),
        "/api/reflections?date=2024-03-04",
        serde_json::json!({ "text": "상쾌했어요" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{record}");
    assert_ne!(record["ai_response"], "오늘도 잘했어요!");
    assert!(!record["ai_response"].as_str().unwrap().is_empty());

    assert_eq!(stored(&dir, keys::KEY_FAILURES).as_deref(), Some("3"));
    mock.assert_async().await;
}

#[tokio::test]
async fn store_stays_usable_while_the_coach_is_slow() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", mockito::Matcher::Any)
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_chunked_body(|w| {
            use std::io::Write;
            std::thread::sleep(std::time::Duration::from_millis(1500));
            w.write_all(COACH_REPLY.as_bytes())
        })
        .create_async()
        .await;
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    set_goal(&dir).await;
    use_coach(&dir, &server.url(), "abcdefghijklmnop", 0);

    let chat = tokio::spawn(post_json(
        app(&dir),
        "/api/chat",
        serde_json::json!({ "message": "안녕" }),
    ));
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let started = std::time::Instant::now();
    let (status, _) = get(app(&dir), "/api/goal").await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        started.elapsed() < std::time::Duration::from_millis(1000),
        "store read waited for the coach request"
    );

    let (status, body) = chat.await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["reply"], "오늘도 잘했어요!");
}
