mod common;

use axum::http::StatusCode;
use common::{request_json, sqlite_db, ScriptedNotifier};
use deadswitch::server::config::ServerConfig;
use deadswitch::web::{create_axum_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;

async fn test_app() -> (axum::Router, Arc<ScriptedNotifier>) {
    let db_pool = sqlite_db().await;
    let notifier = Arc::new(ScriptedNotifier::new());
    let state = Arc::new(AppState {
        db_pool,
        notifier: notifier.clone(),
        config: Arc::new(ServerConfig::default()),
    });
    (create_axum_router(state), notifier)
}

async fn create_key(app: &axum::Router) -> String {
    let (status, body) = request_json(app, "POST", "/api/v1/api-keys", None, Some(json!({ "name": "ci" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["key"].as_str().unwrap().to_string()
}

async fn send_heartbeat(app: &axum::Router, key: &str, body: Value) -> (StatusCode, Value) {
    request_json(app, "POST", "/api/v1/heartbeat", Some(key), Some(body)).await
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = test_app().await;
    let (status, body) = request_json(&app, "GET", "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn heartbeat_requires_valid_api_key() {
    let (app, _) = test_app().await;
    let body = json!({ "monitor_name": "backup", "check_type": "cron" });

    let (status, resp) = request_json(&app, "POST", "/api/v1/heartbeat", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp["error"], "missing X-API-Key header");

    let (status, resp) = send_heartbeat(&app, "not-a-key", body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp["error"], "invalid or revoked API key");
}

#[tokio::test]
async fn revoked_key_is_rejected() {
    let (app, _) = test_app().await;
    let key = create_key(&app).await;

    let (_, keys) = request_json(&app, "GET", "/api/v1/api-keys", None, None).await;
    let keys = keys.as_array().unwrap();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].get("key_hash").is_none());
    assert_eq!(keys[0]["key_prefix"], key[..8]);
    let id = keys[0]["id"].as_str().unwrap();

    let (status, _) = request_json(&app, "DELETE", &format!("/api/v1/api-keys/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_heartbeat(&app, &key, json!({ "monitor_name": "a", "check_type": "b" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn heartbeat_creates_then_refreshes_monitor() {
    let (app, _) = test_app().await;
    let key = create_key(&app).await;

    let (status, created) = send_heartbeat(
        &app,
        &key,
        json!({
            "monitor_name": "backup",
            "check_type": "cron",
            "message": "nightly backup",
            "metadata": { "host": "db-1" },
            "timeout": 0,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], "up");
    assert_eq!(created["timeout"], 60);
    assert_eq!(created["re_alert_interval"], 300);
    assert_eq!(created["metadata"], r#"{"host":"db-1"}"#);
    assert_eq!(created["channel_id"], Value::Null);

    let (status, refreshed) = send_heartbeat(
        &app,
        &key,
        json!({ "monitor_name": "backup", "check_type": "cron", "timeout": 90 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["id"], created["id"]);
    assert_eq!(refreshed["timeout"], 90);
    assert_eq!(refreshed["metadata"], "{}");

    let (_, monitors) = request_json(&app, "GET", "/api/v1/monitors", None, None).await;
    assert_eq!(monitors.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn heartbeat_rejects_blank_identity() {
    let (app, _) = test_app().await;
    let key = create_key(&app).await;

    let (status, body) = send_heartbeat(&app, &key, json!({ "monitor_name": " ", "check_type": "cron" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "monitor_name and check_type are required");
}

#[tokio::test]
async fn monitor_can_be_assigned_disabled_and_deleted() {
    let (app, _) = test_app().await;
    let key = create_key(&app).await;
    let (_, monitor) = send_heartbeat(&app, &key, json!({ "monitor_name": "etl", "check_type": "job" })).await;
    let monitor_uri = format!("/api/v1/monitors/{}", monitor["id"].as_str().unwrap());

    let (status, channel) = request_json(
        &app,
        "POST",
        "/api/v1/channels",
        None,
        Some(json!({ "name": "ops", "telegram_chat_id": "-100" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request_json(
        &app,
        "PUT",
        &monitor_uri,
        None,
        Some(json!({ "channel_id": "00000000-0000-0000-0000-000000000000" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "channel not found");

    let (status, updated) = request_json(
        &app,
        "PUT",
        &monitor_uri,
        None,
        Some(json!({ "channel_id": channel["id"], "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["channel_id"], channel["id"]);
    assert_eq!(updated["is_active"], false);

    let (status, fetched) = request_json(&app, "GET", &monitor_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["channel_id"], channel["id"]);

    let channel_uri = format!("/api/v1/channels/{}", channel["id"].as_str().unwrap());
    let (status, _) = request_json(&app, "DELETE", &channel_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, fetched) = request_json(&app, "GET", &monitor_uri, None, None).await;
    assert_eq!(fetched["channel_id"], Value::Null);

    let (status, _) = request_json(&app, "DELETE", &monitor_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = request_json(&app, "GET", &monitor_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn channel_test_sends_through_notifier() {
    let (app, notifier) = test_app().await;
    let (_, channel) = request_json(
        &app,
        "POST",
        "/api/v1/channels",
        None,
        Some(json!({ "name": "ops", "telegram_chat_id": "-42" })),
    )
    .await;
    let test_uri = format!("/api/v1/channels/{}/test", channel["id"].as_str().unwrap());

    let (status, outcome) = request_json(&app, "POST", &test_uri, None, Some(json!({ "message": "ping" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome, json!({ "success": true, "error": null }));

    notifier.fail_with(Some("status 400: chat not found"));
    let (status, outcome) = request_json(&app, "POST", &test_uri, None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["success"], false);
    assert_eq!(outcome["error"], "status 400: chat not found");

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], ("-42".to_string(), "ping".to_string()));
    assert!(sent[1].1.contains("ops"));
}

#[tokio::test]
async fn channel_validation_and_missing_channel() {
    let (app, _) = test_app().await;
    let (status, _) = request_json(
        &app,
        "POST",
        "/api/v1/channels",
        None,
        Some(json!({ "name": "", "telegram_chat_id": "-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request_json(
        &app,
        "DELETE",
        "/api/v1/channels/00000000-0000-0000-0000-000000000000",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn notification_logs_start_empty() {
    let (app, _) = test_app().await;
    let (status, logs) = request_json(&app, "GET", "/api/v1/notification-logs", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs, json!([]));
}
