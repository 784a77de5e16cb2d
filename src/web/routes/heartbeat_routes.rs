use axum::{extract::State, middleware as axum_middleware, routing::post, Json, Router};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

use crate::db::entities::monitor;
use crate::db::services::monitor_service::{self, HeartbeatUpsert};
use crate::web::middleware::auth;
use crate::web::models::HeartbeatRequest;
use crate::web::{AppError, AppState};

pub fn create_heartbeat_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/heartbeat", post(post_heartbeat))
        .route_layer(axum_middleware::from_fn_with_state(app_state, auth::require_api_key))
}

/// Non-positive or missing values fall back to the configured defaults.
fn positive_or(value: Option<i32>, default: i32) -> i32 {
    value.filter(|v| *v > 0).unwrap_or(default)
}

async fn post_heartbeat(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<HeartbeatRequest>,
) -> Result<Json<monitor::Model>, AppError> {
    let monitor_name = payload.monitor_name.trim();
    let check_type = payload.check_type.trim();
    if monitor_name.is_empty() || check_type.is_empty() {
        return Err(AppError::InvalidInput(
            "monitor_name and check_type are required".to_string(),
        ));
    }

    let metadata = match payload.metadata {
        Some(value) if !value.is_null() => serde_json::to_string(&value)?,
        _ => "{}".to_string(),
    };

    let heartbeat = HeartbeatUpsert {
        monitor_name: monitor_name.to_string(),
        check_type: check_type.to_string(),
        message: payload.message,
        metadata,
        timeout: positive_or(payload.timeout, app_state.config.default_timeout_secs),
        re_alert_interval: positive_or(
            payload.re_alert_interval,
            app_state.config.default_re_alert_interval_secs,
        ),
        server_ip: payload.server_ip,
        server_name: payload.server_name,
    };

    let monitor = monitor_service::upsert_heartbeat(&app_state.db_pool, heartbeat, Utc::now()).await?;
    debug!(monitor_id = %monitor.id, monitor_name = %monitor.monitor_name, "Heartbeat received.");
    Ok(Json(monitor))
}
