use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

use crate::db::entities::notification_log;
use crate::db::services::notification_log_service;
use crate::web::{AppError, AppState};

pub fn create_notification_log_router() -> Router<Arc<AppState>> {
    Router::new().route("/notification-logs", get(list_notification_logs))
}

async fn list_notification_logs(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<notification_log::Model>>, AppError> {
    let logs = notification_log_service::get_recent_notification_logs(
        &app_state.db_pool,
        app_state.config.notification_log_limit,
    )
    .await?;
    Ok(Json(logs))
}
