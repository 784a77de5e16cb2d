use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::entities::monitor;
use crate::db::services::{channel_service, monitor_service};
use crate::web::models::{MessageResponse, UpdateMonitorRequest};
use crate::web::{AppError, AppState};

pub fn create_monitor_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/monitors", get(list_monitors))
        .route(
            "/monitors/{id}",
            get(get_monitor).put(update_monitor).delete(delete_monitor),
        )
}

async fn list_monitors(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<monitor::Model>>, AppError> {
    let monitors = monitor_service::get_all_monitors(&app_state.db_pool).await?;
    Ok(Json(monitors))
}

async fn get_monitor(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<monitor::Model>, AppError> {
    let monitor = monitor_service::get_monitor_by_id(&app_state.db_pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("monitor not found".to_string()))?;
    Ok(Json(monitor))
}

async fn update_monitor(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMonitorRequest>,
) -> Result<Json<monitor::Model>, AppError> {
    let existing = monitor_service::get_monitor_by_id(&app_state.db_pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("monitor not found".to_string()))?;

    if let Some(channel_id) = payload.channel_id {
        if channel_service::get_channel_by_id(&app_state.db_pool, channel_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("channel not found".to_string()));
        }
    }

    let monitor = monitor_service::update_monitor(
        &app_state.db_pool,
        existing,
        payload.is_active,
        payload.channel_id,
    )
    .await?;
    Ok(Json(monitor))
}

async fn delete_monitor(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    if monitor_service::delete_monitor(&app_state.db_pool, id).await? == 0 {
        return Err(AppError::NotFound("monitor not found".to_string()));
    }
    Ok(Json(MessageResponse::new("deleted")))
}
