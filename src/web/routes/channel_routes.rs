use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::entities::notification_channel;
use crate::db::services::channel_service;
use crate::notifications::DispatchOutcome;
use crate::web::models::{CreateChannelRequest, MessageResponse, TestChannelRequest};
use crate::web::{AppError, AppState};

pub fn create_channel_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/channels", get(list_channels).post(create_channel))
        .route("/channels/{id}", delete(delete_channel))
        .route("/channels/{id}/test", post(test_channel))
}

async fn list_channels(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<notification_channel::Model>>, AppError> {
    let channels = channel_service::get_all_channels(&app_state.db_pool).await?;
    Ok(Json(channels))
}

async fn create_channel(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateChannelRequest>,
) -> Result<(StatusCode, Json<notification_channel::Model>), AppError> {
    let name = payload.name.trim();
    let chat_id = payload.telegram_chat_id.trim();
    if name.is_empty() || chat_id.is_empty() {
        return Err(AppError::InvalidInput(
            "name and telegram_chat_id are required".to_string(),
        ));
    }

    let channel = channel_service::create_channel(&app_state.db_pool, name, chat_id).await?;
    Ok((StatusCode::CREATED, Json(channel)))
}

async fn delete_channel(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    if channel_service::delete_channel(&app_state.db_pool, id).await? == 0 {
        return Err(AppError::NotFound("channel not found".to_string()));
    }
    Ok(Json(MessageResponse::new("deleted")))
}

async fn test_channel(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TestChannelRequest>,
) -> Result<Json<DispatchOutcome>, AppError> {
    let channel = channel_service::get_channel_by_id(&app_state.db_pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("channel not found".to_string()))?;

    let message = payload
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("This is a test message from channel '{}'.", channel.name));
    let outcome = app_state
        .notifier
        .send(&channel.telegram_chat_id, &message)
        .await;
    Ok(Json(outcome))
}
