use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::services::api_key_service;
use crate::services::auth_service;
use crate::web::models::{ApiKeyResponse, CreateApiKeyRequest, CreatedApiKeyResponse, MessageResponse};
use crate::web::{AppError, AppState};

pub fn create_api_key_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api-keys", get(list_api_keys).post(create_api_key))
        .route("/api-keys/{id}", delete(delete_api_key))
}

async fn list_api_keys(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<ApiKeyResponse>>, AppError> {
    let keys = api_key_service::get_all_api_keys(&app_state.db_pool).await?;
    Ok(Json(keys.into_iter().map(ApiKeyResponse::from).collect()))
}

async fn create_api_key(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateApiKeyRequest>,
) -> Result<(StatusCode, Json<CreatedApiKeyResponse>), AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("name is required".to_string()));
    }

    let generated = auth_service::generate_api_key();
    let api_key = api_key_service::create_api_key(
        &app_state.db_pool,
        name,
        &generated.key_hash,
        &generated.key_prefix,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedApiKeyResponse {
            api_key: api_key.into(),
            key: generated.plaintext,
            message: "Store this key securely. It will not be shown again.".to_string(),
        }),
    ))
}

async fn delete_api_key(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    if api_key_service::delete_api_key(&app_state.db_pool, id).await? == 0 {
        return Err(AppError::NotFound("API key not found".to_string()));
    }
    Ok(Json(MessageResponse::new("API key deleted")))
}
