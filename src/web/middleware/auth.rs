use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::db::services::api_key_service;
use crate::services::auth_service::hash_api_key;
use crate::web::{error::AppError, AppState};

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Rejects requests without a valid, active `X-API-Key`.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Unauthorized("missing X-API-Key header".to_string()))?;

    let valid = api_key_service::validate_api_key(&state.db_pool, &hash_api_key(key))
        .await
        .map_err(|e| {
            warn!(error = %e, "API key lookup failed.");
            AppError::Unauthorized("invalid or revoked API key".to_string())
        })?;
    if !valid {
        return Err(AppError::Unauthorized(
            "invalid or revoked API key".to_string(),
        ));
    }

    Ok(next.run(req).await)
}
