use axum::{http::Method, routing::get, Json, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::notifications::Notifier;
use crate::server::config::ServerConfig;

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

pub use error::AppError;
use routes::*;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub notifier: Arc<dyn Notifier>,
    pub config: Arc<ServerConfig>,
}

async fn health_check_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn create_axum_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    let api = Router::new()
        .route("/health", get(health_check_handler))
        .merge(heartbeat_routes::create_heartbeat_router(app_state.clone()))
        .merge(api_key_routes::create_api_key_router())
        .merge(monitor_routes::create_monitor_router())
        .merge(channel_routes::create_channel_router())
        .merge(notification_log_routes::create_notification_log_router());

    Router::new()
        .nest("/api/v1", api)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
