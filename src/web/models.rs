use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::entities::api_key;

#[derive(Debug, Clone, Deserialize)]
pub struct HeartbeatRequest {
    pub monitor_name: String,
    pub check_type: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub timeout: Option<i32>,
    #[serde(default)]
    pub re_alert_interval: Option<i32>,
    #[serde(default)]
    pub server_ip: String,
    #[serde(default)]
    pub server_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMonitorRequest {
    pub is_active: Option<bool>,
    pub channel_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateChannelRequest {
    pub name: String,
    pub telegram_chat_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestChannelRequest {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateApiKeyRequest {
    pub name: String,
}

/// API key as listed; never includes the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyResponse {
    pub id: Uuid,
    pub name: String,
    pub key_prefix: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<api_key::Model> for ApiKeyResponse {
    fn from(key: api_key::Model) -> Self {
        Self {
            id: key.id,
            name: key.name,
            key_prefix: key.key_prefix,
            is_active: key.is_active,
            created_at: key.created_at,
        }
    }
}

/// Returned once, at creation, with the plaintext key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedApiKeyResponse {
    #[serde(flatten)]
    pub api_key: ApiKeyResponse,
    pub key: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
