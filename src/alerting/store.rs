use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::transition::is_overdue;
use crate::db::entities::{alert_state, monitor, notification_channel};
use crate::db::enums::{AlertType, MonitorStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Conflicting write: {0}")]
    Conflict(String),
}

/// A monitor together with the channel it reports to, as seen at the start of a pass.
#[derive(Debug, Clone)]
pub struct WatchedMonitor {
    pub monitor: monitor::Model,
    pub channel: Option<notification_channel::Model>,
}

impl WatchedMonitor {
    pub fn endpoint(&self) -> Option<&str> {
        self.channel.as_ref().map(|c| c.telegram_chat_id.as_str())
    }

    pub fn channel_id(&self) -> Option<Uuid> {
        self.channel.as_ref().map(|c| c.id)
    }
}

#[derive(Debug, Clone)]
pub struct NewNotificationLog {
    pub monitor_id: Uuid,
    pub channel_id: Option<Uuid>,
    pub alert_type: AlertType,
    pub message: String,
    pub success: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Everything the evaluation engine reads from and writes to storage.
///
/// `get_firing_alert` returning `Ok(None)` is a normal outcome. Implementations
/// must reject a second firing alert for the same monitor with
/// [`StoreError::Conflict`].
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Active monitors that have a notification channel assigned.
    async fn list_active_monitors_with_channel(&self) -> Result<Vec<WatchedMonitor>, StoreError>;

    /// Monitors whose status is up while a firing alert still exists for them.
    async fn list_recovered_monitors(&self) -> Result<Vec<WatchedMonitor>, StoreError>;

    /// Writes `status` only while `last_seen_at` still equals `seen_at`. Returns
    /// `false` when a heartbeat moved it in the meantime.
    async fn set_monitor_status(
        &self,
        monitor_id: Uuid,
        status: MonitorStatus,
        seen_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    async fn get_firing_alert(&self, monitor_id: Uuid) -> Result<Option<alert_state::Model>, StoreError>;

    async fn create_firing_alert(
        &self,
        monitor_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<alert_state::Model, StoreError>;

    async fn touch_last_alerted(&self, alert_id: Uuid, now: DateTime<Utc>) -> Result<(), StoreError>;

    async fn resolve_alert(&self, alert_id: Uuid, now: DateTime<Utc>) -> Result<(), StoreError>;

    async fn append_notification_log(&self, entry: NewNotificationLog) -> Result<(), StoreError>;

    /// Active monitors with a channel whose silence exceeds their timeout at `now`.
    async fn list_overdue_monitors(&self, now: DateTime<Utc>) -> Result<Vec<WatchedMonitor>, StoreError> {
        let monitors = self.list_active_monitors_with_channel().await?;
        Ok(monitors
            .into_iter()
            .filter(|w| w.channel.is_some() && is_overdue(&w.monitor, now))
            .collect())
    }
}
