use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, Query},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
};
use uuid::Uuid;

use super::{monitor_service, notification_log_service};
use crate::alerting::{AlertStore, NewNotificationLog, StoreError, WatchedMonitor};
use crate::db::entities::{alert_state, monitor, notification_channel};
use crate::db::enums::{AlertStatus, MonitorStatus};

/// [`AlertStore`] backed by the relational database.
#[derive(Clone)]
pub struct DbAlertStore {
    db: DatabaseConnection,
}

impl DbAlertStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn into_watched(rows: Vec<(monitor::Model, Option<notification_channel::Model>)>) -> Vec<WatchedMonitor> {
    rows.into_iter()
        .map(|(monitor, channel)| WatchedMonitor { monitor, channel })
        .collect()
}

fn map_insert_error(err: DbErr, monitor_id: Uuid) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            StoreError::Conflict(format!("monitor {monitor_id} already has a firing alert"))
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl AlertStore for DbAlertStore {
    async fn list_active_monitors_with_channel(&self) -> Result<Vec<WatchedMonitor>, StoreError> {
        let rows = monitor::Entity::find()
            .find_also_related(notification_channel::Entity)
            .filter(monitor::Column::IsActive.eq(true))
            .filter(monitor::Column::ChannelId.is_not_null())
            .all(&self.db)
            .await?;
        // A channel id that points at a deleted channel joins to nothing; skip it.
        Ok(into_watched(rows)
            .into_iter()
            .filter(|w| w.channel.is_some())
            .collect())
    }

    async fn list_recovered_monitors(&self) -> Result<Vec<WatchedMonitor>, StoreError> {
        let firing_monitors = Query::select()
            .column(alert_state::Column::MonitorId)
            .from(alert_state::Entity)
            .and_where(Expr::col(alert_state::Column::Status).eq(AlertStatus::Firing))
            .to_owned();

        let rows = monitor::Entity::find()
            .find_also_related(notification_channel::Entity)
            .filter(monitor::Column::Status.eq(MonitorStatus::Up))
            .filter(monitor::Column::Id.in_subquery(firing_monitors))
            .all(&self.db)
            .await?;
        Ok(into_watched(rows))
    }

    async fn set_monitor_status(
        &self,
        monitor_id: Uuid,
        status: MonitorStatus,
        seen_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let updated = monitor_service::set_monitor_status(&self.db, monitor_id, status, seen_at).await?;
        Ok(updated > 0)
    }

    async fn get_firing_alert(&self, monitor_id: Uuid) -> Result<Option<alert_state::Model>, StoreError> {
        let alert = alert_state::Entity::find()
            .filter(alert_state::Column::MonitorId.eq(monitor_id))
            .filter(alert_state::Column::Status.eq(AlertStatus::Firing))
            .one(&self.db)
            .await?;
        Ok(alert)
    }

    async fn create_firing_alert(
        &self,
        monitor_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<alert_state::Model, StoreError> {
        alert_state::ActiveModel {
            id: Set(Uuid::new_v4()),
            monitor_id: Set(monitor_id),
            status: Set(AlertStatus::Firing),
            last_alerted_at: Set(now),
            fired_at: Set(now),
            resolved_at: Set(None),
        }
        .insert(&self.db)
        .await
        .map_err(|e| map_insert_error(e, monitor_id))
    }

    async fn touch_last_alerted(&self, alert_id: Uuid, now: DateTime<Utc>) -> Result<(), StoreError> {
        let result = alert_state::Entity::update_many()
            .col_expr(alert_state::Column::LastAlertedAt, Expr::value(now))
            .filter(alert_state::Column::Id.eq(alert_id))
            .filter(alert_state::Column::Status.eq(AlertStatus::Firing))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("firing alert {alert_id}")));
        }
        Ok(())
    }

    async fn resolve_alert(&self, alert_id: Uuid, now: DateTime<Utc>) -> Result<(), StoreError> {
        // Guarded on status so an alert is resolved exactly once.
        let result = alert_state::Entity::update_many()
            .col_expr(alert_state::Column::Status, Expr::value(AlertStatus::Resolved))
            .col_expr(alert_state::Column::ResolvedAt, Expr::value(Some(now)))
            .filter(alert_state::Column::Id.eq(alert_id))
            .filter(alert_state::Column::Status.eq(AlertStatus::Firing))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("firing alert {alert_id}")));
        }
        Ok(())
    }

    async fn append_notification_log(&self, entry: NewNotificationLog) -> Result<(), StoreError> {
        notification_log_service::create_notification_log(&self.db, entry).await?;
        Ok(())
    }
}
