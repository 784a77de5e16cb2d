use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, QuerySelect, Set};
use uuid::Uuid;

use crate::alerting::NewNotificationLog;
use crate::db::entities::notification_log;

pub async fn create_notification_log(
    db: &DatabaseConnection,
    entry: NewNotificationLog,
) -> Result<notification_log::Model, DbErr> {
    notification_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        monitor_id: Set(entry.monitor_id),
        channel_id: Set(entry.channel_id),
        alert_type: Set(entry.alert_type),
        message: Set(entry.message),
        success: Set(entry.success),
        error: Set(entry.error),
        created_at: Set(entry.created_at),
    }
    .insert(db)
    .await
}

/// Newest entries first.
pub async fn get_recent_notification_logs(
    db: &DatabaseConnection,
    limit: u64,
) -> Result<Vec<notification_log::Model>, DbErr> {
    notification_log::Entity::find()
        .order_by_desc(notification_log::Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await
}
