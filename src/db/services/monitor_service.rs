use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::db::entities::monitor;
use crate::db::enums::MonitorStatus;

/// Fields a heartbeat carries, already defaulted and validated.
#[derive(Debug, Clone)]
pub struct HeartbeatUpsert {
    pub monitor_name: String,
    pub check_type: String,
    pub message: String,
    pub metadata: String,
    pub timeout: i32,
    pub re_alert_interval: i32,
    pub server_ip: String,
    pub server_name: String,
}

/// Creates or refreshes the monitor keyed by (monitor_name, check_type).
///
/// A refresh moves `last_seen_at` to `now` and flips the status back to up;
/// `is_active` and `channel_id` are left untouched.
pub async fn upsert_heartbeat(
    db: &DatabaseConnection,
    heartbeat: HeartbeatUpsert,
    now: DateTime<Utc>,
) -> Result<monitor::Model, DbErr> {
    let new_monitor = monitor::ActiveModel {
        id: Set(Uuid::new_v4()),
        monitor_name: Set(heartbeat.monitor_name.clone()),
        check_type: Set(heartbeat.check_type.clone()),
        message: Set(heartbeat.message),
        metadata: Set(heartbeat.metadata),
        timeout: Set(heartbeat.timeout),
        re_alert_interval: Set(heartbeat.re_alert_interval),
        status: Set(MonitorStatus::Up),
        is_active: Set(true),
        channel_id: Set(None),
        server_ip: Set(heartbeat.server_ip),
        server_name: Set(heartbeat.server_name),
        last_seen_at: Set(now),
        created_at: Set(now),
        updated_at: Set(now),
    };

    monitor::Entity::insert(new_monitor)
        .on_conflict(
            OnConflict::columns([monitor::Column::MonitorName, monitor::Column::CheckType])
                .update_columns([
                    monitor::Column::Message,
                    monitor::Column::Metadata,
                    monitor::Column::Timeout,
                    monitor::Column::ReAlertInterval,
                    monitor::Column::ServerIp,
                    monitor::Column::ServerName,
                    monitor::Column::LastSeenAt,
                    monitor::Column::UpdatedAt,
                    monitor::Column::Status,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    find_by_key(db, &heartbeat.monitor_name, &heartbeat.check_type)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("monitor vanished after upsert".to_string()))
}

pub async fn find_by_key(
    db: &DatabaseConnection,
    monitor_name: &str,
    check_type: &str,
) -> Result<Option<monitor::Model>, DbErr> {
    monitor::Entity::find()
        .filter(monitor::Column::MonitorName.eq(monitor_name))
        .filter(monitor::Column::CheckType.eq(check_type))
        .one(db)
        .await
}

pub async fn get_all_monitors(db: &DatabaseConnection) -> Result<Vec<monitor::Model>, DbErr> {
    monitor::Entity::find()
        .order_by_desc(monitor::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn get_monitor_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<monitor::Model>, DbErr> {
    monitor::Entity::find_by_id(id).one(db).await
}

/// Applies the operator-editable fields; `None` keeps the current value.
pub async fn update_monitor(
    db: &DatabaseConnection,
    existing: monitor::Model,
    is_active: Option<bool>,
    channel_id: Option<Uuid>,
) -> Result<monitor::Model, DbErr> {
    let mut active = existing.into_active_model();
    if let Some(is_active) = is_active {
        active.is_active = Set(is_active);
    }
    if let Some(channel_id) = channel_id {
        active.channel_id = Set(Some(channel_id));
    }
    active.updated_at = Set(Utc::now());
    active.update(db).await
}

/// Returns the number of deleted rows (0 or 1).
pub async fn delete_monitor(db: &DatabaseConnection, id: Uuid) -> Result<u64, DbErr> {
    let result = monitor::Entity::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected)
}

/// Guarded on `last_seen_at` so a heartbeat that landed after `seen_at` wins.
pub async fn set_monitor_status(
    db: &DatabaseConnection,
    id: Uuid,
    status: MonitorStatus,
    seen_at: DateTime<Utc>,
) -> Result<u64, DbErr> {
    let result = monitor::Entity::update_many()
        .col_expr(monitor::Column::Status, Expr::value(status))
        .col_expr(monitor::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(monitor::Column::Id.eq(id))
        .filter(monitor::Column::LastSeenAt.eq(seen_at))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
