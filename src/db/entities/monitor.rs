use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::enums::MonitorStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "monitors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub monitor_name: String,
    pub check_type: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    #[sea_orm(column_type = "Text")]
    pub metadata: String, // Serialized JSON supplied by the heartbeat
    pub timeout: i32,           // seconds of allowed silence
    pub re_alert_interval: i32, // seconds between repeated alerts
    pub status: MonitorStatus,
    pub is_active: bool,
    pub channel_id: Option<Uuid>,
    pub server_ip: String,
    pub server_name: String,
    pub last_seen_at: ChronoDateTimeUtc,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::notification_channel::Entity",
        from = "Column::ChannelId",
        to = "super::notification_channel::Column::Id",
        on_delete = "SetNull",
        on_update = "Cascade"
    )]
    NotificationChannel,
    #[sea_orm(has_many = "super::alert_state::Entity")]
    AlertState,
    #[sea_orm(has_many = "super::notification_log::Entity")]
    NotificationLog,
}

impl Related<super::notification_channel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NotificationChannel.def()
    }
}

impl Related<super::alert_state::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlertState.def()
    }
}

impl Related<super::notification_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NotificationLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
