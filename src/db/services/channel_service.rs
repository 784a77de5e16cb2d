use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::db::entities::{monitor, notification_channel};

pub async fn create_channel(
    db: &DatabaseConnection,
    name: &str,
    telegram_chat_id: &str,
) -> Result<notification_channel::Model, DbErr> {
    notification_channel::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        telegram_chat_id: Set(telegram_chat_id.to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
}

pub async fn get_all_channels(db: &DatabaseConnection) -> Result<Vec<notification_channel::Model>, DbErr> {
    notification_channel::Entity::find()
        .order_by_desc(notification_channel::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn get_channel_by_id(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<notification_channel::Model>, DbErr> {
    notification_channel::Entity::find_by_id(id).one(db).await
}

/// Deletes a channel and detaches the monitors that pointed at it.
/// Returns the number of deleted channels (0 or 1).
pub async fn delete_channel(db: &DatabaseConnection, id: Uuid) -> Result<u64, DbErr> {
    let txn = db.begin().await?;

    monitor::Entity::update_many()
        .col_expr(monitor::Column::ChannelId, Expr::value(Option::<Uuid>::None))
        .filter(monitor::Column::ChannelId.eq(id))
        .exec(&txn)
        .await?;

    let result = notification_channel::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    Ok(result.rows_affected)
}
