use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::db::entities::api_key;

pub async fn create_api_key(
    db: &DatabaseConnection,
    name: &str,
    key_hash: &str,
    key_prefix: &str,
) -> Result<api_key::Model, DbErr> {
    api_key::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        key_hash: Set(key_hash.to_string()),
        key_prefix: Set(key_prefix.to_string()),
        is_active: Set(true),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
}

pub async fn get_all_api_keys(db: &DatabaseConnection) -> Result<Vec<api_key::Model>, DbErr> {
    api_key::Entity::find()
        .order_by_desc(api_key::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn delete_api_key(db: &DatabaseConnection, id: Uuid) -> Result<u64, DbErr> {
    let result = api_key::Entity::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected)
}

/// `true` when an active key with this hash exists.
pub async fn validate_api_key(db: &DatabaseConnection, key_hash: &str) -> Result<bool, DbErr> {
    let key = api_key::Entity::find()
        .filter(api_key::Column::KeyHash.eq(key_hash))
        .filter(api_key::Column::IsActive.eq(true))
        .one(db)
        .await?;
    Ok(key.is_some())
}
