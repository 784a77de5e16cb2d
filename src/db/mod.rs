pub mod entities;
pub mod enums;
pub mod services;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use std::time::Duration;
use tracing::info;

use entities::{alert_state, api_key, monitor, notification_channel, notification_log};

/// Opens the connection pool for `database_url`.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(10)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.ping().await?;
    info!("Connected to database.");
    Ok(db)
}

/// Creates the tables and indexes if they do not exist yet.
///
/// The partial unique index on `alert_states` is what keeps a monitor at one
/// firing alert even when two evaluation passes race on it.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut tables = vec![
        schema.create_table_from_entity(notification_channel::Entity),
        schema.create_table_from_entity(monitor::Entity),
        schema.create_table_from_entity(alert_state::Entity),
        schema.create_table_from_entity(notification_log::Entity),
        schema.create_table_from_entity(api_key::Entity),
    ];
    for table in tables.iter_mut() {
        table.if_not_exists();
        db.execute(backend.build(&*table)).await?;
    }

    db.execute_unprepared(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_monitors_name_check_type \
         ON monitors (monitor_name, check_type)",
    )
    .await?;
    db.execute_unprepared(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_alert_states_one_firing \
         ON alert_states (monitor_id) WHERE status = 'firing'",
    )
    .await?;
    db.execute_unprepared(
        "CREATE INDEX IF NOT EXISTS idx_notification_logs_created_at \
         ON notification_logs (created_at)",
    )
    .await?;

    info!("Database schema is up to date.");
    Ok(())
}
