//! SeaORM entities for the heartbeat monitor tables.

pub mod alert_state;
pub mod api_key;
pub mod monitor;
pub mod notification_channel;
pub mod notification_log;
