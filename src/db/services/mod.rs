//! Data access for the monitor tables. Each sub-module owns one entity;
//! `alert_evaluation_service` implements the engine's [`AlertStore`](crate::alerting::AlertStore).

pub mod alert_evaluation_service;
pub mod api_key_service;
pub mod channel_service;
pub mod monitor_service;
pub mod notification_log_service;

pub use alert_evaluation_service::DbAlertStore;
