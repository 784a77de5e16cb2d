pub mod api_key_routes;
pub mod channel_routes;
pub mod heartbeat_routes;
pub mod monitor_routes;
pub mod notification_log_routes;
