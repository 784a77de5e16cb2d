#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use deadswitch::alerting::{AlertStore, NewNotificationLog, StoreError, WatchedMonitor};
use deadswitch::db::entities::{alert_state, monitor, notification_channel};
use deadswitch::db::enums::{AlertStatus, MonitorStatus};
use deadswitch::notifications::{DispatchOutcome, Notifier};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn channel(chat_id: &str) -> notification_channel::Model {
    notification_channel::Model {
        id: Uuid::new_v4(),
        name: format!("channel {chat_id}"),
        telegram_chat_id: chat_id.to_string(),
        created_at: t0() - Duration::days(1),
    }
}

pub fn monitor(name: &str, timeout: i32, re_alert_interval: i32, last_seen_at: DateTime<Utc>) -> monitor::Model {
    monitor::Model {
        id: Uuid::new_v4(),
        monitor_name: name.to_string(),
        check_type: "cron".to_string(),
        message: format!("{name} stopped reporting"),
        metadata: "{}".to_string(),
        timeout,
        re_alert_interval,
        status: MonitorStatus::Up,
        is_active: true,
        channel_id: None,
        server_ip: "10.0.0.1".to_string(),
        server_name: "worker-1".to_string(),
        last_seen_at,
        created_at: last_seen_at,
        updated_at: last_seen_at,
    }
}

pub fn firing_alert(monitor_id: Uuid, fired_at: DateTime<Utc>, last_alerted_at: DateTime<Utc>) -> alert_state::Model {
    alert_state::Model {
        id: Uuid::new_v4(),
        monitor_id,
        status: AlertStatus::Firing,
        last_alerted_at,
        fired_at,
        resolved_at: None,
    }
}

#[derive(Default)]
struct Tables {
    monitors: HashMap<Uuid, monitor::Model>,
    channels: HashMap<Uuid, notification_channel::Model>,
    alerts: Vec<alert_state::Model>,
    logs: Vec<NewNotificationLog>,
    failing_monitors: HashSet<Uuid>,
}

/// In-memory [`AlertStore`] enforcing the same one-firing-alert rule as the database.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn add_channel(&self, channel: notification_channel::Model) -> Uuid {
        let id = channel.id;
        self.tables().channels.insert(id, channel);
        id
    }

    pub fn add_monitor(&self, monitor: monitor::Model) -> Uuid {
        let id = monitor.id;
        self.tables().monitors.insert(id, monitor);
        id
    }

    pub fn add_alert(&self, alert: alert_state::Model) -> Uuid {
        let id = alert.id;
        self.tables().alerts.push(alert);
        id
    }

    /// What a heartbeat does to the monitor.
    pub fn heartbeat(&self, monitor_id: Uuid, now: DateTime<Utc>) {
        let mut tables = self.tables();
        let monitor = tables.monitors.get_mut(&monitor_id).unwrap();
        monitor.last_seen_at = now;
        monitor.status = MonitorStatus::Up;
    }

    /// Every store call touching this monitor fails from now on.
    pub fn fail_monitor(&self, monitor_id: Uuid) {
        self.tables().failing_monitors.insert(monitor_id);
    }

    pub fn monitor(&self, monitor_id: Uuid) -> monitor::Model {
        self.tables().monitors[&monitor_id].clone()
    }

    pub fn alerts_for(&self, monitor_id: Uuid) -> Vec<alert_state::Model> {
        self.tables()
            .alerts
            .iter()
            .filter(|a| a.monitor_id == monitor_id)
            .cloned()
            .collect()
    }

    pub fn firing_count(&self, monitor_id: Uuid) -> usize {
        self.alerts_for(monitor_id)
            .iter()
            .filter(|a| a.status == AlertStatus::Firing)
            .count()
    }

    pub fn logs(&self) -> Vec<NewNotificationLog> {
        self.tables().logs.clone()
    }

    pub fn logs_for(&self, monitor_id: Uuid) -> Vec<NewNotificationLog> {
        self.logs()
            .into_iter()
            .filter(|l| l.monitor_id == monitor_id)
            .collect()
    }

    fn check_failing(tables: &Tables, monitor_id: Uuid) -> Result<(), StoreError> {
        if tables.failing_monitors.contains(&monitor_id) {
            return Err(StoreError::NotFound(format!("injected failure for {monitor_id}")));
        }
        Ok(())
    }

    fn watched(tables: &Tables, monitor: &monitor::Model) -> WatchedMonitor {
        WatchedMonitor {
            monitor: monitor.clone(),
            channel: monitor.channel_id.and_then(|id| tables.channels.get(&id).cloned()),
        }
    }
}

#[async_trait]
impl AlertStore for InMemoryStore {
    async fn list_active_monitors_with_channel(&self) -> Result<Vec<WatchedMonitor>, StoreError> {
        let tables = self.tables();
        let mut monitors: Vec<_> = tables
            .monitors
            .values()
            .filter(|m| m.is_active)
            .map(|m| Self::watched(&tables, m))
            .filter(|w| w.channel.is_some())
            .collect();
        monitors.sort_by_key(|w| w.monitor.created_at);
        Ok(monitors)
    }

    async fn list_recovered_monitors(&self) -> Result<Vec<WatchedMonitor>, StoreError> {
        let tables = self.tables();
        let firing: HashSet<Uuid> = tables
            .alerts
            .iter()
            .filter(|a| a.status == AlertStatus::Firing)
            .map(|a| a.monitor_id)
            .collect();
        Ok(tables
            .monitors
            .values()
            .filter(|m| m.status == MonitorStatus::Up && firing.contains(&m.id))
            .map(|m| Self::watched(&tables, m))
            .collect())
    }

    async fn set_monitor_status(
        &self,
        monitor_id: Uuid,
        status: MonitorStatus,
        seen_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        Self::check_failing(&tables, monitor_id)?;
        match tables.monitors.get_mut(&monitor_id) {
            Some(monitor) if monitor.last_seen_at == seen_at => {
                monitor.status = status;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_firing_alert(&self, monitor_id: Uuid) -> Result<Option<alert_state::Model>, StoreError> {
        let tables = self.tables();
        Self::check_failing(&tables, monitor_id)?;
        Ok(tables
            .alerts
            .iter()
            .find(|a| a.monitor_id == monitor_id && a.status == AlertStatus::Firing)
            .cloned())
    }

    async fn create_firing_alert(
        &self,
        monitor_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<alert_state::Model, StoreError> {
        let mut tables = self.tables();
        Self::check_failing(&tables, monitor_id)?;
        if tables
            .alerts
            .iter()
            .any(|a| a.monitor_id == monitor_id && a.status == AlertStatus::Firing)
        {
            return Err(StoreError::Conflict(format!("monitor {monitor_id} already firing")));
        }
        let alert = firing_alert(monitor_id, now, now);
        tables.alerts.push(alert.clone());
        Ok(alert)
    }

    async fn touch_last_alerted(&self, alert_id: Uuid, now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut tables = self.tables();
        let alert = tables
            .alerts
            .iter_mut()
            .find(|a| a.id == alert_id && a.status == AlertStatus::Firing)
            .ok_or_else(|| StoreError::NotFound(format!("firing alert {alert_id}")))?;
        alert.last_alerted_at = now;
        Ok(())
    }

    async fn resolve_alert(&self, alert_id: Uuid, now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut tables = self.tables();
        let alert = tables
            .alerts
            .iter_mut()
            .find(|a| a.id == alert_id && a.status == AlertStatus::Firing)
            .ok_or_else(|| StoreError::NotFound(format!("firing alert {alert_id}")))?;
        alert.status = AlertStatus::Resolved;
        alert.resolved_at = Some(now);
        Ok(())
    }

    async fn append_notification_log(&self, entry: NewNotificationLog) -> Result<(), StoreError> {
        self.tables().logs.push(entry);
        Ok(())
    }
}

/// Records every send; fails them all with `error` when set.
#[derive(Default)]
pub struct ScriptedNotifier {
    sent: Mutex<Vec<(String, String)>>,
    error: Mutex<Option<String>>,
}

impl ScriptedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: &str) -> Self {
        let notifier = Self::default();
        notifier.fail_with(Some(error));
        notifier
    }

    pub fn fail_with(&self, error: Option<&str>) {
        *self.error.lock().unwrap() = error.map(str::to_string);
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for ScriptedNotifier {
    async fn send(&self, endpoint: &str, message: &str) -> DispatchOutcome {
        self.sent
            .lock()
            .unwrap()
            .push((endpoint.to_string(), message.to_string()));
        match self.error.lock().unwrap().clone() {
            Some(error) => DispatchOutcome::failed(error),
            None => DispatchOutcome::delivered(),
        }
    }
}

/// Fresh in-memory SQLite database with the schema applied.
pub async fn sqlite_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    deadswitch::db::migrate(&db).await.unwrap();
    db
}

pub async fn request_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    api_key: Option<&str>,
    body: Option<serde_json::Value>,
) -> (axum::http::StatusCode, serde_json::Value) {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("X-API-Key", key);
    }
    let req = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request should build"),
        None => builder.body(Body::empty()).expect("request should build"),
    };

    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be JSON")
    };
    (status, json)
}
