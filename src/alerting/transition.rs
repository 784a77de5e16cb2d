//! Pure decision functions of the alert state machine. They never touch
//! storage; the evaluation service applies whatever they decide.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::db::entities::{alert_state, monitor};
use crate::db::enums::{AlertStatus, MonitorStatus};

/// `true` when the monitor has been silent for longer than its timeout.
pub fn is_overdue(monitor: &monitor::Model, now: DateTime<Utc>) -> bool {
    now - monitor.last_seen_at > Duration::seconds(i64::from(monitor.timeout))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverdueAction {
    /// No firing alert yet: open one and send the initial alert.
    Fire,
    /// Still down and the re-alert interval has elapsed.
    ReAlert { alert_id: Uuid },
    /// Still down but the last notification is too recent.
    Wait { remaining: Duration },
}

/// Decides what to do with an overdue monitor given its current firing alert.
///
/// A missing alert always wins over the re-alert check.
pub fn on_overdue(
    monitor: &monitor::Model,
    firing: Option<&alert_state::Model>,
    now: DateTime<Utc>,
) -> OverdueAction {
    let Some(alert) = firing.filter(|a| a.status == AlertStatus::Firing) else {
        return OverdueAction::Fire;
    };

    let interval = Duration::seconds(i64::from(monitor.re_alert_interval));
    let since_last = now - alert.last_alerted_at;
    if since_last >= interval {
        OverdueAction::ReAlert { alert_id: alert.id }
    } else {
        OverdueAction::Wait {
            remaining: interval - since_last,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    Resolve { alert_id: Uuid, downtime: Duration },
    Nothing,
}

/// A monitor that is up again resolves its firing alert; downtime counts from `fired_at`.
pub fn on_recovered(
    monitor: &monitor::Model,
    firing: Option<&alert_state::Model>,
    now: DateTime<Utc>,
) -> RecoveryAction {
    match firing {
        Some(alert) if monitor.status == MonitorStatus::Up && alert.status == AlertStatus::Firing => {
            RecoveryAction::Resolve {
                alert_id: alert.id,
                downtime: now - alert.fired_at,
            }
        }
        _ => RecoveryAction::Nothing,
    }
}
