use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::messages::{render_alert, render_re_alert, render_recovered};
use super::store::{AlertStore, NewNotificationLog, StoreError, WatchedMonitor};
use super::transition::{on_overdue, on_recovered, OverdueAction, RecoveryAction};
use crate::db::enums::{AlertType, MonitorStatus};
use crate::notifications::{DispatchOutcome, Notifier};

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// What happened to one monitor during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Fired,
    ReAlerted,
    /// Nothing to do this tick (re-alert interval not elapsed, or the alert was
    /// already opened/resolved by someone else).
    Skipped,
    Resolved,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorOutcome {
    pub monitor_id: Uuid,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub outcomes: Vec<MonitorOutcome>,
    /// Set when the pass could not even list its monitors.
    pub error: Option<String>,
}

impl PassReport {
    pub fn count(&self, outcome: &Outcome) -> usize {
        self.outcomes.iter().filter(|o| &o.outcome == outcome).count()
    }

    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Failed(_)))
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub overdue: PassReport,
    pub recovered: PassReport,
}

/// Drives the alert state machine for every overdue and recovered monitor.
pub struct EvaluationService {
    store: Arc<dyn AlertStore>,
    notifier: Arc<dyn Notifier>,
    cycle_lock: Mutex<()>,
}

impl EvaluationService {
    pub fn new(store: Arc<dyn AlertStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            cycle_lock: Mutex::new(()),
        }
    }

    /// Runs the overdue pass then the recovered pass, both against the same `now`.
    /// Concurrent callers are serialized.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleReport {
        let _guard = self.cycle_lock.lock().await;

        let overdue = self.check_overdue(now).await;
        let recovered = self.check_recovered(now).await;

        debug!(
            fired = overdue.count(&Outcome::Fired),
            re_alerted = overdue.count(&Outcome::ReAlerted),
            resolved = recovered.count(&Outcome::Resolved),
            failed = overdue.failures() + recovered.failures(),
            "Alert evaluation cycle finished."
        );
        CycleReport { overdue, recovered }
    }

    pub async fn check_overdue(&self, now: DateTime<Utc>) -> PassReport {
        let monitors = match self.store.list_overdue_monitors(now).await {
            Ok(monitors) => monitors,
            Err(e) => {
                error!(error = %e, "Failed to fetch overdue monitors.");
                return PassReport {
                    outcomes: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
        };

        let mut outcomes = Vec::with_capacity(monitors.len());
        for watched in &monitors {
            let outcome = match self.evaluate_overdue(watched, now).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(monitor_id = %watched.monitor.id, error = %e, "Error evaluating overdue monitor.");
                    Outcome::Failed(e.to_string())
                }
            };
            outcomes.push(MonitorOutcome {
                monitor_id: watched.monitor.id,
                outcome,
            });
        }
        PassReport {
            outcomes,
            error: None,
        }
    }

    pub async fn check_recovered(&self, now: DateTime<Utc>) -> PassReport {
        let monitors = match self.store.list_recovered_monitors().await {
            Ok(monitors) => monitors,
            Err(e) => {
                error!(error = %e, "Failed to fetch recovered monitors.");
                return PassReport {
                    outcomes: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
        };

        let mut outcomes = Vec::with_capacity(monitors.len());
        for watched in &monitors {
            let outcome = match self.evaluate_recovered(watched, now).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(monitor_id = %watched.monitor.id, error = %e, "Error evaluating recovered monitor.");
                    Outcome::Failed(e.to_string())
                }
            };
            outcomes.push(MonitorOutcome {
                monitor_id: watched.monitor.id,
                outcome,
            });
        }
        PassReport {
            outcomes,
            error: None,
        }
    }

    async fn evaluate_overdue(
        &self,
        watched: &WatchedMonitor,
        now: DateTime<Utc>,
    ) -> Result<Outcome, EvaluationError> {
        let monitor = &watched.monitor;

        if monitor.status != MonitorStatus::Down {
            let marked = self
                .store
                .set_monitor_status(monitor.id, MonitorStatus::Down, monitor.last_seen_at)
                .await?;
            if !marked {
                debug!(monitor_id = %monitor.id, "Heartbeat arrived during evaluation; skipping.");
                return Ok(Outcome::Skipped);
            }
        }

        let firing = self.store.get_firing_alert(monitor.id).await?;
        let silent_for = now - monitor.last_seen_at;

        match on_overdue(monitor, firing.as_ref(), now) {
            OverdueAction::Fire => {
                match self.store.create_firing_alert(monitor.id, now).await {
                    Ok(_) => {}
                    Err(StoreError::Conflict(reason)) => {
                        warn!(monitor_id = %monitor.id, reason = %reason, "Firing alert already exists; skipping duplicate.");
                        return Ok(Outcome::Skipped);
                    }
                    Err(e) => return Err(e.into()),
                }
                info!(
                    monitor_id = %monitor.id,
                    monitor_name = %monitor.monitor_name,
                    check_type = %monitor.check_type,
                    "Monitor is overdue. Sending alert."
                );
                let message = render_alert(monitor, silent_for);
                self.dispatch(watched, AlertType::Alert, message, now).await;
                Ok(Outcome::Fired)
            }
            OverdueAction::ReAlert { alert_id } => {
                self.store.touch_last_alerted(alert_id, now).await?;
                info!(
                    monitor_id = %monitor.id,
                    monitor_name = %monitor.monitor_name,
                    alert_id = %alert_id,
                    "Monitor still down. Sending re-alert."
                );
                let message = render_re_alert(monitor, silent_for);
                self.dispatch(watched, AlertType::ReAlert, message, now).await;
                Ok(Outcome::ReAlerted)
            }
            OverdueAction::Wait { remaining } => {
                debug!(
                    monitor_id = %monitor.id,
                    remaining_seconds = remaining.num_seconds(),
                    "Re-alert interval not elapsed."
                );
                Ok(Outcome::Skipped)
            }
        }
    }

    async fn evaluate_recovered(
        &self,
        watched: &WatchedMonitor,
        now: DateTime<Utc>,
    ) -> Result<Outcome, EvaluationError> {
        let monitor = &watched.monitor;
        let firing = self.store.get_firing_alert(monitor.id).await?;

        match on_recovered(monitor, firing.as_ref(), now) {
            RecoveryAction::Resolve { alert_id, downtime } => {
                match self.store.resolve_alert(alert_id, now).await {
                    Ok(()) => {}
                    Err(StoreError::NotFound(_)) => {
                        debug!(monitor_id = %monitor.id, alert_id = %alert_id, "Alert was resolved concurrently.");
                        return Ok(Outcome::Skipped);
                    }
                    Err(e) => return Err(e.into()),
                }
                info!(
                    monitor_id = %monitor.id,
                    monitor_name = %monitor.monitor_name,
                    alert_id = %alert_id,
                    downtime_seconds = downtime.num_seconds(),
                    "Monitor recovered. Alert resolved."
                );
                let message = render_recovered(monitor, downtime);
                self.dispatch(watched, AlertType::Recovered, message, now).await;
                Ok(Outcome::Resolved)
            }
            RecoveryAction::Nothing => Ok(Outcome::Skipped),
        }
    }

    /// Sends one notification and records the attempt. Never fails: the state
    /// transition it belongs to has already been written.
    async fn dispatch(
        &self,
        watched: &WatchedMonitor,
        alert_type: AlertType,
        message: String,
        now: DateTime<Utc>,
    ) -> DispatchOutcome {
        let outcome = match watched.endpoint() {
            Some(endpoint) => self.notifier.send(endpoint, &message).await,
            None => DispatchOutcome::failed("no notification channel assigned"),
        };

        if !outcome.success {
            warn!(
                monitor_id = %watched.monitor.id,
                alert_type = %alert_type,
                error = outcome.error.as_deref().unwrap_or_default(),
                "Notification was not delivered."
            );
        }

        let entry = NewNotificationLog {
            monitor_id: watched.monitor.id,
            channel_id: watched.channel_id(),
            alert_type,
            message,
            success: outcome.success,
            error: outcome.error.clone(),
            created_at: now,
        };
        if let Err(e) = self.store.append_notification_log(entry).await {
            error!(monitor_id = %watched.monitor.id, alert_type = %alert_type, error = %e, "Failed to write notification log.");
        }
        outcome
    }
}
