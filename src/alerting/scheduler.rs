use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::evaluation_service::{CycleReport, EvaluationService};

/// Runs the evaluation service on a fixed interval. A slow cycle delays the
/// next tick instead of overlapping with it.
pub struct Scheduler {
    service: Arc<EvaluationService>,
    clock: Arc<dyn Clock>,
    period: Duration,
}

impl Scheduler {
    pub fn new(service: Arc<EvaluationService>, clock: Arc<dyn Clock>, period: Duration) -> Self {
        Self {
            service,
            clock,
            period,
        }
    }

    /// One evaluation cycle at the clock's current time.
    pub async fn tick(&self) -> CycleReport {
        let now = self.clock.now();
        self.service.run_cycle(now).await
    }

    /// Ticks until `shutdown` turns `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_seconds = self.period.as_secs(),
            "Alert evaluation scheduler started."
        );
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("Running alert evaluation cycle...");
                    let report = self.tick().await;
                    if let Some(e) = report.overdue.error.as_ref().or(report.recovered.error.as_ref()) {
                        warn!(error = %e, "Alert evaluation pass could not list monitors.");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Alert evaluation scheduler stopped.");
    }
}
