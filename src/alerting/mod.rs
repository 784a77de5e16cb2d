//! Alert evaluation: overdue detection, the per-monitor alert state machine,
//! notification dispatch and the periodic scheduler that drives them.

pub mod clock;
pub mod evaluation_service;
pub mod messages;
pub mod scheduler;
pub mod store;
pub mod transition;

pub use clock::{Clock, ManualClock, SystemClock};
pub use evaluation_service::{CycleReport, EvaluationService, MonitorOutcome, Outcome, PassReport};
pub use scheduler::Scheduler;
pub use store::{AlertStore, NewNotificationLog, StoreError, WatchedMonitor};
