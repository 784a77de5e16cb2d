pub mod senders;
pub mod service;

pub use service::{DispatchOutcome, NotificationService, Notifier};
