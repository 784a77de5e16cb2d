use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::senders::{NotificationSender, SenderError};

/// Result of one dispatch attempt. Delivery failures are data, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl DispatchOutcome {
    pub fn delivered() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// What the evaluation engine needs from the outbound message transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, endpoint: &str, message: &str) -> DispatchOutcome;
}

pub struct NotificationService {
    sender: Box<dyn NotificationSender>,
}

impl NotificationService {
    pub fn new(sender: Box<dyn NotificationSender>) -> Self {
        Self { sender }
    }

    pub fn is_configured(&self) -> bool {
        self.sender.is_configured()
    }
}

#[async_trait]
impl Notifier for NotificationService {
    async fn send(&self, endpoint: &str, message: &str) -> DispatchOutcome {
        match self.sender.send(endpoint, message).await {
            Ok(()) => {
                info!(endpoint = %endpoint, "Notification delivered.");
                DispatchOutcome::delivered()
            }
            Err(e @ SenderError::NotConfigured(_)) => {
                // Already reported once at startup.
                debug!(endpoint = %endpoint, error = %e, "Notification sender is not configured.");
                DispatchOutcome::failed(e.to_string())
            }
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "Failed to deliver notification.");
                DispatchOutcome::failed(e.to_string())
            }
        }
    }
}
