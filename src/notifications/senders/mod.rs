use async_trait::async_trait;
use thiserror::Error;

pub mod telegram;

#[derive(Error, Debug)]
pub enum SenderError {
    /// The sender is missing credentials; every attempt fails the same way.
    #[error("{0}")]
    NotConfigured(String),
    /// The endpoint answered with a non-success status.
    #[error("{0}")]
    SendFailed(String),
    #[error("{0}")]
    NetworkError(#[from] reqwest::Error),
}

/// A transport that delivers a text message to one endpoint (e.g. a chat id).
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, endpoint: &str, message: &str) -> Result<(), SenderError>;

    /// `false` when the sender cannot possibly deliver anything.
    fn is_configured(&self) -> bool {
        true
    }
}
