//! Operator notifications
//!
//! The monitor hands a subject and body to a [`Notifier`]. Delivery failures
//! come back as [`NotifyError`] and are only ever logged by the caller.

mod smtp;

pub use smtp::{SmtpNotifier, TransportSecurity};

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Delivers one message to the configured recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}
