//! Outbound text notifications.

pub mod twilio;

use async_trait::async_trait;

use crate::types::NotifierError;

/// Abstraction over an SMS provider with a fixed sender and recipient.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Send one message with the given body.
    async fn send(&self, body: &str) -> Result<(), NotifierError>;
}
