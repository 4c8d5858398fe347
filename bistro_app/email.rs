use async_trait::async_trait;
use serde::Serialize;

use bistro_core::ApplicationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outgoing email port. Delivery is up to the adapter.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), ApplicationError>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct LoggingEmailSender;

impl LoggingEmailSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailSender for LoggingEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), ApplicationError> {
        let payload = serde_json::to_string(&message)?;
        tracing::info!(to = %message.to, %payload, "Email message");
        Ok(())
    }
}
