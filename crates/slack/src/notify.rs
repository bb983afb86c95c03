use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::message::OutboundMessage;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("message delivery failed: {0}")]
    Transport(String),
    #[error("message destination returned HTTP {status}")]
    Status { status: u16 },
}

/// Pushes a finished message to a Slack webhook or `response_url`.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        destination: &str,
        message: &OutboundMessage,
    ) -> Result<(), NotifyError>;
}

#[derive(Clone, Debug)]
pub struct WebhookNotifier {
    client: Client,
}

impl WebhookNotifier {
    pub fn new(timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| NotifyError::Transport(error.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(
        &self,
        destination: &str,
        message: &OutboundMessage,
    ) -> Result<(), NotifyError> {
        // Webhook URLs embed credentials; keep them out of errors and logs.
        let response = self
            .client
            .post(destination)
            .json(message)
            .send()
            .await
            .map_err(|error| NotifyError::Transport(error.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status { status: status.as_u16() });
        }

        debug!(
            event_name = "egress.slack.message_delivered",
            status = %status,
            "message delivered"
        );
        Ok(())
    }
}
