//! Decides how a resolved command is answered.
//!
//! In immediate mode the reading is fetched inside the request and returned
//! as the response body. In deferred mode the request is acknowledged at once
//! and a detached task fetches the reading and posts it to `response_url`.
//! Blocked and malformed commands never need a fetch, so they are answered
//! inline in both modes.

use std::sync::Arc;

use aqibot_core::{ApplicationError, FetchError, ReadingProvider, ResponseModeSetting};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::commands::ResolvedCommand;
use crate::message::{
    failure_message, reading_message, refusal_message, usage_message, MessagePresentation,
    OutboundMessage,
};
use crate::notify::{Notifier, NotifyError};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error(transparent)]
    FetchFailed(#[from] FetchError),
    #[error(transparent)]
    NotifyFailed(#[from] NotifyError),
}

impl From<GatewayError> for ApplicationError {
    fn from(value: GatewayError) -> Self {
        match value {
            GatewayError::FetchFailed(error) => Self::Fetch(error),
            GatewayError::NotifyFailed(error) => Self::Delivery(error.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseMode {
    Immediate,
    Deferred { callback_url: String },
}

impl ResponseMode {
    /// Picks the mode for one request. Deferred delivery needs somewhere to
    /// deliver to, so a request without `response_url` is answered inline.
    pub fn select(setting: ResponseModeSetting, response_url: Option<&str>) -> Self {
        match (setting, response_url.map(str::trim)) {
            (ResponseModeSetting::Deferred, Some(url)) if !url.is_empty() => {
                Self::Deferred { callback_url: url.to_owned() }
            }
            _ => Self::Immediate,
        }
    }
}

/// What the HTTP layer sends back to Slack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Message(OutboundMessage),
    Acknowledged,
}

#[derive(Clone)]
pub struct ResponseController {
    provider: Arc<dyn ReadingProvider>,
    notifier: Arc<dyn Notifier>,
    presentation: MessagePresentation,
}

impl ResponseController {
    pub fn new(
        provider: Arc<dyn ReadingProvider>,
        notifier: Arc<dyn Notifier>,
        presentation: MessagePresentation,
    ) -> Self {
        Self { provider, notifier, presentation }
    }

    pub async fn respond(
        &self,
        command: ResolvedCommand,
        mode: ResponseMode,
        correlation_id: &str,
    ) -> Result<Reply, GatewayError> {
        let needs_fetch = command.location().is_some();
        let callback_url = match mode {
            ResponseMode::Deferred { callback_url } if needs_fetch => callback_url,
            _ => return self.compose(&command).await.map(Reply::Message),
        };

        info!(
            event_name = "gateway.deferred.scheduled",
            correlation_id,
            "acknowledging command and deferring delivery"
        );

        let controller = self.clone();
        let correlation_id = correlation_id.to_owned();
        tokio::spawn(async move {
            controller.run_deferred(command, &callback_url, &correlation_id).await;
        });

        Ok(Reply::Acknowledged)
    }

    /// Fetches (when needed) and formats the message for `command`.
    pub async fn compose(
        &self,
        command: &ResolvedCommand,
    ) -> Result<OutboundMessage, GatewayError> {
        let Some(query) = command.location() else {
            let message = match command {
                ResolvedCommand::BlockedUser => refusal_message(&self.presentation),
                _ => usage_message(&self.presentation),
            };
            return Ok(message);
        };

        let reading = self.provider.fetch_reading(&query).await?;
        Ok(reading_message(&query, reading, command.wants_cigarettes(), &self.presentation))
    }

    /// Composes the message for `command` and pushes it to `destination`.
    pub async fn deliver(
        &self,
        command: &ResolvedCommand,
        destination: &str,
    ) -> Result<OutboundMessage, GatewayError> {
        let message = self.compose(command).await?;
        self.notifier.notify(destination, &message).await?;
        Ok(message)
    }

    async fn run_deferred(
        &self,
        command: ResolvedCommand,
        callback_url: &str,
        correlation_id: &str,
    ) {
        match self.deliver(&command, callback_url).await {
            Ok(_) => {
                info!(
                    event_name = "gateway.deferred.delivered",
                    correlation_id,
                    "deferred reply delivered"
                );
                return;
            }
            Err(GatewayError::FetchFailed(fetch_error)) => warn!(
                event_name = "gateway.deferred.fetch_failed",
                correlation_id,
                error = %fetch_error,
                "reading fetch failed; sending fallback message"
            ),
            Err(GatewayError::NotifyFailed(notify_error)) => warn!(
                event_name = "gateway.deferred.notify_failed",
                correlation_id,
                error = %notify_error,
                "deferred reply could not be delivered; sending fallback message"
            ),
        }

        // Single attempt; the fallback is never retried.
        let fallback = failure_message(&self.presentation);
        if let Err(notify_error) = self.notifier.notify(callback_url, &fallback).await {
            error!(
                event_name = "gateway.deferred.fallback_failed",
                correlation_id,
                error = %notify_error,
                "fallback message could not be delivered"
            );
        }
    }
}
