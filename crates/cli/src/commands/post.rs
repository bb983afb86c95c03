use std::sync::Arc;
use std::time::Duration;

use aqibot_core::config::{AppConfig, LoadOptions};
use aqibot_core::AirVisualClient;
use aqibot_slack::commands::{resolve, ResolvedCommand};
use aqibot_slack::message::MessagePresentation;
use aqibot_slack::notify::WebhookNotifier;
use aqibot_slack::response::{GatewayError, ResponseController};

use super::{CommandResult, EXIT_CONFIG_FAILURE, EXIT_RUNTIME_FAILURE};

pub fn run(text: &str, user_id: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "post",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG_FAILURE,
            );
        }
    };

    let Some(webhook_url) = config.slack.webhook_url.clone() else {
        return CommandResult::failure(
            "post",
            "config_validation",
            "slack.webhook_url is required for `aqibot post`",
            EXIT_CONFIG_FAILURE,
        );
    };

    let provider = match AirVisualClient::new(&config.provider) {
        Ok(provider) => provider,
        Err(error) => {
            return CommandResult::failure(
                "post",
                "provider_setup",
                error.to_string(),
                EXIT_RUNTIME_FAILURE,
            );
        }
    };
    let notifier = match WebhookNotifier::new(Duration::from_secs(config.provider.timeout_secs)) {
        Ok(notifier) => notifier,
        Err(error) => {
            return CommandResult::failure(
                "post",
                "webhook_setup",
                error.to_string(),
                EXIT_RUNTIME_FAILURE,
            );
        }
    };

    let presentation = MessagePresentation {
        username: Some(config.slack.username.clone()),
        channel: config.slack.channel.clone(),
    };
    let controller = ResponseController::new(Arc::new(provider), Arc::new(notifier), presentation);
    let command = resolve(text, user_id, &config.slack.blocked_user_set());

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "post",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME_FAILURE,
            );
        }
    };

    runtime.block_on(post(&controller, &command, &webhook_url))
}

async fn post(
    controller: &ResponseController,
    command: &ResolvedCommand,
    webhook_url: &str,
) -> CommandResult {
    match controller.deliver(command, webhook_url).await {
        Ok(message) => CommandResult::success("post", format!("posted: {}", message.text)),
        Err(GatewayError::FetchFailed(error)) => CommandResult::failure(
            "post",
            "provider_fetch",
            error.to_string(),
            EXIT_RUNTIME_FAILURE,
        ),
        Err(GatewayError::NotifyFailed(error)) => CommandResult::failure(
            "post",
            "webhook_delivery",
            error.to_string(),
            EXIT_RUNTIME_FAILURE,
        ),
    }
}
