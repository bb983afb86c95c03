use aqibot_core::config::{AppConfig, LoadOptions};
use aqibot_core::BlockedUsers;
use aqibot_slack::commands::{resolve, ResolvedCommand};
use aqibot_slack::tokenizer::tokenize;
use serde::Serialize;

use super::{CommandResult, EXIT_CONFIG_FAILURE, EXIT_RUNTIME_FAILURE};

#[derive(Debug, Serialize)]
struct Resolution {
    text: String,
    user_id: String,
    tokens: Vec<String>,
    resolved: ResolvedCommand,
}

pub fn run(text: &str, user_id: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "resolve",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG_FAILURE,
            );
        }
    };

    describe(text, user_id, &config.slack.blocked_user_set())
}

fn describe(text: &str, user_id: &str, blocked_users: &BlockedUsers) -> CommandResult {
    let resolution = Resolution {
        text: text.to_string(),
        user_id: user_id.to_string(),
        tokens: tokenize(text),
        resolved: resolve(text, user_id, blocked_users),
    };

    match serde_json::to_string(&resolution) {
        Ok(message) => CommandResult::success("resolve", message),
        Err(error) => CommandResult::failure(
            "resolve",
            "serialization",
            error.to_string(),
            EXIT_RUNTIME_FAILURE,
        ),
    }
}
