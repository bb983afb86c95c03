use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use aqibot_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

use super::{CommandResult, EXIT_CONFIG_FAILURE};

struct FieldView {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG_FAILURE,
            );
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in field_views(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    CommandResult::success("config", lines.join("\n"))
}

fn field_views(config: &AppConfig) -> Vec<FieldView> {
    let slack = &config.slack;
    let provider = &config.provider;

    vec![
        FieldView {
            key_path: "slack.signing_secret",
            env_keys: &["AQIBOT_SLACK_SIGNING_SECRET"],
            value: redact_secret(slack.signing_secret.expose_secret()),
        },
        FieldView {
            key_path: "slack.response_mode",
            env_keys: &["AQIBOT_SLACK_RESPONSE_MODE"],
            value: format!("{:?}", slack.response_mode),
        },
        FieldView {
            key_path: "slack.max_request_age_secs",
            env_keys: &["AQIBOT_SLACK_MAX_REQUEST_AGE_SECS"],
            value: slack.max_request_age_secs.to_string(),
        },
        FieldView {
            key_path: "slack.blocked_users",
            env_keys: &["AQIBOT_SLACK_BLOCKED_USERS"],
            value: format!("{} user(s)", slack.blocked_user_set().len()),
        },
        FieldView {
            key_path: "slack.webhook_url",
            env_keys: &["AQIBOT_SLACK_WEBHOOK_URL"],
            value: slack.webhook_url.as_deref().map(redact_url).unwrap_or_else(unset),
        },
        FieldView {
            key_path: "slack.channel",
            env_keys: &["AQIBOT_SLACK_CHANNEL"],
            value: slack.channel.clone().unwrap_or_else(unset),
        },
        FieldView {
            key_path: "slack.username",
            env_keys: &["AQIBOT_SLACK_USERNAME"],
            value: slack.username.clone(),
        },
        FieldView {
            key_path: "provider.api_key",
            env_keys: &["AQIBOT_PROVIDER_API_KEY"],
            value: redact_secret(provider.api_key.expose_secret()),
        },
        FieldView {
            key_path: "provider.base_url",
            env_keys: &["AQIBOT_PROVIDER_BASE_URL"],
            value: provider.base_url.clone(),
        },
        FieldView {
            key_path: "provider.timeout_secs",
            env_keys: &["AQIBOT_PROVIDER_TIMEOUT_SECS"],
            value: provider.timeout_secs.to_string(),
        },
        FieldView {
            key_path: "server.bind_address",
            env_keys: &["AQIBOT_SERVER_BIND_ADDRESS"],
            value: config.server.bind_address.clone(),
        },
        FieldView {
            key_path: "server.port",
            env_keys: &["AQIBOT_SERVER_PORT"],
            value: config.server.port.to_string(),
        },
        FieldView {
            key_path: "server.graceful_shutdown_secs",
            env_keys: &["AQIBOT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            value: config.server.graceful_shutdown_secs.to_string(),
        },
        FieldView {
            key_path: "logging.level",
            env_keys: &["AQIBOT_LOGGING_LEVEL", "AQIBOT_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        FieldView {
            key_path: "logging.format",
            env_keys: &["AQIBOT_LOGGING_FORMAT", "AQIBOT_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format),
        },
    ]
}

fn unset() -> String {
    "<unset>".to_string()
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("aqibot.toml"), PathBuf::from("config/aqibot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: &str) -> String {
    if secret.trim().is_empty() {
        return "<empty>".to_string();
    }
    "<redacted>".to_string()
}

/// Webhook URLs carry their credential in the path; only the origin is shown.
fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return "<redacted>".to_string();
    };
    let host = rest.split('/').next().unwrap_or_default();
    format!("{scheme}://{host}/***")
}
