use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub slack: SlackConfig,
    pub provider: ProviderConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub signing_secret: SecretString,
    pub response_mode: ResponseModeSetting,
    pub max_request_age_secs: u64,
    pub blocked_users: Vec<String>,
    pub webhook_url: Option<String>,
    pub channel: Option<String>,
    pub username: String,
}

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// How a slash command is answered. Chosen from static config, never per request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseModeSetting {
    Immediate,
    Deferred,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Users whose commands are refused unless they ask nicely.
///
/// Built once at startup and shared read-only across requests.
#[derive(Clone, Debug, Default)]
pub struct BlockedUsers(Arc<HashSet<String>>);

impl BlockedUsers {
    pub fn new<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Arc::new(users.into_iter().map(Into::into).collect()))
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.0.contains(user_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub signing_secret: Option<String>,
    pub response_mode: Option<ResponseModeSetting>,
    pub max_request_age_secs: Option<u64>,
    pub blocked_users: Option<Vec<String>>,
    pub webhook_url: Option<String>,
    pub provider_api_key: Option<String>,
    pub provider_base_url: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// A path given here must exist; without one the default locations are
    /// searched and may all be absent.
    pub config_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            slack: SlackConfig {
                signing_secret: String::new().into(),
                response_mode: ResponseModeSetting::Deferred,
                max_request_age_secs: 300,
                blocked_users: Vec::new(),
                webhook_url: None,
                channel: None,
                username: "aqibot".to_string(),
            },
            provider: ProviderConfig {
                api_key: String::new().into(),
                base_url: "https://api.airvisual.com/v2".to_string(),
                timeout_secs: 10,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for ResponseModeSetting {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(Self::Immediate),
            "deferred" => Ok(Self::Deferred),
            other => Err(ConfigError::Validation(format!(
                "unsupported response mode `{other}` (expected immediate|deferred)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl SlackConfig {
    pub fn blocked_user_set(&self) -> BlockedUsers {
        BlockedUsers::new(
            self.blocked_users.iter().map(|user| user.trim()).filter(|user| !user.is_empty()),
        )
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = resolve_config_path(options.config_path.as_deref())? {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(slack) = patch.slack {
            if let Some(signing_secret_value) = slack.signing_secret {
                self.slack.signing_secret = secret_value(signing_secret_value);
            }
            if let Some(response_mode) = slack.response_mode {
                self.slack.response_mode = response_mode;
            }
            if let Some(max_request_age_secs) = slack.max_request_age_secs {
                self.slack.max_request_age_secs = max_request_age_secs;
            }
            if let Some(blocked_users) = slack.blocked_users {
                self.slack.blocked_users = blocked_users;
            }
            if let Some(webhook_url) = slack.webhook_url {
                self.slack.webhook_url = Some(webhook_url);
            }
            if let Some(channel) = slack.channel {
                self.slack.channel = Some(channel);
            }
            if let Some(username) = slack.username {
                self.slack.username = username;
            }
        }

        if let Some(provider) = patch.provider {
            if let Some(api_key_value) = provider.api_key {
                self.provider.api_key = secret_value(api_key_value);
            }
            if let Some(base_url) = provider.base_url {
                self.provider.base_url = base_url;
            }
            if let Some(timeout_secs) = provider.timeout_secs {
                self.provider.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("AQIBOT_SLACK_SIGNING_SECRET") {
            self.slack.signing_secret = secret_value(value);
        }
        if let Some(value) = read_env("AQIBOT_SLACK_RESPONSE_MODE") {
            self.slack.response_mode = value.parse()?;
        }
        if let Some(value) = read_env("AQIBOT_SLACK_MAX_REQUEST_AGE_SECS") {
            self.slack.max_request_age_secs =
                parse_u64("AQIBOT_SLACK_MAX_REQUEST_AGE_SECS", &value)?;
        }
        if let Some(value) = read_env("AQIBOT_SLACK_BLOCKED_USERS") {
            self.slack.blocked_users = parse_list(&value);
        }
        if let Some(value) = read_env("AQIBOT_SLACK_WEBHOOK_URL") {
            self.slack.webhook_url = Some(value);
        }
        if let Some(value) = read_env("AQIBOT_SLACK_CHANNEL") {
            self.slack.channel = Some(value);
        }
        if let Some(value) = read_env("AQIBOT_SLACK_USERNAME") {
            self.slack.username = value;
        }

        if let Some(value) = read_env("AQIBOT_PROVIDER_API_KEY") {
            self.provider.api_key = secret_value(value);
        }
        if let Some(value) = read_env("AQIBOT_PROVIDER_BASE_URL") {
            self.provider.base_url = value;
        }
        if let Some(value) = read_env("AQIBOT_PROVIDER_TIMEOUT_SECS") {
            self.provider.timeout_secs = parse_u64("AQIBOT_PROVIDER_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("AQIBOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("AQIBOT_SERVER_PORT") {
            self.server.port = parse_u16("AQIBOT_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("AQIBOT_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("AQIBOT_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("AQIBOT_LOGGING_LEVEL").or_else(|| read_env("AQIBOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("AQIBOT_LOGGING_FORMAT").or_else(|| read_env("AQIBOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(signing_secret) = overrides.signing_secret {
            self.slack.signing_secret = secret_value(signing_secret);
        }
        if let Some(response_mode) = overrides.response_mode {
            self.slack.response_mode = response_mode;
        }
        if let Some(max_request_age_secs) = overrides.max_request_age_secs {
            self.slack.max_request_age_secs = max_request_age_secs;
        }
        if let Some(blocked_users) = overrides.blocked_users {
            self.slack.blocked_users = blocked_users;
        }
        if let Some(webhook_url) = overrides.webhook_url {
            self.slack.webhook_url = Some(webhook_url);
        }
        if let Some(api_key) = overrides.provider_api_key {
            self.provider.api_key = secret_value(api_key);
        }
        if let Some(base_url) = overrides.provider_base_url {
            self.provider.base_url = base_url;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_slack(&self.slack)?;
        validate_provider(&self.provider)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit_path {
        if !path.exists() {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(Some(path.to_path_buf()));
    }

    Ok([PathBuf::from("aqibot.toml"), PathBuf::from("config/aqibot.toml")]
        .into_iter()
        .find(|path| path.exists()))
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_slack(slack: &SlackConfig) -> Result<(), ConfigError> {
    if slack.signing_secret.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "slack.signing_secret is required. Get it from https://api.slack.com/apps > Your App > Basic Information > Signing Secret".to_string(),
        ));
    }

    if let Some(webhook_url) = &slack.webhook_url {
        if !is_http_url(webhook_url) {
            return Err(ConfigError::Validation(
                "slack.webhook_url must start with http:// or https://".to_string(),
            ));
        }
    }

    if slack.username.trim().is_empty() {
        return Err(ConfigError::Validation("slack.username must not be empty".to_string()));
    }

    Ok(())
}

fn validate_provider(provider: &ProviderConfig) -> Result<(), ConfigError> {
    if provider.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "provider.api_key is required. Get it from https://www.iqair.com/dashboard/api"
                .to_string(),
        ));
    }

    if !is_http_url(&provider.base_url) {
        return Err(ConfigError::Validation(
            "provider.base_url must start with http:// or https://".to_string(),
        ));
    }

    if provider.timeout_secs == 0 || provider.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "provider.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_list(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty()).map(str::to_owned).collect()
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    slack: Option<SlackPatch>,
    provider: Option<ProviderPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackPatch {
    signing_secret: Option<String>,
    response_mode: Option<ResponseModeSetting>,
    max_request_age_secs: Option<u64>,
    blocked_users: Option<Vec<String>>,
    webhook_url: Option<String>,
    channel: Option<String>,
    username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
