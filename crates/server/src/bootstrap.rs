use std::sync::Arc;
use std::time::Duration;

use aqibot_core::config::{AppConfig, ConfigError};
use aqibot_core::{AirVisualClient, FetchError};
use aqibot_slack::message::MessagePresentation;
use aqibot_slack::notify::{NotifyError, WebhookNotifier};
use aqibot_slack::response::ResponseController;
use axum::Router;
use thiserror::Error;
use tracing::info;

use crate::{health, slash};

pub struct Application {
    pub config: AppConfig,
    pub state: Arc<slash::AppState>,
}

impl Application {
    pub fn router(&self) -> Router {
        slash::router(self.state.clone()).merge(health::router(self.state.response_mode))
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("reading provider setup failed: {0}")]
    Provider(#[source] FetchError),
    #[error("notifier setup failed: {0}")]
    Notifier(#[source] NotifyError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.validate()?;

    let provider = AirVisualClient::new(&config.provider).map_err(BootstrapError::Provider)?;
    let notifier = WebhookNotifier::new(Duration::from_secs(config.provider.timeout_secs))
        .map_err(BootstrapError::Notifier)?;
    let presentation =
        MessagePresentation { username: Some(config.slack.username.clone()), channel: None };

    let blocked_users = config.slack.blocked_user_set();
    info!(
        event_name = "system.bootstrap.gateway_ready",
        correlation_id = "bootstrap",
        blocked_users = blocked_users.len(),
        response_mode = ?config.slack.response_mode,
        max_request_age_secs = config.slack.max_request_age_secs,
        "slash-command gateway initialized"
    );

    let state = slash::AppState {
        signing_secret: config.slack.signing_secret.clone(),
        max_request_age_secs: config.slack.max_request_age_secs,
        blocked_users,
        response_mode: config.slack.response_mode,
        controller: ResponseController::new(Arc::new(provider), Arc::new(notifier), presentation),
    };

    Ok(Application { config, state: Arc::new(state) })
}

#[cfg(test)]
mod tests {
    use aqibot_core::config::AppConfig;
    use aqibot_core::ResponseModeSetting;

    use crate::bootstrap::bootstrap_with_config;

    // Built in memory so the test never reads process env or a config file.
    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.slack.signing_secret = "test-secret".to_string().into();
        config.provider.api_key = "test-key".to_string().into();
        config.slack.blocked_users = vec!["U1".to_string(), " ".to_string(), "U2".to_string()];
        config.slack.response_mode = ResponseModeSetting::Immediate;
        config
    }

    #[test]
    fn bootstrap_fails_fast_without_signing_secret() {
        let result = bootstrap_with_config(AppConfig::default());

        let message = result.err().expect("error").to_string();
        assert!(message.contains("slack.signing_secret"));
    }

    #[test]
    fn bootstrap_builds_shared_state_from_config() {
        let app = bootstrap_with_config(valid_config()).expect("bootstrap should succeed");

        assert_eq!(app.state.response_mode, ResponseModeSetting::Immediate);
        assert_eq!(app.state.max_request_age_secs, 300);
        assert_eq!(app.state.blocked_users.len(), 2);
        assert!(app.state.blocked_users.contains("U2"));
        let _router = app.router();
    }
}
