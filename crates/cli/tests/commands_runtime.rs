use std::env;
use std::sync::{Mutex, OnceLock};

use aqibot_cli::commands::{config, doctor, post, resolve};
use serde_json::Value;

const SLACK_SHAPED_SECRET: &str = "8f742231b10e8888abcd99aaabbb85a5";

#[test]
fn config_redacts_secrets_and_attributes_env_sources() {
    with_env(
        &[
            ("AQIBOT_SLACK_SIGNING_SECRET", "super-secret-signing"),
            ("AQIBOT_PROVIDER_API_KEY", "super-secret-key"),
            ("AQIBOT_SLACK_WEBHOOK_URL", "https://hooks.slack.com/services/T1/B1/TOKEN"),
            ("AQIBOT_LOG_LEVEL", "debug"),
        ],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0, "expected config to load from env");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "config");
            assert_eq!(payload["status"], "ok");

            let message = payload["message"].as_str().unwrap_or_default();
            assert!(message.contains(
                "- slack.signing_secret = <redacted> (source: env (AQIBOT_SLACK_SIGNING_SECRET))"
            ));
            assert!(message.contains("- slack.webhook_url = https://hooks.slack.com/***"));
            assert!(message.contains("- logging.level = debug (source: env (AQIBOT_LOG_LEVEL))"));
            assert!(message.contains("- server.port = 8080 (source: default)"));
            assert!(!message.contains("super-secret"));
            assert!(!message.contains("TOKEN"));
        },
    );
}

#[test]
fn config_returns_config_failure_without_secrets() {
    with_env(&[], || {
        let result = config::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn doctor_passes_with_slack_shaped_secret_and_webhook() {
    with_env(
        &[
            ("AQIBOT_SLACK_SIGNING_SECRET", SLACK_SHAPED_SECRET),
            ("AQIBOT_PROVIDER_API_KEY", "key"),
            ("AQIBOT_SLACK_WEBHOOK_URL", "https://hooks.slack.com/services/T1/B1/X"),
        ],
        || {
            let result = doctor::run(true);
            assert_eq!(result.exit_code, 0);

            let report = parse_payload(&result.output);
            assert_eq!(report["overall_status"], "pass");
            let checks = report["checks"].as_array().expect("checks");
            assert!(checks.iter().all(|check| check["status"] == "pass"));
        },
    );
}

#[test]
fn doctor_fails_on_malformed_signing_secret() {
    with_env(
        &[("AQIBOT_SLACK_SIGNING_SECRET", "not-from-slack"), ("AQIBOT_PROVIDER_API_KEY", "key")],
        || {
            let result = doctor::run(true);
            assert_eq!(result.exit_code, 1);

            let report = parse_payload(&result.output);
            assert_eq!(report["overall_status"], "fail");
            let secret_check = report["checks"]
                .as_array()
                .and_then(|checks| checks.iter().find(|check| check["name"] == "signing_secret"))
                .expect("signing secret check");
            assert_eq!(secret_check["status"], "fail");
        },
    );
}

#[test]
fn doctor_skips_dependent_checks_when_config_fails() {
    with_env(&[], || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [fail] config_validation:"));
        assert!(result.output.contains("- [skip] webhook_url:"));
    });
}

#[test]
fn resolve_applies_blocked_users_from_env() {
    with_env(
        &[
            ("AQIBOT_SLACK_SIGNING_SECRET", "secret"),
            ("AQIBOT_PROVIDER_API_KEY", "key"),
            ("AQIBOT_SLACK_BLOCKED_USERS", "U1, U2"),
        ],
        || {
            let refused = resolution(&resolve::run("sf", "U2"));
            assert_eq!(refused["resolved"]["kind"], "blocked_user");

            let polite = resolution(&resolve::run("sf please", "U2"));
            assert_eq!(polite["resolved"]["kind"], "named_location");
            assert_eq!(polite["resolved"]["value"], "sf");
        },
    );
}

#[test]
fn post_requires_webhook_url() {
    with_env(
        &[("AQIBOT_SLACK_SIGNING_SECRET", "secret"), ("AQIBOT_PROVIDER_API_KEY", "key")],
        || {
            let result = post::run("nyc", "U1");
            assert_eq!(result.exit_code, 2);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "post");
            assert_eq!(payload["error_class"], "config_validation");
        },
    );
}

#[test]
fn post_reports_unreachable_provider_as_runtime_failure() {
    with_env(
        &[
            ("AQIBOT_SLACK_SIGNING_SECRET", "secret"),
            ("AQIBOT_PROVIDER_API_KEY", "key"),
            ("AQIBOT_PROVIDER_BASE_URL", "http://127.0.0.1:9"),
            ("AQIBOT_PROVIDER_TIMEOUT_SECS", "2"),
            ("AQIBOT_SLACK_WEBHOOK_URL", "http://127.0.0.1:9/hook"),
        ],
        || {
            let result = post::run("seattle", "U1");
            assert_eq!(result.exit_code, 1);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["error_class"], "provider_fetch");
            let message = payload["message"].as_str().unwrap_or_default();
            assert!(!message.contains("key="), "api key must not leak through errors");
        },
    );
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn resolution(result: &aqibot_cli::commands::CommandResult) -> Value {
    assert_eq!(result.exit_code, 0, "resolve should succeed: {}", result.output);
    let payload = parse_payload(&result.output);
    serde_json::from_str(payload["message"].as_str().unwrap_or_default())
        .expect("resolution should be JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "AQIBOT_SLACK_SIGNING_SECRET",
        "AQIBOT_SLACK_RESPONSE_MODE",
        "AQIBOT_SLACK_MAX_REQUEST_AGE_SECS",
        "AQIBOT_SLACK_BLOCKED_USERS",
        "AQIBOT_SLACK_WEBHOOK_URL",
        "AQIBOT_SLACK_CHANNEL",
        "AQIBOT_SLACK_USERNAME",
        "AQIBOT_PROVIDER_API_KEY",
        "AQIBOT_PROVIDER_BASE_URL",
        "AQIBOT_PROVIDER_TIMEOUT_SECS",
        "AQIBOT_SERVER_BIND_ADDRESS",
        "AQIBOT_SERVER_PORT",
        "AQIBOT_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "AQIBOT_LOGGING_LEVEL",
        "AQIBOT_LOGGING_FORMAT",
        "AQIBOT_LOG_LEVEL",
        "AQIBOT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
