use aqibot_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use serde::Serialize;

use super::{CommandResult, EXIT_RUNTIME_FAILURE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const SLACK_SIGNING_SECRET_LEN: usize = 32;

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = match report.overall_status {
        CheckStatus::Fail => EXIT_RUNTIME_FAILURE,
        CheckStatus::Pass | CheckStatus::Skipped => 0,
    };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_signing_secret(&config));
            checks.push(check_replay_window(&config));
            checks.push(check_webhook(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["signing_secret", "replay_window", "webhook_url"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_signing_secret(config: &AppConfig) -> DoctorCheck {
    let secret = config.slack.signing_secret.expose_secret().trim();
    let looks_like_slack = secret.len() == SLACK_SIGNING_SECRET_LEN
        && secret.chars().all(|ch| ch.is_ascii_hexdigit());

    if looks_like_slack {
        DoctorCheck {
            name: "signing_secret",
            status: CheckStatus::Pass,
            details: "signing secret has Slack's 32 hex character shape".to_string(),
        }
    } else {
        DoctorCheck {
            name: "signing_secret",
            status: CheckStatus::Fail,
            details: format!(
                "expected a {SLACK_SIGNING_SECRET_LEN} character hex secret from the app's Basic Information page"
            ),
        }
    }
}

fn check_replay_window(config: &AppConfig) -> DoctorCheck {
    match config.slack.max_request_age_secs {
        0 => DoctorCheck {
            name: "replay_window",
            status: CheckStatus::Skipped,
            details: "timestamp freshness check disabled (max_request_age_secs = 0)".to_string(),
        },
        secs => DoctorCheck {
            name: "replay_window",
            status: CheckStatus::Pass,
            details: format!("requests older than {secs}s are rejected"),
        },
    }
}

fn check_webhook(config: &AppConfig) -> DoctorCheck {
    match &config.slack.webhook_url {
        Some(_) => DoctorCheck {
            name: "webhook_url",
            status: CheckStatus::Pass,
            details: "incoming webhook configured for `aqibot post`".to_string(),
        },
        None => DoctorCheck {
            name: "webhook_url",
            status: CheckStatus::Skipped,
            details: "no slack.webhook_url; `aqibot post` is unavailable".to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
