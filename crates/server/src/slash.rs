//! Slash-command ingress.
//!
//! Verification runs over the exact bytes received, so the handler takes the
//! raw body and only parses the form after the signature checks out.

use std::sync::Arc;

use aqibot_core::{ApplicationError, BlockedUsers, InterfaceError, ResponseModeSetting};
use aqibot_slack::commands::{resolve, SlashCommandPayload};
use aqibot_slack::response::{Reply, ResponseController, ResponseMode};
use aqibot_slack::signature::{
    check_freshness, verify, AuthError, SignedRequest, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Everything a request needs, built once at startup and shared read-only.
pub struct AppState {
    pub signing_secret: SecretString,
    pub max_request_age_secs: u64,
    pub blocked_users: BlockedUsers,
    pub response_mode: ResponseModeSetting,
    pub controller: ResponseController,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlashError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

type SlashRejection = (StatusCode, Json<SlashError>);

pub fn router(state: Arc<AppState>) -> Router {
    Router::new().route("/slack/command", post(slash_command)).with_state(state)
}

async fn slash_command(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, SlashRejection> {
    let correlation_id = Uuid::new_v4().to_string();

    if let Err(reason) = authenticate(&state, &headers, &body, Utc::now().timestamp()) {
        warn!(
            event_name = "ingress.slack.auth_rejected",
            correlation_id = %correlation_id,
            reason = %reason,
            "slash command failed authentication"
        );
        return Err(interface_rejection(
            ApplicationError::Authentication(reason.to_string()).into_interface(correlation_id),
        ));
    }

    let payload: SlashCommandPayload = serde_urlencoded::from_bytes(&body).map_err(|error| {
        warn!(
            event_name = "ingress.slack.payload_invalid",
            correlation_id = %correlation_id,
            error = %error,
            "slash command body is not a valid form payload"
        );
        interface_rejection(
            ApplicationError::InvalidPayload(error.to_string())
                .into_interface(correlation_id.clone()),
        )
    })?;

    let command = resolve(&payload.text, &payload.user_id, &state.blocked_users);
    let mode = ResponseMode::select(state.response_mode, payload.response_url.as_deref());
    info!(
        event_name = "ingress.slack.command_resolved",
        correlation_id = %correlation_id,
        user_id = %payload.user_id,
        channel_id = %payload.channel_id,
        command = %payload.command,
        resolved = ?command,
        deferred = matches!(mode, ResponseMode::Deferred { .. }),
        "slash command resolved"
    );

    match state.controller.respond(command, mode, &correlation_id).await {
        Ok(Reply::Message(message)) => Ok((StatusCode::OK, Json(message)).into_response()),
        Ok(Reply::Acknowledged) => Ok(StatusCode::OK.into_response()),
        Err(gateway_error) => {
            error!(
                event_name = "ingress.slack.reply_failed",
                correlation_id = %correlation_id,
                error = %gateway_error,
                "slash command could not be answered"
            );
            Err(interface_rejection(
                ApplicationError::from(gateway_error).into_interface(correlation_id),
            ))
        }
    }
}

fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
    now_unix: i64,
) -> Result<(), AuthError> {
    let timestamp = header_value(headers, TIMESTAMP_HEADER)?;
    let signature = header_value(headers, SIGNATURE_HEADER)?;

    let request = SignedRequest::new(timestamp, body, signature);
    verify(state.signing_secret.expose_secret().as_bytes(), &request)?;
    check_freshness(timestamp, now_unix, state.max_request_age_secs)
}

fn header_value<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, AuthError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingHeader(name))
}

/// Unauthorized replies carry no correlation id, so nothing about the
/// rejected request is echoed back.
fn interface_rejection(error: InterfaceError) -> SlashRejection {
    let (status, correlation_id) = match &error {
        InterfaceError::BadRequest { .. } => {
            (StatusCode::BAD_REQUEST, Some(error.correlation_id()))
        }
        InterfaceError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, None),
        InterfaceError::ServiceUnavailable { .. } | InterfaceError::Internal { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, Some(error.correlation_id()))
        }
    };

    (
        status,
        Json(SlashError {
            error: error.user_message().to_string(),
            correlation_id: correlation_id.map(str::to_owned),
        }),
    )
}
