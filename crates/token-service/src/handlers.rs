//! HTTP handlers.

use crate::errors::TokenServiceError;
use crate::routes::AppState;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use common::jwt::issue_room_token;
use common::types::{ParticipantIdentity, RoomName};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

const MISSING_FIELDS: &str = "roomName and participantName are required";

/// Body of `POST /token`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    #[serde(default)]
    pub room_name: Option<String>,
    #[serde(default)]
    pub participant_name: Option<String>,
}

/// Response of `POST /token`.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Issue a room-join token.
///
/// Both fields must be present and non-empty; anything else (including a
/// body that is not JSON) is a 400 with the same message.
#[instrument(skip_all, name = "token_service.create_token")]
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, TokenServiceError> {
    let request = body.map(|Json(r)| r).unwrap_or_else(|rejection| {
        debug!(target: "token_service.handlers", error = %rejection, "Unreadable token request body");
        TokenRequest::default()
    });

    let (Some(room), Some(identity)) = (
        request.room_name.filter(|s| !s.is_empty()),
        request.participant_name.filter(|s| !s.is_empty()),
    ) else {
        return Err(TokenServiceError::BadRequest(MISSING_FIELDS.to_string()));
    };

    let room = RoomName::new(room);
    let identity = ParticipantIdentity::new(identity);

    let token = issue_room_token(
        &state.config.api_key,
        &state.config.api_secret,
        &room,
        &identity,
        state.config.token_ttl,
    )?;

    info!(
        target: "token_service.handlers",
        room = %room,
        identity = %identity,
        ttl_secs = state.config.token_ttl.as_secs(),
        "Room token issued"
    );

    Ok(Json(TokenResponse { token }))
}

/// Liveness probe.
pub async fn health_check() -> &'static str {
    "OK"
}
