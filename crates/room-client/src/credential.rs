//! Credential exchange with the signaling-trust service.
//!
//! A join credential is requested once per join attempt and never cached.
//! The token is held as a `SecretString` and never logged; only the status
//! code, room and identity are.

use crate::config::ClientConfig;
use crate::errors::RoomError;

use common::secret::{ExposeSecret, SecretString};
use common::types::{ParticipantIdentity, RoomName};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Connection timeout for the credential HTTP client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Short-lived join credential scoped to one `(room, identity)`.
#[derive(Debug)]
pub struct Credential {
    token: SecretString,
}

impl Credential {
    /// Wrap a token received from the signaling-trust service.
    #[must_use]
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }

    /// Access the raw token. Only the transport connector should call this.
    #[must_use]
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialRequest<'a> {
    room_name: &'a str,
    participant_name: &'a str,
}

#[derive(Deserialize)]
struct CredentialResponse {
    token: SecretString,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialErrorBody {
    error_message: String,
}

/// Client for `POST {signaling_url}/token`.
#[derive(Clone, Debug)]
pub struct CredentialClient {
    http: reqwest::Client,
    endpoint: String,
}

impl CredentialClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Internal` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, RoomError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| RoomError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!("{}/token", config.signaling_url.trim_end_matches('/')),
        })
    }

    /// Exchange `(room, identity)` for a join credential.
    ///
    /// No retries; every failure is reported as `RoomError::Auth`.
    #[instrument(skip_all, fields(room = %room, identity = %identity))]
    pub async fn request_credential(
        &self,
        room: &RoomName,
        identity: &ParticipantIdentity,
    ) -> Result<Credential, RoomError> {
        debug!(
            target: "room.credential",
            url = %self.endpoint,
            "Requesting join credential"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .json(&CredentialRequest {
                room_name: room.as_str(),
                participant_name: identity.as_str(),
            })
            .send()
            .await
            .map_err(|e| {
                warn!(target: "room.credential", error = %e, "Credential request failed");
                RoomError::Auth(format!("credential service unreachable: {e}"))
            })?;

        let status = response.status();

        if status.is_success() {
            let body: CredentialResponse = response.json().await.map_err(|e| {
                warn!(
                    target: "room.credential",
                    error = %e,
                    "Failed to parse credential response"
                );
                RoomError::Auth("malformed credential response".to_string())
            })?;

            if body.token.expose_secret().is_empty() {
                warn!(target: "room.credential", "Credential response carried an empty token");
                return Err(RoomError::Auth("malformed credential response".to_string()));
            }

            debug!(target: "room.credential", status = %status, "Join credential obtained");
            return Ok(Credential::new(body.token));
        }

        warn!(
            target: "room.credential",
            status = %status,
            "Credential request rejected"
        );

        match response.json::<CredentialErrorBody>().await {
            Ok(body) if !body.error_message.is_empty() => Err(RoomError::Auth(body.error_message)),
            _ => Err(RoomError::Auth(format!(
                "credential request failed with status {}",
                status.as_u16()
            ))),
        }
    }
}
