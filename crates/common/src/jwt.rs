//! Room-join JWT claims and signing helpers.
//!
//! The token service issues short-lived HS256 tokens that grant one identity
//! permission to join one room. The media engine verifies them with the same
//! API key/secret pair.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Only HS256 is accepted on verification
//! - Error messages are generic; details are logged at debug level
//! - The `sub` field is redacted in `Debug` output
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{issue_room_token, verify_room_token};
//!
//! let token = issue_room_token("devkey", &secret, &room, &identity, ttl)?;
//! let claims = verify_room_token(&token, "devkey", &secret)?;
//! assert!(claims.video.room_join);
//! ```

use crate::secret::{ExposeSecret, SecretString};
use crate::types::{ParticipantIdentity, RoomName};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Maximum accepted token size in bytes (8KB).
///
/// Room tokens are ~300 bytes; anything past this limit is rejected before
/// any base64 decoding or signature work.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Default room token lifetime (6 hours, one long class).
pub const DEFAULT_ROOM_TOKEN_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Errors from issuing or verifying room tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtError {
    /// Token size exceeds maximum allowed.
    #[error("The room token is invalid or expired")]
    TokenTooLarge,

    /// Signature, structure, issuer or lifetime check failed.
    #[error("The room token is invalid or expired")]
    InvalidToken,

    /// Signing failed.
    #[error("Failed to sign room token: {0}")]
    Signing(String),
}

/// Media permissions carried by a room token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    /// Permission to join the room named in `room`.
    pub room_join: bool,

    /// Room the grant applies to.
    pub room: String,
}

/// Room token claims.
///
/// `sub` is the participant identity and is redacted in `Debug` output.
#[derive(Clone, Serialize, Deserialize)]
pub struct RoomClaims {
    /// Issuer (API key of the token service).
    pub iss: String,

    /// Subject (participant identity).
    pub sub: String,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Not-before timestamp (Unix epoch seconds).
    pub nbf: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Room grant.
    pub video: VideoGrant,
}

impl fmt::Debug for RoomClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomClaims")
            .field("iss", &self.iss)
            .field("sub", &"[REDACTED]")
            .field("iat", &self.iat)
            .field("nbf", &self.nbf)
            .field("exp", &self.exp)
            .field("video", &self.video)
            .finish()
    }
}

impl RoomClaims {
    /// Build claims granting `identity` permission to join `room`, valid
    /// from `now` for `ttl`.
    #[must_use]
    pub fn for_join(
        api_key: &str,
        room: &RoomName,
        identity: &ParticipantIdentity,
        now: i64,
        ttl: Duration,
    ) -> Self {
        // Safe cast: token lifetimes are hours, far below i64::MAX seconds
        #[allow(clippy::cast_possible_wrap)]
        let ttl_secs = ttl.as_secs() as i64;

        Self {
            iss: api_key.to_string(),
            sub: identity.as_str().to_string(),
            iat: now,
            nbf: now,
            exp: now.saturating_add(ttl_secs),
            video: VideoGrant {
                room_join: true,
                room: room.as_str().to_string(),
            },
        }
    }

    /// Whether these claims allow joining `room`.
    #[must_use]
    pub fn grants_join(&self, room: &RoomName) -> bool {
        self.video.room_join && self.video.room == room.as_str()
    }
}

/// Issue a signed room-join token.
///
/// # Errors
///
/// Returns `JwtError::Signing` if the token cannot be encoded.
pub fn issue_room_token(
    api_key: &str,
    api_secret: &SecretString,
    room: &RoomName,
    identity: &ParticipantIdentity,
    ttl: Duration,
) -> Result<String, JwtError> {
    let now = chrono::Utc::now().timestamp();
    let claims = RoomClaims::for_join(api_key, room, identity, now, ttl);

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(api_secret.expose_secret().as_bytes()),
    )
    .map_err(|e| JwtError::Signing(e.to_string()))
}

/// Verify a room token's signature, issuer and lifetime.
///
/// # Errors
///
/// - `JwtError::TokenTooLarge` if the token exceeds `MAX_JWT_SIZE_BYTES`
/// - `JwtError::InvalidToken` for any structural, signature or claim failure
pub fn verify_room_token(
    token: &str,
    api_key: &str,
    api_secret: &SecretString,
) -> Result<RoomClaims, JwtError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtError::TokenTooLarge);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[api_key]);
    validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);
    validation.validate_nbf = true;

    decode::<RoomClaims>(
        token,
        &DecodingKey::from_secret(api_secret.expose_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Room token rejected");
        JwtError::InvalidToken
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("test-api-secret-with-enough-entropy")
    }

    #[test]
    fn test_issue_and_verify() {
        let room = RoomName::new("room-42");
        let identity = ParticipantIdentity::new("alice");

        let token = issue_room_token("devkey", &secret(), &room, &identity, DEFAULT_ROOM_TOKEN_TTL)
            .expect("issue should succeed");
        let claims = verify_room_token(&token, "devkey", &secret()).expect("verify should succeed");

        assert_eq!(claims.iss, "devkey");
        assert_eq!(claims.sub, "alice");
        assert!(claims.grants_join(&room));
        assert!(!claims.grants_join(&RoomName::new("room-43")));
        assert_eq!(claims.exp - claims.nbf, 6 * 60 * 60);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = issue_room_token(
            "devkey",
            &secret(),
            &RoomName::new("room-42"),
            &ParticipantIdentity::new("alice"),
            DEFAULT_ROOM_TOKEN_TTL,
        )
        .unwrap();

        let result = verify_room_token(&token, "devkey", &SecretString::from("other-secret"));
        assert_eq!(result.unwrap_err(), JwtError::InvalidToken);
    }

    #[test]
    fn test_verify_rejects_wrong_issuer() {
        let token = issue_room_token(
            "devkey",
            &secret(),
            &RoomName::new("room-42"),
            &ParticipantIdentity::new("alice"),
            DEFAULT_ROOM_TOKEN_TTL,
        )
        .unwrap();

        let result = verify_room_token(&token, "otherkey", &secret());
        assert_eq!(result.unwrap_err(), JwtError::InvalidToken);
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let claims = RoomClaims::for_join(
            "devkey",
            &RoomName::new("room-42"),
            &ParticipantIdentity::new("alice"),
            chrono::Utc::now().timestamp() - 7200,
            Duration::from_secs(60),
        );
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret().expose_secret().as_bytes()),
        )
        .unwrap();

        let result = verify_room_token(&token, "devkey", &secret());
        assert_eq!(result.unwrap_err(), JwtError::InvalidToken);
    }

    #[test]
    fn test_verify_rejects_oversized_token() {
        let token = "a".repeat(MAX_JWT_SIZE_BYTES + 1);
        let result = verify_room_token(&token, "devkey", &secret());
        assert_eq!(result.unwrap_err(), JwtError::TokenTooLarge);
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let result = verify_room_token("not.a.jwt", "devkey", &secret());
        assert_eq!(result.unwrap_err(), JwtError::InvalidToken);
    }

    #[test]
    fn test_claims_debug_redacts_subject() {
        let claims = RoomClaims::for_join(
            "devkey",
            &RoomName::new("room-42"),
            &ParticipantIdentity::new("alice-secret-identity"),
            0,
            Duration::from_secs(60),
        );

        let debug_str = format!("{claims:?}");
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("alice-secret-identity"));
        assert!(debug_str.contains("room-42"));
    }

    #[test]
    fn test_video_grant_wire_format() {
        let grant = VideoGrant {
            room_join: true,
            room: "room-42".to_string(),
        };
        let json = serde_json::to_value(&grant).unwrap();
        assert_eq!(json["roomJoin"], true);
        assert_eq!(json["room"], "room-42");
    }
}
