//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports the [`secrecy`] types used for join credentials and the token
//! service signing secret. `SecretString` implements `Debug` with redaction,
//! so a struct deriving `Debug` that holds one is safe to log with `{:?}` or
//! through `tracing`. Values are zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::SecretString;
//! use secrecy::ExposeSecret;
//!
//! #[derive(Debug)]
//! struct JoinCredential {
//!     room: String,
//!     token: SecretString,
//! }
//!
//! let credential = JoinCredential {
//!     room: "room-42".to_string(),
//!     token: SecretString::from("eyJhbGciOi..."),
//! };
//!
//! // Debug output never shows the token
//! println!("{:?}", credential);
//!
//! // Reading the value is always explicit
//! let token: &str = credential.token.expose_secret();
//! ```
//!
//! Use `SecretString` for join credentials, API secrets and bearer tokens.

pub use secrecy::{ExposeSecret, SecretBox, SecretString};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("join-token");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("join-token"));
    }

    #[test]
    fn test_expose_secret_returns_inner_value() {
        let secret = SecretString::from("api-secret");
        assert_eq!(secret.expose_secret(), "api-secret");
    }

    #[test]
    fn test_deserialize_token_response() {
        #[derive(Debug, Deserialize)]
        struct TokenBody {
            token: SecretString,
        }

        let body: TokenBody = serde_json::from_str(r#"{"token": "abc"}"#).expect("deserialize");

        assert_eq!(body.token.expose_secret(), "abc");
        let debug = format!("{body:?}");
        assert!(!debug.contains("abc"));
        assert!(debug.contains("REDACTED"));
    }
}
