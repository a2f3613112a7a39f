//! Room client error types.
//!
//! One enum covers every failure the session core can report. Variants map
//! to the user-visible outcome: device problems degrade the preview, auth and
//! connection problems send the presenter back to the pre-join view, state
//! errors reject a request without changing anything.

use thiserror::Error;

/// Room client error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// No capture device could be opened.
    #[error("Device error: {0}")]
    Device(String),

    /// Credential exchange was rejected or failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Transport could not be established or failed while joining.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request is not valid in the current phase.
    #[error("Invalid state: {0}")]
    State(String),

    /// Status side-channel update failed. Never surfaced to callers.
    #[error("Status notification failed: {0}")]
    Notify(String),

    /// The join attempt was abandoned by `leave()`.
    #[error("Join cancelled")]
    Cancelled,

    /// Internal plumbing failure (actor gone, channel closed).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RoomError {
    /// Short label for metrics and logs (bounded cardinality).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RoomError::Device(_) => "device",
            RoomError::Auth(_) => "auth",
            RoomError::Connection(_) => "connection",
            RoomError::State(_) => "state",
            RoomError::Notify(_) => "notify",
            RoomError::Cancelled => "cancelled",
            RoomError::Internal(_) => "internal",
        }
    }

    /// Message suitable for showing on the pre-join view.
    ///
    /// The credential service's own message is shown as-is; transport and
    /// internal details stay in the logs.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            RoomError::Device(_) => "Camera and microphone are unavailable".to_string(),
            RoomError::Auth(msg) => msg.clone(),
            RoomError::Connection(_) => "Could not connect to the room".to_string(),
            RoomError::State(_) => "A join is already in progress".to_string(),
            RoomError::Cancelled => "Join cancelled".to_string(),
            RoomError::Notify(_) | RoomError::Internal(_) => {
                "An internal error occurred".to_string()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formatting() {
        assert_eq!(
            RoomError::Auth("bad identity".to_string()).to_string(),
            "Authentication failed: bad identity"
        );
        assert_eq!(RoomError::Cancelled.to_string(), "Join cancelled");
        assert_eq!(
            RoomError::State("phase is Connected".to_string()).to_string(),
            "Invalid state: phase is Connected"
        );
    }

    #[test]
    fn test_client_message_surfaces_auth_reason() {
        let err = RoomError::Auth("bad identity".to_string());
        assert_eq!(err.client_message(), "bad identity");
    }

    #[test]
    fn test_client_messages_hide_internal_details() {
        let err = RoomError::Connection("tls handshake failed at 10.0.0.7:7880".to_string());
        assert!(!err.client_message().contains("10.0.0.7"));

        let err = RoomError::Internal("mailbox closed".to_string());
        assert_eq!(err.client_message(), "An internal error occurred");
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(RoomError::Device(String::new()).kind(), "device");
        assert_eq!(RoomError::Auth(String::new()).kind(), "auth");
        assert_eq!(RoomError::Connection(String::new()).kind(), "connection");
        assert_eq!(RoomError::State(String::new()).kind(), "state");
        assert_eq!(RoomError::Notify(String::new()).kind(), "notify");
        assert_eq!(RoomError::Cancelled.kind(), "cancelled");
        assert_eq!(RoomError::Internal(String::new()).kind(), "internal");
    }
}
