//! Session actor message types.
//!
//! Commands from handles, results of spawned attempt tasks and transport
//! events all share one mailbox, so the actor sees them in a single order.

use crate::credential::Credential;
use crate::errors::RoomError;
use crate::transport::{Connection, TransportEvent};

use common::types::{ParticipantIdentity, RoomName};
use std::fmt;
use tokio::sync::oneshot;

/// Phase of the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Authenticating,
    Connecting,
    Connected,
    Leaving,
}

impl SessionPhase {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Authenticating => "authenticating",
            SessionPhase::Connecting => "connecting",
            SessionPhase::Connected => "connected",
            SessionPhase::Leaving => "leaving",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messages handled by the `SessionController` actor.
#[derive(Debug)]
pub enum SessionMessage {
    /// Start a join attempt.
    Join {
        room: RoomName,
        identity: ParticipantIdentity,
        respond_to: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Leave the room (or abandon the attempt in flight).
    Leave { respond_to: oneshot::Sender<()> },

    /// Credential exchange finished for an attempt.
    CredentialResolved {
        generation: u64,
        result: Result<Credential, RoomError>,
    },

    /// Transport connect finished for an attempt.
    ConnectResolved {
        generation: u64,
        result: Result<Box<dyn Connection>, RoomError>,
    },

    /// Event raised by the transport of an attempt.
    Transport {
        generation: u64,
        event: TransportEvent,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_labels() {
        assert_eq!(SessionPhase::default(), SessionPhase::Idle);
        assert_eq!(SessionPhase::Authenticating.to_string(), "authenticating");
        assert_eq!(SessionPhase::Leaving.as_str(), "leaving");
    }
}
