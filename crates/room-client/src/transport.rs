//! Seam to the external media engine.
//!
//! The engine owns negotiation, encoding and routing. The session only needs
//! to connect with a credential, publish local tracks, disconnect, and hear
//! about remote track changes through `TransportEvents`.

use crate::credential::Credential;
use crate::errors::RoomError;
use crate::media::LocalTrack;
use crate::registry::RemoteTrackEntry;
use crate::session::messages::SessionMessage;

use async_trait::async_trait;
use common::types::{ParticipantIdentity, TrackSid};
use std::fmt;
use tokio::sync::mpsc;

/// Remote activity reported by a live connection.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A remote track became playable.
    TrackSubscribed(RemoteTrackEntry),

    /// A remote track went away.
    TrackUnsubscribed { track_sid: TrackSid },

    /// A remote participant left. Their tracks should already be gone.
    ParticipantDisconnected {
        participant_identity: ParticipantIdentity,
    },

    /// The transport dropped without `leave()`.
    Disconnected { reason: String },
}

/// Sink a connection uses to report events for one join attempt.
///
/// Events are tagged with the attempt generation; the session discards events
/// from attempts it has already abandoned.
///
/// The sink does not keep the session alive: a connection may hold it for
/// its whole lifetime while the session still stops once every
/// `SessionHandle` is dropped.
#[derive(Clone)]
pub struct TransportEvents {
    generation: u64,
    sender: mpsc::WeakSender<SessionMessage>,
}

impl fmt::Debug for TransportEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportEvents")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl TransportEvents {
    pub(crate) fn new(generation: u64, sender: mpsc::WeakSender<SessionMessage>) -> Self {
        Self { generation, sender }
    }

    /// Attempt generation these events belong to.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Deliver an event to the session.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Internal` if the session has shut down.
    pub async fn emit(&self, event: TransportEvent) -> Result<(), RoomError> {
        let sender = self
            .sender
            .upgrade()
            .ok_or_else(|| RoomError::Internal("session has shut down".to_string()))?;

        sender
            .send(SessionMessage::Transport {
                generation: self.generation,
                event,
            })
            .await
            .map_err(|e| RoomError::Internal(format!("channel send failed: {e}")))
    }
}

/// An established connection to a room.
#[async_trait]
pub trait Connection: Send + Sync + fmt::Debug {
    /// Publish a local track.
    async fn publish(&self, track: &LocalTrack) -> Result<(), RoomError>;

    /// Close the connection.
    async fn disconnect(&self) -> Result<(), RoomError>;
}

/// Factory for connections (the media engine client).
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `url` using `credential`. Remote activity is reported
    /// through `events` for as long as the connection lives.
    async fn connect(
        &self,
        url: &str,
        credential: &Credential,
        events: TransportEvents,
    ) -> Result<Box<dyn Connection>, RoomError>;
}
