//! Presenter room client.
//!
//! The session core of the presenter client: local media acquisition,
//! credential exchange, the join/leave state machine and remote track
//! bookkeeping. Media transport itself is delegated to an external engine
//! through the [`transport::Connector`] trait.
//!
//! # Usage
//!
//! ```rust,ignore
//! use room_client::{ClientConfig, MediaAcquirer, SessionController};
//!
//! let config = ClientConfig::from_env()?;
//! let media = MediaAcquirer::new(capture_backend);
//! media.acquire().await?;
//!
//! let (session, _task) = SessionController::spawn(&config, media.clone(), connector)?;
//! session.join(RoomName::new("room-42"), ParticipantIdentity::new("alice")).await?;
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod credential;
pub mod errors;
pub mod media;
pub mod notifier;
pub mod observability;
pub mod registry;
pub mod session;
pub mod transport;

pub use config::ClientConfig;
pub use credential::{Credential, CredentialClient};
pub use errors::RoomError;
pub use media::{CaptureBackend, CaptureDevice, LocalMediaState, LocalTrack, MediaAcquirer};
pub use notifier::{ClassStatus, StatusNotifier};
pub use registry::{RemoteTrackEntry, RemoteTrackHandle, TrackRegistry};
pub use session::{SessionController, SessionHandle, SessionPhase};
pub use transport::{Connection, Connector, TransportEvent, TransportEvents};
