//! # Room Test Utilities
//!
//! Mocks and fixtures for testing the room client without a media engine,
//! capture hardware or live HTTP services.
//!
//! ## Modules
//!
//! - `mock_connector` - Scriptable `Connector`/`Connection` that records publishes and disconnects
//! - `mock_capture` - `CaptureBackend` with per-kind failure injection
//! - `fixtures` - wiremock endpoints for the credential and status services, test data
//!
//! ## Usage
//!
//! ```rust,ignore
//! use room_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let server = MockServer::start().await;
//!     mount_credential_ok(&server, "T1").await;
//!
//!     let connector = Arc::new(MockConnector::accepting());
//!     let media = MediaAcquirer::new(Arc::new(MockCaptureBackend::working()));
//!     let (session, _task) =
//!         SessionController::spawn(&test_config(&server), media, connector.clone()).unwrap();
//!
//!     session.join(room(), alice()).await.unwrap();
//!     connector.emit(TransportEvent::TrackSubscribed(remote_track("TR_v1", "bob", TrackKind::Video))).await;
//! }
//! ```

pub mod fixtures;
pub mod mock_capture;
pub mod mock_connector;

pub use fixtures::*;
pub use mock_capture::*;
pub use mock_connector::*;
