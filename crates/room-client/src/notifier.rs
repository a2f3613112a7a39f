//! Best-effort class status updates.
//!
//! The scheduling service is told when a class starts, goes live, or falls
//! back to scheduled. Updates are fire-and-forget: failures are logged and
//! counted, never returned to the session.

use crate::config::ClientConfig;
use crate::errors::RoomError;
use crate::observability::metrics;

use common::types::RoomName;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle status of a class as known to the scheduling service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassStatus {
    /// A join was accepted.
    Starting,
    /// The presenter is connected.
    Ongoing,
    /// The join failed or the session dropped.
    Scheduled,
}

impl ClassStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ClassStatus::Starting => "starting",
            ClassStatus::Ongoing => "ongoing",
            ClassStatus::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize)]
struct StatusUpdate<'a> {
    #[serde(rename = "_id")]
    id: &'a str,
    status: ClassStatus,
}

#[derive(Debug)]
struct Endpoint {
    http: reqwest::Client,
    url: String,
}

/// Sends `PUT {status_url}` updates. Disabled when no URL is configured.
#[derive(Debug, Clone, Default)]
pub struct StatusNotifier {
    endpoint: Option<Arc<Endpoint>>,
}

impl StatusNotifier {
    /// Build a notifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Internal` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, RoomError> {
        let Some(url) = config.status_url.clone() else {
            return Ok(Self::disabled());
        };

        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| RoomError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: Some(Arc::new(Endpoint { http, url })),
        })
    }

    /// A notifier that drops every update.
    #[must_use]
    pub fn disabled() -> Self {
        Self { endpoint: None }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Send an update in the background. Never blocks the caller.
    pub fn notify(&self, room: &RoomName, status: ClassStatus) -> JoinHandle<()> {
        let notifier = self.clone();
        let room = room.clone();

        tokio::spawn(async move {
            match notifier.send(&room, status).await {
                Ok(true) => metrics::record_status_notification(status.as_str(), "success"),
                Ok(false) => metrics::record_status_notification(status.as_str(), "disabled"),
                Err(e) => {
                    warn!(
                        target: "room.notifier",
                        room = %room,
                        status = %status,
                        error = %e,
                        "Status update failed"
                    );
                    metrics::record_status_notification(status.as_str(), "error");
                }
            }
        })
    }

    /// Send an update and wait for the result.
    ///
    /// Returns `Ok(false)` when the notifier is disabled.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Notify` on network failure or a non-2xx response.
    #[instrument(skip_all, fields(room = %room, status = %status))]
    pub async fn send(&self, room: &RoomName, status: ClassStatus) -> Result<bool, RoomError> {
        let Some(endpoint) = &self.endpoint else {
            debug!(target: "room.notifier", "Status notifications disabled, skipping");
            return Ok(false);
        };

        let response = endpoint
            .http
            .put(&endpoint.url)
            .json(&StatusUpdate {
                id: room.as_str(),
                status,
            })
            .send()
            .await
            .map_err(|e| RoomError::Notify(format!("status service unreachable: {e}")))?;

        let code = response.status();
        if !code.is_success() {
            return Err(RoomError::Notify(format!(
                "status update failed with status {}",
                code.as_u16()
            )));
        }

        debug!(target: "room.notifier", "Status update delivered");
        Ok(true)
    }
}
