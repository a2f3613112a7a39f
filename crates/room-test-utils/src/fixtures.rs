//! wiremock endpoints and test data.

use common::types::{ParticipantIdentity, RoomName, TrackKind, TrackSid};
use room_client::{ClientConfig, RemoteTrackEntry, RemoteTrackHandle};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path of the status endpoint mounted by [`mount_status_endpoint`].
pub const STATUS_PATH: &str = "/live-class/status";

/// Room used throughout the session tests.
pub fn room() -> RoomName {
    RoomName::new("room-42")
}

/// Presenter identity used throughout the session tests.
pub fn alice() -> ParticipantIdentity {
    ParticipantIdentity::new("alice")
}

/// Client config pointing both HTTP collaborators at `server`.
pub fn test_config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        signaling_url: server.uri(),
        media_url: "ws://media.test:7880".to_string(),
        status_url: Some(format!("{}{STATUS_PATH}", server.uri())),
        http_timeout: Duration::from_secs(2),
        disconnect_timeout: Duration::from_millis(200),
    }
}

/// `POST /token` answers `{"token": token}`.
pub async fn mount_credential_ok(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": token })))
        .mount(server)
        .await;
}

/// `POST /token` answers `{"token": token}` after `delay`.
pub async fn mount_credential_delayed(server: &MockServer, token: &str, delay: Duration) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": token }))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// `POST /token` answers `status` with `{"errorMessage": message}`.
pub async fn mount_credential_rejected(server: &MockServer, status: u16, message: &str) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(status).set_body_json(json!({ "errorMessage": message })),
        )
        .mount(server)
        .await;
}

/// `PUT {STATUS_PATH}` accepts every update.
pub async fn mount_status_endpoint(server: &MockServer) {
    Mock::given(method("PUT"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

/// Status values received so far, in arrival order.
pub async fn status_updates(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == "PUT" && r.url.path() == STATUS_PATH)
        .map(|r| {
            let body: Value = serde_json::from_slice(&r.body).expect("status body is JSON");
            body["status"].as_str().expect("status field").to_string()
        })
        .collect()
}

/// Wait until at least `count` status updates arrived, then return them.
///
/// Updates are fire-and-forget, so tests must poll for them.
pub async fn wait_for_status_updates(server: &MockServer, count: usize) -> Vec<String> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let updates = status_updates(server).await;
        if updates.len() >= count || tokio::time::Instant::now() >= deadline {
            return updates;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Remote track entry whose handle wraps its own sid.
pub fn remote_track(sid: &str, identity: &str, kind: TrackKind) -> RemoteTrackEntry {
    RemoteTrackEntry::new(
        TrackSid::new(sid),
        ParticipantIdentity::new(identity),
        kind,
        RemoteTrackHandle::new(sid.to_string()),
    )
}
