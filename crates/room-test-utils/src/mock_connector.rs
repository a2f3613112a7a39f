//! Mock media engine for session tests.
//!
//! `MockConnector` can be configured to:
//! - Accept or reject connections
//! - Hold `connect()` until the test releases it
//! - Emit transport events before `connect()` returns
//! - Fail publishing
//!
//! Every connection shares the connector's recorders, so tests can assert on
//! publishes and disconnects after the session has dropped the connection.
//! Like a real media engine, each connection keeps its `TransportEvents` for
//! as long as it lives.
//!
//! # Example
//!
//! ```rust,ignore
//! use room_test_utils::MockConnector;
//!
//! let connector = Arc::new(MockConnector::accepting().with_gate());
//! // ... session.join() is now parked in Connecting
//! connector.release_connect();
//! ```

use async_trait::async_trait;
use common::types::TrackKind;
use room_client::{
    Connection, Connector, Credential, LocalTrack, RoomError, TransportEvent, TransportEvents,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Shared recorders for everything the session did to its connections.
#[derive(Debug, Default)]
pub struct ConnectionLog {
    published: Mutex<Vec<TrackKind>>,
    disconnects: AtomicUsize,
}

impl ConnectionLog {
    /// Kinds published, in order, across all connections.
    pub fn published(&self) -> Vec<TrackKind> {
        self.published.lock().unwrap().clone()
    }

    /// Number of `disconnect()` calls across all connections.
    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

/// Mock `Connector`.
#[derive(Debug, Default)]
pub struct MockConnector {
    failure: Option<String>,
    fail_publish: bool,
    connect_delay: Option<Duration>,
    disconnect_delay: Option<Duration>,
    gate: Option<Arc<Notify>>,
    events_on_connect: Vec<TransportEvent>,
    log: Arc<ConnectionLog>,
    connect_count: AtomicUsize,
    urls: Mutex<Vec<String>>,
    tokens: Mutex<Vec<String>>,
    last_events: Mutex<Option<TransportEvents>>,
}

impl MockConnector {
    /// A connector whose connections always succeed.
    pub fn accepting() -> Self {
        Self::default()
    }

    /// A connector whose connections always fail with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Make `publish()` fail on every connection.
    pub fn with_publish_failure(mut self) -> Self {
        self.fail_publish = true;
        self
    }

    /// Delay `connect()` by `delay`.
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    /// Delay `disconnect()` by `delay`.
    pub fn with_disconnect_delay(mut self, delay: Duration) -> Self {
        self.disconnect_delay = Some(delay);
        self
    }

    /// Park `connect()` until [`MockConnector::release_connect`] is called.
    pub fn with_gate(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    /// Emit `events` through the sink before `connect()` returns.
    pub fn with_events_on_connect(mut self, events: Vec<TransportEvent>) -> Self {
        self.events_on_connect = events;
        self
    }

    /// Let one parked (or the next) `connect()` proceed.
    pub fn release_connect(&self) {
        self.gate
            .as_ref()
            .expect("release_connect requires with_gate()")
            .notify_one();
    }

    /// Number of `connect()` calls.
    pub fn connect_count(&self) -> usize {
        self.connect_count.load(Ordering::SeqCst)
    }

    /// URLs passed to `connect()`.
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    /// Credential tokens passed to `connect()`.
    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    /// Publish and disconnect recorders.
    pub fn log(&self) -> Arc<ConnectionLog> {
        Arc::clone(&self.log)
    }

    /// Sink handed to the most recent `connect()`.
    pub fn events(&self) -> TransportEvents {
        self.last_events
            .lock()
            .unwrap()
            .clone()
            .expect("connect() has not been called")
    }

    /// Emit an event through the most recent connection.
    pub async fn emit(&self, event: TransportEvent) {
        self.events().emit(event).await.expect("session mailbox closed");
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        url: &str,
        credential: &Credential,
        events: TransportEvents,
    ) -> Result<Box<dyn Connection>, RoomError> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        self.tokens.lock().unwrap().push(credential.token().to_string());
        *self.last_events.lock().unwrap() = Some(events.clone());

        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        if let Some(message) = &self.failure {
            return Err(RoomError::Connection(message.clone()));
        }

        for event in &self.events_on_connect {
            let _ = events.emit(event.clone()).await;
        }

        Ok(Box::new(MockConnection {
            fail_publish: self.fail_publish,
            disconnect_delay: self.disconnect_delay,
            log: Arc::clone(&self.log),
            events,
        }))
    }
}

/// Connection produced by `MockConnector`.
#[derive(Debug)]
pub struct MockConnection {
    fail_publish: bool,
    disconnect_delay: Option<Duration>,
    log: Arc<ConnectionLog>,
    events: TransportEvents,
}

impl MockConnection {
    /// Sink this connection reports remote activity through.
    pub fn events(&self) -> &TransportEvents {
        &self.events
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn publish(&self, track: &LocalTrack) -> Result<(), RoomError> {
        if self.fail_publish {
            return Err(RoomError::Connection(format!(
                "publish of {} rejected",
                track.kind
            )));
        }
        self.log.published.lock().unwrap().push(track.kind);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), RoomError> {
        if let Some(delay) = self.disconnect_delay {
            tokio::time::sleep(delay).await;
        }
        self.log.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
