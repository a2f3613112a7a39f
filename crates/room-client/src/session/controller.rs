//! `SessionController` - the room session state machine actor.
//!
//! One actor per presenter client. It owns the join attempt, the live
//! connection and the remote track registry; every mutation happens inside
//! its message loop.
//!
//! # Phases
//!
//! ```text
//! Idle -> Authenticating -> Connecting -> Connected
//!   ^          |                 |            |
//!   +----------+-----------------+------------+   (failure, remote drop)
//!   ^                                         |
//!   +---------------- Leaving <---------------+   (leave from any non-idle phase)
//! ```
//!
//! Credential exchange and transport connect run in spawned tasks so that
//! `leave()` is never stuck behind them. Their results come back through the
//! mailbox tagged with the attempt generation; results for an abandoned
//! attempt are discarded, and a connection established too late is closed.

use crate::config::ClientConfig;
use crate::credential::CredentialClient;
use crate::errors::RoomError;
use crate::media::MediaAcquirer;
use crate::notifier::{ClassStatus, StatusNotifier};
use crate::observability::metrics;
use crate::registry::{RemoteTrackEntry, TrackRegistry};
use crate::transport::{Connection, Connector, TransportEvent, TransportEvents};

use super::messages::{SessionMessage, SessionPhase};

use common::types::{ParticipantIdentity, RoomName, TrackKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Mailbox size. Transport events for a busy room arrive in bursts.
const SESSION_CHANNEL_BUFFER: usize = 256;

/// Handle to a `SessionController`. Cheap to clone.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionMessage>,
    cancel_token: CancellationToken,
    phase: watch::Receiver<SessionPhase>,
    tracks: watch::Receiver<Vec<RemoteTrackEntry>>,
}

impl SessionHandle {
    /// Join `room` as `identity`.
    ///
    /// Resolves once the session is Connected or the attempt has failed.
    ///
    /// # Errors
    ///
    /// - `RoomError::State` if a session is already active
    /// - `RoomError::Auth` if the credential exchange fails
    /// - `RoomError::Connection` if the transport cannot be established
    /// - `RoomError::Cancelled` if `leave()` abandons the attempt
    pub async fn join(
        &self,
        room: RoomName,
        identity: ParticipantIdentity,
    ) -> Result<(), RoomError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionMessage::Join {
                room,
                identity,
                respond_to: tx,
            })
            .await
            .map_err(|e| RoomError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| RoomError::Internal(format!("response receive failed: {e}")))?
    }

    /// Leave the room. A no-op when idle; otherwise always ends in Idle.
    pub async fn leave(&self) -> Result<(), RoomError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SessionMessage::Leave { respond_to: tx })
            .await
            .map_err(|e| RoomError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| RoomError::Internal(format!("response receive failed: {e}")))
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    /// Observe phase changes.
    #[must_use]
    pub fn subscribe_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase.clone()
    }

    /// Subscribed remote tracks in arrival order.
    #[must_use]
    pub fn remote_tracks(&self) -> Vec<RemoteTrackEntry> {
        self.tracks.borrow().clone()
    }

    /// Subscribed remote tracks of one kind, in arrival order.
    #[must_use]
    pub fn remote_tracks_of(&self, kind: TrackKind) -> Vec<RemoteTrackEntry> {
        self.tracks
            .borrow()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    /// Observe remote track changes.
    #[must_use]
    pub fn subscribe_tracks(&self) -> watch::Receiver<Vec<RemoteTrackEntry>> {
        self.tracks.clone()
    }

    /// Stop the actor. Any live connection is closed first.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// State of the one join attempt a session may have.
struct Attempt {
    generation: u64,
    room: RoomName,
    identity: ParticipantIdentity,
    /// Cancels the credential/connect tasks of this attempt.
    cancel: CancellationToken,
    /// Pending `join()` caller; taken once answered.
    respond_to: Option<oneshot::Sender<Result<(), RoomError>>>,
    connection: Option<Box<dyn Connection>>,
    /// Transport events received while still Connecting.
    pending_events: Vec<TransportEvent>,
    started_at: Instant,
}

/// The `SessionController` actor.
pub struct SessionController {
    receiver: mpsc::Receiver<SessionMessage>,
    /// Weak so that dropping every handle lets the loop end.
    sender: mpsc::WeakSender<SessionMessage>,
    cancel_token: CancellationToken,
    phase_tx: watch::Sender<SessionPhase>,
    tracks_tx: watch::Sender<Vec<RemoteTrackEntry>>,
    generation: u64,
    attempt: Option<Attempt>,
    registry: TrackRegistry,
    credentials: CredentialClient,
    connector: Arc<dyn Connector>,
    notifier: StatusNotifier,
    media: MediaAcquirer,
    media_url: String,
    disconnect_timeout: Duration,
}

impl SessionController {
    /// Spawn a session actor.
    ///
    /// `media` is the process-wide acquirer; tracks it holds when the
    /// session reaches Connected are published.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Internal` if an HTTP client cannot be built.
    pub fn spawn(
        config: &ClientConfig,
        media: MediaAcquirer,
        connector: Arc<dyn Connector>,
    ) -> Result<(SessionHandle, JoinHandle<()>), RoomError> {
        let credentials = CredentialClient::new(config)?;
        let notifier = StatusNotifier::new(config)?;

        let (sender, receiver) = mpsc::channel(SESSION_CHANNEL_BUFFER);
        let (phase_tx, phase_rx) = watch::channel(SessionPhase::Idle);
        let (tracks_tx, tracks_rx) = watch::channel(Vec::new());
        let cancel_token = CancellationToken::new();

        let actor = Self {
            receiver,
            sender: sender.downgrade(),
            cancel_token: cancel_token.clone(),
            phase_tx,
            tracks_tx,
            generation: 0,
            attempt: None,
            registry: TrackRegistry::new(),
            credentials,
            connector,
            notifier,
            media,
            media_url: config.media_url.clone(),
            disconnect_timeout: config.disconnect_timeout,
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = SessionHandle {
            sender,
            cancel_token,
            phase: phase_rx,
            tracks: tracks_rx,
        };

        Ok((handle, task_handle))
    }

    #[instrument(skip_all, name = "room.session")]
    async fn run(mut self) {
        debug!(target: "room.session", "SessionController started");

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    debug!(target: "room.session", "SessionController received cancellation signal");
                    self.teardown("shutdown").await;
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => self.handle_message(message).await,
                        None => {
                            debug!(target: "room.session", "SessionController channel closed, exiting");
                            self.teardown("handles dropped").await;
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "room.session",
            generations = self.generation,
            "SessionController stopped"
        );
    }

    async fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Join {
                room,
                identity,
                respond_to,
            } => self.handle_join(room, identity, respond_to),

            SessionMessage::Leave { respond_to } => {
                self.teardown("leave").await;
                let _ = respond_to.send(());
            }

            SessionMessage::CredentialResolved { generation, result } => {
                if !self.is_current(generation, SessionPhase::Authenticating) {
                    debug!(
                        target: "room.session",
                        generation,
                        "Discarding credential for abandoned attempt"
                    );
                    return;
                }
                match result {
                    Ok(credential) => self.start_connect(credential),
                    Err(e) => self.fail_attempt(e).await,
                }
            }

            SessionMessage::ConnectResolved { generation, result } => {
                if !self.is_current(generation, SessionPhase::Connecting) {
                    debug!(
                        target: "room.session",
                        generation,
                        "Discarding connect result for abandoned attempt"
                    );
                    if let Ok(connection) = result {
                        close_orphan(connection, self.disconnect_timeout).await;
                    }
                    return;
                }
                match result {
                    Ok(connection) => self.on_connected(connection).await,
                    Err(e) => self.fail_attempt(as_connection_error(e)).await,
                }
            }

            SessionMessage::Transport { generation, event } => {
                self.handle_transport(generation, event);
            }
        }
    }

    fn handle_join(
        &mut self,
        room: RoomName,
        identity: ParticipantIdentity,
        respond_to: oneshot::Sender<Result<(), RoomError>>,
    ) {
        let phase = self.phase();
        if phase != SessionPhase::Idle {
            debug!(
                target: "room.session",
                room = %room,
                phase = %phase,
                "Join rejected, session already active"
            );
            metrics::record_join_attempt("state");
            let _ = respond_to.send(Err(RoomError::State(format!(
                "join rejected while {phase}"
            ))));
            return;
        }

        let Some(sender) = self.sender.upgrade() else {
            let _ = respond_to.send(Err(RoomError::Internal(
                "session mailbox closed".to_string(),
            )));
            return;
        };

        self.generation += 1;
        let generation = self.generation;
        let cancel = self.cancel_token.child_token();

        info!(
            target: "room.session",
            room = %room,
            identity = %identity,
            generation,
            "Joining room"
        );

        self.attempt = Some(Attempt {
            generation,
            room: room.clone(),
            identity: identity.clone(),
            cancel: cancel.clone(),
            respond_to: Some(respond_to),
            connection: None,
            pending_events: Vec::new(),
            started_at: Instant::now(),
        });
        self.set_phase(SessionPhase::Authenticating);
        self.notifier.notify(&room, ClassStatus::Starting);

        let credentials = self.credentials.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                () = cancel.cancelled() => return,
                result = credentials.request_credential(&room, &identity) => result,
            };

            if sender
                .send(SessionMessage::CredentialResolved { generation, result })
                .await
                .is_err()
            {
                debug!(target: "room.session", generation, "Session gone, dropping credential");
            }
        });
    }

    fn start_connect(&mut self, credential: crate::credential::Credential) {
        let Some(sender) = self.sender.upgrade() else {
            return;
        };
        let Some(attempt) = &self.attempt else {
            return;
        };

        let generation = attempt.generation;
        let cancel = attempt.cancel.clone();
        let events = TransportEvents::new(generation, sender.downgrade());
        let connector = Arc::clone(&self.connector);
        let url = self.media_url.clone();
        let disconnect_timeout = self.disconnect_timeout;

        self.set_phase(SessionPhase::Connecting);

        tokio::spawn(async move {
            let result = connector.connect(&url, &credential, events).await;
            drop(credential);

            if cancel.is_cancelled() {
                if let Ok(connection) = result {
                    close_orphan(connection, disconnect_timeout).await;
                }
                return;
            }

            if let Err(e) = sender
                .send(SessionMessage::ConnectResolved { generation, result })
                .await
            {
                // Actor is gone; close what it can no longer own
                if let SessionMessage::ConnectResolved {
                    result: Ok(connection),
                    ..
                } = e.0
                {
                    close_orphan(connection, disconnect_timeout).await;
                }
            }
        });
    }

    async fn on_connected(&mut self, connection: Box<dyn Connection>) {
        let dropped = self.attempt.as_ref().and_then(|attempt| {
            attempt.pending_events.iter().find_map(|event| match event {
                TransportEvent::Disconnected { reason } => Some(reason.clone()),
                _ => None,
            })
        });
        if let Some(reason) = dropped {
            // Transport died before the join could be answered
            if let Some(attempt) = self.attempt.as_mut() {
                attempt.connection = Some(connection);
            }
            self.fail_attempt(RoomError::Connection(reason)).await;
            return;
        }

        self.set_phase(SessionPhase::Connected);

        for track in self.media.local_tracks() {
            if let Err(e) = connection.publish(&track).await {
                warn!(
                    target: "room.session",
                    kind = %track.kind,
                    error = %e,
                    "Failed to publish local track"
                );
                if let Some(attempt) = self.attempt.as_mut() {
                    attempt.connection = Some(connection);
                }
                self.fail_attempt(as_connection_error(e)).await;
                return;
            }
            debug!(target: "room.session", kind = %track.kind, "Local track published");
        }

        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };
        attempt.connection = Some(connection);
        let pending = std::mem::take(&mut attempt.pending_events);
        let room = attempt.room.clone();

        info!(
            target: "room.session",
            room = %room,
            identity = %attempt.identity,
            generation = attempt.generation,
            "Connected to room"
        );
        metrics::record_join_attempt("success");
        metrics::record_join_duration(attempt.started_at.elapsed());
        if let Some(tx) = attempt.respond_to.take() {
            let _ = tx.send(Ok(()));
        }
        self.notifier.notify(&room, ClassStatus::Ongoing);

        for event in pending {
            self.apply_event(event);
        }
    }

    fn handle_transport(&mut self, generation: u64, event: TransportEvent) {
        let phase = self.phase();
        if !self
            .attempt
            .as_ref()
            .is_some_and(|a| a.generation == generation)
        {
            debug!(
                target: "room.session",
                generation,
                "Discarding transport event for abandoned attempt"
            );
            return;
        }

        match phase {
            SessionPhase::Connecting => {
                if let Some(attempt) = self.attempt.as_mut() {
                    attempt.pending_events.push(event);
                }
            }
            SessionPhase::Connected => self.apply_event(event),
            _ => debug!(
                target: "room.session",
                phase = %phase,
                "Discarding transport event outside of a connection"
            ),
        }
    }

    fn apply_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::TrackSubscribed(entry) => {
                debug!(
                    target: "room.session",
                    track_sid = %entry.track_sid,
                    participant = %entry.participant_identity,
                    kind = %entry.kind,
                    "Remote track subscribed"
                );
                self.registry.insert(entry);
                self.publish_tracks();
            }

            TransportEvent::TrackUnsubscribed { track_sid } => {
                if self.registry.remove(&track_sid).is_some() {
                    debug!(target: "room.session", track_sid = %track_sid, "Remote track unsubscribed");
                    self.publish_tracks();
                } else {
                    debug!(
                        target: "room.session",
                        track_sid = %track_sid,
                        "Unsubscribe for unknown track ignored"
                    );
                }
            }

            TransportEvent::ParticipantDisconnected {
                participant_identity,
            } => {
                let removed = self.registry.remove_participant(&participant_identity);
                if removed.is_empty() {
                    debug!(
                        target: "room.session",
                        participant = %participant_identity,
                        "Remote participant disconnected"
                    );
                } else {
                    warn!(
                        target: "room.session",
                        participant = %participant_identity,
                        stale_tracks = removed.len(),
                        "Remote participant disconnected with tracks still subscribed"
                    );
                    self.publish_tracks();
                }
            }

            TransportEvent::Disconnected { reason } => {
                let Some(attempt) = self.attempt.take() else {
                    return;
                };
                warn!(
                    target: "room.session",
                    room = %attempt.room,
                    reason = %reason,
                    "Transport disconnected unexpectedly"
                );
                attempt.cancel.cancel();
                self.registry.clear();
                self.publish_tracks();
                self.set_phase(SessionPhase::Idle);
                self.notifier.notify(&attempt.room, ClassStatus::Scheduled);
            }
        }
    }

    /// End the current attempt with `err` and fall back to Idle.
    async fn fail_attempt(&mut self, err: RoomError) {
        let Some(mut attempt) = self.attempt.take() else {
            return;
        };

        warn!(
            target: "room.session",
            room = %attempt.room,
            identity = %attempt.identity,
            generation = attempt.generation,
            error = %err,
            "Join failed"
        );

        attempt.cancel.cancel();
        if let Some(connection) = attempt.connection.take() {
            close_orphan(connection, self.disconnect_timeout).await;
        }
        self.registry.clear();
        self.publish_tracks();
        self.set_phase(SessionPhase::Idle);

        metrics::record_join_attempt(err.kind());
        self.notifier.notify(&attempt.room, ClassStatus::Scheduled);
        if let Some(tx) = attempt.respond_to.take() {
            let _ = tx.send(Err(err));
        }
    }

    /// Leave from any phase. Always ends in Idle.
    async fn teardown(&mut self, reason: &str) {
        let Some(mut attempt) = self.attempt.take() else {
            debug!(target: "room.session", reason, "Nothing to leave");
            return;
        };

        info!(
            target: "room.session",
            room = %attempt.room,
            generation = attempt.generation,
            reason,
            "Leaving room"
        );

        self.set_phase(SessionPhase::Leaving);
        attempt.cancel.cancel();

        if let Some(connection) = attempt.connection.take() {
            close_orphan(connection, self.disconnect_timeout).await;
        }

        self.registry.clear();
        self.publish_tracks();

        if let Some(tx) = attempt.respond_to.take() {
            metrics::record_join_attempt(RoomError::Cancelled.kind());
            let _ = tx.send(Err(RoomError::Cancelled));
        }

        self.set_phase(SessionPhase::Idle);
    }

    fn is_current(&self, generation: u64, expected: SessionPhase) -> bool {
        self.phase() == expected
            && self
                .attempt
                .as_ref()
                .is_some_and(|a| a.generation == generation)
    }

    fn phase(&self) -> SessionPhase {
        *self.phase_tx.borrow()
    }

    fn set_phase(&self, to: SessionPhase) {
        let from = self.phase_tx.send_replace(to);
        if from != to {
            debug!(target: "room.session", from = %from, to = %to, "Phase transition");
            metrics::record_phase_transition(from.as_str(), to.as_str());
        }
    }

    fn publish_tracks(&self) {
        self.tracks_tx.send_replace(self.registry.entries().to_vec());
        metrics::set_remote_tracks(self.registry.len());
    }
}

/// Disconnect a connection nobody owns any more, bounded by `timeout`.
/// Failures are logged only.
async fn close_orphan(connection: Box<dyn Connection>, timeout: Duration) {
    match tokio::time::timeout(timeout, connection.disconnect()).await {
        Ok(Ok(())) => debug!(target: "room.session", "Transport disconnected"),
        Ok(Err(e)) => warn!(target: "room.session", error = %e, "Transport disconnect failed"),
        Err(_) => warn!(
            target: "room.session",
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "Transport disconnect timed out"
        ),
    }
}

fn as_connection_error(err: RoomError) -> RoomError {
    match err {
        RoomError::Connection(_) => err,
        other => RoomError::Connection(other.to_string()),
    }
}
