//! Remote track bookkeeping.
//!
//! `TrackRegistry` is owned by the session actor and mutated only from its
//! message loop, so it carries no locking. Readers get snapshots through the
//! session handle.

use common::types::{ParticipantIdentity, TrackKind, TrackSid};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Opaque playable handle supplied by the media engine.
///
/// The rendering layer downcasts it to the engine's concrete track type.
#[derive(Clone)]
pub struct RemoteTrackHandle(Arc<dyn Any + Send + Sync>);

impl RemoteTrackHandle {
    /// Wrap an engine-specific track object.
    pub fn new<T: Any + Send + Sync>(inner: T) -> Self {
        Self(Arc::new(inner))
    }

    /// Borrow the engine-specific object, if it has type `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for RemoteTrackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RemoteTrackHandle(..)")
    }
}

/// One subscribed remote track.
#[derive(Debug, Clone)]
pub struct RemoteTrackEntry {
    pub track_sid: TrackSid,
    pub participant_identity: ParticipantIdentity,
    pub kind: TrackKind,
    pub handle: RemoteTrackHandle,
}

impl RemoteTrackEntry {
    #[must_use]
    pub fn new(
        track_sid: TrackSid,
        participant_identity: ParticipantIdentity,
        kind: TrackKind,
        handle: RemoteTrackHandle,
    ) -> Self {
        Self {
            track_sid,
            participant_identity,
            kind,
            handle,
        }
    }
}

/// Subscribed remote tracks in arrival order, keyed by `TrackSid`.
#[derive(Debug, Default)]
pub struct TrackRegistry {
    entries: Vec<RemoteTrackEntry>,
}

impl TrackRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscribed track.
    ///
    /// A duplicate sid replaces the existing entry and keeps its position.
    pub fn insert(&mut self, entry: RemoteTrackEntry) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.track_sid == entry.track_sid)
        {
            debug!(
                target: "room.session",
                track_sid = %entry.track_sid,
                "Replacing entry for already-subscribed track"
            );
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    /// Remove a track by sid. Unknown sids are a no-op.
    pub fn remove(&mut self, track_sid: &TrackSid) -> Option<RemoteTrackEntry> {
        let index = self.entries.iter().position(|e| &e.track_sid == track_sid)?;
        Some(self.entries.remove(index))
    }

    /// Remove every track published by `identity`.
    pub fn remove_participant(&mut self, identity: &ParticipantIdentity) -> Vec<RemoteTrackEntry> {
        let (removed, kept) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| &e.participant_identity == identity);
        self.entries = kept;
        removed
    }

    /// All entries in arrival order.
    #[must_use]
    pub fn entries(&self) -> &[RemoteTrackEntry] {
        &self.entries
    }

    /// Entries of one kind, in arrival order.
    #[must_use]
    pub fn of_kind(&self, kind: TrackKind) -> Vec<RemoteTrackEntry> {
        self.entries
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
