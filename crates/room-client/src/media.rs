//! Local camera and microphone acquisition.
//!
//! `MediaAcquirer` is shared by the whole process and outlives individual
//! joins. It opens capture devices once; later `acquire()` calls reuse them.
//! Muting never releases a capture, it only suppresses emission.

use crate::errors::RoomError;

use async_trait::async_trait;
use common::types::TrackKind;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{info, instrument, warn};

/// A live capture (camera or microphone) opened by a `CaptureBackend`.
pub trait CaptureDevice: Send + Sync + fmt::Debug {
    /// Human readable device label.
    fn label(&self) -> &str;

    /// Suppress or resume emission. Must not release the device.
    fn set_muted(&self, muted: bool);
}

/// Platform capture API.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Open the default device for `kind`.
    async fn open(&self, kind: TrackKind) -> Result<Arc<dyn CaptureDevice>, RoomError>;
}

/// A local track ready to be published.
#[derive(Debug, Clone)]
pub struct LocalTrack {
    pub kind: TrackKind,
    pub capture: Arc<dyn CaptureDevice>,
}

/// Local media as seen by the preview and the session.
#[derive(Debug, Clone, Default)]
pub struct LocalMediaState {
    pub video: Option<LocalTrack>,
    pub audio: Option<LocalTrack>,
    pub video_muted: bool,
    pub audio_muted: bool,
}

impl LocalMediaState {
    /// Whether at least one device has been opened.
    #[must_use]
    pub fn is_acquired(&self) -> bool {
        self.video.is_some() || self.audio.is_some()
    }

    fn slot_mut(&mut self, kind: TrackKind) -> (&Option<LocalTrack>, &mut bool) {
        match kind {
            TrackKind::Video => (&self.video, &mut self.video_muted),
            TrackKind::Audio => (&self.audio, &mut self.audio_muted),
        }
    }
}

struct Inner {
    backend: Arc<dyn CaptureBackend>,
    state: watch::Sender<LocalMediaState>,
    acquire_lock: Mutex<()>,
}

/// Process-level owner of local media. Cheap to clone.
#[derive(Clone)]
pub struct MediaAcquirer {
    inner: Arc<Inner>,
}

impl fmt::Debug for MediaAcquirer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaAcquirer")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl MediaAcquirer {
    #[must_use]
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        let (state, _) = watch::channel(LocalMediaState::default());
        Self {
            inner: Arc::new(Inner {
                backend,
                state,
                acquire_lock: Mutex::new(()),
            }),
        }
    }

    /// Open camera and microphone concurrently.
    ///
    /// Partial success is allowed; the missing slot stays empty. Fails with
    /// `RoomError::Device` only when neither device could be opened.
    #[instrument(skip_all)]
    pub async fn acquire(&self) -> Result<LocalMediaState, RoomError> {
        let _guard = self.inner.acquire_lock.lock().await;

        let current = self.state();
        if current.is_acquired() {
            return Ok(current);
        }

        let (video, audio) = tokio::join!(
            self.inner.backend.open(TrackKind::Video),
            self.inner.backend.open(TrackKind::Audio)
        );

        let (video, audio) = match (video, audio) {
            (Err(video_err), Err(audio_err)) => {
                warn!(
                    target: "room.media",
                    video_error = %video_err,
                    audio_error = %audio_err,
                    "No capture device could be opened"
                );
                return Err(RoomError::Device(format!(
                    "camera: {}; microphone: {}",
                    reason(&video_err),
                    reason(&audio_err)
                )));
            }
            (video, audio) => (
                track_or_warn(TrackKind::Video, video),
                track_or_warn(TrackKind::Audio, audio),
            ),
        };

        info!(
            target: "room.media",
            video = video.is_some(),
            audio = audio.is_some(),
            "Local media acquired"
        );

        self.inner.state.send_modify(|state| {
            state.video = video;
            state.audio = audio;
        });

        Ok(self.state())
    }

    /// Flip the camera mute flag. `None` when no camera is held.
    pub fn toggle_video(&self) -> Option<bool> {
        self.toggle(TrackKind::Video)
    }

    /// Flip the microphone mute flag. `None` when no microphone is held.
    pub fn toggle_audio(&self) -> Option<bool> {
        self.toggle(TrackKind::Audio)
    }

    fn toggle(&self, kind: TrackKind) -> Option<bool> {
        let mut muted_now = None;

        self.inner.state.send_if_modified(|state| {
            let (track, muted) = state.slot_mut(kind);
            let Some(track) = track else {
                return false;
            };
            *muted = !*muted;
            track.capture.set_muted(*muted);
            muted_now = Some(*muted);
            true
        });

        match muted_now {
            Some(muted) => info!(target: "room.media", kind = %kind, muted, "Local track toggled"),
            None => info!(
                target: "room.media",
                kind = %kind,
                "Toggle ignored, no local track"
            ),
        }

        muted_now
    }

    /// Snapshot of the current local media.
    #[must_use]
    pub fn state(&self) -> LocalMediaState {
        self.inner.state.borrow().clone()
    }

    /// Receive local media changes (preview, mute buttons).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LocalMediaState> {
        self.inner.state.subscribe()
    }

    /// Tracks to publish once connected, video first.
    #[must_use]
    pub fn local_tracks(&self) -> Vec<LocalTrack> {
        let state = self.inner.state.borrow();
        state.video.iter().chain(state.audio.iter()).cloned().collect()
    }
}

fn track_or_warn(
    kind: TrackKind,
    result: Result<Arc<dyn CaptureDevice>, RoomError>,
) -> Option<LocalTrack> {
    match result {
        Ok(capture) => Some(LocalTrack { kind, capture }),
        Err(e) => {
            warn!(
                target: "room.media",
                kind = %kind,
                error = %e,
                "Capture device unavailable, continuing without it"
            );
            None
        }
    }
}

fn reason(err: &RoomError) -> String {
    match err {
        RoomError::Device(msg) => msg.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug)]
    struct FakeDevice {
        label: String,
        muted: AtomicBool,
    }

    impl CaptureDevice for FakeDevice {
        fn label(&self) -> &str {
            &self.label
        }

        fn set_muted(&self, muted: bool) {
            self.muted.store(muted, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeBackend {
        fail_video: bool,
        fail_audio: bool,
        opens: AtomicUsize,
    }

    #[async_trait]
    impl CaptureBackend for FakeBackend {
        async fn open(&self, kind: TrackKind) -> Result<Arc<dyn CaptureDevice>, RoomError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;

            let fail = match kind {
                TrackKind::Video => self.fail_video,
                TrackKind::Audio => self.fail_audio,
            };
            if fail {
                return Err(RoomError::Device(format!("{kind} permission denied")));
            }
            Ok(Arc::new(FakeDevice {
                label: format!("fake {kind}"),
                muted: AtomicBool::new(false),
            }))
        }
    }

    fn acquirer(backend: FakeBackend) -> (MediaAcquirer, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        (MediaAcquirer::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn test_acquire_both_devices() {
        let (media, _) = acquirer(FakeBackend::default());

        let state = media.acquire().await.unwrap();
        assert!(state.video.is_some());
        assert!(state.audio.is_some());
        assert!(!state.video_muted);
        assert!(!state.audio_muted);
        assert_eq!(media.local_tracks().len(), 2);
    }

    #[tokio::test]
    async fn test_partial_acquisition_keeps_available_device() {
        let (media, _) = acquirer(FakeBackend {
            fail_video: true,
            ..FakeBackend::default()
        });

        let state = media.acquire().await.unwrap();
        assert!(state.video.is_none());
        assert_eq!(state.audio.as_ref().unwrap().capture.label(), "fake audio");

        let tracks = media.local_tracks();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks.first().unwrap().kind, TrackKind::Audio);
    }

    #[tokio::test]
    async fn test_both_devices_failing_is_device_error() {
        let (media, _) = acquirer(FakeBackend {
            fail_video: true,
            fail_audio: true,
            ..FakeBackend::default()
        });

        let err = media.acquire().await.unwrap_err();
        match err {
            RoomError::Device(msg) => {
                assert!(msg.contains("video permission denied"));
                assert!(msg.contains("audio permission denied"));
            }
            other => panic!("expected Device error, got {other:?}"),
        }
        assert!(!media.state().is_acquired());
    }

    #[tokio::test]
    async fn test_acquire_reuses_existing_capture() {
        let (media, backend) = acquirer(FakeBackend::default());

        media.acquire().await.unwrap();
        media.acquire().await.unwrap();

        assert_eq!(backend.opens.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_acquire_opens_devices_once() {
        let (media, backend) = acquirer(FakeBackend::default());

        let other = media.clone();
        let (a, b) = tokio::join!(media.acquire(), other.acquire());
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(backend.opens.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_toggle_before_acquire_is_noop() {
        let (media, _) = acquirer(FakeBackend::default());
        let mut rx = media.subscribe();

        assert_eq!(media.toggle_video(), None);
        assert_eq!(media.toggle_audio(), None);

        let state = media.state();
        assert!(!state.video_muted);
        assert!(!state.audio_muted);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_toggle_flips_flag_and_capture() {
        let (media, _) = acquirer(FakeBackend::default());
        media.acquire().await.unwrap();

        assert_eq!(media.toggle_video(), Some(true));
        let state = media.state();
        assert!(state.video_muted);
        assert!(!state.audio_muted);
        let device = format!("{:?}", state.video.as_ref().unwrap().capture);
        assert!(device.contains("muted: true"));

        assert_eq!(media.toggle_video(), Some(false));
        assert!(!media.state().video_muted);
        // Capture is kept while muted
        assert!(media.state().video.is_some());
    }

    #[tokio::test]
    async fn test_toggle_missing_device_is_noop() {
        let (media, _) = acquirer(FakeBackend {
            fail_audio: true,
            ..FakeBackend::default()
        });
        media.acquire().await.unwrap();

        assert_eq!(media.toggle_audio(), None);
        assert!(!media.state().audio_muted);
        assert_eq!(media.toggle_video(), Some(true));
    }

    #[tokio::test]
    async fn test_subscribers_see_acquisition() {
        let (media, _) = acquirer(FakeBackend::default());
        let mut rx = media.subscribe();

        media.acquire().await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_acquired());
    }
}
