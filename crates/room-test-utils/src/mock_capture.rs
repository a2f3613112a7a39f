//! Mock capture hardware.

use async_trait::async_trait;
use common::types::TrackKind;
use room_client::{CaptureBackend, CaptureDevice, RoomError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Capture device that records its mute state.
#[derive(Debug)]
pub struct MockCaptureDevice {
    kind: TrackKind,
    label: String,
    muted: AtomicBool,
}

impl MockCaptureDevice {
    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }
}

impl CaptureDevice for MockCaptureDevice {
    fn label(&self) -> &str {
        &self.label
    }

    fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
    }
}

/// `CaptureBackend` with per-kind failure injection.
#[derive(Debug, Default)]
pub struct MockCaptureBackend {
    deny_video: bool,
    deny_audio: bool,
    opens: AtomicUsize,
    devices: Mutex<Vec<Arc<MockCaptureDevice>>>,
}

impl MockCaptureBackend {
    /// Camera and microphone both available.
    pub fn working() -> Self {
        Self::default()
    }

    /// Camera permission denied.
    pub fn without_camera() -> Self {
        Self {
            deny_video: true,
            ..Self::default()
        }
    }

    /// Microphone permission denied.
    pub fn without_microphone() -> Self {
        Self {
            deny_audio: true,
            ..Self::default()
        }
    }

    /// No devices at all.
    pub fn unavailable() -> Self {
        Self {
            deny_video: true,
            deny_audio: true,
            ..Self::default()
        }
    }

    /// Number of `open()` calls.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Opened device of `kind`, if any.
    pub fn device(&self, kind: TrackKind) -> Option<Arc<MockCaptureDevice>> {
        self.devices
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.kind == kind)
            .cloned()
    }
}

#[async_trait]
impl CaptureBackend for MockCaptureBackend {
    async fn open(&self, kind: TrackKind) -> Result<Arc<dyn CaptureDevice>, RoomError> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        let denied = match kind {
            TrackKind::Video => self.deny_video,
            TrackKind::Audio => self.deny_audio,
        };
        if denied {
            return Err(RoomError::Device(format!("{kind} permission denied")));
        }

        let device = Arc::new(MockCaptureDevice {
            kind,
            label: format!("mock {kind}"),
            muted: AtomicBool::new(false),
        });
        self.devices.lock().unwrap().push(Arc::clone(&device));
        Ok(device)
    }
}
