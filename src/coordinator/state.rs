//! Booth state owned by the coordinator.

use crate::capture::CameraDevice;
use crate::compositor::CapturedImage;
use crate::countdown::CountdownDuration;
use crate::frames::FrameCatalog;

/// Everything the booth UI shows.
#[derive(Debug, Clone, Default)]
pub struct BoothState {
    /// Cameras found at startup. Not re-polled.
    pub cameras: Vec<CameraDevice>,
    /// Chosen camera id, `None` until enumeration completes.
    pub selected_camera: Option<String>,
    /// Overlay catalog with the active frame.
    pub frames: FrameCatalog,
    /// Countdown length used by the next capture.
    pub countdown_duration: CountdownDuration,
    /// Latest capture, kept until replaced or discarded.
    pub captured: Option<CapturedImage>,
}

impl BoothState {
    /// The selected camera's entry, if any.
    pub fn selected_device(&self) -> Option<&CameraDevice> {
        let id = self.selected_camera.as_deref()?;
        self.cameras.iter().find(|c| c.id == id)
    }

    /// Label for the camera picker.
    pub fn selected_label(&self) -> &str {
        match (&self.selected_camera, self.selected_device()) {
            (_, Some(device)) => device.display_label(),
            (Some(_), None) => crate::capture::FALLBACK_LABEL,
            (None, None) => "Choose Camera",
        }
    }
}

/// Counters for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoothStats {
    /// Photos captured.
    pub captures: u64,
    /// Captures that ended in an error.
    pub capture_failures: u64,
    pub sessions_opened: u64,
    pub sessions_closed: u64,
    pub session_live: bool,
    /// Countdowns restarted before they expired.
    pub countdown_restarts: u64,
    pub countdown_remaining: u32,
}
