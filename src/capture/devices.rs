//! Camera device enumeration.

use super::platform::{DeviceKind, MediaPlatform};
use serde::{Deserialize, Serialize};

/// Label shown for a device whose label the platform withheld.
pub const FALLBACK_LABEL: &str = "Camera";

/// A video input the user can pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDevice {
    /// Opaque platform identifier.
    pub id: String,
    /// Human-readable label; may be empty before permission is granted.
    pub label: String,
}

impl CameraDevice {
    /// Label for display, falling back to [`FALLBACK_LABEL`].
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            FALLBACK_LABEL
        } else {
            &self.label
        }
    }
}

/// Lists the video inputs known to the platform.
///
/// Enumeration failures degrade to an empty list; the booth then simply has
/// nothing to select.
pub fn list_cameras<P: MediaPlatform + ?Sized>(platform: &mut P) -> Vec<CameraDevice> {
    match platform.enumerate_devices() {
        Ok(devices) => {
            let cameras: Vec<CameraDevice> = devices
                .into_iter()
                .filter(|d| d.kind == DeviceKind::VideoInput)
                .map(|d| CameraDevice {
                    id: d.id,
                    label: d.label,
                })
                .collect();
            tracing::info!(count = cameras.len(), "Enumerated cameras");
            cameras
        }
        Err(e) => {
            tracing::warn!(error = %e, "Camera enumeration failed");
            Vec::new()
        }
    }
}
