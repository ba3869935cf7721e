//! Platform media capability.
//!
//! The booth never talks to camera hardware directly. Everything it needs
//! from the host (device registry, permission state, stream acquisition and
//! frame reads) goes through [`MediaPlatform`], so the same pipeline runs
//! against a browser bridge, a native camera stack or a test double.

use super::VideoFrame;
use thiserror::Error;

/// Kind of a media device reported by the platform registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

/// Raw registry entry as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDeviceInfo {
    /// Opaque device identifier.
    pub id: String,
    /// Human-readable label. Empty until permission is granted on some platforms.
    pub label: String,
    /// Device kind.
    pub kind: DeviceKind,
}

impl MediaDeviceInfo {
    /// Creates a video-input entry.
    pub fn video(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: DeviceKind::VideoInput,
        }
    }
}

/// Camera permission state as reported without prompting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// Not decided yet; acquiring a stream will prompt the user.
    Prompt,
}

/// Constraints for a stream request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamConstraints {
    /// Any video input. Used to trigger the permission prompt.
    AnyVideo,
    /// Exactly this device, video only.
    ExactDevice(String),
}

/// Handle to a live platform stream.
///
/// Not `Clone`. Stopping a stream consumes its handle, so each stream is
/// released at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct StreamHandle {
    id: u64,
    device_id: String,
}

impl StreamHandle {
    /// Creates a handle. Only platform implementations should call this.
    pub fn new(id: u64, device_id: impl Into<String>) -> Self {
        Self {
            id,
            device_id: device_id.into(),
        }
    }

    /// Platform-assigned stream id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Device the stream was opened on.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

/// Errors reported by a platform implementation.
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("permission denied by user")]
    PermissionDenied,
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("device busy: {0}")]
    DeviceBusy(String),
    #[error("unknown stream: {0}")]
    UnknownStream(u64),
    #[error("operation not supported: {0}")]
    NotSupported(String),
    #[error("platform error: {0}")]
    Other(String),
}

/// Host media capability.
pub trait MediaPlatform {
    /// Lists every media device known to the registry.
    fn enumerate_devices(&mut self) -> Result<Vec<MediaDeviceInfo>, PlatformError>;

    /// Reads the camera permission state without prompting.
    fn query_permission(&mut self) -> Result<PermissionState, PlatformError>;

    /// Acquires a video stream matching the constraints.
    fn open_stream(&mut self, constraints: &StreamConstraints) -> Result<StreamHandle, PlatformError>;

    /// Stops every track of the stream and releases the hardware.
    fn stop_tracks(&mut self, stream: StreamHandle);

    /// Reads the current frame of a live stream.
    fn grab_frame(&mut self, stream: &StreamHandle) -> Result<VideoFrame, PlatformError>;
}

impl<T: MediaPlatform + ?Sized> MediaPlatform for &mut T {
    fn enumerate_devices(&mut self) -> Result<Vec<MediaDeviceInfo>, PlatformError> {
        (**self).enumerate_devices()
    }

    fn query_permission(&mut self) -> Result<PermissionState, PlatformError> {
        (**self).query_permission()
    }

    fn open_stream(&mut self, constraints: &StreamConstraints) -> Result<StreamHandle, PlatformError> {
        (**self).open_stream(constraints)
    }

    fn stop_tracks(&mut self, stream: StreamHandle) {
        (**self).stop_tracks(stream)
    }

    fn grab_frame(&mut self, stream: &StreamHandle) -> Result<VideoFrame, PlatformError> {
        (**self).grab_frame(stream)
    }
}
