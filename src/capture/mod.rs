//! Camera access: devices, permission and live sessions.
//!
//! This module wraps the host media capability behind [`MediaPlatform`] and
//! builds the camera lifecycle on top of it: enumeration, the permission
//! gate, and a session manager that guarantees at most one live stream.

mod config;
mod devices;
mod frame;
mod mock;
#[cfg(feature = "camera")]
mod native;
mod permission;
mod platform;
mod session;

pub use config::{
    CaptureConfig, ConfigError, FileConfig, FramesConfig, OutputConfig, CANVAS_HEIGHT,
    CANVAS_WIDTH,
};
pub use devices::{list_cameras, CameraDevice, FALLBACK_LABEL};
pub use frame::VideoFrame;
pub use mock::{MockPlatform, PlatformEvent};
#[cfg(feature = "camera")]
pub use native::NativePlatform;
pub use permission::{ensure_camera_permission, DenialKind, PermissionError, PermissionOutcome};
pub use platform::{
    DeviceKind, MediaDeviceInfo, MediaPlatform, PermissionState, PlatformError, StreamConstraints,
    StreamHandle,
};
pub use session::{DeviceError, OpenRequest, Session, SessionManager};
