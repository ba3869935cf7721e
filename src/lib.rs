//! Photo Booth Library
//!
//! The core of a camera photo booth: pick a camera, pick a decorative frame,
//! start a countdown, and get back a PNG of the camera frame composited
//! under the overlay on a fixed 1920x1080 canvas.
//!
//! # Architecture
//!
//! ```text
//! permission gate → device enumeration → camera session
//!                                             ↓
//!                 countdown ──expiry──→ compositor → captured image
//! ```
//!
//! The [`coordinator::CaptureCoordinator`] owns all of it. The host's camera
//! stack is reached only through [`capture::MediaPlatform`].
//!
//! # Design Principles
//!
//! - **One live stream**: the previous session is stopped before a new one opens
//! - **Stale work is dropped**: superseded timers, session opens and permission
//!   checks carry tokens and are ignored once outdated
//! - **No cropping**: the camera frame is fitted inside the canvas, margins stay
//!   transparent
//!
//! # Example
//!
//! ```no_run
//! use photo_booth::{
//!     capture::MockPlatform,
//!     coordinator::CaptureCoordinator,
//!     frames::DirAssetStore,
//! };
//!
//! let mut booth = CaptureCoordinator::new(
//!     MockPlatform::with_default_devices(),
//!     DirAssetStore::new("assets"),
//! );
//! booth.startup().unwrap();
//!
//! let token = booth.trigger_capture().unwrap();
//! for _ in 0..5 {
//!     booth.tick(token).unwrap();
//! }
//!
//! booth.save_capture("captured-photo.png").unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod compositor;
pub mod coordinator;
pub mod countdown;
pub mod error;
pub mod frames;
pub mod metrics;

// Re-export commonly used types at crate root
pub use capture::{CameraDevice, FileConfig, MediaPlatform, MockPlatform, VideoFrame};
pub use compositor::{CapturedImage, Compositor};
pub use coordinator::{BoothState, CaptureCoordinator};
pub use countdown::{CountdownController, CountdownDuration};
pub use error::BoothError;
pub use frames::{AssetStore, DirAssetStore, FrameAsset, FrameCatalog};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
