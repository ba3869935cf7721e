//! Prometheus metrics for booth monitoring.
//!
//! # Metrics Exposed
//!
//! ## Capture Metrics
//! - `photo_booth_captures_total` - Photos captured successfully
//! - `photo_booth_capture_failures_total` - Captures that produced no image
//!
//! ## Session Metrics
//! - `photo_booth_sessions_opened_total` - Camera sessions opened
//! - `photo_booth_sessions_closed_total` - Camera sessions closed
//! - `photo_booth_session_live` - Whether a camera session is live (1/0)
//!
//! ## Countdown Metrics
//! - `photo_booth_countdown_restarts_total` - Countdowns restarted before expiry
//! - `photo_booth_countdown_remaining_seconds` - Seconds left on the countdown
//!
//! With the `metrics` feature an HTTP server exposes them on `/metrics`,
//! with `/health` reporting whether a camera is live.
//!
//! # Example
//!
//! ```no_run
//! use photo_booth::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let snapshot = MetricsSnapshot {
//!     captures: 2,
//!     session_live: true,
//!     ..Default::default()
//! };
//!
//! registry.update(&snapshot);
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
