//! Top-level error type.

use crate::capture::{ConfigError, DeviceError, PermissionError};
use crate::compositor::CompositingError;
use crate::countdown::CountdownError;
use thiserror::Error;

/// Any failure the booth surfaces to its host.
#[derive(Debug, Error)]
pub enum BoothError {
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Compositing(#[from] CompositingError),
    #[error(transparent)]
    Countdown(#[from] CountdownError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no captured photo to save")]
    NothingCaptured,
    #[error("booth has been shut down")]
    ShutDown,
    #[error("failed to save capture: {0}")]
    Save(#[from] std::io::Error),
}

impl BoothError {
    /// Errors that block the booth until the user changes something outside
    /// it (permission settings, camera hardware).
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Permission(_) | Self::Device(_))
    }
}
