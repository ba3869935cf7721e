//! Camera permission gate.
//!
//! Resolves the permission state before any real stream is opened. An
//! undetermined state is resolved by acquiring and immediately releasing a
//! throwaway stream, after which the caller re-runs enumeration and session
//! setup.

use super::platform::{MediaPlatform, PermissionState, PlatformError, StreamConstraints};
use thiserror::Error;

/// Why permission is not available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    /// Denied before we asked; only the user can lift it in settings.
    Blocked,
    /// The user declined the prompt.
    Declined,
    /// The platform could not report a permission state.
    Unavailable,
}

/// Result of [`ensure_camera_permission`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    Denied(DenialKind),
    /// Permission was just granted; re-run enumeration and session open.
    MustRestart,
}

/// Permission failures surfaced to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PermissionError {
    #[error("camera access is blocked, enable it in the system or browser settings")]
    Blocked,
    #[error("camera access denied, allow camera permissions to continue")]
    Declined,
    #[error("camera permission state is unavailable on this platform")]
    Unavailable,
    #[error("camera permission still unresolved after re-entry")]
    Unresolved,
}

impl From<DenialKind> for PermissionError {
    fn from(kind: DenialKind) -> Self {
        match kind {
            DenialKind::Blocked => Self::Blocked,
            DenialKind::Declined => Self::Declined,
            DenialKind::Unavailable => Self::Unavailable,
        }
    }
}

/// Checks camera permission, prompting only if it is undetermined.
pub fn ensure_camera_permission<P: MediaPlatform + ?Sized>(platform: &mut P) -> PermissionOutcome {
    let state = match platform.query_permission() {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(error = %e, "Permission query failed");
            return PermissionOutcome::Denied(DenialKind::Unavailable);
        }
    };

    match state {
        PermissionState::Granted => PermissionOutcome::Granted,
        PermissionState::Denied => {
            tracing::warn!("Camera access is blocked");
            PermissionOutcome::Denied(DenialKind::Blocked)
        }
        PermissionState::Prompt => match platform.open_stream(&StreamConstraints::AnyVideo) {
            Ok(stream) => {
                platform.stop_tracks(stream);
                tracing::info!("Camera permission granted, restart required");
                PermissionOutcome::MustRestart
            }
            Err(PlatformError::PermissionDenied) => {
                tracing::warn!("Camera permission declined by user");
                PermissionOutcome::Denied(DenialKind::Declined)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Permission request failed");
                PermissionOutcome::Denied(DenialKind::Declined)
            }
        },
    }
}
