//! Camera session lifecycle.
//!
//! The session manager is the only owner of a live stream. Switching devices
//! is always close-then-open, and every open is tagged with a generation so
//! a completion that arrives after the selection moved on is dropped instead
//! of being installed.

use super::platform::{MediaPlatform, PlatformError, StreamConstraints, StreamHandle};
use super::VideoFrame;
use std::time::Instant;
use thiserror::Error;

/// Errors from device selection and stream handling.
#[derive(Debug, Clone, Error)]
pub enum DeviceError {
    #[error("camera device not found: {0}")]
    NotFound(String),
    #[error("failed to open camera {device}: {source}")]
    OpenFailed {
        device: String,
        #[source]
        source: PlatformError,
    },
    #[error("no camera session is open")]
    NoSession,
    #[error("failed to read frame: {0}")]
    FrameUnavailable(#[source] PlatformError),
}

/// A live stream on one device.
#[derive(Debug)]
pub struct Session {
    stream: StreamHandle,
    generation: u64,
    opened_at: Instant,
}

impl Session {
    /// Device the session streams from.
    pub fn device_id(&self) -> &str {
        self.stream.device_id()
    }

    /// Platform stream id.
    pub fn stream_id(&self) -> u64 {
        self.stream.id()
    }

    /// Generation the session was opened under.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn opened_at(&self) -> Instant {
        self.opened_at
    }
}

/// A pending open for a device, valid until the next switch or close.
#[derive(Debug)]
pub struct OpenRequest {
    generation: u64,
    device_id: String,
}

impl OpenRequest {
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Owns the active camera session.
#[derive(Debug, Default)]
pub struct SessionManager {
    active: Option<Session>,
    generation: u64,
    opened: u64,
    closed: u64,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session on the device, closing any current one first.
    pub fn open_session<P: MediaPlatform + ?Sized>(
        &mut self,
        platform: &mut P,
        device_id: &str,
    ) -> Result<&Session, DeviceError> {
        let request = self.begin_switch(platform, device_id);
        self.finish_switch(platform, request)?
            .ok_or(DeviceError::NoSession)
    }

    /// Stops the current session, if any, and invalidates pending opens.
    pub fn close_session<P: MediaPlatform + ?Sized>(&mut self, platform: &mut P) {
        self.generation += 1;
        if let Some(session) = self.active.take() {
            let device = session.device_id().to_string();
            let stream_id = session.stream_id();
            platform.stop_tracks(session.stream);
            self.closed += 1;
            tracing::info!(device = %device, stream = stream_id, "Camera session closed");
        }
    }

    /// First half of a switch: releases the current stream and returns a
    /// request for the new device.
    pub fn begin_switch<P: MediaPlatform + ?Sized>(
        &mut self,
        platform: &mut P,
        device_id: &str,
    ) -> OpenRequest {
        self.close_session(platform);
        tracing::debug!(device = device_id, generation = self.generation, "Session switch requested");
        OpenRequest {
            generation: self.generation,
            device_id: device_id.to_string(),
        }
    }

    /// Second half of a switch: opens the stream if the request is still
    /// current. A stale request returns `Ok(None)` without touching the
    /// platform.
    pub fn finish_switch<P: MediaPlatform + ?Sized>(
        &mut self,
        platform: &mut P,
        request: OpenRequest,
    ) -> Result<Option<&Session>, DeviceError> {
        if !self.is_current(&request) {
            tracing::debug!(
                device = %request.device_id,
                generation = request.generation,
                "Discarding stale session request"
            );
            return Ok(None);
        }

        let constraints = StreamConstraints::ExactDevice(request.device_id.clone());
        let stream = platform.open_stream(&constraints).map_err(|source| {
            tracing::warn!(device = %request.device_id, error = %source, "Failed to open camera");
            match source {
                PlatformError::DeviceNotFound(id) => DeviceError::NotFound(id),
                source => DeviceError::OpenFailed {
                    device: request.device_id.clone(),
                    source,
                },
            }
        })?;

        Ok(Some(self.install(request, stream)))
    }

    /// Installs a stream acquired outside the manager. A stale request
    /// releases the stream immediately and returns `None`.
    pub fn adopt_stream<P: MediaPlatform + ?Sized>(
        &mut self,
        platform: &mut P,
        request: OpenRequest,
        stream: StreamHandle,
    ) -> Option<&Session> {
        if !self.is_current(&request) {
            tracing::debug!(
                device = %request.device_id,
                stream = stream.id(),
                "Releasing stream for stale request"
            );
            platform.stop_tracks(stream);
            return None;
        }
        Some(self.install(request, stream))
    }

    /// Reads the current frame of the live session.
    pub fn grab_frame<P: MediaPlatform + ?Sized>(
        &self,
        platform: &mut P,
    ) -> Result<VideoFrame, DeviceError> {
        let session = self.active.as_ref().ok_or(DeviceError::NoSession)?;
        platform
            .grab_frame(&session.stream)
            .map_err(DeviceError::FrameUnavailable)
    }

    /// True if the request still matches the latest switch.
    pub fn is_current(&self, request: &OpenRequest) -> bool {
        request.generation == self.generation && self.active.is_none()
    }

    pub fn active(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Sessions opened over the manager's lifetime.
    pub fn sessions_opened(&self) -> u64 {
        self.opened
    }

    /// Sessions closed over the manager's lifetime.
    pub fn sessions_closed(&self) -> u64 {
        self.closed
    }

    fn install(&mut self, request: OpenRequest, stream: StreamHandle) -> &Session {
        self.opened += 1;
        tracing::info!(
            device = %request.device_id,
            stream = stream.id(),
            generation = request.generation,
            "Camera session opened"
        );
        self.active.insert(Session {
            stream,
            generation: request.generation,
            opened_at: Instant::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{MockPlatform, PlatformEvent};

    #[test]
    fn test_open_and_close() {
        let mut platform = MockPlatform::with_default_devices();
        let mut sessions = SessionManager::new();

        let session = sessions.open_session(&mut platform, "cam-hd").unwrap();
        assert_eq!(session.device_id(), "cam-hd");
        assert_eq!(platform.live_streams(), 1);

        sessions.close_session(&mut platform);
        assert!(!sessions.is_open());
        assert_eq!(platform.live_streams(), 0);
    }

    #[test]
    fn test_switch_closes_before_open() {
        let mut platform = MockPlatform::with_default_devices();
        let mut sessions = SessionManager::new();

        sessions.open_session(&mut platform, "cam-hd").unwrap();
        sessions.open_session(&mut platform, "cam-vga").unwrap();
        sessions.open_session(&mut platform, "cam-hd").unwrap();

        assert_eq!(platform.max_concurrent_streams(), 1);

        // Every open after the first is preceded by a stop.
        let lifecycle: Vec<&PlatformEvent> = platform
            .events()
            .iter()
            .filter(|e| matches!(e, PlatformEvent::Opened { .. } | PlatformEvent::Stopped { .. }))
            .collect();
        for pair in lifecycle.windows(2) {
            if let PlatformEvent::Opened { .. } = pair[1] {
                assert!(matches!(pair[0], PlatformEvent::Stopped { .. }));
            }
        }
        assert_eq!(sessions.sessions_opened(), 3);
        assert_eq!(sessions.sessions_closed(), 2);
    }

    #[test]
    fn test_busy_device_fails() {
        let mut platform = MockPlatform::with_default_devices().with_busy("cam-vga");
        let mut sessions = SessionManager::new();

        let err = sessions.open_session(&mut platform, "cam-vga").unwrap_err();
        assert!(matches!(err, DeviceError::OpenFailed { .. }));
        assert!(!sessions.is_open());
    }

    #[test]
    fn test_unknown_device_not_found() {
        let mut platform = MockPlatform::with_default_devices();
        let mut sessions = SessionManager::new();

        let err = sessions.open_session(&mut platform, "nope").unwrap_err();
        assert!(matches!(err, DeviceError::NotFound(_)));
    }

    #[test]
    fn test_stale_request_never_opens() {
        let mut platform = MockPlatform::with_default_devices();
        let mut sessions = SessionManager::new();

        let stale = sessions.begin_switch(&mut platform, "cam-hd");
        let current = sessions.begin_switch(&mut platform, "cam-vga");

        assert!(sessions.finish_switch(&mut platform, stale).unwrap().is_none());
        assert_eq!(platform.open_calls(), 0);

        let session = sessions.finish_switch(&mut platform, current).unwrap().unwrap();
        assert_eq!(session.device_id(), "cam-vga");
    }

    #[test]
    fn test_stale_adopted_stream_is_released() {
        let mut platform = MockPlatform::with_default_devices();
        let mut sessions = SessionManager::new();

        let request = sessions.begin_switch(&mut platform, "cam-hd");
        let stream = platform
            .open_stream(&StreamConstraints::ExactDevice("cam-hd".into()))
            .unwrap();

        // Teardown happens while the acquisition is in flight.
        sessions.close_session(&mut platform);

        assert!(sessions.adopt_stream(&mut platform, request, stream).is_none());
        assert_eq!(platform.live_streams(), 0);
        assert!(!sessions.is_open());
    }

    #[test]
    fn test_grab_without_session() {
        let mut platform = MockPlatform::with_default_devices();
        let sessions = SessionManager::new();
        assert!(matches!(
            sessions.grab_frame(&mut platform),
            Err(DeviceError::NoSession)
        ));
    }

    #[test]
    fn test_unplugged_device_frame_unavailable() {
        let mut platform = MockPlatform::with_default_devices();
        let mut sessions = SessionManager::new();
        sessions.open_session(&mut platform, "cam-hd").unwrap();

        platform.unplug("cam-hd");
        assert!(matches!(
            sessions.grab_frame(&mut platform),
            Err(DeviceError::FrameUnavailable(_))
        ));
    }
}
