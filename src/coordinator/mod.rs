//! Capture coordination.
//!
//! The coordinator owns the booth state, the platform and the asset store,
//! and wires them together: permission gate, enumeration and session open
//! at startup, countdown expiry into the compositor, and the captured image
//! into state.

mod state;

pub use state::{BoothState, BoothStats};

use crate::capture::{
    ensure_camera_permission, list_cameras, DeviceError, FileConfig, MediaPlatform,
    PermissionError, PermissionOutcome, SessionManager,
};
use crate::compositor::{CapturedImage, CompositingError, Compositor};
use crate::countdown::{
    CountdownController, CountdownDuration, CountdownError, TickOutcome, TimerToken,
};
use crate::error::BoothError;
use crate::frames::{AssetStore, FrameCatalog};
use std::path::Path;

/// Ticket for a permission check, tied to the coordinator's current epoch.
#[derive(Debug)]
pub struct PermissionCheck {
    epoch: u64,
}

/// What applying a permission outcome did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Cameras enumerated and the selected one opened (if any exist).
    Ready,
    /// Permission was just granted; run the check again.
    Restart,
    /// The check belonged to a torn-down epoch and was ignored.
    Stale,
}

/// Orchestrates the capture flow.
pub struct CaptureCoordinator<P: MediaPlatform, S: AssetStore> {
    platform: P,
    assets: S,
    sessions: SessionManager,
    countdown: CountdownController,
    compositor: Compositor,
    state: BoothState,
    preferred_device: Option<String>,
    epoch: u64,
    shut_down: bool,
    captures: u64,
    capture_failures: u64,
}

impl<P: MediaPlatform, S: AssetStore> CaptureCoordinator<P, S> {
    /// Creates a coordinator with default settings.
    pub fn new(platform: P, assets: S) -> Self {
        Self {
            platform,
            assets,
            sessions: SessionManager::new(),
            countdown: CountdownController::new(),
            compositor: Compositor::default(),
            state: BoothState::default(),
            preferred_device: None,
            epoch: 0,
            shut_down: false,
            captures: 0,
            capture_failures: 0,
        }
    }

    /// Creates a coordinator from a validated configuration.
    pub fn from_config(platform: P, assets: S, config: &FileConfig) -> Result<Self, BoothError> {
        config.validate()?;

        let mut coordinator = Self::new(platform, assets);
        coordinator.compositor =
            Compositor::new(config.capture.canvas_width, config.capture.canvas_height);
        coordinator.state.countdown_duration = config.capture.countdown()?;
        coordinator.preferred_device = config.capture.preferred_device.clone();
        coordinator.state.frames =
            FrameCatalog::new(config.frames.catalog.clone(), &config.frames.default_frame)
                .ok_or_else(|| CompositingError::UnknownFrame(config.frames.default_frame.clone()))?;
        Ok(coordinator)
    }

    /// Resolves permission, enumerates cameras and opens the selected one.
    ///
    /// A freshly granted permission re-enters the sequence once in place.
    pub fn startup(&mut self) -> Result<(), BoothError> {
        self.ensure_live()?;
        for attempt in 0..2 {
            let check = self.begin_permission_check();
            let outcome = ensure_camera_permission(&mut self.platform);
            match self.resolve_permission(check, outcome)? {
                Readiness::Ready | Readiness::Stale => return Ok(()),
                Readiness::Restart => {
                    tracing::info!(attempt, "Re-entering startup after permission grant");
                }
            }
        }
        Err(PermissionError::Unresolved.into())
    }

    /// Starts a permission check for the current epoch.
    pub fn begin_permission_check(&self) -> PermissionCheck {
        PermissionCheck { epoch: self.epoch }
    }

    /// Applies a permission outcome. Outcomes for an older epoch (the booth
    /// was torn down meanwhile) are discarded.
    pub fn resolve_permission(
        &mut self,
        check: PermissionCheck,
        outcome: PermissionOutcome,
    ) -> Result<Readiness, BoothError> {
        if self.shut_down || check.epoch != self.epoch {
            tracing::debug!(
                check_epoch = check.epoch,
                epoch = self.epoch,
                "Discarding stale permission outcome"
            );
            return Ok(Readiness::Stale);
        }

        match outcome {
            PermissionOutcome::Granted => {
                self.enumerate_and_open()?;
                Ok(Readiness::Ready)
            }
            PermissionOutcome::MustRestart => Ok(Readiness::Restart),
            PermissionOutcome::Denied(kind) => Err(PermissionError::from(kind).into()),
        }
    }

    fn enumerate_and_open(&mut self) -> Result<(), BoothError> {
        self.state.cameras = list_cameras(&mut self.platform);

        let preferred = self
            .preferred_device
            .as_deref()
            .filter(|id| self.state.cameras.iter().any(|c| c.id == *id));
        let initial = preferred
            .map(str::to_string)
            .or_else(|| self.state.cameras.first().map(|c| c.id.clone()));

        match initial {
            Some(id) => self.select_camera(&id),
            None => {
                tracing::warn!("No cameras available");
                self.state.selected_camera = None;
                Ok(())
            }
        }
    }

    /// Selects a camera, closing the previous session before opening the new one.
    pub fn select_camera(&mut self, device_id: &str) -> Result<(), BoothError> {
        self.ensure_live()?;
        if !self.state.cameras.iter().any(|c| c.id == device_id) {
            return Err(DeviceError::NotFound(device_id.to_string()).into());
        }

        self.state.selected_camera = Some(device_id.to_string());
        self.sessions
            .open_session(&mut self.platform, device_id)
            .map(|_| ())
            .map_err(BoothError::from)
    }

    /// Makes `frame_id` the active overlay.
    pub fn select_frame(&mut self, frame_id: &str) -> Result<(), BoothError> {
        if self.state.frames.select(frame_id) {
            Ok(())
        } else {
            Err(CompositingError::UnknownFrame(frame_id.to_string()).into())
        }
    }

    pub fn set_countdown_duration(&mut self, duration: CountdownDuration) {
        self.state.countdown_duration = duration;
    }

    /// Sets the countdown from seconds; only 5 and 10 are offered.
    pub fn set_countdown_seconds(&mut self, seconds: u32) -> Result<(), BoothError> {
        let duration = CountdownDuration::from_seconds(seconds)
            .ok_or(CountdownError::UnsupportedDuration(seconds))?;
        self.set_countdown_duration(duration);
        Ok(())
    }

    /// Starts (or restarts) the countdown with the selected duration.
    pub fn trigger_capture(&mut self) -> Result<TimerToken, BoothError> {
        self.ensure_live()?;
        let seconds = self.state.countdown_duration.seconds();
        Ok(self.countdown.start(seconds)?)
    }

    /// Advances the countdown; on expiry captures and stores a photo.
    ///
    /// A failed capture leaves the booth in live preview with the previous
    /// photo untouched.
    pub fn tick(&mut self, token: TimerToken) -> Result<TickOutcome, BoothError> {
        let outcome = self.countdown.tick(token);
        if outcome == TickOutcome::Expired {
            self.capture_now()?;
        }
        Ok(outcome)
    }

    /// Composites the live frame with the active overlay right away.
    pub fn capture_now(&mut self) -> Result<&CapturedImage, BoothError> {
        match self.composite_live_frame() {
            Ok(image) => {
                self.captures += 1;
                tracing::info!(
                    width = image.width(),
                    height = image.height(),
                    bytes = image.png_bytes().len(),
                    captured_at = %image.captured_at(),
                    "Photo captured"
                );
                Ok(&*self.state.captured.insert(image))
            }
            Err(e) => {
                self.capture_failures += 1;
                tracing::warn!(error = %e, "Capture failed");
                Err(e)
            }
        }
    }

    fn composite_live_frame(&mut self) -> Result<CapturedImage, BoothError> {
        let frame = self.sessions.grab_frame(&mut self.platform)?;
        let asset = self.state.frames.active();
        Ok(self
            .compositor
            .composite_from_store(&frame, &self.assets, asset)?)
    }

    pub fn captured(&self) -> Option<&CapturedImage> {
        self.state.captured.as_ref()
    }

    /// Drops the current photo, returning it.
    pub fn discard_capture(&mut self) -> Option<CapturedImage> {
        self.state.captured.take()
    }

    /// Writes the current photo to `path`.
    pub fn save_capture(&self, path: impl AsRef<Path>) -> Result<(), BoothError> {
        let image = self.captured().ok_or(BoothError::NothingCaptured)?;
        image.save(path)?;
        Ok(())
    }

    /// Cancels the countdown, releases the camera and invalidates pending
    /// completions. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.countdown.cancel();
        self.sessions.close_session(&mut self.platform);
        self.epoch += 1;
        self.shut_down = true;
        tracing::info!("Booth shut down");
    }

    fn ensure_live(&self) -> Result<(), BoothError> {
        if self.shut_down {
            return Err(BoothError::ShutDown);
        }
        Ok(())
    }

    pub fn state(&self) -> &BoothState {
        &self.state
    }

    pub fn countdown(&self) -> &CountdownController {
        &self.countdown
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn stats(&self) -> BoothStats {
        BoothStats {
            captures: self.captures,
            capture_failures: self.capture_failures,
            sessions_opened: self.sessions.sessions_opened(),
            sessions_closed: self.sessions.sessions_closed(),
            session_live: self.sessions.is_open(),
            countdown_restarts: self.countdown.restarts(),
            countdown_remaining: self.countdown.remaining(),
        }
    }
}

impl<P: MediaPlatform, S: AssetStore> Drop for CaptureCoordinator<P, S> {
    fn drop(&mut self) {
        self.shutdown();
        // The camera is released on drop whatever happened since shutdown.
        self.sessions.close_session(&mut self.platform);
    }
}

impl<P: MediaPlatform, S: AssetStore> std::fmt::Debug for CaptureCoordinator<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureCoordinator")
            .field("state", &self.state)
            .field("countdown", &self.countdown.state())
            .field("session", &self.sessions.active())
            .field("epoch", &self.epoch)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureConfig, MockPlatform, PermissionState};
    use crate::countdown::CountdownState;
    use crate::frames::MemoryAssetStore;
    use image::{Rgba, RgbaImage};

    fn overlays() -> MemoryAssetStore {
        let mut store = MemoryAssetStore::new();
        for source in ["kana-frame.png", "tana-frame.png", "pia-frame.png"] {
            store.insert_image(source, &RgbaImage::new(16, 9)).unwrap();
        }
        store
    }

    fn small_config() -> FileConfig {
        FileConfig {
            capture: CaptureConfig::with_canvas(192, 108),
            ..Default::default()
        }
    }

    fn booth(platform: &mut MockPlatform) -> CaptureCoordinator<&mut MockPlatform, MemoryAssetStore> {
        CaptureCoordinator::from_config(platform, overlays(), &small_config()).unwrap()
    }

    fn run_to_expiry<P: MediaPlatform, S: AssetStore>(
        booth: &mut CaptureCoordinator<P, S>,
        token: TimerToken,
    ) -> Result<TickOutcome, BoothError> {
        loop {
            match booth.tick(token)? {
                TickOutcome::Running { .. } => continue,
                other => return Ok(other),
            }
        }
    }

    #[test]
    fn test_startup_selects_first_camera() {
        let mut platform = MockPlatform::with_default_devices();
        let mut booth = booth(&mut platform);
        booth.startup().unwrap();

        assert_eq!(booth.state().cameras.len(), 2);
        assert_eq!(booth.state().selected_camera.as_deref(), Some("cam-hd"));
        assert_eq!(booth.sessions().active().unwrap().device_id(), "cam-hd");
        assert_eq!(booth.state().selected_label(), "Integrated Webcam");
    }

    #[test]
    fn test_startup_prefers_configured_device() {
        let mut platform = MockPlatform::with_default_devices();
        let mut config = small_config();
        config.capture.preferred_device = Some("cam-vga".into());

        let mut booth = CaptureCoordinator::from_config(&mut platform, overlays(), &config).unwrap();
        booth.startup().unwrap();
        assert_eq!(booth.state().selected_camera.as_deref(), Some("cam-vga"));
    }

    #[test]
    fn test_startup_reenters_after_prompt() {
        let mut platform = MockPlatform::with_default_devices().with_permission(PermissionState::Prompt);
        {
            let mut booth = booth(&mut platform);
            booth.startup().unwrap();
            assert!(booth.sessions().is_open());
            // Labels are visible on the second pass.
            assert_eq!(booth.state().cameras[0].label, "Integrated Webcam");
        }
        // Throwaway stream plus the real session.
        assert_eq!(platform.open_calls(), 2);
        assert_eq!(platform.max_concurrent_streams(), 1);
    }

    #[test]
    fn test_startup_blocked_never_opens() {
        let mut platform = MockPlatform::with_default_devices().with_permission(PermissionState::Denied);
        {
            let mut booth = booth(&mut platform);
            let err = booth.startup().unwrap_err();
            assert!(matches!(err, BoothError::Permission(PermissionError::Blocked)));
            assert!(err.is_blocking());
        }
        assert_eq!(platform.open_calls(), 0);
    }

    #[test]
    fn test_startup_declined() {
        let mut platform = MockPlatform::with_default_devices()
            .with_permission(PermissionState::Prompt)
            .with_prompt_answer(false);
        let mut booth = booth(&mut platform);
        assert!(matches!(
            booth.startup(),
            Err(BoothError::Permission(PermissionError::Declined))
        ));
    }

    #[test]
    fn test_startup_without_cameras() {
        let mut platform = MockPlatform::new().with_failing_enumeration();
        let mut booth = booth(&mut platform);
        booth.startup().unwrap();
        assert!(booth.state().selected_camera.is_none());

        let token = booth.trigger_capture().unwrap();
        let err = run_to_expiry(&mut booth, token).unwrap_err();
        assert!(matches!(err, BoothError::Device(DeviceError::NoSession)));
    }

    #[test]
    fn test_countdown_expiry_captures_photo() {
        let mut platform = MockPlatform::with_default_devices();
        let mut booth = booth(&mut platform);
        booth.startup().unwrap();

        let token = booth.trigger_capture().unwrap();
        for remaining in (1..5).rev() {
            assert_eq!(
                booth.tick(token).unwrap(),
                TickOutcome::Running { remaining, total: 5 }
            );
            assert!(booth.captured().is_none());
        }
        assert_eq!(booth.tick(token).unwrap(), TickOutcome::Expired);

        let captured = booth.captured().unwrap();
        assert_eq!((captured.width(), captured.height()), (192, 108));
        assert_eq!(booth.countdown().state(), CountdownState::Idle);
        assert_eq!(booth.stats().captures, 1);
    }

    #[test]
    fn test_restart_captures_once() {
        let mut platform = MockPlatform::with_default_devices();
        let mut booth = booth(&mut platform);
        booth.startup().unwrap();

        booth.set_countdown_seconds(10).unwrap();
        let first = booth.trigger_capture().unwrap();
        booth.tick(first).unwrap();

        booth.set_countdown_duration(CountdownDuration::Five);
        let second = booth.trigger_capture().unwrap();

        let mut expired_at = Vec::new();
        for i in 1..=12 {
            if booth.tick(first).unwrap() == TickOutcome::Expired {
                expired_at.push(i);
            }
            if booth.tick(second).unwrap() == TickOutcome::Expired {
                expired_at.push(i);
            }
        }
        assert_eq!(expired_at, vec![5]);
        assert_eq!(booth.stats().captures, 1);
        assert_eq!(booth.stats().countdown_restarts, 1);
    }

    #[test]
    fn test_switch_camera_mid_countdown_uses_new_stream() {
        let mut platform = MockPlatform::with_default_devices();
        {
            let mut booth = booth(&mut platform);
            booth.startup().unwrap();

            let token = booth.trigger_capture().unwrap();
            booth.tick(token).unwrap();
            booth.select_camera("cam-vga").unwrap();
            run_to_expiry(&mut booth, token).unwrap();

            // 4:3 source leaves transparent pillarbox margins.
            let captured = booth.captured().unwrap();
            let image = image::load_from_memory(captured.png_bytes()).unwrap().to_rgba8();
            assert_eq!(image.get_pixel(0, 54)[3], 0);
            assert!(image.get_pixel(96, 54)[3] >= 254);
        }
        assert_eq!(platform.max_concurrent_streams(), 1);
        assert_eq!(platform.live_streams(), 0);
    }

    #[test]
    fn test_select_unknown_camera() {
        let mut platform = MockPlatform::with_default_devices();
        let mut booth = booth(&mut platform);
        booth.startup().unwrap();

        assert!(matches!(
            booth.select_camera("ghost"),
            Err(BoothError::Device(DeviceError::NotFound(_)))
        ));
        assert_eq!(booth.state().selected_camera.as_deref(), Some("cam-hd"));
    }

    #[test]
    fn test_busy_camera_surfaces_error() {
        let mut platform = MockPlatform::with_default_devices().with_busy("cam-vga");
        let mut booth = booth(&mut platform);
        booth.startup().unwrap();

        let err = booth.select_camera("cam-vga").unwrap_err();
        assert!(matches!(err, BoothError::Device(DeviceError::OpenFailed { .. })));
        assert!(!booth.sessions().is_open());
    }

    #[test]
    fn test_missing_overlay_keeps_previous_photo() {
        let mut platform = MockPlatform::with_default_devices();
        let mut assets = overlays();
        assets.insert("pia-frame.png", b"broken".to_vec());

        let mut booth = CaptureCoordinator::from_config(&mut platform, assets, &small_config()).unwrap();
        booth.startup().unwrap();
        booth.capture_now().unwrap();
        let first = booth.captured().unwrap().png_bytes().to_vec();

        booth.select_frame("pia").unwrap();
        let token = booth.trigger_capture().unwrap();
        let err = run_to_expiry(&mut booth, token).unwrap_err();

        assert!(matches!(err, BoothError::Compositing(CompositingError::OverlayLoad(_))));
        assert_eq!(booth.captured().unwrap().png_bytes(), first.as_slice());
        assert_eq!(booth.stats().capture_failures, 1);
        assert!(booth.sessions().is_open());
    }

    #[test]
    fn test_stream_not_ready_rejected() {
        let mut platform = MockPlatform::new().with_camera("warming", "Slow Camera", 0, 0);
        let mut booth = booth(&mut platform);
        booth.startup().unwrap();

        assert!(matches!(
            booth.capture_now(),
            Err(BoothError::Compositing(CompositingError::SourceNotReady { .. }))
        ));
        assert!(booth.captured().is_none());
    }

    #[test]
    fn test_overlay_is_drawn_on_top() {
        let mut platform = MockPlatform::with_default_devices();
        let mut assets = overlays();
        let mut border = RgbaImage::new(16, 9);
        border.put_pixel(0, 0, Rgba([255, 0, 255, 255]));
        assets.insert_image("tana-frame.png", &border).unwrap();

        let mut booth = CaptureCoordinator::from_config(&mut platform, assets, &small_config()).unwrap();
        booth.startup().unwrap();
        booth.select_frame("tana").unwrap();
        booth.capture_now().unwrap();

        let image = image::load_from_memory(booth.captured().unwrap().png_bytes())
            .unwrap()
            .to_rgba8();
        assert!(image.get_pixel(0, 0)[3] >= 254);
        assert!(image.get_pixel(0, 0)[0] > 200);
    }

    #[test]
    fn test_unknown_frame_rejected() {
        let mut platform = MockPlatform::with_default_devices();
        let mut booth = booth(&mut platform);
        assert!(matches!(
            booth.select_frame("gold"),
            Err(BoothError::Compositing(CompositingError::UnknownFrame(_)))
        ));
        assert_eq!(booth.state().frames.active().id, "kana");
    }

    #[test]
    fn test_unsupported_countdown() {
        let mut platform = MockPlatform::with_default_devices();
        let mut booth = booth(&mut platform);
        assert!(matches!(
            booth.set_countdown_seconds(3),
            Err(BoothError::Countdown(CountdownError::UnsupportedDuration(3)))
        ));
    }

    #[test]
    fn test_stale_permission_after_shutdown() {
        let mut platform = MockPlatform::with_default_devices();
        {
            let mut booth = booth(&mut platform);
            let check = booth.begin_permission_check();
            booth.shutdown();

            let readiness = booth
                .resolve_permission(check, PermissionOutcome::Granted)
                .unwrap();
            assert_eq!(readiness, Readiness::Stale);
            assert!(!booth.sessions().is_open());
        }
        assert_eq!(platform.open_calls(), 0);
    }

    #[test]
    fn test_no_camera_opens_after_shutdown() {
        let mut platform = MockPlatform::with_default_devices();
        {
            let mut booth = booth(&mut platform);
            booth.startup().unwrap();
            booth.shutdown();

            assert!(matches!(
                booth.select_camera("cam-vga"),
                Err(BoothError::ShutDown)
            ));
            assert!(matches!(booth.trigger_capture(), Err(BoothError::ShutDown)));
            assert!(matches!(booth.startup(), Err(BoothError::ShutDown)));
            assert!(!booth.sessions().is_open());
        }
        assert_eq!(platform.live_streams(), 0);
        assert_eq!(platform.open_calls(), 1);
    }

    #[test]
    fn test_drop_releases_camera() {
        let mut platform = MockPlatform::with_default_devices();
        {
            let mut booth = booth(&mut platform);
            booth.startup().unwrap();
            booth.trigger_capture().unwrap();
        }
        assert_eq!(platform.live_streams(), 0);
    }

    #[test]
    fn test_save_and_discard() {
        let mut platform = MockPlatform::with_default_devices();
        let mut booth = booth(&mut platform);
        booth.startup().unwrap();

        assert!(matches!(
            booth.save_capture("unused.png"),
            Err(BoothError::NothingCaptured)
        ));

        booth.capture_now().unwrap();
        let path = std::env::temp_dir().join(format!("photo-booth-save-{}.png", std::process::id()));
        booth.save_capture(&path).unwrap();
        let written = std::fs::read(&path).unwrap();
        assert_eq!(written.as_slice(), booth.captured().unwrap().png_bytes());
        std::fs::remove_file(&path).unwrap();

        assert!(booth.discard_capture().is_some());
        assert!(booth.captured().is_none());
    }
}
