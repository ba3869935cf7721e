//! In-memory media platform.
//!
//! Behaves like a browser media stack closely enough to drive the whole
//! booth without hardware: labels stay empty until permission is granted,
//! a prompt flips the permission state, and a device refuses a second
//! concurrent stream. Every open and stop is recorded so tests can check
//! session exclusivity.

use super::platform::{
    DeviceKind, MediaDeviceInfo, MediaPlatform, PermissionState, PlatformError, StreamConstraints,
    StreamHandle,
};
use super::VideoFrame;
use std::collections::BTreeMap;

/// Something the mock platform observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    Enumerated,
    PermissionQueried,
    Opened { stream: u64, device: String },
    Stopped { stream: u64, device: String },
}

#[derive(Debug, Clone)]
struct MockDevice {
    info: MediaDeviceInfo,
    resolution: (u32, u32),
    busy: bool,
}

/// Mock platform for tests and the hardware-less CLI.
#[derive(Debug)]
pub struct MockPlatform {
    devices: Vec<MockDevice>,
    permission: PermissionState,
    accept_prompt: bool,
    enumeration_fails: bool,
    permission_query_fails: bool,
    live: BTreeMap<u64, String>,
    sequences: BTreeMap<u64, u64>,
    next_stream: u64,
    max_concurrent: usize,
    open_calls: usize,
    events: Vec<PlatformEvent>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            permission: PermissionState::Granted,
            accept_prompt: true,
            enumeration_fails: false,
            permission_query_fails: false,
            live: BTreeMap::new(),
            sequences: BTreeMap::new(),
            next_stream: 1,
            max_concurrent: 0,
            open_calls: 0,
            events: Vec::new(),
        }
    }
}

impl MockPlatform {
    /// Creates an empty platform with permission already granted.
    pub fn new() -> Self {
        Self::default()
    }

    /// A platform with two webcams, one 16:9 and one 4:3.
    pub fn with_default_devices() -> Self {
        Self::new()
            .with_camera("cam-hd", "Integrated Webcam", 1280, 720)
            .with_camera("cam-vga", "USB Camera", 640, 480)
    }

    /// Adds a video input producing frames of the given size.
    pub fn with_camera(mut self, id: &str, label: &str, width: u32, height: u32) -> Self {
        self.devices.push(MockDevice {
            info: MediaDeviceInfo::video(id, label),
            resolution: (width, height),
            busy: false,
        });
        self
    }

    /// Adds a non-video device that enumeration must filter out.
    pub fn with_device(mut self, id: &str, label: &str, kind: DeviceKind) -> Self {
        self.devices.push(MockDevice {
            info: MediaDeviceInfo {
                id: id.to_string(),
                label: label.to_string(),
                kind,
            },
            resolution: (0, 0),
            busy: false,
        });
        self
    }

    /// Marks a device as held by another application.
    pub fn with_busy(mut self, id: &str) -> Self {
        if let Some(device) = self.devices.iter_mut().find(|d| d.info.id == id) {
            device.busy = true;
        }
        self
    }

    pub fn with_permission(mut self, state: PermissionState) -> Self {
        self.permission = state;
        self
    }

    /// Sets how the simulated user answers a permission prompt.
    pub fn with_prompt_answer(mut self, accept: bool) -> Self {
        self.accept_prompt = accept;
        self
    }

    pub fn with_failing_enumeration(mut self) -> Self {
        self.enumeration_fails = true;
        self
    }

    pub fn with_failing_permission_query(mut self) -> Self {
        self.permission_query_fails = true;
        self
    }

    /// Removes a device, as if it was unplugged.
    pub fn unplug(&mut self, id: &str) {
        self.devices.retain(|d| d.info.id != id);
    }

    /// Current permission state.
    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    /// Number of streams currently live.
    pub fn live_streams(&self) -> usize {
        self.live.len()
    }

    /// Highest number of simultaneously live streams ever observed.
    pub fn max_concurrent_streams(&self) -> usize {
        self.max_concurrent
    }

    /// Number of `open_stream` calls, successful or not.
    pub fn open_calls(&self) -> usize {
        self.open_calls
    }

    /// Every event observed so far, in order.
    pub fn events(&self) -> &[PlatformEvent] {
        &self.events
    }

    fn register(&mut self, device_id: &str) -> StreamHandle {
        let id = self.next_stream;
        self.next_stream += 1;
        self.live.insert(id, device_id.to_string());
        self.sequences.insert(id, 0);
        self.max_concurrent = self.max_concurrent.max(self.live.len());
        self.events.push(PlatformEvent::Opened {
            stream: id,
            device: device_id.to_string(),
        });
        tracing::debug!(stream = id, device = device_id, "mock stream opened");
        StreamHandle::new(id, device_id)
    }

    fn acquire(&mut self, device_id: &str) -> Result<StreamHandle, PlatformError> {
        let device = self
            .devices
            .iter()
            .find(|d| d.info.id == device_id && d.info.kind == DeviceKind::VideoInput)
            .ok_or_else(|| PlatformError::DeviceNotFound(device_id.to_string()))?;

        if device.busy || self.live.values().any(|d| d == device_id) {
            return Err(PlatformError::DeviceBusy(device_id.to_string()));
        }

        Ok(self.register(device_id))
    }

    fn resolve_prompt(&mut self) -> Result<(), PlatformError> {
        match self.permission {
            PermissionState::Granted => Ok(()),
            PermissionState::Denied => Err(PlatformError::PermissionDenied),
            PermissionState::Prompt => {
                if self.accept_prompt {
                    self.permission = PermissionState::Granted;
                    Ok(())
                } else {
                    self.permission = PermissionState::Denied;
                    Err(PlatformError::PermissionDenied)
                }
            }
        }
    }
}

impl MediaPlatform for MockPlatform {
    fn enumerate_devices(&mut self) -> Result<Vec<MediaDeviceInfo>, PlatformError> {
        self.events.push(PlatformEvent::Enumerated);
        if self.enumeration_fails {
            return Err(PlatformError::Other("enumeration refused".into()));
        }

        let granted = self.permission == PermissionState::Granted;
        Ok(self
            .devices
            .iter()
            .map(|d| MediaDeviceInfo {
                label: if granted { d.info.label.clone() } else { String::new() },
                ..d.info.clone()
            })
            .collect())
    }

    fn query_permission(&mut self) -> Result<PermissionState, PlatformError> {
        self.events.push(PlatformEvent::PermissionQueried);
        if self.permission_query_fails {
            return Err(PlatformError::NotSupported("permissions query".into()));
        }
        Ok(self.permission)
    }

    fn open_stream(&mut self, constraints: &StreamConstraints) -> Result<StreamHandle, PlatformError> {
        self.open_calls += 1;
        self.resolve_prompt()?;

        match constraints {
            StreamConstraints::AnyVideo => {
                let first = self
                    .devices
                    .iter()
                    .find(|d| d.info.kind == DeviceKind::VideoInput && !d.busy)
                    .map(|d| d.info.id.clone())
                    .ok_or_else(|| PlatformError::DeviceNotFound("any video input".into()))?;
                self.acquire(&first)
            }
            StreamConstraints::ExactDevice(id) => self.acquire(id),
        }
    }

    fn stop_tracks(&mut self, stream: StreamHandle) {
        if let Some(device) = self.live.remove(&stream.id()) {
            self.sequences.remove(&stream.id());
            tracing::debug!(stream = stream.id(), device = %device, "mock stream stopped");
            self.events.push(PlatformEvent::Stopped {
                stream: stream.id(),
                device,
            });
        }
    }

    fn grab_frame(&mut self, stream: &StreamHandle) -> Result<VideoFrame, PlatformError> {
        if !self.live.contains_key(&stream.id()) {
            return Err(PlatformError::UnknownStream(stream.id()));
        }
        let (width, height) = self
            .devices
            .iter()
            .find(|d| d.info.id == stream.device_id())
            .map(|d| d.resolution)
            .ok_or_else(|| PlatformError::DeviceNotFound(stream.device_id().to_string()))?;

        let sequence = self.sequences.entry(stream.id()).or_insert(0);
        *sequence += 1;

        Ok(VideoFrame::new(test_pattern(width, height), width, height, *sequence))
    }
}

/// Deterministic opaque gradient, identical for every grab of a device.
fn test_pattern(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width as usize) * (height as usize) * 4);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                ((x + y) % 256) as u8,
                255,
            ]);
        }
    }
    pixels
}
