//! Native camera platform backed by `nokhwa`.

use super::platform::{
    MediaDeviceInfo, MediaPlatform, PermissionState, PlatformError, StreamConstraints, StreamHandle,
};
use super::VideoFrame;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera as NokhwaCamera;
use std::collections::HashMap;

/// Media platform over the operating system's camera stack.
#[derive(Default)]
pub struct NativePlatform {
    streams: HashMap<u64, NokhwaCamera>,
    sequences: HashMap<u64, u64>,
    next_stream: u64,
}

impl NativePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn acquire(&mut self, device_id: &str) -> Result<StreamHandle, PlatformError> {
        let index = device_id
            .parse::<u32>()
            .map(CameraIndex::Index)
            .unwrap_or_else(|_| CameraIndex::String(device_id.to_string()));

        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);

        let mut camera = NokhwaCamera::new(index, requested)
            .map_err(|e| PlatformError::DeviceBusy(format!("{device_id}: {e}")))?;
        camera
            .open_stream()
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        self.next_stream += 1;
        let id = self.next_stream;
        self.streams.insert(id, camera);
        self.sequences.insert(id, 0);
        Ok(StreamHandle::new(id, device_id))
    }
}

impl std::fmt::Debug for NativePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativePlatform")
            .field("live_streams", &self.streams.len())
            .finish()
    }
}

impl MediaPlatform for NativePlatform {
    fn enumerate_devices(&mut self) -> Result<Vec<MediaDeviceInfo>, PlatformError> {
        let devices =
            nokhwa::query(ApiBackend::Auto).map_err(|e| PlatformError::Other(e.to_string()))?;

        Ok(devices
            .into_iter()
            .map(|d| MediaDeviceInfo::video(d.index().to_string(), d.human_name()))
            .collect())
    }

    fn query_permission(&mut self) -> Result<PermissionState, PlatformError> {
        if nokhwa::nokhwa_check() {
            Ok(PermissionState::Granted)
        } else {
            Ok(PermissionState::Prompt)
        }
    }

    fn open_stream(&mut self, constraints: &StreamConstraints) -> Result<StreamHandle, PlatformError> {
        match constraints {
            StreamConstraints::AnyVideo => {
                let first = self
                    .enumerate_devices()?
                    .into_iter()
                    .next()
                    .ok_or_else(|| PlatformError::DeviceNotFound("any video input".into()))?;
                self.acquire(&first.id)
            }
            StreamConstraints::ExactDevice(id) => self.acquire(id),
        }
    }

    fn stop_tracks(&mut self, stream: StreamHandle) {
        self.sequences.remove(&stream.id());
        if let Some(mut camera) = self.streams.remove(&stream.id()) {
            if let Err(e) = camera.stop_stream() {
                tracing::warn!(stream = stream.id(), error = %e, "Failed to stop camera stream");
            }
        }
    }

    fn grab_frame(&mut self, stream: &StreamHandle) -> Result<VideoFrame, PlatformError> {
        let camera = self
            .streams
            .get_mut(&stream.id())
            .ok_or(PlatformError::UnknownStream(stream.id()))?;

        let buffer = camera
            .frame()
            .map_err(|e| PlatformError::Other(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        let (width, height) = (decoded.width(), decoded.height());
        let sequence = self.sequences.entry(stream.id()).or_insert(0);
        *sequence += 1;

        Ok(VideoFrame::from_rgb(&decoded.into_raw(), width, height, *sequence))
    }
}
