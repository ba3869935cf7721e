//! Video frame grabbed from a live stream.

use image::RgbaImage;
use std::time::Instant;

/// A single frame read from a live camera stream.
///
/// Pixels are tightly packed RGBA8. Dimensions come from the feed itself and
/// vary per device and resolution; a stream that is not ready yet reports
/// zero dimensions.
#[derive(Clone)]
pub struct VideoFrame {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    /// Grab timestamp.
    timestamp: Instant,
    /// Monotonic sequence number within the stream.
    sequence: u64,
}

impl VideoFrame {
    /// Creates a frame from RGBA8 pixels.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            timestamp: Instant::now(),
            sequence,
        }
    }

    /// Creates a frame from packed RGB8 pixels, adding an opaque alpha channel.
    pub fn from_rgb(rgb: &[u8], width: u32, height: u32, sequence: u64) -> Self {
        let pixels = rgb
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], 255])
            .collect();
        Self::new(pixels, width, height, sequence)
    }

    /// Returns the raw RGBA8 pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the grab timestamp.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// True when the stream had produced real pixels (non-zero area).
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Validates that the pixel buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == (self.width as usize) * (self.height as usize) * 4
    }

    /// Copies the frame into an [`RgbaImage`].
    ///
    /// Returns `None` if the buffer does not match the dimensions.
    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }
}

impl std::fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}
