//! Encoded capture result.

use chrono::{DateTime, Utc};
use std::path::Path;

/// File name offered when saving a capture.
pub const DEFAULT_FILE_NAME: &str = "captured-photo.png";

/// A composited, PNG-encoded still.
///
/// The capture time is kept alongside the bytes, never inside them, so two
/// compositions of the same input are byte-identical.
#[derive(Clone)]
pub struct CapturedImage {
    png: Vec<u8>,
    width: u32,
    height: u32,
    captured_at: DateTime<Utc>,
}

impl CapturedImage {
    pub fn new(png: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            png,
            width,
            height,
            captured_at: Utc::now(),
        }
    }

    /// Encoded PNG bytes.
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Writes the PNG to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path.as_ref(), &self.png)?;
        tracing::info!(path = %path.as_ref().display(), bytes = self.png.len(), "Saved capture");
        Ok(())
    }
}

impl std::fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("png_bytes", &self.png.len())
            .field("captured_at", &self.captured_at)
            .finish()
    }
}
