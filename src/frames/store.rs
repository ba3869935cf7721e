//! Overlay image loading.

use image::RgbaImage;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Errors loading an overlay image.
#[derive(Debug, Clone, Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("failed to decode {source_ref}: {message}")]
    Decode { source_ref: String, message: String },
}

/// Loads images by reference.
pub trait AssetStore {
    /// Loads and decodes the image behind `source`.
    fn load_image(&self, source: &str) -> Result<RgbaImage, AssetError>;
}

/// Resolves sources against a directory on disk.
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetStore for DirAssetStore {
    fn load_image(&self, source: &str) -> Result<RgbaImage, AssetError> {
        let path = self.root.join(source);
        if !path.is_file() {
            return Err(AssetError::NotFound(path.display().to_string()));
        }
        let image = image::open(&path).map_err(|e| AssetError::Decode {
            source_ref: path.display().to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "Loaded overlay");
        Ok(image.to_rgba8())
    }
}

/// Holds encoded images in memory, keyed by source.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetStore {
    images: HashMap<String, Vec<u8>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers encoded image bytes under `source`.
    pub fn insert(&mut self, source: impl Into<String>, encoded: Vec<u8>) {
        self.images.insert(source.into(), encoded);
    }

    /// Registers a decoded image, encoding it as PNG.
    pub fn insert_image(&mut self, source: impl Into<String>, image: &RgbaImage) -> Result<(), AssetError> {
        let source = source.into();
        let mut encoded = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut encoded), image::ImageFormat::Png)
            .map_err(|e| AssetError::Decode {
                source_ref: source.clone(),
                message: e.to_string(),
            })?;
        self.images.insert(source, encoded);
        Ok(())
    }
}

impl AssetStore for MemoryAssetStore {
    fn load_image(&self, source: &str) -> Result<RgbaImage, AssetError> {
        let bytes = self
            .images
            .get(source)
            .ok_or_else(|| AssetError::NotFound(source.to_string()))?;
        let image = image::load_from_memory(bytes).map_err(|e| AssetError::Decode {
            source_ref: source.to_string(),
            message: e.to_string(),
        })?;
        Ok(image.to_rgba8())
    }
}
