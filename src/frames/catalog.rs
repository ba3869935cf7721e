//! Selectable overlay catalog.

use serde::{Deserialize, Serialize};

/// A decorative overlay the user can pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameAsset {
    /// Catalog identifier.
    pub id: String,
    /// Reference handed to the asset store.
    pub source: String,
}

impl FrameAsset {
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
        }
    }
}

/// Fixed catalog with exactly one active entry.
#[derive(Debug, Clone)]
pub struct FrameCatalog {
    assets: Vec<FrameAsset>,
    active: usize,
}

impl FrameCatalog {
    /// Builds a catalog with `active` selected.
    ///
    /// Returns `None` if the catalog is empty or `active` is not in it.
    pub fn new(assets: Vec<FrameAsset>, active: &str) -> Option<Self> {
        let active = assets.iter().position(|a| a.id == active)?;
        Some(Self { assets, active })
    }

    /// Makes `id` the active overlay. Returns false if it is not in the catalog.
    pub fn select(&mut self, id: &str) -> bool {
        match self.assets.iter().position(|a| a.id == id) {
            Some(index) => {
                self.active = index;
                tracing::debug!(frame = id, "Frame selected");
                true
            }
            None => false,
        }
    }

    pub fn active(&self) -> &FrameAsset {
        &self.assets[self.active]
    }

    pub fn assets(&self) -> &[FrameAsset] {
        &self.assets
    }
}

/// The stock overlays, first one active by default.
pub fn default_frames() -> Vec<FrameAsset> {
    vec![
        FrameAsset::new("kana", "kana-frame.png"),
        FrameAsset::new("tana", "tana-frame.png"),
        FrameAsset::new("pia", "pia-frame.png"),
    ]
}

impl Default for FrameCatalog {
    fn default() -> Self {
        Self {
            assets: default_frames(),
            active: 0,
        }
    }
}
