//! Frame overlays: the catalog and where the images come from.

mod catalog;
mod store;

pub use catalog::{default_frames, FrameAsset, FrameCatalog};
pub use store::{AssetError, AssetStore, DirAssetStore, MemoryAssetStore};
