//! Booth configuration.
//!
//! Everything has a default so the booth runs without a config file; a TOML
//! file can override any section.

use crate::countdown::CountdownDuration;
use crate::frames::{default_frames, FrameAsset};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default output canvas width.
pub const CANVAS_WIDTH: u32 = 1920;
/// Default output canvas height.
pub const CANVAS_HEIGHT: u32 = 1080;

/// Capture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Device to select at startup instead of the first one, if present.
    pub preferred_device: Option<String>,
    /// Output canvas width in pixels.
    pub canvas_width: u32,
    /// Output canvas height in pixels.
    pub canvas_height: u32,
    /// Countdown length in seconds (5 or 10).
    pub countdown_seconds: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            preferred_device: None,
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            countdown_seconds: 5,
        }
    }
}

impl CaptureConfig {
    /// Creates a configuration with the specified canvas size.
    pub fn with_canvas(width: u32, height: u32) -> Self {
        Self {
            canvas_width: width,
            canvas_height: height,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(ConfigError::InvalidCanvas);
        }
        self.countdown()?;
        Ok(())
    }

    /// The configured countdown as a selectable duration.
    pub fn countdown(&self) -> Result<CountdownDuration, ConfigError> {
        CountdownDuration::from_seconds(self.countdown_seconds)
            .ok_or(ConfigError::InvalidCountdown(self.countdown_seconds))
    }
}

/// Overlay catalog settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FramesConfig {
    /// Directory overlay sources are resolved against.
    pub assets_dir: PathBuf,
    /// Selectable overlays.
    pub catalog: Vec<FrameAsset>,
    /// Overlay active at startup.
    pub default_frame: String,
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            catalog: default_frames(),
            default_frame: "kana".to_string(),
        }
    }
}

impl FramesConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        if !self.catalog.iter().any(|f| f.id == self.default_frame) {
            return Err(ConfigError::UnknownFrame(self.default_frame.clone()));
        }
        Ok(())
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where the captured photo is saved.
    pub path: PathBuf,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(crate::compositor::DEFAULT_FILE_NAME),
            metrics_port: 0,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid canvas dimensions")]
    InvalidCanvas,
    #[error("invalid countdown {0}s (must be 5 or 10)")]
    InvalidCountdown(u32),
    #[error("frame catalog is empty")]
    EmptyCatalog,
    #[error("unknown frame: {0}")]
    UnknownFrame(String),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub frames: FramesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        self.frames.validate()
    }
}
