//! Placement configuration
//!
//! Loaded from TOML. Every field has a default, so a config file only needs
//! the values it changes:
//!
//! ```toml
//! grid_size = 0.25
//!
//! [gesture]
//! pinch_threshold = 0.04
//! ```

use devices::{GestureConfig, TapConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::camera::CameraConfig;
use crate::depth::{DepthScale, HandDepthHeuristic};
use crate::error::ConfigError;

/// Default cube edge length and grid unit
pub const DEFAULT_GRID_SIZE: f32 = 0.5;

/// Distance used for the reticle when no depth sample is available
pub const DEFAULT_DEPTH: f32 = 2.0;

/// Minimum interval between depth map refreshes
pub const DEFAULT_DEPTH_REFRESH_MS: u64 = 100;

/// Depth estimation settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthConfig {
    /// Mapping from raw model output to distance
    pub scale: DepthScale,
    /// Fallback mapping from the pointer landmark's relative z
    pub hand: HandDepthHeuristic,
    /// Minimum time between depth map refresh requests
    pub refresh_interval_ms: u64,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            scale: DepthScale::default(),
            hand: HandDepthHeuristic::default(),
            refresh_interval_ms: DEFAULT_DEPTH_REFRESH_MS,
        }
    }
}

impl DepthConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

/// Configuration for a placement session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Cube edge length, also the snapping grid unit
    pub grid_size: f32,
    /// Whether grid snapping starts enabled
    pub grid_snap: bool,
    /// Reticle distance when depth is unavailable
    pub default_depth: f32,
    /// Request platform anchors for placed cubes (WebXR variant)
    pub request_anchors: bool,
    pub gesture: GestureConfig,
    pub tap: TapConfig,
    pub depth: DepthConfig,
    pub camera: CameraConfig,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            grid_snap: true,
            default_depth: DEFAULT_DEPTH,
            request_anchors: true,
            gesture: GestureConfig::default(),
            tap: TapConfig::default(),
            depth: DepthConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl PlacementConfig {
    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cube-builder").join("config.toml"))
    }

    /// Load from the default location, or return defaults if no file exists
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load and validate a config file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save to the default location, returning the path written
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save to the given path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, self.to_toml()?).map_err(io_err)
    }

    /// Reject values that would make placement meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if !(self.grid_size > 0.0) {
            return invalid("grid_size must be positive");
        }
        if !(self.default_depth > 0.0) {
            return invalid("default_depth must be positive");
        }
        if !(self.gesture.pinch_threshold > 0.0) {
            return invalid("gesture.pinch_threshold must be positive");
        }
        if !(self.gesture.fist_radius > 0.0) {
            return invalid("gesture.fist_radius must be positive");
        }
        if self.gesture.fist_min_fingers == 0 || self.gesture.fist_min_fingers > 5 {
            return invalid("gesture.fist_min_fingers must be between 1 and 5");
        }
        if !(self.camera.near > 0.0 && self.camera.near < self.camera.far) {
            return invalid("camera.near must be positive and less than camera.far");
        }
        if !(self.camera.vfov_degrees > 0.0 && self.camera.vfov_degrees < 180.0) {
            return invalid("camera.vfov_degrees must be between 0 and 180");
        }
        if !(self.camera.aspect > 0.0) {
            return invalid("camera.aspect must be positive");
        }

        Ok(())
    }
}
