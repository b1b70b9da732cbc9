#![forbid(unsafe_code)]

//! Editor configuration as data.
//!
//! Every tunable of the editor lives in one [`EditorConfig`] that can be
//! loaded from TOML or JSON at startup.
//!
//! ```toml
//! # floorplan.toml
//! canvas_size_px = 900.0
//! grid_size = 30
//!
//! [sync]
//! api_base = "http://localhost:8000/api"
//! user_id = "planner-7"
//! ```
//!
//! `EditorConfig::default()` matches the stock editor, so an empty file is a
//! valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Canvas, Zoom};
use crate::request::DistanceMetric;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Edge length of the square display canvas, in pixels.
    pub canvas_size_px: f64,
    /// Initial manual-mode grid resolution.
    pub grid_size: u32,
    pub grid_size_min: u32,
    pub grid_size_max: u32,
    /// Initial build-mode grid dimensions.
    pub build_grid_width: u32,
    pub build_grid_height: u32,
    pub zoom_min: f64,
    pub zoom_max: f64,
    /// Zoom change per unit of ctrl+wheel delta.
    pub zoom_wheel_factor: f64,
    pub sync: SyncConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_size_px: crate::geometry::CANVAS_SIZE_PX,
            grid_size: 30,
            grid_size_min: 5,
            grid_size_max: 100,
            build_grid_width: 20,
            build_grid_height: 20,
            zoom_min: 0.5,
            zoom_max: 3.0,
            zoom_wheel_factor: 0.001,
            sync: SyncConfig::default(),
        }
    }
}

/// Where the optimizer lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Base URL of the optimizer API (`{api_base}/craft/layout`, ...).
    pub api_base: String,
    /// Endpoint receiving fire-and-forget live-edit snapshots.
    pub live_sync_url: String,
    /// Owner recorded when creating a project.
    pub user_id: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub request_timeout_secs: Option<u64>,
    /// Distance metric requested for CRAFT scoring.
    pub metric: DistanceMetric,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000/api".to_string(),
            live_sync_url: "http://localhost:3000/api/plant-layout".to_string(),
            user_id: "anonymous".to_string(),
            request_timeout_secs: None,
            metric: DistanceMetric::Rectilinear,
        }
    }
}

impl EditorConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Load by file extension (`.json` is JSON, anything else TOML) and
    /// reject configurations that fail [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_file(path)?,
            _ => Self::from_toml_file(path)?,
        };
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !(self.canvas_size_px.is_finite() && self.canvas_size_px > 0.0) {
            errors.push(format!(
                "canvas_size_px must be > 0, got {}",
                self.canvas_size_px
            ));
        }

        if self.grid_size_min == 0 {
            errors.push("grid_size_min must be > 0".into());
        }
        if self.grid_size_min > self.grid_size_max {
            errors.push(format!(
                "grid_size_min ({}) must be <= grid_size_max ({})",
                self.grid_size_min, self.grid_size_max
            ));
        }
        if self.grid_size < self.grid_size_min || self.grid_size > self.grid_size_max {
            errors.push(format!(
                "grid_size must be in [{}, {}], got {}",
                self.grid_size_min, self.grid_size_max, self.grid_size
            ));
        }

        if self.build_grid_width == 0 || self.build_grid_height == 0 {
            errors.push("build_grid_width and build_grid_height must be > 0".into());
        }

        if !(self.zoom_min > 0.0 && self.zoom_min <= self.zoom_max) {
            errors.push(format!(
                "zoom bounds must satisfy 0 < zoom_min <= zoom_max, got [{}, {}]",
                self.zoom_min, self.zoom_max
            ));
        }

        if self.sync.api_base.trim().is_empty() {
            errors.push("sync.api_base must not be empty".into());
        }

        errors
    }

    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.canvas_size_px)
    }

    pub fn zoom(&self) -> Zoom {
        Zoom::with_bounds(self.zoom_min, self.zoom_max)
    }
}

/// Errors that can occur when loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(serde_json::Error),

    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
