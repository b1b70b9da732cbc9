#![forbid(unsafe_code)]

//! Editor modes and the grid settings each one reads.
//!
//! `Craft` is manual layout: the user places departments on a square
//! `grid_size` grid and supplies flow and closeness. `Corelap` and `Aldep`
//! build a layout from relations: the user lists prototypes and closeness
//! only, the grid is `grid_width x grid_height`, and departments appear on
//! the canvas only as optimizer previews until applied.
//!
//! Transitions happen only through [`ModeController::select`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::geometry::build_resolution;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Craft,
    Corelap,
    Aldep,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Self::Craft, Self::Corelap, Self::Aldep];

    /// Whether this mode builds from prototypes rather than placed departments.
    #[inline]
    pub const fn is_build(self) -> bool {
        matches!(self, Self::Corelap | Self::Aldep)
    }

    /// Whether the flow matrix is part of this mode's input.
    #[inline]
    pub const fn uses_flow(self) -> bool {
        matches!(self, Self::Craft)
    }

    /// Lowercase name as used in URLs and request bodies.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Craft => "craft",
            Self::Corelap => "corelap",
            Self::Aldep => "aldep",
        }
    }

    /// Case-insensitive parse of a mode name.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "craft" => Some(Self::Craft),
            "corelap" => Some(Self::Corelap),
            "aldep" => Some(Self::Aldep),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Craft => "CRAFT",
            Self::Corelap => "CORELAP",
            Self::Aldep => "ALDEP",
        })
    }
}

/// Current mode plus the grid dimensions of both mode families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeController {
    mode: Mode,
    grid_size: u32,
    grid_size_min: u32,
    grid_size_max: u32,
    grid_width: u32,
    grid_height: u32,
}

impl Default for ModeController {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

impl ModeController {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            mode: Mode::Craft,
            grid_size: config.grid_size,
            grid_size_min: config.grid_size_min,
            grid_size_max: config.grid_size_max,
            grid_width: config.build_grid_width,
            grid_height: config.build_grid_height,
        }
    }

    #[inline]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub const fn grid_size(&self) -> u32 {
        self.grid_size
    }

    #[inline]
    pub const fn grid_width(&self) -> u32 {
        self.grid_width
    }

    #[inline]
    pub const fn grid_height(&self) -> u32 {
        self.grid_height
    }

    /// Resolution used to size canvas cells in the current mode.
    #[must_use]
    pub fn canvas_resolution(&self) -> u32 {
        if self.mode.is_build() {
            build_resolution(self.grid_width, self.grid_height)
        } else {
            self.grid_size
        }
    }

    /// Switch mode. Returns `true` when the mode actually changed.
    pub fn select(&mut self, mode: Mode) -> bool {
        if self.mode == mode {
            return false;
        }
        tracing::debug!(from = %self.mode, to = %mode, "mode transition");
        self.mode = mode;
        true
    }

    /// Set the manual-mode grid size, within the configured bounds.
    pub fn set_grid_size(&mut self, grid_size: u32) -> Result<()> {
        if grid_size < self.grid_size_min || grid_size > self.grid_size_max {
            return Err(EditorError::validation(
                "gridSize",
                format!(
                    "must be between {} and {}",
                    self.grid_size_min, self.grid_size_max
                ),
            ));
        }
        self.grid_size = grid_size;
        Ok(())
    }

    /// Set the build-mode grid dimensions.
    pub fn set_build_grid(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 {
            return Err(EditorError::validation("gridWidth", "must be greater than 0"));
        }
        if height == 0 {
            return Err(EditorError::validation("gridHeight", "must be greater than 0"));
        }
        self.grid_width = width;
        self.grid_height = height;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Mode, ModeController};

    #[test]
    fn craft_resolution_is_grid_size() {
        let controller = ModeController::default();
        assert_eq!(controller.mode(), Mode::Craft);
        assert_eq!(controller.canvas_resolution(), 30);
    }

    #[test]
    fn build_resolution_is_larger_axis() {
        let mut controller = ModeController::default();
        controller.set_build_grid(12, 18).expect("valid grid");
        assert!(controller.select(Mode::Corelap));
        assert_eq!(controller.canvas_resolution(), 18);
        assert!(controller.select(Mode::Aldep));
        assert_eq!(controller.canvas_resolution(), 18);
    }

    #[test]
    fn selecting_current_mode_is_not_a_transition() {
        let mut controller = ModeController::default();
        assert!(!controller.select(Mode::Craft));
    }

    #[test]
    fn grid_size_bounds_are_enforced() {
        let mut controller = ModeController::default();
        assert!(controller.set_grid_size(4).is_err());
        assert!(controller.set_grid_size(101).is_err());
        assert_eq!(controller.grid_size(), 30);
        controller.set_grid_size(100).expect("upper bound is inclusive");
        assert_eq!(controller.grid_size(), 100);
    }

    #[test]
    fn build_grid_rejects_zero() {
        let mut controller = ModeController::default();
        assert!(controller.set_build_grid(0, 5).is_err());
        assert!(controller.set_build_grid(5, 0).is_err());
    }

    #[test]
    fn mode_names_parse_and_display() {
        for mode in Mode::ALL {
            assert_eq!(Mode::parse(mode.slug()), Some(mode));
            assert_eq!(Mode::parse(&mode.to_string()), Some(mode));
        }
        assert_eq!(Mode::parse("slp"), None);
        assert!(Mode::Aldep.is_build());
        assert!(!Mode::Craft.is_build());
        assert!(Mode::Craft.uses_flow());
        assert!(!Mode::Corelap.uses_flow());
    }
}
