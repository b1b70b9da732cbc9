#![forbid(unsafe_code)]

//! Grid geometry: cell rectangles and the cell <-> pixel mapping.
//!
//! The canvas is always rendered as a square of `canvas_size_px` pixels. A
//! grid resolution of `n` cells divides that square into `n` cells per axis,
//! so one cell is `canvas_size_px / n` pixels wide. In build modes the grid
//! may have a different cell count on each axis; the canvas then uses the
//! larger of the two so every cell still fits.
//!
//! Everything here is pure and deterministic. The same functions feed both
//! rendering and drag-delta conversion.

use serde::{Deserialize, Serialize};

/// Default display canvas edge length in pixels.
pub const CANVAS_SIZE_PX: f64 = 900.0;

/// A rectangle in grid cells.
///
/// Uses grid coordinates (0-indexed, origin at top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct GridRect {
    /// Left edge (inclusive).
    pub x: u32,
    /// Top edge (inclusive).
    pub y: u32,
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
}

impl GridRect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Area in cells.
    #[inline]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Top-left corner.
    #[inline]
    pub const fn position(&self) -> GridPoint {
        GridPoint {
            x: self.x,
            y: self.y,
        }
    }

    /// Check whether the rectangle lies fully inside a `cols x rows` grid.
    #[inline]
    pub const fn fits_within(&self, cols: u32, rows: u32) -> bool {
        self.right() <= cols && self.bottom() <= rows
    }

    /// Same rectangle moved to a new top-left corner.
    #[inline]
    pub const fn with_position(self, x: u32, y: u32) -> Self {
        Self { x, y, ..self }
    }
}

/// A grid cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: u32,
    pub y: u32,
}

impl GridPoint {
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A position or size in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Canvas-level geometry parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    size_px: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            size_px: CANVAS_SIZE_PX,
        }
    }
}

impl Canvas {
    /// Create a canvas with the given edge length in pixels.
    pub const fn new(size_px: f64) -> Self {
        Self { size_px }
    }

    /// Canvas edge length in pixels.
    #[inline]
    pub const fn size_px(&self) -> f64 {
        self.size_px
    }

    /// Pixels per cell for a grid resolution.
    ///
    /// A resolution of zero is treated as one cell so the result stays finite.
    #[inline]
    #[must_use]
    pub fn cell_size_px(&self, resolution: u32) -> f64 {
        self.size_px / f64::from(resolution.max(1))
    }

    /// Pixel position of a cell coordinate.
    #[inline]
    #[must_use]
    pub fn to_px(&self, cells: u32, resolution: u32) -> f64 {
        f64::from(cells) * self.cell_size_px(resolution)
    }

    /// Pixel rectangle for a cell rectangle at the given resolution.
    #[must_use]
    pub fn rect_to_px(&self, rect: GridRect, resolution: u32) -> PixelRect {
        PixelRect {
            left: self.to_px(rect.x, resolution),
            top: self.to_px(rect.y, resolution),
            width: self.to_px(rect.width, resolution),
            height: self.to_px(rect.height, resolution),
        }
    }

    /// Convert a screen-pixel delta into whole cells, snapping to the nearest
    /// cell. Halfway cases round away from zero.
    #[must_use]
    pub fn delta_to_cells(&self, delta_px: f64, resolution: u32, zoom: Zoom) -> i64 {
        let cell = self.cell_size_px(resolution) * zoom.factor();
        if !delta_px.is_finite() || cell <= 0.0 {
            return 0;
        }
        (delta_px / cell).round() as i64
    }
}

/// Canvas resolution for build modes: the canvas is square, so the larger
/// axis decides the cell size.
#[inline]
#[must_use]
pub fn build_resolution(grid_width: u32, grid_height: u32) -> u32 {
    grid_width.max(grid_height)
}

/// Display zoom factor, always within its configured bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom {
    factor: f64,
    min: f64,
    max: f64,
}

impl Default for Zoom {
    fn default() -> Self {
        Self {
            factor: 1.0,
            min: 0.5,
            max: 3.0,
        }
    }
}

impl Zoom {
    /// Create a zoom with bounds. The initial factor is 1.0, clamped.
    #[must_use]
    pub fn with_bounds(min: f64, max: f64) -> Self {
        let mut zoom = Self {
            factor: 1.0,
            min,
            max,
        };
        zoom.set(1.0);
        zoom
    }

    /// Current scale factor.
    #[inline]
    pub const fn factor(&self) -> f64 {
        self.factor
    }

    /// Set the factor, clamped to the bounds. Non-finite input is ignored.
    pub fn set(&mut self, factor: f64) {
        if factor.is_finite() {
            self.factor = factor.clamp(self.min, self.max);
        }
    }

    /// Apply a ctrl+wheel step: scrolling down (positive delta) zooms out.
    pub fn wheel(&mut self, delta_y: f64, wheel_factor: f64) {
        self.set(self.factor - delta_y * wheel_factor);
    }
}

#[cfg(test)]
mod tests {
    use super::{Canvas, GridPoint, GridRect, Zoom, build_resolution};

    #[test]
    fn rect_edges_and_area() {
        let rect = GridRect::new(2, 3, 4, 5);
        assert_eq!(rect.right(), 6);
        assert_eq!(rect.bottom(), 8);
        assert_eq!(rect.area(), 20);
        assert_eq!(rect.position(), GridPoint::new(2, 3));
    }

    #[test]
    fn fits_within_is_inclusive_of_far_edge() {
        let rect = GridRect::new(25, 25, 5, 5);
        assert!(rect.fits_within(30, 30));
        assert!(!rect.fits_within(29, 30));
        assert!(!rect.fits_within(30, 29));
    }

    #[test]
    fn cell_size_divides_canvas() {
        let canvas = Canvas::default();
        assert_eq!(canvas.cell_size_px(30), 30.0);
        assert_eq!(canvas.cell_size_px(100), 9.0);
        assert_eq!(canvas.to_px(5, 30), 150.0);
    }

    #[test]
    fn zero_resolution_does_not_divide_by_zero() {
        let canvas = Canvas::default();
        assert_eq!(canvas.cell_size_px(0), 900.0);
    }

    #[test]
    fn rect_to_px_scales_every_field() {
        let px = Canvas::new(600.0).rect_to_px(GridRect::new(1, 2, 3, 4), 20);
        assert_eq!(px.left, 30.0);
        assert_eq!(px.top, 60.0);
        assert_eq!(px.width, 90.0);
        assert_eq!(px.height, 120.0);
    }

    #[test]
    fn delta_snaps_to_nearest_cell() {
        let canvas = Canvas::default();
        let zoom = Zoom::default();
        assert_eq!(canvas.delta_to_cells(30.0, 30, zoom), 1);
        assert_eq!(canvas.delta_to_cells(44.0, 30, zoom), 1);
        assert_eq!(canvas.delta_to_cells(46.0, 30, zoom), 2);
        assert_eq!(canvas.delta_to_cells(-46.0, 30, zoom), -2);
        assert_eq!(canvas.delta_to_cells(45.0, 30, zoom), 2);
        assert_eq!(canvas.delta_to_cells(-45.0, 30, zoom), -2);
        assert_eq!(canvas.delta_to_cells(f64::NAN, 30, zoom), 0);
    }

    #[test]
    fn zoom_scales_screen_delta() {
        let canvas = Canvas::default();
        let mut zoom = Zoom::default();
        zoom.set(2.0);
        assert_eq!(canvas.delta_to_cells(60.0, 30, zoom), 1);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut zoom = Zoom::default();
        zoom.set(10.0);
        assert_eq!(zoom.factor(), 3.0);
        zoom.set(0.1);
        assert_eq!(zoom.factor(), 0.5);
        zoom.set(f64::INFINITY);
        assert_eq!(zoom.factor(), 0.5);
    }

    #[test]
    fn wheel_down_zooms_out() {
        let mut zoom = Zoom::default();
        zoom.wheel(100.0, 0.001);
        assert!((zoom.factor() - 0.9).abs() < 1e-9);
        zoom.wheel(-400.0, 0.001);
        assert!((zoom.factor() - 1.3).abs() < 1e-9);
    }

    #[test]
    fn build_resolution_takes_larger_axis() {
        assert_eq!(build_resolution(12, 20), 20);
        assert_eq!(build_resolution(25, 8), 25);
    }
}
