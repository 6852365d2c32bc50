//! Coordinate transforms between screen pixels, frame space and grid cells.
//!
//! Screen space is device pixels inside the viewport. Frame space is the
//! zoom-independent pixel space of the whole grid; `offset` is the frame
//! point shown at the viewport centre. Cells are integer grid positions.

use crate::vector::{GridBox, Vector};
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Number of columns on the grid.
pub const MAX_GRID_WIDTH: i32 = 2000;
/// Number of rows on the grid.
pub const MAX_GRID_HEIGHT: i32 = 600;

pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 5.0;
pub const DEFAULT_ZOOM: f64 = 1.0;

/// Pixel size of one character cell, as measured by the font provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellMetrics {
    /// Horizontal advance of one cell.
    pub width: f64,
    /// Line height of one cell.
    pub height: f64,
    /// Distance from the top of the cell to the text baseline.
    pub baseline: f64,
}

/// Cell size that persisted offsets are expressed in.
pub const LEGACY_CELL_METRICS: CellMetrics = CellMetrics {
    width: 9.0,
    height: 16.0,
    baseline: 12.0,
};

impl Default for CellMetrics {
    fn default() -> Self {
        LEGACY_CELL_METRICS
    }
}

impl CellMetrics {
    pub fn new(width: f64, height: f64, baseline: f64) -> Self {
        Self { width, height, baseline }
    }

    /// Offset that centres the view on the middle of the grid.
    pub fn default_offset(&self) -> Vec2 {
        Vec2::new(
            f64::from(MAX_GRID_WIDTH) * self.width / 2.0,
            f64::from(MAX_GRID_HEIGHT) * self.height / 2.0,
        )
    }

    /// Convert an offset measured with these metrics into the persisted basis.
    pub fn to_legacy_offset(&self, offset: Vec2) -> Vec2 {
        Vec2::new(
            offset.x * LEGACY_CELL_METRICS.width / self.width,
            offset.y * LEGACY_CELL_METRICS.height / self.height,
        )
    }

    /// Convert a persisted offset into these metrics.
    pub fn from_legacy_offset(&self, stored: Vec2) -> Vec2 {
        Vec2::new(
            stored.x * self.width / LEGACY_CELL_METRICS.width,
            stored.y * self.height / LEGACY_CELL_METRICS.height,
        )
    }

    /// Clamp `zoom` into range and snap it so one cell is a whole number of
    /// pixels tall, avoiding seams between rows.
    pub fn snap_zoom(&self, zoom: f64) -> f64 {
        let zoom = if zoom.is_finite() { zoom } else { DEFAULT_ZOOM };
        let min_px = (MIN_ZOOM * self.height).ceil().max(1.0);
        let max_px = (MAX_ZOOM * self.height).floor().max(min_px);
        let px = (zoom.clamp(MIN_ZOOM, MAX_ZOOM) * self.height).round().clamp(min_px, max_px);
        px / self.height
    }
}

/// The view transform for one frame of input handling or painting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Screen pixels per frame pixel.
    pub zoom: f64,
    /// Frame point shown at the viewport centre.
    pub offset: Vec2,
    /// Viewport size in screen pixels.
    pub viewport: Size,
    pub metrics: CellMetrics,
}

impl ViewTransform {
    pub fn new(zoom: f64, offset: Vec2, viewport: Size, metrics: CellMetrics) -> Self {
        Self {
            zoom,
            offset,
            viewport,
            metrics,
        }
    }

    fn viewport_center(&self) -> Point {
        Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0)
    }

    /// Convert a screen point to frame coordinates.
    pub fn screen_to_frame(&self, p: Point) -> Point {
        let center = self.viewport_center();
        Point::new(
            (p.x - center.x) / self.zoom + self.offset.x,
            (p.y - center.y) / self.zoom + self.offset.y,
        )
    }

    /// Convert a frame point to screen coordinates.
    pub fn frame_to_screen(&self, p: Point) -> Point {
        let center = self.viewport_center();
        Point::new(
            (p.x - self.offset.x) * self.zoom + center.x,
            (p.y - self.offset.y) * self.zoom + center.y,
        )
    }

    /// The cell under a frame point, clamped one cell inside the grid edge.
    ///
    /// Rows are biased by half a cell since glyphs hang from their baseline.
    pub fn frame_to_cell(&self, p: Point) -> Vector {
        let m = &self.metrics;
        let x = (p.x / m.width).round();
        let y = ((p.y + m.height / 2.0) / m.height).round();
        Vector::new(
            clamp_to_grid(x, MAX_GRID_WIDTH),
            clamp_to_grid(y, MAX_GRID_HEIGHT),
        )
    }

    /// The frame point at the centre of a cell.
    pub fn cell_to_frame(&self, cell: Vector) -> Point {
        let m = &self.metrics;
        Point::new(
            f64::from(cell.x) * m.width,
            f64::from(cell.y) * m.height - m.height / 2.0,
        )
    }

    pub fn screen_to_cell(&self, p: Point) -> Vector {
        self.frame_to_cell(self.screen_to_frame(p))
    }

    pub fn cell_to_screen(&self, cell: Vector) -> Point {
        self.frame_to_screen(self.cell_to_frame(cell))
    }

    /// Zoom by `factor`, keeping the frame point under `screen_point` fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_zoom = self.metrics.snap_zoom(self.zoom * factor);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let anchor = self.screen_to_frame(screen_point);
        self.zoom = new_zoom;

        let center = self.viewport_center();
        self.offset = Vec2::new(
            anchor.x - (screen_point.x - center.x) / self.zoom,
            anchor.y - (screen_point.y - center.y) / self.zoom,
        );
    }

    /// Move the view by a delta in screen pixels.
    pub fn pan(&mut self, screen_delta: Vec2) {
        self.offset += screen_delta / self.zoom;
    }
}

/// Whether a cell lies on the grid at all.
pub fn on_grid(cell: Vector) -> bool {
    (0..MAX_GRID_WIDTH).contains(&cell.x) && (0..MAX_GRID_HEIGHT).contains(&cell.y)
}

/// The cells input can reach: the grid minus a one-cell margin.
pub fn drawable_area() -> GridBox {
    GridBox::new(
        Vector::new(1, 1),
        Vector::new(MAX_GRID_WIDTH - 2, MAX_GRID_HEIGHT - 2),
    )
}

/// Clamp a cell into the drawable area, one cell inside the grid edge.
pub fn clamp_cell(cell: Vector) -> Vector {
    Vector::new(
        cell.x.clamp(1, MAX_GRID_WIDTH - 2),
        cell.y.clamp(1, MAX_GRID_HEIGHT - 2),
    )
}

fn clamp_to_grid(value: f64, extent: i32) -> i32 {
    let max = f64::from(extent - 2);
    if value.is_nan() {
        return 1;
    }
    value.clamp(1.0, max) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform() -> ViewTransform {
        let metrics = CellMetrics::new(9.0, 17.0, 13.0);
        ViewTransform::new(1.0, metrics.default_offset(), Size::new(800.0, 600.0), metrics)
    }

    #[test]
    fn test_screen_frame_roundtrip() {
        let mut t = transform();
        t.zoom = 1.5;
        t.offset = Vec2::new(30.0, -20.0);
        let p = Point::new(123.0, 456.0);
        let back = t.frame_to_screen(t.screen_to_frame(p));
        assert!((back.x - p.x).abs() < 1e-10);
        assert!((back.y - p.y).abs() < 1e-10);
    }

    #[test]
    fn test_viewport_center_maps_to_offset() {
        let t = transform();
        let frame = t.screen_to_frame(Point::new(400.0, 300.0));
        assert!((frame.x - t.offset.x).abs() < f64::EPSILON);
        assert!((frame.y - t.offset.y).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cell_roundtrip_inside_bounds() {
        for zoom in [0.5, 1.0, 2.0, 3.3] {
            let mut t = transform();
            t.zoom = t.metrics.snap_zoom(zoom);
            for cell in [
                Vector::new(1, 1),
                Vector::new(1000, 300),
                Vector::new(997, 301),
                Vector::new(MAX_GRID_WIDTH - 2, MAX_GRID_HEIGHT - 2),
            ] {
                assert_eq!(t.screen_to_cell(t.cell_to_screen(cell)), cell, "zoom {}", zoom);
            }
        }
    }

    #[test]
    fn test_frame_to_cell_clamps() {
        let t = transform();
        assert_eq!(t.frame_to_cell(Point::new(-500.0, -500.0)), Vector::new(1, 1));
        assert_eq!(
            t.frame_to_cell(Point::new(1e9, 1e9)),
            Vector::new(MAX_GRID_WIDTH - 2, MAX_GRID_HEIGHT - 2)
        );
    }

    #[test]
    fn test_row_bias() {
        let t = transform();
        let v = t.metrics.height;
        // The band just above a cell's bottom edge belongs to that cell.
        assert_eq!(t.frame_to_cell(Point::new(90.0, 10.0 * v - 1.0)).y, 10);
        assert_eq!(t.frame_to_cell(Point::new(90.0, 9.0 * v + 1.0)).y, 10);
    }

    #[test]
    fn test_snap_zoom_is_pixel_aligned() {
        for height in [16.0, 17.0, 19.5] {
            let metrics = CellMetrics::new(9.0, height, 12.0);
            let mut z = 0.05;
            while z < 6.0 {
                let snapped = metrics.snap_zoom(z);
                let px = snapped * height;
                assert!((px - px.round()).abs() < 1e-9, "{} -> {}", z, snapped);
                assert!(snapped >= MIN_ZOOM - 1e-9 && snapped <= MAX_ZOOM + 1e-9);
                z += 0.037;
            }
        }
    }

    #[test]
    fn test_zoom_at_keeps_anchor_fixed() {
        let mut t = transform();
        let anchor = Point::new(120.0, 80.0);
        let before = t.screen_to_frame(anchor);
        t.zoom_at(anchor, 2.0);
        let after = t.screen_to_frame(anchor);
        assert!((t.zoom - 2.0).abs() < 1e-9);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut t = transform();
        t.zoom_at(Point::ZERO, 0.001);
        assert!(t.zoom >= MIN_ZOOM);
        t.zoom_at(Point::ZERO, 1000.0);
        assert!(t.zoom <= MAX_ZOOM);
    }

    #[test]
    fn test_pan_scales_by_zoom() {
        let mut t = transform();
        t.zoom = 2.0;
        let start = t.offset;
        t.pan(Vec2::new(10.0, -20.0));
        assert!((t.offset.x - start.x - 5.0).abs() < f64::EPSILON);
        assert!((t.offset.y - start.y + 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_legacy_offset_rescale() {
        let metrics = CellMetrics::new(18.0, 32.0, 24.0);
        let offset = Vec2::new(180.0, 320.0);
        let stored = metrics.to_legacy_offset(offset);
        assert!((stored.x - 90.0).abs() < f64::EPSILON);
        assert!((stored.y - 160.0).abs() < f64::EPSILON);
        let back = metrics.from_legacy_offset(stored);
        assert!((back.x - offset.x).abs() < f64::EPSILON);
        assert!((back.y - offset.y).abs() < f64::EPSILON);
    }
}
