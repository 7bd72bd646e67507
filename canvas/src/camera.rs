#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use crate::consts::{MAX_ZOOM, MIN_ZOOM};

/// A point in either screen or board space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Point) -> Point {
        Point { x: (self.x + other.x) / 2.0, y: (self.y + other.y) / 2.0 }
    }

    /// Euclidean distance between `self` and `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Clamp a zoom factor into `[MIN_ZOOM, MAX_ZOOM]`.
#[must_use]
pub fn clamp_zoom(zoom: f64) -> f64 {
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Camera state for pan/zoom on the infinite board.
///
/// `pan_x` / `pan_y` are the screen-space offset of the board origin in CSS
/// pixels. `zoom` is a scale factor (1.0 = no zoom) kept within
/// `[MIN_ZOOM, MAX_ZOOM]` by every mutator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0 }
    }
}

impl Camera {
    /// Convert a screen-space point (CSS pixels) to board coordinates.
    #[must_use]
    pub fn screen_to_board(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.zoom,
            y: (screen.y - self.pan_y) / self.zoom,
        }
    }

    /// Convert a board-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn board_to_screen(&self, board: Point) -> Point {
        Point {
            x: board.x * self.zoom + self.pan_x,
            y: board.y * self.zoom + self.pan_y,
        }
    }

    /// Convert a screen-space distance (pixels) to board-space distance.
    #[must_use]
    pub fn screen_dist_to_board(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// Multiply zoom by `factor` while keeping the board point under `center` fixed.
    ///
    /// Returns `false` (and leaves the camera untouched) when the clamped zoom
    /// equals the current zoom, so repeated zooming at a bound cannot drift the pan.
    pub fn zoom_at(&mut self, factor: f64, center: Point) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        self.zoom_to(self.zoom * factor, center)
    }

    /// Set zoom to `zoom` (clamped) while keeping the board point under `center` fixed.
    ///
    /// Returns `false` when the clamped zoom equals the current zoom.
    pub fn zoom_to(&mut self, zoom: f64, center: Point) -> bool {
        if !zoom.is_finite() {
            return false;
        }
        let new_zoom = clamp_zoom(zoom);
        if new_zoom == self.zoom {
            return false;
        }
        let anchor = self.screen_to_board(center);
        self.zoom = new_zoom;
        self.pan_x = center.x - anchor.x * new_zoom;
        self.pan_y = center.y - anchor.y * new_zoom;
        true
    }

    /// Shift the board by a screen-space delta. Pan is not scaled by zoom.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Set zoom directly (clamped), leaving the pan untouched.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = clamp_zoom(zoom);
        }
    }

    /// Set the pan offset directly.
    pub fn set_pan(&mut self, pan_x: f64, pan_y: f64) {
        self.pan_x = pan_x;
        self.pan_y = pan_y;
    }

    /// Position the camera so `center` (board space) sits in the middle of a
    /// `viewport_width` x `viewport_height` viewport at the given zoom.
    pub fn look_at(&mut self, center: Point, zoom: f64, viewport_width: f64, viewport_height: f64) {
        self.set_zoom(zoom);
        self.pan_x = viewport_width * 0.5 - center.x * self.zoom;
        self.pan_y = viewport_height * 0.5 - center.y * self.zoom;
    }
}
