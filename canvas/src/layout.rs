//! Board-space layout helpers: content bounds, fit-to-content zoom and
//! free-slot placement.

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

use crate::camera::{clamp_zoom, Point};
use crate::consts::{PLACEMENT_GRID, PLACEMENT_MARGIN, PLACEMENT_MAX_ATTEMPTS, PLACEMENT_MAX_X, PLACEMENT_OFFSET};
use crate::doc::BoardItem;

/// Axis-aligned box enclosing a set of items.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Bounds of all items; all zero when there are none.
#[must_use]
pub fn board_bounds(items: &[BoardItem]) -> Bounds {
    if items.is_empty() {
        return Bounds::default();
    }
    items.iter().fold(
        Bounds { min_x: f64::INFINITY, min_y: f64::INFINITY, max_x: f64::NEG_INFINITY, max_y: f64::NEG_INFINITY },
        |acc, item| Bounds {
            min_x: acc.min_x.min(item.x_position),
            min_y: acc.min_y.min(item.y_position),
            max_x: acc.max_x.max(item.x_position + item.width),
            max_y: acc.max_y.max(item.y_position + item.height),
        },
    )
}

/// Zoom that fits `bounds` into the viewport with fractional `padding` on
/// every side. Degenerate bounds yield 1.0.
#[must_use]
pub fn optimal_zoom(bounds: Bounds, viewport_width: f64, viewport_height: f64, padding: f64) -> f64 {
    if bounds.width() <= 0.0 || bounds.height() <= 0.0 || viewport_width <= 0.0 || viewport_height <= 0.0 {
        return 1.0;
    }
    let padding = padding.clamp(0.0, 1.0);
    let padded_w = bounds.width() * (1.0 + padding * 2.0);
    let padded_h = bounds.height() * (1.0 + padding * 2.0);
    clamp_zoom((viewport_width / padded_w).min(viewport_height / padded_h))
}

#[must_use]
pub fn board_center(bounds: Bounds) -> Point {
    Point::new(bounds.min_x + bounds.width() / 2.0, bounds.min_y + bounds.height() / 2.0)
}

fn snap(value: f64) -> f64 {
    (value / PLACEMENT_GRID).round() * PLACEMENT_GRID
}

fn overlaps(x: f64, y: f64, width: f64, height: f64, item: &BoardItem) -> bool {
    !(x + width + PLACEMENT_MARGIN < item.x_position
        || x > item.x_position + item.width + PLACEMENT_MARGIN
        || y + height + PLACEMENT_MARGIN < item.y_position
        || y > item.y_position + item.height + PLACEMENT_MARGIN)
}

/// First grid slot, scanning rows from the top-left offset, where an item of
/// the given size clears every existing item by the margin. Falls back to a
/// slot below everything.
#[must_use]
pub fn find_available_position(items: &[BoardItem], width: f64, height: f64) -> Point {
    if items.is_empty() {
        return Point::new(snap(PLACEMENT_OFFSET), snap(PLACEMENT_OFFSET));
    }
    let max_y = items.iter().map(|i| i.y_position + i.height).fold(f64::NEG_INFINITY, f64::max);

    let mut attempts = 0;
    let mut y = PLACEMENT_OFFSET;
    while y <= max_y + PLACEMENT_MARGIN && attempts < PLACEMENT_MAX_ATTEMPTS {
        let mut x = PLACEMENT_OFFSET;
        while x < PLACEMENT_MAX_X && attempts < PLACEMENT_MAX_ATTEMPTS {
            attempts += 1;
            let (sx, sy) = (snap(x), snap(y));
            if !items.iter().any(|item| overlaps(sx, sy, width, height, item)) {
                return Point::new(sx, sy);
            }
            x += PLACEMENT_GRID;
        }
        y += PLACEMENT_GRID;
    }
    Point::new(snap(PLACEMENT_OFFSET), snap(max_y + PLACEMENT_MARGIN * 2.0))
}
