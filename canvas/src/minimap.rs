//! Minimap projection of the board and the current viewport.

#[cfg(test)]
#[path = "minimap_test.rs"]
mod minimap_test;

use crate::camera::{Camera, Point};
use crate::consts::{MINIMAP_HEIGHT, MINIMAP_MIN_ITEM_SIZE, MINIMAP_PADDING, MINIMAP_WIDTH};
use crate::doc::{BoardItem, ItemContent, ItemId, Rect};
use crate::layout::{board_bounds, Bounds};

/// One item as drawn on the minimap.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimapItem {
    pub id: ItemId,
    pub rect: Rect,
    pub color: String,
}

/// Everything needed to draw the minimap, in minimap pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimap {
    pub items: Vec<MinimapItem>,
    pub viewport: Rect,
    /// Minimap pixels per board pixel.
    pub ratio: f64,
    /// Board-space area the minimap covers.
    pub bounds: Bounds,
}

fn color_for(item: &BoardItem) -> String {
    match &item.content {
        ItemContent::Note(note) if !note.color.is_empty() => note.color.clone(),
        ItemContent::Note(_) => "#FFD700".into(),
        ItemContent::Todo(_) => "#87CEEB".into(),
        ItemContent::Link(_) => "#98FB98".into(),
        ItemContent::Timer(_) => "#FFA07A".into(),
        ItemContent::Text(_) => "#E6E6FA".into(),
    }
}

/// Area the minimap shows: item bounds grown by twice the padding, or a
/// fixed 1000x1000 square for an empty board.
#[must_use]
pub fn minimap_bounds(items: &[BoardItem]) -> Bounds {
    if items.is_empty() {
        return Bounds { min_x: 0.0, min_y: 0.0, max_x: 1000.0, max_y: 1000.0 };
    }
    let b = board_bounds(items);
    let pad = MINIMAP_PADDING * 2.0;
    Bounds { min_x: b.min_x - pad, min_y: b.min_y - pad, max_x: b.max_x + pad, max_y: b.max_y + pad }
}

/// Project `items` and the visible area of a `viewport_width` x
/// `viewport_height` screen through `camera`.
#[must_use]
pub fn project(items: &[BoardItem], camera: &Camera, viewport_width: f64, viewport_height: f64) -> Minimap {
    let bounds = minimap_bounds(items);
    let ratio = (MINIMAP_WIDTH / bounds.width()).min(MINIMAP_HEIGHT / bounds.height());

    let to_map = |p: Point| Point::new((p.x - bounds.min_x) * ratio, (p.y - bounds.min_y) * ratio);

    let projected = items
        .iter()
        .map(|item| {
            let origin = to_map(Point::new(item.x_position, item.y_position));
            MinimapItem {
                id: item.id.clone(),
                rect: Rect {
                    x: origin.x,
                    y: origin.y,
                    width: (item.width * ratio).max(MINIMAP_MIN_ITEM_SIZE),
                    height: (item.height * ratio).max(MINIMAP_MIN_ITEM_SIZE),
                },
                color: color_for(item),
            }
        })
        .collect();

    let top_left = to_map(camera.screen_to_board(Point::new(0.0, 0.0)));
    let viewport = Rect {
        x: top_left.x,
        y: top_left.y,
        width: camera.screen_dist_to_board(viewport_width) * ratio,
        height: camera.screen_dist_to_board(viewport_height) * ratio,
    };

    Minimap { items: projected, viewport, ratio, bounds }
}
