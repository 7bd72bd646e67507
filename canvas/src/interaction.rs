//! Per-item move/resize controller.
//!
//! An [`ItemInteraction`] is created for one item from its current rect. Move
//! and resize gestures are owned by a single pointer; events from any other
//! pointer are ignored until [`ItemInteraction::stop`]. Every move produces an
//! [`ItemPatch`] in board space which the caller applies to the store.

#[cfg(test)]
#[path = "interaction_test.rs"]
mod interaction_test;

use crate::camera::Point;
use crate::consts::GRID_SIZE;
use crate::doc::{ItemKind, ItemPatch, Rect};
use crate::input::PointerId;

/// Named resize grip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl Handle {
    /// Parse a lowercase compass name (`"se"`, `"n"`).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "n" => Some(Self::N),
            "ne" => Some(Self::Ne),
            "e" => Some(Self::E),
            "se" => Some(Self::Se),
            "s" => Some(Self::S),
            "sw" => Some(Self::Sw),
            "w" => Some(Self::W),
            "nw" => Some(Self::Nw),
            _ => None,
        }
    }

    #[must_use]
    pub fn moves_north(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }

    #[must_use]
    pub fn moves_south(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }

    #[must_use]
    pub fn moves_east(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }

    #[must_use]
    pub fn moves_west(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }
}

/// Resize limits and snapping for one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionOptions {
    pub min_width: f64,
    pub min_height: f64,
    /// Snap quantum in board pixels.
    pub grid: f64,
}

impl InteractionOptions {
    /// Options using the per-kind minimum size and the default grid.
    #[must_use]
    pub fn for_kind(kind: ItemKind) -> Self {
        let (min_width, min_height) = kind.min_size();
        Self { min_width, min_height, grid: GRID_SIZE }
    }
}

impl Default for InteractionOptions {
    fn default() -> Self {
        Self { min_width: 300.0, min_height: 300.0, grid: GRID_SIZE }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Idle,
    Moving,
    Resizing(Handle),
}

/// Move/resize state machine for a single item.
#[derive(Debug, Clone)]
pub struct ItemInteraction {
    options: InteractionOptions,
    locked: bool,
    mode: Mode,
    owner: Option<PointerId>,
    /// Screen position of the pointer at gesture start.
    start_screen: Point,
    /// Item rect at gesture start.
    start_rect: Rect,
    /// Latest rect, either synced from the store or produced by a move.
    current: Rect,
}

impl ItemInteraction {
    #[must_use]
    pub fn new(rect: Rect, locked: bool, options: InteractionOptions) -> Self {
        Self {
            options,
            locked,
            mode: Mode::Idle,
            owner: None,
            start_screen: Point::new(0.0, 0.0),
            start_rect: rect,
            current: rect,
        }
    }

    /// Pick up external changes to the item. Ignored mid-gesture.
    pub fn sync(&mut self, rect: Rect, locked: bool) {
        self.locked = locked;
        if self.mode == Mode::Idle {
            self.current = rect;
        }
    }

    /// Begin moving. Rejected when locked or already active.
    pub fn start_move(&mut self, pointer: PointerId, screen: Point) -> bool {
        self.begin(Mode::Moving, pointer, screen)
    }

    /// Begin resizing from `handle`. Rejected when locked or already active.
    pub fn start_resize(&mut self, pointer: PointerId, handle: Handle, screen: Point) -> bool {
        self.begin(Mode::Resizing(handle), pointer, screen)
    }

    fn begin(&mut self, mode: Mode, pointer: PointerId, screen: Point) -> bool {
        if self.locked || self.mode != Mode::Idle {
            return false;
        }
        self.mode = mode;
        self.owner = Some(pointer);
        self.start_screen = screen;
        self.start_rect = self.current;
        true
    }

    /// Feed a pointer position. `zoom` must be the camera zoom at this event.
    ///
    /// Returns the board-space update, or `None` when idle or when `pointer`
    /// does not own the gesture.
    pub fn on_move(&mut self, pointer: PointerId, screen: Point, zoom: f64) -> Option<ItemPatch> {
        if self.owner != Some(pointer) || !zoom.is_finite() || zoom <= 0.0 {
            return None;
        }
        let dx = screen.x - self.start_screen.x;
        let dy = screen.y - self.start_screen.y;
        match self.mode {
            Mode::Idle => None,
            Mode::Moving => {
                let x = self.snap(self.start_rect.x + dx / zoom);
                let y = self.snap(self.start_rect.y + dy / zoom);
                self.current.x = x;
                self.current.y = y;
                Some(ItemPatch::position(x, y))
            }
            Mode::Resizing(handle) => {
                let next = self.resized(handle, self.snap(dx / zoom), self.snap(dy / zoom));
                self.current = next;
                Some(ItemPatch::rect(next))
            }
        }
    }

    fn resized(&self, handle: Handle, dx: f64, dy: f64) -> Rect {
        let start = self.start_rect;
        let mut next = start;
        let InteractionOptions { min_width, min_height, .. } = self.options;

        if handle.moves_east() {
            next.width = (start.width + dx).max(min_width);
        } else if handle.moves_west() {
            next.width = (start.width - dx).max(min_width);
            // east edge stays put: shift by the clamped width change
            next.x = start.x + (start.width - next.width);
        }

        if handle.moves_south() {
            next.height = (start.height + dy).max(min_height);
        } else if handle.moves_north() {
            next.height = (start.height - dy).max(min_height);
            next.y = start.y + (start.height - next.height);
        }
        next
    }

    fn snap(&self, value: f64) -> f64 {
        let grid = self.options.grid;
        if grid > 0.0 { (value / grid).round() * grid } else { value }
    }

    /// Return to idle. Safe to call from any state, any number of times.
    pub fn stop(&mut self) {
        self.mode = Mode::Idle;
        self.owner = None;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.mode != Mode::Idle
    }

    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.mode == Mode::Moving
    }

    #[must_use]
    pub fn is_resizing(&self) -> bool {
        matches!(self.mode, Mode::Resizing(_))
    }

    /// Pointer that owns the active gesture.
    #[must_use]
    pub fn owner(&self) -> Option<PointerId> {
        self.owner
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        self.current
    }
}
