//! Normalized input model.
//!
//! Mouse, touch and pen events all arrive here as one [`InputEvent`] type. The
//! host adapter translates device events at the boundary (including which
//! element the pointer went down on, as a [`Target`]), so the gesture
//! recognizer never branches on device type.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::doc::ItemId;
use crate::interaction::Handle;

/// Stable identifier of one pointer or touch contact for its lifetime.
pub type PointerId = i32;

/// Device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerKind {
    #[default]
    Mouse,
    Touch,
    Pen,
}

/// Modifier keys down when the event fired.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    /// Option on macOS.
    pub alt: bool,
    /// Command on macOS.
    pub meta: bool,
}

impl Modifiers {
    /// Whether the wheel should zoom instead of pan.
    #[must_use]
    pub fn zoom(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Which button went down. Touch and pen contacts report `Primary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    /// Always pans, whatever it lands on.
    Middle,
    /// Ignored by the recognizer.
    Secondary,
}

/// A keyboard key, named as the browser reports it (`"Delete"`, `"+"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Scroll amount in pixels; positive `dy` scrolls down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelDelta {
    pub dx: f64,
    pub dy: f64,
}

/// What a pointer went down on.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Empty board background.
    Canvas,
    /// The body of an item.
    Item(ItemId),
    /// A resize grip of an item.
    Handle(ItemId, Handle),
}

/// One device-independent input event. Positions are screen space.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        pointer: PointerId,
        kind: PointerKind,
        pos: Point,
        button: Button,
        target: Target,
        modifiers: Modifiers,
    },
    PointerMove {
        pointer: PointerId,
        pos: Point,
        modifiers: Modifiers,
    },
    PointerUp {
        pointer: PointerId,
        pos: Point,
    },
    /// The platform took the pointer away (capture lost, touch cancelled).
    PointerCancel {
        pointer: PointerId,
    },
    /// The pointer left the board surface.
    PointerLeave,
    /// The window lost focus.
    Blur,
    Wheel {
        pos: Point,
        delta: WheelDelta,
        modifiers: Modifiers,
    },
    KeyDown {
        key: Key,
        modifiers: Modifiers,
    },
}
