//! Gesture recognizer.
//!
//! Consumes normalized [`InputEvent`]s and turns them into [`Signal`]s for the
//! camera, the item controller and the selection. The recognizer is in exactly
//! one [`GestureState`] at a time. It tracks every pointer that is down so a
//! second touch can promote a pan into a pinch, and a lifted finger can demote
//! a pinch back into a pan.
//!
//! Pointer-up can be lost (capture loss, the window losing focus). `Blur` and
//! `PointerLeave` therefore end whatever is active and forget every pointer.

#[cfg(test)]
#[path = "gesture_test.rs"]
mod gesture_test;

use crate::camera::Point;
use crate::consts::{ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR};
use crate::doc::ItemId;
use crate::input::{Button, InputEvent, Key, PointerId, PointerKind, Target};
use crate::interaction::Handle;

/// Active gesture.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// One pointer drags the board.
    Panning { pointer: PointerId, last: Point },
    /// Two touches zoom around their midpoint. Zoom follows the ratio to the
    /// distance the pinch started at, so clamping never accumulates.
    Pinching { a: PointerId, b: PointerId, initial_distance: f64, last_mid: Point },
    /// One pointer moves an item.
    ItemDragging { pointer: PointerId },
    /// One pointer resizes an item.
    ItemResizing { pointer: PointerId, handle: Handle },
}

/// What a recognized gesture asks the engine to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Shift the view by a screen-space delta.
    Pan { dx: f64, dy: f64 },
    /// Zoom by `factor` keeping the board point under `center` fixed.
    Zoom { factor: f64, center: Point },
    /// Zoom by `factor` around the middle of the viewport.
    ZoomViewport { factor: f64 },
    /// A pinch began; the current zoom becomes its base.
    PinchStart,
    /// Zoom to `ratio` times the pinch base, keeping `center` fixed.
    Pinch { ratio: f64, center: Point },
    Select(ItemId),
    ClearSelection,
    BeginMove { item: ItemId, pointer: PointerId, pos: Point },
    BeginResize { item: ItemId, handle: Handle, pointer: PointerId, pos: Point },
    /// The pointer owning an item interaction moved.
    ItemPointerMoved { pointer: PointerId, pos: Point },
    EndInteraction,
    DeleteSelected,
}

#[derive(Debug, Clone, Copy)]
struct Contact {
    id: PointerId,
    kind: PointerKind,
    pos: Point,
}

/// Input-stream state machine.
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    state: GestureState,
    contacts: Vec<Contact>,
    /// Whether a primary drag on the background pans the board.
    pub pan_enabled: bool,
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self { state: GestureState::Idle, contacts: Vec::new(), pan_enabled: true }
    }
}

impl GestureRecognizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Whether an item move or resize is in progress.
    #[must_use]
    pub fn item_active(&self) -> bool {
        matches!(self.state, GestureState::ItemDragging { .. } | GestureState::ItemResizing { .. })
    }

    /// Number of pointers currently down.
    #[must_use]
    pub fn pointer_count(&self) -> usize {
        self.contacts.len()
    }

    /// Drop the active gesture without emitting anything. Pointers stay tracked.
    pub fn cancel(&mut self) {
        self.state = GestureState::Idle;
    }

    /// Feed one event.
    pub fn handle(&mut self, event: &InputEvent) -> Vec<Signal> {
        match event {
            InputEvent::PointerDown { pointer, kind, pos, button, target, .. } => {
                self.on_down(*pointer, *kind, *pos, *button, target)
            }
            InputEvent::PointerMove { pointer, pos, .. } => self.on_move(*pointer, *pos),
            InputEvent::PointerUp { pointer, .. } | InputEvent::PointerCancel { pointer } => self.on_up(*pointer),
            InputEvent::PointerLeave | InputEvent::Blur => self.reset(),
            InputEvent::Wheel { pos, delta, modifiers } => {
                if modifiers.zoom() {
                    if self.item_active() || delta.dy == 0.0 {
                        return Vec::new();
                    }
                    let factor = if delta.dy < 0.0 { ZOOM_IN_FACTOR } else { ZOOM_OUT_FACTOR };
                    vec![Signal::Zoom { factor, center: *pos }]
                } else if delta.dx == 0.0 && delta.dy == 0.0 {
                    Vec::new()
                } else {
                    vec![Signal::Pan { dx: -delta.dx, dy: -delta.dy }]
                }
            }
            InputEvent::KeyDown { key, .. } => self.on_key(key),
        }
    }

    fn on_down(&mut self, pointer: PointerId, kind: PointerKind, pos: Point, button: Button, target: &Target) -> Vec<Signal> {
        self.contacts.retain(|c| c.id != pointer);
        self.contacts.push(Contact { id: pointer, kind, pos });

        let idle = self.state == GestureState::Idle;
        let panning = matches!(self.state, GestureState::Panning { .. });

        if kind == PointerKind::Touch && (idle || panning) {
            if let Some((a, b)) = self.touch_pair() {
                self.state = GestureState::Pinching {
                    a: a.id,
                    b: b.id,
                    initial_distance: a.pos.distance(b.pos),
                    last_mid: a.pos.midpoint(b.pos),
                };
                return vec![Signal::PinchStart];
            }
        }
        if idle { self.start_single(pointer, pos, button, target) } else { Vec::new() }
    }

    fn start_single(&mut self, pointer: PointerId, pos: Point, button: Button, target: &Target) -> Vec<Signal> {
        match (button, target) {
            (Button::Middle, _) => {
                self.state = GestureState::Panning { pointer, last: pos };
                Vec::new()
            }
            (Button::Primary, Target::Canvas) => {
                if self.pan_enabled {
                    self.state = GestureState::Panning { pointer, last: pos };
                }
                vec![Signal::ClearSelection]
            }
            (Button::Primary, Target::Item(item)) => {
                self.state = GestureState::ItemDragging { pointer };
                vec![Signal::Select(item.clone()), Signal::BeginMove { item: item.clone(), pointer, pos }]
            }
            (Button::Primary, Target::Handle(item, handle)) => {
                self.state = GestureState::ItemResizing { pointer, handle: *handle };
                vec![
                    Signal::Select(item.clone()),
                    Signal::BeginResize { item: item.clone(), handle: *handle, pointer, pos },
                ]
            }
            (Button::Secondary, _) => Vec::new(),
        }
    }

    fn on_move(&mut self, pointer: PointerId, pos: Point) -> Vec<Signal> {
        if let Some(contact) = self.contacts.iter_mut().find(|c| c.id == pointer) {
            contact.pos = pos;
        }

        match self.state.clone() {
            GestureState::Panning { pointer: owner, last } if owner == pointer => {
                self.state = GestureState::Panning { pointer, last: pos };
                let (dx, dy) = (pos.x - last.x, pos.y - last.y);
                if dx == 0.0 && dy == 0.0 { Vec::new() } else { vec![Signal::Pan { dx, dy }] }
            }
            GestureState::Pinching { a, b, initial_distance, last_mid } if pointer == a || pointer == b => {
                let (Some(pa), Some(pb)) = (self.position_of(a), self.position_of(b)) else {
                    return Vec::new();
                };
                let distance = pa.distance(pb);
                let mid = pa.midpoint(pb);
                self.state = GestureState::Pinching { a, b, initial_distance, last_mid: mid };

                let mut signals = Vec::new();
                let (dx, dy) = (mid.x - last_mid.x, mid.y - last_mid.y);
                if dx != 0.0 || dy != 0.0 {
                    signals.push(Signal::Pan { dx, dy });
                }
                if initial_distance > 0.0 && distance > 0.0 {
                    signals.push(Signal::Pinch { ratio: distance / initial_distance, center: mid });
                }
                signals
            }
            GestureState::ItemDragging { pointer: owner } | GestureState::ItemResizing { pointer: owner, .. }
                if owner == pointer =>
            {
                vec![Signal::ItemPointerMoved { pointer, pos }]
            }
            _ => Vec::new(),
        }
    }

    fn on_up(&mut self, pointer: PointerId) -> Vec<Signal> {
        self.contacts.retain(|c| c.id != pointer);

        match self.state.clone() {
            GestureState::Panning { pointer: owner, .. } if owner == pointer => {
                self.state = GestureState::Idle;
                Vec::new()
            }
            GestureState::Pinching { a, b, .. } if pointer == a || pointer == b => {
                let remaining = if pointer == a { b } else { a };
                self.state = match self.position_of(remaining) {
                    Some(last) => GestureState::Panning { pointer: remaining, last },
                    None => GestureState::Idle,
                };
                Vec::new()
            }
            GestureState::ItemDragging { pointer: owner } | GestureState::ItemResizing { pointer: owner, .. }
                if owner == pointer =>
            {
                self.state = GestureState::Idle;
                vec![Signal::EndInteraction]
            }
            _ => Vec::new(),
        }
    }

    fn on_key(&mut self, key: &Key) -> Vec<Signal> {
        match key.as_str() {
            "+" | "=" if !self.item_active() => vec![Signal::ZoomViewport { factor: ZOOM_IN_FACTOR }],
            "-" | "_" if !self.item_active() => vec![Signal::ZoomViewport { factor: ZOOM_OUT_FACTOR }],
            "Delete" | "Backspace" if !self.item_active() => vec![Signal::DeleteSelected],
            "Escape" => {
                let mut signals = Vec::new();
                if self.item_active() {
                    signals.push(Signal::EndInteraction);
                }
                self.state = GestureState::Idle;
                signals.push(Signal::ClearSelection);
                signals
            }
            _ => Vec::new(),
        }
    }

    /// End everything and forget all pointers.
    fn reset(&mut self) -> Vec<Signal> {
        let ending_item = self.item_active();
        self.state = GestureState::Idle;
        self.contacts.clear();
        if ending_item { vec![Signal::EndInteraction] } else { Vec::new() }
    }

    fn touch_pair(&self) -> Option<(Contact, Contact)> {
        let mut touches = self.contacts.iter().filter(|c| c.kind == PointerKind::Touch);
        let a = *touches.next()?;
        let b = *touches.next()?;
        Some((a, b))
    }

    fn position_of(&self, pointer: PointerId) -> Option<Point> {
        self.contacts.iter().find(|c| c.id == pointer).map(|c| c.pos)
    }
}
