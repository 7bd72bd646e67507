#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use crate::camera::{Camera, Point};
use crate::consts::FIT_PADDING;
use crate::doc::{BoardItem, ItemContent, ItemId, ItemKind, ItemPatch, NoteContent, Placement};
use crate::gesture::{GestureRecognizer, Signal};
use crate::input::{InputEvent, PointerId};
use crate::interaction::{Handle, InteractionOptions, ItemInteraction};
use crate::layout::{board_bounds, board_center, find_available_position, optimal_zoom};
use crate::minimap::{project, Minimap};
use crate::store::BoardStore;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    CameraChanged(Camera),
    ItemCreated(BoardItem),
    ItemUpdated { id: ItemId, fields: ItemPatch },
    ItemDeleted { id: ItemId },
    SelectionChanged(Option<ItemId>),
    RenderNeeded,
}

/// Routes recognized gestures into the camera, the active item controller
/// and the store.
///
/// Holds no I/O. The async session owns one of these and watches
/// [`BoardStore::revision`] to schedule saves.
#[derive(Debug, Clone)]
pub struct EngineCore {
    pub store: BoardStore,
    pub gestures: GestureRecognizer,
    interaction: Option<(ItemId, ItemInteraction)>,
    /// Zoom when the current pinch started.
    pinch_base: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self {
            store: BoardStore::new(),
            gestures: GestureRecognizer::new(),
            interaction: None,
            pinch_base: 1.0,
            viewport_width: 0.0,
            viewport_height: 0.0,
        }
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Viewport ---

    /// Update viewport dimensions in CSS pixels.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport_width = width.max(0.0);
        self.viewport_height = height.max(0.0);
    }

    pub fn set_pan_enabled(&mut self, enabled: bool) {
        self.gestures.pan_enabled = enabled;
    }

    /// Board-space point in the middle of the viewport.
    #[must_use]
    pub fn viewport_center(&self) -> Point {
        self.store.camera().screen_to_board(Point::new(self.viewport_width * 0.5, self.viewport_height * 0.5))
    }

    /// Placement for a new default-sized item of `kind`: centred in the
    /// viewport, or the first free grid slot while no viewport is known.
    #[must_use]
    pub fn new_item_placement(&self, kind: ItemKind) -> Placement {
        let (w, h) = kind.default_size();
        if self.viewport_width <= 0.0 || self.viewport_height <= 0.0 {
            let slot = find_available_position(self.store.items(), w, h);
            return Placement::sized(slot.x, slot.y, w, h);
        }
        let c = self.viewport_center();
        Placement::sized(c.x - w / 2.0, c.y - h / 2.0, w, h)
    }

    // --- Queries ---

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.store.camera()
    }

    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        self.store.selected_id()
    }

    #[must_use]
    pub fn item(&self, id: &str) -> Option<&BoardItem> {
        self.store.item(id)
    }

    /// Whether an item move or resize is in progress.
    #[must_use]
    pub fn interaction_active(&self) -> bool {
        self.interaction.as_ref().is_some_and(|(_, c)| c.is_active())
    }

    #[must_use]
    pub fn minimap(&self) -> Minimap {
        project(self.store.items(), &self.store.camera(), self.viewport_width, self.viewport_height)
    }

    // --- Creation ---

    /// Add an item of `content`'s kind where [`Self::new_item_placement`] puts it.
    pub fn add_at_center(&mut self, content: ItemContent) -> Vec<Action> {
        let at = self.new_item_placement(content.kind());
        match self.store.add_item(content, at) {
            Some(item) => vec![Action::ItemCreated(item), Action::RenderNeeded],
            None => Vec::new(),
        }
    }

    pub fn add_note(&mut self, text: &str) -> Vec<Action> {
        self.add_at_center(ItemContent::Note(NoteContent { text: text.to_owned(), color: "yellow".into() }))
    }

    /// Create whatever a paste of `text` calls for at the viewport centre.
    pub fn paste(&mut self, text: &str) -> Vec<Action> {
        let center = self.viewport_center();
        match self.store.paste_text(text, center) {
            Some(item) => vec![Action::ItemCreated(item), Action::RenderNeeded],
            None => Vec::new(),
        }
    }

    // --- Camera ---

    /// Centre and zoom the view so every item is visible.
    pub fn fit_to_content(&mut self) -> Vec<Action> {
        let items = self.store.items();
        if items.is_empty() {
            return Vec::new();
        }
        let bounds = board_bounds(items);
        let zoom = optimal_zoom(bounds, self.viewport_width, self.viewport_height, FIT_PADDING);
        let center = board_center(bounds);
        let (vw, vh) = (self.viewport_width, self.viewport_height);
        self.store.camera_mut().look_at(center, zoom, vw, vh);
        vec![Action::CameraChanged(self.store.camera()), Action::RenderNeeded]
    }

    // --- Input ---

    /// Feed one normalized input event.
    pub fn handle(&mut self, event: &InputEvent) -> Vec<Action> {
        let signals = self.gestures.handle(event);
        let mut actions = Vec::new();
        for signal in signals {
            self.apply(signal, &mut actions);
        }
        if !actions.is_empty() {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    fn apply(&mut self, signal: Signal, actions: &mut Vec<Action>) {
        match signal {
            Signal::Pan { dx, dy } => {
                self.store.camera_mut().pan_by(dx, dy);
                actions.push(Action::CameraChanged(self.store.camera()));
            }
            Signal::Zoom { factor, center } => self.zoom(factor, center, actions),
            Signal::PinchStart => self.pinch_base = self.store.camera().zoom,
            Signal::Pinch { ratio, center } => {
                if !self.interaction_active() && self.store.camera_mut().zoom_to(self.pinch_base * ratio, center) {
                    actions.push(Action::CameraChanged(self.store.camera()));
                }
            }
            Signal::ZoomViewport { factor } => {
                let center = Point::new(self.viewport_width * 0.5, self.viewport_height * 0.5);
                self.zoom(factor, center, actions);
            }
            Signal::Select(id) => {
                if self.store.set_selected_id(Some(&id)) {
                    actions.push(Action::SelectionChanged(Some(id)));
                }
            }
            Signal::ClearSelection => {
                if self.store.set_selected_id(None) {
                    actions.push(Action::SelectionChanged(None));
                }
            }
            Signal::BeginMove { item, pointer, pos } => self.begin(item, None, pointer, pos),
            Signal::BeginResize { item, handle, pointer, pos } => self.begin(item, Some(handle), pointer, pos),
            Signal::ItemPointerMoved { pointer, pos } => self.drag(pointer, pos, actions),
            Signal::EndInteraction => {
                if let Some((_, mut controller)) = self.interaction.take() {
                    controller.stop();
                }
            }
            Signal::DeleteSelected => {
                if let Some(id) = self.store.delete_selected() {
                    actions.push(Action::ItemDeleted { id });
                    actions.push(Action::SelectionChanged(None));
                }
            }
        }
    }

    fn zoom(&mut self, factor: f64, center: Point, actions: &mut Vec<Action>) {
        if self.interaction_active() {
            return;
        }
        if self.store.camera_mut().zoom_at(factor, center) {
            actions.push(Action::CameraChanged(self.store.camera()));
        }
    }

    fn begin(&mut self, id: ItemId, handle: Option<Handle>, pointer: PointerId, pos: Point) {
        let Some(item) = self.store.item(&id) else {
            self.gestures.cancel();
            return;
        };
        let mut controller =
            ItemInteraction::new(item.rect(), item.is_locked(), InteractionOptions::for_kind(item.kind()));
        let started = match handle {
            Some(handle) => controller.start_resize(pointer, handle, pos),
            None => controller.start_move(pointer, pos),
        };
        if started {
            self.interaction = Some((id, controller));
        } else {
            self.gestures.cancel();
        }
    }

    fn drag(&mut self, pointer: PointerId, pos: Point, actions: &mut Vec<Action>) {
        let zoom = self.store.camera().zoom;
        let Some((id, controller)) = self.interaction.as_mut() else {
            return;
        };
        let Some(patch) = controller.on_move(pointer, pos, zoom) else {
            return;
        };
        let id = id.clone();
        if self.store.update_item(&id, &patch) {
            actions.push(Action::ItemUpdated { id, fields: patch });
        } else {
            // item vanished mid-drag
            self.interaction = None;
            self.gestures.cancel();
        }
    }
}
