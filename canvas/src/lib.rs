//! Board interaction engine for the sticky-note whiteboard.
//!
//! This crate is synchronous and free of I/O. It owns the view transform, the
//! gesture recognizer, per-item move/resize, and the in-memory board store.
//! Mutations bump a revision counter instead of calling out; the async layer
//! in the root package watches it to debounce saves.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`engine::EngineCore`]: routes input into camera, items and store |
//! | [`camera`] | Pan/zoom transform and screen/board conversions |
//! | [`input`] | Normalized, device-independent input events |
//! | [`gesture`] | Gesture state machine producing pan/zoom/item signals |
//! | [`interaction`] | Per-item move/resize controller |
//! | [`doc`] | Board, item and patch types as stored on the wire |
//! | [`store`] | Board state store and item/task/link operations |
//! | [`layout`] | Content bounds, fit-to-content and free-slot placement |
//! | [`minimap`] | Minimap projection |
//! | [`history`] | Undo/redo snapshots |
//! | [`consts`] | Shared numeric constants (zoom limits, grid, placement) |

pub mod camera;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod gesture;
pub mod history;
pub mod input;
pub mod interaction;
pub mod layout;
pub mod minimap;
pub mod store;
