//! Shared numeric constants for the canvas crate.

// ── Camera ──────────────────────────────────────────────────────

/// Smallest allowed camera zoom.
pub const MIN_ZOOM: f64 = 0.25;

/// Largest allowed camera zoom.
pub const MAX_ZOOM: f64 = 2.0;

/// Zoom multiplier for one wheel tick / key press towards the user.
pub const ZOOM_IN_FACTOR: f64 = 1.1;

/// Zoom multiplier for one wheel tick / key press away from the user.
pub const ZOOM_OUT_FACTOR: f64 = 0.9;

/// Fractional padding applied around content by fit-to-content.
pub const FIT_PADDING: f64 = 0.1;

// ── Item interaction ────────────────────────────────────────────

/// Quantum, in board pixels, that moves and resizes snap to.
pub const GRID_SIZE: f64 = 1.0;

// ── Identifiers ─────────────────────────────────────────────────

/// Alphabet for the random suffix of item and task ids.
pub const ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of the random suffix of item and task ids.
pub const ID_CODE_LEN: usize = 10;

// ── Placement ───────────────────────────────────────────────────

/// Grid the free-slot search steps along.
pub const PLACEMENT_GRID: f64 = 20.0;

/// Required gap between a new item and its neighbours.
pub const PLACEMENT_MARGIN: f64 = 10.0;

/// Top-left offset where the free-slot search starts.
pub const PLACEMENT_OFFSET: f64 = 48.0;

/// Rightmost x the free-slot search scans to.
pub const PLACEMENT_MAX_X: f64 = 3000.0;

/// Upper bound on positions tried by the free-slot search.
pub const PLACEMENT_MAX_ATTEMPTS: usize = 1000;

// ── Paste ───────────────────────────────────────────────────────

/// Pasted text longer than this becomes a note instead of a text widget.
pub const PASTE_NOTE_THRESHOLD: usize = 100;

// ── Minimap ─────────────────────────────────────────────────────

pub const MINIMAP_WIDTH: f64 = 150.0;
pub const MINIMAP_HEIGHT: f64 = 100.0;
pub const MINIMAP_PADDING: f64 = 10.0;

/// Items never render smaller than this on the minimap.
pub const MINIMAP_MIN_ITEM_SIZE: f64 = 3.0;

// ── History ─────────────────────────────────────────────────────

/// Snapshots kept by the undo history.
pub const HISTORY_CAPACITY: usize = 50;
