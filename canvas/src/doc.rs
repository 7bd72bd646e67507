//! Document model: boards, board items, their kind-specific content, and
//! sparse updates.
//!
//! The wire shape matches what the Board API stores: an item is a flat object
//! with `id`, `kind`, `content`, `x_position`, `y_position`, `width`,
//! `height` and an optional `lock`. `kind` and `content` are carried by the
//! adjacently tagged [`ItemContent`] flattened into [`BoardItem`].

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{ID_ALPHABET, ID_CODE_LEN};

/// Identifier of an item, unique within one board.
pub type ItemId = String;

/// Identifier of a task, unique within one todo list.
pub type TaskId = String;

/// Discriminant of a board item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Note,
    Todo,
    Link,
    Timer,
    Text,
}

impl ItemKind {
    /// Id prefix for items of this kind.
    #[must_use]
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Note => "STICKY",
            Self::Todo => "TODO",
            Self::Link => "LINK",
            Self::Timer => "TIMER",
            Self::Text => "TEXT",
        }
    }

    /// Smallest `(width, height)` an interactive resize may produce.
    #[must_use]
    pub fn min_size(self) -> (f64, f64) {
        match self {
            Self::Note => (200.0, 200.0),
            Self::Todo => (300.0, 300.0),
            Self::Link => (300.0, 200.0),
            Self::Timer => (300.0, 150.0),
            Self::Text => (200.0, 64.0),
        }
    }

    /// `(width, height)` used when an item is created without an explicit size.
    #[must_use]
    pub fn default_size(self) -> (f64, f64) {
        match self {
            Self::Note => (300.0, 200.0),
            Self::Todo => (300.0, 300.0),
            Self::Link => (400.0, 200.0),
            Self::Timer => (300.0, 150.0),
            Self::Text => (300.0, 100.0),
        }
    }
}

/// One entry of a todo list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub content: String,
    pub completed: bool,
}

/// Sticky note payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteContent {
    pub text: String,
    pub color: String,
}

/// Todo list payload. Task order is significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoContent {
    pub title: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Metadata scraped from the linked page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLink {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub image: String,
    pub description: String,
}

/// oEmbed payload returned by the linked provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedLink {
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub thumbnail_width: f64,
    #[serde(default)]
    pub thumbnail_height: f64,
    pub html: String,
    #[serde(rename = "type", default)]
    pub embed_type: String,
}

/// Link payload: either oEmbed fields or fetched page metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkContent {
    Embed(EmbedLink),
    Page(PageLink),
}

impl LinkContent {
    /// The linked URL.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Embed(e) => &e.url,
            Self::Page(p) => &p.url,
        }
    }
}

/// Preset of a pomodoro-style timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerType {
    Focus,
    #[serde(rename = "Short Break")]
    ShortBreak,
    #[serde(rename = "Long Break")]
    LongBreak,
}

/// Timer payload; `duration` is in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerContent {
    #[serde(rename = "timerType", default, skip_serializing_if = "Option::is_none")]
    pub timer_type: Option<TimerType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl Default for TimerContent {
    fn default() -> Self {
        Self { timer_type: Some(TimerType::Focus), duration: Some(25.0) }
    }
}

/// Freeform text widget payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
}

/// Kind-specific content of a board item, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "lowercase")]
pub enum ItemContent {
    Note(NoteContent),
    Todo(TodoContent),
    Link(LinkContent),
    Timer(TimerContent),
    Text(TextContent),
}

impl ItemContent {
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Note(_) => ItemKind::Note,
            Self::Todo(_) => ItemKind::Todo,
            Self::Link(_) => ItemKind::Link,
            Self::Timer(_) => ItemKind::Timer,
            Self::Text(_) => ItemKind::Text,
        }
    }
}

/// A placeable board object as stored in the document and on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardItem {
    pub id: ItemId,
    #[serde(flatten)]
    pub content: ItemContent,
    /// Left edge in board space.
    pub x_position: f64,
    /// Top edge in board space.
    pub y_position: f64,
    pub width: f64,
    pub height: f64,
    /// When `Some(true)`, move and resize are rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<bool>,
}

impl BoardItem {
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        self.content.kind()
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock.unwrap_or(false)
    }

    /// Position and size as a [`Rect`].
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect { x: self.x_position, y: self.y_position, width: self.width, height: self.height }
    }

    /// The todo payload, if this is a todo list.
    #[must_use]
    pub fn todo(&self) -> Option<&TodoContent> {
        match &self.content {
            ItemContent::Todo(todo) => Some(todo),
            _ => None,
        }
    }

    pub(crate) fn todo_mut(&mut self) -> Option<&mut TodoContent> {
        match &mut self.content {
            ItemContent::Todo(todo) => Some(todo),
            _ => None,
        }
    }
}

/// Axis-aligned rectangle in board space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Where a new item goes. Missing sizes fall back to the kind default.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl Placement {
    #[must_use]
    pub fn at(x: f64, y: f64) -> Self {
        Self { x, y, width: None, height: None }
    }

    #[must_use]
    pub fn sized(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width: Some(width), height: Some(height) }
    }
}

/// Persisted payload of a board.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoardData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub items: Vec<BoardItem>,
}

/// A whole board as exchanged with the Board API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub board_id: String,
    pub data: BoardData,
}

/// Sparse update for a board item. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_position: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_position: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock: Option<bool>,
    /// Replacement content; must be the same kind as the target item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ItemContent>,
}

impl ItemPatch {
    /// Patch that moves an item.
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self { x_position: Some(x), y_position: Some(y), ..Default::default() }
    }

    /// Patch that sets position and size.
    #[must_use]
    pub fn rect(rect: Rect) -> Self {
        Self {
            x_position: Some(rect.x),
            y_position: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
            ..Default::default()
        }
    }

    /// Patch that replaces the content.
    #[must_use]
    pub fn content(content: ItemContent) -> Self {
        Self { content: Some(content), ..Default::default() }
    }

    /// Apply to `item`. Returns `false` without touching the item when the
    /// replacement content is of a different kind.
    pub fn apply_to(&self, item: &mut BoardItem) -> bool {
        if let Some(content) = &self.content {
            if content.kind() != item.kind() {
                return false;
            }
        }
        if let Some(x) = self.x_position {
            item.x_position = x;
        }
        if let Some(y) = self.y_position {
            item.y_position = y;
        }
        if let Some(w) = self.width {
            item.width = w;
        }
        if let Some(h) = self.height {
            item.height = h;
        }
        if let Some(lock) = self.lock {
            item.lock = Some(lock);
        }
        if let Some(content) = &self.content {
            item.content = content.clone();
        }
        true
    }
}

/// Random suffix drawn from [`ID_ALPHABET`].
#[must_use]
pub fn random_code() -> String {
    let mut rng = rand::rng();
    (0..ID_CODE_LEN)
        .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
        .collect()
}

/// Fresh id of the form `<PREFIX>-<CODE>`.
#[must_use]
pub fn new_item_id(kind: ItemKind) -> ItemId {
    format!("{}-{}", kind.id_prefix(), random_code())
}

/// Fresh task id of the form `TASK-<CODE>`.
#[must_use]
pub fn new_task_id() -> TaskId {
    format!("TASK-{}", random_code())
}
