//! Board state store.
//!
//! [`BoardStore`] owns the loaded [`Board`], the selection and the session-only
//! view transform. Every operation that changes persisted data bumps
//! [`BoardStore::revision`]; the persistence layer watches that counter
//! instead of being called back. Without a loaded board every operation is a
//! no-op.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use serde_json::Value;
use url::Url;

use crate::camera::{Camera, Point};
use crate::consts::PASTE_NOTE_THRESHOLD;
use crate::doc::{
    new_item_id, new_task_id, Board, BoardData, BoardItem, EmbedLink, ItemContent, ItemId, ItemKind, ItemPatch,
    LinkContent, NoteContent, PageLink, Placement, Task, TaskId, TextContent, TimerContent, TimerType, TodoContent,
};

/// Result of a link metadata lookup, decoupled from the HTTP shape.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkMetadata {
    /// oEmbed payload from the provider.
    Embed {
        thumbnail_url: Option<String>,
        width: Option<f64>,
        height: Option<f64>,
        html: Option<String>,
        embed_type: Option<String>,
    },
    /// Scraped page metadata.
    Page { title: Option<String>, image: Option<String>, description: Option<String> },
    /// The lookup failed.
    Unavailable,
}

impl LinkMetadata {
    /// Interpret a `{source, data}` metadata response.
    #[must_use]
    pub fn from_wire(source: &str, data: &Value) -> Self {
        let text = |key: &str| data.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()).map(str::to_owned);
        let number = |key: &str| data.get(key).and_then(Value::as_f64).filter(|n| *n > 0.0);
        match source {
            "oembed" => Self::Embed {
                thumbnail_url: text("thumbnail_url"),
                width: number("width").or_else(|| number("thumbnail_width")),
                height: number("height").or_else(|| number("thumbnail_height")),
                html: text("html"),
                embed_type: text("type"),
            },
            "error" => Self::Unavailable,
            _ => Self::Page {
                title: text("title"),
                image: text("image").or_else(|| text("thumbnail_url")),
                description: text("description"),
            },
        }
    }
}

/// What a clipboard paste turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteKind {
    Link(String),
    Note(String),
    Text(String),
}

/// Classify pasted text. Blank text yields `None`.
#[must_use]
pub fn classify_paste(text: &str) -> Option<PasteKind> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if web_url(trimmed).is_some() {
        return Some(PasteKind::Link(trimmed.to_owned()));
    }
    if text.chars().count() > PASTE_NOTE_THRESHOLD {
        Some(PasteKind::Note(text.to_owned()))
    } else {
        Some(PasteKind::Text(text.to_owned()))
    }
}

/// Parse `raw` as an `http`/`https` URL with a host.
fn web_url(raw: &str) -> Option<Url> {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => Some(url),
        _ => None,
    }
}

fn hostname(raw: &str) -> String {
    web_url(raw).and_then(|u| u.host_str().map(str::to_owned)).unwrap_or_default()
}

/// A task being dragged from one list. Lives only as long as the drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDrag {
    pub source: ItemId,
    pub task: TaskId,
}

impl TaskDrag {
    /// Start dragging `task` out of `source`. `None` if either is missing.
    #[must_use]
    pub fn begin(store: &BoardStore, source: &str, task: &str) -> Option<Self> {
        let list = store.item(source)?.todo()?;
        list.tasks.iter().any(|t| t.task_id == task).then(|| Self { source: source.to_owned(), task: task.to_owned() })
    }

    /// Drop onto `target` at `index`. Consumes the drag either way.
    pub fn drop_on(self, store: &mut BoardStore, target: &str, index: usize) -> bool {
        store.move_task_between_lists(&self.source, &self.task, target, index)
    }
}

/// Authoritative in-memory state of one open board.
#[derive(Debug, Clone, Default)]
pub struct BoardStore {
    board: Option<Board>,
    selected_id: Option<ItemId>,
    camera: Camera,
    error: Option<String>,
    revision: u64,
}

impl BoardStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Lifecycle ---

    /// Take ownership of a freshly loaded board.
    pub fn load(&mut self, board: Board) {
        self.board = Some(board);
        self.selected_id = None;
        self.error = None;
        self.camera = Camera::default();
    }

    /// Drop the board and everything tied to it.
    pub fn unload(&mut self) {
        self.board = None;
        self.selected_id = None;
        self.camera = Camera::default();
    }

    /// Replace the persisted data wholesale (undo/redo).
    pub fn restore(&mut self, data: BoardData) -> bool {
        let Some(board) = self.board.as_mut() else {
            return false;
        };
        board.data = data;
        if let Some(id) = &self.selected_id {
            if !board.data.items.iter().any(|i| &i.id == id) {
                self.selected_id = None;
            }
        }
        self.changed();
        true
    }

    fn changed(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    // --- Queries ---

    #[must_use]
    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    #[must_use]
    pub fn board_id(&self) -> Option<&str> {
        self.board.as_ref().map(|b| b.board_id.as_str())
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.board.as_ref().and_then(|b| b.data.title.as_deref())
    }

    #[must_use]
    pub fn items(&self) -> &[BoardItem] {
        self.board.as_ref().map_or(&[], |b| b.data.items.as_slice())
    }

    #[must_use]
    pub fn item(&self, id: &str) -> Option<&BoardItem> {
        self.items().iter().find(|i| i.id == id)
    }

    fn item_mut(&mut self, id: &str) -> Option<&mut BoardItem> {
        self.board.as_mut()?.data.items.iter_mut().find(|i| i.id == id)
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    /// Counter bumped by every change to persisted data.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Copy of the board for saving.
    #[must_use]
    pub fn snapshot(&self) -> Option<Board> {
        self.board.clone()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    // --- View (session only, never persisted) ---

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.camera.set_zoom(scale);
    }

    pub fn set_translate(&mut self, x: f64, y: f64) {
        self.camera.set_pan(x, y);
    }

    // --- Selection / title ---

    /// Select an existing item or clear the selection. Returns whether the
    /// selection changed.
    pub fn set_selected_id(&mut self, id: Option<&str>) -> bool {
        let next = match id {
            Some(id) if self.item(id).is_some() => Some(id.to_owned()),
            Some(_) => return false,
            None => None,
        };
        if next == self.selected_id {
            return false;
        }
        self.selected_id = next;
        true
    }

    pub fn set_title(&mut self, title: &str) -> bool {
        let Some(board) = self.board.as_mut() else {
            return false;
        };
        board.data.title = Some(title.to_owned());
        self.changed();
        true
    }

    // --- Items ---

    /// Append a new item with a fresh unique id and return a copy of it.
    pub fn add_item(&mut self, content: ItemContent, at: Placement) -> Option<BoardItem> {
        let board = self.board.as_mut()?;
        let kind = content.kind();
        let id = loop {
            let candidate = new_item_id(kind);
            if !board.data.items.iter().any(|i| i.id == candidate) {
                break candidate;
            }
        };
        let (default_w, default_h) = kind.default_size();
        let item = BoardItem {
            id,
            content,
            x_position: at.x,
            y_position: at.y,
            width: at.width.unwrap_or(default_w),
            height: at.height.unwrap_or(default_h),
            lock: None,
        };
        board.data.items.push(item.clone());
        self.changed();
        Some(item)
    }

    pub fn add_note(&mut self, text: &str, color: &str, at: Placement) -> Option<BoardItem> {
        self.add_item(ItemContent::Note(NoteContent { text: text.to_owned(), color: color.to_owned() }), at)
    }

    pub fn add_todo_list(&mut self, at: Placement) -> Option<BoardItem> {
        self.add_item(ItemContent::Todo(TodoContent { title: "Todo List".into(), tasks: Vec::new() }), at)
    }

    pub fn add_timer(&mut self, at: Placement) -> Option<BoardItem> {
        self.add_item(ItemContent::Timer(TimerContent::default()), at)
    }

    pub fn add_text_widget(&mut self, at: Placement) -> Option<BoardItem> {
        self.add_item(ItemContent::Text(TextContent { text: "Double click to edit text".into() }), at)
    }

    /// Merge `patch` into the item. `false` if the item is missing or the
    /// patch carries content of another kind.
    pub fn update_item(&mut self, id: &str, patch: &ItemPatch) -> bool {
        let Some(item) = self.item_mut(id) else {
            return false;
        };
        if !patch.apply_to(item) {
            return false;
        }
        self.changed();
        true
    }

    /// Set position, and size where given.
    pub fn update_item_position(&mut self, id: &str, at: Placement) -> bool {
        let patch = ItemPatch {
            x_position: Some(at.x),
            y_position: Some(at.y),
            width: at.width,
            height: at.height,
            ..Default::default()
        };
        self.update_item(id, &patch)
    }

    pub fn set_item_lock(&mut self, id: &str, locked: bool) -> bool {
        self.update_item(id, &ItemPatch { lock: Some(locked), ..Default::default() })
    }

    pub fn update_note_content(&mut self, id: &str, text: Option<&str>, color: Option<&str>) -> bool {
        let Some(ItemContent::Note(note)) = self.item_mut(id).map(|i| &mut i.content) else {
            return false;
        };
        if let Some(text) = text {
            note.text = text.to_owned();
        }
        if let Some(color) = color {
            note.color = color.to_owned();
        }
        self.changed();
        true
    }

    pub fn update_todo_title(&mut self, id: &str, title: &str) -> bool {
        let Some(list) = self.item_mut(id).and_then(BoardItem::todo_mut) else {
            return false;
        };
        list.title = title.to_owned();
        self.changed();
        true
    }

    pub fn update_timer_settings(&mut self, id: &str, timer_type: Option<TimerType>, duration: Option<f64>) -> bool {
        let Some(ItemContent::Timer(timer)) = self.item_mut(id).map(|i| &mut i.content) else {
            return false;
        };
        if timer_type.is_some() {
            timer.timer_type = timer_type;
        }
        if let Some(minutes) = duration.filter(|d| d.is_finite() && *d > 0.0) {
            timer.duration = Some(minutes);
        }
        self.changed();
        true
    }

    pub fn update_text_widget(&mut self, id: &str, text: &str) -> bool {
        let Some(ItemContent::Text(widget)) = self.item_mut(id).map(|i| &mut i.content) else {
            return false;
        };
        widget.text = text.to_owned();
        self.changed();
        true
    }

    /// Remove the selected item and clear the selection. Returns its id.
    pub fn delete_selected(&mut self) -> Option<ItemId> {
        let id = self.selected_id.clone()?;
        let board = self.board.as_mut()?;
        let before = board.data.items.len();
        board.data.items.retain(|i| i.id != id);
        let removed = board.data.items.len() != before;
        self.selected_id = None;
        if removed {
            self.changed();
            Some(id)
        } else {
            None
        }
    }

    // --- Todo lists ---

    /// Append a task. Blank text is rejected.
    pub fn add_task(&mut self, list: &str, text: &str) -> Option<Task> {
        if text.trim().is_empty() {
            return None;
        }
        let todo = self.item_mut(list)?.todo_mut()?;
        let task = Task { task_id: new_task_id(), content: text.to_owned(), completed: false };
        todo.tasks.push(task.clone());
        self.changed();
        Some(task)
    }

    pub fn update_task(&mut self, list: &str, task: &str, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.with_task(list, task, |t| t.content = text.to_owned())
    }

    pub fn toggle_task_completion(&mut self, list: &str, task: &str) -> bool {
        self.with_task(list, task, |t| t.completed = !t.completed)
    }

    fn with_task(&mut self, list: &str, task: &str, f: impl FnOnce(&mut Task)) -> bool {
        let Some(found) =
            self.item_mut(list).and_then(BoardItem::todo_mut).and_then(|l| l.tasks.iter_mut().find(|t| t.task_id == task))
        else {
            return false;
        };
        f(found);
        self.changed();
        true
    }

    pub fn delete_task(&mut self, list: &str, task: &str) -> bool {
        let Some(todo) = self.item_mut(list).and_then(BoardItem::todo_mut) else {
            return false;
        };
        let before = todo.tasks.len();
        todo.tasks.retain(|t| t.task_id != task);
        if todo.tasks.len() == before {
            return false;
        }
        self.changed();
        true
    }

    /// Reorder a list to `order`, which must be a permutation of its task ids.
    pub fn reorder_tasks(&mut self, list: &str, order: &[TaskId]) -> bool {
        let Some(todo) = self.item_mut(list).and_then(BoardItem::todo_mut) else {
            return false;
        };
        if order.len() != todo.tasks.len() {
            return false;
        }
        let mut remaining = todo.tasks.clone();
        let mut reordered = Vec::with_capacity(order.len());
        for id in order {
            let Some(pos) = remaining.iter().position(|t| &t.task_id == id) else {
                return false;
            };
            reordered.push(remaining.swap_remove(pos));
        }
        todo.tasks = reordered;
        self.changed();
        true
    }

    /// Move the task at `from` to index `to` within one list.
    pub fn move_task(&mut self, list: &str, from: usize, to: usize) -> bool {
        let Some(todo) = self.item_mut(list).and_then(BoardItem::todo_mut) else {
            return false;
        };
        if from >= todo.tasks.len() {
            return false;
        }
        let task = todo.tasks.remove(from);
        let to = to.min(todo.tasks.len());
        todo.tasks.insert(to, task);
        self.changed();
        true
    }

    /// Move a task to `index` in another list (or within the same list).
    ///
    /// Both lists are validated before anything is touched, so the task is
    /// never missing from both or present in both. `index` is clamped.
    pub fn move_task_between_lists(&mut self, source: &str, task: &str, target: &str, index: usize) -> bool {
        if source == target {
            let Some(from) = self.item(source).and_then(BoardItem::todo).and_then(|l| l.tasks.iter().position(|t| t.task_id == task))
            else {
                return false;
            };
            return self.move_task(source, from, index);
        }
        if self.item(target).and_then(BoardItem::todo).is_none() {
            return false;
        }
        let Some(source_list) = self.item_mut(source).and_then(BoardItem::todo_mut) else {
            return false;
        };
        let Some(from) = source_list.tasks.iter().position(|t| t.task_id == task) else {
            return false;
        };
        let moved = source_list.tasks.remove(from);
        // target was checked above and nothing between can remove it
        if let Some(target_list) = self.item_mut(target).and_then(BoardItem::todo_mut) {
            let index = index.min(target_list.tasks.len());
            target_list.tasks.insert(index, moved);
        }
        self.changed();
        true
    }

    // --- Links ---

    /// Insert a link item whose metadata is still loading.
    ///
    /// `url` must be an `http`/`https` URL.
    pub fn add_link_placeholder(&mut self, url: &str, at: Placement) -> Option<BoardItem> {
        let host = web_url(url)?.host_str()?.to_owned();
        self.add_item(
            ItemContent::Link(LinkContent::Page(PageLink {
                url: url.to_owned(),
                title: format!("Link to {host}"),
                image: String::new(),
                description: "Loading metadata...".into(),
            })),
            at,
        )
    }

    /// Replace a placeholder's content with fetched metadata, or with the
    /// fallback when the lookup failed. A deleted item is left alone.
    pub fn resolve_link_metadata(&mut self, id: &str, metadata: &LinkMetadata) -> bool {
        let Some(item) = self.item_mut(id) else {
            return false;
        };
        let ItemContent::Link(link) = &item.content else {
            return false;
        };
        let url = link.url().to_owned();
        let host = hostname(&url);

        item.content = ItemContent::Link(match metadata {
            LinkMetadata::Embed { thumbnail_url, width, height, html, embed_type } => {
                let width = width.unwrap_or(item.width);
                let height = height.unwrap_or(item.height);
                item.width = width;
                item.height = height;
                LinkContent::Embed(EmbedLink {
                    url,
                    thumbnail_url: thumbnail_url.clone().unwrap_or_default(),
                    thumbnail_width: width,
                    thumbnail_height: height,
                    html: html.clone().unwrap_or_default(),
                    embed_type: embed_type.clone().unwrap_or_else(|| "rich".into()),
                })
            }
            LinkMetadata::Page { title, image, description } => LinkContent::Page(PageLink {
                url,
                title: title.clone().unwrap_or_else(|| format!("Link to {host}")),
                image: image.clone().unwrap_or_default(),
                description: description.clone().unwrap_or_else(|| format!("A link to {host}")),
            }),
            LinkMetadata::Unavailable => LinkContent::Page(PageLink {
                url,
                title: format!("Link to {host}"),
                image: String::new(),
                description: format!("A link to {host}"),
            }),
        });
        self.changed();
        true
    }

    // --- Paste ---

    /// Create the item a paste of `text` calls for, centred on `center` in
    /// board space. Links come back as loading placeholders.
    pub fn paste_text(&mut self, text: &str, center: Point) -> Option<BoardItem> {
        let kind = classify_paste(text)?;
        let centred = |k: ItemKind| {
            let (w, h) = k.default_size();
            Placement::sized(center.x - w / 2.0, center.y - h / 2.0, w, h)
        };
        match kind {
            PasteKind::Link(url) => self.add_link_placeholder(&url, centred(ItemKind::Link)),
            PasteKind::Note(body) => self.add_note(&body, "yellow", centred(ItemKind::Note)),
            PasteKind::Text(body) => {
                self.add_item(ItemContent::Text(TextContent { text: body }), centred(ItemKind::Text))
            }
        }
    }
}
