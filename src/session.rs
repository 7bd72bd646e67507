//! One open board: engine, persistence, history and async completions.
//!
//! DESIGN
//! ======
//! The session is the only owner of the [`EngineCore`] for a board. All
//! mutation goes through it synchronously; afterwards [`BoardSession`]
//! compares the store revision with the last one it saw and, on change,
//! restarts both debounce timers (save and undo snapshot). Camera moves do
//! not bump the revision, so panning never causes a save.
//!
//! Link metadata is fetched on a spawned task that reports back over an
//! unbounded channel as a [`Completion`]. Completions look their item up by
//! id and do nothing if it was deleted meanwhile.
//!
//! [`BoardSession::run`] drives everything from one `select!` loop: host
//! commands, completions and the two timer deadlines.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use canvas::doc::{BoardItem, ItemId, ItemKind};
use canvas::engine::{Action, EngineCore};
use canvas::history::History;
use canvas::input::InputEvent;
use canvas::store::{BoardStore, LinkMetadata, PasteKind, classify_paste};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::BoardApi;
use crate::bookmarks::BoardRegistry;
use crate::config::ClientConfig;
use crate::error::ErrorCode;
use crate::persistence::{Debouncer, PasswordPrompt, PersistError, PersistenceBridge, sleep_until};

pub const LOAD_FAILED: &str = "Failed to load board";
pub const SAVE_FAILED: &str = "Failed to save board";
pub const DECRYPT_FAILED: &str = "Error decrypting";

/// Host request handled by [`BoardSession::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Input(InputEvent),
    Viewport { width: f64, height: f64 },
    Paste(String),
    AddNote(String),
    AddLink(String),
    SetTitle(String),
    SetPassword(Option<String>),
    FitToContent,
    Undo,
    Redo,
    /// Save now instead of waiting for the debounce.
    Flush,
}

/// Result of background work, applied back on the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    LinkMetadata { item: ItemId, metadata: LinkMetadata },
}

pub struct BoardSession<A: ?Sized> {
    engine: EngineCore,
    bridge: PersistenceBridge<A>,
    registry: BoardRegistry,
    history: History,
    history_capacity: usize,
    save_timer: Debouncer,
    history_timer: Debouncer,
    seen_revision: u64,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl<A: BoardApi + ?Sized + 'static> BoardSession<A> {
    #[must_use]
    pub fn new(api: Arc<A>, config: &ClientConfig, registry: BoardRegistry) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            engine: EngineCore::new(),
            bridge: PersistenceBridge::new(api),
            registry,
            history: History::with_capacity(config.history_capacity),
            history_capacity: config.history_capacity,
            save_timer: Debouncer::new(config.save_debounce),
            history_timer: Debouncer::new(config.history_debounce),
            seen_revision: 0,
            completions_tx,
            completions_rx,
        }
    }

    // --- Accessors ---

    #[must_use]
    pub fn engine(&self) -> &EngineCore {
        &self.engine
    }

    #[must_use]
    pub fn store(&self) -> &BoardStore {
        &self.engine.store
    }

    #[must_use]
    pub fn registry(&self) -> &BoardRegistry {
        &self.registry
    }

    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.bridge.has_password()
    }

    #[must_use]
    pub fn has_pending_save(&self) -> bool {
        self.save_timer.is_pending()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || self.history_timer.is_pending()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Lifecycle ---

    /// Load a board by id. `load` resumes the last remembered board and
    /// `create` asks the server for a new one.
    ///
    /// A pending save of the current board is sent first.
    ///
    /// On failure the board stays unloaded and the store error is set. A
    /// failed decrypt additionally drops the password and all pending work.
    ///
    /// # Errors
    ///
    /// Whatever [`PersistenceBridge::load`] reports.
    pub async fn load(&mut self, id: &str, prompt: &dyn PasswordPrompt) -> Result<(), PersistError> {
        self.note_changes();
        if self.save_timer.is_pending() && self.engine.store.board().is_some() {
            if let Err(e) = self.flush().await {
                warn!(error = %e, error_code = e.error_code(), "pending save failed before switching boards");
            }
        }
        let target = self.registry.resolve(id);
        match self.bridge.load(&target, prompt).await {
            Ok(board) => {
                info!(board_id = %board.board_id, items = board.data.items.len(), "board loaded");
                self.registry.remember(&board.board_id, board.data.title.as_deref());
                self.persist_registry();
                self.history.reset(board.data.clone());
                self.save_timer.cancel();
                self.history_timer.cancel();
                self.engine.store.load(board);
                self.seen_revision = self.engine.store.revision();
                Ok(())
            }
            Err(e) if e.is_decrypt_failure() => {
                error!(board_id = %target, error = %e, error_code = e.error_code(), "board decrypt failed");
                self.reset();
                self.engine.store.set_error(Some(DECRYPT_FAILED.into()));
                Err(e)
            }
            Err(e) => {
                error!(board_id = %target, error = %e, error_code = e.error_code(), "board load failed");
                self.engine.store.unload();
                self.engine.store.set_error(Some(LOAD_FAILED.into()));
                Err(e)
            }
        }
    }

    /// Drop the board, the password and every pending save or snapshot. The
    /// host has to load again from scratch.
    pub fn reset(&mut self) {
        let (width, height) = (self.engine.viewport_width, self.engine.viewport_height);
        self.engine = EngineCore::new();
        self.engine.set_viewport(width, height);
        self.bridge.set_password(None);
        self.history = History::with_capacity(self.history_capacity);
        self.save_timer.cancel();
        self.history_timer.cancel();
        self.seen_revision = self.engine.store.revision();
        while self.completions_rx.try_recv().is_ok() {}
    }

    // --- Mutation ---

    /// Feed one input event through the engine.
    pub fn dispatch(&mut self, event: &InputEvent) -> Vec<Action> {
        let actions = self.engine.handle(event);
        self.note_changes();
        actions
    }

    /// Run `f` against the engine, then schedule a save if it changed the
    /// board.
    pub fn with_engine<R>(&mut self, f: impl FnOnce(&mut EngineCore) -> R) -> R {
        let out = f(&mut self.engine);
        self.note_changes();
        out
    }

    /// Run `f` against the store, then schedule a save if it changed the
    /// board.
    pub fn mutate<R>(&mut self, f: impl FnOnce(&mut BoardStore) -> R) -> R {
        self.with_engine(|engine| f(&mut engine.store))
    }

    pub fn set_title(&mut self, title: &str) -> bool {
        if !self.mutate(|store| store.set_title(title)) {
            return false;
        }
        if let Some(id) = self.engine.store.board_id().map(str::to_owned) {
            self.registry.remember(&id, Some(title));
            self.persist_registry();
        }
        true
    }

    /// Set or clear the board password. The next save is re-encrypted (or
    /// sent in plaintext) accordingly.
    pub fn set_password(&mut self, password: Option<String>) {
        self.bridge.set_password(password);
        if self.engine.store.board().is_some() {
            self.save_timer.schedule();
        }
    }

    /// Paste clipboard text at the viewport centre. URLs become link items
    /// whose metadata is fetched in the background.
    pub fn paste(&mut self, text: &str) -> Vec<Action> {
        match classify_paste(text) {
            Some(PasteKind::Link(url)) => self.add_link_item(&url).map(created).unwrap_or_default(),
            Some(_) => self.with_engine(|engine| engine.paste(text)),
            None => Vec::new(),
        }
    }

    /// Add a link placeholder at the viewport centre and start fetching its
    /// metadata. Returns the placeholder right away.
    pub fn add_link_item(&mut self, url: &str) -> Option<BoardItem> {
        let at = self.engine.new_item_placement(ItemKind::Link);
        let item = self.engine.store.add_link_placeholder(url, at)?;
        self.note_changes();
        self.spawn_metadata_fetch(item.id.clone(), url.to_owned());
        Some(item)
    }

    fn spawn_metadata_fetch(&self, item: ItemId, url: String) {
        let api = Arc::clone(self.bridge.api());
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let metadata = match api.fetch_metadata(&url).await {
                Ok(response) => response.into_metadata(),
                Err(e) => {
                    warn!(%url, error = %e, error_code = e.error_code(), "link metadata fetch failed, using fallback");
                    LinkMetadata::Unavailable
                }
            };
            if completions.send(Completion::LinkMetadata { item, metadata }).is_err() {
                debug!(%url, "session closed before link metadata arrived");
            }
        });
    }

    /// Wait for the next background completion.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completions_rx.recv().await
    }

    /// Apply a background completion. Returns whether it changed anything.
    pub fn handle_completion(&mut self, completion: Completion) -> bool {
        match completion {
            Completion::LinkMetadata { item, metadata } => {
                let applied = self.engine.store.resolve_link_metadata(&item, &metadata);
                if !applied {
                    debug!(item = %item, "link item gone before metadata arrived");
                }
                self.note_changes();
                applied
            }
        }
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        self.settle_history();
        let Some(data) = self.history.undo() else {
            return false;
        };
        self.mutate(|store| store.restore(data))
    }

    pub fn redo(&mut self) -> bool {
        self.settle_history();
        let Some(data) = self.history.redo() else {
            return false;
        };
        self.mutate(|store| store.restore(data))
    }

    /// Commit a pending snapshot immediately.
    fn settle_history(&mut self) {
        if self.history_timer.is_pending() {
            self.history_timer.cancel();
            self.commit_history();
        }
    }

    fn commit_history(&mut self) {
        if let Some(board) = self.engine.store.board() {
            self.history.commit(board.data.clone());
        }
    }

    // --- Saving ---

    /// Fire whichever debounce timers are due. Returns whether a save went
    /// out.
    ///
    /// # Errors
    ///
    /// The save error, already recorded on the store.
    pub async fn poll_save(&mut self) -> Result<bool, PersistError> {
        if self.history_timer.fire_if_due() {
            self.commit_history();
        }
        if self.save_timer.fire_if_due() {
            self.save_now().await?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Save immediately and drop the pending debounce.
    ///
    /// # Errors
    ///
    /// [`PersistError::NotLoaded`] without a board, otherwise the save error.
    pub async fn flush(&mut self) -> Result<(), PersistError> {
        self.save_timer.cancel();
        self.settle_history();
        self.save_now().await
    }

    async fn save_now(&mut self) -> Result<(), PersistError> {
        let Some(board) = self.engine.store.snapshot() else {
            return Err(PersistError::NotLoaded);
        };
        match self.bridge.save(&board).await {
            Ok(()) => {
                if self.engine.store.error().is_some() {
                    self.engine.store.set_error(None);
                }
                Ok(())
            }
            Err(e) => {
                error!(
                    board_id = %board.board_id,
                    error = %e,
                    error_code = e.error_code(),
                    retryable = e.retryable(),
                    "board save failed"
                );
                self.engine.store.set_error(Some(SAVE_FAILED.into()));
                Err(e)
            }
        }
    }

    fn note_changes(&mut self) {
        let revision = self.engine.store.revision();
        if revision == self.seen_revision {
            return;
        }
        self.seen_revision = revision;
        self.save_timer.schedule();
        self.history_timer.schedule();
        debug!(revision, "board changed, save scheduled");
    }

    fn persist_registry(&self) {
        if let Err(e) = self.registry.save() {
            warn!(error = %e, error_code = e.error_code(), "bookmark registry write failed");
        }
    }

    // --- Loop ---

    /// Serve host commands until the command channel closes, then flush any
    /// pending save. Actions for the host go out on `actions`.
    ///
    /// # Errors
    ///
    /// Only the final flush can fail the loop; save failures while running
    /// are recorded on the store and retried by the next change.
    pub async fn run(
        &mut self,
        mut commands: mpsc::Receiver<Command>,
        actions: mpsc::UnboundedSender<Action>,
    ) -> Result<(), PersistError> {
        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    for action in self.apply(command).await {
                        if actions.send(action).is_err() {
                            debug!("action receiver dropped");
                            break;
                        }
                    }
                }
                Some(completion) = self.completions_rx.recv() => {
                    if self.handle_completion(completion) && actions.send(Action::RenderNeeded).is_err() {
                        debug!("action receiver dropped");
                    }
                }
                () = sleep_until(self.history_timer.deadline()) => {
                    if self.history_timer.fire_if_due() {
                        self.commit_history();
                    }
                }
                () = sleep_until(self.save_timer.deadline()) => {
                    if let Err(e) = self.poll_save().await {
                        debug!(error = %e, "save failed, waiting for next change");
                    }
                }
            }
        }

        if self.save_timer.is_pending() {
            self.flush().await?;
        }
        Ok(())
    }

    async fn apply(&mut self, command: Command) -> Vec<Action> {
        match command {
            Command::Input(event) => self.dispatch(&event),
            Command::Viewport { width, height } => {
                self.engine.set_viewport(width, height);
                Vec::new()
            }
            Command::Paste(text) => self.paste(&text),
            Command::AddNote(text) => self.with_engine(|engine| engine.add_note(&text)),
            Command::AddLink(url) => self.add_link_item(&url).map(created).unwrap_or_default(),
            Command::SetTitle(title) => {
                self.set_title(&title);
                Vec::new()
            }
            Command::SetPassword(password) => {
                self.set_password(password);
                Vec::new()
            }
            Command::FitToContent => self.with_engine(EngineCore::fit_to_content),
            Command::Undo => rendered(self.undo()),
            Command::Redo => rendered(self.redo()),
            Command::Flush => {
                if let Err(e) = self.flush().await {
                    debug!(error = %e, "explicit flush failed");
                }
                Vec::new()
            }
        }
    }
}

fn created(item: BoardItem) -> Vec<Action> {
    vec![Action::ItemCreated(item), Action::RenderNeeded]
}

fn rendered(changed: bool) -> Vec<Action> {
    if changed { vec![Action::RenderNeeded] } else { Vec::new() }
}
