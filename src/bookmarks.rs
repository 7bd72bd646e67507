//! Local registry of visited boards.
//!
//! Remembers `board_id -> title` in visit order so a neutral entry (`load`)
//! can resume the last board. Persisted as a pretty-printed JSON array next to
//! the user. Forgetting a board here is the only way to "delete" one; the
//! server copy stays.

#[cfg(test)]
#[path = "bookmarks_test.rs"]
mod bookmarks_test;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::api::ExportEntry;
use crate::error::ErrorCode;

/// Title recorded for boards that have none yet.
pub const UNTITLED: &str = "New TackPad";

/// Entry id meaning "resume the last board, or create one".
pub const LOAD: &str = "load";

/// Entry id that asks the server to seed a fresh board.
pub const CREATE: &str = "create";

#[derive(Debug, thiserror::Error)]
pub enum BookmarkError {
    #[error("bookmark file I/O failed for {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("bookmark file {path} is not valid JSON: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
}

impl ErrorCode for BookmarkError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "E_BOOKMARK_IO",
            Self::Json { .. } => "E_BOOKMARK_JSON",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardEntry {
    pub board_id: String,
    pub title: String,
}

#[derive(Debug, Clone, Default)]
pub struct BoardRegistry {
    entries: Vec<BoardEntry>,
    path: Option<PathBuf>,
}

impl BoardRegistry {
    /// Registry that never touches disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the registry at `path`. A missing file is an empty registry.
    ///
    /// # Errors
    ///
    /// I/O failures other than "not found", or a file that is not a JSON
    /// array of entries.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, BookmarkError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => {
                serde_json::from_str(&text).map_err(|source| BookmarkError::Json { path: path.clone(), source })?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(BookmarkError::Io { path, source }),
        };
        Ok(Self { entries, path: Some(path) })
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the registry back to its file. No-op for in-memory registries.
    ///
    /// # Errors
    ///
    /// Serialization or write failures.
    pub fn save(&self) -> Result<(), BookmarkError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let text = serde_json::to_string_pretty(&self.entries)
            .map_err(|source| BookmarkError::Json { path: path.clone(), source })?;
        std::fs::write(path, text).map_err(|source| BookmarkError::Io { path: path.clone(), source })
    }

    #[must_use]
    pub fn entries(&self) -> &[BoardEntry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, board_id: &str) -> Option<&BoardEntry> {
        self.entries.iter().find(|e| e.board_id == board_id)
    }

    /// Most recently added board.
    #[must_use]
    pub fn last(&self) -> Option<&BoardEntry> {
        self.entries.last()
    }

    /// Record a visit. Known boards keep their place and get the new title.
    pub fn remember(&mut self, board_id: &str, title: Option<&str>) {
        let title = title.filter(|t| !t.trim().is_empty()).unwrap_or(UNTITLED).to_owned();
        match self.entries.iter_mut().find(|e| e.board_id == board_id) {
            Some(entry) => entry.title = title,
            None => self.entries.push(BoardEntry { board_id: board_id.to_owned(), title }),
        }
    }

    /// Change the title of a known board.
    pub fn rename(&mut self, board_id: &str, title: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.board_id == board_id) {
            Some(entry) => {
                entry.title = title.to_owned();
                true
            }
            None => false,
        }
    }

    pub fn forget(&mut self, board_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.board_id != board_id);
        self.entries.len() != before
    }

    /// Map an entry id to the id to request: `load` resumes the last board or
    /// falls back to `create`; anything else passes through.
    #[must_use]
    pub fn resolve(&self, id: &str) -> String {
        if id == LOAD {
            return self.last().map_or_else(|| CREATE.to_owned(), |e| e.board_id.clone());
        }
        id.to_owned()
    }

    /// Export request for the given boards, or every known board when `ids`
    /// is empty. Unknown ids are exported under the untitled name.
    #[must_use]
    pub fn export_entries(&self, ids: &[String]) -> Vec<ExportEntry> {
        if ids.is_empty() {
            return self.entries.iter().map(|e| ExportEntry { id: e.board_id.clone(), title: e.title.clone() }).collect();
        }
        ids.iter()
            .map(|id| ExportEntry {
                id: id.clone(),
                title: self.get(id).map_or_else(|| UNTITLED.to_owned(), |e| e.title.clone()),
            })
            .collect()
    }
}
