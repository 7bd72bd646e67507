//! Best-effort undo/redo over board data snapshots.
//!
//! The caller decides when to [`History::commit`] (the session debounces
//! commits so a drag becomes one step). Restoring a snapshot goes back through
//! [`crate::store::BoardStore::restore`], which counts as a normal change.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;

use crate::consts::HISTORY_CAPACITY;
use crate::doc::BoardData;

#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<BoardData>,
    future: Vec<BoardData>,
    present: Option<BoardData>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl History {
    /// History keeping at most `capacity` undo steps.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { past: VecDeque::new(), future: Vec::new(), present: None, capacity: capacity.max(1) }
    }

    /// Forget everything and start from `data`.
    pub fn reset(&mut self, data: BoardData) {
        self.past.clear();
        self.future.clear();
        self.present = Some(data);
    }

    /// Record `data` as the newest state. Identical snapshots are ignored.
    /// Returns whether a step was recorded.
    pub fn commit(&mut self, data: BoardData) -> bool {
        if self.present.as_ref() == Some(&data) {
            return false;
        }
        if let Some(previous) = self.present.replace(data) {
            self.past.push_back(previous);
            while self.past.len() > self.capacity {
                self.past.pop_front();
            }
        }
        self.future.clear();
        true
    }

    /// Step back. Returns the snapshot to restore.
    pub fn undo(&mut self) -> Option<BoardData> {
        let previous = self.past.pop_back()?;
        if let Some(current) = self.present.replace(previous.clone()) {
            self.future.push(current);
        }
        Some(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self) -> Option<BoardData> {
        let next = self.future.pop()?;
        if let Some(current) = self.present.replace(next.clone()) {
            self.past.push_back(current);
        }
        Some(next)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.past.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.past.is_empty()
    }
}
