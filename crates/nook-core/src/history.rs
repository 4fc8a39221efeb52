//! Bounded undo/redo history
//!
//! The formatting engine checkpoints the whole document before each
//! mutation. History is in-session only; snapshots are never persisted.

use std::collections::VecDeque;

use crate::document::Document;

/// Default number of undo steps kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug)]
pub struct History {
    undo: VecDeque<Document>,
    redo: Vec<Document>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record the state preceding a mutation. Clears the redo stack: a
    /// fresh edit invalidates anything that was undone.
    pub fn record(&mut self, snapshot: Document) {
        if self.undo.len() == self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(snapshot);
        self.redo.clear();
    }

    /// Swap `current` for the most recent undo snapshot.
    ///
    /// Returns the snapshot to restore, or `None` when the stack is empty
    /// (callers report unavailability instead of erroring).
    pub fn undo(&mut self, current: Document) -> Option<Document> {
        let snapshot = self.undo.pop_back()?;
        self.redo.push(current);
        Some(snapshot)
    }

    /// Swap `current` for the most recently undone snapshot.
    pub fn redo(&mut self, current: Document) -> Option<Document> {
        let snapshot = self.redo.pop()?;
        self.undo.push_back(current);
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
