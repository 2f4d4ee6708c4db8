//! Full-state snapshot undo/redo.
//!
//! Each recorded mutation stores a deep copy of `{nodes, root_id,
//! active_path}`. Restoring a snapshot swaps all three at once, so compound
//! mutations such as delete-with-refocus undo atomically.

use crate::types::Node;
use indexmap::IndexMap;
use std::collections::VecDeque;

/// Maximum number of undo entries kept; the oldest is evicted on overflow.
pub const MAX_UNDO_HISTORY: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Snapshot {
    pub nodes: IndexMap<String, Node>,
    pub root_id: Option<String>,
    pub active_path: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct History {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(MAX_UNDO_HISTORY)
    }
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            capacity,
        }
    }

    /// Record the state before a new mutation. Any redo future is dropped.
    pub fn record(&mut self, before: Snapshot) {
        self.undo.push_back(before);
        while self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    /// Swap `current` for the most recent undo entry.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Swap `current` for the most recent redo entry.
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo.pop()?;
        self.undo.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[cfg(test)]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }
}
