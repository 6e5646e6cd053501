//! Bounded snapshot history with undo and redo.

use std::collections::VecDeque;

/// Ordered, size-bounded list of past states plus a redo list.
///
/// The caller pushes the state *before* each committed edit. Undo trades the
/// current state for the most recent snapshot; redo reverses that. Pushing a
/// new snapshot discards everything that could have been redone.
#[derive(Clone, Debug)]
pub struct History<T> {
    past: VecDeque<T>,
    future: Vec<T>,
    limit: usize,
}

impl<T> History<T> {
    pub const DEFAULT_LIMIT: usize = 20;

    /// Creates an empty history holding at most `limit` snapshots (at least one).
    pub fn new(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Records the state preceding a committed edit.
    ///
    /// Evicts the oldest snapshot once the limit is exceeded and clears redo.
    pub fn push(&mut self, snapshot: T) {
        self.past.push_back(snapshot);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Steps back one edit.
    ///
    /// # Returns
    /// The state to restore, or `None` if there is nothing to undo (then
    /// `current` is dropped and nothing changes).
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.past.pop_back()?;
        self.future.push(current);
        Some(previous)
    }

    /// Steps forward one undone edit.
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.future.pop()?;
        self.past.push_back(current);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of snapshots available to undo.
    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    /// Number of snapshots available to redo.
    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Drops all snapshots.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT)
    }
}
