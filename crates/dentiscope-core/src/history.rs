//! Snapshot-based undo/redo.
//!
//! Every recorded edit stores a full copy of the state as it was before the
//! edit, so undo and redo reconstruct exact prior states no matter how edits
//! were interleaved. Memory grows linearly with the number of snapshots; an
//! optional limit drops the oldest ones.

use std::collections::VecDeque;

use crate::error::Result;

/// Undo/redo stacks of whole-state snapshots.
#[derive(Debug, Clone)]
pub struct CommandHistory<T> {
    undo: VecDeque<T>,
    redo: Vec<T>,
    limit: Option<usize>,
}

impl<T> Default for CommandHistory<T> {
    fn default() -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: None,
        }
    }
}

impl<T: Clone> CommandHistory<T> {
    /// Creates an unbounded history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a history keeping at most `limit` undo snapshots.
    /// `None` keeps everything.
    #[must_use]
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Returns the snapshot limit.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Pushes a snapshot of `current` and clears the redo stack.
    ///
    /// Call this immediately before mutating `current`.
    pub fn record(&mut self, current: &T) {
        self.undo.push_back(current.clone());
        self.redo.clear();
        if let Some(limit) = self.limit {
            while self.undo.len() > limit {
                self.undo.pop_front();
            }
        }
    }

    /// Runs a fallible edit producing the next state.
    ///
    /// The snapshot is only recorded when the edit succeeds; on error both
    /// `current` and the stacks are unchanged.
    pub fn commit<F>(&mut self, current: &mut T, edit: F) -> Result<()>
    where
        F: FnOnce(&T) -> Result<T>,
    {
        let next = edit(current)?;
        self.record(current);
        *current = next;
        Ok(())
    }

    /// Restores the previous snapshot. Returns false if there is nothing to undo.
    pub fn undo(&mut self, current: &mut T) -> bool {
        let Some(previous) = self.undo.pop_back() else {
            log::debug!("undo requested with empty history");
            return false;
        };
        self.redo.push(std::mem::replace(current, previous));
        true
    }

    /// Re-applies the most recently undone snapshot. Returns false if there is
    /// nothing to redo.
    pub fn redo(&mut self, current: &mut T) -> bool {
        let Some(next) = self.redo.pop() else {
            log::debug!("redo requested with empty history");
            return false;
        };
        self.undo.push_back(std::mem::replace(current, next));
        true
    }

    /// Returns true if an undo is possible.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Returns true if a redo is possible.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undo snapshots held.
    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of redo snapshots held.
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Drops every snapshot.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
