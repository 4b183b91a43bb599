// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Undo/redo history of box collections.
//!
//! The undo stack always keeps one baseline entry that can never be
//! popped, so undoing on a freshly loaded image is a no-op.

use super::annotation::BoxStore;

/// Maximum number of snapshots kept on the undo stack.
pub const MAX_HISTORY: usize = 101;

/// History system for undo/redo functionality.
#[derive(Debug, Clone)]
pub struct History {
    /// Undo stack (past states, baseline at index 0)
    undo_stack: Vec<BoxStore>,
    /// Redo stack (future states after undo)
    redo_stack: Vec<BoxStore>,
    /// Maximum history size
    max_size: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size: MAX_HISTORY,
        }
    }

    /// Rebuild a history from persisted stacks.
    pub fn from_stacks(mut undo_stack: Vec<BoxStore>, redo_stack: Vec<BoxStore>) -> Self {
        if undo_stack.len() > MAX_HISTORY {
            undo_stack.drain(..undo_stack.len() - MAX_HISTORY);
        }
        Self {
            undo_stack,
            redo_stack,
            max_size: MAX_HISTORY,
        }
    }

    /// Drop everything and start over from `baseline`.
    pub fn reset(&mut self, baseline: &BoxStore) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.undo_stack.push(baseline.clone());
    }

    /// Save current state before making a change.
    pub fn snapshot(&mut self, boxes: &BoxStore) {
        self.undo_stack.push(boxes.clone());
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Undo: restore the state saved before the latest edit.
    ///
    /// `current` is parked on the redo stack. Returns `None` when only the
    /// baseline is left.
    pub fn undo(&mut self, current: &BoxStore) -> Option<BoxStore> {
        if !self.can_undo() {
            log::warn!("Nothing left to undo");
            return None;
        }
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current.clone());
        Some(previous)
    }

    /// Redo: restore the state most recently undone.
    pub fn redo(&mut self, current: &BoxStore) -> Option<BoxStore> {
        let Some(next) = self.redo_stack.pop() else {
            log::warn!("Nothing left to redo");
            return None;
        };
        self.undo_stack.push(current.clone());
        Some(next)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_stack(&self) -> &[BoxStore] {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &[BoxStore] {
        &self.redo_stack
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::Rect;

    fn edit(history: &mut History, boxes: &mut BoxStore, n: i32) {
        history.snapshot(boxes);
        boxes.add(Rect::new(n, n, n + 10, n + 10), 0);
    }

    #[test]
    fn test_undo_on_baseline_is_noop() {
        let boxes = BoxStore::new();
        let mut history = History::new();
        history.reset(&boxes);

        assert!(history.undo(&boxes).is_none());
        assert_eq!(history.undo_stack().len(), 1);
        assert!(history.redo_stack().is_empty());
    }

    #[test]
    fn test_redo_with_empty_stack_is_noop() {
        let boxes = BoxStore::new();
        let mut history = History::new();
        history.reset(&boxes);
        assert!(history.redo(&boxes).is_none());
        assert_eq!(history.undo_stack().len(), 1);
    }

    #[test]
    fn test_undo_redo_are_inverse() {
        let mut boxes = BoxStore::new();
        let mut history = History::new();
        history.reset(&boxes);

        edit(&mut history, &mut boxes, 0);
        let after_first = boxes.clone();
        edit(&mut history, &mut boxes, 20);
        let after_second = boxes.clone();

        boxes = history.undo(&boxes).unwrap();
        assert_eq!(boxes, after_first);

        boxes = history.redo(&boxes).unwrap();
        assert_eq!(boxes, after_second);

        boxes = history.undo(&boxes).unwrap();
        boxes = history.undo(&boxes).unwrap();
        assert!(boxes.is_empty());
        assert!(history.undo(&boxes).is_none());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut boxes = BoxStore::new();
        let mut history = History::new();
        history.reset(&boxes);

        edit(&mut history, &mut boxes, 0);
        boxes = history.undo(&boxes).unwrap();
        assert!(history.can_redo());

        edit(&mut history, &mut boxes, 5);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut boxes = BoxStore::new();
        let mut history = History::new();
        history.reset(&boxes);

        for n in 0..150 {
            edit(&mut history, &mut boxes, n);
        }
        assert_eq!(history.undo_stack().len(), MAX_HISTORY);

        let mut undone = 0;
        while let Some(previous) = history.undo(&boxes) {
            boxes = previous;
            undone += 1;
        }
        // The oldest surviving entry becomes the new floor.
        assert_eq!(undone, MAX_HISTORY - 1);
        assert_eq!(boxes.len(), 150 - (MAX_HISTORY - 1));
    }

    #[test]
    fn test_from_stacks_truncates_front() {
        let stacks: Vec<BoxStore> = (0..120)
            .map(|n| {
                let mut s = BoxStore::new();
                s.add(Rect::new(n, 0, n + 1, 1), 0);
                s
            })
            .collect();
        let history = History::from_stacks(stacks.clone(), Vec::new());
        assert_eq!(history.undo_stack().len(), MAX_HISTORY);
        assert_eq!(history.undo_stack().last(), stacks.last());
    }
}
