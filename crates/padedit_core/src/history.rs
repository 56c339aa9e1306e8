//! Bounded undo/redo history over whole-document snapshots.

use crate::constants::DEFAULT_HISTORY_LIMIT;

/// Serialized document state captured before a logical edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub text: String,
    pub current_overlay: Option<usize>,
    /// Label of the edit this snapshot precedes, e.g. `Nudge`.
    pub description: String,
}

/// Two-stack snapshot history.
///
/// The history stack is capped; on overflow the oldest entry is dropped. The
/// future stack is only ever cleared by a new push.
#[derive(Debug)]
pub struct HistoryManager {
    history: Vec<HistorySnapshot>,
    future: Vec<HistorySnapshot>,
    limit: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryManager {
    /// Create a history keeping at most `limit` undo entries (at least one).
    pub fn new(limit: usize) -> Self {
        Self {
            history: Vec::new(),
            future: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Record the state before an edit and forget anything undone.
    pub fn push(&mut self, snapshot: HistorySnapshot) {
        self.future.clear();
        self.history.push(snapshot);
        self.trim_history();
    }

    fn trim_history(&mut self) {
        while self.history.len() > self.limit {
            self.history.remove(0);
        }
    }

    /// Step back one edit.
    ///
    /// `current` is parked on the future stack under the label of the undone
    /// edit.
    ///
    /// # Returns
    /// The snapshot to restore, or `None` when there is nothing to undo.
    pub fn undo(&mut self, current: HistorySnapshot) -> Option<HistorySnapshot> {
        let previous = self.history.pop()?;
        self.future.push(HistorySnapshot {
            description: previous.description.clone(),
            ..current
        });
        Some(previous)
    }

    /// Step forward one undone edit.
    ///
    /// # Returns
    /// The snapshot to restore, or `None` when there is nothing to redo.
    pub fn redo(&mut self, current: HistorySnapshot) -> Option<HistorySnapshot> {
        let next = self.future.pop()?;
        self.history.push(HistorySnapshot {
            description: next.description.clone(),
            ..current
        });
        self.trim_history();
        Some(next)
    }

    /// Snapshot the next undo would restore.
    pub fn peek_undo(&self) -> Option<&HistorySnapshot> {
        self.history.last()
    }

    pub fn peek_redo(&self) -> Option<&HistorySnapshot> {
        self.future.last()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Label of the edit the next undo reverts.
    pub fn undo_description(&self) -> Option<&str> {
        self.history.last().map(|s| s.description.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.future.last().map(|s| s.description.as_str())
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.future.clear();
    }

    pub fn undo_len(&self) -> usize {
        self.history.len()
    }

    pub fn redo_len(&self) -> usize {
        self.future.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(text: &str) -> HistorySnapshot {
        HistorySnapshot {
            text: text.to_string(),
            current_overlay: Some(0),
            description: format!("edit {}", text),
        }
    }

    #[test]
    fn undo_then_redo_walks_both_stacks() {
        let mut history = HistoryManager::default();
        history.push(snap("a"));
        history.push(snap("b"));
        assert_eq!(history.peek_undo().map(|s| s.text.as_str()), Some("b"));
        assert!(history.peek_redo().is_none());

        let restored = history.undo(snap("c")).expect("undo");
        assert_eq!(history.peek_redo().map(|s| s.text.as_str()), Some("c"));
        assert_eq!(restored.text, "b");
        assert_eq!(history.redo_description(), Some("edit b"));
        assert!(history.can_redo());

        let restored = history.redo(snap("b")).expect("redo");
        assert_eq!(restored.text, "c");
        assert_eq!(history.undo_len(), 2);
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn push_after_undo_clears_future() {
        let mut history = HistoryManager::default();
        history.push(snap("a"));
        history.undo(snap("b")).expect("undo");
        assert!(history.can_redo());

        history.push(snap("a2"));
        assert!(!history.can_redo());
        assert!(history.redo(snap("x")).is_none());
    }

    #[test]
    fn empty_stacks_are_no_ops() {
        let mut history = HistoryManager::new(3);
        assert!(history.undo(snap("a")).is_none());
        assert!(history.redo(snap("a")).is_none());
        assert_eq!((history.undo_len(), history.redo_len()), (0, 0));
        assert_eq!(history.undo_description(), None);
    }

    #[test]
    fn sixty_pushes_keep_latest_fifty_in_order() {
        let mut history = HistoryManager::default();
        for index in 0..60 {
            history.push(snap(&index.to_string()));
        }
        assert_eq!(history.undo_len(), 50);

        let mut seen = Vec::new();
        while let Some(snapshot) = history.undo(snap("now")) {
            seen.push(snapshot.text);
        }
        let expected: Vec<String> = (10..60).rev().map(|i| i.to_string()).collect();
        assert_eq!(seen, expected);
        assert_eq!(history.redo_len(), 50);
    }

    #[test]
    fn eviction_never_touches_future() {
        let mut history = HistoryManager::new(2);
        history.push(snap("a"));
        history.push(snap("b"));
        history.undo(snap("c")).expect("undo b");
        history.undo(snap("b")).expect("undo a");
        assert_eq!(history.redo_len(), 2);

        history.redo(snap("a")).expect("redo");
        history.redo(snap("b")).expect("redo");
        assert_eq!(history.undo_len(), 2);
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn clear_and_minimum_limit() {
        let mut history = HistoryManager::new(0);
        assert_eq!(history.limit(), 1);
        history.push(snap("a"));
        history.push(snap("b"));
        assert_eq!(history.undo_len(), 1);
        history.clear();
        assert!(!history.can_undo());
    }
}
