// History - Bounded linear undo/redo over whole-document snapshots

use std::collections::VecDeque;
use std::sync::Arc;

/// Default maximum number of snapshots to keep in history
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Linear snapshot history with a cursor naming the current entry
///
/// Every commit stores a complete copy of the document. Entries are held
/// behind `Arc` so readers can keep a snapshot alive after the history has
/// moved on, and undo/redo never copy anything.
///
/// When a new snapshot is committed:
/// 1. Everything after the cursor is discarded (abandoned redo branch)
/// 2. The snapshot is appended and becomes the tail
/// 3. The oldest entries are dropped until the length fits the limit
/// 4. The cursor moves to the tail
///
/// # Memory Management
/// The limit bounds the number of retained snapshots. There is always at
/// least one entry, so `current()` never fails.
#[derive(Debug, Clone, PartialEq)]
pub struct History<T> {
    /// Snapshots, oldest at the front
    entries: VecDeque<Arc<T>>,

    /// Index of the current snapshot in `entries`
    cursor: usize,

    /// Maximum number of snapshots to keep
    max_history: usize,
}

impl<T: Clone> History<T> {
    /// Create a history seeded with `initial` and the default limit
    pub fn new(initial: T) -> Self {
        Self::with_capacity(initial, DEFAULT_MAX_HISTORY)
    }

    /// Create a history with a custom limit (a limit of 0 behaves as 1)
    pub fn with_capacity(initial: T, max_history: usize) -> Self {
        let max_history = max_history.max(1);
        let mut entries = VecDeque::with_capacity(max_history);
        entries.push_back(Arc::new(initial));

        Self {
            entries,
            cursor: 0,
            max_history,
        }
    }

    /// Apply `mutator` to a copy of the current snapshot and commit the result
    ///
    /// Returns the committed snapshot, which is now current.
    pub fn commit<F>(&mut self, mutator: F) -> Arc<T>
    where
        F: FnOnce(&mut T),
    {
        let mut next = T::clone(&self.entries[self.cursor]);
        mutator(&mut next);
        self.push(next)
    }

    /// Commit an already built snapshot
    pub fn push(&mut self, next: T) -> Arc<T> {
        // Drop the redo branch (we're on a new timeline now)
        self.entries.truncate(self.cursor + 1);

        let next = Arc::new(next);
        self.entries.push_back(Arc::clone(&next));

        // Trim history if needed
        while self.entries.len() > self.max_history {
            self.entries.pop_front();
        }

        self.cursor = self.entries.len() - 1;
        next
    }

    /// Step back one snapshot; `None` at the oldest entry
    pub fn undo(&mut self) -> Option<Arc<T>> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.current())
    }

    /// Step forward one snapshot; `None` at the newest entry
    pub fn redo(&mut self) -> Option<Arc<T>> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.current())
    }

    /// Replace the current snapshot in place, without adding a history step
    ///
    /// Entries after the cursor are kept.
    pub fn replace_current<F>(&mut self, mutator: F) -> Arc<T>
    where
        F: FnOnce(&mut T),
    {
        let mut next = T::clone(&self.entries[self.cursor]);
        mutator(&mut next);
        let next = Arc::new(next);
        self.entries[self.cursor] = Arc::clone(&next);
        next
    }

    /// Rewrite every entry matching `needs` in place, undo and redo entries included
    ///
    /// Only matching entries are copied. Returns how many were rewritten.
    pub fn patch_where<P, F>(&mut self, needs: P, mut mutator: F) -> usize
    where
        P: Fn(&T) -> bool,
        F: FnMut(&mut T),
    {
        let mut patched = 0;
        for entry in self.entries.iter_mut() {
            if needs(&**entry) {
                mutator(Arc::make_mut(entry));
                patched += 1;
            }
        }
        patched
    }

    /// Discard all entries and start over from `snapshot`
    pub fn reset(&mut self, snapshot: T) {
        self.entries.clear();
        self.entries.push_back(Arc::new(snapshot));
        self.cursor = 0;
    }

    /// The current snapshot
    pub fn current(&self) -> Arc<T> {
        Arc::clone(&self.entries[self.cursor])
    }

    /// Borrow the current snapshot without touching the reference count
    pub fn current_ref(&self) -> &T {
        &self.entries[self.cursor]
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index).map(|e| e.as_ref())
    }

    /// Snapshots from oldest to newest
    pub fn entries(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| e.as_ref())
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// A history always holds at least one snapshot
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn capacity(&self) -> usize {
        self.max_history
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Number of steps that can be undone
    pub fn undo_count(&self) -> usize {
        self.cursor
    }

    /// Number of steps that can be redone
    pub fn redo_count(&self) -> usize {
        self.entries.len() - 1 - self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Doc {
        value: i32,
    }

    fn set(value: i32) -> impl FnOnce(&mut Doc) {
        move |doc: &mut Doc| doc.value = value
    }

    fn values(history: &History<Doc>) -> Vec<i32> {
        history.entries().map(|d| d.value).collect()
    }

    #[test]
    fn test_commit() {
        let mut history = History::new(Doc { value: 0 });

        let committed = history.commit(set(42));

        assert_eq!(committed.value, 42);
        assert_eq!(history.len(), 2);
        assert_eq!(history.cursor(), 1);
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo() {
        let mut history = History::new(Doc { value: 0 });
        history.commit(set(42));

        let doc = history.undo().unwrap();
        assert_eq!(doc.value, 0);
        assert_eq!(history.undo_count(), 0);
        assert_eq!(history.redo_count(), 1);
    }

    #[test]
    fn test_redo() {
        let mut history = History::new(Doc { value: 0 });
        history.commit(set(42));
        history.undo();

        let doc = history.redo().unwrap();
        assert_eq!(doc.value, 42);
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.redo_count(), 0);
    }

    #[test]
    fn test_redo_branch_discarded_on_new_commit() {
        let mut history = History::new(Doc { value: 1 });
        history.commit(set(2));
        history.commit(set(3));

        history.undo();
        history.commit(set(4));

        assert_eq!(values(&history), vec![1, 2, 4]);
        assert_eq!(history.cursor(), 2);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_commit_from_interior_cursor() {
        let mut history = History::new(Doc { value: 0 });
        for i in 1..=5 {
            history.commit(set(i));
        }
        history.undo();
        history.undo();
        history.undo();

        history.commit(set(99));
        assert_eq!(values(&history), vec![0, 1, 2, 99]);
    }

    #[test]
    fn test_history_limit() {
        let mut history = History::with_capacity(Doc { value: 0 }, 3);

        for i in 1..=5 {
            history.commit(set(i));
        }

        // Should only keep the last 3
        assert_eq!(values(&history), vec![3, 4, 5]);
        assert_eq!(history.cursor(), 2);
        assert_eq!(history.current().value, 5);
    }

    #[test]
    fn test_zero_capacity_keeps_current() {
        let mut history = History::with_capacity(Doc { value: 0 }, 0);
        history.commit(set(1));
        assert_eq!(history.capacity(), 1);
        assert_eq!(values(&history), vec![1]);
        assert!(history.undo().is_none());
    }

    #[test]
    fn test_undo_at_floor_is_noop() {
        let mut history = History::new(Doc { value: 7 });
        assert!(history.undo().is_none());
        assert_eq!(history.cursor(), 0);
        assert_eq!(history.current().value, 7);
    }

    #[test]
    fn test_redo_at_ceiling_is_noop() {
        let mut history = History::new(Doc { value: 0 });
        history.commit(set(1));
        assert!(history.redo().is_none());
        assert_eq!(history.cursor(), 1);
    }

    #[test]
    fn test_replace_current_keeps_redo_branch() {
        let mut history = History::new(Doc { value: 0 });
        history.commit(set(1));
        history.commit(set(2));
        history.undo();

        history.replace_current(set(10));

        assert_eq!(values(&history), vec![0, 10, 2]);
        assert_eq!(history.cursor(), 1);
        assert!(history.can_redo());
    }

    #[test]
    fn test_snapshots_are_not_aliased() {
        let mut history = History::new(Doc { value: 0 });
        let before = history.current();
        history.commit(set(1));
        history.replace_current(set(2));

        assert_eq!(before.value, 0);
        assert_eq!(history.get(0).unwrap().value, 0);
    }

    #[test]
    fn test_reset() {
        let mut history = History::new(Doc { value: 0 });
        history.commit(set(1));
        history.reset(Doc { value: 5 });

        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), 0);
        assert_eq!(history.current().value, 5);
        assert!(!history.is_empty());
    }

    #[test]
    fn test_patch_where_rewrites_matching_entries() {
        let mut history = History::new(Doc { value: 0 });
        history.commit(set(1));
        history.commit(set(1));
        history.commit(set(2));
        history.undo();
        let untouched = history.get(0).cloned();

        let patched = history.patch_where(|d| d.value == 1, |d| d.value = 7);

        assert_eq!(patched, 2);
        let values: Vec<i32> = history.entries().map(|d| d.value).collect();
        assert_eq!(values, vec![0, 7, 7, 2]);
        assert_eq!(history.get(0).cloned(), untouched);
        assert_eq!(history.cursor(), 2);
    }
}
