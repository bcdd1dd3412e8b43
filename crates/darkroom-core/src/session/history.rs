//! Bounded undo/redo stack of project snapshots.

use std::collections::VecDeque;

use crate::project::ProjectSnapshot;

/// Undo/redo over immutable [`ProjectSnapshot`]s.
///
/// `record` pushes the state *before* a change. When the undo stack is full
/// the oldest entry is evicted. Any new record clears the redo stack.
#[derive(Debug)]
pub struct History {
    undo: VecDeque<ProjectSnapshot>,
    redo: Vec<ProjectSnapshot>,
    depth: usize,
}

impl History {
    pub fn new(depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            depth: depth.max(1),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Remember `before` as the state to return to on undo.
    pub fn record(&mut self, before: ProjectSnapshot) {
        if self.undo.len() == self.depth {
            self.undo.pop_front();
        }
        self.undo.push_back(before);
        self.redo.clear();
    }

    /// Step back. `current` becomes redoable; returns the state to restore.
    pub fn undo(&mut self, current: ProjectSnapshot) -> Option<ProjectSnapshot> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: ProjectSnapshot) -> Option<ProjectSnapshot> {
        let next = self.redo.pop()?;
        if self.undo.len() == self.depth {
            self.undo.pop_front();
        }
        self.undo.push_back(current);
        Some(next)
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure::Exposure;

    fn state(n: usize) -> ProjectSnapshot {
        ProjectSnapshot {
            exposures: (0..n).map(|_| Exposure::with_time_and_grade(1.0, 5)).collect(),
            ..ProjectSnapshot::default()
        }
    }

    #[test]
    fn test_undo_redo_walk() {
        let mut history = History::new(10);
        history.record(state(0));
        history.record(state(1));
        let s2 = state(2);

        let back = history.undo(s2.clone()).unwrap();
        assert_eq!(back.exposures.len(), 1);
        let back = history.undo(back).unwrap();
        assert_eq!(back.exposures.len(), 0);
        assert!(history.undo(back.clone()).is_none());

        let fwd = history.redo(back).unwrap();
        assert_eq!(fwd.exposures.len(), 1);
        let fwd = history.redo(fwd).unwrap();
        assert_eq!(fwd, s2);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_oldest_evicted_first() {
        let mut history = History::new(3);
        for n in 0..5 {
            history.record(state(n));
        }
        assert_eq!(history.undo_len(), 3);
        let mut current = state(5);
        let mut seen = Vec::new();
        while let Some(prev) = history.undo(current.clone()) {
            seen.push(prev.exposures.len());
            current = prev;
        }
        assert_eq!(seen, vec![4, 3, 2]);
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new(4);
        history.record(state(0));
        let _ = history.undo(state(1));
        assert!(history.can_redo());
        history.record(state(7));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_zero_depth_is_raised_to_one() {
        let mut history = History::new(0);
        history.record(state(0));
        history.record(state(1));
        assert_eq!(history.depth(), 1);
        assert_eq!(history.undo_len(), 1);
    }
}
