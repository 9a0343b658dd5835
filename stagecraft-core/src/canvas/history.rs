use std::collections::VecDeque;

/// Linear snapshot history. Pushing a new entry clears the redo stack.
#[derive(Debug, Clone)]
pub struct History<T> {
    undo_stack: VecDeque<T>,
    redo_stack: VecDeque<T>,
    max_depth: usize,
}

impl<T> History<T> {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record the state as it was before a user mutation.
    pub fn push(&mut self, before: T) {
        if self.undo_stack.len() >= self.max_depth {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(before);
        self.redo_stack.clear();
    }

    /// Swap `current` for the previous state. Returns the restored state.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.undo_stack.pop_back()?;
        self.redo_stack.push_back(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.redo_stack.pop_back()?;
        if self.undo_stack.len() >= self.max_depth {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undo_redo_walks_linearly() {
        let mut h = History::new(10);
        h.push(1);
        h.push(2);
        assert_eq!(h.undo(3), Some(2));
        assert_eq!(h.undo(2), Some(1));
        assert!(!h.can_undo());
        assert_eq!(h.redo(1), Some(2));
        assert_eq!(h.redo(2), Some(3));
        assert!(!h.can_redo());
    }

    #[test]
    fn push_clears_redo() {
        let mut h = History::new(10);
        h.push(1);
        h.undo(2);
        assert!(h.can_redo());
        h.push(1);
        assert!(!h.can_redo());
    }

    #[test]
    fn depth_is_bounded() {
        let mut h = History::new(2);
        h.push(1);
        h.push(2);
        h.push(3);
        assert_eq!(h.undo(4), Some(3));
        assert_eq!(h.undo(3), Some(2));
        assert_eq!(h.undo(2), None);
    }
}
