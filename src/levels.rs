//! Level maintenance for the task forest
//!
//! Levels are grown lazily when an operation targets a depth that does not exist
//! yet, and trailing levels are pruned once they run empty.

use crate::models::{Forest, Level, LevelId};

impl Forest {
    /// Ensures levels `0..=index` all exist, appending empty levels as needed.
    /// Returns `index` for convenience.
    pub fn ensure_level(&mut self, index: usize) -> usize {
        while self.level_count() <= index {
            let id = self.next_level_id();
            tracing::debug!("Growing forest with level {} (id {})", self.level_count(), id);
            self.levels_mut().push(Level::new(id));
        }
        index
    }

    /// Appends one empty trailing level, returning its index
    pub fn add_level(&mut self) -> usize {
        let index = self.level_count();
        self.ensure_level(index)
    }

    /// Removes trailing empty levels, never level 0. Returns how many were removed.
    ///
    /// An interior level can only be empty when every deeper level is empty too,
    /// since each task below it needs a parent on it, so pruning from the tail
    /// removes every empty level there is to remove.
    pub fn prune_empty_levels(&mut self) -> usize {
        let mut removed = 0;
        let levels = self.levels_mut();
        while levels.len() > 1 && levels.last().is_some_and(Level::is_empty) {
            levels.pop();
            removed += 1;
        }
        if removed > 0 {
            tracing::debug!("Pruned {} empty level(s)", removed);
        }
        removed
    }

    fn next_level_id(&self) -> LevelId {
        self.levels()
            .iter()
            .map(Level::id)
            .max()
            .map_or(1, |max| max + 1)
    }
}
