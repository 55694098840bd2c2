//! Undo/redo stacks of whole layouts.

use std::collections::VecDeque;

use crate::config::Config;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Prior layouts for undo and undone layouts for redo.
///
/// `past` is capped at `limit` entries with the oldest dropped first; a limit of zero keeps
/// everything.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    past: VecDeque<Config>,
    future: Vec<Config>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            limit,
        }
    }

    /// Records the layout being replaced. Any redo entries are dropped.
    pub fn push(&mut self, previous: Config) {
        self.future.clear();
        self.push_past(previous);
    }

    fn push_past(&mut self, previous: Config) {
        self.past.push_back(previous);
        self.trim();
    }

    fn trim(&mut self) {
        if self.limit == 0 {
            return;
        }
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
    }

    /// Steps back, handing out the layout to restore. `current` moves onto the redo stack.
    pub fn undo(&mut self, current: &Config) -> Option<Config> {
        let previous = self.past.pop_back()?;
        self.future.push(current.clone());
        Some(previous)
    }

    pub fn redo(&mut self, current: &Config) -> Option<Config> {
        let next = self.future.pop()?;
        self.push_past(current.clone());
        Some(next)
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.trim();
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.past.len()
    }

    pub fn is_empty(&self) -> bool {
        self.past.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past(&self) -> impl Iterator<Item = &Config> {
        self.past.iter()
    }
}
