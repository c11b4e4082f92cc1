use parking_lot::Mutex;
use tracing::debug;

use super::{
    observe_candidates, observe_selection, remove_from_list, shape_mismatch, Balancer, Mode,
};
use crate::error::Result;
use crate::items::Items;

#[derive(Debug, Default)]
struct State {
    items: Vec<String>,
    // always < items.len() when items has two or more entries
    cursor: usize,
}

impl State {
    fn clamp_cursor(&mut self) {
        if self.cursor >= self.items.len() {
            self.cursor = 0;
        }
    }
}

/// Hands out candidates in insertion order, wrapping around at the end.
///
/// Weights are ignored and duplicates are kept, so an item listed twice is
/// picked twice per cycle.
#[derive(Debug, Default)]
pub struct RoundRobin {
    state: Mutex<State>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<String>) -> Self {
        let balancer = Self::new();
        balancer.set_items(items);
        balancer
    }

    /// Replaces the list and restarts the rotation from the first entry.
    pub fn set_items(&self, items: Vec<String>) {
        let mut state = self.state.lock();
        state.items = items;
        state.cursor = 0;
        let count = state.items.len();
        drop(state);

        debug!(count, "round robin items replaced");
        observe_candidates(Mode::RoundRobin, count);
    }
}

impl Balancer for RoundRobin {
    fn add(&self, item: &str, _weight: u32) {
        let mut state = self.state.lock();
        state.items.push(item.to_string());
        let count = state.items.len();
        drop(state);

        debug!(item, count, "round robin item added");
        observe_candidates(Mode::RoundRobin, count);
    }

    fn all(&self) -> Items {
        Items::Ordered(self.state.lock().items.clone())
    }

    fn select(&self, _key: &[&str]) -> Option<String> {
        let mut state = self.state.lock();
        let selected = match state.items.len() {
            0 => None,
            1 => state.items.first().cloned(),
            count => {
                let item = state.items.get(state.cursor).cloned();
                state.cursor = (state.cursor + 1) % count;
                item
            }
        };
        drop(state);

        observe_selection(Mode::RoundRobin, &selected);
        selected
    }

    fn mode(&self) -> Mode {
        Mode::RoundRobin
    }

    fn remove(&self, item: &str, all_occurrences: bool) -> bool {
        let mut state = self.state.lock();
        let removed = remove_from_list(&mut state.items, item, all_occurrences);
        if removed == 0 {
            return false;
        }
        state.clamp_cursor();
        let count = state.items.len();
        drop(state);

        debug!(item, removed, count, "round robin item removed");
        observe_candidates(Mode::RoundRobin, count);
        true
    }

    fn remove_all(&self) {
        let mut state = self.state.lock();
        state.items.clear();
        state.cursor = 0;
        drop(state);

        debug!("round robin items cleared");
        observe_candidates(Mode::RoundRobin, 0);
    }

    fn reset(&self) {
        self.state.lock().cursor = 0;
    }

    fn update(&self, items: Items) -> Result<()> {
        match items {
            Items::Ordered(items) => {
                self.set_items(items);
                Ok(())
            }
            other => Err(shape_mismatch(Mode::RoundRobin, &other)),
        }
    }
}
