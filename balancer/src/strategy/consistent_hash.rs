use parking_lot::RwLock;
use tracing::debug;

use super::{
    observe_candidates, observe_selection, remove_from_list, shape_mismatch, Balancer, Mode,
};
use crate::error::Result;
use crate::hash::{hash_key, DoubleJumpHash};
use crate::items::Items;

#[derive(Debug, Default)]
struct State {
    /// Registered items in insertion order, duplicates included.
    items: Vec<String>,
    /// Each distinct item once.
    table: DoubleJumpHash<String>,
}

/// Routes each affinity key to the same candidate for as long as that
/// candidate stays registered.
///
/// Keys are hashed with 64-bit FNV-1a and placed with a double jump hash, so
/// adding a candidate only moves the keys it takes over and removing one only
/// moves the keys it owned.
#[derive(Debug, Default)]
pub struct ConsistentHash {
    state: RwLock<State>,
}

impl ConsistentHash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<String>) -> Self {
        let balancer = Self::new();
        balancer.set_items(items);
        balancer
    }

    /// Replaces every candidate and rebuilds the hash table from scratch.
    pub fn set_items(&self, items: Vec<String>) {
        let mut table = DoubleJumpHash::new();
        for item in &items {
            table.add(item.clone());
        }
        let count = items.len();

        let mut state = self.state.write();
        state.items = items;
        state.table = table;
        drop(state);

        debug!(count, "consistent hash items replaced");
        observe_candidates(Mode::ConsistentHash, count);
    }

    /// Each registered candidate once, in table order.
    pub fn distinct_items(&self) -> Vec<String> {
        self.state.read().table.all()
    }

    /// A uniformly random candidate, for requests that carry no affinity key
    /// and should not all pile onto the empty-key owner. Duplicates do not
    /// raise a candidate's odds.
    pub fn select_any(&self) -> Option<String> {
        let selected = self.state.read().table.random().cloned();
        observe_selection(Mode::ConsistentHash, &selected);
        selected
    }

    /// Compacts the holes left behind by removals. Keys owned by surviving
    /// candidates may move, so run this only after heavy churn.
    pub fn shrink(&self) {
        let mut state = self.state.write();
        let holes = state.table.loose_len() - state.table.len();
        state.table.shrink();
        drop(state);

        debug!(holes, "consistent hash table shrunk");
    }
}

impl Balancer for ConsistentHash {
    fn add(&self, item: &str, _weight: u32) {
        let mut state = self.state.write();
        state.items.push(item.to_string());
        state.table.add(item.to_string());
        let count = state.items.len();
        drop(state);

        debug!(item, count, "consistent hash item added");
        observe_candidates(Mode::ConsistentHash, count);
    }

    fn all(&self) -> Items {
        Items::Ordered(self.state.read().items.clone())
    }

    fn select(&self, key: &[&str]) -> Option<String> {
        let state = self.state.read();
        let selected = match state.items.len() {
            0 => None,
            1 => state.items.first().cloned(),
            _ => state.table.get(hash_key(key)).cloned(),
        };
        drop(state);

        observe_selection(Mode::ConsistentHash, &selected);
        selected
    }

    fn mode(&self) -> Mode {
        Mode::ConsistentHash
    }

    fn remove(&self, item: &str, all_occurrences: bool) -> bool {
        let mut state = self.state.write();
        let removed = remove_from_list(&mut state.items, item, all_occurrences);
        if removed == 0 {
            return false;
        }
        // a duplicate that is still listed keeps its slot
        if !state.items.iter().any(|i| i == item) {
            state.table.remove(&item.to_string());
        }
        let count = state.items.len();
        drop(state);

        debug!(item, removed, count, "consistent hash item removed");
        observe_candidates(Mode::ConsistentHash, count);
        true
    }

    fn remove_all(&self) {
        *self.state.write() = State::default();

        debug!("consistent hash items cleared");
        observe_candidates(Mode::ConsistentHash, 0);
    }

    fn reset(&self) {}

    fn update(&self, items: Items) -> Result<()> {
        match items {
            Items::Ordered(items) => {
                self.set_items(items);
                Ok(())
            }
            other => Err(shape_mismatch(Mode::ConsistentHash, &other)),
        }
    }
}
