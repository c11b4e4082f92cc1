use parking_lot::RwLock;
use rand::seq::SliceRandom;
use tracing::debug;

use super::{
    observe_candidates, observe_selection, remove_from_list, shape_mismatch, Balancer, Mode,
};
use crate::error::Result;
use crate::items::Items;

/// Picks a uniformly random candidate on every call. Weights are ignored.
#[derive(Debug, Default)]
pub struct Random {
    items: RwLock<Vec<String>>,
}

impl Random {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<String>) -> Self {
        let balancer = Self::new();
        balancer.set_items(items);
        balancer
    }

    pub fn set_items(&self, items: Vec<String>) {
        let count = items.len();
        *self.items.write() = items;

        debug!(count, "random items replaced");
        observe_candidates(Mode::Random, count);
    }
}

impl Balancer for Random {
    fn add(&self, item: &str, _weight: u32) {
        let mut items = self.items.write();
        items.push(item.to_string());
        let count = items.len();
        drop(items);

        debug!(item, count, "random item added");
        observe_candidates(Mode::Random, count);
    }

    fn all(&self) -> Items {
        Items::Ordered(self.items.read().clone())
    }

    fn select(&self, _key: &[&str]) -> Option<String> {
        let items = self.items.read();
        let selected = match items.len() {
            0 => None,
            1 => items.first().cloned(),
            _ => items.choose(&mut rand::thread_rng()).cloned(),
        };
        drop(items);

        observe_selection(Mode::Random, &selected);
        selected
    }

    fn mode(&self) -> Mode {
        Mode::Random
    }

    fn remove(&self, item: &str, all_occurrences: bool) -> bool {
        let mut items = self.items.write();
        let removed = remove_from_list(&mut items, item, all_occurrences);
        let count = items.len();
        drop(items);

        if removed == 0 {
            return false;
        }
        debug!(item, removed, count, "random item removed");
        observe_candidates(Mode::Random, count);
        true
    }

    fn remove_all(&self) {
        self.items.write().clear();

        debug!("random items cleared");
        observe_candidates(Mode::Random, 0);
    }

    fn reset(&self) {}

    fn update(&self, items: Items) -> Result<()> {
        match items {
            Items::Ordered(items) => {
                self.set_items(items);
                Ok(())
            }
            other => Err(shape_mismatch(Mode::Random, &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_and_single() {
        let balancer = Random::new();
        assert_eq!(balancer.select(&[]), None);

        balancer.add("A", 0);
        for _ in 0..10 {
            assert_eq!(balancer.select(&[]).as_deref(), Some("A"));
        }
    }

    #[test]
    fn selections_are_roughly_uniform() {
        let balancer = Random::with_items(names(&["A", "B", "C", "D"]));
        let mut counts: HashMap<String, u32> = HashMap::new();
        for _ in 0..8_000 {
            *counts.entry(balancer.select(&[]).unwrap()).or_default() += 1;
        }

        assert_eq!(counts.len(), 4);
        for (item, count) in counts {
            assert!(
                (1_600..=2_400).contains(&count),
                "{item} selected {count} times, expected ~2000"
            );
        }
    }

    #[test]
    fn remove_first_or_all_occurrences() {
        let balancer = Random::with_items(names(&["A", "B", "A", "C"]));
        assert!(balancer.remove("A", false));
        assert_eq!(balancer.all(), Items::from(vec!["B", "A", "C"]));
        assert!(balancer.remove("A", true));
        assert_eq!(balancer.all(), Items::from(vec!["B", "C"]));
        assert!(!balancer.remove("Z", false));

        for _ in 0..100 {
            assert_ne!(balancer.select(&[]).as_deref(), Some("A"));
        }
    }

    #[test]
    fn update_replaces_items() {
        let balancer = Random::with_items(names(&["A"]));
        balancer.update(Items::from(vec!["X", "Y"])).unwrap();
        assert_eq!(balancer.all(), Items::from(vec!["X", "Y"]));
        assert!(balancer.update(Items::from([("X", 1)])).is_err());

        balancer.remove_all();
        assert_eq!(balancer.select(&[]), None);
    }
}
