use parking_lot::RwLock;
use rand::Rng;
use tracing::debug;

use super::{observe_candidates, observe_selection, shape_mismatch, Balancer, Mode};
use crate::error::Result;
use crate::items::{Items, WeightedSet};

/// Sampling table over the positive-weight candidates.
#[derive(Debug, Default)]
struct State {
    /// Positive-weight items, lightest first.
    items: Vec<String>,
    /// `prefix[i]` is the sum of the weights of `items[..=i]`.
    prefix: Vec<u64>,
    /// Every registered candidate, zero weights included.
    weights: WeightedSet,
}

impl State {
    fn rebuild(&mut self) {
        let mut positive: Vec<(&String, u32)> = self
            .weights
            .iter()
            .filter(|(_, weight)| **weight > 0)
            .map(|(item, weight)| (item, *weight))
            .collect();
        // stable sort, so equal weights stay in key order
        positive.sort_by_key(|(_, weight)| *weight);

        let mut total: u64 = 0;
        self.prefix = positive
            .iter()
            .map(|(_, weight)| {
                total += u64::from(*weight);
                total
            })
            .collect();
        self.items = positive.into_iter().map(|(item, _)| item.clone()).collect();
    }

    fn pick(&self) -> Option<&String> {
        match self.items.len() {
            0 => None,
            1 => self.items.first(),
            _ => {
                let max = *self.prefix.last()?;
                let target = rand::thread_rng().gen_range(1..=max);
                let position = self.prefix.partition_point(|&sum| sum < target);
                self.items.get(position)
            }
        }
    }
}

/// Picks candidates at random with probability proportional to their weight.
///
/// Zero-weight candidates stay registered (and visible in `all`) but are left
/// out of the sampling table. Every mutation rebuilds the table, which costs
/// a sort; selection is a binary search under a shared lock.
#[derive(Debug, Default)]
pub struct WeightedRandom {
    state: RwLock<State>,
}

impl WeightedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: WeightedSet) -> Self {
        let balancer = Self::new();
        balancer.set_weights(weights);
        balancer
    }

    pub fn set_weights(&self, weights: WeightedSet) {
        let count = weights.len();
        let mut state = self.state.write();
        state.weights = weights;
        state.rebuild();
        let sampled = state.items.len();
        drop(state);

        debug!(count, sampled, "weighted random items replaced");
        observe_candidates(Mode::WeightedRandom, count);
    }
}

impl Balancer for WeightedRandom {
    fn add(&self, item: &str, weight: u32) {
        let mut state = self.state.write();
        state.weights.insert(item.to_string(), weight);
        state.rebuild();
        let count = state.weights.len();
        drop(state);

        debug!(item, weight, count, "weighted random item added");
        observe_candidates(Mode::WeightedRandom, count);
    }

    fn all(&self) -> Items {
        Items::Weighted(self.state.read().weights.clone())
    }

    fn select(&self, _key: &[&str]) -> Option<String> {
        let selected = self.state.read().pick().cloned();
        observe_selection(Mode::WeightedRandom, &selected);
        selected
    }

    fn mode(&self) -> Mode {
        Mode::WeightedRandom
    }

    fn remove(&self, item: &str, _all_occurrences: bool) -> bool {
        let mut state = self.state.write();
        if state.weights.remove(item).is_none() {
            return false;
        }
        state.rebuild();
        let count = state.weights.len();
        drop(state);

        debug!(item, count, "weighted random item removed");
        observe_candidates(Mode::WeightedRandom, count);
        true
    }

    fn remove_all(&self) {
        *self.state.write() = State::default();

        debug!("weighted random items cleared");
        observe_candidates(Mode::WeightedRandom, 0);
    }

    fn reset(&self) {}

    fn update(&self, items: Items) -> Result<()> {
        match items {
            Items::Weighted(weights) => {
                self.set_weights(weights);
                Ok(())
            }
            other => Err(shape_mismatch(Mode::WeightedRandom, &other)),
        }
    }
}
