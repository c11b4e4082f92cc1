use parking_lot::Mutex;
use tracing::debug;

use super::{observe_candidates, observe_selection, shape_mismatch, Balancer, Mode};
use crate::error::Result;
use crate::items::{Items, WeightedSet};

#[derive(Debug, Clone)]
struct Entry {
    item: String,
    weight: u32,
    current: i64,
}

impl Entry {
    fn new(item: String, weight: u32) -> Self {
        Self {
            item,
            weight,
            current: 0,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    entries: Vec<Entry>,
    weights: WeightedSet,
}

impl State {
    fn remove(&mut self, item: &str) -> bool {
        let Some(position) = self.entries.iter().position(|e| e.item == item) else {
            return false;
        };
        self.entries.remove(position);
        self.weights.remove(item);
        true
    }

    /// Raises every entry by its weight, picks the highest (first one wins
    /// ties) and lowers the winner by the total weight.
    fn next(&mut self) -> Option<&Entry> {
        let mut total: i64 = 0;
        let mut best: Option<(usize, i64)> = None;

        for (position, entry) in self.entries.iter_mut().enumerate() {
            let weight = i64::from(entry.weight);
            total += weight;
            entry.current += weight;
            if best.map_or(true, |(_, current)| entry.current > current) {
                best = Some((position, entry.current));
            }
        }

        if total == 0 {
            return None;
        }

        let (position, _) = best?;
        let winner = self.entries.get_mut(position)?;
        winner.current -= total;
        Some(&*winner)
    }
}

/// Smooth weighted round-robin (nginx).
///
/// Produces the same proportions as the classic scheduler but spreads heavy
/// items out instead of serving them in runs: weights 5/1/1 give
/// `A A B A C A A` rather than `A A A A A B C`.
///
/// Ref: https://github.com/phusion/nginx/commit/27e94984486058d73157038f7950a0a36ecc6e35
#[derive(Debug, Default)]
pub struct SmoothWeightedRoundRobin {
    state: Mutex<State>,
}

impl SmoothWeightedRoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: WeightedSet) -> Self {
        let balancer = Self::new();
        balancer.set_weights(weights);
        balancer
    }

    /// Installs a new weighted set with every accumulator at zero. Entries are
    /// scanned in key order.
    pub fn set_weights(&self, weights: WeightedSet) {
        let entries: Vec<Entry> = weights
            .iter()
            .map(|(item, weight)| Entry::new(item.clone(), *weight))
            .collect();
        let count = entries.len();

        let mut state = self.state.lock();
        state.entries = entries;
        state.weights = weights;
        drop(state);

        debug!(count, "smooth weighted round robin items replaced");
        observe_candidates(Mode::SmoothWeightedRoundRobin, count);
    }
}

impl Balancer for SmoothWeightedRoundRobin {
    fn add(&self, item: &str, weight: u32) {
        let mut state = self.state.lock();
        state.remove(item);
        state.entries.push(Entry::new(item.to_string(), weight));
        state.weights.insert(item.to_string(), weight);
        let count = state.entries.len();
        drop(state);

        debug!(item, weight, count, "smooth weighted round robin item added");
        observe_candidates(Mode::SmoothWeightedRoundRobin, count);
    }

    fn all(&self) -> Items {
        Items::Weighted(self.state.lock().weights.clone())
    }

    fn select(&self, _key: &[&str]) -> Option<String> {
        let mut state = self.state.lock();
        let selected = match state.entries.len() {
            0 => None,
            1 => state
                .entries
                .first()
                .filter(|only| only.weight > 0)
                .map(|only| only.item.clone()),
            _ => state.next().map(|entry| entry.item.clone()),
        };
        drop(state);

        observe_selection(Mode::SmoothWeightedRoundRobin, &selected);
        selected
    }

    fn mode(&self) -> Mode {
        Mode::SmoothWeightedRoundRobin
    }

    fn remove(&self, item: &str, _all_occurrences: bool) -> bool {
        let mut state = self.state.lock();
        if !state.remove(item) {
            return false;
        }
        let count = state.entries.len();
        drop(state);

        debug!(item, count, "smooth weighted round robin item removed");
        observe_candidates(Mode::SmoothWeightedRoundRobin, count);
        true
    }

    fn remove_all(&self) {
        *self.state.lock() = State::default();

        debug!("smooth weighted round robin items cleared");
        observe_candidates(Mode::SmoothWeightedRoundRobin, 0);
    }

    /// Seeds every accumulator with its own weight rather than zero, so the
    /// first picks after a reset lean towards the heaviest entries.
    fn reset(&self) {
        for entry in self.state.lock().entries.iter_mut() {
            entry.current = i64::from(entry.weight);
        }
    }

    fn update(&self, items: Items) -> Result<()> {
        match items {
            Items::Weighted(weights) => {
                self.set_weights(weights);
                Ok(())
            }
            other => Err(shape_mismatch(Mode::SmoothWeightedRoundRobin, &other)),
        }
    }
}
