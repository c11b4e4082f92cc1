use parking_lot::Mutex;
use tracing::debug;

use super::{observe_candidates, observe_selection, shape_mismatch, Balancer, Mode};
use crate::error::Result;
use crate::items::{Items, WeightedSet};

#[derive(Debug, Clone)]
struct Entry {
    item: String,
    weight: u32,
}

#[derive(Debug)]
struct State {
    entries: Vec<Entry>,
    weights: WeightedSet,
    /// Last visited entry, -1 before the first pick of a cycle.
    index: isize,
    current_weight: i64,
    /// Greatest common divisor of the positive weights, 0 if there are none.
    gcd: u32,
    max: u32,
}

impl Default for State {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            weights: WeightedSet::new(),
            index: -1,
            current_weight: 0,
            gcd: 0,
            max: 0,
        }
    }
}

impl State {
    fn rewind(&mut self) {
        self.index = -1;
        self.current_weight = 0;
    }

    fn fold_weight(&mut self, weight: u32) {
        if weight == 0 {
            return;
        }
        if self.gcd == 0 {
            self.rewind();
            self.gcd = weight;
            self.max = weight;
        } else {
            self.gcd = gcd(self.gcd, weight);
            self.max = self.max.max(weight);
        }
    }

    /// Full rescan of gcd and max. Needed after a removal, since the removed
    /// entry may have carried the maximum or constrained the gcd.
    fn recompute(&mut self) {
        self.gcd = 0;
        self.max = 0;
        for entry in self.entries.iter().filter(|e| e.weight > 0) {
            self.gcd = gcd(self.gcd, entry.weight);
            self.max = self.max.max(entry.weight);
        }
        // with no positive weight left the threshold can never drop to zero
        if self.gcd == 0 {
            self.rewind();
        }
    }

    fn insert(&mut self, item: &str, weight: u32) {
        self.remove(item);
        self.entries.push(Entry {
            item: item.to_string(),
            weight,
        });
        self.weights.insert(item.to_string(), weight);
        self.fold_weight(weight);
    }

    fn remove(&mut self, item: &str) -> bool {
        let Some(position) = self.entries.iter().position(|e| e.item == item) else {
            return false;
        };
        self.entries.remove(position);
        self.weights.remove(item);
        self.recompute();
        true
    }

    fn replace(&mut self, weights: WeightedSet) {
        self.entries = weights
            .iter()
            .map(|(item, weight)| Entry {
                item: item.clone(),
                weight: *weight,
            })
            .collect();
        self.weights = weights;
        self.recompute();
        self.rewind();
    }

    /// One step of the LVS weighted round-robin loop. Returns `None` when no
    /// entry has a positive weight.
    fn next(&mut self) -> Option<&Entry> {
        if self.max == 0 {
            return None;
        }

        let count = self.entries.len() as isize;
        loop {
            self.index = (self.index + 1) % count;
            if self.index == 0 {
                self.current_weight -= i64::from(self.gcd);
                if self.current_weight <= 0 {
                    self.current_weight = i64::from(self.max);
                }
            }

            let position = self.index as usize;
            if i64::from(self.entries[position].weight) >= self.current_weight {
                return self.entries.get(position);
            }
        }
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Classic interleaved weighted round-robin, as used by LVS and nginx.
///
/// Each cycle walks the entries repeatedly while lowering a threshold from
/// the maximum weight down in steps of the weights' gcd; an entry is picked
/// whenever its weight reaches the threshold. Over one cycle every entry is
/// picked `weight / gcd` times. Entries with weight 0 are never picked.
///
/// A pick costs up to one pass over the entries.
///
/// Ref: http://kb.linuxvirtualserver.org/wiki/Weighted_Round-Robin_Scheduling
#[derive(Debug, Default)]
pub struct WeightedRoundRobin {
    state: Mutex<State>,
}

impl WeightedRoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: WeightedSet) -> Self {
        let balancer = Self::new();
        balancer.set_weights(weights);
        balancer
    }

    /// Installs a new weighted set. Entries are visited in key order.
    pub fn set_weights(&self, weights: WeightedSet) {
        let count = weights.len();
        let mut state = self.state.lock();
        state.replace(weights);
        let (gcd, max) = (state.gcd, state.max);
        drop(state);

        debug!(count, gcd, max, "weighted round robin items replaced");
        observe_candidates(Mode::WeightedRoundRobin, count);
    }
}

impl Balancer for WeightedRoundRobin {
    fn add(&self, item: &str, weight: u32) {
        let mut state = self.state.lock();
        state.insert(item, weight);
        let count = state.entries.len();
        drop(state);

        debug!(item, weight, count, "weighted round robin item added");
        observe_candidates(Mode::WeightedRoundRobin, count);
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

        observe_selection(Mode::WeightedRoundRobin, &selected);
        selected
    }

    fn mode(&self) -> Mode {
        Mode::WeightedRoundRobin
    }

    fn remove(&self, item: &str, _all_occurrences: bool) -> bool {
        let mut state = self.state.lock();
        if !state.remove(item) {
            return false;
        }
        let count = state.entries.len();
        drop(state);

        debug!(item, count, "weighted round robin item removed");
        observe_candidates(Mode::WeightedRoundRobin, count);
        true
    }

    fn remove_all(&self) {
        *self.state.lock() = State::default();

        debug!("weighted round robin items cleared");
        observe_candidates(Mode::WeightedRoundRobin, 0);
    }

    fn reset(&self) {
        self.state.lock().rewind();
    }

    fn update(&self, items: Items) -> Result<()> {
        match items {
            Items::Weighted(weights) => {
                self.set_weights(weights);
                Ok(())
            }
            other => Err(shape_mismatch(Mode::WeightedRoundRobin, &other)),
        }
    }
}
