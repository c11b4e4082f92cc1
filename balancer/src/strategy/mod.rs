mod consistent_hash;
mod random;
mod round_robin;
mod smooth_weighted_round_robin;
mod weighted_random;
mod weighted_round_robin;

pub use consistent_hash::ConsistentHash;
pub use random::Random;
pub use round_robin::RoundRobin;
pub use smooth_weighted_round_robin::SmoothWeightedRoundRobin;
pub use weighted_random::WeightedRandom;
pub use weighted_round_robin::WeightedRoundRobin;

use metrics::{counter, gauge};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::warn;

use crate::error::{Error, Result};
use crate::items::{Family, Items, DEFAULT_WEIGHT};
use crate::metrics_consts::{CANDIDATES_GAUGE, SELECTIONS_COUNTER};

/// Selection policy shared by every strategy.
///
/// All operations are synchronous and take `&self`; each implementation guards
/// its own state with a lock, so a single instance can be shared across
/// threads behind an `Arc`.
pub trait Balancer: Send + Sync {
    /// Registers `item`. Weighted strategies replace the weight of an existing
    /// item and move it to the end of their rotation; list strategies append,
    /// keeping duplicates, and ignore `weight`.
    fn add(&self, item: &str, weight: u32);

    /// `add` with `DEFAULT_WEIGHT`.
    fn add_one(&self, item: &str) {
        self.add(item, DEFAULT_WEIGHT);
    }

    /// Snapshot of the registered candidates.
    fn all(&self) -> Items;

    /// Picks the next candidate, or `None` if nothing is selectable.
    ///
    /// `key` fragments are concatenated into the affinity key. Only the
    /// consistent hash strategy looks at them.
    fn select(&self, key: &[&str]) -> Option<String>;

    fn mode(&self) -> Mode;

    fn name(&self) -> &'static str {
        self.mode().as_str()
    }

    /// Removes `item`, returning whether anything was removed. With
    /// `all_occurrences` list strategies drop every duplicate instead of only
    /// the first one.
    fn remove(&self, item: &str, all_occurrences: bool) -> bool;

    fn remove_all(&self);

    /// Rewinds scheduling state (cursors, accumulators). Membership and
    /// weights are kept.
    fn reset(&self);

    /// Atomically replaces every candidate. Fails without touching the
    /// current set if `items` is not of the strategy's family.
    fn update(&self, items: Items) -> Result<()>;
}

/// Available selection strategies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Mode {
    #[default]
    #[strum(to_string = "WeightedRoundRobin", serialize = "weighted_round_robin")]
    WeightedRoundRobin,
    #[strum(
        to_string = "SmoothWeightedRoundRobin",
        serialize = "smooth_weighted_round_robin"
    )]
    SmoothWeightedRoundRobin,
    #[strum(to_string = "WeightedRandom", serialize = "weighted_random")]
    WeightedRandom,
    #[strum(to_string = "ConsistentHash", serialize = "consistent_hash")]
    ConsistentHash,
    #[strum(to_string = "RoundRobin", serialize = "round_robin")]
    RoundRobin,
    #[strum(to_string = "Random", serialize = "random")]
    Random,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Shape of the candidate set this mode works with.
    pub fn family(self) -> Family {
        match self {
            Mode::WeightedRoundRobin | Mode::SmoothWeightedRoundRobin | Mode::WeightedRandom => {
                Family::Weighted
            }
            Mode::ConsistentHash | Mode::RoundRobin | Mode::Random => Family::Ordered,
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        s.trim()
            .parse()
            .map_err(|_| Error::UnknownMode(s.to_string()))
    }
}

/// Builds an empty balancer for `mode`.
pub fn empty_balancer(mode: Mode) -> Box<dyn Balancer> {
    match mode {
        Mode::WeightedRoundRobin => Box::new(WeightedRoundRobin::new()),
        Mode::SmoothWeightedRoundRobin => Box::new(SmoothWeightedRoundRobin::new()),
        Mode::WeightedRandom => Box::new(WeightedRandom::new()),
        Mode::ConsistentHash => Box::new(ConsistentHash::new()),
        Mode::RoundRobin => Box::new(RoundRobin::new()),
        Mode::Random => Box::new(Random::new()),
    }
}

/// Builds a balancer for `mode`, seeded with `items` when given.
pub fn new_balancer(mode: Mode, items: Option<Items>) -> Result<Box<dyn Balancer>> {
    let balancer = empty_balancer(mode);
    if let Some(items) = items {
        balancer.update(items)?;
    }

    Ok(balancer)
}

pub(crate) fn shape_mismatch(mode: Mode, items: &Items) -> Error {
    let err = Error::shape_mismatch(mode, items.family());
    warn!(strategy = mode.as_str(), "rejected update: {err}");
    err
}

/// Removes the first occurrence of `item`, or every occurrence when `all` is
/// set. Returns how many entries were dropped.
pub(crate) fn remove_from_list(items: &mut Vec<String>, item: &str, all: bool) -> usize {
    if all {
        let before = items.len();
        items.retain(|i| i != item);
        before - items.len()
    } else {
        match items.iter().position(|i| i == item) {
            Some(index) => {
                items.remove(index);
                1
            }
            None => 0,
        }
    }
}

pub(crate) fn observe_selection(mode: Mode, selected: &Option<String>) {
    let outcome = if selected.is_some() { "hit" } else { "empty" };
    counter!(SELECTIONS_COUNTER, "strategy" => mode.as_str(), "outcome" => outcome).increment(1);
}

pub(crate) fn observe_candidates(mode: Mode, count: usize) {
    gauge!(CANDIDATES_GAUGE, "strategy" => mode.as_str()).set(count as f64);
}
