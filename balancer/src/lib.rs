//! In-process load balancing strategies.
//!
//! Every strategy implements [`Balancer`]: register candidates, then ask for
//! one per request with [`Balancer::select`].
//!
//! | Mode | Items | Selection |
//! |------|-------|-----------|
//! | `WeightedRoundRobin` | weighted | interleaved cycles, `weight / gcd` picks each |
//! | `SmoothWeightedRoundRobin` | weighted | nginx smooth interleaving |
//! | `WeightedRandom` | weighted | random, proportional to weight |
//! | `ConsistentHash` | ordered | sticky per affinity key |
//! | `RoundRobin` | ordered | rotation in insertion order |
//! | `Random` | ordered | uniform random |
//!
//! ```rust,ignore
//! use balancer::{new_balancer, Items, Mode};
//!
//! let balancer = new_balancer(Mode::ConsistentHash, Some(Items::from(vec!["a", "b", "c"])))?;
//! let backend = balancer.select(&["10.0.0.7"]);
//! ```
//!
//! [`default`] exposes one process-wide instance for callers that do not want
//! to carry a handle around.

pub mod config;
pub mod default;
pub mod error;
pub mod hash;
pub mod items;
pub mod metrics_consts;
pub mod strategy;

pub use error::{Error, Result};
pub use items::{Family, Items, WeightedSet, DEFAULT_WEIGHT};
pub use strategy::{
    empty_balancer, new_balancer, Balancer, ConsistentHash, Mode, Random, RoundRobin,
    SmoothWeightedRoundRobin, WeightedRandom, WeightedRoundRobin,
};
