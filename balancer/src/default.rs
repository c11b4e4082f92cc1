//! Process-wide default balancer.
//!
//! The instance is built on first use with the mode from [`Config`] and is
//! never torn down. Every function here forwards to it.

use std::sync::Arc;

use envconfig::Envconfig;
use once_cell::sync::Lazy;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::items::Items;
use crate::strategy::{empty_balancer, Balancer, Mode};

static DEFAULT: Lazy<Arc<dyn Balancer>> = Lazy::new(|| {
    let mode = match Config::init_from_env() {
        Ok(config) => config.default_mode,
        Err(e) => {
            warn!("invalid balancer config, using {}: {e}", Mode::default());
            Mode::default()
        }
    };
    info!(mode = mode.as_str(), "creating default balancer");
    Arc::from(empty_balancer(mode))
});

/// Shared handle to the default instance.
pub fn instance() -> Arc<dyn Balancer> {
    Arc::clone(&DEFAULT)
}

pub fn add(item: &str, weight: u32) {
    DEFAULT.add(item, weight);
}

pub fn add_one(item: &str) {
    DEFAULT.add_one(item);
}

pub fn all() -> Items {
    DEFAULT.all()
}

pub fn select(key: &[&str]) -> Option<String> {
    DEFAULT.select(key)
}

pub fn mode() -> Mode {
    DEFAULT.mode()
}

pub fn name() -> &'static str {
    DEFAULT.name()
}

pub fn remove(item: &str, all_occurrences: bool) -> bool {
    DEFAULT.remove(item, all_occurrences)
}

pub fn remove_all() {
    DEFAULT.remove_all();
}

pub fn reset() {
    DEFAULT.reset();
}

pub fn update(items: Items) -> Result<()> {
    DEFAULT.update(items)
}
