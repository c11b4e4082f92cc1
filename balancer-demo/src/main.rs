use std::collections::BTreeMap;

use balancer::new_balancer;
use envconfig::Envconfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

/// Runs the configured number of selections and counts the picks per
/// candidate. Empty selections are counted under `<none>`.
fn run(config: &Config) -> anyhow::Result<BTreeMap<String, usize>> {
    let mode = config.mode()?;
    let balancer = new_balancer(mode, Some(config.items(mode)?))?;

    tracing::info!("Mode: {}", balancer.name());
    tracing::info!("Candidates: {:?}", balancer.all());

    let mut distribution = BTreeMap::new();
    for n in 0..config.selections {
        let selected = if config.routing_key.is_empty() {
            let key = format!("client-{n}");
            balancer.select(&[key.as_str()])
        } else {
            balancer.select(&[config.routing_key.as_str()])
        };
        let item = selected.unwrap_or_else(|| "<none>".to_string());
        *distribution.entry(item).or_default() += 1;
    }

    Ok(distribution)
}

fn main() -> anyhow::Result<()> {
    let config = Config::init_from_env()?;

    let log_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(log_layer)
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    tracing::info!("Starting balancer demo");
    tracing::info!("Selections: {}", config.selections);

    let distribution = run(&config)?;
    for (item, count) in &distribution {
        let share = *count as f64 * 100.0 / config.selections.max(1) as f64;
        tracing::info!(item = item.as_str(), count, "{share:.1}%");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: &str, items: &str, selections: usize, routing_key: &str) -> Config {
        Config {
            mode: mode.to_string(),
            items: items.to_string(),
            selections,
            routing_key: routing_key.to_string(),
        }
    }

    #[test]
    fn weighted_round_robin_distribution() {
        let distribution =
            run(&config("WeightedRoundRobin", "A:5,B:1,C:4,D:0", 1000, "")).unwrap();
        assert_eq!(distribution.get("A"), Some(&500));
        assert_eq!(distribution.get("B"), Some(&100));
        assert_eq!(distribution.get("C"), Some(&400));
        assert_eq!(distribution.get("D"), None);
    }

    #[test]
    fn fixed_routing_key_sticks_to_one_candidate() {
        let distribution =
            run(&config("ConsistentHash", "A,B,C,D", 200, "192.168.1.7")).unwrap();
        assert_eq!(distribution.len(), 1);
        assert_eq!(distribution.get("C"), Some(&200));
    }

    #[test]
    fn empty_candidates_are_counted() {
        let distribution = run(&config("Random", "", 10, "")).unwrap();
        assert_eq!(distribution.get("<none>"), Some(&10));
    }

    #[test]
    fn unknown_mode_fails() {
        assert!(run(&config("Fastest", "A", 1, "")).is_err());
    }
}
