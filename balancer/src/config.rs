use envconfig::Envconfig;

use crate::strategy::Mode;

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    /// Strategy of the process-wide default instance. Accepts the mode name
    /// in any case, or its snake_case form.
    #[envconfig(from = "BALANCER_DEFAULT_MODE", default = "WeightedRoundRobin")]
    pub default_mode: Mode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_to_weighted_round_robin() {
        let config = Config::init_from_hashmap(&HashMap::new()).unwrap();
        assert_eq!(config.default_mode, Mode::WeightedRoundRobin);
    }

    #[test]
    fn reads_snake_case_mode() {
        let env = HashMap::from([(
            "BALANCER_DEFAULT_MODE".to_string(),
            "consistent_hash".to_string(),
        )]);
        let config = Config::init_from_hashmap(&env).unwrap();
        assert_eq!(config.default_mode, Mode::ConsistentHash);
    }

    #[test]
    fn rejects_unknown_mode() {
        let env = HashMap::from([(
            "BALANCER_DEFAULT_MODE".to_string(),
            "least_connections".to_string(),
        )]);
        assert!(Config::init_from_hashmap(&env).is_err());
    }
}
