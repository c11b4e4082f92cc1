use anyhow::Context;
use balancer::{Family, Items, Mode};
use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    /// Strategy name, either `ConsistentHash` or `consistent_hash` style
    #[envconfig(default = "WeightedRoundRobin")]
    pub mode: String,

    /// Candidates as `name[:weight]`, comma separated. Ordered modes drop the
    /// weights.
    #[envconfig(default = "A:5,B:1,C:4,D:0")]
    pub items: String,

    #[envconfig(default = "1000")]
    pub selections: usize,

    /// Affinity key for every selection. When empty each selection uses its
    /// own `client-{n}` key.
    #[envconfig(default = "")]
    pub routing_key: String,
}

impl Config {
    pub fn mode(&self) -> anyhow::Result<Mode> {
        Ok(Mode::parse(&self.mode)?)
    }

    pub fn items(&self, mode: Mode) -> anyhow::Result<Items> {
        match mode.family() {
            Family::Ordered => Ok(Items::parse_ordered(&self.items)),
            Family::Weighted => Items::parse_weighted(&self.items)
                .with_context(|| format!("malformed weighted items: {}", self.items)),
        }
    }
}
