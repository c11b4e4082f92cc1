/// Counter of `select` calls, labelled by `strategy` and `outcome` (`hit` | `empty`).
pub const SELECTIONS_COUNTER: &str = "balancer_selections_total";

/// Gauge of registered candidates, labelled by `strategy`. Set after every mutation.
pub const CANDIDATES_GAUGE: &str = "balancer_candidates";
