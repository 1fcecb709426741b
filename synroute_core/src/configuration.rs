use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Process-wide defaults for pathway solves
pub struct Configuration {
    /// Maximum number of non-native reactions allowed in a pathway
    pub reaction_limit: usize,
    /// Wall-clock budget for a single target solve, in seconds
    pub solver_time_limit: u64,
    /// How many cyclic candidates may be cut away before a solve is
    /// reported as exhausted
    pub cycle_retry_limit: usize,
    /// Whether solves enumerate equal-cost alternatives by default
    pub multiple_solutions: bool,
    /// Whether cyclic candidates are cut and re-solved (true) or fail the
    /// solve outright (false)
    pub eliminate_cycles: bool,
    /// Worker threads used by the batch dispatcher
    pub processes: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            reaction_limit: 10,
            solver_time_limit: 30,
            cycle_retry_limit: 50,
            multiple_solutions: true,
            eliminate_cycles: true,
            processes: 4,
        }
    }
}
