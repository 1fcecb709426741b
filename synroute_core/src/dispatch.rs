//! Parallel execution of independent (target, organism) solves.
//!
//! Pairs share nothing but the read-only skeleton; each worker instantiates
//! its own problem clone, so one pair's failure or slow solve never touches
//! its siblings.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::catalog::native::{NativeSet, NativeSource};
use crate::configuration::CONFIGURATION;
use crate::optimize::skeleton::Skeleton;
use crate::optimize::solve::{
    PathwaySolver, SolveError, SolveOptions, SolveRequest, SolveResponse,
};
use crate::optimize::solvers::SolverBackend;

/// One (target, organism) pair to solve
#[derive(Clone, Debug)]
pub struct BatchRequest {
    pub target: String,
    pub organism: String,
    pub native: NativeSet,
}

impl BatchRequest {
    pub fn new(target: impl Into<String>, organism: impl Into<String>, native: NativeSet) -> Self {
        BatchRequest {
            target: target.into(),
            organism: organism.into(),
            native,
        }
    }

    /// Build a pair by resolving the organism through a [`NativeSource`]
    pub fn for_organism(
        target: impl Into<String>,
        organism: impl Into<String>,
        source: &dyn NativeSource,
    ) -> Self {
        let organism = organism.into();
        let native = NativeSet::for_organism(source, &organism);
        BatchRequest {
            target: target.into(),
            organism,
            native,
        }
    }
}

/// Outcome of one pair, keyed back to its origin
#[derive(Debug)]
pub struct BatchResult {
    pub target: String,
    pub organism: String,
    pub result: Result<SolveResponse, SolveError>,
}

/// Worker count from the process-wide configuration
pub fn default_worker_count() -> usize {
    CONFIGURATION.read().unwrap().processes
}

/// Solve every pair concurrently on a dedicated pool of `workers` threads.
///
/// Results come back in request order. A failed pair carries its error in
/// [`BatchResult::result`]; it never cancels the rest of the batch.
pub fn run_batch(
    skeleton: &Skeleton,
    backend: &dyn SolverBackend,
    requests: Vec<BatchRequest>,
    options: &SolveOptions,
    workers: usize,
) -> Vec<BatchResult> {
    info!(pairs = requests.len(), workers, "dispatching solve batch");
    let solve_one = |request: BatchRequest| -> BatchResult {
        let BatchRequest {
            target,
            organism,
            native,
        } = request;
        let solver = PathwaySolver::new(skeleton, backend);
        let solve_request = SolveRequest {
            target: target.clone(),
            native,
            options: options.clone(),
        };
        let result = solver.solve(&solve_request);
        BatchResult {
            target,
            organism,
            result,
        }
    };

    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(|| requests.into_par_iter().map(solve_one).collect()),
        Err(error) => {
            warn!(%error, "thread pool construction failed, running batch sequentially");
            requests.into_iter().map(solve_one).collect()
        }
    }
}
