//! Pluggable optimization backends.
//!
//! The engine only needs binary variables, linear constraints, a linear
//! objective, and a wall-clock cutoff; anything providing those can be
//! swapped in behind [`SolverBackend`].

pub mod microlp;

use std::time::Duration;

use thiserror::Error;

use crate::optimize::problem::Problem;
use crate::optimize::ProblemSolution;

/// A blocking MILP solver invocation.
///
/// Cut generation happens at the [`Problem`] layer: the caller appends rows
/// between invocations and hands the grown problem back in, so backends may
/// keep or rebuild internal state as they see fit.
pub trait SolverBackend: Send + Sync {
    /// Solve the problem, spending at most `time_limit` of wall-clock time.
    ///
    /// Infeasibility and running out of time are reported through
    /// [`ProblemSolution::status`]; an `Err` means the backend itself failed.
    fn solve(&self, problem: &Problem, time_limit: Duration)
        -> Result<ProblemSolution, SolverError>;
}

/// Errors raised by a solver backend
#[derive(Error, Debug, Clone)]
pub enum SolverError {
    /// The objective is unbounded, which means the model itself is malformed
    #[error("objective is unbounded")]
    Unbounded,
    /// Any other backend-reported failure
    #[error("solver backend failed: {0}")]
    Backend(String),
}
