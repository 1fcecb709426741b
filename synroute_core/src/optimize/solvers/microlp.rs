//! Implements a solver interface for microlp

use std::time::Duration;

use indexmap::IndexMap;
use microlp::{ComparisonOp, LinearExpr, OptimizationDirection};

use crate::optimize::problem::{Constraint, ObjectiveSense, Problem, VariableType};
use crate::optimize::solvers::{SolverBackend, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Backend based on the pure-Rust microlp branch-and-bound solver.
///
/// microlp has no in-solve interruption hook, so the call blocks until the
/// solver returns; a budget that is already spent is reported as
/// [`OptimizationStatus::SolverHalted`] without invoking the solver.
#[derive(Clone, Copy, Debug, Default)]
pub struct MicrolpSolver;

impl MicrolpSolver {
    pub fn new() -> Self {
        MicrolpSolver
    }

    /// Translate the problem's row store into a fresh microlp problem
    fn translate(problem: &Problem) -> (microlp::Problem, Vec<microlp::Variable>) {
        let direction = match problem.objective_sense() {
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
        };
        let mut lp = microlp::Problem::new(direction);
        let coefficients = problem.objective_coefficients();

        let variables: Vec<microlp::Variable> = problem
            .variables()
            .map(|var| {
                let objective = coefficients.get(&var.index).copied().unwrap_or(0.0);
                match var.variable_type {
                    VariableType::Binary => lp.add_integer_var(
                        objective,
                        (var.lower_bound.round() as i32, var.upper_bound.round() as i32),
                    ),
                    VariableType::Continuous => {
                        lp.add_var(objective, (var.lower_bound, var.upper_bound))
                    }
                }
            })
            .collect();

        for (_, constraint) in problem.constraints() {
            match constraint {
                Constraint::Equality { terms, equals } => {
                    let mut expr = LinearExpr::empty();
                    for term in terms {
                        expr.add(variables[term.variable], term.coefficient);
                    }
                    lp.add_constraint(expr, ComparisonOp::Eq, *equals);
                }
                Constraint::Inequality {
                    terms,
                    lower_bound,
                    upper_bound,
                } => {
                    if let Some(ub) = upper_bound {
                        let mut expr = LinearExpr::empty();
                        for term in terms {
                            expr.add(variables[term.variable], term.coefficient);
                        }
                        lp.add_constraint(expr, ComparisonOp::Le, *ub);
                    }
                    if let Some(lb) = lower_bound {
                        let mut expr = LinearExpr::empty();
                        for term in terms {
                            expr.add(variables[term.variable], term.coefficient);
                        }
                        lp.add_constraint(expr, ComparisonOp::Ge, *lb);
                    }
                }
            }
        }

        (lp, variables)
    }
}

impl SolverBackend for MicrolpSolver {
    fn solve(
        &self,
        problem: &Problem,
        time_limit: Duration,
    ) -> Result<ProblemSolution, SolverError> {
        if time_limit.is_zero() {
            return Ok(ProblemSolution::without_assignment(
                OptimizationStatus::SolverHalted,
            ));
        }

        let (lp, variables) = Self::translate(problem);
        match lp.solve() {
            Ok(solution) => {
                let mut values: IndexMap<String, f64> = IndexMap::new();
                for (var, lp_var) in problem.variables().zip(variables.iter()) {
                    values.insert(var.id.clone(), solution[*lp_var]);
                }
                Ok(ProblemSolution {
                    status: OptimizationStatus::Optimal,
                    objective_value: Some(solution.objective()),
                    variable_values: Some(values),
                })
            }
            Err(microlp::Error::Infeasible) => Ok(ProblemSolution::without_assignment(
                OptimizationStatus::Infeasible,
            )),
            Err(microlp::Error::Unbounded) => Err(SolverError::Unbounded),
            Err(other) => Err(SolverError::Backend(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimizes_a_small_binary_problem() {
        // min y1 + y2 subject to x = 1 and x <= y1 + y2
        let mut problem = Problem::new_minimization();
        let x = problem
            .add_new_variable("x", VariableType::Continuous, 1.0, 1.0)
            .unwrap();
        let y1 = problem
            .add_new_variable("y1", VariableType::Binary, 0.0, 1.0)
            .unwrap();
        let y2 = problem
            .add_new_variable("y2", VariableType::Binary, 0.0, 1.0)
            .unwrap();
        problem
            .add_new_inequality_constraint("support", &[(x, 1.0), (y1, -1.0), (y2, -1.0)], None, Some(0.0))
            .unwrap();
        problem.add_new_linear_objective_term(y1, 1.0).unwrap();
        problem.add_new_linear_objective_term(y2, 1.0).unwrap();

        let solution = MicrolpSolver::new()
            .solve(&problem, Duration::from_secs(5))
            .unwrap();
        assert_eq!(solution.status, OptimizationStatus::Optimal);
        let objective = solution.objective_value.unwrap();
        assert!((objective - 1.0).abs() < 1e-6, "objective was {objective}");
    }

    #[test]
    fn reports_infeasible_models() {
        // x fixed to 1 but constrained <= 0
        let mut problem = Problem::new_minimization();
        let x = problem
            .add_new_variable("x", VariableType::Continuous, 1.0, 1.0)
            .unwrap();
        problem
            .add_new_inequality_constraint("cap", &[(x, 1.0)], None, Some(0.0))
            .unwrap();

        let solution = MicrolpSolver::new()
            .solve(&problem, Duration::from_secs(5))
            .unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);
        assert!(solution.variable_values.is_none());
    }

    #[test]
    fn spent_budget_halts_without_solving() {
        let problem = Problem::new_minimization();
        let solution = MicrolpSolver::new()
            .solve(&problem, Duration::ZERO)
            .unwrap();
        assert_eq!(solution.status, OptimizationStatus::SolverHalted);
    }
}
