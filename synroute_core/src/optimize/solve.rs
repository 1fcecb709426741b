//! Per-target solves on top of a shared skeleton: native fixing, budget and
//! objective rows, iterative cycle elimination, and equal-cost alternative
//! enumeration via no-good cuts.

use std::time::{Duration, Instant};

use derive_builder::Builder;
use indexmap::{IndexMap, IndexSet};
use thiserror::Error;
use tracing::debug;

use crate::catalog::native::NativeSet;
use crate::catalog::reaction::ReactionKind;
use crate::configuration::CONFIGURATION;
use crate::optimize::pathway::{order_causally, ChosenUse, Pathway};
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::skeleton::Skeleton;
use crate::optimize::solvers::{SolverBackend, SolverError};
use crate::optimize::OptimizationStatus;

/// Weight applied to uses of the preferred reaction kind; close enough to 1
/// that it only ever breaks ties between equal-cardinality sets
const PREFERRED_KIND_WEIGHT: f64 = 0.999;

/// Tunable knobs for a target solve, defaulting from [`CONFIGURATION`]
#[derive(Builder, Clone, Debug)]
pub struct SolveOptions {
    /// Maximum number of non-native reactions in a pathway
    #[builder(default = "CONFIGURATION.read().unwrap().reaction_limit")]
    pub reaction_limit: usize,
    /// Wall-clock budget for the whole solve, cuts included
    #[builder(default = "Duration::from_secs(CONFIGURATION.read().unwrap().solver_time_limit)")]
    pub time_limit: Duration,
    /// Whether to enumerate equal-cost alternatives after the first pathway
    #[builder(default = "CONFIGURATION.read().unwrap().multiple_solutions")]
    pub multiple_solutions: bool,
    /// Cap on the total number of returned pathways; `None` collects every
    /// equal-cost alternative the budget allows
    #[builder(default = "None")]
    pub pathway_limit: Option<usize>,
    /// Whether cyclic candidates are cut and re-solved; when false the
    /// first cyclic candidate fails the solve
    #[builder(default = "CONFIGURATION.read().unwrap().eliminate_cycles")]
    pub eliminate_cycles: bool,
    /// How many cyclic candidates may be cut before giving up
    #[builder(default = "CONFIGURATION.read().unwrap().cycle_retry_limit")]
    pub cycle_retry_limit: usize,
    /// Optional tie-break preference for one reaction kind
    #[builder(default = "None")]
    pub prefer_kind: Option<ReactionKind>,
    /// Reactions the solve must not use, regardless of cost
    #[builder(default = "IndexSet::new()")]
    pub excluded_reactions: IndexSet<String>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        let configuration = CONFIGURATION.read().unwrap();
        SolveOptions {
            reaction_limit: configuration.reaction_limit,
            time_limit: Duration::from_secs(configuration.solver_time_limit),
            multiple_solutions: configuration.multiple_solutions,
            pathway_limit: None,
            eliminate_cycles: configuration.eliminate_cycles,
            cycle_retry_limit: configuration.cycle_retry_limit,
            prefer_kind: None,
            excluded_reactions: IndexSet::new(),
        }
    }
}

/// A single target-compound query against a skeleton
#[derive(Builder, Clone, Debug)]
pub struct SolveRequest {
    /// Compound to produce
    #[builder(setter(into))]
    pub target: String,
    /// What the organism already has
    #[builder(default = "NativeSet::default()")]
    pub native: NativeSet,
    /// Solve knobs
    #[builder(default = "SolveOptions::default()")]
    pub options: SolveOptions,
}

/// How a solve concluded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveStatus {
    /// The first returned pathway is proven minimal
    Optimal,
    /// The wall-clock budget ran out; whatever was accepted so far is
    /// returned (possibly nothing)
    Degraded,
    /// The target is already native, nothing needs to be added
    TargetNative,
    /// No pathway exists under the reaction-count ceiling
    NoPathway,
}

/// Result of a successful solve invocation.
///
/// The first pathway is the canonical optimum; any further entries are
/// equal-cardinality alternatives in discovery order.
#[derive(Clone, Debug)]
pub struct SolveResponse {
    pub status: SolveStatus,
    pub pathways: Vec<Pathway>,
}

/// Failures that end a solve without a usable response
#[derive(Error, Debug)]
pub enum SolveError {
    /// The requested target compound never entered the skeleton
    #[error("target compound {0} is not part of the skeleton")]
    UnknownTarget(String),
    /// Every candidate within the retry ceiling was cyclic
    #[error("gave up after cutting {attempts} cyclic candidates")]
    CycleRetriesExhausted { attempts: usize },
    /// The optimization backend itself failed
    #[error(transparent)]
    Solver(#[from] SolverError),
    /// Target-specific rows could not be added to the problem
    #[error(transparent)]
    Problem(#[from] ProblemError),
}

/// Solves target queries against a shared, read-only skeleton
pub struct PathwaySolver<'a> {
    skeleton: &'a Skeleton,
    backend: &'a dyn SolverBackend,
}

impl<'a> PathwaySolver<'a> {
    pub fn new(skeleton: &'a Skeleton, backend: &'a dyn SolverBackend) -> Self {
        PathwaySolver { skeleton, backend }
    }

    /// Find a minimum-cardinality pathway to the requested target, and
    /// equal-cost alternatives when asked for.
    pub fn solve(&self, request: &SolveRequest) -> Result<SolveResponse, SolveError> {
        let options = &request.options;
        if !self.skeleton.contains_compound(&request.target) {
            return Err(SolveError::UnknownTarget(request.target.clone()));
        }
        if request.native.compounds.contains(&request.target) {
            return Ok(SolveResponse {
                status: SolveStatus::TargetNative,
                pathways: vec![Pathway::default()],
            });
        }

        let mut problem = self.instantiate(request)?;
        let deadline = Instant::now() + options.time_limit;
        let retry_ceiling = if options.eliminate_cycles {
            options.cycle_retry_limit
        } else {
            0
        };
        let mut accepted: Vec<Pathway> = Vec::new();
        let mut cut_serial = 0usize;
        let mut cycle_attempts = 0usize;

        let status = loop {
            if let Some(limit) = options.pathway_limit {
                if accepted.len() >= limit {
                    break SolveStatus::Optimal;
                }
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break SolveStatus::Degraded;
            }

            let solution = self.backend.solve(&problem, remaining)?;
            match solution.status {
                OptimizationStatus::Infeasible => {
                    break if accepted.is_empty() {
                        SolveStatus::NoPathway
                    } else {
                        SolveStatus::Optimal
                    };
                }
                OptimizationStatus::SolverHalted => break SolveStatus::Degraded,
                OptimizationStatus::Optimal => {}
            }
            let values = solution.variable_values.as_ref().ok_or_else(|| {
                SolverError::Backend("optimal solution carried no assignment".to_string())
            })?;
            let chosen = self.chosen_uses(values, &request.native);

            match order_causally(&chosen, &request.native.compounds) {
                Some(pathway) => {
                    let size = pathway.len();
                    debug!(target_compound = %request.target, size, "accepted pathway");
                    if accepted.is_empty() && options.multiple_solutions && size > 0 {
                        // Alternatives must match the optimal cardinality
                        problem.update_inequality_bounds(
                            "reaction_budget",
                            None,
                            Some(size as f64),
                        )?;
                    }
                    let cut_terms: Vec<(usize, f64)> = chosen
                        .iter()
                        .filter(|chosen_use| !chosen_use.native)
                        .map(|chosen_use| (chosen_use.index, 1.0))
                        .collect();
                    accepted.push(pathway);
                    if !options.multiple_solutions || size == 0 {
                        // A zero-cost optimum has no meaningful no-good cut
                        break SolveStatus::Optimal;
                    }
                    cut_serial += 1;
                    problem.add_new_inequality_constraint(
                        &format!("cut_{cut_serial}"),
                        &cut_terms,
                        None,
                        Some(size as f64 - 1.0),
                    )?;
                }
                None => {
                    cycle_attempts += 1;
                    if cycle_attempts > retry_ceiling {
                        if accepted.is_empty() {
                            return Err(SolveError::CycleRetriesExhausted {
                                attempts: cycle_attempts - 1,
                            });
                        }
                        break SolveStatus::Optimal;
                    }
                    debug!(
                        target_compound = %request.target,
                        attempt = cycle_attempts,
                        "cutting cyclic candidate"
                    );
                    // Cut every chosen use, native included; a free native
                    // cycle would otherwise come back identically forever
                    let cut_terms: Vec<(usize, f64)> = chosen
                        .iter()
                        .map(|chosen_use| (chosen_use.index, 1.0))
                        .collect();
                    cut_serial += 1;
                    problem.add_new_inequality_constraint(
                        &format!("cut_{cut_serial}"),
                        &cut_terms,
                        None,
                        Some(cut_terms.len() as f64 - 1.0),
                    )?;
                }
            }
        };

        Ok(SolveResponse {
            status,
            pathways: accepted,
        })
    }

    /// Clone the base problem and layer the target-specific state on top:
    /// native fixing, the target row, the reaction budget, exclusions, and
    /// the objective.
    fn instantiate(&self, request: &SolveRequest) -> Result<Problem, ProblemError> {
        let options = &request.options;
        let mut problem = self.skeleton.base_problem().clone();

        for compound_id in &request.native.compounds {
            let Some(compound) = self.skeleton.compound(compound_id) else {
                // Organisms routinely carry compounds outside the catalog
                continue;
            };
            problem.update_variable_bounds(&compound.variable, 1.0, 1.0)?;
            problem.update_inequality_bounds(&compound.support_row, None, Some(1.0))?;
        }

        // contains_compound was checked by the caller
        if let Some(target) = self.skeleton.compound(&request.target) {
            problem.update_variable_bounds(&target.variable, 1.0, 1.0)?;
        }

        let mut budget_terms: Vec<(usize, f64)> = Vec::new();
        let mut excluded_terms: Vec<(usize, f64)> = Vec::new();
        for (reaction_id, reaction) in self.skeleton.reactions() {
            let excluded = options.excluded_reactions.contains(reaction_id);
            let native = request.native.reactions.contains(reaction_id);
            for directed_use in &reaction.uses {
                if excluded {
                    excluded_terms.push((directed_use.index, 1.0));
                }
                if native {
                    // Native reactions are free structural facts: no budget
                    // share, no objective weight
                    continue;
                }
                budget_terms.push((directed_use.index, 1.0));
                let weight = match options.prefer_kind {
                    Some(kind) if kind == reaction.kind => PREFERRED_KIND_WEIGHT,
                    _ => 1.0,
                };
                problem.add_new_linear_objective_term(directed_use.index, weight)?;
            }
        }
        if !budget_terms.is_empty() {
            problem.add_new_inequality_constraint(
                "reaction_budget",
                &budget_terms,
                None,
                Some(options.reaction_limit as f64),
            )?;
        }
        if !excluded_terms.is_empty() {
            problem.add_new_inequality_constraint(
                "excluded_reactions",
                &excluded_terms,
                None,
                Some(0.0),
            )?;
        }

        Ok(problem)
    }

    /// Resolve the backend's assignment into the directed uses it switched on
    fn chosen_uses(&self, values: &IndexMap<String, f64>, native: &NativeSet) -> Vec<ChosenUse> {
        let mut chosen = Vec::new();
        for (reaction_id, reaction) in self.skeleton.reactions() {
            let native_reaction = native.reactions.contains(reaction_id);
            for directed_use in &reaction.uses {
                if values
                    .get(&directed_use.variable)
                    .copied()
                    .unwrap_or(0.0)
                    > 0.5
                {
                    chosen.push(ChosenUse {
                        reaction: reaction_id.clone(),
                        direction: directed_use.direction,
                        index: directed_use.index,
                        reactants: directed_use.reactants.clone(),
                        products: directed_use.products.clone(),
                        native: native_reaction,
                    });
                }
            }
        }
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::compound::CompoundBuilder;
    use crate::catalog::reaction::{Direction, ReactionBuilder, ReactionFilter};
    use crate::catalog::Catalog;
    use crate::optimize::skeleton::SkeletonBuilder;
    use crate::optimize::solvers::microlp::MicrolpSolver;
    use indexmap::IndexMap;

    fn add_reaction(catalog: &mut Catalog, id: &str, reactant: &str, product: &str) {
        catalog.add_reaction(
            ReactionBuilder::default()
                .id(id)
                .reactants(IndexMap::from([(reactant.to_string(), 1.0)]))
                .products(IndexMap::from([(product.to_string(), 1.0)]))
                .build()
                .unwrap(),
        );
    }

    fn linear_catalog() -> Catalog {
        let mut catalog = Catalog::new("linear");
        for id in ["A", "B", "C"] {
            catalog.add_compound(CompoundBuilder::default().id(id).build().unwrap());
        }
        add_reaction(&mut catalog, "R1", "A", "B");
        add_reaction(&mut catalog, "R2", "B", "C");
        catalog
    }

    fn cyclic_catalog() -> Catalog {
        let mut catalog = linear_catalog();
        add_reaction(&mut catalog, "R3", "C", "A");
        catalog
    }

    fn solve(
        catalog: &Catalog,
        target: &str,
        native: NativeSet,
        options: SolveOptions,
    ) -> Result<SolveResponse, SolveError> {
        let skeleton = SkeletonBuilder::new(ReactionFilter::All)
            .build(catalog)
            .unwrap();
        let backend = MicrolpSolver::new();
        let solver = PathwaySolver::new(&skeleton, &backend);
        let request = SolveRequestBuilder::default()
            .target(target)
            .native(native)
            .options(options)
            .build()
            .unwrap();
        solver.solve(&request)
    }

    #[test]
    fn finds_the_two_step_chain() {
        let response = solve(
            &linear_catalog(),
            "C",
            NativeSet::from_compounds(["A".to_string()]),
            SolveOptions::default(),
        )
        .unwrap();

        assert_eq!(response.status, SolveStatus::Optimal);
        assert_eq!(response.pathways.len(), 1);
        let pathway = &response.pathways[0];
        assert_eq!(pathway.reaction_ids(), vec!["R1", "R2"]);
        assert!(pathway
            .steps
            .iter()
            .all(|step| step.direction == Direction::Forward));
    }

    #[test]
    fn a_cycle_in_the_catalog_changes_nothing() {
        let response = solve(
            &cyclic_catalog(),
            "C",
            NativeSet::from_compounds(["A".to_string()]),
            SolveOptions::default(),
        )
        .unwrap();

        assert_eq!(response.status, SolveStatus::Optimal);
        assert_eq!(response.pathways.len(), 1);
        assert_eq!(response.pathways[0].reaction_ids(), vec!["R1", "R2"]);
    }

    #[test]
    fn unreachable_target_reports_no_pathway() {
        // Nothing is native; with the R3: C->A feedback in place the backend
        // can only offer the mutual-support cycle, which must be cut and the
        // remaining model proven infeasible
        let response = solve(
            &cyclic_catalog(),
            "C",
            NativeSet::default(),
            SolveOptions::default(),
        )
        .unwrap();

        assert_eq!(response.status, SolveStatus::NoPathway);
        assert!(response.pathways.is_empty());
    }

    #[test]
    fn native_target_short_circuits() {
        let response = solve(
            &linear_catalog(),
            "C",
            NativeSet::from_compounds(["A".to_string(), "C".to_string()]),
            SolveOptions::default(),
        )
        .unwrap();

        assert_eq!(response.status, SolveStatus::TargetNative);
        assert_eq!(response.pathways.len(), 1);
        assert!(response.pathways[0].is_empty());
    }

    #[test]
    fn zero_reaction_limit_means_no_pathway() {
        let options = SolveOptionsBuilder::default()
            .reaction_limit(0usize)
            .build()
            .unwrap();
        let response = solve(
            &linear_catalog(),
            "C",
            NativeSet::from_compounds(["A".to_string()]),
            options,
        )
        .unwrap();

        assert_eq!(response.status, SolveStatus::NoPathway);
    }

    #[test]
    fn native_reactions_are_free_facts() {
        let response = solve(
            &linear_catalog(),
            "C",
            NativeSet::new(
                ["A".to_string()],
                ["R1".to_string(), "R2".to_string()],
            ),
            SolveOptions::default(),
        )
        .unwrap();

        assert_eq!(response.status, SolveStatus::Optimal);
        assert_eq!(response.pathways.len(), 1);
        assert!(response.pathways[0].is_empty());
    }

    #[test]
    fn unknown_target_is_a_typed_error() {
        let result = solve(
            &linear_catalog(),
            "Z",
            NativeSet::from_compounds(["A".to_string()]),
            SolveOptions::default(),
        );
        match result {
            Err(SolveError::UnknownTarget(target)) => assert_eq!(target, "Z"),
            other => panic!("expected UnknownTarget, got {other:?}"),
        }
    }

    fn parallel_routes_catalog() -> Catalog {
        // Two distinct two-step routes from A to C
        let mut catalog = Catalog::new("parallel");
        for id in ["A", "B1", "B2", "C"] {
            catalog.add_compound(CompoundBuilder::default().id(id).build().unwrap());
        }
        add_reaction(&mut catalog, "R1a", "A", "B1");
        add_reaction(&mut catalog, "R2a", "B1", "C");
        add_reaction(&mut catalog, "R1b", "A", "B2");
        add_reaction(&mut catalog, "R2b", "B2", "C");
        catalog
    }

    #[test]
    fn enumerates_equal_cost_alternatives() {
        let response = solve(
            &parallel_routes_catalog(),
            "C",
            NativeSet::from_compounds(["A".to_string()]),
            SolveOptions::default(),
        )
        .unwrap();

        assert_eq!(response.status, SolveStatus::Optimal);
        assert_eq!(response.pathways.len(), 2);
        for pathway in &response.pathways {
            assert_eq!(pathway.len(), 2);
        }
        // The two routes must be structurally distinct
        assert_ne!(response.pathways[0], response.pathways[1]);
    }

    #[test]
    fn pathway_limit_caps_the_returned_set() {
        let response = solve(
            &parallel_routes_catalog(),
            "C",
            NativeSet::from_compounds(["A".to_string()]),
            SolveOptions {
                pathway_limit: Some(1),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(response.pathways.len(), 1);
    }

    #[test]
    fn single_solution_mode_stops_after_one() {
        let response = solve(
            &parallel_routes_catalog(),
            "C",
            NativeSet::from_compounds(["A".to_string()]),
            SolveOptions {
                multiple_solutions: false,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(response.status, SolveStatus::Optimal);
        assert_eq!(response.pathways.len(), 1);
    }

    #[test]
    fn excluded_reactions_reroute_the_search() {
        let response = solve(
            &parallel_routes_catalog(),
            "C",
            NativeSet::from_compounds(["A".to_string()]),
            SolveOptions {
                excluded_reactions: IndexSet::from(["R1a".to_string()]),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(response.status, SolveStatus::Optimal);
        assert_eq!(response.pathways.len(), 1);
        assert_eq!(response.pathways[0].reaction_ids(), vec!["R1b", "R2b"]);
    }

    #[test]
    fn spent_budget_degrades_instead_of_failing() {
        let response = solve(
            &linear_catalog(),
            "C",
            NativeSet::from_compounds(["A".to_string()]),
            SolveOptions {
                time_limit: Duration::ZERO,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(response.status, SolveStatus::Degraded);
        assert!(response.pathways.is_empty());
    }
}
