//! Builds the reusable, target-independent optimization model from a catalog.
//!
//! The skeleton is constructed once per (catalog, filter) pair and shared
//! read-only across every target solve; per-target state (native fixing,
//! target row, cuts) goes onto a private clone of the base problem.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::reaction::{Direction, Reaction, ReactionFilter, ReactionKind};
use crate::catalog::{CatalogError, CatalogSource};
use crate::optimize::problem::{Problem, ProblemError, VariableType};

/// The reaction/compound universe translated into solver variables and
/// structural constraints.
///
/// Encoding: one binary use variable per directed reaction, one continuous
/// `[0, 1]` reachability indicator per compound, and four row families:
///
/// - `need_*`: a use may fire only if each reactant indicator is up
/// - `make_*`: a firing use forces each product indicator up
/// - `sup_*`: a compound indicator may be up only if some chosen use
///   produces the compound (relaxed per solve for native compounds)
/// - `excl_*`: at most one direction of a reversible reaction fires
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Skeleton {
    /// Identity of the catalog this skeleton was built from
    pub catalog_id: String,
    /// Reaction-type filter the build used
    pub filter: ReactionFilter,
    /// Base problem holding the structural constraints
    problem: Problem,
    /// Per-reaction directed uses, keyed by reaction id
    reactions: IndexMap<String, SkeletonReaction>,
    /// Per-compound variable and support-row handles, keyed by compound id
    compounds: IndexMap<String, SkeletonCompound>,
    /// Ids of reactions rejected as malformed during the build
    pub rejected: Vec<String>,
}

impl Skeleton {
    /// The structural problem; solves clone this and layer target state on top
    pub fn base_problem(&self) -> &Problem {
        &self.problem
    }

    /// Directed uses per reaction, in catalog order
    pub fn reactions(&self) -> &IndexMap<String, SkeletonReaction> {
        &self.reactions
    }

    /// Look up a compound's handles
    pub fn compound(&self, id: &str) -> Option<&SkeletonCompound> {
        self.compounds.get(id)
    }

    /// Whether the compound took part in the build
    pub fn contains_compound(&self, id: &str) -> bool {
        self.compounds.contains_key(id)
    }
}

/// A reaction as it appears in the skeleton
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkeletonReaction {
    /// Whether the reaction is biological or chemical
    pub kind: ReactionKind,
    /// One entry per permitted direction
    pub uses: Vec<DirectedUse>,
}

/// A directed use of a reaction and its variable in the base problem
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectedUse {
    pub direction: Direction,
    /// Variable id in the base problem
    pub variable: String,
    /// Variable index in the base problem
    pub index: usize,
    /// Reactant compound ids for this direction
    pub reactants: Vec<String>,
    /// Product compound ids for this direction
    pub products: Vec<String>,
}

/// A compound's variable and support row in the base problem
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkeletonCompound {
    /// Variable id in the base problem
    pub variable: String,
    /// Variable index in the base problem
    pub index: usize,
    /// Id of the compound's support row, relaxed per solve when the
    /// compound is native
    pub support_row: String,
}

/// Builds a [`Skeleton`] from a catalog
#[derive(Clone, Copy, Debug)]
pub struct SkeletonBuilder {
    filter: ReactionFilter,
}

impl SkeletonBuilder {
    pub fn new(filter: ReactionFilter) -> Self {
        SkeletonBuilder { filter }
    }

    /// Translate the catalog into a skeleton.
    ///
    /// Malformed reactions (empty side, reference to an unknown compound)
    /// are reported, recorded in [`Skeleton::rejected`], and skipped; the
    /// build only fails if nothing usable remains.
    pub fn build(&self, source: &dyn CatalogSource) -> Result<Skeleton, BuildError> {
        let catalog_compounds = source.list_compounds();
        let catalog_reactions = source.list_reactions(self.filter);
        if catalog_compounds.is_empty() || catalog_reactions.is_empty() {
            return Err(BuildError::EmptyCatalog);
        }

        let mut problem = Problem::new_minimization();
        let mut compounds: IndexMap<String, SkeletonCompound> = IndexMap::new();
        let mut reactions: IndexMap<String, SkeletonReaction> = IndexMap::new();
        let mut rejected: Vec<String> = Vec::new();
        // Producing use variables per compound, filled while walking reactions
        let mut producers: IndexMap<String, Vec<usize>> = IndexMap::new();

        for compound in &catalog_compounds {
            let index =
                problem.add_new_variable(&compound.id, VariableType::Continuous, 0.0, 1.0)?;
            compounds.insert(
                compound.id.clone(),
                SkeletonCompound {
                    variable: compound.id.clone(),
                    index,
                    support_row: format!("sup_{}", compound.id),
                },
            );
        }

        for reaction in &catalog_reactions {
            match self.add_reaction(
                reaction,
                &mut problem,
                &compounds,
                &mut producers,
            ) {
                Ok(skeleton_reaction) => {
                    reactions.insert(reaction.id.clone(), skeleton_reaction);
                }
                Err(ReactionRejected(error)) => {
                    warn!(%error, "skipping reaction");
                    rejected.push(reaction.id.clone());
                }
                Err(ReactionFailed(error)) => return Err(error.into()),
            }
        }

        if reactions.is_empty() {
            return Err(BuildError::EmptyCatalog);
        }

        for (compound_id, compound) in &compounds {
            let mut terms = vec![(compound.index, 1.0)];
            if let Some(producing) = producers.get(compound_id) {
                terms.extend(producing.iter().map(|&index| (index, -1.0)));
            }
            problem.add_new_inequality_constraint(
                &compound.support_row,
                &terms,
                None,
                Some(0.0),
            )?;
        }

        info!(
            catalog = source.identity(),
            filter = self.filter.tag(),
            reactions = reactions.len(),
            compounds = compounds.len(),
            rejected = rejected.len(),
            "built skeleton"
        );

        Ok(Skeleton {
            catalog_id: source.identity().to_string(),
            filter: self.filter,
            problem,
            reactions,
            compounds,
            rejected,
        })
    }

    fn add_reaction(
        &self,
        reaction: &Reaction,
        problem: &mut Problem,
        compounds: &IndexMap<String, SkeletonCompound>,
        producers: &mut IndexMap<String, Vec<usize>>,
    ) -> Result<SkeletonReaction, ReactionOutcome> {
        reaction.validate().map_err(ReactionRejected)?;
        // Resolve every referenced compound before touching the problem so a
        // rejected reaction leaves no partial state behind
        for compound_id in reaction.reactants.keys().chain(reaction.products.keys()) {
            if !compounds.contains_key(compound_id) {
                return Err(ReactionRejected(CatalogError::UnknownCompound {
                    reaction: reaction.id.clone(),
                    compound: compound_id.clone(),
                }));
            }
        }

        let mut uses = Vec::new();
        for &direction in reaction.directions() {
            let variable = reaction.direction_id(direction);
            let index = problem
                .add_new_variable(&variable, VariableType::Binary, 0.0, 1.0)
                .map_err(ReactionFailed)?;
            let (reactants, products) = reaction.sides(direction);

            for compound_id in reactants.keys() {
                let compound = &compounds[compound_id];
                problem
                    .add_new_inequality_constraint(
                        &format!("need_{}_{}", variable, compound_id),
                        &[(index, 1.0), (compound.index, -1.0)],
                        None,
                        Some(0.0),
                    )
                    .map_err(ReactionFailed)?;
            }
            for compound_id in products.keys() {
                let compound = &compounds[compound_id];
                problem
                    .add_new_inequality_constraint(
                        &format!("make_{}_{}", variable, compound_id),
                        &[(index, 1.0), (compound.index, -1.0)],
                        None,
                        Some(0.0),
                    )
                    .map_err(ReactionFailed)?;
                producers.entry(compound_id.clone()).or_default().push(index);
            }

            uses.push(DirectedUse {
                direction,
                variable,
                index,
                reactants: reactants.keys().cloned().collect(),
                products: products.keys().cloned().collect(),
            });
        }

        if let [forward, reverse] = uses.as_slice() {
            problem
                .add_new_inequality_constraint(
                    &format!("excl_{}", reaction.id),
                    &[(forward.index, 1.0), (reverse.index, 1.0)],
                    None,
                    Some(1.0),
                )
                .map_err(ReactionFailed)?;
        }

        Ok(SkeletonReaction {
            kind: reaction.kind,
            uses,
        })
    }
}

use ReactionOutcome::{ReactionFailed, ReactionRejected};

/// Internal: whether a reaction merely gets skipped or fails the whole build
enum ReactionOutcome {
    ReactionRejected(CatalogError),
    ReactionFailed(ProblemError),
}

/// Errors that abort a skeleton build
#[derive(Error, Debug)]
pub enum BuildError {
    /// The catalog has no compounds, or no usable reactions under the filter
    #[error("catalog contains no usable compounds or reactions")]
    EmptyCatalog,
    /// The structural problem could not be assembled, e.g. colliding ids
    #[error(transparent)]
    Problem(#[from] ProblemError),
}
