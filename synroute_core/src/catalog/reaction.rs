//! This module provides a struct for representing reactions
use std::fmt::{Display, Formatter};

use derive_builder::Builder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogError;
use crate::utils::hashing::hash_as_hex_string;

/// Represents a reaction in the catalog
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(setter(into))]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Compound stoichiometry of the reactant side
    #[builder(default = "IndexMap::new()")]
    pub reactants: IndexMap<String, f64>,
    /// Compound stoichiometry of the product side
    #[builder(default = "IndexMap::new()")]
    pub products: IndexMap<String, f64>,
    /// Which directions the reaction can run in
    #[builder(default = "Reversibility::Forward")]
    pub reversibility: Reversibility,
    /// Whether the reaction is biological or chemical
    #[builder(default = "ReactionKind::Biological")]
    pub kind: ReactionKind,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
}

impl Reaction {
    /// Determine the id associated with the forward use of the reaction in
    /// the optimization problem
    ///
    /// # Note:
    /// The forward id is "{reaction_id}_forward"
    pub fn forward_id(&self) -> String {
        format!("{}_forward", &self.id)
    }

    /// Determine the id associated with the reverse use of the reaction in
    /// the optimization problem
    ///
    /// # Note:
    /// The reverse id is "{reaction_id}_reverse_{hexadecimal hash of reaction_id}"
    pub fn reverse_id(&self) -> String {
        format!("{}_reverse_{}", &self.id, hash_as_hex_string(&self.id))
    }

    /// The directions this reaction may run in
    pub fn directions(&self) -> &'static [Direction] {
        match self.reversibility {
            Reversibility::Forward => &[Direction::Forward],
            Reversibility::Reverse => &[Direction::Reverse],
            Reversibility::Reversible => &[Direction::Forward, Direction::Reverse],
        }
    }

    /// Variable id used for a directed use of this reaction
    pub fn direction_id(&self, direction: Direction) -> String {
        match direction {
            Direction::Forward => self.forward_id(),
            Direction::Reverse => self.reverse_id(),
        }
    }

    /// Reactant and product compound sets for a directed use, in that order
    pub fn sides(&self, direction: Direction) -> (&IndexMap<String, f64>, &IndexMap<String, f64>) {
        match direction {
            Direction::Forward => (&self.reactants, &self.products),
            Direction::Reverse => (&self.products, &self.reactants),
        }
    }

    /// Check that the reaction can take part in the reachability model
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.reactants.is_empty() {
            return Err(CatalogError::MalformedReaction {
                id: self.id.clone(),
                side: "reactant",
            });
        }
        if self.products.is_empty() {
            return Err(CatalogError::MalformedReaction {
                id: self.id.clone(),
                side: "product",
            });
        }
        Ok(())
    }
}

/// Which directions a reaction can run in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reversibility {
    /// The reaction only runs reactants to products
    Forward,
    /// The reaction only runs products to reactants
    Reverse,
    /// The reaction runs in either direction
    Reversible,
}

/// Whether a reaction comes from a biological or a synthetic-chemistry source
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionKind {
    Biological,
    Chemical,
}

/// A directed use of a reaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Reverse => write!(f, "reverse"),
        }
    }
}

/// Which reaction kinds take part in a skeleton build
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactionFilter {
    All,
    BiologicalOnly,
    ChemicalOnly,
}

impl ReactionFilter {
    /// Whether a reaction of the given kind passes the filter
    pub fn matches(&self, kind: ReactionKind) -> bool {
        match self {
            ReactionFilter::All => true,
            ReactionFilter::BiologicalOnly => kind == ReactionKind::Biological,
            ReactionFilter::ChemicalOnly => kind == ReactionKind::Chemical,
        }
    }

    /// Short tag used in cache keys
    pub fn tag(&self) -> &'static str {
        match self {
            ReactionFilter::All => "all",
            ReactionFilter::BiologicalOnly => "bio",
            ReactionFilter::ChemicalOnly => "chem",
        }
    }
}
