//! Module providing the reaction/compound universe the engine searches over.

pub mod compound;
pub mod native;
pub mod reaction;

use indexmap::IndexMap;
use thiserror::Error;

use crate::catalog::compound::Compound;
use crate::catalog::reaction::{Reaction, ReactionFilter};

/// Read-only view of a reaction/compound universe.
///
/// The engine consumes catalogs exclusively through this trait, so the
/// backing store (in-memory registry, database connector, ...) is a caller
/// concern.
pub trait CatalogSource {
    /// Identity string for the catalog, used to key cached skeletons
    fn identity(&self) -> &str;
    /// All compounds in the catalog
    fn list_compounds(&self) -> Vec<Compound>;
    /// All reactions matching the given type filter
    fn list_reactions(&self, filter: ReactionFilter) -> Vec<Reaction>;
}

/// In-memory catalog of reactions and compounds
#[derive(Clone, Debug)]
pub struct Catalog {
    /// Identity of the catalog, typically the source database name
    pub id: String,
    /// Map of compound ids to Compound objects
    pub compounds: IndexMap<String, Compound>,
    /// Map of reaction ids to Reaction objects
    pub reactions: IndexMap<String, Reaction>,
}

impl Catalog {
    pub fn new(id: impl Into<String>) -> Self {
        Catalog {
            id: id.into(),
            compounds: IndexMap::new(),
            reactions: IndexMap::new(),
        }
    }

    /// Add a compound to the catalog
    ///
    /// # Examples
    /// ```rust
    /// use synroute_core::catalog::Catalog;
    /// use synroute_core::catalog::compound::CompoundBuilder;
    /// let mut catalog = Catalog::new("demo");
    /// let glucose = CompoundBuilder::default().id("cpd_glucose").build().unwrap();
    /// catalog.add_compound(glucose);
    /// ```
    pub fn add_compound(&mut self, compound: Compound) {
        let id = compound.id.clone();
        self.compounds.insert(id, compound);
    }

    /// Add a reaction to the catalog
    pub fn add_reaction(&mut self, reaction: Reaction) {
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }
}

impl CatalogSource for Catalog {
    fn identity(&self) -> &str {
        &self.id
    }

    fn list_compounds(&self) -> Vec<Compound> {
        self.compounds.values().cloned().collect()
    }

    fn list_reactions(&self, filter: ReactionFilter) -> Vec<Reaction> {
        self.reactions
            .values()
            .filter(|r| filter.matches(r.kind))
            .cloned()
            .collect()
    }
}

/// Errors for malformed catalog entries
///
/// These are reported and the offending entity skipped; they never abort a
/// skeleton build on their own.
#[derive(Error, Debug, Clone)]
pub enum CatalogError {
    /// A reaction with an empty reactant or product side cannot take part in
    /// the reachability model
    #[error("reaction {id} has an empty {side} side")]
    MalformedReaction { id: String, side: &'static str },
    /// A reaction referencing a compound the catalog never listed
    #[error("reaction {reaction} references unknown compound {compound}")]
    UnknownCompound { reaction: String, compound: String },
}
