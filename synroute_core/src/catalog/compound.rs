//! This module provides the compound struct representing a chemical compound

use std::hash::Hash;

use derive_builder::Builder;

/// Represents a compound in the catalog
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(setter(into))]
pub struct Compound {
    /// Used to identify the compound (must be unique within a catalog)
    pub id: String,
    /// Human readable name of the compound
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Structural key (e.g. an InChI string); only external similarity
    /// tooling consumes this, the engine treats it as opaque
    #[builder(default = "None")]
    pub structure_key: Option<String>,
}

impl Hash for Compound {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state); // Hash by id
    }
}
