//! Per-organism membership sets of already-available compounds and reactions

use indexmap::{IndexMap, IndexSet};

/// Compounds and reactions an organism already possesses.
///
/// Supplied fresh for every target solve and never mutated by the engine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NativeSet {
    /// Compound ids usable for free as pathway starting material
    pub compounds: IndexSet<String>,
    /// Reaction ids usable for free as structural facts
    pub reactions: IndexSet<String>,
}

impl NativeSet {
    pub fn new(
        compounds: impl IntoIterator<Item = String>,
        reactions: impl IntoIterator<Item = String>,
    ) -> Self {
        NativeSet {
            compounds: compounds.into_iter().collect(),
            reactions: reactions.into_iter().collect(),
        }
    }

    /// Native set with compounds only, e.g. a user-supplied starting-material
    /// list with no organism behind it
    pub fn from_compounds(compounds: impl IntoIterator<Item = String>) -> Self {
        Self::new(compounds, [])
    }

    /// Resolve an organism's native set through a [`NativeSource`]
    pub fn for_organism(source: &dyn NativeSource, organism: &str) -> Self {
        NativeSet {
            compounds: source.native_compounds(organism),
            reactions: source.native_reactions(organism),
        }
    }
}

/// Read-only lookup of per-organism membership sets
pub trait NativeSource {
    fn native_compounds(&self, organism: &str) -> IndexSet<String>;
    fn native_reactions(&self, organism: &str) -> IndexSet<String>;
}

/// In-memory [`NativeSource`] backed by a map of organism ids
#[derive(Clone, Debug, Default)]
pub struct MemoryNativeSource {
    organisms: IndexMap<String, NativeSet>,
}

impl MemoryNativeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, organism: impl Into<String>, native: NativeSet) {
        self.organisms.insert(organism.into(), native);
    }
}

impl NativeSource for MemoryNativeSource {
    fn native_compounds(&self, organism: &str) -> IndexSet<String> {
        self.organisms
            .get(organism)
            .map(|n| n.compounds.clone())
            .unwrap_or_default()
    }

    fn native_reactions(&self, organism: &str) -> IndexSet<String> {
        self.organisms
            .get(organism)
            .map(|n| n.reactions.clone())
            .unwrap_or_default()
    }
}
