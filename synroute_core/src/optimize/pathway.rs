//! Pathway solutions and the causal-order validity check.
//!
//! The mass-flow rows let a set of chosen reactions satisfy each other's
//! reachability in a mutually dependent cycle; [`order_causally`] is the
//! arbiter that separates real pathways from such false solutions.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::catalog::reaction::Direction;

/// One selected reaction in a pathway, with the direction it runs in
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathwayStep {
    pub reaction: String,
    pub direction: Direction,
}

/// An accepted solution: reactions to add, in a valid causal order.
///
/// Zero steps means the target is producible without adding anything
/// (already native, or reachable through native reactions alone).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pathway {
    pub steps: Vec<PathwayStep>,
}

impl Pathway {
    /// Number of reactions the pathway adds
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Reaction ids in causal order
    pub fn reaction_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.reaction.as_str()).collect()
    }
}

/// A directed use the solver switched on, resolved against the skeleton
#[derive(Clone, Debug)]
pub(crate) struct ChosenUse {
    pub reaction: String,
    pub direction: Direction,
    /// Variable index of the use in the solve problem, for cut rows
    pub index: usize,
    pub reactants: Vec<String>,
    pub products: Vec<String>,
    /// Whether the organism already has this reaction
    pub native: bool,
}

/// Fire the chosen uses from the native compound set until nothing more can
/// fire, recording the order.
///
/// Returns the non-native steps in firing order, or `None` when some
/// non-native use never becomes fireable, which means the candidate relies
/// on a non-causal cycle. Native uses fire silently as facts; a native use
/// that never fires is solver noise and does not invalidate the candidate.
pub(crate) fn order_causally(
    chosen: &[ChosenUse],
    native_compounds: &IndexSet<String>,
) -> Option<Pathway> {
    let mut reachable: IndexSet<String> = native_compounds.clone();
    let mut fired = vec![false; chosen.len()];
    let mut steps = Vec::new();

    loop {
        let mut progressed = false;
        for (position, chosen_use) in chosen.iter().enumerate() {
            if fired[position] {
                continue;
            }
            if chosen_use
                .reactants
                .iter()
                .all(|compound| reachable.contains(compound))
            {
                fired[position] = true;
                progressed = true;
                for product in &chosen_use.products {
                    reachable.insert(product.clone());
                }
                if !chosen_use.native {
                    steps.push(PathwayStep {
                        reaction: chosen_use.reaction.clone(),
                        direction: chosen_use.direction,
                    });
                }
            }
        }
        if !progressed {
            break;
        }
    }

    let stuck = chosen
        .iter()
        .zip(&fired)
        .any(|(chosen_use, &fired)| !fired && !chosen_use.native);
    if stuck {
        None
    } else {
        Some(Pathway { steps })
    }
}
