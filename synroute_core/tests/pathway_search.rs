//! End-to-end flow: catalog construction, skeleton build, cache round trip,
//! per-target solves, and a parallel batch.

use indexmap::IndexMap;
use tempfile::tempdir;

use synroute_core::catalog::compound::CompoundBuilder;
use synroute_core::catalog::native::{MemoryNativeSource, NativeSet};
use synroute_core::catalog::reaction::{
    Direction, ReactionBuilder, ReactionFilter, ReactionKind, Reversibility,
};
use synroute_core::catalog::Catalog;
use synroute_core::dispatch::{default_worker_count, run_batch, BatchRequest};
use synroute_core::io::cache::SkeletonCache;
use synroute_core::optimize::skeleton::SkeletonBuilder;
use synroute_core::optimize::solve::{
    PathwaySolver, SolveOptions, SolveRequestBuilder, SolveStatus,
};
use synroute_core::optimize::solvers::microlp::MicrolpSolver;

/// A, B, C, D with a two-step biological chain A->B->C (second step
/// reversible), a chemical finishing step C->D, and a one-step biological
/// shortcut A->D.
fn demo_catalog() -> Catalog {
    let mut catalog = Catalog::new("demo_db");
    for id in ["A", "B", "C", "D"] {
        catalog.add_compound(CompoundBuilder::default().id(id).build().unwrap());
    }
    catalog.add_reaction(
        ReactionBuilder::default()
            .id("R1")
            .reactants(IndexMap::from([("A".to_string(), 1.0)]))
            .products(IndexMap::from([("B".to_string(), 1.0)]))
            .build()
            .unwrap(),
    );
    catalog.add_reaction(
        ReactionBuilder::default()
            .id("R2")
            .reactants(IndexMap::from([("B".to_string(), 1.0)]))
            .products(IndexMap::from([("C".to_string(), 1.0)]))
            .reversibility(Reversibility::Reversible)
            .build()
            .unwrap(),
    );
    catalog.add_reaction(
        ReactionBuilder::default()
            .id("R3")
            .reactants(IndexMap::from([("C".to_string(), 1.0)]))
            .products(IndexMap::from([("D".to_string(), 1.0)]))
            .kind(ReactionKind::Chemical)
            .build()
            .unwrap(),
    );
    catalog.add_reaction(
        ReactionBuilder::default()
            .id("R4")
            .reactants(IndexMap::from([("A".to_string(), 1.0)]))
            .products(IndexMap::from([("D".to_string(), 1.0)]))
            .build()
            .unwrap(),
    );
    catalog
}

#[test]
fn cold_cache_build_solve_and_warm_reload_agree() {
    let catalog = demo_catalog();
    let dir = tempdir().unwrap();
    let cache = SkeletonCache::new(dir.path());
    let backend = MicrolpSolver::new();

    // Cold: build from the catalog and populate the cache
    let built = cache.load_or_build(&catalog, ReactionFilter::All).unwrap();
    let solver = PathwaySolver::new(&built, &backend);
    let request = SolveRequestBuilder::default()
        .target("D")
        .native(NativeSet::from_compounds(["A".to_string()]))
        .build()
        .unwrap();
    let response = solver.solve(&request).unwrap();
    assert_eq!(response.status, SolveStatus::Optimal);
    // The one-step shortcut beats the three-step chain
    assert_eq!(response.pathways[0].reaction_ids(), vec!["R4"]);

    // Warm: the loaded skeleton must solve identically
    let loaded = cache.load("demo_db", ReactionFilter::All).unwrap();
    let solver = PathwaySolver::new(&loaded, &backend);
    let response = solver.solve(&request).unwrap();
    assert_eq!(response.status, SolveStatus::Optimal);
    assert_eq!(response.pathways[0].reaction_ids(), vec!["R4"]);
}

#[test]
fn reversible_reactions_run_backwards_when_needed() {
    let skeleton = SkeletonBuilder::new(ReactionFilter::All)
        .build(&demo_catalog())
        .unwrap();
    let backend = MicrolpSolver::new();
    let solver = PathwaySolver::new(&skeleton, &backend);

    // B from C uses R2 against its written direction
    let request = SolveRequestBuilder::default()
        .target("B")
        .native(NativeSet::from_compounds(["C".to_string()]))
        .build()
        .unwrap();
    let response = solver.solve(&request).unwrap();
    assert_eq!(response.status, SolveStatus::Optimal);
    let pathway = &response.pathways[0];
    assert_eq!(pathway.reaction_ids(), vec!["R2"]);
    assert_eq!(pathway.steps[0].direction, Direction::Reverse);
}

#[test]
fn biological_filter_drops_chemical_steps() {
    let skeleton = SkeletonBuilder::new(ReactionFilter::BiologicalOnly)
        .build(&demo_catalog())
        .unwrap();
    assert!(!skeleton.reactions().contains_key("R3"));

    // D stays reachable through the biological shortcut
    let backend = MicrolpSolver::new();
    let solver = PathwaySolver::new(&skeleton, &backend);
    let request = SolveRequestBuilder::default()
        .target("D")
        .native(NativeSet::from_compounds(["A".to_string()]))
        .build()
        .unwrap();
    let response = solver.solve(&request).unwrap();
    assert_eq!(response.pathways[0].reaction_ids(), vec!["R4"]);
}

#[test]
fn kind_preference_breaks_ties_between_equal_cost_routes() {
    // Two one-step routes to the target, one biological, one chemical
    let mut catalog = Catalog::new("tie_db");
    for id in ["A", "Z"] {
        catalog.add_compound(CompoundBuilder::default().id(id).build().unwrap());
    }
    catalog.add_reaction(
        ReactionBuilder::default()
            .id("R_bio")
            .reactants(IndexMap::from([("A".to_string(), 1.0)]))
            .products(IndexMap::from([("Z".to_string(), 1.0)]))
            .build()
            .unwrap(),
    );
    catalog.add_reaction(
        ReactionBuilder::default()
            .id("R_chem")
            .reactants(IndexMap::from([("A".to_string(), 1.0)]))
            .products(IndexMap::from([("Z".to_string(), 1.0)]))
            .kind(ReactionKind::Chemical)
            .build()
            .unwrap(),
    );

    let skeleton = SkeletonBuilder::new(ReactionFilter::All)
        .build(&catalog)
        .unwrap();
    let backend = MicrolpSolver::new();
    let solver = PathwaySolver::new(&skeleton, &backend);
    let request = SolveRequestBuilder::default()
        .target("Z")
        .native(NativeSet::from_compounds(["A".to_string()]))
        .options(SolveOptions {
            prefer_kind: Some(ReactionKind::Chemical),
            ..Default::default()
        })
        .build()
        .unwrap();
    let response = solver.solve(&request).unwrap();

    assert_eq!(response.status, SolveStatus::Optimal);
    assert_eq!(response.pathways.len(), 2);
    assert_eq!(response.pathways[0].reaction_ids(), vec!["R_chem"]);
    assert_eq!(response.pathways[1].reaction_ids(), vec!["R_bio"]);
}

#[test]
fn batch_runs_pairs_independently() {
    let skeleton = SkeletonBuilder::new(ReactionFilter::All)
        .build(&demo_catalog())
        .unwrap();
    let backend = MicrolpSolver::new();

    let mut organisms = MemoryNativeSource::new();
    organisms.insert("eco", NativeSet::from_compounds(["A".to_string()]));
    organisms.insert("bare", NativeSet::default());

    let requests = vec![
        BatchRequest::for_organism("C", "eco", &organisms),
        BatchRequest::for_organism("D", "eco", &organisms),
        BatchRequest::for_organism("C", "bare", &organisms),
    ];
    let results = run_batch(
        &skeleton,
        &backend,
        requests,
        &SolveOptions::default(),
        default_worker_count(),
    );

    assert_eq!(results.len(), 3);

    let c_for_eco = results[0].result.as_ref().unwrap();
    assert_eq!(c_for_eco.status, SolveStatus::Optimal);
    assert_eq!(c_for_eco.pathways[0].reaction_ids(), vec!["R1", "R2"]);

    let d_for_eco = results[1].result.as_ref().unwrap();
    assert_eq!(d_for_eco.pathways[0].reaction_ids(), vec!["R4"]);

    let c_for_bare = results[2].result.as_ref().unwrap();
    assert_eq!(c_for_bare.status, SolveStatus::NoPathway);
    assert!(c_for_bare.pathways.is_empty());
}
