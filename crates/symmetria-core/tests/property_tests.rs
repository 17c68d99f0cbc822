//! # Property-Based Tests
//!
//! Determinism and bookkeeping invariants of the symmetry engine, checked
//! with proptest over random swap sequences and random mappings.

use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use symmetria_core::{
    ArrangementState, CrystalId, GraphModel, LevelCatalog, LevelId, LevelSession, Permutation,
    PermutationValidator, SubgroupAnalyzer, Submission, enumerate_automorphisms,
};

fn builtin(id: &str) -> std::sync::Arc<GraphModel> {
    LevelCatalog::builtin()
        .get(&LevelId::new(id))
        .expect("builtin level")
}

/// Hexagon level: 6 crystals, 12 automorphisms.
fn hexagon() -> std::sync::Arc<GraphModel> {
    builtin("act2_level03")
}

fn swaps() -> impl Strategy<Value = Vec<(usize, usize)>> {
    vec((0usize..6, 0usize..6), 0..40)
}

fn arrangement_after(graph: &GraphModel, moves: &[(usize, usize)]) -> ArrangementState {
    let mut state = ArrangementState::new(graph);
    for &(a, b) in moves {
        state.swap(a, b).expect("in range");
    }
    state
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Any sequence of swaps keeps every crystal in exactly one slot.
    #[test]
    fn swaps_preserve_bijection(moves in swaps()) {
        let graph = hexagon();
        let state = arrangement_after(&graph, &moves);

        let occupants: BTreeSet<CrystalId> = state.slots().iter().copied().collect();
        prop_assert_eq!(occupants, graph.vertex_ids());
        prop_assert_eq!(state.current_permutation().len(), graph.crystal_count());
    }

    /// Validation is a pure function of graph and mapping.
    #[test]
    fn validation_is_deterministic(moves in swaps()) {
        let graph = hexagon();
        let mapping: BTreeMap<CrystalId, CrystalId> =
            arrangement_after(&graph, &moves).current_permutation().iter().collect();

        let first = PermutationValidator::validate(&graph, &mapping);
        let second = PermutationValidator::validate(&graph, &mapping);
        prop_assert_eq!(first, second);
    }

    /// A random swap sequence is accepted exactly when it lands on one of the
    /// enumerated automorphisms.
    #[test]
    fn acceptance_matches_enumeration(moves in swaps()) {
        let graph = hexagon();
        let automorphisms = enumerate_automorphisms(&graph).expect("small level");
        let candidate = arrangement_after(&graph, &moves).current_permutation();

        prop_assert_eq!(
            PermutationValidator::is_automorphism(&graph, &candidate),
            automorphisms.contains(&candidate)
        );
    }

    /// found_count never decreases and never exceeds total.
    #[test]
    fn found_count_is_monotone(batches in vec(swaps(), 1..12)) {
        let mut session = LevelSession::default();
        session.load_level(&LevelId::new("act2_level03")).expect("builtin");
        let mut last = 0;

        for moves in batches {
            session.reset_arrangement().expect("loaded");
            for (a, b) in moves {
                session.swap(a, b).expect("in range");
            }
            session.submit_arrangement().expect("loaded");
            let keyring = session.keyring().expect("loaded");
            prop_assert!(keyring.found_count() >= last);
            prop_assert!(keyring.found_count() <= keyring.total());
            last = keyring.found_count();
        }
    }

    /// Mappings with a missing or foreign id never reach the keyring.
    #[test]
    fn partial_mappings_are_rejected(drop in 0u32..6, foreign in 6u32..100) {
        let graph = hexagon();
        let mut mapping: BTreeMap<CrystalId, CrystalId> =
            graph.vertex_ids().into_iter().map(|id| (id, id)).collect();
        mapping.remove(&CrystalId(drop));
        prop_assert!(PermutationValidator::validate(&graph, &mapping).is_err());

        mapping.insert(CrystalId(drop), CrystalId(foreign));
        prop_assert!(PermutationValidator::validate(&graph, &mapping).is_err());
    }

    /// Same-slot swaps change nothing.
    #[test]
    fn same_slot_swap_is_noop(moves in swaps(), slot in 0usize..6) {
        let graph = hexagon();
        let mut state = arrangement_after(&graph, &moves);
        let before = state.clone();
        state.swap(slot, slot).expect("in range");
        prop_assert_eq!(state, before);
    }

    /// The cyclic group generated by any automorphism is a subgroup.
    #[test]
    fn cyclic_subgroups_are_closed(index in 0usize..12) {
        let graph = hexagon();
        let automorphisms = enumerate_automorphisms(&graph).expect("small level");
        let candidate = automorphisms[index % automorphisms.len()].clone();

        let mut powers = vec![candidate.clone()];
        let mut current = candidate.clone();
        while !current.is_identity() {
            current = current.compose(&candidate).expect("same domain");
            powers.push(current.clone());
        }
        let analyzer = SubgroupAnalyzer::new(graph.vertex_ids(), powers.iter());
        prop_assert!(analyzer.is_subgroup());
    }
}

// =============================================================================
// EXHAUSTIVE CHECKS
// =============================================================================

#[test]
fn identity_is_valid_on_every_builtin_level() {
    for graph in LevelCatalog::builtin().iter() {
        let identity = Permutation::identity(graph.vertex_ids());
        assert!(
            PermutationValidator::is_automorphism(graph, &identity),
            "identity rejected on {}",
            graph.level_id()
        );
    }
}

#[test]
fn submitting_every_automorphism_completes_every_level() {
    let catalog = LevelCatalog::builtin();
    for graph in catalog.iter() {
        let mut session = LevelSession::new(catalog.clone());
        session.load_level(graph.level_id()).expect("builtin");
        for automorphism in enumerate_automorphisms(graph).expect("small level") {
            let mapping: BTreeMap<CrystalId, CrystalId> = automorphism.iter().collect();
            let outcome = session.submit_permutation(&mapping).expect("loaded");
            assert!(matches!(outcome, Submission::Recorded { .. }));
        }
        let completed = session
            .drain_events()
            .events
            .iter()
            .filter(|e| e.kind() == "level_completed")
            .count();
        assert_eq!(completed, 1, "{}", graph.level_id());
    }
}
