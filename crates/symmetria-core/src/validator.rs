//! # Permutation Validator
//!
//! Decides whether a candidate relabeling is an automorphism of a level's
//! crystal graph.
//!
//! Three checks run in a fixed order, and the first failure is reported:
//! 1. **Bijection** (`not_a_permutation`): the mapping is a permutation of
//!    exactly the graph's crystal ids.
//! 2. **Structure** (`structure_mismatch`): every edge maps onto an edge of
//!    the same kind and orientation. Since the mapping is a bijection the
//!    image edge set has the same size as the source, so forward preservation
//!    over all edges is both necessary and sufficient.
//! 3. **Color** (`color_mismatch`): every crystal maps onto a crystal of the
//!    same color.
//!
//! The validator is pure: no state, no side effects, identical answers for
//! identical inputs.

use crate::graph::GraphModel;
use crate::permutation::{BijectionError, Permutation};
use crate::primitives::MAX_ENUMERATION_CRYSTALS;
use crate::{CrystalId, Edge, SymmetriaError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// REJECTIONS
// =============================================================================

/// Reason code carried by `invalid_attempt` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    NotAPermutation,
    StructureMismatch,
    ColorMismatch,
}

impl RejectionReason {
    /// Wire name of the reason.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAPermutation => "not_a_permutation",
            Self::StructureMismatch => "structure_mismatch",
            Self::ColorMismatch => "color_mismatch",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected submission: reason code plus a human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub reason: RejectionReason,
    pub detail: String,
}

impl Rejection {
    fn new(reason: RejectionReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

impl From<BijectionError> for Rejection {
    fn from(err: BijectionError) -> Self {
        Self::new(RejectionReason::NotAPermutation, err.to_string())
    }
}

// =============================================================================
// VALIDATOR
// =============================================================================

/// Stateless automorphism checker.
pub struct PermutationValidator;

impl PermutationValidator {
    /// Validate a raw id→id mapping against `graph`.
    ///
    /// On success returns the typed permutation, ready for the keyring.
    pub fn validate(
        graph: &GraphModel,
        mapping: &BTreeMap<CrystalId, CrystalId>,
    ) -> Result<Permutation, Rejection> {
        let permutation = Permutation::parse(mapping, &graph.vertex_ids())?;
        Self::check(graph, &permutation)?;
        Ok(permutation)
    }

    /// Run all three checks on an already-typed permutation.
    ///
    /// The bijection check is repeated here because a `Permutation` may have
    /// been parsed against another level's domain.
    pub fn check(graph: &GraphModel, permutation: &Permutation) -> Result<(), Rejection> {
        if !permutation.domain().eq(graph.vertex_ids().into_iter()) {
            return Err(Rejection::new(
                RejectionReason::NotAPermutation,
                "permutation domain differs from the level's crystals",
            ));
        }
        Self::check_structure(graph, permutation)?;
        Self::check_colors(graph, permutation)
    }

    fn check_structure(graph: &GraphModel, permutation: &Permutation) -> Result<(), Rejection> {
        for edge in graph.edges() {
            let image = match (permutation.apply(edge.a), permutation.apply(edge.b)) {
                (Some(a), Some(b)) => Edge::with_kind(a, b, edge.kind),
                _ => {
                    return Err(Rejection::new(
                        RejectionReason::NotAPermutation,
                        format!("edge {} has an endpoint without image", edge),
                    ));
                }
            };
            if !graph.contains_edge(&image) {
                return Err(Rejection::new(
                    RejectionReason::StructureMismatch,
                    format!("edge {} maps to {}, which is not an edge", edge, image),
                ));
            }
        }
        Ok(())
    }

    fn check_colors(graph: &GraphModel, permutation: &Permutation) -> Result<(), Rejection> {
        for (from, to) in permutation.iter() {
            let source = graph.color_of(from);
            let target = graph.color_of(to);
            if source != target {
                return Err(Rejection::new(
                    RejectionReason::ColorMismatch,
                    format!(
                        "crystal {} ({}) maps to crystal {} ({})",
                        from,
                        source.map(|c| c.as_str()).unwrap_or("?"),
                        to,
                        target.map(|c| c.as_str()).unwrap_or("?"),
                    ),
                ));
            }
        }
        Ok(())
    }

    /// True if `permutation` is an automorphism of `graph`.
    #[must_use]
    pub fn is_automorphism(graph: &GraphModel, permutation: &Permutation) -> bool {
        Self::check(graph, permutation).is_ok()
    }
}

// =============================================================================
// BRUTE-FORCE ENUMERATION
// =============================================================================

/// Enumerate every automorphism of `graph` by trying all `n!` relabelings.
///
/// Results are sorted by signature. Refuses graphs with more than
/// `MAX_ENUMERATION_CRYSTALS` crystals.
pub fn enumerate_automorphisms(graph: &GraphModel) -> Result<Vec<Permutation>, SymmetriaError> {
    let ids: Vec<CrystalId> = graph.vertex_ids().into_iter().collect();
    let n = ids.len();
    if n > MAX_ENUMERATION_CRYSTALS {
        return Err(SymmetriaError::EnumerationLimit {
            crystals: n,
            max: MAX_ENUMERATION_CRYSTALS,
        });
    }

    let mut found = Vec::new();
    let mut images = ids.clone();
    let mut try_current = |images: &[CrystalId]| {
        let mapping: BTreeMap<CrystalId, CrystalId> =
            ids.iter().copied().zip(images.iter().copied()).collect();
        if let Ok(p) = PermutationValidator::validate(graph, &mapping) {
            found.push(p);
        }
    };

    // Heap's algorithm, iterative form.
    try_current(&images);
    let mut counters = vec![0usize; n];
    let mut i = 1;
    while i < n {
        if counters[i] < i {
            if i % 2 == 0 {
                images.swap(0, i);
            } else {
                images.swap(counters[i], i);
            }
            try_current(&images);
            counters[i] += 1;
            i = 1;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }

    found.sort_by_key(|p| p.signature());
    Ok(found)
}

/// Outcome of checking a level's declared automorphism count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelVerification {
    pub level_id: String,
    pub expected: usize,
    pub actual: usize,
}

impl LevelVerification {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.expected == self.actual
    }
}

/// Compare `expected_automorphism_count` with the brute-force count.
pub fn verify_level(graph: &GraphModel) -> Result<LevelVerification, SymmetriaError> {
    let actual = enumerate_automorphisms(graph)?.len();
    Ok(LevelVerification {
        level_id: graph.level_id().to_string(),
        expected: graph.expected_automorphism_count(),
        actual,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(u32, u32)]) -> BTreeMap<CrystalId, CrystalId> {
        pairs
            .iter()
            .map(|&(a, b)| (CrystalId(a), CrystalId(b)))
            .collect()
    }

    fn directed_triangle() -> GraphModel {
        GraphModel::builder("triangle")
            .expected_automorphisms(3)
            .crystal(0, "red")
            .crystal(1, "red")
            .crystal(2, "red")
            .arc(0, 1)
            .arc(1, 2)
            .arc(2, 0)
            .build()
            .expect("valid")
    }

    #[test]
    fn identity_is_accepted() {
        let g = directed_triangle();
        let result = PermutationValidator::validate(&g, &mapping(&[(0, 0), (1, 1), (2, 2)]));
        assert!(result.is_ok());
    }

    #[test]
    fn rotation_is_accepted() {
        let g = directed_triangle();
        let result = PermutationValidator::validate(&g, &mapping(&[(0, 1), (1, 2), (2, 0)]));
        assert!(result.is_ok());
    }

    #[test]
    fn reflection_breaks_orientation() {
        let g = directed_triangle();
        let result = PermutationValidator::validate(&g, &mapping(&[(0, 0), (1, 2), (2, 1)]));
        let rejection = result.expect_err("reflection reverses arcs");
        assert_eq!(rejection.reason, RejectionReason::StructureMismatch);
    }

    #[test]
    fn missing_id_is_not_a_permutation() {
        let g = directed_triangle();
        let result = PermutationValidator::validate(&g, &mapping(&[(0, 1), (1, 2)]));
        let rejection = result.expect_err("missing id");
        assert_eq!(rejection.reason, RejectionReason::NotAPermutation);
    }

    #[test]
    fn color_mismatch_detected() {
        let g = GraphModel::builder("pair")
            .crystal(0, "red")
            .crystal(1, "blue")
            .edge(0, 1)
            .build()
            .expect("valid");
        let result = PermutationValidator::validate(&g, &mapping(&[(0, 1), (1, 0)]));
        let rejection = result.expect_err("colors differ");
        assert_eq!(rejection.reason, RejectionReason::ColorMismatch);
        assert!(rejection.detail.contains("red"));
    }

    #[test]
    fn structure_reported_before_color() {
        // Path 0-1-2 with crystal 0 blue.
        let g = GraphModel::builder("path")
            .crystal(0, "blue")
            .crystal(1, "red")
            .crystal(2, "red")
            .edge(0, 1)
            .edge(1, 2)
            .build()
            .expect("valid");
        let result = PermutationValidator::validate(&g, &mapping(&[(0, 2), (1, 1), (2, 0)]));
        let rejection = result.expect_err("reversal keeps edges but moves blue");
        assert_eq!(rejection.reason, RejectionReason::ColorMismatch);

        // Swapping 0 and 1 breaks edge 1-2 and the colors at once.
        let result = PermutationValidator::validate(&g, &mapping(&[(0, 1), (1, 0), (2, 2)]));
        let rejection = result.expect_err("edge 1-2 breaks");
        assert_eq!(rejection.reason, RejectionReason::StructureMismatch);
    }

    #[test]
    fn check_rejects_foreign_domain() {
        let g = directed_triangle();
        let other: std::collections::BTreeSet<CrystalId> = (0..4).map(CrystalId).collect();
        let p = Permutation::identity(other);
        assert!(!PermutationValidator::is_automorphism(&g, &p));
    }

    #[test]
    fn enumeration_counts_directed_triangle() {
        let all = enumerate_automorphisms(&directed_triangle()).expect("small graph");
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(Permutation::is_identity));
    }

    #[test]
    fn enumeration_counts_undirected_square() {
        let g = GraphModel::builder("square")
            .expected_automorphisms(8)
            .crystal(0, "a")
            .crystal(1, "a")
            .crystal(2, "a")
            .crystal(3, "a")
            .edge(0, 1)
            .edge(1, 2)
            .edge(2, 3)
            .edge(3, 0)
            .build()
            .expect("valid");
        let verification = verify_level(&g).expect("small graph");
        assert_eq!(verification.actual, 8);
        assert!(verification.is_consistent());
    }

    #[test]
    fn enumeration_refuses_large_graphs() {
        let mut builder = GraphModel::builder("big");
        for id in 0..=(MAX_ENUMERATION_CRYSTALS as u32) {
            builder = builder.crystal(id, "a");
        }
        let g = builder.build().expect("valid");
        assert!(matches!(
            enumerate_automorphisms(&g),
            Err(SymmetriaError::EnumerationLimit { .. })
        ));
    }
}
