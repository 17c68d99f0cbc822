//! # Subgroup Analyzer
//!
//! Decides whether a set of discovered automorphisms (plus the identity) is
//! closed under composition and inversion, i.e. forms a subgroup.
//!
//! Closure is the only rule applied. Compositions are checked first, pairwise
//! in signature order, then inverses; the first gap found is reported so the
//! player can be told which key is missing.

use crate::CrystalId;
use crate::permutation::{Permutation, PermutationSignature};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// The first element that keeps the set from being a subgroup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClosureFailure {
    /// `left ∘ right` is not in the set.
    MissingComposition {
        left: Permutation,
        right: Permutation,
        product: Permutation,
    },
    /// The inverse of `element` is not in the set.
    MissingInverse {
        element: Permutation,
        inverse: Permutation,
    },
    /// Members act on different crystal sets.
    DomainMismatch,
}

impl fmt::Display for ClosureFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingComposition {
                left,
                right,
                product,
            } => write!(f, "{} ∘ {} = {} is missing", left, right, product),
            Self::MissingInverse { element, inverse } => {
                write!(f, "inverse of {} ({}) is missing", element, inverse)
            }
            Self::DomainMismatch => f.write_str("members act on different crystal sets"),
        }
    }
}

/// Closure check over a fixed set of permutations.
#[derive(Debug, Clone)]
pub struct SubgroupAnalyzer {
    members: BTreeMap<PermutationSignature, Permutation>,
}

impl SubgroupAnalyzer {
    /// Analyzer over `members` plus the identity on `domain`.
    pub fn new<'a>(
        domain: impl IntoIterator<Item = CrystalId>,
        members: impl IntoIterator<Item = &'a Permutation>,
    ) -> Self {
        let identity = Permutation::identity(domain);
        let mut set = BTreeMap::new();
        set.insert(identity.signature(), identity);
        for p in members {
            set.insert(p.signature(), p.clone());
        }
        Self { members: set }
    }

    /// Order of the analyzed set (identity included).
    #[must_use]
    pub fn order(&self) -> usize {
        self.members.len()
    }

    /// Members in signature order.
    pub fn members(&self) -> impl Iterator<Item = &Permutation> {
        self.members.values()
    }

    /// `Ok(())` if closed, otherwise the first missing element.
    pub fn analyze(&self) -> Result<(), ClosureFailure> {
        for left in self.members.values() {
            for right in self.members.values() {
                let product = left.compose(right).ok_or(ClosureFailure::DomainMismatch)?;
                if !self.members.contains_key(&product.signature()) {
                    return Err(ClosureFailure::MissingComposition {
                        left: left.clone(),
                        right: right.clone(),
                        product,
                    });
                }
            }
        }
        for element in self.members.values() {
            let inverse = element.inverse();
            if !self.members.contains_key(&inverse.signature()) {
                return Err(ClosureFailure::MissingInverse {
                    element: element.clone(),
                    inverse,
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn is_subgroup(&self) -> bool {
        self.analyze().is_ok()
    }

    /// Closed and larger than the trivial group.
    #[must_use]
    pub fn is_nontrivial_subgroup(&self) -> bool {
        self.order() > 1 && self.is_subgroup()
    }
}

// =============================================================================
// TESTS
// =============================================================================
