//! # Permutation
//!
//! Typed bijections over a level's crystal ids.
//!
//! A `Permutation` can only be obtained through [`Permutation::parse`] (which
//! enforces the bijection invariant against a domain), [`Permutation::identity`],
//! or the group operations on existing permutations. Raw id→id records coming
//! from the outside never reach the automorphism checks without going through
//! `parse` first.
//!
//! Composition follows the usual right-to-left convention:
//! `(p ∘ q)(x) = p(q(x))`.

use crate::CrystalId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// BIJECTION ERRORS
// =============================================================================

/// Why a raw mapping is not a permutation of the expected domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BijectionError {
    /// A domain id has no image.
    MissingId(CrystalId),
    /// The mapping has a key outside the domain.
    ForeignId(CrystalId),
    /// An image lies outside the domain.
    ForeignImage { from: CrystalId, to: CrystalId },
    /// Two ids share the same image.
    DuplicateImage {
        first: CrystalId,
        second: CrystalId,
        image: CrystalId,
    },
}

impl fmt::Display for BijectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId(id) => write!(f, "crystal {} has no image", id),
            Self::ForeignId(id) => write!(f, "crystal {} is not part of this level", id),
            Self::ForeignImage { from, to } => {
                write!(f, "crystal {} maps to unknown crystal {}", from, to)
            }
            Self::DuplicateImage {
                first,
                second,
                image,
            } => write!(
                f,
                "crystals {} and {} both map to crystal {}",
                first, second, image
            ),
        }
    }
}

// =============================================================================
// SIGNATURE
// =============================================================================

/// Canonical dedup key: the image sequence in ascending domain order.
///
/// Two permutations over the same domain are equal iff their signatures are.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermutationSignature(pub Vec<CrystalId>);

// =============================================================================
// PERMUTATION
// =============================================================================

/// A total bijection from a crystal-id set onto itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Permutation {
    images: BTreeMap<CrystalId, CrystalId>,
}

impl Permutation {
    /// The identity over `domain`.
    #[must_use]
    pub fn identity(domain: impl IntoIterator<Item = CrystalId>) -> Self {
        Self {
            images: domain.into_iter().map(|id| (id, id)).collect(),
        }
    }

    /// Parse a raw mapping into a permutation of exactly `domain`.
    ///
    /// Checks run in a fixed order so the reported error is deterministic:
    /// foreign keys, foreign images, duplicate images, then missing ids.
    pub fn parse(
        mapping: &BTreeMap<CrystalId, CrystalId>,
        domain: &BTreeSet<CrystalId>,
    ) -> Result<Self, BijectionError> {
        if let Some(foreign) = mapping.keys().find(|id| !domain.contains(id)) {
            return Err(BijectionError::ForeignId(*foreign));
        }

        let mut preimage: BTreeMap<CrystalId, CrystalId> = BTreeMap::new();
        for (&from, &to) in mapping {
            if !domain.contains(&to) {
                return Err(BijectionError::ForeignImage { from, to });
            }
            if let Some(&first) = preimage.get(&to) {
                return Err(BijectionError::DuplicateImage {
                    first,
                    second: from,
                    image: to,
                });
            }
            preimage.insert(to, from);
        }

        if let Some(missing) = domain.iter().find(|id| !mapping.contains_key(id)) {
            return Err(BijectionError::MissingId(*missing));
        }

        Ok(Self {
            images: mapping.clone(),
        })
    }

    /// Build from `(from, to)` pairs, checked against `domain`.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (u32, u32)>,
        domain: &BTreeSet<CrystalId>,
    ) -> Result<Self, BijectionError> {
        let mapping = pairs
            .into_iter()
            .map(|(a, b)| (CrystalId(a), CrystalId(b)))
            .collect();
        Self::parse(&mapping, domain)
    }

    /// Image of `id`, `None` when `id` is outside the domain.
    #[must_use]
    pub fn apply(&self, id: CrystalId) -> Option<CrystalId> {
        self.images.get(&id).copied()
    }

    /// The domain in ascending order.
    pub fn domain(&self) -> impl Iterator<Item = CrystalId> + '_ {
        self.images.keys().copied()
    }

    /// `(from, to)` pairs in ascending domain order.
    pub fn iter(&self) -> impl Iterator<Item = (CrystalId, CrystalId)> + '_ {
        self.images.iter().map(|(a, b)| (*a, *b))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.images.iter().all(|(a, b)| a == b)
    }

    /// `self ∘ other`, i.e. apply `other` first. `None` if the domains differ.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Option<Self> {
        if !self.images.keys().eq(other.images.keys()) {
            return None;
        }
        let images = other
            .images
            .iter()
            .map(|(&x, &y)| self.apply(y).map(|z| (x, z)))
            .collect::<Option<BTreeMap<_, _>>>()?;
        Some(Self { images })
    }

    /// The inverse permutation.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            images: self.images.iter().map(|(&a, &b)| (b, a)).collect(),
        }
    }

    /// Canonical dedup key.
    #[must_use]
    pub fn signature(&self) -> PermutationSignature {
        PermutationSignature(self.images.values().copied().collect())
    }

    /// Disjoint cycles of length ≥ 2, each starting at its smallest id.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<CrystalId>> {
        let mut seen = BTreeSet::new();
        let mut cycles = Vec::new();
        for &start in self.images.keys() {
            if seen.contains(&start) {
                continue;
            }
            let mut cycle = vec![start];
            seen.insert(start);
            let mut next = self.apply(start);
            while let Some(id) = next {
                if id == start || !seen.insert(id) {
                    break;
                }
                cycle.push(id);
                next = self.apply(id);
            }
            if cycle.len() > 1 {
                cycles.push(cycle);
            }
        }
        cycles
    }
}

impl fmt::Display for Permutation {
    /// Cycle notation, `()` for the identity.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cycles = self.cycles();
        if cycles.is_empty() {
            return f.write_str("()");
        }
        for cycle in cycles {
            let ids: Vec<String> = cycle.iter().map(|id| id.to_string()).collect();
            write!(f, "({})", ids.join(" "))?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
