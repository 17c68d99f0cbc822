//! # Keyring
//!
//! The set of distinct automorphisms discovered in the active level.
//!
//! Entries are keyed by [`PermutationSignature`], so dedup does not depend on
//! submission order or on how the mapping was written. The keyring only grows;
//! a new level gets a new keyring.

use crate::SymmetriaError;
use crate::permutation::{Permutation, PermutationSignature};
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of [`Keyring::try_record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    /// First time this automorphism was seen.
    Recorded,
    /// The automorphism was already in the keyring.
    AlreadyKnown,
}

/// Discovered automorphisms plus completion accounting.
#[derive(Debug, Clone)]
pub struct Keyring {
    discovered: BTreeMap<PermutationSignature, Permutation>,
    total: usize,
}

impl Keyring {
    /// Empty keyring for a level with `total` automorphisms.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            discovered: BTreeMap::new(),
            total,
        }
    }

    /// Insert `permutation` unless an equal one is already present.
    ///
    /// Callers must only pass validated automorphisms. A new entry on a
    /// keyring that is already complete would push `found_count` past
    /// `total`, which is an engine bug and reported as `InvariantViolation`.
    pub fn try_record(&mut self, permutation: Permutation) -> Result<RecordOutcome, SymmetriaError> {
        let signature = permutation.signature();
        if self.discovered.contains_key(&signature) {
            return Ok(RecordOutcome::AlreadyKnown);
        }
        if self.discovered.len() >= self.total {
            return Err(SymmetriaError::InvariantViolation(format!(
                "keyring already holds {} of {} automorphisms, refusing {}",
                self.discovered.len(),
                self.total,
                permutation
            )));
        }
        self.discovered.insert(signature, permutation);
        Ok(RecordOutcome::Recorded)
    }

    #[must_use]
    pub fn found_count(&self) -> usize {
        self.discovered.len()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.discovered.len() == self.total
    }

    #[must_use]
    pub fn contains(&self, permutation: &Permutation) -> bool {
        self.discovered.contains_key(&permutation.signature())
    }

    /// Discovered permutations in signature order.
    pub fn members(&self) -> impl Iterator<Item = &Permutation> {
        self.discovered.values()
    }

    /// Serializable view for state reports.
    #[must_use]
    pub fn snapshot(&self) -> KeyringSnapshot {
        KeyringSnapshot {
            found_count: self.found_count(),
            total: self.total,
            complete: self.is_complete(),
            keys: self.discovered.values().cloned().collect(),
        }
    }
}

/// Point-in-time copy of a keyring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyringSnapshot {
    pub found_count: usize,
    pub total: usize,
    pub complete: bool,
    pub keys: Vec<Permutation>,
}

// =============================================================================
// TESTS
// =============================================================================
