//! # Arrangement State
//!
//! The player's working arrangement: which crystal sits in which slot.
//!
//! The arrangement starts as the identity (every crystal in its initial slot)
//! and changes only through [`ArrangementState::swap`], so it is always a
//! permutation of the identity arrangement. It never validates anything;
//! validation happens only when the derived permutation is submitted.

use crate::graph::GraphModel;
use crate::permutation::Permutation;
use crate::{CrystalId, SymmetriaError};
use serde::Serialize;
use std::collections::BTreeMap;

/// Result of a successful swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapOutcome {
    /// Two different slots exchanged their crystals.
    Swapped,
    /// Both slot ids were equal; nothing changed.
    Unchanged,
}

/// Slot → crystal assignment for the active level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrangementState {
    initial: Vec<CrystalId>,
    slots: Vec<CrystalId>,
    moves: u64,
}

impl ArrangementState {
    /// Identity arrangement of `graph`.
    #[must_use]
    pub fn new(graph: &GraphModel) -> Self {
        let initial = graph.initial_arrangement().to_vec();
        Self {
            slots: initial.clone(),
            initial,
            moves: 0,
        }
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Crystals indexed by slot.
    #[must_use]
    pub fn slots(&self) -> &[CrystalId] {
        &self.slots
    }

    /// Number of swaps that changed the arrangement since load or reset.
    #[must_use]
    pub fn moves(&self) -> u64 {
        self.moves
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.slots == self.initial
    }

    /// Exchange the crystals in two slots.
    ///
    /// Equal slots are a no-op. Out-of-range slots fail with `InvalidSlot`
    /// and leave the state untouched.
    pub fn swap(&mut self, slot_a: usize, slot_b: usize) -> Result<SwapOutcome, SymmetriaError> {
        let slot_count = self.slots.len();
        for slot in [slot_a, slot_b] {
            if slot >= slot_count {
                return Err(SymmetriaError::InvalidSlot { slot, slot_count });
            }
        }
        if slot_a == slot_b {
            return Ok(SwapOutcome::Unchanged);
        }
        self.slots.swap(slot_a, slot_b);
        self.moves = self.moves.saturating_add(1);
        Ok(SwapOutcome::Swapped)
    }

    /// Restore the identity arrangement and clear the move counter.
    pub fn reset(&mut self) {
        self.slots.clone_from(&self.initial);
        self.moves = 0;
    }

    /// The permutation implied by the current arrangement: the crystal that
    /// started in slot `s` maps to the crystal now in slot `s`.
    #[must_use]
    pub fn current_permutation(&self) -> Permutation {
        let mapping: BTreeMap<CrystalId, CrystalId> = self
            .initial
            .iter()
            .copied()
            .zip(self.slots.iter().copied())
            .collect();
        let domain = self.initial.iter().copied().collect();
        // Slots hold a permutation of `initial` by construction, so parsing
        // against the same id set cannot fail.
        Permutation::parse(&mapping, &domain)
            .unwrap_or_else(|_| Permutation::identity(self.initial.iter().copied()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
