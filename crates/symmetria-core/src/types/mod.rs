//! # Core Type Definitions
//!
//! This module contains the value types shared by every part of the engine:
//! - Crystal and level identifiers (`CrystalId`, `LevelId`, `Color`)
//! - Graph building blocks (`Crystal`, `Edge`, `EdgeKind`)
//! - Error types (`SymmetriaError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a crystal (graph vertex), unique within one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrystalId(pub u32);

impl fmt::Display for CrystalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a level in the catalog (e.g. `"act1_level03"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(pub String);

impl LevelId {
    /// Create a level id from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Color label of a crystal. Two crystals are interchangeable only if their
/// colors are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub String);

impl Color {
    /// Create a color label from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// CRYSTAL
// =============================================================================

/// A crystal: one vertex of a level graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crystal {
    pub id: CrystalId,
    pub color: Color,
    /// Slot the crystal occupies in the identity arrangement.
    pub initial_slot: usize,
}

impl Crystal {
    /// Create a new crystal.
    #[must_use]
    pub fn new(id: CrystalId, color: Color, initial_slot: usize) -> Self {
        Self {
            id,
            color,
            initial_slot,
        }
    }
}

// =============================================================================
// EDGE
// =============================================================================

/// How an edge connects its two endpoints.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Unordered connection. Endpoints are stored as `(min, max)`.
    #[default]
    Undirected,
    /// Arrow from `a` to `b`.
    Directed,
}

/// An edge between two distinct crystals.
///
/// Construct through [`Edge::undirected`] or [`Edge::directed`] so that
/// undirected endpoints are always normalized; equality and ordering then
/// coincide with set semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub a: CrystalId,
    pub b: CrystalId,
    pub kind: EdgeKind,
}

impl Edge {
    /// Undirected edge `{u, v}`.
    #[must_use]
    pub fn undirected(u: CrystalId, v: CrystalId) -> Self {
        let (a, b) = if u <= v { (u, v) } else { (v, u) };
        Self {
            a,
            b,
            kind: EdgeKind::Undirected,
        }
    }

    /// Directed edge `from -> to`.
    #[must_use]
    pub fn directed(from: CrystalId, to: CrystalId) -> Self {
        Self {
            a: from,
            b: to,
            kind: EdgeKind::Directed,
        }
    }

    /// Build an edge of the given kind.
    #[must_use]
    pub fn with_kind(a: CrystalId, b: CrystalId, kind: EdgeKind) -> Self {
        match kind {
            EdgeKind::Undirected => Self::undirected(a, b),
            EdgeKind::Directed => Self::directed(a, b),
        }
    }

    /// True if both endpoints are the same crystal.
    #[must_use]
    pub fn is_loop(&self) -> bool {
        self.a == self.b
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EdgeKind::Undirected => write!(f, "{}-{}", self.a, self.b),
            EdgeKind::Directed => write!(f, "{}->{}", self.a, self.b),
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Symmetria engine.
///
/// Game-semantic rejections (a submission that is not an automorphism) are
/// NOT errors; they are reported as `invalid_attempt` events.
#[derive(Debug, Error)]
pub enum SymmetriaError {
    /// The requested level id is not in the catalog.
    #[error("Level not found: {0}")]
    LevelNotFound(LevelId),

    /// A slot index outside `[0, slot_count)`.
    #[error("Invalid slot {slot} (level has {slot_count} slots)")]
    InvalidSlot { slot: usize, slot_count: usize },

    /// An operation that needs an active level was called on an empty session.
    #[error("No level loaded")]
    NoLevelLoaded,

    /// A level definition is structurally invalid.
    #[error("Invalid level {level}: {reason}")]
    InvalidLevel { level: LevelId, reason: String },

    /// Internal consistency failure. Indicates an engine bug, never user input.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Brute-force enumeration refused because the graph is too large.
    #[error("Enumeration limit exceeded: {crystals} crystals (max {max})")]
    EnumerationLimit { crystals: usize, max: usize },

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
