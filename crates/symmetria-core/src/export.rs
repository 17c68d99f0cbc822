//! # Canonical Level Encoding
//!
//! Deterministic, bit-exact serialization of a [`GraphModel`].
//!
//! The canonical form sorts crystals by id and edges by (kind, endpoints), so
//! two levels that describe the same graph encode to the same bytes no matter
//! how their definitions were written. The encoding is what a level
//! fingerprint (reported in `get_state` and by the CLI) is computed over.
//!
//! Format:
//! ```text
//! [header_len: u32 LE] [CanonicalHeader (postcard)] [CanonicalLevel (postcard)]
//! ```

use crate::graph::GraphModel;
use crate::primitives::{FORMAT_VERSION, MAGIC_BYTES};
use crate::{EdgeKind, SymmetriaError};
use serde::Serialize;

// =============================================================================
// CANONICAL FORMAT
// =============================================================================

/// Header of the canonical encoding.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CanonicalHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl Default for CanonicalHeader {
    fn default() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }
}

/// A crystal in canonical form, sorted by id.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct CanonicalCrystal {
    pub id: u32,
    pub color: String,
    pub initial_slot: u64,
}

/// An edge in canonical form, sorted by (directed, a, b).
#[derive(Debug, Clone, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct CanonicalEdge {
    pub directed: bool,
    pub a: u32,
    pub b: u32,
}

/// A whole level in canonical form.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CanonicalLevel {
    pub level_id: String,
    pub title: String,
    pub group_name: String,
    pub act: u8,
    pub expected_automorphism_count: u64,
    pub requires_subgroup: bool,
    pub crystals: Vec<CanonicalCrystal>,
    pub edges: Vec<CanonicalEdge>,
}

impl CanonicalLevel {
    /// Canonical form of `graph`.
    #[must_use]
    pub fn from_model(graph: &GraphModel) -> Self {
        let mut crystals: Vec<CanonicalCrystal> = graph
            .crystals()
            .map(|c| CanonicalCrystal {
                id: c.id.0,
                color: c.color.as_str().to_string(),
                initial_slot: c.initial_slot as u64,
            })
            .collect();
        crystals.sort();

        let mut edges: Vec<CanonicalEdge> = graph
            .edges()
            .map(|e| CanonicalEdge {
                directed: e.kind == EdgeKind::Directed,
                a: e.a.0,
                b: e.b.0,
            })
            .collect();
        edges.sort();

        Self {
            level_id: graph.level_id().as_str().to_string(),
            title: graph.title().to_string(),
            group_name: graph.group_name().to_string(),
            act: graph.act(),
            expected_automorphism_count: graph.expected_automorphism_count() as u64,
            requires_subgroup: graph.requires_subgroup(),
            crystals,
            edges,
        }
    }
}

// =============================================================================
// EXPORT FUNCTIONS
// =============================================================================

/// Encode a level in canonical postcard format.
pub fn export_canonical(graph: &GraphModel) -> Result<Vec<u8>, SymmetriaError> {
    let canonical = CanonicalLevel::from_model(graph);

    let header_bytes = postcard::to_allocvec(&CanonicalHeader::default())
        .map_err(|e| SymmetriaError::SerializationError(format!("Header: {}", e)))?;
    let data_bytes = postcard::to_allocvec(&canonical)
        .map_err(|e| SymmetriaError::SerializationError(format!("Data: {}", e)))?;

    let mut result = Vec::with_capacity(4 + header_bytes.len() + data_bytes.len());
    result.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
    result.extend_from_slice(&header_bytes);
    result.extend_from_slice(&data_bytes);
    Ok(result)
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a checksum of the canonical encoding.
///
/// Order-sensitive, so repeated or reordered bytes change the result, but not
/// collision resistant. Use [`level_fingerprint`] with `crypto-hash` when a
/// digest has to resist deliberate collisions.
pub fn canonical_checksum(graph: &GraphModel) -> Result<u64, SymmetriaError> {
    let bytes = export_canonical(graph)?;
    Ok(bytes.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    }))
}

/// Fingerprint of a level's canonical encoding.
///
/// With `crypto-hash` this is the BLAKE3 digest (64 hex chars). Without it,
/// it is the non-cryptographic [`canonical_checksum`] (16 hex chars).
pub fn level_fingerprint(graph: &GraphModel) -> Result<String, SymmetriaError> {
    #[cfg(feature = "crypto-hash")]
    {
        let data = export_canonical(graph)?;
        Ok(blake3::hash(&data).to_hex().to_string())
    }
    #[cfg(not(feature = "crypto-hash"))]
    {
        Ok(format!("{:016x}", canonical_checksum(graph)?))
    }
}

// =============================================================================
// TESTS
// =============================================================================
