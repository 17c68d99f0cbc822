//! # symmetria-core
//!
//! The deterministic symmetry engine for Symmetria - THE LOGIC.
//!
//! Each level is a colored graph of crystals. The player proposes relabelings
//! of the crystals; this crate decides whether a relabeling is a graph
//! automorphism, keeps the set of distinct automorphisms found so far, decides
//! level completion and, on advanced levels, whether the found set is closed
//! under composition and inversion.
//!
//! ## Architectural Constraints
//!
//! The core:
//! - Owns all game state; the app crates only translate commands into calls
//! - Never initiates interaction; it only reacts to explicit calls
//! - Reports through return values and an output-only event log, never logs
//! - Has NO async, NO network dependencies (pure Rust)
//! - Uses `BTreeMap`/`BTreeSet` only, so every iteration order is stable

// =============================================================================
// MODULES
// =============================================================================

pub mod arrangement;
pub mod catalog;
pub mod events;
pub mod export;
pub mod graph;
pub mod keyring;
pub mod permutation;
pub mod primitives;
pub mod progress;
pub mod session;
pub mod subgroup;
pub mod types;
pub mod validator;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Color, Crystal, CrystalId, Edge, EdgeKind, LevelId, SymmetriaError};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use arrangement::{ArrangementState, SwapOutcome};
pub use catalog::{CrystalDef, EdgeDef, LevelCatalog, LevelDefinition};
pub use events::{Event, EventBatch, EventLog};
pub use export::{
    CanonicalHeader, CanonicalLevel, canonical_checksum, export_canonical, level_fingerprint,
};
pub use graph::{GraphModel, GraphModelBuilder};
pub use keyring::{Keyring, KeyringSnapshot, RecordOutcome};
pub use permutation::{BijectionError, Permutation, PermutationSignature};
pub use progress::{LevelProgress, ProgressMap};
pub use session::{
    LevelSession, LevelSnapshot, LifecycleState, SessionSnapshot, SlotView, Submission,
};
pub use subgroup::{ClosureFailure, SubgroupAnalyzer};
pub use validator::{
    LevelVerification, PermutationValidator, Rejection, RejectionReason,
    enumerate_automorphisms, verify_level,
};
