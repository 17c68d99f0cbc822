//! # Level Session
//!
//! State machine binding one loaded level to its arrangement and keyring.
//!
//! ```text
//! Unloaded ──load──▶ Loaded ──submit──▶ InProgress ──keyring full──▶ Completed
//!     ▲                 │                   │                           │
//!     └─────────────────┴───── load_level (any state) ──────────────────┘
//! ```
//!
//! The session is the only writer of arrangement, keyring and event log.
//! Validation is delegated to [`PermutationValidator`] and never mutates
//! anything; a rejected submission only appends an `invalid_attempt` event.

use crate::arrangement::{ArrangementState, SwapOutcome};
use crate::catalog::LevelCatalog;
use crate::events::{Event, EventBatch, EventLog};
use crate::export::level_fingerprint;
use crate::graph::GraphModel;
use crate::keyring::{Keyring, KeyringSnapshot, RecordOutcome};
use crate::permutation::Permutation;
use crate::progress::ProgressMap;
use crate::subgroup::SubgroupAnalyzer;
use crate::validator::{PermutationValidator, RejectionReason};
use crate::{Color, CrystalId, LevelId, SymmetriaError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Lifecycle state of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Unloaded,
    Loaded,
    InProgress,
    Completed,
}

/// Result of a submission that reached the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Submission {
    /// A new automorphism entered the keyring.
    Recorded {
        permutation: Permutation,
        found_count: usize,
        total: usize,
    },
    /// Valid, but already in the keyring.
    AlreadyKnown {
        permutation: Permutation,
        found_count: usize,
        total: usize,
    },
    /// Not an automorphism of the level.
    Rejected {
        reason: RejectionReason,
        detail: String,
    },
}

impl Submission {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}

/// Per-level mutable state. Replaced wholesale by `load_level`.
#[derive(Debug, Clone)]
struct ActiveLevel {
    graph: Arc<GraphModel>,
    arrangement: ArrangementState,
    keyring: Keyring,
    state: LifecycleState,
    subgroup_emitted: bool,
    fingerprint: String,
}

impl ActiveLevel {
    fn new(graph: Arc<GraphModel>) -> Result<Self, SymmetriaError> {
        Ok(Self {
            arrangement: ArrangementState::new(&graph),
            keyring: Keyring::new(graph.expected_automorphism_count()),
            state: LifecycleState::Loaded,
            subgroup_emitted: false,
            fingerprint: level_fingerprint(&graph)?,
            graph,
        })
    }

    /// A first submission moves a fresh level to `InProgress`.
    fn start(&mut self) {
        if self.state == LifecycleState::Loaded {
            self.state = LifecycleState::InProgress;
        }
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// A crystal and the slot it currently occupies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    pub slot: usize,
    pub crystal: CrystalId,
    pub color: Color,
}

/// Serializable view of the loaded level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelSnapshot {
    pub level_id: LevelId,
    pub title: String,
    pub group_name: String,
    pub act: u8,
    pub requires_subgroup: bool,
    pub arrangement: Vec<SlotView>,
    pub edges: Vec<String>,
    pub moves: u64,
    pub keyring: KeyringSnapshot,
    pub subgroup_found: bool,
    pub fingerprint: String,
}

/// Serializable view of the whole session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub state: LifecycleState,
    pub level: Option<LevelSnapshot>,
    pub pending_events: usize,
}

// =============================================================================
// SESSION
// =============================================================================

/// One player session: a catalog, at most one active level, the event log and
/// the progress map.
#[derive(Debug, Clone)]
pub struct LevelSession {
    catalog: LevelCatalog,
    active: Option<ActiveLevel>,
    events: EventLog,
    progress: ProgressMap,
}

impl Default for LevelSession {
    fn default() -> Self {
        Self::new(LevelCatalog::builtin())
    }
}

impl LevelSession {
    /// Unloaded session over `catalog`.
    #[must_use]
    pub fn new(catalog: LevelCatalog) -> Self {
        let progress = ProgressMap::from_catalog(&catalog);
        Self {
            catalog,
            active: None,
            events: EventLog::new(),
            progress,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressMap {
        &self.progress
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.active
            .as_ref()
            .map_or(LifecycleState::Unloaded, |active| active.state)
    }

    /// Graph of the active level.
    #[must_use]
    pub fn graph(&self) -> Option<&Arc<GraphModel>> {
        self.active.as_ref().map(|active| &active.graph)
    }

    #[must_use]
    pub fn level_id(&self) -> Option<&LevelId> {
        self.graph().map(|graph| graph.level_id())
    }

    #[must_use]
    pub fn keyring(&self) -> Option<&Keyring> {
        self.active.as_ref().map(|active| &active.keyring)
    }

    #[must_use]
    pub fn arrangement(&self) -> Option<&ArrangementState> {
        self.active.as_ref().map(|active| &active.arrangement)
    }

    /// Load a level, discarding the previous one. An unknown id leaves the
    /// session untouched.
    pub fn load_level(&mut self, level_id: &LevelId) -> Result<&GraphModel, SymmetriaError> {
        let graph = self.catalog.get(level_id)?;
        let active = self.active.insert(ActiveLevel::new(graph)?);
        Ok(active.graph.as_ref())
    }

    /// Validate `mapping` and record it if it is a new automorphism.
    pub fn submit_permutation(
        &mut self,
        mapping: &BTreeMap<CrystalId, CrystalId>,
    ) -> Result<Submission, SymmetriaError> {
        let active = self.active.as_mut().ok_or(SymmetriaError::NoLevelLoaded)?;
        let level_id = active.graph.level_id().clone();

        let permutation = match PermutationValidator::validate(&active.graph, mapping) {
            Ok(permutation) => permutation,
            Err(rejection) => {
                active.start();
                self.emit(Event::InvalidAttempt {
                    level_id,
                    reason: rejection.reason,
                    detail: rejection.detail.clone(),
                });
                return Ok(Submission::Rejected {
                    reason: rejection.reason,
                    detail: rejection.detail,
                });
            }
        };

        // State only moves once the keyring has accepted the submission.
        let outcome = active.keyring.try_record(permutation.clone())?;
        active.start();
        let found_count = active.keyring.found_count();
        let total = active.keyring.total();
        if outcome == RecordOutcome::AlreadyKnown {
            return Ok(Submission::AlreadyKnown {
                permutation,
                found_count,
                total,
            });
        }

        let mut emitted = vec![Event::SymmetryFound {
            level_id: level_id.clone(),
            permutation: permutation.clone(),
            found_count,
            total,
        }];

        if active.graph.requires_subgroup() && !active.subgroup_emitted {
            let analyzer =
                SubgroupAnalyzer::new(active.graph.vertex_ids(), active.keyring.members());
            if analyzer.is_nontrivial_subgroup() {
                active.subgroup_emitted = true;
                emitted.push(Event::SubgroupFound {
                    level_id: level_id.clone(),
                    order: analyzer.order(),
                    members: analyzer.members().cloned().collect(),
                });
            }
        }

        if active.keyring.is_complete() && active.state != LifecycleState::Completed {
            active.state = LifecycleState::Completed;
            emitted.push(Event::LevelCompleted { level_id });
        }

        for event in emitted {
            self.emit(event);
        }
        Ok(Submission::Recorded {
            permutation,
            found_count,
            total,
        })
    }

    /// Submit the permutation implied by the current arrangement.
    pub fn submit_arrangement(&mut self) -> Result<Submission, SymmetriaError> {
        let arrangement = self
            .arrangement()
            .ok_or(SymmetriaError::NoLevelLoaded)?;
        let mapping: BTreeMap<CrystalId, CrystalId> =
            arrangement.current_permutation().iter().collect();
        self.submit_permutation(&mapping)
    }

    /// Swap two slots of the arrangement. Never validates.
    pub fn swap(&mut self, slot_a: usize, slot_b: usize) -> Result<SwapOutcome, SymmetriaError> {
        let active = self.active.as_mut().ok_or(SymmetriaError::NoLevelLoaded)?;
        active.arrangement.swap(slot_a, slot_b)
    }

    /// Restore the identity arrangement. The keyring is untouched.
    pub fn reset_arrangement(&mut self) -> Result<(), SymmetriaError> {
        let active = self.active.as_mut().ok_or(SymmetriaError::NoLevelLoaded)?;
        active.arrangement.reset();
        Ok(())
    }

    /// Append a protocol error to the event log.
    pub fn push_error(&mut self, kind: impl Into<String>, message: impl Into<String>) {
        self.emit(Event::Error {
            kind: kind.into(),
            message: message.into(),
        });
    }

    /// Current position of the event log, for [`Self::events_since`].
    #[must_use]
    pub fn event_cursor(&self) -> u64 {
        self.events.cursor()
    }

    /// Events emitted after `cursor`, without draining them.
    #[must_use]
    pub fn events_since(&self, cursor: u64) -> Vec<Event> {
        self.events.since(cursor)
    }

    /// Remove all pending events.
    pub fn drain_events(&mut self) -> EventBatch {
        self.events.drain()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state(),
            level: self.active.as_ref().map(level_snapshot),
            pending_events: self.events.len(),
        }
    }

    fn emit(&mut self, event: Event) {
        self.progress.observe(&event);
        self.events.push(event);
    }
}

fn level_snapshot(active: &ActiveLevel) -> LevelSnapshot {
    let graph = &active.graph;
    let arrangement = active
        .arrangement
        .slots()
        .iter()
        .enumerate()
        .map(|(slot, &crystal)| SlotView {
            slot,
            crystal,
            color: graph.color_of(crystal).cloned().unwrap_or_default(),
        })
        .collect();
    LevelSnapshot {
        level_id: graph.level_id().clone(),
        title: graph.title().to_string(),
        group_name: graph.group_name().to_string(),
        act: graph.act(),
        requires_subgroup: graph.requires_subgroup(),
        arrangement,
        edges: graph.edges().map(ToString::to_string).collect(),
        moves: active.arrangement.moves(),
        keyring: active.keyring.snapshot(),
        subgroup_found: active.subgroup_emitted,
        fingerprint: active.fingerprint.clone(),
    }
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

    fn loaded(id: &str) -> LevelSession {
        let mut session = LevelSession::default();
        session.load_level(&LevelId::new(id)).expect("builtin level");
        session
    }

    #[test]
    fn starts_unloaded() {
        let mut session = LevelSession::default();
        assert_eq!(session.state(), LifecycleState::Unloaded);
        assert!(matches!(
            session.swap(0, 1),
            Err(SymmetriaError::NoLevelLoaded)
        ));
        assert!(matches!(
            session.submit_arrangement(),
            Err(SymmetriaError::NoLevelLoaded)
        ));
        assert!(session.snapshot().level.is_none());
    }

    #[test]
    fn unknown_level_keeps_state() {
        let mut session = loaded("act1_level01");
        session.swap(0, 1).expect("in range");
        let result = session.load_level(&LevelId::new("missing"));
        assert!(matches!(result, Err(SymmetriaError::LevelNotFound(_))));
        assert_eq!(session.level_id(), Some(&LevelId::new("act1_level01")));
        assert_eq!(session.arrangement().map(ArrangementState::moves), Some(1));
    }

    #[test]
    fn first_submission_moves_to_in_progress() {
        let mut session = loaded("act1_level03");
        assert_eq!(session.state(), LifecycleState::Loaded);
        session
            .submit_permutation(&mapping(&[(0, 0), (1, 1)]))
            .expect("loaded");
        assert_eq!(session.state(), LifecycleState::InProgress);
    }

    #[test]
    fn refused_recording_leaves_state_alone() {
        let undercounted = GraphModel::builder("undercounted")
            .expected_automorphisms(1)
            .crystal(0, "red")
            .crystal(1, "red")
            .edge(0, 1)
            .build()
            .expect("valid");
        let mut catalog = LevelCatalog::new();
        catalog.insert_model(undercounted);
        let mut session = LevelSession::new(catalog);
        session
            .load_level(&LevelId::new("undercounted"))
            .expect("inserted");

        session
            .submit_permutation(&mapping(&[(0, 1), (1, 0)]))
            .expect("first fits");
        assert_eq!(session.state(), LifecycleState::Completed);

        let refused = session.submit_permutation(&mapping(&[(0, 0), (1, 1)]));
        assert!(matches!(refused, Err(SymmetriaError::InvariantViolation(_))));
        assert_eq!(session.state(), LifecycleState::Completed);
        assert_eq!(session.keyring().map(Keyring::found_count), Some(1));
    }

    #[test]
    fn identity_twice_records_once() {
        let mut session = loaded("act1_level03");
        let identity = mapping(&[(0, 0), (1, 1), (2, 2), (3, 3)]);
        let first = session.submit_permutation(&identity).expect("loaded");
        let second = session.submit_permutation(&identity).expect("loaded");
        assert!(matches!(first, Submission::Recorded { found_count: 1, .. }));
        assert!(matches!(second, Submission::AlreadyKnown { found_count: 1, .. }));
        assert_eq!(session.drain_events().events.len(), 1);
    }

    #[test]
    fn completion_fires_once_and_is_stable() {
        let mut session = loaded("act1_level02");
        session
            .submit_permutation(&mapping(&[(0, 0), (1, 1), (2, 2)]))
            .expect("loaded");
        session
            .submit_permutation(&mapping(&[(0, 2), (1, 1), (2, 0)]))
            .expect("loaded");
        assert_eq!(session.state(), LifecycleState::Completed);

        session
            .submit_permutation(&mapping(&[(0, 1), (1, 0), (2, 2)]))
            .expect("loaded");
        assert_eq!(session.state(), LifecycleState::Completed);

        let kinds: Vec<&str> = session
            .drain_events()
            .events
            .iter()
            .map(Event::kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                "symmetry_found",
                "symmetry_found",
                "level_completed",
                "invalid_attempt"
            ]
        );
        assert!(
            session
                .progress()
                .get(&LevelId::new("act1_level02"))
                .expect("present")
                .complete
        );
    }

    #[test]
    fn submit_arrangement_uses_current_slots() {
        let mut session = loaded("act1_level02");
        session.swap(0, 2).expect("in range");
        let result = session.submit_arrangement().expect("loaded");
        assert!(matches!(result, Submission::Recorded { .. }));
    }

    #[test]
    fn reset_keeps_keyring() {
        let mut session = loaded("act1_level02");
        session.swap(0, 2).expect("in range");
        session.submit_arrangement().expect("loaded");
        session.reset_arrangement().expect("loaded");
        assert_eq!(session.arrangement().map(ArrangementState::is_identity), Some(true));
        assert_eq!(session.keyring().map(Keyring::found_count), Some(1));
    }

    #[test]
    fn reload_clears_keyring_but_not_progress() {
        let mut session = loaded("act1_level02");
        session
            .submit_permutation(&mapping(&[(0, 0), (1, 1), (2, 2)]))
            .expect("loaded");
        session
            .load_level(&LevelId::new("act1_level02"))
            .expect("builtin");
        assert_eq!(session.state(), LifecycleState::Loaded);
        assert_eq!(session.keyring().map(Keyring::found_count), Some(0));
        let progress = session
            .progress()
            .get(&LevelId::new("act1_level02"))
            .expect("present");
        assert_eq!(progress.found, 1);
    }

    #[test]
    fn subgroup_found_fires_once_on_subgroup_levels() {
        let mut session = loaded("act2_level01");
        // identity alone is trivial
        session
            .submit_permutation(&mapping(&[(0, 0), (1, 1), (2, 2)]))
            .expect("loaded");
        // a transposition closes {id, (0 1)}
        session
            .submit_permutation(&mapping(&[(0, 1), (1, 0), (2, 2)]))
            .expect("loaded");
        // another transposition breaks closure, no second event
        session
            .submit_permutation(&mapping(&[(0, 2), (1, 1), (2, 0)]))
            .expect("loaded");

        let events = session.drain_events().events;
        let subgroup: Vec<&Event> = events
            .iter()
            .filter(|e| e.kind() == "subgroup_found")
            .collect();
        assert_eq!(subgroup.len(), 1);
        assert!(matches!(subgroup[0], Event::SubgroupFound { order: 2, .. }));
        assert_eq!(
            session.snapshot().level.map(|l| l.subgroup_found),
            Some(true)
        );
    }

    #[test]
    fn plain_levels_never_emit_subgroup() {
        let mut session = loaded("act1_level02");
        session
            .submit_permutation(&mapping(&[(0, 2), (1, 1), (2, 0)]))
            .expect("loaded");
        let events = session.drain_events().events;
        assert!(events.iter().all(|e| e.kind() != "subgroup_found"));
    }

    #[test]
    fn events_since_sees_only_new_events() {
        let mut session = loaded("act1_level02");
        session.push_error("InvalidArgs", "first");
        let cursor = session.event_cursor();
        session.push_error("InvalidArgs", "second");
        let fresh = session.events_since(cursor);
        assert_eq!(fresh.len(), 1);
        assert_eq!(session.snapshot().pending_events, 2);
    }

    #[test]
    fn snapshot_reports_slots_and_colors() {
        let session = loaded("act1_level02");
        let level = session.snapshot().level.expect("loaded");
        assert_eq!(level.arrangement.len(), 3);
        assert_eq!(level.arrangement[1].color, Color::new("gold"));
        assert_eq!(level.keyring.total, 2);
        assert!(!level.fingerprint.is_empty());
    }
}
