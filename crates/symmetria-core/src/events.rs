//! # Events
//!
//! Output-only event log of the engine.
//!
//! The session appends events; the bridge drains them. The engine never reads
//! back what it produced. The log is bounded by `MAX_PENDING_EVENTS`: when a
//! client stops draining, the oldest events are dropped and counted so the
//! next drain can report the gap.

use crate::permutation::Permutation;
use crate::primitives::MAX_PENDING_EVENTS;
use crate::validator::RejectionReason;
use crate::LevelId;
use serde::Serialize;
use std::collections::VecDeque;

/// A tagged engine event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A new automorphism entered the keyring.
    SymmetryFound {
        level_id: LevelId,
        permutation: Permutation,
        found_count: usize,
        total: usize,
    },
    /// A submission was rejected.
    InvalidAttempt {
        level_id: LevelId,
        reason: RejectionReason,
        detail: String,
    },
    /// The keyring reached its total. Emitted once per loaded level.
    LevelCompleted { level_id: LevelId },
    /// The discovered keys form a closed non-trivial subgroup. Emitted once
    /// per loaded level, only on levels that ask for it.
    SubgroupFound {
        level_id: LevelId,
        order: usize,
        members: Vec<Permutation>,
    },
    /// A command failed with a protocol error.
    Error { kind: String, message: String },
}

impl Event {
    /// Wire tag of the event.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SymmetryFound { .. } => "symmetry_found",
            Self::InvalidAttempt { .. } => "invalid_attempt",
            Self::LevelCompleted { .. } => "level_completed",
            Self::SubgroupFound { .. } => "subgroup_found",
            Self::Error { .. } => "error",
        }
    }
}

/// Result of draining the log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventBatch {
    pub events: Vec<Event>,
    /// Events lost to the pending cap since the previous drain.
    pub dropped: u64,
}

/// Bounded FIFO of pending events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pending: VecDeque<Event>,
    dropped: u64,
    emitted: u64,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, evicting the oldest one when full.
    pub fn push(&mut self, event: Event) {
        if self.pending.len() >= MAX_PENDING_EVENTS {
            self.pending.pop_front();
            self.dropped = self.dropped.saturating_add(1);
        }
        self.pending.push_back(event);
        self.emitted = self.emitted.saturating_add(1);
    }

    /// Total number of events ever pushed. Used as a cursor by [`Self::since`].
    #[must_use]
    pub fn cursor(&self) -> u64 {
        self.emitted
    }

    /// Pending events pushed after `cursor` was taken, oldest first.
    #[must_use]
    pub fn since(&self, cursor: u64) -> Vec<Event> {
        let fresh = self.emitted.saturating_sub(cursor) as usize;
        let skip = self.pending.len().saturating_sub(fresh);
        self.pending.iter().skip(skip).cloned().collect()
    }

    /// Remove and return all pending events, oldest first.
    pub fn drain(&mut self) -> EventBatch {
        EventBatch {
            events: self.pending.drain(..).collect(),
            dropped: std::mem::take(&mut self.dropped),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(id: &str) -> Event {
        Event::LevelCompleted {
            level_id: LevelId::new(id),
        }
    }

    #[test]
    fn drain_empties_queue_in_order() {
        let mut log = EventLog::new();
        log.push(completed("a"));
        log.push(completed("b"));

        let batch = log.drain();
        assert_eq!(batch.events, vec![completed("a"), completed("b")]);
        assert_eq!(batch.dropped, 0);
        assert!(log.is_empty());
        assert!(log.drain().events.is_empty());
    }

    #[test]
    fn since_returns_only_new_events() {
        let mut log = EventLog::new();
        log.push(completed("a"));
        let cursor = log.cursor();
        log.push(completed("b"));
        assert_eq!(log.since(cursor), vec![completed("b")]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut log = EventLog::new();
        for i in 0..(MAX_PENDING_EVENTS + 3) {
            log.push(completed(&i.to_string()));
        }
        assert_eq!(log.len(), MAX_PENDING_EVENTS);
        let batch = log.drain();
        assert_eq!(batch.dropped, 3);
        assert_eq!(batch.events.first(), Some(&completed("3")));
    }

    #[test]
    fn kind_matches_wire_tag() {
        assert_eq!(completed("x").kind(), "level_completed");
        let err = Event::Error {
            kind: "InvalidSlot".to_string(),
            message: "bad".to_string(),
        };
        assert_eq!(err.kind(), "error");
    }
}
