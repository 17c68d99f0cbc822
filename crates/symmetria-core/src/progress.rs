//! # Progress Map
//!
//! In-memory, per-level progress overlay for the level-select map.
//!
//! The map is fed by the events the session emits and outlives level loads,
//! so a level that was completed once stays completed on the map. Nothing is
//! written to disk; a new process starts with an empty map.

use crate::catalog::LevelCatalog;
use crate::events::Event;
use crate::LevelId;
use serde::Serialize;
use std::collections::BTreeMap;

/// Progress of one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelProgress {
    pub level_id: LevelId,
    pub title: String,
    pub act: u8,
    /// Best keyring size reached in any session of this level.
    pub found: usize,
    pub total: usize,
    pub complete: bool,
    pub requires_subgroup: bool,
    pub subgroup_found: bool,
}

/// Progress of every catalog level, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct ProgressMap {
    entries: BTreeMap<LevelId, LevelProgress>,
    order: Vec<LevelId>,
}

impl ProgressMap {
    /// Empty progress for every level in `catalog`.
    #[must_use]
    pub fn from_catalog(catalog: &LevelCatalog) -> Self {
        let mut map = Self::default();
        for level in catalog.iter() {
            let id = level.level_id().clone();
            map.entries.insert(
                id.clone(),
                LevelProgress {
                    level_id: id.clone(),
                    title: level.title().to_string(),
                    act: level.act(),
                    found: 0,
                    total: level.expected_automorphism_count(),
                    complete: false,
                    requires_subgroup: level.requires_subgroup(),
                    subgroup_found: false,
                },
            );
            map.order.push(id);
        }
        map
    }

    /// Fold one event into the map. Events for unknown levels are ignored.
    pub fn observe(&mut self, event: &Event) {
        match event {
            Event::SymmetryFound {
                level_id,
                found_count,
                total,
                ..
            } => {
                if let Some(entry) = self.entries.get_mut(level_id) {
                    entry.found = entry.found.max(*found_count);
                    entry.total = *total;
                }
            }
            Event::LevelCompleted { level_id } => {
                if let Some(entry) = self.entries.get_mut(level_id) {
                    entry.complete = true;
                }
            }
            Event::SubgroupFound { level_id, .. } => {
                if let Some(entry) = self.entries.get_mut(level_id) {
                    entry.subgroup_found = true;
                }
            }
            Event::InvalidAttempt { .. } | Event::Error { .. } => {}
        }
    }

    #[must_use]
    pub fn get(&self, id: &LevelId) -> Option<&LevelProgress> {
        self.entries.get(id)
    }

    /// Entries in catalog order.
    #[must_use]
    pub fn entries(&self) -> Vec<LevelProgress> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .cloned()
            .collect()
    }

    /// Number of completed levels.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.entries.values().filter(|e| e.complete).count()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_for_every_level() {
        let catalog = LevelCatalog::builtin();
        let map = ProgressMap::from_catalog(&catalog);
        assert_eq!(map.entries().len(), catalog.len());
        assert_eq!(map.completed_count(), 0);
        let first = map.get(&LevelId::new("act1_level01")).expect("present");
        assert_eq!(first.total, 3);
    }

    #[test]
    fn completion_is_sticky() {
        let mut map = ProgressMap::from_catalog(&LevelCatalog::builtin());
        let id = LevelId::new("act1_level02");
        map.observe(&Event::LevelCompleted {
            level_id: id.clone(),
        });
        assert!(map.get(&id).expect("present").complete);
        assert_eq!(map.completed_count(), 1);
    }

    #[test]
    fn found_keeps_best_count() {
        let catalog = LevelCatalog::builtin();
        let mut map = ProgressMap::from_catalog(&catalog);
        let id = LevelId::new("act1_level03");
        let graph = catalog.get(&id).expect("present");
        let identity = crate::Permutation::identity(graph.vertex_ids());
        for found_count in [3, 1] {
            map.observe(&Event::SymmetryFound {
                level_id: id.clone(),
                permutation: identity.clone(),
                found_count,
                total: 8,
            });
        }
        assert_eq!(map.get(&id).expect("present").found, 3);
    }

    #[test]
    fn unknown_levels_are_ignored() {
        let mut map = ProgressMap::from_catalog(&LevelCatalog::builtin());
        map.observe(&Event::LevelCompleted {
            level_id: LevelId::new("elsewhere"),
        });
        assert_eq!(map.completed_count(), 0);
    }
}
