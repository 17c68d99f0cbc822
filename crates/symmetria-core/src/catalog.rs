//! # Level Catalog
//!
//! The set of levels a session can load.
//!
//! Levels are described by [`LevelDefinition`], a serde-friendly record that
//! the app layer reads from JSON files. The catalog validates each definition
//! into an immutable [`GraphModel`] once, at insertion, and hands out shared
//! `Arc<GraphModel>` references afterwards.
//!
//! The built-in catalog covers two acts: act 1 asks for the full automorphism
//! group, act 2 additionally asks for a closed non-trivial subgroup.

use crate::graph::GraphModel;
use crate::primitives::MAX_ENUMERATION_CRYSTALS;
use crate::validator::verify_level;
use crate::{EdgeKind, LevelId, SymmetriaError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// LEVEL DEFINITION
// =============================================================================

/// A crystal as written in a level file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrystalDef {
    pub id: u32,
    pub color: String,
    /// Defaults to the crystal's position in the list.
    #[serde(default)]
    pub initial_slot: Option<usize>,
}

/// An edge as written in a level file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDef {
    pub a: u32,
    pub b: u32,
    #[serde(default)]
    pub directed: bool,
}

fn default_act() -> u8 {
    1
}

/// Serializable description of one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub level_id: String,
    pub title: String,
    #[serde(default)]
    pub group_name: String,
    pub expected_automorphism_count: usize,
    #[serde(default)]
    pub requires_subgroup: bool,
    #[serde(default = "default_act")]
    pub act: u8,
    pub crystals: Vec<CrystalDef>,
    #[serde(default)]
    pub edges: Vec<EdgeDef>,
}

impl LevelDefinition {
    /// Validate into a graph model.
    pub fn to_model(&self) -> Result<GraphModel, SymmetriaError> {
        let mut builder = GraphModel::builder(self.level_id.clone())
            .title(self.title.clone())
            .group_name(self.group_name.clone())
            .act(self.act)
            .expected_automorphisms(self.expected_automorphism_count)
            .requires_subgroup(self.requires_subgroup);
        for (position, crystal) in self.crystals.iter().enumerate() {
            let slot = crystal.initial_slot.unwrap_or(position);
            builder = builder.crystal_at(crystal.id, &crystal.color, slot);
        }
        for edge in &self.edges {
            let kind = if edge.directed {
                EdgeKind::Directed
            } else {
                EdgeKind::Undirected
            };
            builder = builder.edge_of_kind(edge.a, edge.b, kind);
        }
        builder.build()
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// Ordered collection of validated levels.
#[derive(Debug, Clone, Default)]
pub struct LevelCatalog {
    levels: BTreeMap<LevelId, Arc<GraphModel>>,
    /// Insertion order, used for listings and the progression map.
    order: Vec<LevelId>,
}

impl LevelCatalog {
    /// Empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the built-in levels.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for model in builtin_levels() {
            catalog.insert_model(model);
        }
        catalog
    }

    /// Validate and add a definition. A level with the same id is replaced
    /// in place (keeping its position).
    ///
    /// Levels small enough to enumerate must declare their true automorphism
    /// count; a wrong count would make the level complete early or never.
    pub fn insert(&mut self, definition: &LevelDefinition) -> Result<LevelId, SymmetriaError> {
        let model = definition.to_model()?;
        check_declared_count(&model)?;
        let id = model.level_id().clone();
        self.insert_model(model);
        Ok(id)
    }

    /// Add a model without the enumeration check.
    pub(crate) fn insert_model(&mut self, model: GraphModel) {
        let id = model.level_id().clone();
        if self.levels.insert(id.clone(), Arc::new(model)).is_none() {
            self.order.push(id);
        }
    }

    /// Look up a level by id.
    pub fn get(&self, id: &LevelId) -> Result<Arc<GraphModel>, SymmetriaError> {
        self.levels
            .get(id)
            .cloned()
            .ok_or_else(|| SymmetriaError::LevelNotFound(id.clone()))
    }

    #[must_use]
    pub fn contains(&self, id: &LevelId) -> bool {
        self.levels.contains_key(id)
    }

    /// Levels in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<GraphModel>> {
        self.order.iter().filter_map(|id| self.levels.get(id))
    }

    /// Level ids in catalog order.
    #[must_use]
    pub fn ids(&self) -> &[LevelId] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn check_declared_count(model: &GraphModel) -> Result<(), SymmetriaError> {
    if model.crystal_count() > MAX_ENUMERATION_CRYSTALS {
        return Ok(());
    }
    let verification = verify_level(model)?;
    if verification.is_consistent() {
        return Ok(());
    }
    Err(SymmetriaError::InvalidLevel {
        level: model.level_id().clone(),
        reason: format!(
            "declares {} automorphisms but the graph has {}",
            verification.expected, verification.actual
        ),
    })
}

// =============================================================================
// BUILT-IN LEVELS
// =============================================================================

/// Built-in level graphs. Every expected count here is checked against
/// brute-force enumeration in the test suite.
fn builtin_levels() -> Vec<GraphModel> {
    let specs = [
        // Act 1: find every symmetry.
        GraphModel::builder("act1_level01")
            .title("Spinning Triangle")
            .group_name("Z3")
            .expected_automorphisms(3)
            .crystal(0, "red")
            .crystal(1, "red")
            .crystal(2, "red")
            .arc(0, 1)
            .arc(1, 2)
            .arc(2, 0),
        GraphModel::builder("act1_level02")
            .title("Mirror Line")
            .group_name("Z2")
            .expected_automorphisms(2)
            .crystal(0, "green")
            .crystal(1, "gold")
            .crystal(2, "green")
            .edge(0, 1)
            .edge(1, 2),
        GraphModel::builder("act1_level03")
            .title("Square")
            .group_name("D4")
            .expected_automorphisms(8)
            .crystal(0, "blue")
            .crystal(1, "blue")
            .crystal(2, "blue")
            .crystal(3, "blue")
            .edge(0, 1)
            .edge(1, 2)
            .edge(2, 3)
            .edge(3, 0),
        GraphModel::builder("act1_level04")
            .title("Whirlpool")
            .group_name("Z4")
            .expected_automorphisms(4)
            .crystal(0, "blue")
            .crystal(1, "blue")
            .crystal(2, "blue")
            .crystal(3, "blue")
            .arc(0, 1)
            .arc(1, 2)
            .arc(2, 3)
            .arc(3, 0),
        GraphModel::builder("act1_level05")
            .title("Two Tones")
            .group_name("Z2 x Z2")
            .expected_automorphisms(4)
            .crystal(0, "red")
            .crystal(1, "blue")
            .crystal(2, "red")
            .crystal(3, "blue")
            .edge(0, 1)
            .edge(1, 2)
            .edge(2, 3)
            .edge(3, 0),
        GraphModel::builder("act1_level06")
            .title("Star")
            .group_name("S3")
            .expected_automorphisms(6)
            .crystal(0, "gold")
            .crystal(1, "green")
            .crystal(2, "green")
            .crystal(3, "green")
            .edge(0, 1)
            .edge(0, 2)
            .edge(0, 3),
        // Act 2: a closed subgroup is its own goal.
        GraphModel::builder("act2_level01")
            .title("Triangle Court")
            .group_name("S3")
            .act(2)
            .requires_subgroup(true)
            .expected_automorphisms(6)
            .crystal(0, "red")
            .crystal(1, "red")
            .crystal(2, "red")
            .edge(0, 1)
            .edge(1, 2)
            .edge(2, 0),
        GraphModel::builder("act2_level02")
            .title("Square Court")
            .group_name("D4")
            .act(2)
            .requires_subgroup(true)
            .expected_automorphisms(8)
            .crystal(0, "blue")
            .crystal(1, "blue")
            .crystal(2, "blue")
            .crystal(3, "blue")
            .edge(0, 1)
            .edge(1, 2)
            .edge(2, 3)
            .edge(3, 0),
        GraphModel::builder("act2_level03")
            .title("Hexagon")
            .group_name("D6")
            .act(2)
            .requires_subgroup(true)
            .expected_automorphisms(12)
            .crystal(0, "violet")
            .crystal(1, "violet")
            .crystal(2, "violet")
            .crystal(3, "violet")
            .crystal(4, "violet")
            .crystal(5, "violet")
            .edge(0, 1)
            .edge(1, 2)
            .edge(2, 3)
            .edge(3, 4)
            .edge(4, 5)
            .edge(5, 0),
    ];
    // Built-in definitions are static; a failure here is caught by the tests.
    specs
        .into_iter()
        .filter_map(|builder| builder.build().ok())
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
