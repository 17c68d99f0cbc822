//! # Graph Model
//!
//! The immutable per-level crystal graph.
//!
//! A `GraphModel` is built once when a level is loaded and never mutated
//! afterwards. Every query is pure, so the model is shared between the
//! session, the validator and the bridge through `Arc<GraphModel>`.
//! All data structures use `BTreeMap`/`BTreeSet` for deterministic ordering.

use crate::primitives::MAX_LEVEL_CRYSTALS;
use crate::{Color, Crystal, CrystalId, Edge, EdgeKind, LevelId, SymmetriaError};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// GRAPH MODEL
// =============================================================================

/// The crystal graph of one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphModel {
    level_id: LevelId,
    title: String,
    group_name: String,
    act: u8,
    expected_automorphism_count: usize,
    requires_subgroup: bool,

    /// Crystals in definition order.
    crystals: Vec<Crystal>,

    /// Color lookup: CrystalId -> Color
    colors: BTreeMap<CrystalId, Color>,

    /// Identity arrangement: slot -> CrystalId
    initial_slots: Vec<CrystalId>,

    /// Edge set (undirected edges normalized).
    edges: BTreeSet<Edge>,
}

impl GraphModel {
    /// Start building a graph for the given level.
    #[must_use]
    pub fn builder(level_id: impl Into<String>) -> GraphModelBuilder {
        GraphModelBuilder::new(LevelId::new(level_id))
    }

    #[must_use]
    pub fn level_id(&self) -> &LevelId {
        &self.level_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Human label of the automorphism group (e.g. "D4").
    #[must_use]
    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    #[must_use]
    pub fn act(&self) -> u8 {
        self.act
    }

    #[must_use]
    pub fn expected_automorphism_count(&self) -> usize {
        self.expected_automorphism_count
    }

    /// True for levels whose goal includes discovering a closed subgroup.
    #[must_use]
    pub fn requires_subgroup(&self) -> bool {
        self.requires_subgroup
    }

    /// Crystals in definition order.
    pub fn crystals(&self) -> impl Iterator<Item = &Crystal> {
        self.crystals.iter()
    }

    /// Edges in deterministic order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    #[must_use]
    pub fn crystal_count(&self) -> usize {
        self.crystals.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of arrangement slots (one per crystal).
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.initial_slots.len()
    }

    /// The set of crystal ids.
    #[must_use]
    pub fn vertex_ids(&self) -> BTreeSet<CrystalId> {
        self.colors.keys().copied().collect()
    }

    #[must_use]
    pub fn contains_crystal(&self, id: CrystalId) -> bool {
        self.colors.contains_key(&id)
    }

    /// Color of a crystal, `None` for ids foreign to this level.
    #[must_use]
    pub fn color_of(&self, id: CrystalId) -> Option<&Color> {
        self.colors.get(&id)
    }

    /// True iff `u` and `v` are joined by an edge of any kind, in any direction.
    #[must_use]
    pub fn adjacent(&self, u: CrystalId, v: CrystalId) -> bool {
        self.edges.contains(&Edge::undirected(u, v))
            || self.edges.contains(&Edge::directed(u, v))
            || self.edges.contains(&Edge::directed(v, u))
    }

    /// True iff the directed edge `from -> to` exists.
    #[must_use]
    pub fn has_arc(&self, from: CrystalId, to: CrystalId) -> bool {
        self.edges.contains(&Edge::directed(from, to))
    }

    /// Exact edge membership (kind and orientation must match).
    #[must_use]
    pub fn contains_edge(&self, edge: &Edge) -> bool {
        self.edges.contains(edge)
    }

    /// Crystal occupying `slot` in the identity arrangement.
    #[must_use]
    pub fn crystal_at_initial_slot(&self, slot: usize) -> Option<CrystalId> {
        self.initial_slots.get(slot).copied()
    }

    /// The identity arrangement, indexed by slot.
    #[must_use]
    pub fn initial_arrangement(&self) -> &[CrystalId] {
        &self.initial_slots
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Incremental construction of a [`GraphModel`]. All structural checks run in
/// [`GraphModelBuilder::build`].
#[derive(Debug, Clone)]
pub struct GraphModelBuilder {
    level_id: LevelId,
    title: String,
    group_name: String,
    act: u8,
    expected_automorphism_count: usize,
    requires_subgroup: bool,
    crystals: Vec<Crystal>,
    edges: Vec<Edge>,
}

impl GraphModelBuilder {
    fn new(level_id: LevelId) -> Self {
        Self {
            title: level_id.to_string(),
            level_id,
            group_name: String::new(),
            act: 1,
            expected_automorphism_count: 1,
            requires_subgroup: false,
            crystals: Vec::new(),
            edges: Vec::new(),
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn group_name(mut self, name: impl Into<String>) -> Self {
        self.group_name = name.into();
        self
    }

    #[must_use]
    pub fn act(mut self, act: u8) -> Self {
        self.act = act;
        self
    }

    #[must_use]
    pub fn expected_automorphisms(mut self, count: usize) -> Self {
        self.expected_automorphism_count = count;
        self
    }

    #[must_use]
    pub fn requires_subgroup(mut self, flag: bool) -> Self {
        self.requires_subgroup = flag;
        self
    }

    /// Add a crystal in the next free slot.
    #[must_use]
    pub fn crystal(self, id: u32, color: &str) -> Self {
        let slot = self.crystals.len();
        self.crystal_at(id, color, slot)
    }

    /// Add a crystal at an explicit initial slot.
    #[must_use]
    pub fn crystal_at(mut self, id: u32, color: &str, slot: usize) -> Self {
        self.crystals
            .push(Crystal::new(CrystalId(id), Color::new(color), slot));
        self
    }

    #[must_use]
    pub fn edge(mut self, a: u32, b: u32) -> Self {
        self.edges.push(Edge::undirected(CrystalId(a), CrystalId(b)));
        self
    }

    #[must_use]
    pub fn arc(mut self, from: u32, to: u32) -> Self {
        self.edges.push(Edge::directed(CrystalId(from), CrystalId(to)));
        self
    }

    /// Add an edge of the given kind.
    #[must_use]
    pub fn edge_of_kind(mut self, a: u32, b: u32, kind: EdgeKind) -> Self {
        self.edges
            .push(Edge::with_kind(CrystalId(a), CrystalId(b), kind));
        self
    }

    /// Validate and freeze the graph.
    ///
    /// Rejects: empty or oversized crystal sets, duplicate ids, initial slots
    /// that are not exactly `0..n`, edges touching unknown crystals,
    /// self-loops, duplicate edges, and a zero expected automorphism count.
    pub fn build(self) -> Result<GraphModel, SymmetriaError> {
        let level = self.level_id.clone();
        let invalid = |reason: String| SymmetriaError::InvalidLevel {
            level: level.clone(),
            reason,
        };

        let n = self.crystals.len();
        if n == 0 {
            return Err(invalid("level has no crystals".to_string()));
        }
        if n > MAX_LEVEL_CRYSTALS {
            return Err(invalid(format!(
                "{} crystals exceeds maximum {}",
                n, MAX_LEVEL_CRYSTALS
            )));
        }
        if self.expected_automorphism_count == 0 {
            return Err(invalid(
                "expected automorphism count must be at least 1".to_string(),
            ));
        }

        let mut colors = BTreeMap::new();
        let mut slots: Vec<Option<CrystalId>> = vec![None; n];
        for crystal in &self.crystals {
            if colors.insert(crystal.id, crystal.color.clone()).is_some() {
                return Err(invalid(format!("duplicate crystal id {}", crystal.id)));
            }
            let Some(entry) = slots.get_mut(crystal.initial_slot) else {
                return Err(invalid(format!(
                    "crystal {} has initial slot {} outside 0..{}",
                    crystal.id, crystal.initial_slot, n
                )));
            };
            if let Some(other) = *entry {
                return Err(invalid(format!(
                    "crystals {} and {} share initial slot {}",
                    other, crystal.id, crystal.initial_slot
                )));
            }
            *entry = Some(crystal.id);
        }
        // n distinct ids over n in-range slots with no collision fills every slot.
        let initial_slots: Vec<CrystalId> = slots.into_iter().flatten().collect();

        let mut edges = BTreeSet::new();
        for edge in &self.edges {
            if !colors.contains_key(&edge.a) || !colors.contains_key(&edge.b) {
                return Err(invalid(format!("edge {} references an unknown crystal", edge)));
            }
            if edge.is_loop() {
                return Err(invalid(format!("self-loop on crystal {}", edge.a)));
            }
            if conflicts(&edges, edge) {
                return Err(invalid(format!("duplicate edge {}", edge)));
            }
            edges.insert(*edge);
        }

        Ok(GraphModel {
            level_id: self.level_id,
            title: self.title,
            group_name: self.group_name,
            act: self.act,
            expected_automorphism_count: self.expected_automorphism_count,
            requires_subgroup: self.requires_subgroup,
            crystals: self.crystals,
            colors,
            initial_slots,
            edges,
        })
    }
}

/// An undirected edge collides with anything over the same pair; a directed
/// edge collides with itself and with an undirected edge over its pair.
fn conflicts(edges: &BTreeSet<Edge>, edge: &Edge) -> bool {
    match edge.kind {
        EdgeKind::Undirected => {
            edges.contains(edge)
                || edges.contains(&Edge::directed(edge.a, edge.b))
                || edges.contains(&Edge::directed(edge.b, edge.a))
        }
        EdgeKind::Directed => {
            edges.contains(edge) || edges.contains(&Edge::undirected(edge.a, edge.b))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
