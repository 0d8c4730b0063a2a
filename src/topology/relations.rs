//! RelationshipGraph: typed adjacency between model components.
//!
//! The graph records which [`ComponentId`]s are registered and the multiset
//! of typed relations between them. Three relation kinds exist:
//!
//! - [`RelationKind::BoundaryIncidence`] — one logical bidirectional edge
//!   (a boundary side and an incidence side), stored once and mirrored, so
//!   the two query directions can never diverge.
//! - [`RelationKind::ItemInCollection`] — membership of a mesh component in a
//!   collection.
//! - [`RelationKind::InternalEmbedding`] — a component lying inside another.
//!
//! Adjacency is stored as mirrored out/in maps; every mutation updates both
//! sides, and unregistering a component scrubs every incident relation so a
//! dangling relation is never observable.
//!
//! # Invariants
//!
//! - Every relation endpoint is a registered component.
//! - Out/in adjacency are exact mirrors of each other.
//! - No duplicate (destination, kind) pair per source.
//!
//! Checked after mutations in debug builds and under the `check-invariants`
//! feature.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use itertools::Itertools;

use crate::debug_invariants::DebugInvariants;
use crate::model_error::ModelWeldError;
use crate::topology::component::{ComponentId, ComponentKind};

/// The closed set of relation kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum RelationKind {
    /// Boundary/incidence pairing; one logical edge queried from both sides.
    BoundaryIncidence,
    /// A mesh component collected by a collection component.
    ItemInCollection,
    /// A component embedded in the interior of another.
    InternalEmbedding,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RelationKind::BoundaryIncidence => "boundary_incidence",
            RelationKind::ItemInCollection => "item_in_collection",
            RelationKind::InternalEmbedding => "internal_embedding",
        })
    }
}

/// Registered components plus the multiset of typed relations between them.
#[derive(Clone, Debug, Default)]
pub struct RelationshipGraph {
    /// All registered component ids, in deterministic order.
    registered: BTreeSet<ComponentId>,
    /// Outgoing adjacency: source → (destination, kind) pairs.
    adjacency_out: HashMap<ComponentId, Vec<(ComponentId, RelationKind)>>,
    /// Incoming adjacency: destination → (source, kind) pairs (mirror).
    adjacency_in: HashMap<ComponentId, Vec<(ComponentId, RelationKind)>>,
    /// Number of logical relations (each counted once).
    nb_relations: usize,
    /// Monotonic version that changes on any structural modification.
    version: u64,
}

impl RelationshipGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component id with no relations yet.
    ///
    /// # Errors
    /// Returns `Err(ComponentAlreadyRegistered)` if `id` is already present.
    pub fn register_component(&mut self, id: ComponentId) -> Result<(), ModelWeldError> {
        if !self.registered.insert(id) {
            return Err(ModelWeldError::ComponentAlreadyRegistered(id));
        }
        self.version = self.version.wrapping_add(1);
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        Ok(())
    }

    /// Unregisters a component, cascading removal of every incident relation.
    ///
    /// # Errors
    /// Returns `Err(ComponentNotFound)` if `id` is not registered.
    pub fn unregister_component(&mut self, id: ComponentId) -> Result<(), ModelWeldError> {
        if !self.registered.remove(&id) {
            return Err(ModelWeldError::ComponentNotFound(id));
        }
        let mut removed = 0usize;
        if let Some(outs) = self.adjacency_out.remove(&id) {
            removed += outs.len();
            for (dst, kind) in outs {
                let prune = if let Some(ins) = self.adjacency_in.get_mut(&dst) {
                    ins.retain(|&(src, k)| !(src == id && k == kind));
                    ins.is_empty()
                } else {
                    false
                };
                if prune {
                    self.adjacency_in.remove(&dst);
                }
            }
        }
        if let Some(ins) = self.adjacency_in.remove(&id) {
            removed += ins.len();
            for (src, kind) in ins {
                let prune = if let Some(outs) = self.adjacency_out.get_mut(&src) {
                    outs.retain(|&(dst, k)| !(dst == id && k == kind));
                    outs.is_empty()
                } else {
                    false
                };
                if prune {
                    self.adjacency_out.remove(&src);
                }
            }
        }
        self.nb_relations -= removed;
        self.version = self.version.wrapping_add(1);
        log::debug!("unregister_component {id}: {removed} relation(s) cascaded");
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        Ok(())
    }

    /// Whether `id` is registered.
    #[inline]
    pub fn is_registered(&self, id: ComponentId) -> bool {
        self.registered.contains(&id)
    }

    /// All registered ids in deterministic (sorted) order.
    pub fn registered_components(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.registered.iter().copied()
    }

    fn add_relation(
        &mut self,
        src: ComponentId,
        dst: ComponentId,
        kind: RelationKind,
    ) -> Result<(), ModelWeldError> {
        if !self.registered.contains(&src) {
            return Err(ModelWeldError::ComponentNotFound(src));
        }
        if !self.registered.contains(&dst) {
            return Err(ModelWeldError::ComponentNotFound(dst));
        }
        let outs = self.adjacency_out.entry(src).or_default();
        if outs.iter().any(|&(d, k)| d == dst && k == kind) {
            // Idempotent: the relation already exists.
            return Ok(());
        }
        outs.push((dst, kind));
        self.adjacency_in.entry(dst).or_default().push((src, kind));
        self.nb_relations += 1;
        self.version = self.version.wrapping_add(1);
        log::trace!("add relation {src} -[{kind}]-> {dst}");
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        Ok(())
    }

    /// Records `boundary` as a boundary of `incidence` (equivalently,
    /// `incidence` as an incidence of `boundary`). One logical edge;
    /// idempotent.
    ///
    /// # Errors
    /// Returns `Err(ComponentNotFound)` if either endpoint is unregistered.
    pub fn add_boundary_incidence(
        &mut self,
        boundary: ComponentId,
        incidence: ComponentId,
    ) -> Result<(), ModelWeldError> {
        self.add_relation(boundary, incidence, RelationKind::BoundaryIncidence)
    }

    /// Records `item` as belonging to `collection`. Idempotent.
    ///
    /// # Errors
    /// Returns `Err(ComponentNotFound)` if either endpoint is unregistered.
    pub fn add_item_in_collection(
        &mut self,
        item: ComponentId,
        collection: ComponentId,
    ) -> Result<(), ModelWeldError> {
        self.add_relation(item, collection, RelationKind::ItemInCollection)
    }

    /// Records `internal` as embedded inside `embedding`. Idempotent.
    ///
    /// # Errors
    /// Returns `Err(ComponentNotFound)` if either endpoint is unregistered.
    pub fn add_internal_embedding(
        &mut self,
        internal: ComponentId,
        embedding: ComponentId,
    ) -> Result<(), ModelWeldError> {
        self.add_relation(internal, embedding, RelationKind::InternalEmbedding)
    }

    fn remove_arrow(&mut self, src: ComponentId, dst: ComponentId, kind: RelationKind) -> bool {
        let mut removed = false;
        let prune_out = if let Some(outs) = self.adjacency_out.get_mut(&src) {
            if let Some(pos) = outs.iter().position(|&(d, k)| d == dst && k == kind) {
                outs.remove(pos);
                removed = true;
            }
            outs.is_empty()
        } else {
            false
        };
        if prune_out {
            self.adjacency_out.remove(&src);
        }
        if removed {
            let prune_in = if let Some(ins) = self.adjacency_in.get_mut(&dst) {
                if let Some(pos) = ins.iter().position(|&(s, k)| s == src && k == kind) {
                    ins.remove(pos);
                }
                ins.is_empty()
            } else {
                false
            };
            if prune_in {
                self.adjacency_in.remove(&dst);
            }
            self.nb_relations -= 1;
            self.version = self.version.wrapping_add(1);
        }
        removed
    }

    /// Removes the relation of the given kind between `a` and `b`.
    ///
    /// For [`RelationKind::BoundaryIncidence`] the argument order does not
    /// matter (it is one logical edge). Removing an absent relation is a
    /// documented no-op; the return value reports whether an edge was
    /// removed.
    pub fn remove_relation(
        &mut self,
        a: ComponentId,
        b: ComponentId,
        kind: RelationKind,
    ) -> bool {
        let removed = match kind {
            RelationKind::BoundaryIncidence => {
                self.remove_arrow(a, b, kind) || self.remove_arrow(b, a, kind)
            }
            _ => self.remove_arrow(a, b, kind),
        };
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        removed
    }

    fn incoming(
        &self,
        id: ComponentId,
        kind: RelationKind,
    ) -> impl Iterator<Item = ComponentId> + '_ {
        self.adjacency_in
            .get(&id)
            .into_iter()
            .flatten()
            .filter(move |&&(_, k)| k == kind)
            .map(|&(src, _)| src)
    }

    fn outgoing(
        &self,
        id: ComponentId,
        kind: RelationKind,
    ) -> impl Iterator<Item = ComponentId> + '_ {
        self.adjacency_out
            .get(&id)
            .into_iter()
            .flatten()
            .filter(move |&&(_, k)| k == kind)
            .map(|&(dst, _)| dst)
    }

    /// Components that are boundaries of `id`.
    pub fn boundaries(&self, id: ComponentId) -> impl Iterator<Item = ComponentId> + '_ {
        self.incoming(id, RelationKind::BoundaryIncidence)
    }

    /// Boundaries of `id`, restricted to one component kind.
    pub fn boundaries_of_kind(
        &self,
        id: ComponentId,
        kind: ComponentKind,
    ) -> impl Iterator<Item = ComponentId> + '_ {
        self.boundaries(id).filter(move |c| c.kind() == kind)
    }

    /// Components that `id` is a boundary of.
    pub fn incidences(&self, id: ComponentId) -> impl Iterator<Item = ComponentId> + '_ {
        self.outgoing(id, RelationKind::BoundaryIncidence)
    }

    /// Incidences of `id`, restricted to one component kind.
    pub fn incidences_of_kind(
        &self,
        id: ComponentId,
        kind: ComponentKind,
    ) -> impl Iterator<Item = ComponentId> + '_ {
        self.incidences(id).filter(move |c| c.kind() == kind)
    }

    /// Items collected by `collection`.
    pub fn items(&self, collection: ComponentId) -> impl Iterator<Item = ComponentId> + '_ {
        self.incoming(collection, RelationKind::ItemInCollection)
    }

    /// Items of `collection`, restricted to one component kind.
    pub fn items_of_kind(
        &self,
        collection: ComponentId,
        kind: ComponentKind,
    ) -> impl Iterator<Item = ComponentId> + '_ {
        self.items(collection).filter(move |c| c.kind() == kind)
    }

    /// Collections that `item` belongs to.
    pub fn collections(&self, item: ComponentId) -> impl Iterator<Item = ComponentId> + '_ {
        self.outgoing(item, RelationKind::ItemInCollection)
    }

    /// Collections of `item`, restricted to one component kind.
    pub fn collections_of_kind(
        &self,
        item: ComponentId,
        kind: ComponentKind,
    ) -> impl Iterator<Item = ComponentId> + '_ {
        self.collections(item).filter(move |c| c.kind() == kind)
    }

    /// Components embedded inside `embedding`.
    pub fn internals(&self, embedding: ComponentId) -> impl Iterator<Item = ComponentId> + '_ {
        self.incoming(embedding, RelationKind::InternalEmbedding)
    }

    /// Internals of `embedding`, restricted to one component kind.
    pub fn internals_of_kind(
        &self,
        embedding: ComponentId,
        kind: ComponentKind,
    ) -> impl Iterator<Item = ComponentId> + '_ {
        self.internals(embedding).filter(move |c| c.kind() == kind)
    }

    /// Components that `internal` is embedded in.
    pub fn embeddings(&self, internal: ComponentId) -> impl Iterator<Item = ComponentId> + '_ {
        self.outgoing(internal, RelationKind::InternalEmbedding)
    }

    /// Embeddings of `internal`, restricted to one component kind.
    pub fn embeddings_of_kind(
        &self,
        internal: ComponentId,
        kind: ComponentKind,
    ) -> impl Iterator<Item = ComponentId> + '_ {
        self.embeddings(internal).filter(move |c| c.kind() == kind)
    }

    /// Whether `boundary` is recorded as a boundary of `incidence`.
    pub fn is_boundary(&self, boundary: ComponentId, incidence: ComponentId) -> bool {
        self.incidences(boundary).any(|c| c == incidence)
    }

    /// Whether `item` is recorded as an item of `collection`.
    pub fn is_item_of(&self, item: ComponentId, collection: ComponentId) -> bool {
        self.collections(item).any(|c| c == collection)
    }

    /// Whether `internal` is recorded as embedded in `embedding`.
    pub fn is_internal_of(&self, internal: ComponentId, embedding: ComponentId) -> bool {
        self.embeddings(internal).any(|c| c == embedding)
    }

    /// Number of logical relations, each counted once.
    #[inline]
    pub fn nb_relations(&self) -> usize {
        self.nb_relations
    }

    /// Number of registered components with at least one relation.
    pub fn nb_components_with_relations(&self) -> usize {
        let with_edges: HashSet<ComponentId> = self
            .adjacency_out
            .keys()
            .chain(self.adjacency_in.keys())
            .copied()
            .collect();
        with_edges.len()
    }

    /// Monotonic version that changes whenever the graph structure changes.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Snapshots the graph as one versioned record, deterministically
    /// ordered.
    pub fn to_record(&self) -> RelationshipGraphRecord {
        let relations = self
            .adjacency_out
            .iter()
            .flat_map(|(&src, outs)| outs.iter().map(move |&(dst, kind)| (src, dst, kind)))
            .sorted()
            .collect();
        RelationshipGraphRecord {
            version: RELATIONSHIP_GRAPH_RECORD_VERSION,
            components: self.registered.iter().copied().collect(),
            relations,
        }
    }

    /// Rebuilds a graph from a versioned record.
    ///
    /// # Errors
    /// `UnsupportedFormatVersion` for an unknown version tag;
    /// `ComponentNotFound` if a stored relation references an id missing from
    /// the stored component list (a corrupt record).
    pub fn from_record(record: &RelationshipGraphRecord) -> Result<Self, ModelWeldError> {
        match record.version {
            1 => {
                let mut graph = Self::new();
                for &id in &record.components {
                    graph.register_component(id)?;
                }
                for &(src, dst, kind) in &record.relations {
                    graph.add_relation(src, dst, kind)?;
                }
                Ok(graph)
            }
            version => Err(ModelWeldError::UnsupportedFormatVersion {
                record: "RelationshipGraph",
                version,
            }),
        }
    }
}

impl DebugInvariants for RelationshipGraph {
    fn debug_assert_invariants(&self) {
        crate::weld_debug_assert_ok!(self.validate_invariants(), "RelationshipGraph invalid");
    }

    fn validate_invariants(&self) -> Result<(), ModelWeldError> {
        let mut total = 0usize;
        for (&src, outs) in &self.adjacency_out {
            if !self.registered.contains(&src) {
                return Err(ModelWeldError::ComponentNotFound(src));
            }
            let mut seen = HashSet::new();
            for &(dst, kind) in outs {
                if !self.registered.contains(&dst) {
                    return Err(ModelWeldError::ComponentNotFound(dst));
                }
                if !seen.insert((dst, kind)) {
                    return Err(ModelWeldError::ComponentAlreadyRegistered(dst));
                }
                let mirrored = self
                    .adjacency_in
                    .get(&dst)
                    .is_some_and(|ins| ins.iter().any(|&(s, k)| s == src && k == kind));
                if !mirrored {
                    return Err(ModelWeldError::ComponentNotFound(dst));
                }
                total += 1;
            }
        }
        for (&dst, ins) in &self.adjacency_in {
            for &(src, kind) in ins {
                let mirrored = self
                    .adjacency_out
                    .get(&src)
                    .is_some_and(|outs| outs.iter().any(|&(d, k)| d == dst && k == kind));
                if !mirrored {
                    return Err(ModelWeldError::ComponentNotFound(src));
                }
            }
        }
        if total != self.nb_relations {
            return Err(ModelWeldError::MappingLengthMismatch {
                expected: self.nb_relations,
                found: total,
            });
        }
        Ok(())
    }
}

/// Record version currently written by [`RelationshipGraph::to_record`].
pub const RELATIONSHIP_GRAPH_RECORD_VERSION: u32 = 1;

/// Versioned snapshot of one [`RelationshipGraph`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RelationshipGraphRecord {
    pub version: u32,
    pub components: Vec<ComponentId>,
    pub relations: Vec<(ComponentId, ComponentId, RelationKind)>,
}
