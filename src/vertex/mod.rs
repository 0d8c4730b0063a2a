//! VertexIdentifier: cross-component vertex identification.
//!
//! Independent components own their meshes, so a physical point shared by
//! several components exists once per component, under a different local
//! index each time. The `VertexIdentifier` unifies those instances: it owns a
//! global table of **unique vertices** and a many-to-one map from
//! [`MeshComponentVertex`] (a local vertex inside one component) to
//! [`UniqueVertexId`].
//!
//! Storage mirrors the map in both directions: the global table holds, per
//! unique vertex, the list of linked mesh-component vertices; a per-component
//! reverse map holds, per local index, the unique vertex it points to. Every
//! mutation updates both sides.
//!
//! When a component's element set is edited (delete/permute), the owning
//! builder feeds the resulting old→new mapping into
//! [`update_unique_vertices`](VertexIdentifier::update_unique_vertices),
//! which rewrites that component's links without ever exposing a dangling
//! reference. Unique vertices with no remaining link stay valid; reclaiming
//! them is the explicit [`delete_isolated_vertices`](VertexIdentifier::delete_isolated_vertices)
//! compaction.
//!
//! # Invariants
//!
//! - The mcv → unique-vertex map is a well-defined function.
//! - Forward table and reverse maps are exact mirrors.
//! - Every stored [`UniqueVertexId`] is within the allocated table.

use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;

use crate::attribute::old2new::Old2New;
use crate::debug_invariants::DebugInvariants;
use crate::model_error::ModelWeldError;
use crate::topology::component::{ComponentId, ComponentKind};

/// Index of one unique vertex in the global vertex table.
///
/// # Memory layout
/// `repr(transparent)` over `u32`.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct UniqueVertexId(u32);

impl UniqueVertexId {
    /// Wraps a raw table index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// The raw table index.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for UniqueVertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UniqueVertexId").field(&self.0).finish()
    }
}

impl fmt::Display for UniqueVertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One vertex instance inside one component's mesh.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Debug,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct MeshComponentVertex {
    /// The owning component.
    pub component: ComponentId,
    /// Local vertex index inside the component's mesh.
    pub vertex: u32,
}

impl MeshComponentVertex {
    /// Pairs a component with a local vertex index.
    #[inline]
    pub const fn new(component: ComponentId, vertex: u32) -> Self {
        Self { component, vertex }
    }
}

impl fmt::Display for MeshComponentVertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.component, self.vertex)
    }
}

/// Many-to-one map from mesh-component vertices to shared unique vertices.
#[derive(Clone, Debug, Default)]
pub struct VertexIdentifier {
    /// Global table: unique vertex → linked mesh-component vertices.
    links: Vec<Vec<MeshComponentVertex>>,
    /// Reverse maps: component → (local vertex → unique vertex).
    component_links: HashMap<ComponentId, hashbrown::HashMap<u32, UniqueVertexId>>,
    /// Monotonic version that changes on any structural modification.
    version: u64,
}

impl VertexIdentifier {
    /// Creates an identifier with an empty vertex table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of allocated unique vertices, linked or not.
    #[inline]
    pub fn nb_unique_vertices(&self) -> usize {
        self.links.len()
    }

    /// Monotonic version that changes whenever links or the table change.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    fn check_unique(&self, unique: UniqueVertexId) -> Result<(), ModelWeldError> {
        if (unique.get() as usize) < self.links.len() {
            Ok(())
        } else {
            Err(ModelWeldError::UniqueVertexOutOfRange {
                vertex: unique.get(),
                nb_unique: self.links.len() as u32,
            })
        }
    }

    /// Appends one fresh, unlinked unique vertex and returns its id.
    pub fn create_unique_vertex(&mut self) -> UniqueVertexId {
        self.create_unique_vertices(1)
    }

    /// Appends `nb` fresh, unlinked unique vertices; returns the id of the
    /// first one (the start of the new contiguous range).
    pub fn create_unique_vertices(&mut self, nb: usize) -> UniqueVertexId {
        let first = UniqueVertexId::new(self.links.len() as u32);
        self.links.extend((0..nb).map(|_| Vec::new()));
        self.version = self.version.wrapping_add(1);
        first
    }

    /// Links `mcv` to `unique`, replacing any prior link for `mcv`.
    ///
    /// # Errors
    /// Returns `Err(UniqueVertexOutOfRange)` if `unique` is not allocated;
    /// nothing changes on error.
    pub fn set_unique_vertex(
        &mut self,
        mcv: MeshComponentVertex,
        unique: UniqueVertexId,
    ) -> Result<(), ModelWeldError> {
        self.check_unique(unique)?;
        let inner = self.component_links.entry(mcv.component).or_default();
        if let Some(previous) = inner.insert(mcv.vertex, unique) {
            if previous == unique {
                return Ok(());
            }
            let list = &mut self.links[previous.get() as usize];
            if let Some(pos) = list.iter().position(|&entry| entry == mcv) {
                list.remove(pos);
            }
        }
        self.links[unique.get() as usize].push(mcv);
        self.version = self.version.wrapping_add(1);
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        Ok(())
    }

    /// Removes the link carried by `mcv`.
    ///
    /// # Errors
    /// Returns `Err(VertexNotLinked)` if `mcv` carries no link.
    pub fn unset_unique_vertex(&mut self, mcv: MeshComponentVertex) -> Result<(), ModelWeldError> {
        let inner = self
            .component_links
            .get_mut(&mcv.component)
            .ok_or(ModelWeldError::VertexNotLinked(mcv))?;
        let unique = inner
            .remove(&mcv.vertex)
            .ok_or(ModelWeldError::VertexNotLinked(mcv))?;
        if inner.is_empty() {
            self.component_links.remove(&mcv.component);
        }
        let list = &mut self.links[unique.get() as usize];
        if let Some(pos) = list.iter().position(|&entry| entry == mcv) {
            list.remove(pos);
        }
        self.version = self.version.wrapping_add(1);
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        Ok(())
    }

    /// The unique vertex `mcv` is linked to.
    ///
    /// # Errors
    /// Returns `Err(VertexNotLinked)` if `mcv` carries no link.
    pub fn unique_vertex(&self, mcv: MeshComponentVertex) -> Result<UniqueVertexId, ModelWeldError> {
        self.component_links
            .get(&mcv.component)
            .and_then(|inner| inner.get(&mcv.vertex))
            .copied()
            .ok_or(ModelWeldError::VertexNotLinked(mcv))
    }

    /// Whether `mcv` carries a link.
    pub fn has_mesh_component_vertex(&self, mcv: MeshComponentVertex) -> bool {
        self.component_links
            .get(&mcv.component)
            .is_some_and(|inner| inner.contains_key(&mcv.vertex))
    }

    /// Mesh-component vertices linked to `unique`, in link order.
    ///
    /// # Errors
    /// Returns `Err(UniqueVertexOutOfRange)` if `unique` is not allocated.
    pub fn mesh_component_vertices(
        &self,
        unique: UniqueVertexId,
    ) -> Result<&[MeshComponentVertex], ModelWeldError> {
        self.check_unique(unique)?;
        Ok(&self.links[unique.get() as usize])
    }

    /// Linked vertices of `unique` owned by components of one kind.
    ///
    /// # Errors
    /// Returns `Err(UniqueVertexOutOfRange)` if `unique` is not allocated.
    pub fn mesh_component_vertices_of_kind(
        &self,
        unique: UniqueVertexId,
        kind: ComponentKind,
    ) -> Result<impl Iterator<Item = MeshComponentVertex> + '_, ModelWeldError> {
        Ok(self
            .mesh_component_vertices(unique)?
            .iter()
            .copied()
            .filter(move |mcv| mcv.component.kind() == kind))
    }

    /// Linked vertices of `unique` owned by one specific component.
    ///
    /// # Errors
    /// Returns `Err(UniqueVertexOutOfRange)` if `unique` is not allocated.
    pub fn mesh_component_vertices_of_component(
        &self,
        unique: UniqueVertexId,
        component: ComponentId,
    ) -> Result<impl Iterator<Item = MeshComponentVertex> + '_, ModelWeldError> {
        Ok(self
            .mesh_component_vertices(unique)?
            .iter()
            .copied()
            .filter(move |mcv| mcv.component == component))
    }

    /// Number of links carried by `unique`.
    ///
    /// # Errors
    /// Returns `Err(UniqueVertexOutOfRange)` if `unique` is not allocated.
    pub fn nb_linked_mesh_component_vertices(
        &self,
        unique: UniqueVertexId,
    ) -> Result<usize, ModelWeldError> {
        Ok(self.mesh_component_vertices(unique)?.len())
    }

    /// Rewrites every link of `component` per the old→new mapping produced by
    /// that component's element-set edit. Links whose local index maps to the
    /// deleted sentinel are dropped; the identity mapping is a no-op.
    ///
    /// All new links are computed before any is installed, so a failure
    /// leaves the map untouched (all-or-nothing).
    ///
    /// # Errors
    /// Returns `Err(IndexOutOfRange)` if a linked local index is not covered
    /// by the mapping.
    pub fn update_unique_vertices(
        &mut self,
        component: ComponentId,
        old2new: &Old2New,
    ) -> Result<(), ModelWeldError> {
        let Some(inner) = self.component_links.get(&component) else {
            return Ok(());
        };
        // Validate before touching anything.
        for &old in inner.keys() {
            if old as usize >= old2new.len() {
                return Err(ModelWeldError::IndexOutOfRange {
                    index: old as usize,
                    size: old2new.len(),
                });
            }
        }
        if old2new.is_identity() {
            return Ok(());
        }

        // Compute phase: the full replacement map.
        let mut replacement: hashbrown::HashMap<u32, UniqueVertexId> =
            hashbrown::HashMap::with_capacity(inner.len());
        let mut affected: Vec<UniqueVertexId> = Vec::with_capacity(inner.len());
        let mut dropped = 0usize;
        for (&old, &unique) in inner.iter() {
            affected.push(unique);
            match old2new.get(old as usize) {
                Some(new) => {
                    replacement.insert(new, unique);
                }
                None => dropped += 1,
            }
        }

        // Install phase: scrub this component from every affected unique
        // vertex, then relink at the new local indices.
        affected.sort_unstable();
        affected.dedup();
        for unique in &affected {
            self.links[unique.get() as usize].retain(|mcv| mcv.component != component);
        }
        for (&vertex, &unique) in replacement.iter().sorted_by_key(|&(&vertex, _)| vertex) {
            self.links[unique.get() as usize].push(MeshComponentVertex::new(component, vertex));
        }
        if replacement.is_empty() {
            self.component_links.remove(&component);
        } else {
            self.component_links.insert(component, replacement);
        }
        self.version = self.version.wrapping_add(1);
        log::trace!("update_unique_vertices {component}: {dropped} link(s) dropped");
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        Ok(())
    }

    /// Drops every link owned by `component`. Used by the model-removal
    /// cascade; a component with no links is a no-op.
    pub fn unregister_component(&mut self, component: ComponentId) {
        let Some(inner) = self.component_links.remove(&component) else {
            return;
        };
        let mut affected: Vec<UniqueVertexId> = inner.values().copied().collect();
        affected.sort_unstable();
        affected.dedup();
        for unique in &affected {
            self.links[unique.get() as usize].retain(|mcv| mcv.component != component);
        }
        self.version = self.version.wrapping_add(1);
        log::debug!(
            "unregister_component {component}: {} vertex link(s) dropped",
            inner.len()
        );
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
    }

    /// Removes every unique vertex with zero links and compacts the table.
    ///
    /// Returns the unique-vertex old→new mapping of the compaction. Surviving
    /// links are rewritten in place.
    ///
    /// # Complexity
    /// **O(total links + table size)**.
    pub fn delete_isolated_vertices(&mut self) -> Old2New {
        let mask: Vec<bool> = self.links.iter().map(Vec::is_empty).collect();
        let map = Old2New::from_delete_mask(&mask);
        if map.is_identity() {
            return map;
        }
        let old = std::mem::replace(&mut self.links, Vec::with_capacity(map.new_len()));
        for (index, list) in old.into_iter().enumerate() {
            if map.get(index).is_some() {
                self.links.push(list);
            }
        }
        for inner in self.component_links.values_mut() {
            for unique in inner.values_mut() {
                // Linked vertices are never isolated, so the entry survives.
                *unique = UniqueVertexId::new(map.get(unique.get() as usize).unwrap());
            }
        }
        self.version = self.version.wrapping_add(1);
        log::debug!(
            "delete_isolated_vertices: {} vertex(es) removed",
            map.len() - map.new_len()
        );
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        map
    }

    /// Snapshots the identifier as one versioned record, deterministically
    /// ordered.
    pub fn to_record(&self) -> VertexIdentifierRecord {
        let links = self
            .component_links
            .iter()
            .flat_map(|(&component, inner)| {
                inner
                    .iter()
                    .map(move |(&vertex, &unique)| (component, vertex, unique.get()))
            })
            .sorted()
            .collect();
        VertexIdentifierRecord {
            version: VERTEX_IDENTIFIER_RECORD_VERSION,
            nb_unique_vertices: self.links.len() as u64,
            links,
        }
    }

    /// Rebuilds an identifier from a versioned record.
    ///
    /// # Errors
    /// `UnsupportedFormatVersion` for an unknown version tag;
    /// `UniqueVertexOutOfRange` if a stored link points past the stored table
    /// size (a corrupt record).
    pub fn from_record(record: &VertexIdentifierRecord) -> Result<Self, ModelWeldError> {
        match record.version {
            1 => {
                let mut identifier = Self::new();
                identifier.create_unique_vertices(record.nb_unique_vertices as usize);
                for &(component, vertex, unique) in &record.links {
                    identifier.set_unique_vertex(
                        MeshComponentVertex::new(component, vertex),
                        UniqueVertexId::new(unique),
                    )?;
                }
                Ok(identifier)
            }
            version => Err(ModelWeldError::UnsupportedFormatVersion {
                record: "VertexIdentifier",
                version,
            }),
        }
    }
}

impl DebugInvariants for VertexIdentifier {
    fn debug_assert_invariants(&self) {
        crate::weld_debug_assert_ok!(self.validate_invariants(), "VertexIdentifier invalid");
    }

    fn validate_invariants(&self) -> Result<(), ModelWeldError> {
        // Forward entries all have a matching reverse entry.
        for (index, list) in self.links.iter().enumerate() {
            let unique = UniqueVertexId::new(index as u32);
            let mut seen = hashbrown::HashSet::new();
            for &mcv in list {
                if !seen.insert(mcv) {
                    return Err(ModelWeldError::VertexNotLinked(mcv));
                }
                let mirrored = self
                    .component_links
                    .get(&mcv.component)
                    .and_then(|inner| inner.get(&mcv.vertex))
                    .is_some_and(|&u| u == unique);
                if !mirrored {
                    return Err(ModelWeldError::VertexNotLinked(mcv));
                }
            }
        }
        // Reverse entries are in range and present in the forward table.
        for (&component, inner) in &self.component_links {
            for (&vertex, &unique) in inner.iter() {
                self.check_unique(unique)?;
                let mcv = MeshComponentVertex::new(component, vertex);
                if !self.links[unique.get() as usize].contains(&mcv) {
                    return Err(ModelWeldError::VertexNotLinked(mcv));
                }
            }
        }
        Ok(())
    }
}

/// Record version currently written by [`VertexIdentifier::to_record`].
pub const VERTEX_IDENTIFIER_RECORD_VERSION: u32 = 1;

/// Versioned snapshot of one [`VertexIdentifier`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VertexIdentifierRecord {
    pub version: u32,
    pub nb_unique_vertices: u64,
    /// (component, local vertex, unique vertex) triples, sorted.
    pub links: Vec<(ComponentId, u32, u32)>,
}

#[cfg(test)]
mod layout_tests {
    use super::*;
    use static_assertions::assert_eq_size;

    assert_eq_size!(UniqueVertexId, u32);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::component::{ComponentKind, ComponentUid};

    fn cid(kind: ComponentKind, raw: u64) -> ComponentId {
        ComponentId::new(kind, ComponentUid::new(raw).unwrap())
    }

    fn mcv(component: ComponentId, vertex: u32) -> MeshComponentVertex {
        MeshComponentVertex::new(component, vertex)
    }

    #[test]
    fn create_link_query_unlink() {
        let mut identifier = VertexIdentifier::new();
        let surface = cid(ComponentKind::Surface, 1);
        let first = identifier.create_unique_vertices(3);
        assert_eq!(first, UniqueVertexId::new(0));
        assert_eq!(identifier.nb_unique_vertices(), 3);

        let v = mcv(surface, 0);
        let u1 = UniqueVertexId::new(1);
        identifier.set_unique_vertex(v, u1).unwrap();
        assert_eq!(identifier.unique_vertex(v).unwrap(), u1);
        assert!(identifier.has_mesh_component_vertex(v));
        assert_eq!(identifier.mesh_component_vertices(u1).unwrap(), &[v]);

        identifier.unset_unique_vertex(v).unwrap();
        assert_eq!(
            identifier.unique_vertex(v).unwrap_err(),
            ModelWeldError::VertexNotLinked(v)
        );
        assert_eq!(
            identifier.unset_unique_vertex(v).unwrap_err(),
            ModelWeldError::VertexNotLinked(v)
        );
        // The unique vertex itself stays allocated.
        assert_eq!(identifier.nb_unique_vertices(), 3);
    }

    #[test]
    fn relink_replaces_prior_link() {
        let mut identifier = VertexIdentifier::new();
        let line = cid(ComponentKind::Line, 1);
        identifier.create_unique_vertices(2);
        let v = mcv(line, 0);
        identifier.set_unique_vertex(v, UniqueVertexId::new(0)).unwrap();
        identifier.set_unique_vertex(v, UniqueVertexId::new(1)).unwrap();
        assert_eq!(identifier.unique_vertex(v).unwrap(), UniqueVertexId::new(1));
        assert!(identifier
            .mesh_component_vertices(UniqueVertexId::new(0))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn out_of_range_unique_is_rejected() {
        let mut identifier = VertexIdentifier::new();
        let corner = cid(ComponentKind::Corner, 1);
        let err = identifier
            .set_unique_vertex(mcv(corner, 0), UniqueVertexId::new(0))
            .unwrap_err();
        assert_eq!(
            err,
            ModelWeldError::UniqueVertexOutOfRange {
                vertex: 0,
                nb_unique: 0
            }
        );
        assert!(identifier.mesh_component_vertices(UniqueVertexId::new(0)).is_err());
    }

    #[test]
    fn shared_vertex_scenario() {
        // Components A, B each with 3 local vertices; 4 unique vertices.
        let mut identifier = VertexIdentifier::new();
        let a = cid(ComponentKind::Surface, 1);
        let b = cid(ComponentKind::Surface, 2);
        identifier.create_unique_vertices(4);
        let (u0, u1, u2, u3) = (
            UniqueVertexId::new(0),
            UniqueVertexId::new(1),
            UniqueVertexId::new(2),
            UniqueVertexId::new(3),
        );
        identifier.set_unique_vertex(mcv(a, 0), u0).unwrap();
        identifier.set_unique_vertex(mcv(b, 0), u0).unwrap();
        identifier.set_unique_vertex(mcv(a, 1), u1).unwrap();
        identifier.set_unique_vertex(mcv(b, 1), u2).unwrap();
        identifier.set_unique_vertex(mcv(a, 2), u3).unwrap();

        let linked: Vec<_> = identifier.mesh_component_vertices(u0).unwrap().to_vec();
        assert_eq!(linked, vec![mcv(a, 0), mcv(b, 0)]);

        // A deletes local 0: mapping [NO_ID, 0, 1].
        let map = Old2New::from_delete_mask(&[true, false, false]);
        identifier.update_unique_vertices(a, &map).unwrap();

        assert_eq!(identifier.mesh_component_vertices(u0).unwrap(), &[mcv(b, 0)]);
        assert_eq!(identifier.unique_vertex(mcv(a, 0)).unwrap(), u1);
        assert_eq!(identifier.unique_vertex(mcv(a, 1)).unwrap(), u3);
        assert!(!identifier.has_mesh_component_vertex(mcv(a, 2)));
        // B is untouched.
        assert_eq!(identifier.unique_vertex(mcv(b, 1)).unwrap(), u2);
    }

    #[test]
    fn identity_update_is_a_noop() {
        let mut identifier = VertexIdentifier::new();
        let a = cid(ComponentKind::Line, 1);
        identifier.create_unique_vertices(2);
        identifier
            .set_unique_vertex(mcv(a, 0), UniqueVertexId::new(1))
            .unwrap();
        let version = identifier.version();
        identifier
            .update_unique_vertices(a, &Old2New::identity(3))
            .unwrap();
        assert_eq!(identifier.version(), version);
        assert_eq!(
            identifier.unique_vertex(mcv(a, 0)).unwrap(),
            UniqueVertexId::new(1)
        );
    }

    #[test]
    fn update_is_all_or_nothing() {
        let mut identifier = VertexIdentifier::new();
        let a = cid(ComponentKind::Line, 1);
        identifier.create_unique_vertices(2);
        identifier
            .set_unique_vertex(mcv(a, 0), UniqueVertexId::new(0))
            .unwrap();
        identifier
            .set_unique_vertex(mcv(a, 5), UniqueVertexId::new(1))
            .unwrap();
        // Mapping covers only 3 locals; local 5 is out of range.
        let err = identifier
            .update_unique_vertices(a, &Old2New::from_delete_mask(&[true, false, false]))
            .unwrap_err();
        assert!(matches!(err, ModelWeldError::IndexOutOfRange { index: 5, size: 3 }));
        // Nothing moved.
        assert_eq!(identifier.unique_vertex(mcv(a, 0)).unwrap(), UniqueVertexId::new(0));
        assert_eq!(identifier.unique_vertex(mcv(a, 5)).unwrap(), UniqueVertexId::new(1));
    }

    #[test]
    fn update_for_component_without_links_is_ok() {
        let mut identifier = VertexIdentifier::new();
        let ghost = cid(ComponentKind::Block, 7);
        identifier
            .update_unique_vertices(ghost, &Old2New::from_delete_mask(&[true]))
            .unwrap();
    }

    #[test]
    fn kind_and_component_filters() {
        let mut identifier = VertexIdentifier::new();
        let surface = cid(ComponentKind::Surface, 1);
        let line = cid(ComponentKind::Line, 2);
        identifier.create_unique_vertex();
        let u = UniqueVertexId::new(0);
        identifier.set_unique_vertex(mcv(surface, 0), u).unwrap();
        identifier.set_unique_vertex(mcv(line, 4), u).unwrap();

        let lines: Vec<_> = identifier
            .mesh_component_vertices_of_kind(u, ComponentKind::Line)
            .unwrap()
            .collect();
        assert_eq!(lines, vec![mcv(line, 4)]);
        let of_surface: Vec<_> = identifier
            .mesh_component_vertices_of_component(u, surface)
            .unwrap()
            .collect();
        assert_eq!(of_surface, vec![mcv(surface, 0)]);
    }

    #[test]
    fn unregister_component_drops_all_links() {
        let mut identifier = VertexIdentifier::new();
        let a = cid(ComponentKind::Surface, 1);
        let b = cid(ComponentKind::Surface, 2);
        identifier.create_unique_vertices(2);
        let u0 = UniqueVertexId::new(0);
        identifier.set_unique_vertex(mcv(a, 0), u0).unwrap();
        identifier.set_unique_vertex(mcv(b, 0), u0).unwrap();
        identifier
            .set_unique_vertex(mcv(a, 1), UniqueVertexId::new(1))
            .unwrap();

        identifier.unregister_component(a);
        assert!(!identifier.has_mesh_component_vertex(mcv(a, 0)));
        assert!(!identifier.has_mesh_component_vertex(mcv(a, 1)));
        assert_eq!(identifier.mesh_component_vertices(u0).unwrap(), &[mcv(b, 0)]);
        // No-op on a second call.
        identifier.unregister_component(a);
    }

    #[test]
    fn isolated_vertex_compaction() {
        let mut identifier = VertexIdentifier::new();
        let a = cid(ComponentKind::Line, 1);
        identifier.create_unique_vertices(4);
        identifier
            .set_unique_vertex(mcv(a, 0), UniqueVertexId::new(1))
            .unwrap();
        identifier
            .set_unique_vertex(mcv(a, 1), UniqueVertexId::new(3))
            .unwrap();

        let map = identifier.delete_isolated_vertices();
        assert_eq!(map.new_len(), 2);
        assert_eq!(identifier.nb_unique_vertices(), 2);
        assert_eq!(
            identifier.unique_vertex(mcv(a, 0)).unwrap(),
            UniqueVertexId::new(0)
        );
        assert_eq!(
            identifier.unique_vertex(mcv(a, 1)).unwrap(),
            UniqueVertexId::new(1)
        );
        // Already compact: second call is the identity.
        assert!(identifier.delete_isolated_vertices().is_identity());
    }

    #[test]
    fn record_roundtrip() {
        let mut identifier = VertexIdentifier::new();
        let a = cid(ComponentKind::Surface, 1);
        let b = cid(ComponentKind::Line, 2);
        identifier.create_unique_vertices(3);
        identifier
            .set_unique_vertex(mcv(a, 0), UniqueVertexId::new(0))
            .unwrap();
        identifier
            .set_unique_vertex(mcv(b, 2), UniqueVertexId::new(0))
            .unwrap();
        identifier
            .set_unique_vertex(mcv(a, 1), UniqueVertexId::new(2))
            .unwrap();

        let record = identifier.to_record();
        let back = VertexIdentifier::from_record(&record).unwrap();
        assert_eq!(back.nb_unique_vertices(), 3);
        assert_eq!(back.unique_vertex(mcv(b, 2)).unwrap(), UniqueVertexId::new(0));
        // Unlinked unique vertex 1 survives the round-trip.
        assert_eq!(back.nb_linked_mesh_component_vertices(UniqueVertexId::new(1)).unwrap(), 0);
        assert_eq!(back.to_record(), record);
    }

    #[test]
    fn unknown_record_version_is_rejected() {
        let record = VertexIdentifierRecord {
            version: 3,
            nb_unique_vertices: 0,
            links: vec![],
        };
        assert_eq!(
            VertexIdentifier::from_record(&record).unwrap_err(),
            ModelWeldError::UnsupportedFormatVersion {
                record: "VertexIdentifier",
                version: 3
            }
        );
    }
}
