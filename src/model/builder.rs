//! ModelBuilder: the sole authorized mutator of a [`Model`].
//!
//! The builder translates high-level modeling edits into the primitives of
//! the four consistency structures, in the one order that keeps them
//! consistent: the touched attribute manager mutates first, the resulting
//! old→new mapping feeds the vertex identifier, then the relationship graph
//! and registry are updated.
//!
//! Component removal cascades in a fixed order: (1) the component's vertex
//! links are dropped, (2) the relationship graph unregisters the id and
//! scrubs its relations, (3) the registry forgets it, (4) the component and
//! its attributes are dropped. Each step touches only state owned by the
//! removed component, so removing several components that share unique
//! vertices is order-independent.

use crate::attribute::old2new::Old2New;
use crate::attribute::AttributeManager;
use crate::debug_invariants::DebugInvariants;
use crate::model::{Component, Model};
use crate::model_error::ModelWeldError;
use crate::topology::component::{ComponentId, ComponentKind, ComponentUid};
use crate::topology::relations::RelationKind;
use crate::vertex::{MeshComponentVertex, UniqueVertexId};

/// Mutating facade over one [`Model`]; obtain it via [`Model::builder`].
#[derive(Debug)]
pub struct ModelBuilder<'a> {
    model: &'a mut Model,
}

impl<'a> ModelBuilder<'a> {
    pub(crate) fn new(model: &'a mut Model) -> Self {
        Self { model }
    }

    fn fresh_id(&mut self, kind: ComponentKind) -> ComponentId {
        let (_, _, _, _, next_uid) = self.model.parts_mut();
        *next_uid += 1;
        // next_uid starts at 0 and is pre-incremented, so the uid is nonzero.
        ComponentId::new(kind, ComponentUid::new(*next_uid).unwrap())
    }

    /// Creates a mesh component of `kind` with `nb_vertices` vertices,
    /// registering it in the relationship graph and the registry.
    ///
    /// # Errors
    /// Returns `Err(ComponentKindMismatch)` if `kind` is a collection kind.
    pub fn create_mesh_component(
        &mut self,
        kind: ComponentKind,
        nb_vertices: usize,
    ) -> Result<ComponentId, ModelWeldError> {
        if kind.is_collection() {
            return Err(ModelWeldError::ComponentKindMismatch {
                kind,
                expected: "mesh",
            });
        }
        let id = self.fresh_id(kind);
        let (registry, relations, _, components, _) = self.model.parts_mut();
        relations.register_component(id)?;
        registry.add_mesh_component(kind, id.uid());
        components.insert(id, Component::new(id, nb_vertices));
        log::debug!("created mesh component {id} with {nb_vertices} vertex(es)");
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.model.debug_assert_invariants();
        Ok(id)
    }

    /// Creates a collection component of `kind`, registering it in the
    /// relationship graph and the registry. Collections own no mesh.
    ///
    /// # Errors
    /// Returns `Err(ComponentKindMismatch)` if `kind` is a mesh kind.
    pub fn create_collection_component(
        &mut self,
        kind: ComponentKind,
    ) -> Result<ComponentId, ModelWeldError> {
        if !kind.is_collection() {
            return Err(ModelWeldError::ComponentKindMismatch {
                kind,
                expected: "collection",
            });
        }
        let id = self.fresh_id(kind);
        let (registry, relations, _, _, _) = self.model.parts_mut();
        relations.register_component(id)?;
        registry.add_collection_component(kind, id.uid());
        log::debug!("created collection component {id}");
        Ok(id)
    }

    /// Removes a component (mesh or collection), cascading: vertex links
    /// first, then relations, then the registry entry, then the component
    /// itself.
    ///
    /// # Errors
    /// Returns `Err(ComponentNotFound)` if `id` is not part of the model.
    pub fn remove_component(&mut self, id: ComponentId) -> Result<(), ModelWeldError> {
        if !self.model.relationship_graph().is_registered(id) {
            return Err(ModelWeldError::ComponentNotFound(id));
        }
        let (registry, relations, vertices, components, _) = self.model.parts_mut();
        vertices.unregister_component(id);
        relations.unregister_component(id)?;
        if id.is_collection() {
            registry.remove_collection_component(id.kind(), id.uid());
        } else {
            registry.remove_mesh_component(id.kind(), id.uid());
        }
        components.remove(&id);
        log::debug!("removed component {id}");
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.model.debug_assert_invariants();
        Ok(())
    }

    fn component_mut(&mut self, id: ComponentId) -> Result<&mut Component, ModelWeldError> {
        let (_, _, _, components, _) = self.model.parts_mut();
        components
            .get_mut(&id)
            .ok_or(ModelWeldError::ComponentNotFound(id))
    }

    /// Write access to the vertex attribute store of a mesh component.
    ///
    /// Attribute creation and value edits go through here; structural edits
    /// of the element set itself must use
    /// [`delete_vertices`](Self::delete_vertices) /
    /// [`permute_vertices`](Self::permute_vertices) so the vertex identifier
    /// stays consistent.
    ///
    /// # Errors
    /// Returns `Err(ComponentNotFound)` for collections and unknown ids.
    pub fn vertex_attributes_mut(
        &mut self,
        id: ComponentId,
    ) -> Result<&mut AttributeManager, ModelWeldError> {
        Ok(self.component_mut(id)?.vertex_attributes_mut())
    }

    /// Appends `nb` vertices to a mesh component; returns the index of the
    /// first new vertex. New slots read each attribute's default value.
    ///
    /// # Errors
    /// Returns `Err(ComponentNotFound)` for collections and unknown ids.
    pub fn create_vertices(
        &mut self,
        id: ComponentId,
        nb: usize,
    ) -> Result<usize, ModelWeldError> {
        let manager = self.component_mut(id)?.vertex_attributes_mut();
        let first = manager.size();
        manager.resize(first + nb);
        Ok(first)
    }

    /// Deletes the flagged vertices (`true` = remove) of a mesh component,
    /// then rewrites the component's unique-vertex links per the resulting
    /// mapping. Returns the mapping.
    ///
    /// # Errors
    /// `ComponentNotFound` for collections and unknown ids,
    /// `MappingLengthMismatch` if the mask does not cover the vertex set.
    pub fn delete_vertices(
        &mut self,
        id: ComponentId,
        mask: &[bool],
    ) -> Result<Old2New, ModelWeldError> {
        let map = self
            .component_mut(id)?
            .vertex_attributes_mut()
            .delete_elements(mask)?;
        let (_, _, vertices, _, _) = self.model.parts_mut();
        vertices.update_unique_vertices(id, &map)?;
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.model.debug_assert_invariants();
        Ok(map)
    }

    /// Permutes the vertices of a mesh component (`perm[old] = new`), then
    /// rewrites the component's unique-vertex links accordingly. Returns the
    /// mapping.
    ///
    /// # Errors
    /// `ComponentNotFound` for collections and unknown ids,
    /// `MappingLengthMismatch` / `InvalidPermutation` for a bad permutation.
    pub fn permute_vertices(
        &mut self,
        id: ComponentId,
        perm: &[u32],
    ) -> Result<Old2New, ModelWeldError> {
        let map = self
            .component_mut(id)?
            .vertex_attributes_mut()
            .permute_elements(perm)?;
        let (_, _, vertices, _, _) = self.model.parts_mut();
        vertices.update_unique_vertices(id, &map)?;
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.model.debug_assert_invariants();
        Ok(map)
    }

    /// Records `boundary` as a boundary of `incidence`. Idempotent.
    ///
    /// # Errors
    /// Returns `Err(ComponentNotFound)` if either endpoint is unregistered.
    pub fn add_boundary_incidence(
        &mut self,
        boundary: ComponentId,
        incidence: ComponentId,
    ) -> Result<(), ModelWeldError> {
        let (_, relations, _, _, _) = self.model.parts_mut();
        relations.add_boundary_incidence(boundary, incidence)
    }

    /// Records `item` as belonging to `collection`. Idempotent.
    ///
    /// # Errors
    /// `ComponentNotFound` for unregistered endpoints, `NotACollection` /
    /// `NotAMeshComponent` if the two sides are in the wrong partitions.
    pub fn add_item_in_collection(
        &mut self,
        item: ComponentId,
        collection: ComponentId,
    ) -> Result<(), ModelWeldError> {
        if !collection.is_collection() {
            return Err(ModelWeldError::NotACollection(collection));
        }
        if item.is_collection() {
            return Err(ModelWeldError::NotAMeshComponent(item));
        }
        let (_, relations, _, _, _) = self.model.parts_mut();
        relations.add_item_in_collection(item, collection)
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
        let (_, relations, _, _, _) = self.model.parts_mut();
        relations.add_internal_embedding(internal, embedding)
    }

    /// Removes a relation; a documented no-op when absent. Returns whether
    /// an edge was removed.
    pub fn remove_relation(
        &mut self,
        a: ComponentId,
        b: ComponentId,
        kind: RelationKind,
    ) -> bool {
        let (_, relations, _, _, _) = self.model.parts_mut();
        relations.remove_relation(a, b, kind)
    }

    /// Appends one fresh, unlinked unique vertex.
    pub fn create_unique_vertex(&mut self) -> UniqueVertexId {
        let (_, _, vertices, _, _) = self.model.parts_mut();
        vertices.create_unique_vertex()
    }

    /// Appends `nb` fresh, unlinked unique vertices; returns the first id.
    pub fn create_unique_vertices(&mut self, nb: usize) -> UniqueVertexId {
        let (_, _, vertices, _, _) = self.model.parts_mut();
        vertices.create_unique_vertices(nb)
    }

    /// Links a mesh-component vertex to a unique vertex, replacing any prior
    /// link for that vertex.
    ///
    /// On top of the identifier's own checks, the builder validates that the
    /// component exists and owns a vertex at that local index.
    ///
    /// # Errors
    /// `ComponentNotFound` / `IndexOutOfRange` for a bad mesh-component
    /// vertex, `UniqueVertexOutOfRange` for an unallocated unique vertex.
    pub fn set_unique_vertex(
        &mut self,
        mcv: MeshComponentVertex,
        unique: UniqueVertexId,
    ) -> Result<(), ModelWeldError> {
        let nb_vertices = self.model.component(mcv.component)?.nb_vertices();
        if mcv.vertex as usize >= nb_vertices {
            return Err(ModelWeldError::IndexOutOfRange {
                index: mcv.vertex as usize,
                size: nb_vertices,
            });
        }
        let (_, _, vertices, _, _) = self.model.parts_mut();
        vertices.set_unique_vertex(mcv, unique)
    }

    /// Removes the link carried by a mesh-component vertex.
    ///
    /// # Errors
    /// Returns `Err(VertexNotLinked)` if no link exists.
    pub fn unset_unique_vertex(
        &mut self,
        mcv: MeshComponentVertex,
    ) -> Result<(), ModelWeldError> {
        let (_, _, vertices, _, _) = self.model.parts_mut();
        vertices.unset_unique_vertex(mcv)
    }

    /// Removes unique vertices with zero links, compacting the global table;
    /// returns the compaction mapping.
    pub fn delete_isolated_vertices(&mut self) -> Old2New {
        let (_, _, vertices, _, _) = self.model.parts_mut();
        vertices.delete_isolated_vertices()
    }
}
