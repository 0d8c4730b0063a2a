//! Model: the composition root owning the shared consistency structures.
//!
//! A `Model` owns one [`ComponentRegistry`], one [`RelationshipGraph`], one
//! [`VertexIdentifier`], and the live mesh components (each holding the
//! [`AttributeManager`] of its vertex element set). Components never store
//! back-pointers to the shared structures; every operation that must touch
//! topology or vertex identity goes through the model, which passes
//! references down.
//!
//! All mutation flows through [`ModelBuilder`], obtained from
//! [`Model::builder`]; the model's fields are private, so the builder's entry
//! points are the only mutating surface.

pub mod builder;

use std::collections::BTreeMap;

use crate::attribute::AttributeManager;
use crate::debug_invariants::DebugInvariants;
use crate::model_error::ModelWeldError;
use crate::topology::component::ComponentId;
use crate::topology::registry::ComponentRegistry;
use crate::topology::relations::RelationshipGraph;
use crate::vertex::VertexIdentifier;

pub use builder::ModelBuilder;

/// One mesh component: its id plus the attribute manager of its vertex
/// element set.
///
/// Collection components own no mesh and therefore have no `Component`
/// entry; they exist only in the registry and the relationship graph.
#[derive(Clone, Debug)]
pub struct Component {
    id: ComponentId,
    vertex_attributes: AttributeManager,
}

impl Component {
    pub(crate) fn new(id: ComponentId, nb_vertices: usize) -> Self {
        Self {
            id,
            vertex_attributes: AttributeManager::new(nb_vertices),
        }
    }

    /// This component's id.
    #[inline]
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Number of vertices in this component's mesh.
    #[inline]
    pub fn nb_vertices(&self) -> usize {
        self.vertex_attributes.size()
    }

    /// Attribute store of the vertex element set.
    #[inline]
    pub fn vertex_attributes(&self) -> &AttributeManager {
        &self.vertex_attributes
    }

    pub(crate) fn vertex_attributes_mut(&mut self) -> &mut AttributeManager {
        &mut self.vertex_attributes
    }
}

/// A multi-component model: registry, relationship graph, vertex identifier,
/// and the mesh components themselves.
#[derive(Clone, Debug, Default)]
pub struct Model {
    registry: ComponentRegistry,
    relations: RelationshipGraph,
    vertices: VertexIdentifier,
    components: BTreeMap<ComponentId, Component>,
    next_uid: u64,
}

impl Model {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// The builder, sole mutating entry point of this model.
    pub fn builder(&mut self) -> ModelBuilder<'_> {
        ModelBuilder::new(self)
    }

    /// The mesh component with id `id`.
    ///
    /// # Errors
    /// Returns `Err(ComponentNotFound)` for collections and unknown ids.
    pub fn component(&self, id: ComponentId) -> Result<&Component, ModelWeldError> {
        self.components
            .get(&id)
            .ok_or(ModelWeldError::ComponentNotFound(id))
    }

    /// All mesh components, in deterministic id order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    /// Number of mesh components.
    #[inline]
    pub fn nb_components(&self) -> usize {
        self.components.len()
    }

    /// The model's relationship graph (read-only).
    #[inline]
    pub fn relationship_graph(&self) -> &RelationshipGraph {
        &self.relations
    }

    /// The model's vertex identifier (read-only).
    #[inline]
    pub fn vertex_identifier(&self) -> &VertexIdentifier {
        &self.vertices
    }

    /// The model's component registry (read-only).
    #[inline]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub(crate) fn parts_mut(
        &mut self,
    ) -> (
        &mut ComponentRegistry,
        &mut RelationshipGraph,
        &mut VertexIdentifier,
        &mut BTreeMap<ComponentId, Component>,
        &mut u64,
    ) {
        (
            &mut self.registry,
            &mut self.relations,
            &mut self.vertices,
            &mut self.components,
            &mut self.next_uid,
        )
    }
}

impl DebugInvariants for Model {
    fn debug_assert_invariants(&self) {
        crate::weld_debug_assert_ok!(self.validate_invariants(), "Model invalid");
    }

    fn validate_invariants(&self) -> Result<(), ModelWeldError> {
        self.relations.validate_invariants()?;
        self.vertices.validate_invariants()?;
        // Every mesh component is registered in graph and registry.
        for &id in self.components.keys() {
            if !self.relations.is_registered(id) {
                return Err(ModelWeldError::ComponentNotFound(id));
            }
            if !self
                .registry
                .mesh_components_of_kind(id.kind())
                .any(|c| c == id)
            {
                return Err(ModelWeldError::ComponentNotFound(id));
            }
        }
        // Every vertex link points into an existing component's mesh.
        for unique in 0..self.vertices.nb_unique_vertices() {
            let unique = crate::vertex::UniqueVertexId::new(unique as u32);
            for &mcv in self.vertices.mesh_component_vertices(unique)? {
                let component = self
                    .components
                    .get(&mcv.component)
                    .ok_or(ModelWeldError::ComponentNotFound(mcv.component))?;
                if mcv.vertex as usize >= component.nb_vertices() {
                    return Err(ModelWeldError::IndexOutOfRange {
                        index: mcv.vertex as usize,
                        size: component.nb_vertices(),
                    });
                }
            }
        }
        Ok(())
    }
}
