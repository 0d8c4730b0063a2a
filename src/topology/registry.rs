//! ComponentRegistry: per-kind bookkeeping of live component ids.
//!
//! Pure bookkeeping, split in two partitions: mesh components and collection
//! components. The registry lets higher layers enumerate the components of a
//! concrete kind without scanning the relationship graph. Removing an absent
//! entry is a documented no-op.

use std::collections::BTreeMap;

use crate::model_error::ModelWeldError;
use crate::topology::component::{ComponentId, ComponentKind, ComponentUid};

/// Kind → ids partitions for mesh and collection components.
///
/// Ids of one kind keep their insertion order; kinds enumerate in sorted
/// order, so the full registry view is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentRegistry {
    mesh: BTreeMap<ComponentKind, Vec<ComponentUid>>,
    collections: BTreeMap<ComponentKind, Vec<ComponentUid>>,
}

fn add(partition: &mut BTreeMap<ComponentKind, Vec<ComponentUid>>, kind: ComponentKind, uid: ComponentUid) {
    let ids = partition.entry(kind).or_default();
    if !ids.contains(&uid) {
        ids.push(uid);
    }
}

fn remove(partition: &mut BTreeMap<ComponentKind, Vec<ComponentUid>>, kind: ComponentKind, uid: ComponentUid) {
    if let Some(ids) = partition.get_mut(&kind) {
        ids.retain(|&id| id != uid);
        if ids.is_empty() {
            partition.remove(&kind);
        }
    }
}

impl ComponentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a mesh component. Adding a present entry is a no-op.
    pub fn add_mesh_component(&mut self, kind: ComponentKind, uid: ComponentUid) {
        add(&mut self.mesh, kind, uid);
    }

    /// Forgets a mesh component. Removing an absent entry is a no-op.
    pub fn remove_mesh_component(&mut self, kind: ComponentKind, uid: ComponentUid) {
        remove(&mut self.mesh, kind, uid);
    }

    /// Records a collection component. Adding a present entry is a no-op.
    pub fn add_collection_component(&mut self, kind: ComponentKind, uid: ComponentUid) {
        add(&mut self.collections, kind, uid);
    }

    /// Forgets a collection component. Removing an absent entry is a no-op.
    pub fn remove_collection_component(&mut self, kind: ComponentKind, uid: ComponentUid) {
        remove(&mut self.collections, kind, uid);
    }

    /// Full kind → ids view of the mesh partition.
    pub fn mesh_components(&self) -> &BTreeMap<ComponentKind, Vec<ComponentUid>> {
        &self.mesh
    }

    /// Full kind → ids view of the collection partition.
    pub fn collection_components(&self) -> &BTreeMap<ComponentKind, Vec<ComponentUid>> {
        &self.collections
    }

    /// Mesh component ids of one kind, in insertion order.
    pub fn mesh_components_of_kind(
        &self,
        kind: ComponentKind,
    ) -> impl Iterator<Item = ComponentId> + '_ {
        self.mesh
            .get(&kind)
            .into_iter()
            .flatten()
            .map(move |&uid| ComponentId::new(kind, uid))
    }

    /// Collection component ids of one kind, in insertion order.
    pub fn collection_components_of_kind(
        &self,
        kind: ComponentKind,
    ) -> impl Iterator<Item = ComponentId> + '_ {
        self.collections
            .get(&kind)
            .into_iter()
            .flatten()
            .map(move |&uid| ComponentId::new(kind, uid))
    }

    /// Total number of mesh components, all kinds.
    pub fn nb_mesh_components(&self) -> usize {
        self.mesh.values().map(Vec::len).sum()
    }

    /// Total number of collection components, all kinds.
    pub fn nb_collection_components(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    /// Snapshots the registry as one versioned record.
    pub fn to_record(&self) -> ComponentRegistryRecord {
        let flatten = |partition: &BTreeMap<ComponentKind, Vec<ComponentUid>>| {
            partition
                .iter()
                .flat_map(|(&kind, ids)| ids.iter().map(move |&uid| (kind, uid)))
                .collect()
        };
        ComponentRegistryRecord {
            version: COMPONENT_REGISTRY_RECORD_VERSION,
            mesh: flatten(&self.mesh),
            collections: flatten(&self.collections),
        }
    }

    /// Rebuilds a registry from a versioned record.
    ///
    /// # Errors
    /// Returns `Err(UnsupportedFormatVersion)` for an unknown version tag.
    pub fn from_record(record: &ComponentRegistryRecord) -> Result<Self, ModelWeldError> {
        match record.version {
            1 => {
                let mut registry = Self::new();
                for &(kind, uid) in &record.mesh {
                    registry.add_mesh_component(kind, uid);
                }
                for &(kind, uid) in &record.collections {
                    registry.add_collection_component(kind, uid);
                }
                Ok(registry)
            }
            version => Err(ModelWeldError::UnsupportedFormatVersion {
                record: "ComponentRegistry",
                version,
            }),
        }
    }
}

/// Record version currently written by [`ComponentRegistry::to_record`].
pub const COMPONENT_REGISTRY_RECORD_VERSION: u32 = 1;

/// Versioned snapshot of one [`ComponentRegistry`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ComponentRegistryRecord {
    pub version: u32,
    pub mesh: Vec<(ComponentKind, ComponentUid)>,
    pub collections: Vec<(ComponentKind, ComponentUid)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(raw: u64) -> ComponentUid {
        ComponentUid::new(raw).unwrap()
    }

    #[test]
    fn add_enumerate_remove() {
        let mut registry = ComponentRegistry::new();
        registry.add_mesh_component(ComponentKind::Line, uid(1));
        registry.add_mesh_component(ComponentKind::Line, uid(2));
        registry.add_mesh_component(ComponentKind::Surface, uid(3));
        registry.add_collection_component(ComponentKind::LineCollection, uid(4));

        assert_eq!(registry.nb_mesh_components(), 3);
        assert_eq!(registry.nb_collection_components(), 1);
        let lines: Vec<_> = registry
            .mesh_components_of_kind(ComponentKind::Line)
            .map(|id| id.uid())
            .collect();
        assert_eq!(lines, vec![uid(1), uid(2)]);

        registry.remove_mesh_component(ComponentKind::Line, uid(1));
        assert_eq!(registry.nb_mesh_components(), 2);
        // Removing an absent entry is a no-op.
        registry.remove_mesh_component(ComponentKind::Line, uid(1));
        registry.remove_collection_component(ComponentKind::BlockCollection, uid(9));
        assert_eq!(registry.nb_mesh_components(), 2);
        assert_eq!(registry.nb_collection_components(), 1);
    }

    #[test]
    fn duplicate_add_is_a_noop() {
        let mut registry = ComponentRegistry::new();
        registry.add_mesh_component(ComponentKind::Corner, uid(5));
        registry.add_mesh_component(ComponentKind::Corner, uid(5));
        assert_eq!(registry.nb_mesh_components(), 1);
    }

    #[test]
    fn partitions_are_independent() {
        let mut registry = ComponentRegistry::new();
        registry.add_mesh_component(ComponentKind::Surface, uid(1));
        registry.add_collection_component(ComponentKind::SurfaceCollection, uid(1));
        registry.remove_mesh_component(ComponentKind::Surface, uid(1));
        assert_eq!(registry.nb_collection_components(), 1);
        assert!(registry.mesh_components().is_empty());
    }

    #[test]
    fn record_roundtrip() {
        let mut registry = ComponentRegistry::new();
        registry.add_mesh_component(ComponentKind::Block, uid(1));
        registry.add_mesh_component(ComponentKind::Corner, uid(2));
        registry.add_collection_component(ComponentKind::BlockCollection, uid(3));
        let record = registry.to_record();
        let back = ComponentRegistry::from_record(&record).unwrap();
        assert_eq!(back, registry);
    }

    #[test]
    fn unknown_record_version_is_rejected() {
        let record = ComponentRegistryRecord {
            version: 2,
            mesh: vec![],
            collections: vec![],
        };
        assert!(matches!(
            ComponentRegistry::from_record(&record).unwrap_err(),
            ModelWeldError::UnsupportedFormatVersion {
                record: "ComponentRegistry",
                version: 2
            }
        ));
    }
}
