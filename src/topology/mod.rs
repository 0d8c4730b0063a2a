//! Component identity, the typed relationship graph, and the component
//! registry.

pub mod component;
pub mod registry;
pub mod relations;

pub use component::{ComponentId, ComponentKind, ComponentUid};
pub use registry::{
    COMPONENT_REGISTRY_RECORD_VERSION, ComponentRegistry, ComponentRegistryRecord,
};
pub use relations::{
    RELATIONSHIP_GRAPH_RECORD_VERSION, RelationKind, RelationshipGraph, RelationshipGraphRecord,
};
