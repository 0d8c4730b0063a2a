use model_weld::attribute::{
    AttributeManager, AttributeManagerRecord, AttributeRepr, register_attribute_type,
};
use model_weld::model_error::ModelWeldError;
use model_weld::record::{record_from_bytes, record_to_bytes};
use model_weld::topology::component::{ComponentId, ComponentKind, ComponentUid};
use model_weld::topology::registry::ComponentRegistry;
use model_weld::topology::relations::RelationshipGraph;
use model_weld::vertex::{MeshComponentVertex, UniqueVertexId, VertexIdentifier};

fn cid(kind: ComponentKind, raw: u64) -> ComponentId {
    ComponentId::new(kind, ComponentUid::new(raw).unwrap())
}

#[test]
fn attribute_manager_survives_a_byte_trip() {
    let mut manager = AttributeManager::new(5);
    manager
        .create_or_find::<f64>("weight", 1.0, AttributeRepr::Dense)
        .unwrap()
        .set(2, 3.5)
        .unwrap();
    manager
        .create_or_find::<bool>("fixed", false, AttributeRepr::Constant)
        .unwrap();
    manager
        .create_or_find::<u32>("group", 0, AttributeRepr::Sparse)
        .unwrap()
        .set(4, 9)
        .unwrap();

    let bytes = record_to_bytes(&manager.to_record().unwrap()).unwrap();
    let record: AttributeManagerRecord = record_from_bytes(&bytes).unwrap();
    let back = AttributeManager::from_record(&record).unwrap();

    assert_eq!(back.size(), 5);
    assert_eq!(
        back.attribute_names().collect::<Vec<_>>(),
        vec!["weight", "fixed", "group"]
    );
    assert_eq!(*back.attribute::<f64>("weight").unwrap().get(2).unwrap(), 3.5);
    assert_eq!(back.attribute_repr("group").unwrap(), AttributeRepr::Sparse);
    assert_eq!(*back.attribute::<u32>("group").unwrap().get(4).unwrap(), 9);
    assert_eq!(*back.attribute::<u32>("group").unwrap().get(0).unwrap(), 0);
}

#[test]
fn custom_value_types_need_registration() {
    #[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Tag(String);

    let mut manager = AttributeManager::new(2);
    manager
        .create_or_find::<Tag>("marker", Tag("none".into()), AttributeRepr::Dense)
        .unwrap()
        .set(1, Tag("fault".into()))
        .unwrap();
    let record = manager.to_record().unwrap();

    // Before registration the decode names the missing type.
    assert!(matches!(
        AttributeManager::from_record(&record).unwrap_err(),
        ModelWeldError::UnknownAttributeType(_)
    ));

    register_attribute_type::<Tag>();
    let back = AttributeManager::from_record(&record).unwrap();
    assert_eq!(
        *back.attribute::<Tag>("marker").unwrap().get(1).unwrap(),
        Tag("fault".into())
    );
}

#[test]
fn relationship_graph_record_is_versioned() {
    let mut graph = RelationshipGraph::new();
    let surface = cid(ComponentKind::Surface, 1);
    let line = cid(ComponentKind::Line, 2);
    graph.register_component(surface).unwrap();
    graph.register_component(line).unwrap();
    graph.add_boundary_incidence(line, surface).unwrap();

    let mut record = graph.to_record();
    let bytes = record_to_bytes(&record).unwrap();
    let back = RelationshipGraph::from_record(&record_from_bytes(&bytes).unwrap()).unwrap();
    assert!(back.is_boundary(line, surface));

    record.version = 999;
    assert_eq!(
        RelationshipGraph::from_record(&record).unwrap_err(),
        ModelWeldError::UnsupportedFormatVersion {
            record: "RelationshipGraph",
            version: 999
        }
    );
}

#[test]
fn vertex_identifier_record_keeps_unlinked_vertices() {
    let mut identifier = VertexIdentifier::new();
    let a = cid(ComponentKind::Surface, 1);
    identifier.create_unique_vertices(5);
    identifier
        .set_unique_vertex(MeshComponentVertex::new(a, 0), UniqueVertexId::new(4))
        .unwrap();

    let bytes = record_to_bytes(&identifier.to_record()).unwrap();
    let back = VertexIdentifier::from_record(&record_from_bytes(&bytes).unwrap()).unwrap();
    assert_eq!(back.nb_unique_vertices(), 5);
    assert_eq!(
        back.unique_vertex(MeshComponentVertex::new(a, 0)).unwrap(),
        UniqueVertexId::new(4)
    );
    for unique in 0..4u32 {
        assert_eq!(
            back.nb_linked_mesh_component_vertices(UniqueVertexId::new(unique))
                .unwrap(),
            0
        );
    }
}

#[test]
fn registry_record_roundtrip() {
    let mut registry = ComponentRegistry::new();
    registry.add_mesh_component(ComponentKind::Corner, ComponentUid::new(1).unwrap());
    registry.add_collection_component(
        ComponentKind::CornerCollection,
        ComponentUid::new(2).unwrap(),
    );
    let bytes = record_to_bytes(&registry.to_record()).unwrap();
    let back = ComponentRegistry::from_record(&record_from_bytes(&bytes).unwrap()).unwrap();
    assert_eq!(back, registry);
}

#[test]
fn records_are_json_inspectable() {
    // The version tag is stored explicitly, never inferred from content.
    let graph = RelationshipGraph::new();
    let json = serde_json::to_value(graph.to_record()).unwrap();
    assert_eq!(json["version"], 1);
}
