//! End-to-end tests for the loading pipeline.
//!
//! Each test exercises: order sections -> build entities -> resolve
//! relationships, through the public `load` / `load_with` entry points.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use xmi_graph::{
    load, load_with, EntityKind, EntityType, Error, ErrorKind, LoadOptions, Loader,
    RelationshipType,
};

/// A small frame, with sections deliberately out of dependency order.
fn frame() -> Value {
    json!({
        "Name": "Frame",
        "XmiVersion": "2.0",
        "ApplicationName": "Designer",
        "XmiBeam": [
            {"ID": "b-1", "SystemLine": "Middle Middle", "Length": 10.0}
        ],
        "StructuralCurveMember": [{
            "ID": "cm-1", "CurveMemberType": "Beam", "SystemLine": "Middle Middle",
            "CrossSection": "cs-1", "Nodes": ["n1", "n2", "n3"], "Segments": ["Line", "Line"],
        }],
        "StructuralCrossSection": [
            {"ID": "cs-1", "Shape": "Rectangular", "Parameters": [0.3, 0.6], "Material": "mat-1", "Area": 0.18}
        ],
        "StructuralPointConnection": [
            {"ID": "n1", "Point": {"X": 0.0, "Y": 0.0, "Z": 0.0}},
            {"ID": "n2", "Point": {"X": 5.0, "Y": 0.0, "Z": 0.0}},
            {"ID": "n3", "Point": {"X": 10.0, "Y": 0.0, "Z": 0.0}},
        ],
        "StructuralMaterial": [
            {"ID": "mat-1", "Name": "C30/37", "MaterialType": "Concrete", "Grade": 30.0}
        ],
        "Relationships": [
            {"EntityType": "XmiHasStructuralCurveMember", "Source": "b-1", "Target": "cm-1"}
        ],
    })
}

// ============================================================================
// 1. Full document loads without errors
// ============================================================================

#[test]
fn test_frame_loads_completely() {
    let graph = load(&frame()).unwrap();

    assert!(graph.is_complete(), "unexpected errors: {:?}", graph.errors());
    // 1 material, 3 nodes, 1 cross-section, 1 member, 2 segments, 2 lines, 1 beam
    assert_eq!(graph.entity_count(), 11);
    // has-material, has-cross-section, 2 x (has-segment + 2 has-node + has-geometry), bridge
    assert_eq!(graph.relationship_count(), 11);

    assert_eq!(graph.entities_by_type(EntityType::Segment).count(), 2);
    assert_eq!(graph.entities_by_type(EntityType::Line).count(), 2);
    assert_eq!(graph.relationships_by_type(RelationshipType::HasCurveMember).count(), 1);
}

// ============================================================================
// 2. Document metadata
// ============================================================================

#[test]
fn test_document_info() {
    let graph = load(&frame()).unwrap();
    let info = graph.info();
    assert_eq!(info.name.as_deref(), Some("Frame"));
    assert_eq!(info.xmi_version.as_deref(), Some("2.0"));
    assert_eq!(info.application_name.as_deref(), Some("Designer"));
    assert_eq!(info.application_version, None);
}

// ============================================================================
// 3. Dependency order: references resolve regardless of section order
// ============================================================================

#[test]
fn test_inline_references_resolve_across_sections() {
    let graph = load(&frame()).unwrap();

    let member = graph.find_entity("cm-1").unwrap();
    let sections = graph.targets_of(member, RelationshipType::HasCrossSection);
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].id.as_str(), "cs-1");

    let section = graph.find_entity("cs-1").unwrap();
    let materials = graph.targets_of(section, RelationshipType::HasMaterial);
    assert_eq!(materials[0].name, "C30/37");
}

// ============================================================================
// 4. One bad record never aborts the batch
// ============================================================================

#[test]
fn test_material_batch_with_one_invalid_enum() {
    let graph = load(&json!({
        "StructuralMaterial": [
            {"ID": "m1", "MaterialType": "Concrete"},
            {"ID": "m2", "MaterialType": "Steel"},
            {"ID": "m3", "MaterialType": "Kryptonite"},
            {"ID": "m4", "MaterialType": "Timber"},
        ]
    }))
    .unwrap();

    assert_eq!(graph.entities_by_type(EntityType::Material).count(), 3);
    assert_eq!(graph.error_count(), 1);

    let err = &graph.errors()[0];
    assert_eq!(err.kind, ErrorKind::ValidationFailure);
    assert_eq!(err.section, "StructuralMaterial");
    assert_eq!(err.index, 2);
    assert_eq!(err.discriminator.as_deref(), Some("XmiStructuralMaterial"));
    assert!(err.message.contains("Kryptonite"));
    assert_eq!(err.raw_record.as_ref().unwrap()["ID"], json!("m3"));
}

#[test]
fn test_missing_required_field() {
    let graph = load(&json!({
        "XmiStorey": [{"ID": "s1", "Name": "Level 1"}]
    }))
    .unwrap();
    assert_eq!(graph.entity_count(), 0);
    assert_eq!(graph.errors()[0].kind, ErrorKind::ValidationFailure);
    assert!(graph.errors()[0].message.contains("StoreyElevation"));
}

#[test]
fn test_non_finite_coordinate_rejected() {
    let graph = load(&json!({
        "StructuralPointConnection": [
            {"ID": "n1", "Point": {"X": "NaN", "Y": 0.0, "Z": 0.0}},
            {"ID": "n2", "Point": {"X": 1.0, "Y": 0.0, "Z": 0.0}},
        ]
    }))
    .unwrap();
    assert_eq!(graph.entity_count(), 1);
    assert_eq!(graph.errors_of_kind(ErrorKind::ValidationFailure).count(), 1);
}

// ============================================================================
// 5. Duplicate ids
// ============================================================================

#[test]
fn test_duplicate_id_keeps_first_record() {
    let graph = load(&json!({
        "StructuralMaterial": [
            {"ID": "m1", "MaterialType": "Concrete"},
            {"ID": "m1", "MaterialType": "Steel"},
        ]
    }))
    .unwrap();

    assert_eq!(graph.entity_count(), 1);
    let EntityKind::Material(m) = &graph.find_entity("m1").unwrap().kind else {
        panic!("m1 should be a material");
    };
    assert_eq!(m.material_type.as_str(), "Concrete");
    assert_eq!(graph.errors()[0].kind, ErrorKind::ValidationFailure);
    assert_eq!(graph.errors()[0].index, 1);
}

// ============================================================================
// 6. Unknown discriminators
// ============================================================================

#[test]
fn test_unknown_section_and_record_tags() {
    let graph = load(&json!({
        "XmiSpaceStation": [{"ID": "x1"}, {"ID": "x2"}],
        "Entities": [
            {"EntityType": "XmiSlab", "ID": "slab-1"},
            {"EntityType": "XmiWarpCore", "ID": "w1"},
        ],
    }))
    .unwrap();

    assert_eq!(graph.entity_count(), 1);
    assert_eq!(graph.errors_of_kind(ErrorKind::UnknownDiscriminator).count(), 3);
}

#[test]
fn test_mixed_entities_section_orders_dependencies() {
    let graph = load(&json!({
        "Entities": [
            {"EntityType": "XmiStructuralCrossSection", "ID": "cs", "Shape": "Circular", "Material": "m"},
            {"EntityType": "XmiStructuralMaterial", "ID": "m", "MaterialType": "Steel"},
        ]
    }))
    .unwrap();

    assert!(graph.is_complete(), "unexpected errors: {:?}", graph.errors());
    let cs = graph.find_entity("cs").unwrap();
    assert_eq!(graph.targets_of(cs, RelationshipType::HasMaterial).len(), 1);
}

// ============================================================================
// 7. Fatal errors
// ============================================================================

#[test]
fn test_malformed_documents_are_fatal() {
    assert!(matches!(load(&json!("not a mapping")), Err(Error::MalformedInput(_))));
    assert!(matches!(
        load(&json!({"Relationships": "oops"})),
        Err(Error::MalformedInput(_))
    ));
}

#[test]
fn test_non_mapping_record_is_logged() {
    let graph = load(&json!({"StructuralMaterial": [42, {"ID": "m1", "MaterialType": "Steel"}]})).unwrap();
    assert_eq!(graph.entity_count(), 1);
    assert_eq!(graph.errors()[0].kind, ErrorKind::ValidationFailure);
    assert_eq!(graph.errors()[0].index, 0);
}

// ============================================================================
// 8. Independent loads
// ============================================================================

#[test]
fn test_repeated_loads_are_independent() {
    let raw = frame();
    let loader = Loader::default();
    let first = loader.load(&raw).unwrap();
    let second = loader.load(&raw).unwrap();

    assert_eq!(first.entity_count(), second.entity_count());
    assert_eq!(first.relationship_count(), second.relationship_count());
    assert_eq!(first.error_count(), second.error_count());

    let a = first.find_entity("n1").unwrap().point().unwrap();
    let b = second.find_entity("n1").unwrap().point().unwrap();
    assert_eq!(a, b);
    assert!(!Arc::ptr_eq(a, b), "point instances leaked between loads");
}

#[test]
fn test_custom_tolerance() {
    let raw = json!({
        "StructuralPointConnection": [
            {"ID": "n1", "Point": {"X": 0.0, "Y": 0.0, "Z": 0.0}},
            {"ID": "n2", "Point": {"X": 0.004, "Y": 0.0, "Z": 0.0}},
        ]
    });

    let strict = load(&raw).unwrap();
    let p1 = strict.find_entity("n1").unwrap().point().unwrap();
    let p2 = strict.find_entity("n2").unwrap().point().unwrap();
    assert!(!Arc::ptr_eq(p1, p2));

    let options = LoadOptions { tolerance: 0.01, ..LoadOptions::default() };
    let loose = load_with(&raw, &options).unwrap();
    let p1 = loose.find_entity("n1").unwrap().point().unwrap();
    let p2 = loose.find_entity("n2").unwrap().point().unwrap();
    assert!(Arc::ptr_eq(p1, p2));
}

#[test]
fn test_graph_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<xmi_graph::Graph>();
}
