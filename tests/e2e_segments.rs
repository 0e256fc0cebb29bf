//! End-to-end tests for segment synthesis on curve and surface members.

use std::sync::Arc;

use serde_json::{json, Value};
use xmi_graph::{load, EntityKind, EntityType, ErrorKind, Graph, RelationshipType, SegmentType};

/// Four nodes along x, plus one off-axis node for arcs.
fn nodes() -> Value {
    json!([
        {"ID": "n1", "Point": {"X": 0.0, "Y": 0.0, "Z": 0.0}},
        {"ID": "n2", "Point": {"X": 4.0, "Y": 0.0, "Z": 0.0}},
        {"ID": "n3", "Point": {"X": 8.0, "Y": 0.0, "Z": 0.0}},
        {"ID": "n4", "Point": {"X": 12.0, "Y": 0.0, "Z": 0.0}},
        {"ID": "n5", "Point": {"X": 0.0, "Y": 4.0, "Z": 0.0}},
    ])
}

fn with_members(members: Value) -> Graph {
    load(&json!({
        "StructuralCurveMember": members,
        "StructuralPointConnection": nodes(),
    }))
    .unwrap()
}

/// Segments of `member`, ordered by their has-segment relationships.
fn segments_of<'g>(graph: &'g Graph, member: &str) -> Vec<&'g xmi_graph::model::Segment> {
    let member = graph.find_entity(member).unwrap();
    graph
        .targets_of(member, RelationshipType::HasSegment)
        .into_iter()
        .map(|e| match &e.kind {
            EntityKind::Segment(s) => s,
            other => panic!("expected a segment, got {other:?}"),
        })
        .collect()
}

// ============================================================================
// 1. N nodes -> N-1 segments, 2(N-1) has-node relationships
// ============================================================================

#[test]
fn test_segment_and_node_counts() {
    let graph = with_members(json!([{
        "ID": "cm-1", "CurveMemberType": "Beam",
        "Nodes": ["n1", "n2", "n3", "n4"], "Segments": ["Line", "Line", "Line"],
    }]));
    assert!(graph.is_complete(), "unexpected errors: {:?}", graph.errors());

    let segments = segments_of(&graph, "cm-1");
    let positions: Vec<usize> = segments.iter().map(|s| s.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    assert!(segments.iter().all(|s| s.segment_type == SegmentType::Line && s.geometry_supported));

    let has_node: Vec<_> = graph.relationships_by_type(RelationshipType::HasNode).collect();
    assert_eq!(has_node.len(), 6);
    let flags: Vec<_> = has_node.iter().filter_map(|r| r.kind.end_flags()).collect();
    assert_eq!(flags.iter().filter(|f| f.is_begin()).count(), 3);
    assert_eq!(flags.iter().filter(|f| f.is_end()).count(), 3);

    assert!(graph.entities_by_type(EntityType::Segment).all(|s| s.derived));
}

#[test]
fn test_segment_nodes_follow_path() {
    let graph = with_members(json!([{
        "ID": "cm-1", "CurveMemberType": "Column", "Nodes": "n1;n2;n3",
    }]));

    let member = graph.find_entity("cm-1").unwrap();
    let segment_entities = graph.targets_of(member, RelationshipType::HasSegment);
    let second = segment_entities[1];
    let links = graph.find_relationships_by_source(second, Some(RelationshipType::HasNode));
    let begin = links.iter().find(|r| r.kind.end_flags().unwrap().is_begin()).unwrap();
    let end = links.iter().find(|r| r.kind.end_flags().unwrap().is_end()).unwrap();
    assert_eq!(begin.target.as_str(), "n2");
    assert_eq!(end.target.as_str(), "n3");
}

#[test]
fn test_begin_end_node_fallback() {
    let graph = with_members(json!([{
        "ID": "cm-1", "CurveMemberType": "Bracing", "BeginNode": "n1", "EndNode": "n4",
    }]));
    assert_eq!(segments_of(&graph, "cm-1").len(), 1);
}

// ============================================================================
// 2. Geometry shares the nodes' points
// ============================================================================

#[test]
fn test_line_geometry_shares_node_points() {
    let graph = with_members(json!([{
        "ID": "cm-1", "CurveMemberType": "Beam", "Nodes": ["n1", "n2"],
    }]));

    let segment = graph.entities_by_type(EntityType::Segment).next().unwrap();
    let geometry = graph.targets_of(segment, RelationshipType::HasGeometry);
    let EntityKind::Line(line) = &geometry[0].kind else {
        panic!("expected a line");
    };
    let n1 = graph.find_entity("n1").unwrap().point().unwrap();
    let n2 = graph.find_entity("n2").unwrap().point().unwrap();
    assert!(Arc::ptr_eq(&line.start, n1));
    assert!(Arc::ptr_eq(&line.end, n2));
    assert_eq!(line.length(), 4.0);
}

#[test]
fn test_arc_segment_with_center() {
    let graph = with_members(json!([{
        "ID": "cm-1", "CurveMemberType": "Beam",
        "Nodes": ["n2", "n5"], "Segments": ["Circular Arc"],
        "SegmentCenters": [{"X": 0.0, "Y": 0.0, "Z": 0.0}],
    }]));
    assert!(graph.is_complete(), "unexpected errors: {:?}", graph.errors());

    let arcs: Vec<_> = graph.entities_by_type(EntityType::Arc).collect();
    assert_eq!(arcs.len(), 1);
    let EntityKind::Arc(arc) = &arcs[0].kind else { unreachable!() };
    // The center lands on n1's coordinate and is deduplicated against it.
    let n1 = graph.find_entity("n1").unwrap().point().unwrap();
    assert!(Arc::ptr_eq(&arc.center, n1));
    assert_eq!(arc.effective_radius(), 4.0);
}

#[test]
fn test_arc_without_center_rejects_member() {
    let graph = with_members(json!([{
        "ID": "cm-1", "CurveMemberType": "Beam", "Nodes": ["n2", "n5"], "Segments": ["Circular Arc"],
    }]));
    assert!(graph.find_entity("cm-1").is_none());
    assert_eq!(graph.entities_by_type(EntityType::Segment).count(), 0);
    assert_eq!(graph.errors()[0].kind, ErrorKind::ValidationFailure);
}

// ============================================================================
// 3. Unsupported segment types are kept without geometry
// ============================================================================

#[test]
fn test_unsupported_segment_type() {
    let graph = with_members(json!([{
        "ID": "cm-1", "CurveMemberType": "Beam",
        "Nodes": ["n1", "n2", "n3"], "Segments": ["Line", "Bezier"],
    }]));

    assert!(graph.find_entity("cm-1").is_some());
    let segments = segments_of(&graph, "cm-1");
    assert_eq!(segments.len(), 2);
    assert!(segments[0].geometry_supported);
    assert!(!segments[1].geometry_supported);
    assert_eq!(segments[1].segment_type, SegmentType::Bezier);

    assert_eq!(graph.entities_by_type(EntityType::Line).count(), 1);
    assert_eq!(graph.errors_of_kind(ErrorKind::UnsupportedVariant).count(), 1);
    assert_eq!(graph.error_count(), 1);
}

// ============================================================================
// 4. Invalid paths reject the member before anything is appended
// ============================================================================

#[test]
fn test_invalid_paths() {
    let graph = with_members(json!([
        {"ID": "short", "CurveMemberType": "Beam", "Nodes": ["n1"]},
        {"ID": "mismatch", "CurveMemberType": "Beam", "Nodes": ["n1", "n2", "n3"], "Segments": ["Line"]},
        {"ID": "ghost", "CurveMemberType": "Beam", "Nodes": ["n1", "n99"]},
        {"ID": "bad-type", "CurveMemberType": "Beam", "Nodes": ["n1", "n2"], "Segments": ["Zigzag"]},
        {"ID": "ok", "CurveMemberType": "Beam", "Nodes": ["n3", "n4"]},
    ]));

    for rejected in ["short", "mismatch", "ghost", "bad-type"] {
        assert!(graph.find_entity(rejected).is_none(), "{rejected} should be rejected");
    }
    assert!(graph.find_entity("ok").is_some());
    assert_eq!(graph.entities_by_type(EntityType::Segment).count(), 1);

    assert_eq!(graph.errors_of_kind(ErrorKind::ValidationFailure).count(), 3);
    assert_eq!(graph.errors_of_kind(ErrorKind::UnresolvedReference).count(), 1);
}

#[test]
fn test_node_must_be_point_connection() {
    let graph = load(&json!({
        "StructuralMaterial": [{"ID": "m1", "MaterialType": "Steel"}],
        "StructuralPointConnection": nodes(),
        "StructuralCurveMember": [{"ID": "cm-1", "CurveMemberType": "Beam", "Nodes": ["n1", "m1"]}],
    }))
    .unwrap();
    assert!(graph.find_entity("cm-1").is_none());
    assert_eq!(graph.errors()[0].kind, ErrorKind::ConstraintViolation);
}

// ============================================================================
// 5. Surface members
// ============================================================================

#[test]
fn test_surface_member_boundary() {
    let graph = load(&json!({
        "StructuralMaterial": [{"ID": "m1", "MaterialType": "Concrete"}],
        "StructuralPointConnection": nodes(),
        "StructuralSurfaceMember": [{
            "ID": "sm-1", "SurfaceMemberType": "Slab", "Thickness": 0.2, "Material": "m1",
            "SystemPlane": "Middle", "SpanType": "Two Way",
            "Nodes": ["n1", "n2", "n5", "n1"],
        }],
    }))
    .unwrap();
    assert!(graph.is_complete(), "unexpected errors: {:?}", graph.errors());

    assert_eq!(segments_of(&graph, "sm-1").len(), 3);
    let member = graph.find_entity("sm-1").unwrap();
    assert!(member.is_analytical());
    assert_eq!(graph.targets_of(member, RelationshipType::HasMaterial).len(), 1);
}

#[test]
fn test_surface_member_requires_thickness() {
    let graph = load(&json!({
        "StructuralPointConnection": nodes(),
        "StructuralSurfaceMember": [{"ID": "sm-1", "SurfaceMemberType": "Wall", "Nodes": ["n1", "n2"]}],
    }))
    .unwrap();
    assert!(graph.find_entity("sm-1").is_none());
    assert!(graph.errors()[0].message.contains("Thickness"));
}
