//! Export a loaded graph back into the interchange shape.
//!
//! ```text
//! Graph → export_document() → { "Name": .., "XmiStructuralMaterial": [..], .., "Relationships": [..] }
//!   → load() again reproduces the same entities and relationships
//! ```
//!
//! Only explicitly loaded data is written. Derived entities (segments and
//! their geometry) and derived relationships (segment links, inline
//! references) are omitted: a re-load derives them again from the member
//! and inline fields.

use std::io::Write;

use serde_json::{json, Map, Value};

use crate::graph::Graph;
use crate::model::record::{keys, Key};
use crate::model::{
    CoordinateForm, Entity, EntityKind, ListForm, LocalAxes, MemberPath, NodeForm, NodeOffsets,
    Point3D, Relationship, SegmentForm,
};
use crate::Result;

/// Section name for exported relationships.
pub const RELATIONSHIP_SECTION: &str = "Relationships";
/// Key for the exported error log. Skipped on load.
pub const ERROR_SECTION: &str = "Errors";

/// Export a graph as one JSON document.
pub fn export_document(graph: &Graph) -> Value {
    let mut doc = Map::new();
    let info = graph.info();
    for (key, value) in [
        ("Name", &info.name),
        ("XmiVersion", &info.xmi_version),
        ("ApplicationName", &info.application_name),
        ("ApplicationVersion", &info.application_version),
    ] {
        if let Some(v) = value {
            doc.insert(key.to_string(), Value::String(v.clone()));
        }
    }

    // One section per entity type, in first-appearance order.
    for entity in graph.entities().iter().filter(|e| !e.derived) {
        let section = doc
            .entry(entity.discriminator())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(records) = section {
            records.push(Value::Object(entity.to_record()));
        }
    }

    let relationships: Vec<Value> = graph
        .relationships()
        .iter()
        .filter(|r| !r.derived)
        .map(|r| Value::Object(r.to_record()))
        .collect();
    if !relationships.is_empty() {
        doc.insert(RELATIONSHIP_SECTION.to_string(), Value::Array(relationships));
    }

    if !graph.errors().is_empty() {
        let errors = graph
            .errors()
            .iter()
            .map(|e| serde_json::to_value(e).unwrap_or(Value::Null))
            .collect();
        doc.insert(ERROR_SECTION.to_string(), Value::Array(errors));
    }

    Value::Object(doc)
}

/// Export a graph as pretty-printed JSON text.
pub fn export_json_string(graph: &Graph) -> Result<String> {
    Ok(serde_json::to_string_pretty(&export_document(graph))?)
}

/// Write the exported document to `writer`.
pub fn export_json(graph: &Graph, writer: &mut dyn Write) -> Result<()> {
    serde_json::to_writer_pretty(writer, &export_document(graph))?;
    Ok(())
}

// ============================================================================
// Records
// ============================================================================

impl Entity {
    /// PascalCase record of this entity's set fields.
    pub fn to_record(&self) -> Map<String, Value> {
        let mut r = Map::new();
        put(&mut r, keys::ID, self.id.as_str());
        put(&mut r, keys::NAME, self.name.as_str());
        put(&mut r, keys::ENTITY_TYPE, self.discriminator());
        put_opt(&mut r, keys::DESCRIPTION, self.description.as_deref());
        put_opt(&mut r, keys::IFCGUID, self.ifcguid.as_deref());
        put_opt(&mut r, keys::NATIVE_ID, self.native_id.as_deref());

        match &self.kind {
            EntityKind::Material(m) => {
                put(&mut r, keys::MATERIAL_TYPE, m.material_type.as_str());
                put_opt(&mut r, keys::GRADE, m.grade);
                put_opt(&mut r, keys::UNIT_WEIGHT, m.unit_weight);
                put_opt(&mut r, keys::E_MODULUS, m.e_modulus.map(triple_value));
                put_opt(&mut r, keys::G_MODULUS, m.g_modulus.map(triple_value));
                put_opt(&mut r, keys::POISSON_RATIO, m.poisson_ratio.map(triple_value));
                put_opt(&mut r, keys::THERMAL_COEFFICIENT, m.thermal_coefficient);
            }
            EntityKind::PointConnection(pc) => {
                match pc.coordinate_form {
                    CoordinateForm::Nested => put(&mut r, keys::POINT, point_value(&pc.point)),
                    CoordinateForm::Flat => {
                        put(&mut r, keys::X, pc.point.x);
                        put(&mut r, keys::Y, pc.point.y);
                        put(&mut r, keys::Z, pc.point.z);
                    }
                }
                put_opt(&mut r, keys::STOREY, pc.storey.as_ref().map(|s| s.as_str()));
            }
            EntityKind::CrossSection(cs) => {
                put(&mut r, keys::SHAPE, cs.shape.as_str());
                let parameters = cs.parameters.iter().map(f64::to_string);
                match cs.parameter_form {
                    ListForm::List => put(&mut r, keys::PARAMETERS, cs.parameters.clone()),
                    ListForm::Joined => put(&mut r, keys::PARAMETERS, joined(parameters)),
                }
                put_opt(&mut r, keys::MATERIAL, cs.material.as_ref().map(|m| m.as_str()));
                let p = &cs.properties;
                put_opt(&mut r, keys::AREA, p.area);
                put_opt(&mut r, keys::SECOND_MOMENT_X, p.second_moment_x);
                put_opt(&mut r, keys::SECOND_MOMENT_Y, p.second_moment_y);
                put_opt(&mut r, keys::GYRATION_X, p.radius_of_gyration_x);
                put_opt(&mut r, keys::GYRATION_Y, p.radius_of_gyration_y);
                put_opt(&mut r, keys::ELASTIC_MODULUS_X, p.elastic_modulus_x);
                put_opt(&mut r, keys::ELASTIC_MODULUS_Y, p.elastic_modulus_y);
                put_opt(&mut r, keys::PLASTIC_MODULUS_X, p.plastic_modulus_x);
                put_opt(&mut r, keys::PLASTIC_MODULUS_Y, p.plastic_modulus_y);
                put_opt(&mut r, keys::TORSIONAL_CONSTANT, p.torsional_constant);
            }
            EntityKind::CurveMember(cm) => {
                put(&mut r, keys::CURVE_MEMBER_TYPE, cm.member_type.as_str());
                put_opt(&mut r, keys::SYSTEM_LINE, cm.system_line.map(|s| s.as_str()));
                put_opt(&mut r, keys::CROSS_SECTION, cm.cross_section.as_ref().map(|c| c.as_str()));
                put_path(&mut r, &cm.path);
                put_axes(&mut r, &cm.axes);
                put_offsets(&mut r, &cm.offsets);
                put_opt(&mut r, keys::LENGTH, cm.length);
                put_opt(&mut r, keys::END_FIXITY_START, cm.end_fixity_start);
                put_opt(&mut r, keys::END_FIXITY_END, cm.end_fixity_end);
            }
            EntityKind::SurfaceMember(sm) => {
                put(&mut r, keys::SURFACE_MEMBER_TYPE, sm.member_type.as_str());
                put_opt(&mut r, keys::SYSTEM_PLANE, sm.system_plane.map(|s| s.as_str()));
                put_opt(&mut r, keys::SPAN_TYPE, sm.span_type.map(|s| s.as_str()));
                put_opt(&mut r, keys::MATERIAL, sm.material.as_ref().map(|m| m.as_str()));
                put_path(&mut r, &sm.path);
                put(&mut r, keys::THICKNESS, sm.thickness);
                put_opt(&mut r, keys::AREA, sm.area);
                put(&mut r, keys::Z_OFFSET, sm.z_offset);
                put_axes(&mut r, &sm.axes);
                put_opt(&mut r, keys::HEIGHT, sm.height);
            }
            EntityKind::Segment(s) => {
                r.insert("Position".into(), json!(s.position));
                r.insert("SegmentType".into(), json!(s.segment_type.as_str()));
                r.insert("GeometrySupported".into(), json!(s.geometry_supported));
            }
            EntityKind::Point(p) => {
                put(&mut r, keys::X, p.x);
                put(&mut r, keys::Y, p.y);
                put(&mut r, keys::Z, p.z);
            }
            EntityKind::Line(line) => {
                put(&mut r, keys::START_POINT, point_value(&line.start));
                put(&mut r, keys::END_POINT, point_value(&line.end));
            }
            EntityKind::Arc(arc) => {
                put(&mut r, keys::START_POINT, point_value(&arc.start));
                put(&mut r, keys::END_POINT, point_value(&arc.end));
                put(&mut r, keys::CENTER_POINT, point_value(&arc.center));
                put_opt(&mut r, keys::RADIUS, arc.radius);
            }
            EntityKind::Storey(s) => {
                put(&mut r, keys::STOREY_ELEVATION, s.elevation);
                put_opt(&mut r, keys::STOREY_MASS, s.mass);
                put_opt(&mut r, keys::STOREY_REACTION_X, s.horizontal_reaction_x.as_deref());
                put_opt(&mut r, keys::STOREY_REACTION_Y, s.horizontal_reaction_y.as_deref());
                put_opt(&mut r, keys::STOREY_VERTICAL_REACTION, s.vertical_reaction.as_deref());
            }
            EntityKind::Unit(u) => {
                put(&mut r, keys::ENTITY, u.entity.as_str());
                put(&mut r, keys::ATTRIBUTE, u.attribute.as_str());
                put(&mut r, keys::UNIT, u.unit.as_str());
            }
            EntityKind::Beam(pc) | EntityKind::Column(pc) => {
                put_opt(&mut r, keys::SYSTEM_LINE, pc.system_line.map(|s| s.as_str()));
                put_opt(&mut r, keys::LENGTH, pc.length);
                put_axes(&mut r, &pc.axes);
                put_offsets(&mut r, &pc.offsets);
                put_opt(&mut r, keys::END_FIXITY_START, pc.end_fixity_start.as_deref());
                put_opt(&mut r, keys::END_FIXITY_END, pc.end_fixity_end.as_deref());
            }
            EntityKind::Slab | EntityKind::Wall => {}
        }
        r
    }
}

impl Relationship {
    /// PascalCase record with `Source`/`Target` ids.
    pub fn to_record(&self) -> Map<String, Value> {
        let mut r = Map::new();
        put(&mut r, keys::ID, self.id.as_str());
        put(&mut r, keys::NAME, self.name.as_str());
        put(&mut r, keys::ENTITY_TYPE, self.discriminator());
        put(&mut r, keys::SOURCE, self.source.as_str());
        put(&mut r, keys::TARGET, self.target.as_str());
        put_opt(&mut r, keys::DESCRIPTION, self.description.as_deref());
        put_opt(&mut r, keys::UML_TYPE, self.uml_type.as_deref());
        if let Some(flags) = self.kind.end_flags() {
            put_opt(&mut r, keys::IS_BEGIN, flags.is_begin);
            put_opt(&mut r, keys::IS_END, flags.is_end);
        }
        r
    }
}

// ============================================================================
// Field helpers
// ============================================================================

fn put(record: &mut Map<String, Value>, key: Key, value: impl Into<Value>) {
    record.insert(key.external.to_string(), value.into());
}

fn put_opt<T: Into<Value>>(record: &mut Map<String, Value>, key: Key, value: Option<T>) {
    if let Some(v) = value {
        put(record, key, v);
    }
}

/// `{X, Y, Z}` mapping.
pub fn point_value(p: &Point3D) -> Value {
    json!({ "X": p.x, "Y": p.y, "Z": p.z })
}

/// A scalar when all three components agree, else a list.
fn triple_value(t: [f64; 3]) -> Value {
    if t[0] == t[1] && t[1] == t[2] {
        json!(t[0])
    } else {
        json!(t)
    }
}

fn joined<S: AsRef<str>>(items: impl Iterator<Item = S>) -> String {
    items.map(|item| item.as_ref().to_string()).collect::<Vec<_>>().join(";")
}

/// Nodes and segments in the form the member record used.
fn put_path(record: &mut Map<String, Value>, path: &MemberPath) {
    let nodes = path.nodes.iter().map(|n| n.as_str());
    match (path.node_form, path.nodes.as_slice()) {
        (NodeForm::BeginEnd, [begin, end]) => {
            put(record, keys::BEGIN_NODE, begin.as_str());
            put(record, keys::END_NODE, end.as_str());
        }
        (NodeForm::Joined, _) => put(record, keys::NODES, joined(nodes)),
        _ => put(record, keys::NODES, nodes.map(Value::from).collect::<Vec<_>>()),
    }

    let types = path.segment_types.iter().map(|s| s.as_str());
    let segments = match path.segment_form {
        SegmentForm::Names => Value::from(types.map(Value::from).collect::<Vec<_>>()),
        SegmentForm::Joined => Value::from(joined(types)),
        SegmentForm::Records => types.map(|t| json!({ "SegmentType": t })).collect(),
    };
    put(record, keys::SEGMENTS, segments);
    if path.arc_centers.iter().any(Option::is_some) {
        let centers: Vec<Value> = path
            .arc_centers
            .iter()
            .map(|c| c.as_ref().map(point_value).unwrap_or(Value::Null))
            .collect();
        put(record, keys::SEGMENT_CENTERS, centers);
    }
}

fn put_axes(record: &mut Map<String, Value>, axes: &LocalAxes) {
    put(record, keys::LOCAL_AXIS_X, json!(axes.x));
    put(record, keys::LOCAL_AXIS_Y, json!(axes.y));
    put(record, keys::LOCAL_AXIS_Z, json!(axes.z));
}

fn put_offsets(record: &mut Map<String, Value>, offsets: &NodeOffsets) {
    for (key, value) in [
        (keys::BEGIN_NODE_X_OFFSET, offsets.begin[0]),
        (keys::BEGIN_NODE_Y_OFFSET, offsets.begin[1]),
        (keys::BEGIN_NODE_Z_OFFSET, offsets.begin[2]),
        (keys::END_NODE_X_OFFSET, offsets.end[0]),
        (keys::END_NODE_Y_OFFSET, offsets.end[1]),
        (keys::END_NODE_Z_OFFSET, offsets.end[2]),
    ] {
        put(record, key, value);
    }
}
