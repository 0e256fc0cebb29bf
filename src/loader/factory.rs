//! Entity factory: one raw record in, one typed entity out.

use std::sync::Arc;

use serde_json::Value;

use super::order::{record_tag, SectionKind};
use super::segments;
use super::{LoadContext, PendingLink, RecordSite};
use crate::model::geometry::{Arc3D, Line3D, Point3D};
use crate::model::record::{keys, RawRecord};
use crate::model::{
    CoordinateForm, CrossSection, CurveMember, Entity, EntityId, EntityKind, Key, ListForm,
    LocalAxes, Material, MemberPath, NodeForm, NodeOffsets, PhysicalCurve, PointConnection,
    RelationshipKind, SectionProperties, SegmentForm, SegmentType, Storey, SurfaceMember,
    UnitDescriptor,
};
use crate::registry::{Discriminator, EntityType};
use crate::{Error, Result};

/// Build one entity from the record at `site` and append it to the graph.
/// Failures are logged on the graph; nothing is returned.
pub(super) fn load_entity<'a>(ctx: &mut LoadContext<'a>, kind: SectionKind, site: RecordSite<'a>) {
    let entity_type = match resolve_type(kind, &site) {
        Ok(t) => t,
        Err(e) => return ctx.fail(&site, e),
    };
    let site = site.tagged(entity_type.discriminator());
    if let Err(e) = build(ctx, entity_type, &site) {
        ctx.fail(&site, e);
    }
}

/// The record's own tag wins over the section's type.
fn resolve_type(kind: SectionKind, site: &RecordSite<'_>) -> Result<EntityType> {
    let section_type = match kind {
        SectionKind::Entities(t) => t,
        SectionKind::Relationships(_) => None,
    };
    let tag = match (record_tag(site.raw), section_type) {
        (Some(tag), _) => tag,
        (None, Some(t)) => return Ok(t),
        (None, None) => return Err(Error::UnknownDiscriminator(site.section.to_string())),
    };
    match Discriminator::lookup(tag)? {
        Discriminator::Entity(t) => Ok(t),
        Discriminator::Relationship(_) => Err(Error::invalid(
            "EntityType",
            format!("'{tag}' names a relationship, not an entity"),
        )),
    }
}

fn build<'a>(ctx: &mut LoadContext<'a>, entity_type: EntityType, site: &RecordSite<'a>) -> Result<()> {
    let record = RawRecord::from_value(site.raw)?;
    let kind = construct(ctx, entity_type, &record)?;

    // Member paths are checked against the graph before anything is appended.
    let resolved_path = match kind.member_path() {
        Some(path) => Some(segments::resolve_path(&ctx.graph, path)?),
        None => None,
    };

    let entity = with_base_fields(&record, kind)?;
    let entity = ctx.graph.insert_entity(entity)?.clone();

    defer_inline_references(ctx, &entity, site);

    if let (Some(path), Some(resolved)) = (entity.kind.member_path(), resolved_path) {
        segments::synthesize(ctx, &entity.id, path, &resolved, site)?;
    }
    Ok(())
}

/// Id, name, description and external ids shared by every entity.
fn with_base_fields(record: &RawRecord<'_>, kind: EntityKind) -> Result<Entity> {
    let id = record
        .opt_filled_id(keys::ID)?
        .map(EntityId::from)
        .unwrap_or_else(EntityId::generate);
    let mut entity = Entity::new(id, kind);
    if let Some(name) = record.opt_str(keys::NAME)?.filter(|n| !n.is_empty()) {
        entity.name = name;
    }
    entity.description = record.opt_str(keys::DESCRIPTION)?;
    entity.ifcguid = record.opt_str(keys::IFCGUID)?;
    entity.native_id = record.opt_id(keys::NATIVE_ID)?;
    Ok(entity)
}

// ============================================================================
// Variant constructors
// ============================================================================

fn construct(ctx: &mut LoadContext<'_>, entity_type: EntityType, r: &RawRecord<'_>) -> Result<EntityKind> {
    Ok(match entity_type {
        EntityType::Material => EntityKind::Material(Material {
            material_type: r.require_enum(keys::MATERIAL_TYPE)?,
            grade: r.opt_f64(keys::GRADE)?,
            unit_weight: r.opt_f64(keys::UNIT_WEIGHT)?,
            e_modulus: r.opt_triple(keys::E_MODULUS)?,
            g_modulus: r.opt_triple(keys::G_MODULUS)?,
            poisson_ratio: r.opt_triple(keys::POISSON_RATIO)?,
            thermal_coefficient: r.opt_f64(keys::THERMAL_COEFFICIENT)?,
        }),
        EntityType::PointConnection => {
            let (coordinates, coordinate_form) = match r.opt_record(keys::POINT)? {
                Some(_) => (r.require_point(keys::POINT)?, CoordinateForm::Nested),
                None if r.has(keys::X) => (r.coordinates()?, CoordinateForm::Flat),
                None => return Err(Error::MissingField(keys::POINT.external.into())),
            };
            EntityKind::PointConnection(PointConnection {
                point: ctx.points.get_or_create_point(coordinates)?,
                storey: r.opt_id(keys::STOREY)?.map(EntityId::from),
                coordinate_form,
            })
        }
        EntityType::CrossSection => {
            let parameters = r.opt_number_list(keys::PARAMETERS)?.unwrap_or_default();
            if let Some(bad) = parameters.iter().find(|p| **p < 0.0) {
                return Err(Error::invalid(
                    keys::PARAMETERS.external,
                    format!("parameters must be non-negative, got {bad}"),
                ));
            }
            EntityKind::CrossSection(CrossSection {
                shape: r.require_enum(keys::SHAPE)?,
                parameters,
                parameter_form: list_form(r, keys::PARAMETERS),
                material: r.opt_id(keys::MATERIAL)?.map(EntityId::from),
                properties: section_properties(r)?,
            })
        }
        EntityType::CurveMember => EntityKind::CurveMember(CurveMember {
            member_type: r.require_enum(keys::CURVE_MEMBER_TYPE)?,
            system_line: r.opt_enum(keys::SYSTEM_LINE)?,
            cross_section: r.opt_id(keys::CROSS_SECTION)?.map(EntityId::from),
            path: member_path(r)?,
            axes: local_axes(r)?,
            offsets: node_offsets(r)?,
            length: r.opt_non_negative(keys::LENGTH)?,
            end_fixity_start: r.opt_f64(keys::END_FIXITY_START)?,
            end_fixity_end: r.opt_f64(keys::END_FIXITY_END)?,
        }),
        EntityType::SurfaceMember => EntityKind::SurfaceMember(SurfaceMember {
            member_type: r.require_enum(keys::SURFACE_MEMBER_TYPE)?,
            system_plane: r.opt_enum(keys::SYSTEM_PLANE)?,
            span_type: r.opt_enum(keys::SPAN_TYPE)?,
            material: r.opt_id(keys::MATERIAL)?.map(EntityId::from),
            path: member_path(r)?,
            thickness: r
                .opt_non_negative(keys::THICKNESS)?
                .ok_or_else(|| Error::MissingField(keys::THICKNESS.external.into()))?,
            area: r.opt_non_negative(keys::AREA)?,
            z_offset: r.f64_or(keys::Z_OFFSET, 0.0)?,
            axes: local_axes(r)?,
            height: r.opt_f64(keys::HEIGHT)?,
        }),
        EntityType::Segment => {
            return Err(Error::invalid(
                keys::ENTITY_TYPE.external,
                "segments are derived from member records and cannot be supplied directly",
            ));
        }
        EntityType::Point => EntityKind::Point(ctx.points.get_or_create_point(r.coordinates()?)?),
        EntityType::Line => EntityKind::Line(Line3D {
            start: shared_point(ctx, r, keys::START_POINT)?,
            end: shared_point(ctx, r, keys::END_POINT)?,
        }),
        EntityType::Arc => EntityKind::Arc(Arc3D {
            start: shared_point(ctx, r, keys::START_POINT)?,
            end: shared_point(ctx, r, keys::END_POINT)?,
            center: shared_point(ctx, r, keys::CENTER_POINT)?,
            radius: r.opt_non_negative(keys::RADIUS)?,
        }),
        EntityType::Storey => EntityKind::Storey(Storey {
            elevation: r.require_f64(keys::STOREY_ELEVATION)?,
            mass: r.opt_f64(keys::STOREY_MASS)?,
            horizontal_reaction_x: r.opt_str(keys::STOREY_REACTION_X)?,
            horizontal_reaction_y: r.opt_str(keys::STOREY_REACTION_Y)?,
            vertical_reaction: r.opt_str(keys::STOREY_VERTICAL_REACTION)?,
        }),
        EntityType::Unit => EntityKind::Unit(UnitDescriptor {
            entity: r.require_str(keys::ENTITY)?,
            attribute: r.require_str(keys::ATTRIBUTE)?,
            unit: r.require_enum(keys::UNIT)?,
        }),
        EntityType::Beam => EntityKind::Beam(physical_curve(r)?),
        EntityType::Column => EntityKind::Column(physical_curve(r)?),
        EntityType::Slab => EntityKind::Slab,
        EntityType::Wall => EntityKind::Wall,
    })
}

fn shared_point(ctx: &mut LoadContext<'_>, r: &RawRecord<'_>, key: crate::model::Key) -> Result<Arc<Point3D>> {
    let p = r.require_point(key)?;
    ctx.points.get_or_create_point(p)
}

fn section_properties(r: &RawRecord<'_>) -> Result<SectionProperties> {
    Ok(SectionProperties {
        area: r.opt_non_negative(keys::AREA)?,
        second_moment_x: r.opt_non_negative(keys::SECOND_MOMENT_X)?,
        second_moment_y: r.opt_non_negative(keys::SECOND_MOMENT_Y)?,
        radius_of_gyration_x: r.opt_non_negative(keys::GYRATION_X)?,
        radius_of_gyration_y: r.opt_non_negative(keys::GYRATION_Y)?,
        elastic_modulus_x: r.opt_non_negative(keys::ELASTIC_MODULUS_X)?,
        elastic_modulus_y: r.opt_non_negative(keys::ELASTIC_MODULUS_Y)?,
        plastic_modulus_x: r.opt_non_negative(keys::PLASTIC_MODULUS_X)?,
        plastic_modulus_y: r.opt_non_negative(keys::PLASTIC_MODULUS_Y)?,
        torsional_constant: r.opt_non_negative(keys::TORSIONAL_CONSTANT)?,
    })
}

fn local_axes(r: &RawRecord<'_>) -> Result<LocalAxes> {
    let default = LocalAxes::default();
    Ok(LocalAxes {
        x: r.triple_or(keys::LOCAL_AXIS_X, default.x)?,
        y: r.triple_or(keys::LOCAL_AXIS_Y, default.y)?,
        z: r.triple_or(keys::LOCAL_AXIS_Z, default.z)?,
    })
}

fn node_offsets(r: &RawRecord<'_>) -> Result<NodeOffsets> {
    Ok(NodeOffsets {
        begin: [
            r.f64_or(keys::BEGIN_NODE_X_OFFSET, 0.0)?,
            r.f64_or(keys::BEGIN_NODE_Y_OFFSET, 0.0)?,
            r.f64_or(keys::BEGIN_NODE_Z_OFFSET, 0.0)?,
        ],
        end: [
            r.f64_or(keys::END_NODE_X_OFFSET, 0.0)?,
            r.f64_or(keys::END_NODE_Y_OFFSET, 0.0)?,
            r.f64_or(keys::END_NODE_Z_OFFSET, 0.0)?,
        ],
    })
}

fn physical_curve(r: &RawRecord<'_>) -> Result<PhysicalCurve> {
    Ok(PhysicalCurve {
        system_line: r.opt_enum(keys::SYSTEM_LINE)?,
        length: r.opt_non_negative(keys::LENGTH)?,
        axes: local_axes(r)?,
        offsets: node_offsets(r)?,
        end_fixity_start: fixity_text(r, keys::END_FIXITY_START)?,
        end_fixity_end: fixity_text(r, keys::END_FIXITY_END)?,
    })
}

/// Physical end fixities are free text; numeric codes are kept as text.
fn fixity_text(r: &RawRecord<'_>, key: Key) -> Result<Option<String>> {
    match r.get(key) {
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        _ => r.opt_str(key),
    }
}

// ============================================================================
// Member paths
// ============================================================================

/// Node list, segment types and arc centers of a member record.
///
/// `Nodes` falls back to `BeginNode`/`EndNode`; absent `Segments` means all
/// lines.
fn member_path(r: &RawRecord<'_>) -> Result<MemberPath> {
    let (nodes, node_form) = match r.opt_id_list(keys::NODES)? {
        Some(nodes) => match list_form(r, keys::NODES) {
            ListForm::List => (nodes, NodeForm::List),
            ListForm::Joined => (nodes, NodeForm::Joined),
        },
        None => match (r.opt_id(keys::BEGIN_NODE)?, r.opt_id(keys::END_NODE)?) {
            (Some(begin), Some(end)) => (vec![begin, end], NodeForm::BeginEnd),
            (None, None) => (Vec::new(), NodeForm::List),
            (Some(_), None) => return Err(Error::MissingField(keys::END_NODE.external.into())),
            (None, Some(_)) => return Err(Error::MissingField(keys::BEGIN_NODE.external.into())),
        },
    };
    if nodes.len() < 2 {
        return Err(Error::invalid(
            keys::NODES.external,
            format!("a member path needs at least 2 nodes, got {}", nodes.len()),
        ));
    }
    let span_count = nodes.len() - 1;

    let (segment_types, segment_form) = match segment_types(r)? {
        Some((types, _)) if types.len() != span_count => {
            return Err(Error::invalid(
                keys::SEGMENTS.external,
                format!("{} nodes need {span_count} segments, got {}", nodes.len(), types.len()),
            ));
        }
        Some(found) => found,
        None => (vec![SegmentType::Line; span_count], SegmentForm::Names),
    };

    let arc_centers = match r.opt_list(keys::SEGMENT_CENTERS)? {
        None => Vec::new(),
        Some(items) if items.len() != span_count => {
            return Err(Error::invalid(
                keys::SEGMENT_CENTERS.external,
                format!("expected {span_count} entries, got {}", items.len()),
            ));
        }
        Some(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => Ok(None),
                other => RawRecord::from_value(other)?.coordinates().map(Some),
            })
            .collect::<Result<Vec<_>>>()?,
    };

    let path = MemberPath {
        nodes: nodes.into_iter().map(EntityId::from).collect(),
        segment_types,
        arc_centers,
        node_form,
        segment_form,
    };
    for (i, segment_type) in path.segment_types.iter().enumerate() {
        if segment_type.needs_center() && path.center(i).is_none() {
            return Err(Error::MissingField(format!("{}[{i}]", keys::SEGMENT_CENTERS.external)));
        }
    }
    Ok(path)
}

/// `;`-separated string or a plain list.
fn list_form(r: &RawRecord<'_>, key: Key) -> ListForm {
    match r.get(key) {
        Some(Value::String(_)) => ListForm::Joined,
        _ => ListForm::List,
    }
}

/// `Segments` as a list of type names (or `{SegmentType: ..}` mappings), or a
/// `;`-separated string.
fn segment_types(r: &RawRecord<'_>) -> Result<Option<(Vec<SegmentType>, SegmentForm)>> {
    let Some(value) = r.get(keys::SEGMENTS) else {
        return Ok(None);
    };
    let form = match value {
        Value::String(_) => SegmentForm::Joined,
        Value::Array(items) if items.iter().any(Value::is_object) => SegmentForm::Records,
        _ => SegmentForm::Names,
    };
    let names: Vec<&str> = match value {
        Value::String(s) => s.split(';').map(str::trim).filter(|p| !p.is_empty()).collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.as_str()),
                Value::Object(map) => map
                    .get("SegmentType")
                    .or_else(|| map.get("segment_type"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::MissingField(format!("{}.SegmentType", keys::SEGMENTS.external))),
                other => Err(Error::TypeError {
                    field: keys::SEGMENTS.external.into(),
                    expected: "segment type name".into(),
                    got: crate::model::record::json_type_name(other).into(),
                }),
            })
            .collect::<Result<_>>()?,
        other => {
            return Err(Error::TypeError {
                field: keys::SEGMENTS.external.into(),
                expected: "list of segment types".into(),
                got: crate::model::record::json_type_name(other).into(),
            });
        }
    };
    names
        .into_iter()
        .map(|name| {
            SegmentType::parse(name).ok_or_else(|| {
                Error::invalid(keys::SEGMENTS.external, format!("'{name}' is not a segment type"))
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(|types| Some((types, form)))
}

// ============================================================================
// Inline references
// ============================================================================

/// Queue the relationships implied by id fields on the entity itself. They
/// are linked after the entity pass, so section order does not matter.
fn defer_inline_references<'a>(ctx: &mut LoadContext<'a>, entity: &Entity, site: &RecordSite<'a>) {
    let links: Vec<(&EntityId, RelationshipKind)> = match &entity.kind {
        EntityKind::CrossSection(cs) => cs.material.iter().map(|m| (m, RelationshipKind::HasMaterial)).collect(),
        EntityKind::SurfaceMember(sm) => sm.material.iter().map(|m| (m, RelationshipKind::HasMaterial)).collect(),
        EntityKind::CurveMember(cm) => {
            cm.cross_section.iter().map(|c| (c, RelationshipKind::HasCrossSection)).collect()
        }
        EntityKind::PointConnection(pc) => pc.storey.iter().map(|s| (s, RelationshipKind::HasStorey)).collect(),
        _ => Vec::new(),
    };

    for (target, kind) in links {
        ctx.pending.push(PendingLink {
            site: *site,
            source: entity.id.clone(),
            target: target.clone(),
            kind,
        });
    }
}
