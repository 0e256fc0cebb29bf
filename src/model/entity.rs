//! Entity: a typed node in the structural graph.

use std::borrow::Borrow;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::enums::{
    CurveMemberType, Domain, MaterialType, SegmentType, Shape, SpanType, SurfaceMemberType,
    SystemLine, SystemPlane,
};
use crate::model::geometry::{Arc3D, Line3D, Point3D};
use crate::model::unit::Unit;
use crate::registry::EntityType;

/// Globally unique entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random (v4) identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A node in the structural graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    /// Display name. Defaults to the id.
    pub name: String,
    pub description: Option<String>,
    pub ifcguid: Option<String>,
    pub native_id: Option<String>,
    /// Synthesized by the loader rather than read from a record.
    pub derived: bool,
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind) -> Self {
        Self {
            name: id.0.clone(),
            id,
            description: None,
            ifcguid: None,
            native_id: None,
            derived: false,
            kind,
        }
    }

    pub fn entity_type(&self) -> EntityType {
        self.kind.entity_type()
    }

    pub fn domain(&self) -> Domain {
        self.entity_type().domain()
    }

    /// Canonical discriminator tag of this entity's variant.
    pub fn discriminator(&self) -> &'static str {
        self.entity_type().discriminator()
    }

    pub fn is_physical(&self) -> bool {
        self.domain() == Domain::Physical
    }

    pub fn is_analytical(&self) -> bool {
        self.domain() == Domain::StructuralAnalytical
    }

    /// The shared point of a point connection or a geometric point.
    pub fn point(&self) -> Option<&Arc<Point3D>> {
        match &self.kind {
            EntityKind::PointConnection(pc) => Some(&pc.point),
            EntityKind::Point(p) => Some(p),
            _ => None,
        }
    }
}

// ============================================================================
// Variants
// ============================================================================

/// Closed set of entity variants.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Material(Material),
    PointConnection(PointConnection),
    CrossSection(CrossSection),
    CurveMember(CurveMember),
    SurfaceMember(SurfaceMember),
    Segment(Segment),
    Point(Arc<Point3D>),
    Line(Line3D),
    Arc(Arc3D),
    Storey(Storey),
    Unit(UnitDescriptor),
    Beam(PhysicalCurve),
    Column(PhysicalCurve),
    Slab,
    Wall,
}

impl EntityKind {
    pub fn entity_type(&self) -> EntityType {
        match self {
            EntityKind::Material(_) => EntityType::Material,
            EntityKind::PointConnection(_) => EntityType::PointConnection,
            EntityKind::CrossSection(_) => EntityType::CrossSection,
            EntityKind::CurveMember(_) => EntityType::CurveMember,
            EntityKind::SurfaceMember(_) => EntityType::SurfaceMember,
            EntityKind::Segment(_) => EntityType::Segment,
            EntityKind::Point(_) => EntityType::Point,
            EntityKind::Line(_) => EntityType::Line,
            EntityKind::Arc(_) => EntityType::Arc,
            EntityKind::Storey(_) => EntityType::Storey,
            EntityKind::Unit(_) => EntityType::Unit,
            EntityKind::Beam(_) => EntityType::Beam,
            EntityKind::Column(_) => EntityType::Column,
            EntityKind::Slab => EntityType::Slab,
            EntityKind::Wall => EntityType::Wall,
        }
    }

    /// Ordered node path of a curve or surface member.
    pub fn member_path(&self) -> Option<&MemberPath> {
        match self {
            EntityKind::CurveMember(m) => Some(&m.path),
            EntityKind::SurfaceMember(m) => Some(&m.path),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub material_type: MaterialType,
    pub grade: Option<f64>,
    pub unit_weight: Option<f64>,
    /// Per-axis values. A scalar record value fills all three.
    pub e_modulus: Option<[f64; 3]>,
    pub g_modulus: Option<[f64; 3]>,
    pub poisson_ratio: Option<[f64; 3]>,
    pub thermal_coefficient: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointConnection {
    pub point: Arc<Point3D>,
    pub storey: Option<EntityId>,
    pub coordinate_form: CoordinateForm,
}

// ============================================================================
// Record forms
//
// Several fields accept more than one spelling. The spelling a record used is
// kept so export writes the field back the same way.
// ============================================================================

/// `[..]` or one `;`-separated string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListForm {
    #[default]
    List,
    Joined,
}

/// Nested `Point: {X, Y, Z}` or flat `X`/`Y`/`Z` on the record itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoordinateForm {
    #[default]
    Nested,
    Flat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeForm {
    #[default]
    List,
    Joined,
    /// `BeginNode` and `EndNode` of a single-span member.
    BeginEnd,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SegmentForm {
    /// List of type names, or absent.
    #[default]
    Names,
    Joined,
    /// List of `{SegmentType: ..}` mappings.
    Records,
}

/// Section constants. All non-negative when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionProperties {
    pub area: Option<f64>,
    pub second_moment_x: Option<f64>,
    pub second_moment_y: Option<f64>,
    pub radius_of_gyration_x: Option<f64>,
    pub radius_of_gyration_y: Option<f64>,
    pub elastic_modulus_x: Option<f64>,
    pub elastic_modulus_y: Option<f64>,
    pub plastic_modulus_x: Option<f64>,
    pub plastic_modulus_y: Option<f64>,
    pub torsional_constant: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossSection {
    pub shape: Shape,
    pub parameters: Vec<f64>,
    pub parameter_form: ListForm,
    pub material: Option<EntityId>,
    pub properties: SectionProperties,
}

/// Local coordinate system of a member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalAxes {
    pub x: [f64; 3],
    pub y: [f64; 3],
    pub z: [f64; 3],
}

impl Default for LocalAxes {
    fn default() -> Self {
        Self {
            x: [1.0, 0.0, 0.0],
            y: [0.0, 1.0, 0.0],
            z: [0.0, 0.0, 1.0],
        }
    }
}

/// Eccentricities at both member ends, as `[x, y, z]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeOffsets {
    pub begin: [f64; 3],
    pub end: [f64; 3],
}

/// The node sequence of a member and the shape of each span between nodes.
///
/// `segment_types.len() == nodes.len() - 1` and `arc_centers` is either empty
/// or has one entry per segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberPath {
    pub nodes: Vec<EntityId>,
    pub segment_types: Vec<SegmentType>,
    pub arc_centers: Vec<Option<Point3D>>,
    pub node_form: NodeForm,
    pub segment_form: SegmentForm,
}

impl MemberPath {
    pub fn segment_count(&self) -> usize {
        self.segment_types.len()
    }

    pub fn center(&self, segment: usize) -> Option<Point3D> {
        self.arc_centers.get(segment).copied().flatten()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurveMember {
    pub member_type: CurveMemberType,
    pub system_line: Option<SystemLine>,
    pub cross_section: Option<EntityId>,
    pub path: MemberPath,
    pub axes: LocalAxes,
    pub offsets: NodeOffsets,
    pub length: Option<f64>,
    pub end_fixity_start: Option<f64>,
    pub end_fixity_end: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMember {
    pub member_type: SurfaceMemberType,
    pub system_plane: Option<SystemPlane>,
    pub span_type: Option<SpanType>,
    pub material: Option<EntityId>,
    pub path: MemberPath,
    pub thickness: f64,
    pub area: Option<f64>,
    pub z_offset: f64,
    pub axes: LocalAxes,
    pub height: Option<f64>,
}

/// One ordinal span of a member path. Always derived.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub position: usize,
    pub segment_type: SegmentType,
    /// False when no geometry could be built for `segment_type`.
    pub geometry_supported: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Storey {
    pub elevation: f64,
    pub mass: Option<f64>,
    pub horizontal_reaction_x: Option<String>,
    pub horizontal_reaction_y: Option<String>,
    pub vertical_reaction: Option<String>,
}

/// Declares the unit of one attribute of one entity kind.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitDescriptor {
    pub entity: String,
    pub attribute: String,
    pub unit: Unit,
}

/// Shared fields of beams and columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhysicalCurve {
    pub system_line: Option<SystemLine>,
    pub length: Option<f64>,
    pub axes: LocalAxes,
    pub offsets: NodeOffsets,
    pub end_fixity_start: Option<String>,
    pub end_fixity_end: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_defaults_to_id() {
        let e = Entity::new(EntityId::from("mat-1"), EntityKind::Slab);
        assert_eq!(e.name, "mat-1");
        assert!(!e.derived);
    }

    #[test]
    fn test_domain_from_variant() {
        let slab = Entity::new(EntityId::from("s"), EntityKind::Slab);
        assert!(slab.is_physical());
        assert_eq!(slab.discriminator(), "XmiSlab");

        let pc = Entity::new(
            EntityId::from("n"),
            EntityKind::PointConnection(PointConnection {
                point: Arc::new(Point3D::new(0.0, 0.0, 0.0)),
                storey: None,
                coordinate_form: CoordinateForm::Nested,
            }),
        );
        assert!(pc.is_analytical());
        assert!(pc.point().is_some());
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        assert_ne!(EntityId::generate(), EntityId::generate());
        assert_eq!(EntityId::generate().as_str().len(), 36);
    }

    #[test]
    fn test_member_path_center_lookup() {
        let path = MemberPath {
            nodes: vec!["a".into(), "b".into(), "c".into()],
            segment_types: vec![SegmentType::Line, SegmentType::CircularArc],
            arc_centers: vec![None, Some(Point3D::new(1.0, 1.0, 0.0))],
            ..MemberPath::default()
        };
        assert_eq!(path.segment_count(), 2);
        assert_eq!(path.center(0), None);
        assert_eq!(path.center(1), Some(Point3D::new(1.0, 1.0, 0.0)));
        assert_eq!(path.center(5), None);
    }
}
