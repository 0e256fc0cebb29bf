//! # Structural Graph Model
//!
//! Typed DTOs for the structural graph: entities, relationships, geometry and
//! the closed enumerations their records are validated against.
//! These types cross every boundary: loader ↔ graph ↔ export ↔ user.
//!
//! Design rule: NO raw JSON in the finished model. Records are parsed once
//! through `record::RawRecord` and never consulted again.
//! This module is pure data: no I/O and no global state.

pub mod enums;
pub mod unit;
pub mod geometry;
pub mod entity;
pub mod relationship;
pub mod record;

pub use enums::{
    Domain, MaterialType, Shape, CurveMemberType, SystemLine,
    SurfaceMemberType, SystemPlane, SpanType, SegmentType,
};
pub use unit::{Unit, Dimension, convert_value};
pub use geometry::{Point3D, Line3D, Arc3D};
pub use entity::{
    Entity, EntityId, EntityKind,
    Material, PointConnection, CrossSection, SectionProperties,
    CurveMember, SurfaceMember, MemberPath, LocalAxes, NodeOffsets,
    Segment, Storey, UnitDescriptor, PhysicalCurve,
    ListForm, CoordinateForm, NodeForm, SegmentForm,
};
pub use relationship::{Relationship, RelId, RelationshipKind, EndFlags};
pub use record::{RawRecord, Key};
