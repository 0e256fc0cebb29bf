//! Relationship (directed edge) in the structural graph.

use serde::{Deserialize, Serialize};

use crate::model::entity::EntityId;
use crate::registry::RelationshipType;

/// Relationship identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelId(pub String);

impl RelId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Which end of a path a node or geometry sits on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndFlags {
    pub is_begin: Option<bool>,
    pub is_end: Option<bool>,
}

impl EndFlags {
    pub const BEGIN: EndFlags = EndFlags { is_begin: Some(true), is_end: Some(false) };
    pub const END: EndFlags = EndFlags { is_begin: Some(false), is_end: Some(true) };

    pub fn is_begin(&self) -> bool {
        self.is_begin == Some(true)
    }

    pub fn is_end(&self) -> bool {
        self.is_end == Some(true)
    }
}

/// Closed set of relationship variants, with their variant-specific data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipKind {
    HasMaterial,
    HasCrossSection,
    HasNode(EndFlags),
    HasSegment,
    HasGeometry(EndFlags),
    /// Physical element to its analytical curve member.
    HasCurveMember,
    HasStorey,
    HasLine,
    HasPoint(EndFlags),
}

impl RelationshipKind {
    pub fn relationship_type(&self) -> RelationshipType {
        match self {
            RelationshipKind::HasMaterial => RelationshipType::HasMaterial,
            RelationshipKind::HasCrossSection => RelationshipType::HasCrossSection,
            RelationshipKind::HasNode(_) => RelationshipType::HasNode,
            RelationshipKind::HasSegment => RelationshipType::HasSegment,
            RelationshipKind::HasGeometry(_) => RelationshipType::HasGeometry,
            RelationshipKind::HasCurveMember => RelationshipType::HasCurveMember,
            RelationshipKind::HasStorey => RelationshipType::HasStorey,
            RelationshipKind::HasLine => RelationshipType::HasLine,
            RelationshipKind::HasPoint(_) => RelationshipType::HasPoint,
        }
    }

    /// Build the kind for `rel_type`, attaching `flags` where the variant carries them.
    pub fn with_flags(rel_type: RelationshipType, flags: EndFlags) -> Self {
        match rel_type {
            RelationshipType::HasMaterial => RelationshipKind::HasMaterial,
            RelationshipType::HasCrossSection => RelationshipKind::HasCrossSection,
            RelationshipType::HasNode => RelationshipKind::HasNode(flags),
            RelationshipType::HasSegment => RelationshipKind::HasSegment,
            RelationshipType::HasGeometry => RelationshipKind::HasGeometry(flags),
            RelationshipType::HasCurveMember => RelationshipKind::HasCurveMember,
            RelationshipType::HasStorey => RelationshipKind::HasStorey,
            RelationshipType::HasLine => RelationshipKind::HasLine,
            RelationshipType::HasPoint => RelationshipKind::HasPoint(flags),
        }
    }

    pub fn end_flags(&self) -> Option<EndFlags> {
        match self {
            RelationshipKind::HasNode(f)
            | RelationshipKind::HasGeometry(f)
            | RelationshipKind::HasPoint(f) => Some(*f),
            _ => None,
        }
    }
}

/// A directed "source has target" edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: RelId,
    pub name: String,
    pub description: Option<String>,
    pub uml_type: Option<String>,
    pub source: EntityId,
    pub target: EntityId,
    pub kind: RelationshipKind,
    pub derived: bool,
}

impl Relationship {
    /// New relationship with a generated id and the variant's default name.
    pub fn new(source: EntityId, target: EntityId, kind: RelationshipKind) -> Self {
        Self {
            id: RelId::generate(),
            name: kind.relationship_type().default_name().to_string(),
            description: None,
            uml_type: None,
            source,
            target,
            kind,
            derived: false,
        }
    }

    pub fn relationship_type(&self) -> RelationshipType {
        self.kind.relationship_type()
    }

    pub fn discriminator(&self) -> &'static str {
        self.relationship_type().discriminator()
    }
}
