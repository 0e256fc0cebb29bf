//! Discriminator registry.
//!
//! Static mapping from record tags (`XmiStructuralMaterial`,
//! `StructuralMaterial`, ...) to the closed entity and relationship variants.
//! Several spellings map to one variant: the `Xmi`-prefixed v2 tag, the
//! unprefixed v1 section name, and historical aliases. Lookup is exact first,
//! then ASCII case-insensitive.

use crate::model::enums::Domain;
use crate::{Error, Result};

// ============================================================================
// Entity types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityType {
    Material,
    PointConnection,
    CrossSection,
    CurveMember,
    SurfaceMember,
    Segment,
    Point,
    Line,
    Arc,
    Storey,
    Unit,
    Beam,
    Column,
    Slab,
    Wall,
}

impl EntityType {
    pub const ALL: [EntityType; 15] = [
        EntityType::Material,
        EntityType::PointConnection,
        EntityType::CrossSection,
        EntityType::CurveMember,
        EntityType::SurfaceMember,
        EntityType::Segment,
        EntityType::Point,
        EntityType::Line,
        EntityType::Arc,
        EntityType::Storey,
        EntityType::Unit,
        EntityType::Beam,
        EntityType::Column,
        EntityType::Slab,
        EntityType::Wall,
    ];

    /// Every tag accepted for this variant. The first one is canonical.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            EntityType::Material => &["XmiStructuralMaterial", "XmiMaterial", "StructuralMaterial"],
            EntityType::PointConnection => &["XmiStructuralPointConnection", "StructuralPointConnection"],
            EntityType::CrossSection => &["XmiStructuralCrossSection", "XmiCrossSection", "StructuralCrossSection"],
            EntityType::CurveMember => &["XmiStructuralCurveMember", "StructuralCurveMember"],
            EntityType::SurfaceMember => &["XmiStructuralSurfaceMember", "StructuralSurfaceMember"],
            EntityType::Segment => &["XmiSegment"],
            EntityType::Point => &["XmiPoint3D"],
            EntityType::Line => &["XmiLine3D"],
            EntityType::Arc => &["XmiArc3D"],
            EntityType::Storey => &["XmiStorey", "XmiStructuralStorey", "StructuralStorey"],
            EntityType::Unit => &["XmiUnit", "XmiStructuralUnit", "StructuralUnit"],
            EntityType::Beam => &["XmiBeam"],
            EntityType::Column => &["XmiColumn"],
            EntityType::Slab => &["XmiSlab"],
            EntityType::Wall => &["XmiWall"],
        }
    }

    pub fn discriminator(&self) -> &'static str {
        self.aliases()[0]
    }

    pub fn from_discriminator(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.aliases().contains(&tag))
            .or_else(|| {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|t| t.aliases().iter().any(|a| a.eq_ignore_ascii_case(tag)))
            })
    }

    pub fn domain(&self) -> Domain {
        match self {
            EntityType::Beam | EntityType::Column | EntityType::Slab | EntityType::Wall => Domain::Physical,
            EntityType::PointConnection | EntityType::CurveMember | EntityType::SurfaceMember => {
                Domain::StructuralAnalytical
            }
            EntityType::Point | EntityType::Line | EntityType::Arc => Domain::Geometry,
            EntityType::Material
            | EntityType::CrossSection
            | EntityType::Segment
            | EntityType::Storey
            | EntityType::Unit => Domain::Shared,
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.discriminator())
    }
}

// ============================================================================
// Relationship types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationshipType {
    HasMaterial,
    HasCrossSection,
    HasNode,
    HasSegment,
    HasGeometry,
    HasCurveMember,
    HasStorey,
    HasLine,
    HasPoint,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 9] = [
        RelationshipType::HasMaterial,
        RelationshipType::HasCrossSection,
        RelationshipType::HasNode,
        RelationshipType::HasSegment,
        RelationshipType::HasGeometry,
        RelationshipType::HasCurveMember,
        RelationshipType::HasStorey,
        RelationshipType::HasLine,
        RelationshipType::HasPoint,
    ];

    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            RelationshipType::HasMaterial => {
                &["XmiHasStructuralMaterial", "XmiHasMaterial", "XmiRelHasStructuralMaterial"]
            }
            RelationshipType::HasCrossSection => &[
                "XmiHasCrossSection",
                "XmiHasStructuralCrossSection",
                "XmiRelHasCrossSection",
                "XmiRelHasStructuralCrossSection",
            ],
            RelationshipType::HasNode => &[
                "XmiHasStructuralPointConnection",
                "XmiHasStructuralNode",
                "XmiRelHasStructuralPointConnection",
            ],
            RelationshipType::HasSegment => &["XmiHasSegment", "XmiRelHasSegment"],
            RelationshipType::HasGeometry => &["XmiHasGeometry", "XmiRelHasGeometry"],
            RelationshipType::HasCurveMember => {
                &["XmiHasStructuralCurveMember", "XmiRelHasStructuralCurveMember"]
            }
            RelationshipType::HasStorey => {
                &["XmiHasStructuralStorey", "XmiHasStorey", "XmiRelHasStructuralStorey"]
            }
            RelationshipType::HasLine => &["XmiHasLine3D", "XmiRelHasLine3D"],
            RelationshipType::HasPoint => &["XmiHasPoint3D", "XmiRelHasPoint3D"],
        }
    }

    pub fn discriminator(&self) -> &'static str {
        self.aliases()[0]
    }

    pub fn from_discriminator(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.aliases().contains(&tag))
            .or_else(|| {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|t| t.aliases().iter().any(|a| a.eq_ignore_ascii_case(tag)))
            })
    }

    /// Name given to relationships whose record supplies none.
    pub fn default_name(&self) -> &'static str {
        match self {
            RelationshipType::HasMaterial => "hasStructuralMaterial",
            RelationshipType::HasCrossSection => "hasStructuralCrossSection",
            RelationshipType::HasNode => "hasStructuralPointConnection",
            RelationshipType::HasSegment => "hasSegment",
            RelationshipType::HasGeometry => "hasGeometry",
            RelationshipType::HasCurveMember => "hasStructuralCurveMember",
            RelationshipType::HasStorey => "hasStructuralStorey",
            RelationshipType::HasLine => "hasLine3D",
            RelationshipType::HasPoint => "hasPoint3D",
        }
    }

    /// Whether records of this type carry `IsBegin` / `IsEnd`.
    pub fn has_end_flags(&self) -> bool {
        matches!(
            self,
            RelationshipType::HasNode | RelationshipType::HasGeometry | RelationshipType::HasPoint
        )
    }

    /// Entity types accepted as the target of this relationship.
    pub fn allowed_targets(&self) -> &'static [EntityType] {
        match self {
            RelationshipType::HasMaterial => &[EntityType::Material],
            RelationshipType::HasCrossSection => &[EntityType::CrossSection],
            RelationshipType::HasNode => &[EntityType::PointConnection],
            RelationshipType::HasSegment => &[EntityType::Segment],
            RelationshipType::HasGeometry => &[EntityType::Point, EntityType::Line, EntityType::Arc],
            RelationshipType::HasCurveMember => &[EntityType::CurveMember],
            RelationshipType::HasStorey => &[EntityType::Storey],
            RelationshipType::HasLine => &[EntityType::Line],
            RelationshipType::HasPoint => &[EntityType::Point],
        }
    }

    /// Domain the source must belong to, if the relationship restricts it.
    pub fn required_source_domain(&self) -> Option<Domain> {
        match self {
            RelationshipType::HasCurveMember => Some(Domain::Physical),
            _ => None,
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.discriminator())
    }
}

// ============================================================================
// Lookup
// ============================================================================

/// A resolved discriminator tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Discriminator {
    Entity(EntityType),
    Relationship(RelationshipType),
}

impl Discriminator {
    /// Resolve a tag, entity variants first.
    pub fn lookup(tag: &str) -> Result<Self> {
        EntityType::from_discriminator(tag)
            .map(Discriminator::Entity)
            .or_else(|| RelationshipType::from_discriminator(tag).map(Discriminator::Relationship))
            .ok_or_else(|| Error::UnknownDiscriminator(tag.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Discriminator::Entity(t) => t.discriminator(),
            Discriminator::Relationship(t) => t.discriminator(),
        }
    }
}
