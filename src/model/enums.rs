//! Closed string enumerations used by record validation.
//!
//! Every enum accepts its interchange spelling (`"Circular Arc"`), and falls
//! back to a lenient match that ignores case, spaces, `_` and `-`, so
//! `"CIRCULAR_ARC"` and `"circular arc"` resolve to the same member.

/// Lenient comparison form: lowercase ASCII alphanumerics only.
pub(crate) fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Interchange spelling.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }

            /// Exact spelling first, then the lenient form.
            pub fn parse(value: &str) -> Option<Self> {
                let trimmed = value.trim();
                if let Some(found) = Self::ALL.iter().copied().find(|v| v.as_str() == trimmed) {
                    return Some(found);
                }
                let wanted = $crate::model::enums::normalize(trimmed);
                Self::ALL.iter().copied().find(|v| {
                    $crate::model::enums::normalize(v.as_str()) == wanted
                        || $crate::model::enums::normalize(v.variant_name()) == wanted
                })
            }

            fn variant_name(&self) -> &'static str {
                match self {
                    $( $name::$variant => stringify!($variant) ),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::Error;

            fn from_str(s: &str) -> $crate::Result<Self> {
                Self::parse(s).ok_or_else(|| {
                    $crate::Error::invalid(
                        stringify!($name),
                        format!("'{s}' is not a valid {}", stringify!($name)),
                    )
                })
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::std::result::Result<Self, D::Error> {
                let raw = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                $name::parse(&raw).ok_or_else(|| {
                    <D::Error as ::serde::de::Error>::custom(format!(
                        "'{raw}' is not a valid {}",
                        stringify!($name)
                    ))
                })
            }
        }
    };
}

pub(crate) use string_enum;

string_enum! {
    /// Which branch of the model an entity belongs to. Derived from the
    /// entity variant, never read from a record.
    pub enum Domain {
        Physical => "Physical",
        StructuralAnalytical => "StructuralAnalytical",
        Geometry => "Geometry",
        Shared => "Shared",
    }
}

string_enum! {
    pub enum MaterialType {
        Concrete => "Concrete",
        Steel => "Steel",
        Timber => "Timber",
        Aluminium => "Aluminium",
        Composite => "Composite",
        Masonry => "Masonry",
        Others => "Others",
        /// Kept for older exports.
        Rebar => "Rebar",
        /// Kept for older exports.
        Tendon => "Tendon",
    }
}

string_enum! {
    /// Cross-section profile.
    pub enum Shape {
        Rectangular => "Rectangular",
        Circular => "Circular",
        LShape => "L Shape",
        TShape => "T Shape",
        CShape => "C Shape",
        IShape => "I Shape",
        SquareHollow => "Square Hollow",
        RectangularHollow => "Rectangular Hollow",
        Others => "Others",
        Unknown => "Unknown",
    }
}

string_enum! {
    pub enum CurveMemberType {
        Beam => "Beam",
        Column => "Column",
        Bracing => "Bracing",
        Other => "Other",
        Unknown => "Unknown",
    }
}

string_enum! {
    /// Reference line within the cross-section used as the member axis.
    pub enum SystemLine {
        TopLeft => "Top Left",
        TopMiddle => "Top Middle",
        TopRight => "Top Right",
        MiddleLeft => "Middle Left",
        MiddleMiddle => "Middle Middle",
        MiddleRight => "Middle Right",
        BottomLeft => "Bottom Left",
        BottomMiddle => "Bottom Middle",
        BottomRight => "Bottom Right",
        Unknown => "Unknown",
    }
}

string_enum! {
    pub enum SurfaceMemberType {
        Slab => "Slab",
        Wall => "Wall",
        PadFooting => "Pad Footing",
        StripFooting => "Strip Footing",
        Pilecap => "Pilecap",
        RoofPanel => "Roof Panel",
        WallPanel => "Wall Panel",
        Raft => "Raft",
        Unknown => "Unknown",
    }
}

string_enum! {
    /// Reference plane of a surface member.
    pub enum SystemPlane {
        Bottom => "Bottom",
        Top => "Top",
        Middle => "Middle",
        Left => "Left",
        Right => "Right",
        Unknown => "Unknown",
    }
}

string_enum! {
    pub enum SpanType {
        OneWay => "One Way",
        TwoWay => "Two Way",
        Unknown => "Unknown",
    }
}

string_enum! {
    /// Shape of one segment along a member path.
    pub enum SegmentType {
        Line => "Line",
        CircularArc => "Circular Arc",
        ParabolicArc => "Parabolic Arc",
        Bezier => "Bezier",
        Spline => "Spline",
        Others => "Others",
    }
}

impl SegmentType {
    /// Whether the loader can build geometry for this segment kind.
    pub fn has_geometry(&self) -> bool {
        matches!(self, SegmentType::Line | SegmentType::CircularArc)
    }

    /// Arcs need a center point in addition to their end nodes.
    pub fn needs_center(&self) -> bool {
        matches!(self, SegmentType::CircularArc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_spelling() {
        assert_eq!(MaterialType::parse("Concrete"), Some(MaterialType::Concrete));
        assert_eq!(Shape::parse("I Shape"), Some(Shape::IShape));
        assert_eq!(SystemLine::parse("Top Middle"), Some(SystemLine::TopMiddle));
    }

    #[test]
    fn test_lenient_spelling() {
        assert_eq!(SegmentType::parse("CIRCULAR_ARC"), Some(SegmentType::CircularArc));
        assert_eq!(SegmentType::parse("circular arc"), Some(SegmentType::CircularArc));
        assert_eq!(SegmentType::parse("LINE"), Some(SegmentType::Line));
        assert_eq!(SpanType::parse("two-way"), Some(SpanType::TwoWay));
        assert_eq!(MaterialType::parse("  steel "), Some(MaterialType::Steel));
    }

    #[test]
    fn test_unknown_value() {
        assert_eq!(MaterialType::parse("Unobtainium"), None);
        let err = "Unobtainium".parse::<MaterialType>().unwrap_err();
        assert!(err.to_string().contains("Unobtainium"));
    }

    #[test]
    fn test_segment_capabilities() {
        assert!(SegmentType::Line.has_geometry());
        assert!(SegmentType::CircularArc.needs_center());
        assert!(!SegmentType::Bezier.has_geometry());
    }

    #[test]
    fn test_serde_uses_interchange_spelling() {
        let json = serde_json::to_string(&Shape::RectangularHollow).unwrap();
        assert_eq!(json, "\"Rectangular Hollow\"");
        let back: Shape = serde_json::from_str("\"rectangular hollow\"").unwrap();
        assert_eq!(back, Shape::RectangularHollow);
    }
}
