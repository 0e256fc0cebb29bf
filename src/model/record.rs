//! Read-only view over one raw record.
//!
//! Every attribute is looked up under its external PascalCase name first and
//! its internal snake_case name second. A JSON `null` counts as absent.

use serde_json::{Map, Value};

use crate::model::geometry::Point3D;
use crate::{Error, Result};

/// An attribute name in both accepted casings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub external: &'static str,
    pub internal: &'static str,
}

impl Key {
    pub const fn new(external: &'static str, internal: &'static str) -> Self {
        Self { external, internal }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.external)
    }
}

/// Attribute names understood by the loader.
pub mod keys {
    use super::Key;

    // Base entity
    pub const ID: Key = Key::new("ID", "id");
    pub const NAME: Key = Key::new("Name", "name");
    pub const DESCRIPTION: Key = Key::new("Description", "description");
    pub const IFCGUID: Key = Key::new("IFCGUID", "ifcguid");
    pub const NATIVE_ID: Key = Key::new("NativeId", "native_id");
    pub const ENTITY_TYPE: Key = Key::new("EntityType", "entity_type");

    // Material
    pub const MATERIAL_TYPE: Key = Key::new("MaterialType", "material_type");
    pub const GRADE: Key = Key::new("Grade", "grade");
    pub const UNIT_WEIGHT: Key = Key::new("UnitWeight", "unit_weight");
    pub const E_MODULUS: Key = Key::new("EModulus", "e_modulus");
    pub const G_MODULUS: Key = Key::new("GModulus", "g_modulus");
    pub const POISSON_RATIO: Key = Key::new("PoissonRatio", "poisson_ratio");
    pub const THERMAL_COEFFICIENT: Key = Key::new("ThermalCoefficient", "thermal_coefficient");

    // Point connection and geometry
    pub const POINT: Key = Key::new("Point", "point");
    pub const STOREY: Key = Key::new("Storey", "storey");
    pub const X: Key = Key::new("X", "x");
    pub const Y: Key = Key::new("Y", "y");
    pub const Z: Key = Key::new("Z", "z");
    pub const START_POINT: Key = Key::new("StartPoint", "start_point");
    pub const END_POINT: Key = Key::new("EndPoint", "end_point");
    pub const CENTER_POINT: Key = Key::new("CenterPoint", "center_point");
    pub const RADIUS: Key = Key::new("Radius", "radius");

    // Cross-section
    pub const SHAPE: Key = Key::new("Shape", "shape");
    pub const PARAMETERS: Key = Key::new("Parameters", "parameters");
    pub const MATERIAL: Key = Key::new("Material", "material");
    pub const AREA: Key = Key::new("Area", "area");
    pub const SECOND_MOMENT_X: Key = Key::new("SecondMomentOfAreaXAxis", "second_moment_of_area_x_axis");
    pub const SECOND_MOMENT_Y: Key = Key::new("SecondMomentOfAreaYAxis", "second_moment_of_area_y_axis");
    pub const GYRATION_X: Key = Key::new("RadiusOfGyrationXAxis", "radius_of_gyration_x_axis");
    pub const GYRATION_Y: Key = Key::new("RadiusOfGyrationYAxis", "radius_of_gyration_y_axis");
    pub const ELASTIC_MODULUS_X: Key = Key::new("ElasticModulusXAxis", "elastic_modulus_x_axis");
    pub const ELASTIC_MODULUS_Y: Key = Key::new("ElasticModulusYAxis", "elastic_modulus_y_axis");
    pub const PLASTIC_MODULUS_X: Key = Key::new("PlasticModulusXAxis", "plastic_modulus_x_axis");
    pub const PLASTIC_MODULUS_Y: Key = Key::new("PlasticModulusYAxis", "plastic_modulus_y_axis");
    pub const TORSIONAL_CONSTANT: Key = Key::new("TorsionalConstant", "torsional_constant");

    // Members
    pub const CURVE_MEMBER_TYPE: Key = Key::new("CurveMemberType", "curve_member_type");
    pub const SURFACE_MEMBER_TYPE: Key = Key::new("SurfaceMemberType", "surface_member_type");
    pub const SYSTEM_LINE: Key = Key::new("SystemLine", "system_line");
    pub const SYSTEM_PLANE: Key = Key::new("SystemPlane", "system_plane");
    pub const SPAN_TYPE: Key = Key::new("SpanType", "span_type");
    pub const CROSS_SECTION: Key = Key::new("CrossSection", "cross_section");
    pub const NODES: Key = Key::new("Nodes", "nodes");
    pub const SEGMENTS: Key = Key::new("Segments", "segments");
    pub const SEGMENT_CENTERS: Key = Key::new("SegmentCenters", "segment_centers");
    pub const BEGIN_NODE: Key = Key::new("BeginNode", "begin_node");
    pub const END_NODE: Key = Key::new("EndNode", "end_node");
    pub const LOCAL_AXIS_X: Key = Key::new("LocalAxisX", "local_axis_x");
    pub const LOCAL_AXIS_Y: Key = Key::new("LocalAxisY", "local_axis_y");
    pub const LOCAL_AXIS_Z: Key = Key::new("LocalAxisZ", "local_axis_z");
    pub const BEGIN_NODE_X_OFFSET: Key = Key::new("BeginNodeXOffset", "begin_node_x_offset");
    pub const BEGIN_NODE_Y_OFFSET: Key = Key::new("BeginNodeYOffset", "begin_node_y_offset");
    pub const BEGIN_NODE_Z_OFFSET: Key = Key::new("BeginNodeZOffset", "begin_node_z_offset");
    pub const END_NODE_X_OFFSET: Key = Key::new("EndNodeXOffset", "end_node_x_offset");
    pub const END_NODE_Y_OFFSET: Key = Key::new("EndNodeYOffset", "end_node_y_offset");
    pub const END_NODE_Z_OFFSET: Key = Key::new("EndNodeZOffset", "end_node_z_offset");
    pub const LENGTH: Key = Key::new("Length", "length");
    pub const END_FIXITY_START: Key = Key::new("EndFixityStart", "end_fixity_start");
    pub const END_FIXITY_END: Key = Key::new("EndFixityEnd", "end_fixity_end");
    pub const THICKNESS: Key = Key::new("Thickness", "thickness");
    pub const Z_OFFSET: Key = Key::new("ZOffset", "z_offset");
    pub const HEIGHT: Key = Key::new("Height", "height");

    // Storey
    pub const STOREY_ELEVATION: Key = Key::new("StoreyElevation", "storey_elevation");
    pub const STOREY_MASS: Key = Key::new("StoreyMass", "storey_mass");
    pub const STOREY_REACTION_X: Key = Key::new("StoreyHorizontalReactionX", "storey_horizontal_reaction_x");
    pub const STOREY_REACTION_Y: Key = Key::new("StoreyHorizontalReactionY", "storey_horizontal_reaction_y");
    pub const STOREY_VERTICAL_REACTION: Key = Key::new("StoreyVerticalReaction", "storey_vertical_reaction");

    // Unit
    pub const ENTITY: Key = Key::new("Entity", "entity");
    pub const ATTRIBUTE: Key = Key::new("Attribute", "attribute");
    pub const UNIT: Key = Key::new("Unit", "unit");

    // Relationship
    pub const SOURCE: Key = Key::new("Source", "source");
    pub const TARGET: Key = Key::new("Target", "target");
    pub const IS_BEGIN: Key = Key::new("IsBegin", "is_begin");
    pub const IS_END: Key = Key::new("IsEnd", "is_end");
    pub const UML_TYPE: Key = Key::new("UmlType", "uml_type");
}

/// JSON type name used in type-mismatch messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

fn type_error(key: Key, expected: &str, got: &Value) -> Error {
    Error::TypeError {
        field: key.external.to_string(),
        expected: expected.to_string(),
        got: json_type_name(got).to_string(),
    }
}

/// Borrowed view over one record mapping.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> RawRecord<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    /// Wrap a value, failing unless it is a mapping.
    pub fn from_value(value: &'a Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::new(map)),
            other => Err(Error::TypeError {
                field: "record".into(),
                expected: "mapping".into(),
                got: json_type_name(other).into(),
            }),
        }
    }

    pub fn as_map(&self) -> &'a Map<String, Value> {
        self.map
    }

    pub fn get(&self, key: Key) -> Option<&'a Value> {
        self.map
            .get(key.external)
            .or_else(|| self.map.get(key.internal))
            .filter(|v| !v.is_null())
    }

    pub fn has(&self, key: Key) -> bool {
        self.get(key).is_some()
    }

    // ========================================================================
    // Strings and ids
    // ========================================================================

    pub fn opt_str(&self, key: Key) -> Result<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(type_error(key, "string", other)),
        }
    }

    pub fn require_str(&self, key: Key) -> Result<String> {
        self.opt_str(key)?.ok_or_else(|| Error::MissingField(key.external.to_string()))
    }

    /// Identifier: a non-empty string, or an integer rendered as text.
    pub fn opt_id(&self, key: Key) -> Result<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => id_text(value)
                .map(Some)
                .ok_or_else(|| type_error(key, "identifier", value)),
        }
    }

    /// Identifier where a blank string counts as absent, so `"ID": ""` falls
    /// through to `id` and then to `None`.
    pub fn opt_filled_id(&self, key: Key) -> Result<Option<String>> {
        for name in [key.external, key.internal] {
            match self.map.get(name) {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) if s.trim().is_empty() => {}
                Some(value) => {
                    return id_text(value)
                        .map(Some)
                        .ok_or_else(|| type_error(key, "identifier", value));
                }
            }
        }
        Ok(None)
    }

    pub fn require_id(&self, key: Key) -> Result<String> {
        self.opt_id(key)?.ok_or_else(|| Error::MissingField(key.external.to_string()))
    }

    /// A list of ids, given either as a JSON list or as a `;`-separated string.
    pub fn opt_id_list(&self, key: Key) -> Result<Option<Vec<String>>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(split_list(s).map(str::to_string).collect())),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| id_text(item).ok_or_else(|| type_error(key, "identifier", item)))
                .collect::<Result<Vec<_>>>()
                .map(Some),
            Some(other) => Err(type_error(key, "list of identifiers", other)),
        }
    }

    // ========================================================================
    // Numbers
    // ========================================================================

    /// Finite number. Numeric strings are accepted.
    pub fn opt_f64(&self, key: Key) -> Result<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => number(key, value).map(Some),
        }
    }

    pub fn require_f64(&self, key: Key) -> Result<f64> {
        self.opt_f64(key)?.ok_or_else(|| Error::MissingField(key.external.to_string()))
    }

    pub fn f64_or(&self, key: Key, default: f64) -> Result<f64> {
        Ok(self.opt_f64(key)?.unwrap_or(default))
    }

    pub fn opt_non_negative(&self, key: Key) -> Result<Option<f64>> {
        match self.opt_f64(key)? {
            Some(v) if v < 0.0 => Err(Error::invalid(key.external, format!("must be non-negative, got {v}"))),
            other => Ok(other),
        }
    }

    /// Numbers given as a JSON list or a `;`-separated string.
    pub fn opt_number_list(&self, key: Key) -> Result<Option<Vec<f64>>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => split_list(s)
                .map(|part| parse_number(key, part))
                .collect::<Result<Vec<_>>>()
                .map(Some),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| number(key, item))
                .collect::<Result<Vec<_>>>()
                .map(Some),
            Some(other) => Err(type_error(key, "list of numbers", other)),
        }
    }

    /// Three numbers: a list, a `"x,y,z"` / `"(x, y, z)"` string, or one
    /// scalar applied to all three axes.
    pub fn opt_triple(&self, key: Key) -> Result<Option<[f64; 3]>> {
        let parts: Vec<f64> = match self.get(key) {
            None => return Ok(None),
            Some(Value::Number(_)) => {
                let v = self.require_f64(key)?;
                return Ok(Some([v, v, v]));
            }
            Some(Value::String(s)) => s
                .trim()
                .trim_start_matches('(')
                .trim_end_matches(')')
                .split(',')
                .map(|part| parse_number(key, part))
                .collect::<Result<_>>()?,
            Some(Value::Array(items)) => items.iter().map(|item| number(key, item)).collect::<Result<_>>()?,
            Some(other) => return Err(type_error(key, "triple of numbers", other)),
        };
        match parts.as_slice() {
            [x, y, z] => Ok(Some([*x, *y, *z])),
            _ => Err(Error::invalid(key.external, format!("expected 3 components, got {}", parts.len()))),
        }
    }

    pub fn triple_or(&self, key: Key, default: [f64; 3]) -> Result<[f64; 3]> {
        Ok(self.opt_triple(key)?.unwrap_or(default))
    }

    // ========================================================================
    // Other shapes
    // ========================================================================

    pub fn opt_bool(&self, key: Key) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(other) => Err(type_error(key, "boolean", other)),
        }
    }

    /// Enumerated string value, resolved through `FromStr`.
    pub fn opt_enum<T>(&self, key: Key) -> Result<Option<T>>
    where
        T: std::str::FromStr,
    {
        match self.opt_str(key)? {
            None => Ok(None),
            Some(text) => text
                .parse::<T>()
                .map(Some)
                .map_err(|_| Error::invalid(key.external, format!("'{text}' is not an accepted value"))),
        }
    }

    pub fn require_enum<T>(&self, key: Key) -> Result<T>
    where
        T: std::str::FromStr,
    {
        self.opt_enum(key)?.ok_or_else(|| Error::MissingField(key.external.to_string()))
    }

    pub fn opt_record(&self, key: Key) -> Result<Option<RawRecord<'a>>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(RawRecord::new(map))),
            Some(other) => Err(type_error(key, "mapping", other)),
        }
    }

    pub fn opt_list(&self, key: Key) -> Result<Option<&'a [Value]>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items.as_slice())),
            Some(other) => Err(type_error(key, "list", other)),
        }
    }

    /// This record read as an `{X, Y, Z}` coordinate.
    pub fn coordinates(&self) -> Result<Point3D> {
        Ok(Point3D::new(
            self.require_f64(keys::X)?,
            self.require_f64(keys::Y)?,
            self.require_f64(keys::Z)?,
        ))
    }

    /// Nested `{X, Y, Z}` mapping under `key`.
    pub fn require_point(&self, key: Key) -> Result<Point3D> {
        self.opt_record(key)?
            .ok_or_else(|| Error::MissingField(key.external.to_string()))?
            .coordinates()
            .map_err(|e| match e {
                Error::MissingField(axis) => Error::MissingField(format!("{}.{axis}", key.external)),
                other => other,
            })
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

fn split_list(text: &str) -> impl Iterator<Item = &str> {
    text.split(';').map(str::trim).filter(|part| !part.is_empty())
}

fn number(key: Key, value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| Error::invalid(key.external, "number is not finite")),
        Value::String(s) => parse_number(key, s),
        other => Err(type_error(key, "number", other)),
    }
}

fn parse_number(key: Key, text: &str) -> Result<f64> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(Error::invalid(key.external, format!("'{trimmed}' is not finite"))),
        Err(_) => Err(Error::TypeError {
            field: key.external.to_string(),
            expected: "number".into(),
            got: format!("'{trimmed}'"),
        }),
    }
}
