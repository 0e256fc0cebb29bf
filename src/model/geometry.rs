//! Geometry primitives.
//!
//! Points are shared by reference (`Arc<Point3D>`): two entities that sit on
//! the same coordinate hold the *same* point, handed out by `PointCache`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A coordinate triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    #[serde(rename = "Z")]
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// True when every component differs by strictly less than `tolerance`.
    pub fn within_tolerance(&self, other: &Point3D, tolerance: f64) -> bool {
        (self.x - other.x).abs() < tolerance
            && (self.y - other.y).abs() < tolerance
            && (self.z - other.z).abs() < tolerance
    }

    pub fn distance_to(&self, other: &Point3D) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl std::fmt::Display for Point3D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Straight segment between two shared points.
#[derive(Debug, Clone, PartialEq)]
pub struct Line3D {
    pub start: Arc<Point3D>,
    pub end: Arc<Point3D>,
}

impl Line3D {
    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }
}

/// Circular arc through `start` and `end` around `center`.
#[derive(Debug, Clone, PartialEq)]
pub struct Arc3D {
    pub start: Arc<Point3D>,
    pub end: Arc<Point3D>,
    pub center: Arc<Point3D>,
    /// Explicit radius, when the record supplied one.
    pub radius: Option<f64>,
}

impl Arc3D {
    /// Supplied radius, else the distance from center to start.
    pub fn effective_radius(&self) -> f64 {
        self.radius.unwrap_or_else(|| self.center.distance_to(&self.start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_is_strict() {
        let a = Point3D::new(0.0, 0.0, 0.0);
        assert!(a.within_tolerance(&Point3D::new(0.5, 0.0, 0.0), 1.0));
        assert!(!a.within_tolerance(&Point3D::new(1.0, 0.0, 0.0), 1.0));
        assert!(!a.within_tolerance(&Point3D::new(0.0, 0.0, -2.0), 1.0));
    }

    #[test]
    fn test_line_length() {
        let line = Line3D {
            start: Arc::new(Point3D::new(0.0, 0.0, 0.0)),
            end: Arc::new(Point3D::new(3.0, 4.0, 0.0)),
        };
        assert_eq!(line.length(), 5.0);
    }

    #[test]
    fn test_arc_radius_fallback() {
        let arc = Arc3D {
            start: Arc::new(Point3D::new(2.0, 0.0, 0.0)),
            end: Arc::new(Point3D::new(0.0, 2.0, 0.0)),
            center: Arc::new(Point3D::new(0.0, 0.0, 0.0)),
            radius: None,
        };
        assert_eq!(arc.effective_radius(), 2.0);
        let explicit = Arc3D { radius: Some(2.5), ..arc };
        assert_eq!(explicit.effective_radius(), 2.5);
    }

    #[test]
    fn test_point_serde_uses_pascal_case() {
        let json = serde_json::to_value(Point3D::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(json, serde_json::json!({"X": 1.0, "Y": 2.0, "Z": 3.0}));
    }
}
