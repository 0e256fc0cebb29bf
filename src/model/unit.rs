//! Units of measure and SI conversion.

use crate::model::enums::string_enum;
use crate::{Error, Result};

string_enum! {
    /// Unit attached to a numeric attribute by an `XmiUnit` record.
    pub enum Unit {
        Meter => "m",
        Centimeter => "cm",
        Millimeter => "mm",
        SquareMeter => "m^2",
        SquareCentimeter => "cm^2",
        SquareMillimeter => "mm^2",
        CubicMeter => "m^3",
        CubicCentimeter => "cm^3",
        CubicMillimeter => "mm^3",
        QuarticMeter => "m^4",
        QuarticCentimeter => "cm^4",
        QuarticMillimeter => "mm^4",
        Inch => "in",
        Foot => "ft",
        Yard => "yd",
        SquareInch => "in^2",
        SquareFoot => "ft^2",
        CubicInch => "in^3",
        CubicFoot => "ft^3",
        QuarticInch => "in^4",
        Second => "sec",
    }
}

/// Physical dimension of a unit. Conversion is only defined within one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Length,
    Area,
    Volume,
    /// Second moment of area.
    Inertia,
    Time,
}

impl Unit {
    pub fn dimension(&self) -> Dimension {
        match self {
            Unit::Meter | Unit::Centimeter | Unit::Millimeter
            | Unit::Inch | Unit::Foot | Unit::Yard => Dimension::Length,
            Unit::SquareMeter | Unit::SquareCentimeter | Unit::SquareMillimeter
            | Unit::SquareInch | Unit::SquareFoot => Dimension::Area,
            Unit::CubicMeter | Unit::CubicCentimeter | Unit::CubicMillimeter
            | Unit::CubicInch | Unit::CubicFoot => Dimension::Volume,
            Unit::QuarticMeter | Unit::QuarticCentimeter | Unit::QuarticMillimeter
            | Unit::QuarticInch => Dimension::Inertia,
            Unit::Second => Dimension::Time,
        }
    }

    /// Multiplier taking a value in this unit to the SI base unit of its dimension.
    pub fn si_factor(&self) -> f64 {
        match self {
            Unit::Meter => 1.0,
            Unit::Centimeter => 0.01,
            Unit::Millimeter => 0.001,
            Unit::Inch => 0.0254,
            Unit::Foot => 0.3048,
            Unit::Yard => 0.9144,
            Unit::SquareMeter => 1.0,
            Unit::SquareCentimeter => 1e-4,
            Unit::SquareMillimeter => 1e-6,
            Unit::SquareInch => 0.000_645_16,
            Unit::SquareFoot => 0.092_903_04,
            Unit::CubicMeter => 1.0,
            Unit::CubicCentimeter => 1e-6,
            Unit::CubicMillimeter => 1e-9,
            Unit::CubicInch => 0.000_016_387_064,
            Unit::CubicFoot => 0.028_316_846_592,
            Unit::QuarticMeter => 1.0,
            Unit::QuarticCentimeter => 1e-8,
            Unit::QuarticMillimeter => 1e-12,
            Unit::QuarticInch => 0.000_000_416_231_43,
            Unit::Second => 1.0,
        }
    }

    pub fn is_metric(&self) -> bool {
        !matches!(
            self,
            Unit::Inch | Unit::Foot | Unit::Yard | Unit::SquareInch
                | Unit::SquareFoot | Unit::CubicInch | Unit::CubicFoot | Unit::QuarticInch
        )
    }
}

/// Convert `value` from one unit to another of the same dimension.
pub fn convert_value(value: f64, from: Unit, to: Unit) -> Result<f64> {
    if from.dimension() != to.dimension() {
        return Err(Error::IncompatibleUnits {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        });
    }
    if from == to {
        return Ok(value);
    }
    Ok(value * from.si_factor() / to.si_factor())
}
