//! Unit conversions and physical constants for magnetics post-processing
//!
//! Node coordinates stay in the units of the solution file; every consumer
//! multiplies by the unit's meter factor at the point of use. Pre-converting
//! would change the integrator summation order and perturb reference
//! results, so conversions live here as explicit factors.

/// Vacuum permeability (H/m)
pub const MU0: f64 = std::f64::consts::PI * 4.0e-7;

/// Length units a solution file may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthUnit {
    #[default]
    Inches,
    Millimeters,
    Centimeters,
    Meters,
    Mils,
    Micrometers,
}

impl LengthUnit {
    /// Multiplicative factor taking file-unit lengths to meters
    #[inline]
    pub fn to_meters(self) -> f64 {
        match self {
            LengthUnit::Inches => 0.0254,
            LengthUnit::Millimeters => 0.001,
            LengthUnit::Centimeters => 0.01,
            LengthUnit::Meters => 1.0,
            LengthUnit::Mils => 2.54e-05,
            LengthUnit::Micrometers => 1.0e-06,
        }
    }

    /// Parse the `[LengthUnits]` header token
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        if s.starts_with("inches") {
            Some(LengthUnit::Inches)
        } else if s.starts_with("millimeters") {
            Some(LengthUnit::Millimeters)
        } else if s.starts_with("centimeters") {
            Some(LengthUnit::Centimeters)
        } else if s.starts_with("meters") {
            Some(LengthUnit::Meters)
        } else if s.starts_with("mils") {
            Some(LengthUnit::Mils)
        } else if s.starts_with("microns") {
            Some(LengthUnit::Micrometers)
        } else {
            None
        }
    }
}

/// Planar or axisymmetric problem geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProblemType {
    #[default]
    Planar,
    Axisymmetric,
}

/// Coordinate system declared by the problem (display metadata)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coords {
    #[default]
    Cartesian,
    Polar,
}

/// Relation of this solution to a previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrevType {
    /// Stand-alone solution
    #[default]
    None,
    /// Small-signal linearization about the previous solution
    Incremental,
    /// Permeability frozen at the previous solution's operating point
    Frozen,
}

impl PrevType {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => PrevType::Incremental,
            2 => PrevType::Frozen,
            _ => PrevType::None,
        }
    }

    /// Whether previous-solution data is present in the file at all
    #[inline]
    pub fn is_incremental(self) -> bool {
        self != PrevType::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_meter_factors() {
        assert_relative_eq!(LengthUnit::Inches.to_meters(), 0.0254);
        assert_relative_eq!(LengthUnit::Mils.to_meters(), 0.0254 * 1e-3);
        assert_relative_eq!(LengthUnit::Meters.to_meters(), 1.0);
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(LengthUnit::parse("millimeters"), Some(LengthUnit::Millimeters));
        assert_eq!(LengthUnit::parse("Inches"), Some(LengthUnit::Inches));
        assert_eq!(LengthUnit::parse("furlongs"), None);
    }

    #[test]
    fn test_mu0() {
        assert_relative_eq!(MU0, 1.2566370614359172e-6, max_relative = 1e-12);
    }
}
