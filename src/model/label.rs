//! Block labels: the bridge between mesh regions, materials and circuits

use num_complex::Complex64;

/// Per-block circuit drive, filled in from the solution's circuit rows
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum BlockSource {
    /// Region not driven through a circuit row
    #[default]
    None,
    /// Solid region with a known voltage gradient
    Voltage(Complex64),
    /// Region with a prescribed current density
    Current(Complex64),
}

impl BlockSource {
    /// Voltage gradient of a solid region, zero otherwise
    #[inline]
    pub fn volts(&self) -> Complex64 {
        match self {
            BlockSource::Voltage(v) => *v,
            _ => Complex64::new(0.0, 0.0),
        }
    }

    #[inline]
    pub fn is_voltage(&self) -> bool {
        matches!(self, BlockSource::Voltage(_))
    }
}

/// A block label with its material assignment and homogenized properties
///
/// `fill_factor < 0` denotes a solid region; `>= 0` a stranded one, in
/// which case `o` and `mu` carry the homogenized effective conductivity
/// (MS/m) and relative permeability of the winding.
#[derive(Debug, Clone, Default)]
pub struct BlockLabel {
    pub x: f64,
    pub y: f64,
    /// Material index (block property)
    pub block_type: usize,
    /// Mesh sizing constraint, stored as pi*d^2/4
    pub max_area: f64,
    /// Circuit index, if the block belongs to one
    pub in_circuit: Option<usize>,
    /// Magnetization direction in degrees when no expression is given
    pub mag_dir: f64,
    /// Magnetization direction expression in the centroid bindings
    pub mag_dir_expr: String,
    pub in_group: i32,
    pub turns: i32,
    pub is_external: bool,
    pub is_default: bool,
    pub is_selected: bool,
    /// Circuit drive read from the solution's circuit rows
    pub source: BlockSource,
    /// Winding fill factor; negative for solid regions
    pub fill_factor: f64,
    /// Effective conductivity, MS/m (complex for wound regions)
    pub o: Complex64,
    /// Effective relative permeability of a wound region
    pub mu: Complex64,
}
