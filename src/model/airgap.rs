//! Air-gap elements: annular bands of Fourier-coupled quadrilateral pads
//!
//! Each air-gap element spans the band between `ri` and `ro`, subdivided
//! into `arc_elements` pads. Every pad references four weighted mesh nodes
//! (two on each radius); the harmonic decomposition of the mid-gap flux
//! density is derived from those at load and drives the torque, force and
//! stored-energy queries.

use num_complex::Complex64;

/// Circumferential boundary condition of an air-gap element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapFormat {
    #[default]
    Periodic,
    Antiperiodic,
}

/// Weighted node references of one quadrilateral pad edge
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadPoint {
    pub n0: usize,
    pub w0: f64,
    pub n1: usize,
    pub w1: f64,
    pub n2: usize,
    pub w2: f64,
    pub n3: usize,
    pub w3: f64,
}

/// An air-gap element with its harmonic decomposition
#[derive(Debug, Clone, Default)]
pub struct AirGapElement {
    pub name: String,
    pub format: GapFormat,
    pub inner_angle: f64,
    pub outer_angle: f64,
    /// Inner and outer radii, meters
    pub ri: f64,
    pub ro: f64,
    /// Total arc spanned, degrees
    pub total_arc_length: f64,
    /// Mean potential in the gap
    pub agc: Complex64,
    pub arc_elements: usize,
    /// Rotor/stator rotational offsets within one pad width
    pub inner_shift: f64,
    pub outer_shift: f64,
    pub quad_points: Vec<QuadPoint>,

    /// Harmonic order at each coefficient index
    pub nh: Vec<i32>,
    /// Cosine/sine projections of the radial and tangential flux density
    pub brc: Vec<Complex64>,
    pub brs: Vec<Complex64>,
    pub btc: Vec<Complex64>,
    pub bts: Vec<Complex64>,
    /// Per-pad mid-gap flux density
    pub br: Vec<Complex64>,
    pub bt: Vec<Complex64>,
    /// Previous-solution counterparts (incremental problems)
    pub brc_prev: Vec<f64>,
    pub brs_prev: Vec<f64>,
    pub btc_prev: Vec<f64>,
    pub bts_prev: Vec<f64>,
    pub br_prev: Vec<f64>,
    pub bt_prev: Vec<f64>,
    /// Constant (n = 0) component of the gap potential
    pub aco: Complex64,
}

impl AirGapElement {
    /// Number of stored harmonics
    #[inline]
    pub fn num_harmonics(&self) -> usize {
        self.nh.len()
    }

    /// Mean gap radius, meters
    #[inline]
    pub fn mean_radius(&self) -> f64 {
        0.5 * (self.ri + self.ro)
    }
}
