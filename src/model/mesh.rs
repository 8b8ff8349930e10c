//! Mesh nodes and triangular elements of the solution

use nalgebra::Point2;
use num_complex::Complex64;

/// A node of the solved mesh
///
/// Coordinates are kept in the units of the solution file. For planar
/// problems `a` holds the per-unit-depth vector potential; axisymmetric
/// problems store `2*pi*r*A_phi`.
#[derive(Debug, Clone)]
pub struct MeshNode {
    pub pos: Point2<f64>,
    /// Complex vector potential
    pub a: Complex64,
    /// Potential of the previous solution (incremental problems)
    pub a_prev: f64,
    /// Henrotte virtual-work weighting mask
    pub msk: f64,
}

impl Default for MeshNode {
    fn default() -> Self {
        Self {
            pos: Point2::origin(),
            a: Complex64::new(0.0, 0.0),
            a_prev: 0.0,
            msk: 0.0,
        }
    }
}

impl MeshNode {
    /// Node position as a complex number (x + iy)
    #[inline]
    pub fn cc(&self) -> Complex64 {
        Complex64::new(self.pos.x, self.pos.y)
    }
}

/// A linear triangular element of the solved mesh
///
/// Vertex indices are counter-clockwise. `rsqr` is at least the squared
/// distance from the centroid to the farthest vertex, which lets the
/// banded element search reject candidates cheaply.
#[derive(Debug, Clone, Default)]
pub struct MeshElement {
    /// Vertex node indices
    pub p: [usize; 3],
    /// Index of the block label tagging this element's region
    pub lbl: usize,
    /// Index of the material (block property)
    pub blk: usize,
    /// Magnetization direction, degrees
    pub magdir: f64,
    /// Centroid, file units
    pub ctr: Complex64,
    /// Squared search radius about the centroid
    pub rsqr: f64,
    /// Element-average flux density
    pub b1: Complex64,
    pub b2: Complex64,
    /// Previous-solution flux density (incremental problems)
    pub b1p: f64,
    pub b2p: f64,
    /// Patch-smoothed flux density at each vertex
    pub b1n: [Complex64; 3],
    pub b2n: [Complex64; 3],
    /// Marks element edges with no neighbouring element
    pub boundary_edge: [bool; 3],
    /// Previous-solution current density (incremental problems)
    pub j_prev: f64,
}
