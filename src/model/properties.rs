//! Geometry entities and point/boundary property tables

use nalgebra::Point2;
use num_complex::Complex64;

/// A vertex of the input geometry
#[derive(Debug, Clone)]
pub struct Node {
    pub pos: Point2<f64>,
    /// Index into the point-property table, if any
    pub boundary_marker: Option<usize>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            pos: Point2::origin(),
            boundary_marker: None,
        }
    }
}

impl Node {
    #[inline]
    pub fn distance(&self, x: f64, y: f64) -> f64 {
        ((self.pos.x - x).powi(2) + (self.pos.y - y).powi(2)).sqrt()
    }

    #[inline]
    pub fn cc(&self) -> Complex64 {
        Complex64::new(self.pos.x, self.pos.y)
    }
}

/// A straight segment of the input geometry
#[derive(Debug, Clone, Default)]
pub struct Segment {
    pub n0: usize,
    pub n1: usize,
    pub max_side_length: f64,
    pub boundary_marker: Option<usize>,
    pub hidden: bool,
    pub in_group: i32,
    pub is_selected: bool,
}

/// An arc segment of the input geometry
#[derive(Debug, Clone, Default)]
pub struct ArcSegment {
    pub n0: usize,
    pub n1: usize,
    /// Swept angle, degrees
    pub arc_length: f64,
    pub max_side_length: f64,
    pub boundary_marker: Option<usize>,
    pub hidden: bool,
    pub in_group: i32,
    pub is_selected: bool,
}

/// Properties attached to a geometry point (prescribed A or point current)
#[derive(Debug, Clone, Default)]
pub struct PointProp {
    pub name: String,
    /// Prescribed potential
    pub a: Complex64,
    /// Point current
    pub j: Complex64,
}

/// Properties of a boundary condition; consumed by integrators as a bag of
/// scalars
#[derive(Debug, Clone, Default)]
pub struct BoundaryProp {
    pub name: String,
    pub format: i32,
    pub a0: f64,
    pub a1: f64,
    pub a2: f64,
    pub phi: f64,
    pub mu: f64,
    pub sig: f64,
    pub c0: Complex64,
    pub c1: Complex64,
}
