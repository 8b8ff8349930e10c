//! Element and arc geometry helpers
//!
//! Everything here works in file units unless stated otherwise; callers
//! apply the length conversion at the point of use.

use num_complex::Complex64;

use crate::model::ArcSegment;
use crate::post::PostProcessor;
use crate::units::ProblemType;

impl PostProcessor {
    /// Element centroid, file units
    pub(crate) fn ctr(&self, i: usize) -> Complex64 {
        let mut c = Complex64::new(0.0, 0.0);
        for j in 0..3 {
            let n = &self.mesh_nodes[self.elements[i].p[j]];
            c += Complex64::new(n.pos.x / 3.0, n.pos.y / 3.0);
        }
        c
    }

    /// Signed element area, file units squared (positive for CCW elements)
    pub fn elm_area(&self, i: usize) -> f64 {
        let n = self.elements[i].p;
        let b0 = self.mesh_nodes[n[1]].pos.y - self.mesh_nodes[n[2]].pos.y;
        let b1 = self.mesh_nodes[n[2]].pos.y - self.mesh_nodes[n[0]].pos.y;
        let c0 = self.mesh_nodes[n[2]].pos.x - self.mesh_nodes[n[1]].pos.x;
        let c1 = self.mesh_nodes[n[0]].pos.x - self.mesh_nodes[n[2]].pos.x;
        (b0 * c1 - b1 * c0) / 2.0
    }

    /// Element volume in cubic meters: area times depth (planar) or the
    /// swept ring 2*pi*R (axisymmetric)
    pub fn elm_volume(&self, i: usize) -> f64 {
        let mut a = self.elm_area(i) * self.lc().powi(2);
        if self.problem_type == ProblemType::Axisymmetric {
            let mut r_avg = 0.0;
            for k in 0..3 {
                r_avg += self.mesh_nodes[self.elements[i].p[k]].pos.x * self.lc() / 3.0;
            }
            a *= 2.0 * std::f64::consts::PI * r_avg;
        } else {
            a *= self.depth;
        }
        a
    }

    /// Robust point-in-triangle test for element `i`.
    ///
    /// The orientation of each edge predicate is chosen by node-index order
    /// so the sign convention is independent of vertex winding.
    pub fn in_triangle_test(&self, x: f64, y: f64, i: usize) -> bool {
        if i >= self.elements.len() {
            return false;
        }
        let p = self.elements[i].p;
        for j in 0..3 {
            let k = (j + 1) % 3;
            let (hi, lo) = if p[k] > p[j] { (p[k], p[j]) } else { (p[j], p[k]) };
            let nh = &self.mesh_nodes[hi].pos;
            let nl = &self.mesh_nodes[lo].pos;
            let z = (nh.x - nl.x) * (y - nl.y) - (nh.y - nl.y) * (x - nl.x);
            if p[k] > p[j] {
                if z < 0.0 {
                    return false;
                }
            } else if z > 0.0 {
                return false;
            }
        }
        true
    }

    /// Center and radius of the circle an arc segment lies on, file units
    pub(crate) fn arc_circle(&self, arc: &ArcSegment) -> (Complex64, f64) {
        let a0 = self.nodes[arc.n0].cc();
        let a1 = self.nodes[arc.n1].cc();
        let d = (a1 - a0).norm();
        let t = (a1 - a0) / d;
        let tta = arc.arc_length * std::f64::consts::PI / 180.0;
        let r = d / (2.0 * (tta / 2.0).sin());
        let c = a0 + Complex64::new(d / 2.0, (r * r - d * d / 4.0).sqrt()) * t;
        (c, r)
    }

    /// Shortest distance from a point to an arc segment, file units
    pub(crate) fn shortest_distance_from_arc(&self, p: Complex64, arc: &ArcSegment) -> f64 {
        let a0 = self.nodes[arc.n0].cc();
        let a1 = self.nodes[arc.n1].cc();
        let (c, r) = self.arc_circle(arc);
        let d = (p - c).norm();
        if d == 0.0 {
            return r;
        }
        let t = (p - c) / d;
        let l = (p - c - r * t).norm();
        let z = (t / (a0 - c)).arg() * 180.0 / std::f64::consts::PI;
        if z > 0.0 && z < arc.arc_length {
            return l;
        }
        let z = (p - a0).norm();
        let l = (p - a1).norm();
        z.min(l)
    }

    /// Shortest distance from (p, q) to a straight segment, file units
    pub(crate) fn shortest_distance_from_segment(&self, p: f64, q: f64, segm: usize) -> f64 {
        let s = &self.segments[segm];
        let (x0, y0) = (self.nodes[s.n0].pos.x, self.nodes[s.n0].pos.y);
        let (x1, y1) = (self.nodes[s.n1].pos.x, self.nodes[s.n1].pos.y);

        let mut t = ((p - x0) * (x1 - x0) + (q - y0) * (y1 - y0))
            / ((x1 - x0) * (x1 - x0) + (y1 - y0) * (y1 - y0));
        t = t.clamp(0.0, 1.0);

        let x2 = x0 + t * (x1 - x0);
        let y2 = y0 + t * (y1 - y0);
        ((p - x2) * (p - x2) + (q - y2) * (q - y2)).sqrt()
    }
}
