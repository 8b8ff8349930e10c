//! Per-element flux density from nodal potentials

use num_complex::Complex64;

use crate::post::PostProcessor;
use crate::units::ProblemType;

/// Barycentric affine coefficients (a, b, c) and determinant for a
/// triangle; `N_i(x, y) = (a_i + b_i x + c_i y) / da`
pub(crate) struct TriCoeffs {
    pub a: [f64; 3],
    pub b: [f64; 3],
    pub c: [f64; 3],
    pub da: f64,
}

impl PostProcessor {
    pub(crate) fn tri_coeffs(&self, k: usize) -> TriCoeffs {
        let n = self.elements[k].p;
        let p0 = self.mesh_nodes[n[0]].pos;
        let p1 = self.mesh_nodes[n[1]].pos;
        let p2 = self.mesh_nodes[n[2]].pos;

        let a = [
            p1.x * p2.y - p2.x * p1.y,
            p2.x * p0.y - p0.x * p2.y,
            p0.x * p1.y - p1.x * p0.y,
        ];
        let b = [p1.y - p2.y, p2.y - p0.y, p0.y - p1.y];
        let c = [p2.x - p1.x, p0.x - p2.x, p1.x - p0.x];
        let da = b[0] * c[1] - b[1] * c[0];
        TriCoeffs { a, b, c, da }
    }

    /// Mid-side potentials of the quadratic axisymmetric reconstruction.
    ///
    /// The stored potential is 2*pi*r*A_phi; radius-weighted averaging of
    /// the corner values keeps the 1/r singularity off the centerline.
    /// Corner values occupy slots 0, 2, 4 and mid-sides 1, 3, 5.
    pub(crate) fn axi_quadratic(
        v0: Complex64,
        v2: Complex64,
        v4: Complex64,
        r: &[f64; 3],
    ) -> [Complex64; 6] {
        let mid = |va: Complex64, vc: Complex64, ra: f64, rb: f64| {
            if ra < 1.0e-06 && rb < 1.0e-06 {
                (va + vc) / 2.0
            } else {
                (rb * (3.0 * va + vc) + ra * (va + 3.0 * vc)) / (4.0 * (ra + rb))
            }
        };
        [
            v0,
            mid(v0, v2, r[0], r[1]),
            v2,
            mid(v2, v4, r[1], r[2]),
            v4,
            mid(v4, v0, r[2], r[0]),
        ]
    }

    /// Quadratic potential reconstruction at unit-triangle coordinates
    /// (p, q) from the 6-slot value vector
    pub(crate) fn axi_interpolate(v: &[Complex64; 6], p: f64, q: f64) -> Complex64 {
        v[0] - p * (3.0 * v[0] - 4.0 * v[1] + v[2]) + 2.0 * p * p * (v[0] - 2.0 * v[1] + v[2])
            - q * (3.0 * v[0] + v[4] - 4.0 * v[5])
            + 2.0 * q * q * (v[0] + v[4] - 2.0 * v[5])
            + 4.0 * p * q * (v[0] - v[1] + v[3] - v[5])
    }

    /// Compute the element-average flux density (and its previous-solution
    /// counterpart for incremental problems) from the nodal potentials
    pub(crate) fn compute_element_b(&mut self, i: usize) {
        let t = self.tri_coeffs(i);
        let n = self.elements[i].p;
        let lc = self.lc();

        if self.problem_type == ProblemType::Planar {
            let mut b1 = Complex64::new(0.0, 0.0);
            let mut b2 = Complex64::new(0.0, 0.0);
            for j in 0..3 {
                b1 += self.mesh_nodes[n[j]].a * t.c[j] / (t.da * lc);
                b2 -= self.mesh_nodes[n[j]].a * t.b[j] / (t.da * lc);
            }
            self.elements[i].b1 = b1;
            self.elements[i].b2 = b2;

            if self.is_incremental() {
                let mut b1p = 0.0;
                let mut b2p = 0.0;
                for j in 0..3 {
                    b1p += self.mesh_nodes[n[j]].a_prev * t.c[j] / (t.da * lc);
                    b2p -= self.mesh_nodes[n[j]].a_prev * t.b[j] / (t.da * lc);
                }
                self.elements[i].b1p = b1p;
                self.elements[i].b2p = b2p;
            }
            return;
        }

        // axisymmetric: quadratic reconstruction in the unit triangle
        let mut r = [0.0; 3];
        let mut r_avg = 0.0;
        for j in 0..3 {
            r[j] = self.mesh_nodes[n[j]].pos.x;
            r_avg += r[j] / 3.0;
        }

        let v = Self::axi_quadratic(
            self.mesh_nodes[n[0]].a,
            self.mesh_nodes[n[1]].a,
            self.mesh_nodes[n[2]].a,
            &r,
        );
        let dp = (-v[0] + v[2] + 4.0 * v[3] - 4.0 * v[5]) / 3.0;
        let dq = (-v[0] - 4.0 * v[1] + 4.0 * v[3] + v[4]) / 3.0;

        let da = t.da * 2.0 * std::f64::consts::PI * r_avg * lc * lc;
        self.elements[i].b1 = -(t.c[1] * dp + t.c[2] * dq) / da;
        self.elements[i].b2 = (t.b[1] * dp + t.b[2] * dq) / da;

        if self.is_incremental() {
            let v = Self::axi_quadratic(
                self.mesh_nodes[n[0]].a_prev.into(),
                self.mesh_nodes[n[1]].a_prev.into(),
                self.mesh_nodes[n[2]].a_prev.into(),
                &r,
            );
            let dp = (-v[0] + v[2] + 4.0 * v[3] - 4.0 * v[5]) / 3.0;
            let dq = (-v[0] - 4.0 * v[1] + 4.0 * v[3] + v[4]) / 3.0;
            self.elements[i].b1p = (-(t.c[1] * dp + t.c[2] * dq) / da).re;
            self.elements[i].b2p = ((t.b[1] * dp + t.b[2] * dq) / da).re;
        } else {
            self.elements[i].b1p = 0.0;
            self.elements[i].b2p = 0.0;
        }
    }
}
