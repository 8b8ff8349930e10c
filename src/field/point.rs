//! Point-value evaluation and the per-element field helpers
//!
//! `point_values` is the workhorse behind line integrals and interactive
//! probing: given a location it reports potential, flux density, field
//! intensity, current density, permeability, energy density and loss
//! densities, honoring the DC, time-harmonic and incremental permeability
//! models.

use num_complex::Complex64;

use crate::post::PostProcessor;
use crate::units::{PrevType, ProblemType, MU0};

/// Field quantities at one point
#[derive(Debug, Clone, Copy, Default)]
pub struct PointValues {
    /// Vector potential (planar: Wb/m, axisymmetric: total flux Wb)
    pub a: Complex64,
    /// Flux density, T
    pub b1: Complex64,
    pub b2: Complex64,
    /// Permeability tensor (relative); `mu12` is the off-diagonal term of
    /// incremental problems
    pub mu1: Complex64,
    pub mu2: Complex64,
    pub mu12: Complex64,
    /// Field intensity, A/m
    pub h1: Complex64,
    pub h2: Complex64,
    /// Source and eddy current densities, MA/m^2
    pub js: Complex64,
    pub je: Complex64,
    /// Loss-related conductivity, MS/m
    pub c: f64,
    /// Energy density, J/m^3
    pub e: f64,
    /// Hysteresis and eddy loss densities, W/m^3
    pub ph: f64,
    pub pe: f64,
    /// Fill factor of the containing region (negative: solid)
    pub ff: f64,
    /// PM demagnetizing field subtracted from H
    pub hc: Complex64,
}

impl PostProcessor {
    /// Permeability correction for the axisymmetric external (Kelvin
    /// transformation) region; the permeability of element `k` gets
    /// divided by this factor
    pub(crate) fn aecf(&self, k: usize) -> f64 {
        if self.problem_type != ProblemType::Axisymmetric {
            return 1.0;
        }
        if !self.labels[self.elements[k].lbl].is_external {
            return 1.0;
        }
        let r = (self.elements[k].ctr - Complex64::new(0.0, self.ext_zo)).norm();
        (r * r * self.ext_ri) / (self.ext_ro * self.ext_ro * self.ext_ro)
    }

    /// AC permeability of element `k`, including wound-region
    /// homogenization and the external-region correction
    pub(crate) fn get_mu_ac(&self, b1: Complex64, b2: Complex64, k: usize) -> (Complex64, Complex64) {
        let (mut mu1, mut mu2) = if self.materials[self.elements[k].blk].lam_type.is_wound() {
            let mu = self.labels[self.elements[k].lbl].mu;
            (mu, mu)
        } else {
            self.materials[self.elements[k].blk].get_mu_ac(b1, b2)
        };
        let aecf = self.aecf(k);
        mu1 /= aecf;
        mu2 /= aecf;
        (mu1, mu2)
    }

    /// DC permeability of element `k` with the external-region correction
    pub(crate) fn get_mu_dc(&self, b1: f64, b2: f64, k: usize) -> (f64, f64) {
        let (mut mu1, mut mu2) = self.materials[self.elements[k].blk].get_mu_dc(b1, b2);
        let aecf = self.aecf(k);
        mu1 /= aecf;
        mu2 /= aecf;
        (mu1, mu2)
    }

    /// AC field intensity of element `k`
    pub(crate) fn get_h_ac(&self, b1: Complex64, b2: Complex64, k: usize) -> (Complex64, Complex64) {
        let (mu1, mu2) = self.get_mu_ac(b1, b2, k);
        (b1 / (mu1 * MU0), b2 / (mu2 * MU0))
    }

    /// Interpolated flux density at (x, y) inside element `k`: smoothed
    /// nodal values when smoothing is on, the element average otherwise
    pub(crate) fn get_point_b(&self, x: f64, y: f64, k: usize) -> (Complex64, Complex64) {
        let e = &self.elements[k];
        if !self.config.smoothing {
            return (e.b1, e.b2);
        }
        let t = self.tri_coeffs(k);
        let mut b1 = Complex64::new(0.0, 0.0);
        let mut b2 = Complex64::new(0.0, 0.0);
        for i in 0..3 {
            let w = (t.a[i] + t.b[i] * x + t.c[i] * y) / t.da;
            b1 += e.b1n[i] * w;
            b2 += e.b2n[i] * w;
        }
        (b1, b2)
    }

    /// Current density in element `k` with contributions from all sources.
    ///
    /// Returns the element average and fills the per-vertex current
    /// density and potential. Units: J in A/m^2, A as stored (axisymmetric
    /// values divided down from 2*pi*r*A).
    pub(crate) fn get_ja(&self, k: usize) -> (Complex64, [Complex64; 3], [Complex64; 3]) {
        let e = &self.elements[k];
        let blk = e.blk;
        let lbl = e.lbl;
        let lc = self.lc();
        let axi = self.problem_type == ProblemType::Axisymmetric;

        let mut a = [Complex64::new(0.0, 0.0); 3];
        for i in 0..3 {
            if axi {
                let rn = self.mesh_nodes[e.p[i]].pos.x * lc;
                if (rn / lc).abs() < 1.0e-06 {
                    a[i] = Complex64::new(0.0, 0.0);
                } else {
                    a[i] = self.mesh_nodes[e.p[i]].a / (2.0 * std::f64::consts::PI * rn);
                }
            } else {
                a[i] = self.mesh_nodes[e.p[i]].a;
            }
        }

        let r = if axi { self.ctr(k).re * lc } else { 0.0 };

        let mut j = [self.materials[blk].j; 3];
        let mut j_avg = self.materials[blk].j;

        let mut c = self.materials[blk].cduct;
        if self.materials[blk].lam_d != 0.0
            && self.materials[blk].lam_type == crate::model::LamType::Plain
        {
            c = 0.0;
        }
        if self.labels[lbl].fill_factor > 0.0 {
            c = 0.0;
        }

        // eddy currents
        if self.frequency != 0.0 {
            let iw = Complex64::new(0.0, 2.0 * std::f64::consts::PI * self.frequency);
            for i in 0..3 {
                j[i] -= iw * c * a[i];
                j_avg -= iw * c * a[i] / 3.0;
            }
        }

        // circuit drive
        if self.labels[lbl].in_circuit.is_some() {
            match self.labels[lbl].source {
                crate::model::BlockSource::Voltage(dv) => {
                    if axi {
                        for i in 0..3 {
                            let rn = self.mesh_nodes[e.p[i]].pos.x;
                            if (rn / lc).abs() < 1.0e-06 {
                                j[i] -= c * dv / r;
                            } else {
                                j[i] -= c * dv / (rn * lc);
                            }
                        }
                        j_avg -= c * dv / r;
                    } else {
                        for i in 0..3 {
                            j[i] -= c * dv;
                        }
                        j_avg -= c * dv;
                    }
                }
                crate::model::BlockSource::Current(jc) => {
                    for i in 0..3 {
                        j[i] += jc;
                    }
                    j_avg += jc;
                }
                crate::model::BlockSource::None => {}
            }
        }

        // MA/m^2 -> A/m^2
        for i in 0..3 {
            j[i] *= 1.0e06;
        }
        (j_avg * 1.0e06, j, a)
    }

    /// Field quantities at (x, y), or `None` outside the mesh
    pub fn point_values(&self, x: f64, y: f64) -> Option<PointValues> {
        let k = self.in_triangle(x, y)?;
        Some(self.point_values_in_element(x, y, k))
    }

    /// Field quantities at (x, y), which must lie inside element `k`
    pub(crate) fn point_values_in_element(&self, x: f64, y: f64, k: usize) -> PointValues {
        let mut u = PointValues::default();
        let e = &self.elements[k];
        let t = self.tri_coeffs(k);
        let lc = self.lc();
        let axi = self.problem_type == ProblemType::Axisymmetric;
        let mat = &self.materials[e.blk];
        let lbl = &self.labels[e.lbl];
        let pi = std::f64::consts::PI;

        let r_avg = lc
            * (self.mesh_nodes[e.p[0]].pos.x
                + self.mesh_nodes[e.p[1]].pos.x
                + self.mesh_nodes[e.p[2]].pos.x)
            / 3.0;

        let (b1, b2) = self.get_point_b(x, y, k);
        u.b1 = b1;
        u.b2 = b2;
        u.ff = lbl.fill_factor;

        // potential: barycentric for planar, quadratic for axisymmetric
        if axi {
            let mut r = [0.0; 3];
            for i in 0..3 {
                r[i] = self.mesh_nodes[e.p[i]].pos.x;
            }
            let v = Self::axi_quadratic(
                self.mesh_nodes[e.p[0]].a,
                self.mesh_nodes[e.p[1]].a,
                self.mesh_nodes[e.p[2]].a,
                &r,
            );
            let p = (t.b[1] * x + t.c[1] * y + t.a[1]) / t.da;
            let q = (t.b[2] * x + t.c[2] * y + t.a[2]) / t.da;
            u.a = Self::axi_interpolate(&v, p, q);
        } else {
            let mut a = Complex64::new(0.0, 0.0);
            for i in 0..3 {
                a += self.mesh_nodes[e.p[i]].a * (t.a[i] + t.b[i] * x + t.c[i] * y) / t.da;
            }
            u.a = a;
        }
        if self.frequency == 0.0 {
            u.a.im = 0.0;
        }

        // permeability and field intensity
        if !self.is_incremental() {
            if self.frequency == 0.0 {
                let (mu1, mu2) = self.get_mu_dc(u.b1.re, u.b2.re, k);
                u.mu1 = mu1.into();
                u.mu2 = mu2.into();
                u.h1 = u.b1 / (mu1 * MU0);
                u.h2 = u.b2 / (mu2 * MU0);
            } else {
                let (mu1, mu2) = self.get_mu_ac(u.b1, u.b2, k);
                u.mu1 = mu1;
                u.mu2 = mu2;
                u.h1 = u.b1 / (mu1 * MU0);
                u.h2 = u.b2 / (mu2 * MU0);
            }
        } else {
            // permeability linearized about the previous operating point
            let b1p = e.b1p;
            let b2p = e.b2p;
            let b = (b1p * b1p + b2p * b2p).sqrt();
            let (muinc, murel) = self.get_mu_dc(b1p, b2p, k);

            if b == 0.0 {
                let mu = if self.frequency == 0.0 { muinc } else { murel };
                u.mu1 = mu.into();
                u.mu2 = mu.into();
                u.mu12 = Complex64::new(0.0, 0.0);
            } else if self.prev_type == PrevType::Incremental || self.frequency != 0.0 {
                u.mu1 = ((b1p * b1p * muinc + b2p * b2p * murel) / (b * b)).into();
                u.mu12 = ((b1p * b2p * (muinc - murel)) / (b * b)).into();
                u.mu2 = ((b2p * b2p * muinc + b1p * b1p * murel) / (b * b)).into();
            } else {
                // frozen permeability
                u.mu1 = murel.into();
                u.mu2 = murel.into();
                u.mu12 = Complex64::new(0.0, 0.0);
            }

            let det = u.mu12 * u.mu12 - u.mu1 * u.mu2;
            u.h1 = (u.b2 * u.mu12 - u.b1 * u.mu2) / (det * MU0);
            u.h2 = (u.b2 * u.mu1 - u.b1 * u.mu12) / (-det * MU0);
        }

        // current density
        u.js = if self.frequency == 0.0 {
            Complex64::new(mat.j.re, 0.0)
        } else {
            mat.j
        };
        if lbl.in_circuit.is_some() {
            match lbl.source {
                crate::model::BlockSource::Voltage(dv) => {
                    let o = if self.frequency == 0.0 {
                        Complex64::new(lbl.o.re, 0.0)
                    } else {
                        lbl.o
                    };
                    if axi {
                        let mut rw = 0.0;
                        for i in 0..3 {
                            let mut rn = self.mesh_nodes[e.p[i]].pos.x;
                            if rn < 1.0e-6 {
                                rn = r_avg;
                            } else {
                                rn *= lc;
                            }
                            rw += (1.0 / rn) * (t.a[i] + t.b[i] * x + t.c[i] * y) / t.da;
                        }
                        u.js -= o * dv * rw;
                    } else {
                        u.js -= o * dv;
                    }
                }
                crate::model::BlockSource::Current(jc) => u.js += jc,
                crate::model::BlockSource::None => {}
            }
        }

        if self.frequency == 0.0 {
            u.c = lbl.o.re;
            u.je = Complex64::new(0.0, 0.0);

            u.e = mat.do_energy_dc(u.b1.re, u.b2.re);

            // second-quadrant PM representation: shift H and correct the
            // stored energy
            if mat.h_c != 0.0 {
                u.hc = Complex64::from_polar(mat.h_c, pi * e.magdir / 180.0);
                u.h1 -= u.hc.re;
                u.h2 -= u.hc.im;

                if !mat.is_nonlinear() {
                    u.e = 0.5
                        * MU0
                        * (u.mu1.re * u.h1.re * u.h1.re + u.mu2.re * u.h2.re * u.h2.re);
                } else {
                    let b = Complex64::new(u.b1.re, u.b2.re);
                    u.e = u.e + mat.nrg
                        - mat.h_c * (b / Complex64::from_polar(1.0, pi * e.magdir / 180.0)).re;
                }

                if !self.config.shift_h {
                    u.h1 += u.hc.re;
                    u.h2 += u.hc.im;
                    u.hc = Complex64::new(0.0, 0.0);
                }
            }

            // local stored energy of wound regions
            if mat.lam_type.is_wound() {
                let j = u.js * 1.0e6;
                u.e += (j * j).re * lbl.o.im / 2.0;
            }

            u.ph = 0.0;
            u.pe = 0.0;
            return u;
        }

        // loss-related part of the conductivity only
        u.c = if mat.cduct != 0.0 {
            1.0 / (1.0 / lbl.o).re
        } else {
            0.0
        };
        if mat.lam_d != 0.0 {
            u.c = 0.0;
        }

        // eddy currents only exist in solid regions
        if lbl.fill_factor < 0.0 {
            u.je = -Complex64::i() * self.frequency * 2.0 * pi * u.c * u.a;
        }
        if axi {
            if x != 0.0 {
                u.je /= 2.0 * pi * x * lc;
            } else {
                u.je = Complex64::new(0.0, 0.0);
            }
        }

        let z = u.h1 * u.b1.conj() + u.h2 * u.b2.conj();
        u.e = 0.25 * z.re;

        if mat.lam_type.is_wound() {
            let j = u.js * 1.0e6;
            u.e += (j * j.conj()).re * ((1.0 / lbl.o).im / (2.0e6 * pi * self.frequency)) / 4.0;
        }

        u.ph = self.frequency * pi * z.im;
        u.pe = 0.0;
        if u.c != 0.0 {
            let j = u.js + u.je;
            u.pe = 1.0e06 * (j.re * j.re + j.im * j.im) / (u.c * 2.0);
        }

        u
    }

    /// Piecewise-constant magnetization of element `n`
    pub fn magnetization(&self, n: usize) -> (Complex64, Complex64) {
        let e = &self.elements[n];
        let b1 = e.b1;
        let b2 = e.b2;
        let mut hc = Complex64::new(0.0, 0.0);

        let (mu1, mu2): (Complex64, Complex64) = if self.frequency == 0.0 {
            let (m1, m2) = self.get_mu_dc(b1.re, b2.re, n);
            hc = Complex64::from_polar(
                self.materials[e.blk].h_c,
                e.magdir * std::f64::consts::PI / 180.0,
            );
            (m1.into(), m2.into())
        } else {
            self.get_mu_ac(b1, b2, n)
        };

        let m1 = b1 * (mu1 - 1.0) / (mu1 * MU0) + hc.re;
        let m2 = b2 * (mu2 - 1.0) / (mu2 * MU0) + hc.im;
        (m1, m2)
    }
}
