//! Block (volume) integrals over the selected regions
//!
//! Most integrands run over the elements whose block label is selected;
//! the Henrotte (weighted Maxwell stress) family runs over every element
//! because the nodal weighting mask already localizes it. Accumulation is
//! a pure associative reduction, so elements are processed in parallel.

use num_complex::Complex64;
use rayon::prelude::*;

use crate::integral::quadrature::{axi_int, pln_int};
use crate::post::PostProcessor;
use crate::units::{ProblemType, MU0};

/// The block integrals the engine can evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockIntegrand {
    /// Integral of A.J*
    PotentialCurrent,
    /// Integral of A
    Potential,
    MagneticEnergy,
    HysteresisLosses,
    ResistiveLosses,
    CrossSectionArea,
    /// Hysteresis plus resistive losses
    TotalLosses,
    TotalCurrent,
    /// Integral of B_x (B_r)
    FluxDensityX,
    /// Integral of B_y (B_z)
    FluxDensityY,
    Volume,
    LorentzForceXSteady,
    LorentzForceYSteady,
    LorentzForceX2X,
    LorentzForceY2X,
    LorentzTorqueSteady,
    LorentzTorque2X,
    MagneticCoenergy,
    HenrotteForceXSteady,
    HenrotteForceYSteady,
    HenrotteForceX2X,
    HenrotteForceY2X,
    HenrotteTorqueSteady,
    HenrotteTorque2X,
    MomentOfInertia,
    Centroid,
}

impl BlockIntegrand {
    /// Integrand from its scripted integer code
    pub fn from_code(code: u32) -> Option<Self> {
        use BlockIntegrand::*;
        Some(match code {
            0 => PotentialCurrent,
            1 => Potential,
            2 => MagneticEnergy,
            3 => HysteresisLosses,
            4 => ResistiveLosses,
            5 => CrossSectionArea,
            6 => TotalLosses,
            7 => TotalCurrent,
            8 => FluxDensityX,
            9 => FluxDensityY,
            10 => Volume,
            11 => LorentzForceXSteady,
            12 => LorentzForceYSteady,
            13 => LorentzForceX2X,
            14 => LorentzForceY2X,
            15 => LorentzTorqueSteady,
            16 => LorentzTorque2X,
            17 => MagneticCoenergy,
            18 => HenrotteForceXSteady,
            19 => HenrotteForceYSteady,
            20 => HenrotteForceX2X,
            21 => HenrotteForceY2X,
            22 => HenrotteTorqueSteady,
            23 => HenrotteTorque2X,
            24 => MomentOfInertia,
            25 => Centroid,
            _ => return None,
        })
    }

    /// Whether this integrand runs over all elements instead of only the
    /// selected blocks
    fn over_all_elements(self) -> bool {
        use BlockIntegrand::*;
        matches!(
            self,
            HenrotteForceXSteady
                | HenrotteForceYSteady
                | HenrotteForceX2X
                | HenrotteForceY2X
                | HenrotteTorqueSteady
                | HenrotteTorque2X
        )
    }
}

impl PostProcessor {
    /// Evaluate a block integral over the currently selected regions
    pub fn block_integral(&self, kind: BlockIntegrand) -> Complex64 {
        match kind {
            BlockIntegrand::TotalLosses => {
                self.block_integral(BlockIntegrand::HysteresisLosses)
                    + self.block_integral(BlockIntegrand::ResistiveLosses)
            }
            BlockIntegrand::Centroid => {
                let num = self.accumulate(BlockIntegrand::Centroid);
                let area = self.block_integral(BlockIntegrand::CrossSectionArea);
                Complex64::new(num.re / area.re, num.im / area.re)
            }
            _ => self.accumulate(kind),
        }
    }

    fn accumulate(&self, kind: BlockIntegrand) -> Complex64 {
        (0..self.elements.len())
            .into_par_iter()
            .map(|i| self.element_contribution(i, kind))
            .reduce(|| Complex64::new(0.0, 0.0), |x, y| x + y)
    }

    /// Gradient of the Henrotte weighting mask over element `k`
    pub(crate) fn henrotte_vector(&self, k: usize) -> Complex64 {
        let t = self.tri_coeffs(k);
        let n = self.elements[k].p;
        let mut v = Complex64::new(0.0, 0.0);
        for i in 0..3 {
            v -= self.mesh_nodes[n[i]].msk * Complex64::new(t.b[i], t.c[i]) / (t.da * self.lc());
        }
        v
    }

    fn element_contribution(&self, i: usize, kind: BlockIntegrand) -> Complex64 {
        use BlockIntegrand::*;

        let selected = self.labels[self.elements[i].lbl].is_selected;
        if !selected && !kind.over_all_elements() {
            return Complex64::new(0.0, 0.0);
        }

        let axi = self.problem_type == ProblemType::Axisymmetric;
        let lc = self.lc();
        let pi = std::f64::consts::PI;
        let e = &self.elements[i];
        let mat = &self.materials[e.blk];
        let lbl = &self.labels[e.lbl];
        let ones = [Complex64::new(1.0, 0.0); 3];

        let (j_avg, jn, a_nodal) = self.get_ja(i);
        let mut a = self.elm_area(i) * lc * lc;
        let mut r = [0.0; 3];
        let mut r_mean = 0.0;
        if axi {
            for k in 0..3 {
                r[k] = self.mesh_nodes[e.p[k]].pos.x * lc;
            }
            r_mean = (r[0] + r[1] + r[2]) / 3.0;
        }

        match kind {
            PotentialCurrent => {
                let mut v = [Complex64::new(0.0, 0.0); 3];
                for k in 0..3 {
                    v[k] = jn[k].conj();
                }
                if axi {
                    axi_int(a, &a_nodal, &v, &r)
                } else {
                    pln_int(a, &a_nodal, &v) * self.depth
                }
            }

            Potential => {
                if axi {
                    axi_int(a, &ones, &a_nodal, &r)
                } else {
                    let mut y = Complex64::new(0.0, 0.0);
                    for k in 0..3 {
                        y += a * self.depth * a_nodal[k] / 3.0;
                    }
                    y
                }
            }

            MagneticEnergy => {
                if axi {
                    a *= 2.0 * pi * r_mean;
                } else {
                    a *= self.depth;
                }
                let b1 = e.b1;
                let b2 = e.b2;
                let mut y;
                if self.frequency != 0.0 {
                    if mat.lam_type.is_wound() {
                        // wound regions subject to skin and proximity
                        // effects store energy both in the bulk field and
                        // locally around the strands
                        let mu = MU0 * lbl.mu;
                        let u = (1.0 / lbl.o).im / (2.0e6 * pi * self.frequency);
                        y = Complex64::from(
                            a * (b1 * b1.conj() + b2 * b2.conj()).re * (1.0 / mu).re / 4.0,
                        );
                        y += a * (j_avg * j_avg.conj()).re * u / 4.0;
                    } else {
                        y = Complex64::from(a * mat.do_energy_ac(b1, b2));
                    }
                } else {
                    if mat.h_c != 0.0 {
                        // second-quadrant PM representation
                        if !mat.is_nonlinear() {
                            let mu1 = mat.mu_x;
                            let mu2 = mat.mu_y;
                            let mut h1 = b1.re / (mu1 * MU0);
                            let mut h2 = b2.re / (mu2 * MU0);
                            let hc = Complex64::from_polar(mat.h_c, pi * e.magdir / 180.0);
                            h1 -= hc.re;
                            h2 -= hc.im;
                            y = Complex64::from(
                                a * 0.5 * MU0 * (mu1 * h1 * h1 + mu2 * h2 * h2),
                            );
                        } else {
                            let b = Complex64::new(b1.re, b2.re);
                            let mut w = mat.do_energy_dc(b1.re, b2.re);
                            w += mat.nrg
                                - mat.h_c
                                    * (b / Complex64::from_polar(1.0, pi * e.magdir / 180.0)).re;
                            y = Complex64::from(a * w);
                        }
                    } else {
                        y = Complex64::from(a * mat.do_energy_dc(b1.re, b2.re));
                    }

                    if mat.lam_type.is_wound() {
                        let u = lbl.o.im;
                        y += a * (j_avg * j_avg).re * u / 2.0;
                    }
                }
                y * self.aecf(i)
            }

            HysteresisLosses => {
                if self.frequency == 0.0 {
                    return Complex64::new(0.0, 0.0);
                }
                if axi {
                    a *= 2.0 * pi * r_mean;
                } else {
                    a *= self.depth;
                }
                let (h1, h2) = self.get_h_ac(e.b1, e.b2, i);
                Complex64::from(
                    a * pi * self.frequency * (h1 * e.b1.conj() + h2 * e.b2.conj()).im,
                )
            }

            ResistiveLosses => {
                let sig = if lbl.o == Complex64::new(0.0, 0.0) {
                    0.0
                } else {
                    1.0e06 / (1.0 / lbl.o).re
                };
                let sig = if mat.lam_d != 0.0 && mat.lam_type == crate::model::LamType::Plain {
                    0.0
                } else {
                    sig
                };
                if sig == 0.0 {
                    return Complex64::new(0.0, 0.0);
                }
                let mut y;
                if axi {
                    y = 2.0 * pi * r_mean * a * j_avg * j_avg.conj() / sig;
                } else {
                    let mut v = [Complex64::new(0.0, 0.0); 3];
                    for k in 0..3 {
                        v[k] = jn[k].conj() / sig;
                    }
                    y = pln_int(a, &jn, &v) * self.depth;
                }
                if self.frequency != 0.0 {
                    y /= 2.0;
                }
                y
            }

            CrossSectionArea => Complex64::from(a),

            TotalCurrent => a * j_avg,

            FluxDensityX | FluxDensityY => {
                if axi {
                    a *= 2.0 * pi * r_mean;
                } else {
                    a *= self.depth;
                }
                if kind == FluxDensityX {
                    a * e.b1
                } else {
                    a * e.b2
                }
            }

            Volume => {
                if axi {
                    a *= 2.0 * pi * r_mean;
                } else {
                    a *= self.depth;
                }
                Complex64::from(a)
            }

            LorentzForceXSteady => {
                let b2 = e.b2;
                let mut y = -(b2.re * j_avg.re + b2.im * j_avg.im);
                if axi {
                    y = 0.0;
                } else {
                    y *= self.depth;
                }
                if self.frequency != 0.0 {
                    y *= 0.5;
                }
                Complex64::from(a * y)
            }

            LorentzForceYSteady => {
                let mut v = [Complex64::new(0.0, 0.0); 3];
                for k in 0..3 {
                    v[k] = Complex64::from((e.b1 * jn[k].conj()).re);
                }
                let mut y = if axi {
                    axi_int(-a, &ones, &v, &r)
                } else {
                    pln_int(a, &ones, &v) * self.depth
                };
                if self.frequency != 0.0 {
                    y *= 0.5;
                }
                y
            }

            LorentzForceX2X => {
                if self.frequency == 0.0 || axi {
                    return Complex64::new(0.0, 0.0);
                }
                let b2 = e.b2;
                let y = Complex64::new(
                    -(b2.re * j_avg.re - b2.im * j_avg.im),
                    -(b2.re * j_avg.im + b2.im * j_avg.re),
                );
                0.5 * a * y * self.depth
            }

            LorentzForceY2X => {
                if self.frequency == 0.0 {
                    return Complex64::new(0.0, 0.0);
                }
                let b1 = e.b1;
                let mut y = Complex64::new(
                    b1.re * j_avg.re - b1.im * j_avg.im,
                    b1.re * j_avg.im + b1.im * j_avg.re,
                );
                if axi {
                    y = -y * 2.0 * pi * r_mean;
                } else {
                    y *= self.depth;
                }
                a * y / 2.0
            }

            LorentzTorqueSteady => {
                if axi {
                    return Complex64::new(0.0, 0.0);
                }
                let b1 = e.b1;
                let b2 = e.b2;
                let c = e.ctr * lc;
                let mut y = c.im * (b2.re * j_avg.re + b2.im * j_avg.im)
                    + c.re * (b1.re * j_avg.re + b1.im * j_avg.im);
                if self.frequency != 0.0 {
                    y *= 0.5;
                }
                Complex64::from(a * y * self.depth)
            }

            LorentzTorque2X => {
                if self.frequency == 0.0 || axi {
                    return Complex64::new(0.0, 0.0);
                }
                let b1 = e.b1;
                let b2 = e.b2;
                let c = e.ctr * lc;
                let y = c.re
                    * Complex64::new(
                        b1.re * j_avg.re - b1.im * j_avg.im,
                        b1.re * j_avg.im + b1.im * j_avg.re,
                    )
                    + c.im
                        * Complex64::new(
                            b2.re * j_avg.re - b2.im * j_avg.im,
                            b2.re * j_avg.im + b2.im * j_avg.re,
                        );
                0.5 * a * y * self.depth
            }

            MagneticCoenergy => {
                if axi {
                    a *= 2.0 * pi * r_mean;
                } else {
                    a *= self.depth;
                }
                let b1 = e.b1;
                let b2 = e.b2;
                let mut y;
                if self.frequency != 0.0 {
                    if mat.lam_type.is_wound() {
                        let mu = MU0 * lbl.mu;
                        let u = (1.0 / lbl.o).im / (2.0e6 * pi * self.frequency);
                        y = Complex64::from(
                            a * (b1 * b1.conj() + b2 * b2.conj()).re * (1.0 / mu).re / 4.0,
                        );
                        y += a * (j_avg * j_avg.conj()).re * u / 4.0;
                    } else {
                        y = Complex64::from(a * mat.do_coenergy_ac(b1, b2));
                    }
                } else {
                    y = Complex64::from(a * mat.do_coenergy_dc(b1.re, b2.re));
                    if mat.lam_type.is_wound() {
                        let u = lbl.o.im;
                        y += a * (j_avg * j_avg).re * u / 2.0;
                    }
                }
                y * self.aecf(i)
            }

            MomentOfInertia => {
                if axi {
                    let mut v = [Complex64::new(0.0, 0.0); 3];
                    for k in 0..3 {
                        v[k] = Complex64::from(r[k]);
                    }
                    axi_int(a, &v, &v, &r)
                } else {
                    let mut u = [0.0; 3];
                    let mut v = [0.0; 3];
                    for k in 0..3 {
                        u[k] = self.mesh_nodes[e.p[k]].pos.x * lc;
                        v[k] = self.mesh_nodes[e.p[k]].pos.y * lc;
                    }
                    let mut y = u[0] * u[0] + u[1] * u[1] + u[2] * u[2];
                    y += u[0] * u[1] + u[0] * u[2] + u[1] * u[2];
                    y += v[0] * v[0] + v[1] * v[1] + v[2] * v[2];
                    y += v[0] * v[1] + v[0] * v[2] + v[1] * v[2];
                    Complex64::from(y * a * self.depth / 6.0)
                }
            }

            Centroid => e.ctr * a,

            // Henrotte family: weighted Maxwell stress over all elements
            HenrotteForceXSteady
            | HenrotteForceYSteady
            | HenrotteForceX2X
            | HenrotteForceY2X
            | HenrotteTorqueSteady
            | HenrotteTorque2X => {
                if axi {
                    a *= 2.0 * pi * r_mean;
                } else {
                    a *= self.depth;
                }
                self.henrotte_contribution(i, kind, a)
            }

            TotalLosses => Complex64::new(0.0, 0.0),
        }
    }

    fn henrotte_contribution(&self, i: usize, kind: BlockIntegrand, a: f64) -> Complex64 {
        use BlockIntegrand::*;

        let planar = self.problem_type == ProblemType::Planar;
        let e = &self.elements[i];
        let b1 = e.b1;
        let b2 = e.b2;
        let c = self.henrotte_vector(i);
        let lc = self.lc();

        match kind {
            HenrotteForceXSteady => {
                if !planar {
                    return Complex64::new(0.0, 0.0);
                }
                let mut y = ((b1 * b1.conj() - b2 * b2.conj()) * c.re
                    + 2.0 * (b1 * b2.conj()).re * c.im)
                    / (2.0 * MU0);
                if self.frequency != 0.0 {
                    y /= 2.0;
                }
                a * y * self.aecf(i)
            }

            HenrotteForceYSteady => {
                let mut y = ((b2 * b2.conj() - b1 * b1.conj()) * c.im
                    + 2.0 * (b1 * b2.conj()).re * c.re)
                    / (2.0 * MU0);
                y *= self.aecf(i);
                if self.frequency != 0.0 {
                    y /= 2.0;
                }
                a * y
            }

            HenrotteForceX2X => {
                if !planar {
                    return Complex64::new(0.0, 0.0);
                }
                a * (((b1 * b1 - b2 * b2) * c.re + 2.0 * b1 * b2 * c.im) / (4.0 * MU0))
                    * self.aecf(i)
            }

            HenrotteForceY2X => {
                a * (((b2 * b2 - b1 * b1) * c.im + 2.0 * b1 * b2 * c.re) / (4.0 * MU0))
                    * self.aecf(i)
            }

            HenrotteTorqueSteady => {
                if !planar {
                    return Complex64::new(0.0, 0.0);
                }
                let f1 = ((b1 * b1.conj() - b2 * b2.conj()) * c.re
                    + 2.0 * (b1 * b2.conj()).re * c.im)
                    / (2.0 * MU0);
                let f2 = ((b2 * b2.conj() - b1 * b1.conj()) * c.im
                    + 2.0 * (b1 * b2.conj()).re * c.re)
                    / (2.0 * MU0);

                let mut ctr = Complex64::new(0.0, 0.0);
                for k in 0..3 {
                    ctr += self.mesh_nodes[e.p[k]].cc() * lc / 3.0;
                }

                let mut y = ctr.re * f2 - ctr.im * f1;
                if self.frequency != 0.0 {
                    y /= 2.0;
                }
                a * y * self.aecf(i)
            }

            HenrotteTorque2X => {
                if !planar {
                    return Complex64::new(0.0, 0.0);
                }
                let f1 = ((b1 * b1 - b2 * b2) * c.re + 2.0 * b1 * b2 * c.im) / (4.0 * MU0);
                let f2 = ((b2 * b2 - b1 * b1) * c.im + 2.0 * b1 * b2 * c.re) / (4.0 * MU0);

                let mut ctr = Complex64::new(0.0, 0.0);
                for k in 0..3 {
                    ctr += self.mesh_nodes[e.p[k]].cc() * lc / 3.0;
                }

                a * (ctr.re * f2 - ctr.im * f1) * self.aecf(i)
            }

            _ => Complex64::new(0.0, 0.0),
        }
    }
}
