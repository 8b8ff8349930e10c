//! Contour (line) integrals
//!
//! The contour is a polyline of points in file units. Each segment is
//! split into midpoint samples offset slightly to the left of the travel
//! direction so every sample lands on a consistent side of material
//! interfaces. Successive samples are located through the previous
//! element's vertex neighbourhood before falling back to the full search.

use num_complex::Complex64;

use crate::post::PostProcessor;
use crate::units::ProblemType;

/// The contour integrals the engine can evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineIntegrand {
    /// Flux crossing the contour (and average flux density)
    NormalFlux,
    /// Tangential H (MMF drop) and its average
    TangentialH,
    /// Contour length and swept surface area
    Length,
    /// Maxwell stress-tensor force, steady and 2x parts
    StressForce,
    /// Maxwell stress-tensor torque about the origin, steady and 2x parts
    StressTorque,
    /// Integral of (B.n)^2 and its average
    NormalFluxSquared,
}

impl LineIntegrand {
    /// Integrand from its scripted integer code
    pub fn from_code(code: u32) -> Option<Self> {
        use LineIntegrand::*;
        Some(match code {
            0 => NormalFlux,
            1 => TangentialH,
            2 => Length,
            3 => StressForce,
            4 => StressTorque,
            5 => NormalFluxSquared,
            _ => return None,
        })
    }
}

impl PostProcessor {
    /// Evaluate a line integral along the current contour.
    ///
    /// The result layout matches the integrand: slot 0 is the main value,
    /// slot 1 the average (or 2x part for the stress family), slots 2 and
    /// 3 the 2x force components where applicable.
    pub fn line_integral(&self, kind: LineIntegrand) -> [Complex64; 4] {
        let zero = Complex64::new(0.0, 0.0);
        let mut z = [zero; 4];
        if self.contour.len() < 2 {
            return z;
        }
        let lc = self.lc();
        let axi = self.problem_type == ProblemType::Axisymmetric;
        let pi = std::f64::consts::PI;
        let samples = self.config.line_integral_points;

        match kind {
            LineIntegrand::NormalFlux => {
                let k = self.contour.len();
                let a0 = self
                    .point_values(self.contour[0].re, self.contour[0].im)
                    .map(|u| u.a)
                    .unwrap_or(zero);
                let a1 = self
                    .point_values(self.contour[k - 1].re, self.contour[k - 1].im)
                    .map(|u| u.a)
                    .unwrap_or(zero);
                if !axi {
                    let mut l = 0.0;
                    for i in 0..k - 1 {
                        l += (self.contour[i + 1] - self.contour[i]).norm();
                    }
                    l *= lc;
                    z[0] = (a0 - a1) * self.depth;
                    if l != 0.0 {
                        z[1] = z[0] / (l * self.depth);
                    }
                } else {
                    let mut l = 0.0;
                    for i in 0..k - 1 {
                        l += pi
                            * (self.contour[i].re + self.contour[i + 1].re)
                            * (self.contour[i + 1] - self.contour[i]).norm();
                    }
                    l *= lc * lc;
                    z[0] = a1 - a0;
                    if l != 0.0 {
                        z[1] = z[0] / l;
                    }
                }
            }

            LineIntegrand::Length => {
                let k = self.contour.len();
                let mut len = 0.0;
                for i in 0..k - 1 {
                    len += (self.contour[i + 1] - self.contour[i]).norm();
                }
                z[0].re = len * lc;
                if axi {
                    let mut area = 0.0;
                    for i in 0..k - 1 {
                        area += pi
                            * (self.contour[i].re + self.contour[i + 1].re)
                            * (self.contour[i + 1] - self.contour[i]).norm();
                    }
                    z[0].im = area * lc * lc;
                } else {
                    z[0].im = z[0].re * self.depth;
                }
            }

            LineIntegrand::TangentialH => {
                for k in 1..self.contour.len() {
                    let dz = (self.contour[k] - self.contour[k - 1]).norm() / samples as f64;
                    let mut elm = None;
                    for i in 0..samples {
                        if let Some((_pt, t, _n, v)) =
                            self.contour_sample(k, i, samples, &mut elm)
                        {
                            let ht = t.re * v.h1 + t.im * v.h2;
                            z[0] += ht * dz * lc;
                        }
                    }
                }
                let l = self.contour_length() * lc;
                if l != 0.0 {
                    z[1] = z[0] / l;
                }
            }

            LineIntegrand::NormalFluxSquared => {
                for k in 1..self.contour.len() {
                    let dz = (self.contour[k] - self.contour[k - 1]).norm() / samples as f64;
                    let mut elm = None;
                    for i in 0..samples {
                        if let Some((_pt, _t, n, v)) =
                            self.contour_sample(k, i, samples, &mut elm)
                        {
                            let bn = n.re * v.b1 + n.im * v.b2;
                            z[0] += bn * bn.conj() * dz * lc;
                        }
                    }
                }
                let l = self.contour_length() * lc;
                if l != 0.0 {
                    z[1] = z[0] / l;
                }
            }

            LineIntegrand::StressForce => {
                for k in 1..self.contour.len() {
                    let dz = (self.contour[k] - self.contour[k - 1]).norm() / samples as f64;
                    let mut elm = None;
                    for i in 0..samples {
                        let (pt, _t, n, v) = match self.contour_sample(k, i, samples, &mut elm) {
                            Some(s) => s,
                            None => continue,
                        };

                        let hn = n.re * v.h1 + n.im * v.h2;
                        let bn = n.re * v.b1 + n.im * v.b2;
                        let bh = v.b1 * v.h1 + v.b2 * v.h2;
                        let mut df1 = v.h1 * bn + v.b1 * hn - n.re * bh;
                        let df2 = v.h2 * bn + v.b2 * hn - n.im * bh;

                        let mut dza = dz * lc;
                        if axi {
                            dza *= 2.0 * pi * pt.re * lc;
                            df1 = zero;
                        } else {
                            dza *= self.depth;
                        }

                        if self.frequency == 0.0 {
                            z[0] += df1 * dza / 2.0;
                            z[1] += df2 * dza / 2.0;
                        } else {
                            z[0] += df1 * dza / 4.0;
                            z[1] += df2 * dza / 4.0;

                            let bh = v.b1 * v.h1.conj() + v.b2 * v.h2.conj();
                            let df1 = if !axi {
                                v.h1 * bn.conj() + v.b1 * hn.conj() - n.re * bh
                            } else {
                                zero
                            };
                            let df2 = v.h2 * bn.conj() + v.b2 * hn.conj() - n.im * bh;

                            z[2] += df1 * dza / 4.0;
                            z[3] += df2 * dza / 4.0;
                        }
                    }
                }
            }

            LineIntegrand::StressTorque => {
                for k in 1..self.contour.len() {
                    let dz = (self.contour[k] - self.contour[k - 1]).norm() / samples as f64;
                    let mut elm = None;
                    for i in 0..samples {
                        let (pt, _t, n, v) = match self.contour_sample(k, i, samples, &mut elm) {
                            Some(s) => s,
                            None => continue,
                        };

                        let hn = n.re * v.h1 + n.im * v.h2;
                        let bn = n.re * v.b1 + n.im * v.b2;
                        let bh = v.b1 * v.h1 + v.b2 * v.h2;
                        let df1 = v.h1 * bn + v.b1 * hn - n.re * bh;
                        let df2 = v.h2 * bn + v.b2 * hn - n.im * bh;
                        let dt = pt.re * df2 - df1 * pt.im;
                        let dza = dz * lc * lc;

                        if self.frequency == 0.0 {
                            z[0] += dt * dza * self.depth / 2.0;
                        } else {
                            z[0] += dt * dza * self.depth / 4.0;

                            let bh = v.b1 * v.h1.conj() + v.b2 * v.h2.conj();
                            let df1 = v.h1 * bn.conj() + v.b1 * hn.conj() - n.re * bh;
                            let df2 = v.h2 * bn.conj() + v.b2 * hn.conj() - n.im * bh;
                            let dt = pt.re * df2 - df1 * pt.im;

                            z[1] += dt * dza * self.depth / 4.0;
                        }
                    }
                }
            }
        }

        z
    }

    /// Total contour length, file units
    fn contour_length(&self) -> f64 {
        let mut l = 0.0;
        for i in 0..self.contour.len().saturating_sub(1) {
            l += (self.contour[i + 1] - self.contour[i]).norm();
        }
        l
    }

    /// The i-th midpoint sample of contour segment `k`: position, unit
    /// tangent, unit normal and the field there. `elm` carries the element
    /// hint between samples.
    #[allow(clippy::type_complexity)]
    fn contour_sample(
        &self,
        k: usize,
        i: usize,
        samples: usize,
        elm: &mut Option<usize>,
    ) -> Option<(Complex64, Complex64, Complex64, crate::field::PointValues)> {
        let u = (i as f64 + 0.5) / samples as f64;
        let mut pt = self.contour[k - 1] + u * (self.contour[k] - self.contour[k - 1]);
        let mut t = self.contour[k] - self.contour[k - 1];
        t /= t.norm();
        let n = Complex64::i() * t;
        pt += n * 1.0e-06;

        let found = self.relocate(pt.re, pt.im, *elm);
        *elm = found;
        let e = found?;
        Some((pt, t, n, self.point_values_in_element(pt.re, pt.im, e)))
    }

    /// Replace the last contour segment with an arc of `angle` degrees,
    /// approximated by straight pieces of at most `anglestep` degrees.
    pub fn bend_contour(&mut self, angle: f64, anglestep: f64) {
        if angle == 0.0 {
            return;
        }
        let anglestep = if anglestep == 0.0 { 1.0 } else { anglestep };

        // need at least one full segment to bend
        if self.contour.len() < 2 {
            return;
        }
        if !(-180.0..=180.0).contains(&angle) {
            return;
        }

        let n = (angle / anglestep).abs().ceil() as usize;
        let tta = angle * std::f64::consts::PI / 180.0;
        let dtta = tta / n as f64;

        let a1 = self.contour.pop().unwrap();
        let a0 = *self.contour.last().unwrap();

        // center and radius of the circle carrying the arc
        let d = (a1 - a0).norm();
        let r = d / (2.0 * (tta / 2.0).abs().sin());

        let c = if tta > 0.0 {
            a0 + (r / d)
                * (a1 - a0)
                * Complex64::from_polar(1.0, (std::f64::consts::PI - tta) / 2.0)
        } else {
            a0 + (r / d)
                * (a1 - a0)
                * Complex64::from_polar(1.0, -(std::f64::consts::PI + tta) / 2.0)
        };

        for k in 1..=n {
            self.contour
                .push(c + (a0 - c) * Complex64::from_polar(1.0, k as f64 * dtta));
        }
    }
}
