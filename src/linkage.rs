//! Circuit-level quantities: voltage drop and flux linkage
//!
//! The ordinary case divides the A.J* integral by the conjugate current.
//! Zero current and zero frequency strip that away and every combination
//! of circuit type, solid/stranded construction and conductivity needs
//! its own fallback; the routines below cover each one.

use num_complex::Complex64;

use crate::integral::quadrature::{axi_int, pln_int};
use crate::model::CircuitKind;
use crate::post::PostProcessor;
use crate::units::ProblemType;

impl PostProcessor {
    /// Per-element area (m^2) and vertex radii (m), shared by the circuit
    /// accumulation loops
    fn element_metric(&self, i: usize) -> (f64, [f64; 3]) {
        let lc = self.lc();
        let a = self.elm_area(i) * lc * lc;
        let mut r = [0.0; 3];
        if self.problem_type == ProblemType::Axisymmetric {
            for k in 0..3 {
                r[k] = self.mesh_nodes[self.elements[i].p[k]].pos.x * lc;
            }
        }
        (a, r)
    }

    /// Voltage drop across a stranded, current-carrying region:
    /// `(turns / area) * integral(i w A + rho J)`
    pub(crate) fn stranded_voltage_drop(&self, lbl: usize) -> Complex64 {
        let ones = [Complex64::new(1.0, 0.0); 3];
        let w = 2.0 * std::f64::consts::PI * self.frequency;
        let mut volts = Complex64::new(0.0, 0.0);
        let mut atot = 0.0;

        for i in 0..self.elements.len() {
            if self.elements[i].lbl != lbl {
                continue;
            }
            let mut rho = self.labels[lbl].o * 1.0e6;
            if self.frequency == 0.0 {
                rho = rho.re.into();
            }
            if rho != Complex64::new(0.0, 0.0) {
                rho = 1.0 / rho;
            }

            let (_javg, j, a_nodal) = self.get_ja(i);
            let (a, r) = self.element_metric(i);
            atot += a;

            let mut v = [Complex64::new(0.0, 0.0); 3];
            for k in 0..3 {
                v[k] = Complex64::new(0.0, w) * a_nodal[k] + rho * j[k];
            }
            if self.problem_type == ProblemType::Planar {
                volts += pln_int(a, &v, &ones) * self.depth;
            } else {
                volts += axi_int(a, &v, &ones, &r);
            }
        }
        volts * (self.labels[lbl].turns as f64 / atot)
    }

    /// Flux linkage of a stranded region at zero frequency and zero
    /// current
    fn stranded_linkage(&self, lbl: usize) -> Complex64 {
        let ones = [Complex64::new(1.0, 0.0); 3];
        let mut linkage = Complex64::new(0.0, 0.0);
        let mut atot = 0.0;

        for i in 0..self.elements.len() {
            if self.elements[i].lbl != lbl {
                continue;
            }
            let (_javg, _j, a_nodal) = self.get_ja(i);
            let (a, r) = self.element_metric(i);
            atot += a;

            if self.problem_type == ProblemType::Planar {
                linkage += pln_int(a, &a_nodal, &ones) * self.depth;
            } else {
                linkage += axi_int(a, &a_nodal, &ones, &r);
            }
        }
        linkage * (self.labels[lbl].turns as f64 / atot)
    }

    /// Flux linkage of a solid axisymmetric region at zero frequency and
    /// zero current. The current that would flow distributes as 1/r, so
    /// the average is weighted accordingly.
    fn solid_axisymmetric_linkage(&self, lbl: usize) -> Complex64 {
        let mut linkage = Complex64::new(0.0, 0.0);
        let mut atot = 0.0;
        let two_pi = 2.0 * std::f64::consts::PI;

        for i in 0..self.elements.len() {
            if self.elements[i].lbl != lbl {
                continue;
            }
            let (_javg, _j, a_nodal) = self.get_ja(i);
            let aa = (a_nodal[0] + a_nodal[1] + a_nodal[2]) / 3.0;
            let (a, r) = self.element_metric(i);
            let r_mean = (r[0] + r[1] + r[2]) / 3.0;

            atot += a / r_mean;
            linkage += two_pi * r_mean * a * (aa / r_mean);
        }
        linkage * (self.labels[lbl].turns as f64 / atot)
    }

    /// Flux linkage of a parallel circuit at zero frequency and zero
    /// current, with the would-be current divided up by conductivity
    fn parallel_linkage(&self, circ: usize) -> Complex64 {
        let ones = [Complex64::new(1.0, 0.0); 3];
        let mut linkage = Complex64::new(0.0, 0.0);
        let mut atot = 0.0;
        let two_pi = 2.0 * std::f64::consts::PI;

        for i in 0..self.elements.len() {
            if self.labels[self.elements[i].lbl].in_circuit != Some(circ) {
                continue;
            }
            let c = self.materials[self.elements[i].blk].cduct;
            let (_javg, _j, a_nodal) = self.get_ja(i);
            let (a, r) = self.element_metric(i);

            if self.problem_type == ProblemType::Planar {
                linkage += pln_int(a, &a_nodal, &ones) * self.depth * c;
                atot += a * c;
            } else {
                let r_mean = (r[0] + r[1] + r[2]) / 3.0;
                let aa = (a_nodal[0] + a_nodal[1] + a_nodal[2]) / 3.0;
                linkage += two_pi * r_mean * c * (aa / r_mean);
                atot += a * c / r_mean;
            }
        }
        linkage / atot
    }

    /// Parallel-circuit linkage when every member block has zero
    /// conductivity: assume a uniform current density instead
    fn parallel_linkage_alt(&self, circ: usize) -> Complex64 {
        let ones = [Complex64::new(1.0, 0.0); 3];
        let mut linkage = Complex64::new(0.0, 0.0);
        let mut atot = 0.0;

        for i in 0..self.elements.len() {
            if self.labels[self.elements[i].lbl].in_circuit != Some(circ) {
                continue;
            }
            let (_javg, _j, a_nodal) = self.get_ja(i);
            let (a, r) = self.element_metric(i);
            atot += a;

            if self.problem_type == ProblemType::Planar {
                linkage += pln_int(a, &a_nodal, &ones) * self.depth;
            } else {
                linkage += axi_int(a, &a_nodal, &ones, &r);
            }
        }
        linkage / atot
    }

    /// Voltage drop across circuit `circ`
    pub fn voltage_drop(&self, circ: usize) -> Complex64 {
        let mut volts = Complex64::new(0.0, 0.0);
        let two_pi = 2.0 * std::f64::consts::PI;

        match self.circuits[circ].kind {
            CircuitKind::Series => {
                for (i, label) in self.labels.iter().enumerate() {
                    if label.in_circuit != Some(circ) {
                        continue;
                    }
                    if label.source.is_voltage() {
                        // solid region; turns only carry the direction
                        let dv = label.source.volts() * label.turns as f64;
                        if self.problem_type == ProblemType::Axisymmetric {
                            volts -= two_pi * dv;
                        } else {
                            volts -= self.depth * dv;
                        }
                    } else {
                        volts += self.stranded_voltage_drop(i);
                    }
                }
            }

            CircuitKind::Parallel => {
                // the first solid member knows the voltage drop
                let mut found = false;
                for label in &self.labels {
                    if label.in_circuit == Some(circ) && label.source.is_voltage() {
                        if self.problem_type == ProblemType::Axisymmetric {
                            volts -= two_pi * label.source.volts();
                        } else {
                            volts -= self.depth * label.source.volts();
                        }
                        found = true;
                        break;
                    }
                }

                // all members have zero conductivity: the voltage is set
                // by the rate of change of the average potential
                if !found {
                    let ones = [Complex64::new(1.0, 0.0); 3];
                    let mut linkage = Complex64::new(0.0, 0.0);
                    let mut atot = 0.0;
                    for i in 0..self.elements.len() {
                        if self.labels[self.elements[i].lbl].in_circuit != Some(circ) {
                            continue;
                        }
                        let (_javg, _j, a_nodal) = self.get_ja(i);
                        let (a, r) = self.element_metric(i);
                        atot += a;
                        if self.problem_type == ProblemType::Planar {
                            linkage += pln_int(a, &a_nodal, &ones) * self.depth;
                        } else {
                            linkage += axi_int(a, &a_nodal, &ones, &r);
                        }
                    }
                    volts = Complex64::new(0.0, two_pi * self.frequency / atot) * linkage;
                }
            }

            CircuitKind::PrescribedCurrent => {}
        }

        volts
    }

    /// Flux linkage of circuit `circ`
    pub fn flux_linkage(&self, circ: usize) -> Complex64 {
        let amps = self.circuits[circ].amps;
        let two_pi = 2.0 * std::f64::consts::PI;

        if amps.re != 0.0 || amps.im != 0.0 {
            // the normal case: integral of A.J* divided by conj(I)
            let mut linkage = Complex64::new(0.0, 0.0);
            for i in 0..self.elements.len() {
                let lbl = &self.labels[self.elements[i].lbl];
                if lbl.in_circuit != Some(circ) {
                    continue;
                }
                let (_javg, mut j, mut a_nodal) = self.get_ja(i);
                let (a, r) = self.element_metric(i);

                // multiturn regions add a "local" linkage through the
                // imaginary part of the homogenized conductivity
                if lbl.o.im != 0.0 {
                    let u = if self.frequency == 0.0 {
                        lbl.o.im
                    } else {
                        (1.0e-6 / lbl.o).im / (two_pi * self.frequency)
                    };
                    for k in 0..3 {
                        a_nodal[k] += u * j[k];
                    }
                }

                for jk in j.iter_mut() {
                    *jk = jk.conj();
                }
                if self.problem_type == ProblemType::Planar {
                    linkage += pln_int(a, &a_nodal, &j) * self.depth;
                } else {
                    linkage += axi_int(a, &a_nodal, &j, &r);
                }
            }
            return linkage / amps.conj();
        }

        // zero current, nonzero frequency: all voltage is flux linkage
        if self.frequency != 0.0 {
            return self.voltage_drop(circ) / Complex64::new(0.0, two_pi * self.frequency);
        }

        // zero current and zero frequency
        match self.circuits[circ].kind {
            CircuitKind::Series => {
                let mut linkage = Complex64::new(0.0, 0.0);
                for (i, label) in self.labels.iter().enumerate() {
                    if label.in_circuit != Some(circ) {
                        continue;
                    }
                    if !label.source.is_voltage() || self.problem_type == ProblemType::Planar {
                        linkage += self.stranded_linkage(i);
                    } else {
                        // solid axisymmetric regions carry an uneven
                        // current distribution
                        linkage += self.solid_axisymmetric_linkage(i);
                    }
                }
                linkage
            }
            _ => {
                let any_conductive = self
                    .labels
                    .iter()
                    .any(|l| l.source.is_voltage() && l.in_circuit == Some(circ));
                if any_conductive {
                    self.parallel_linkage(circ)
                } else {
                    self.parallel_linkage_alt(circ)
                }
            }
        }
    }
}
