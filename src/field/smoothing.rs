//! Patch-smoothed nodal flux density
//!
//! The element-wise B is piecewise constant. For display and point
//! queries, a continuous nodal B is reconstructed by averaging over each
//! node's element patch. Nodes on material interfaces get special
//! treatment: one sample is taken on the interface edge to each side
//! (tangential B from the element average, normal B from the jump in A),
//! and corners too sharp for that rule fall back to rescaling the element
//! B by the largest same-material neighbour magnitude.

use num_complex::Complex64;

use crate::post::PostProcessor;
use crate::units::ProblemType;

impl PostProcessor {
    /// Fill the smoothed nodal flux density of every element
    pub(crate) fn smooth_all(&mut self) {
        for i in 0..self.elements.len() {
            let (b1, b2) = self.nodal_b(i);
            self.elements[i].b1n = b1;
            self.elements[i].b2n = b2;
        }
    }

    /// Whether the materials of two elements are magnetically compatible
    /// for smoothing purposes
    fn patch_compatible(&self, ei: usize, other: usize) -> bool {
        let e = &self.elements[ei];
        let o = &self.elements[other];
        if e.lbl == o.lbl {
            return true;
        }
        let me = &self.materials[e.blk];
        let mo = &self.materials[o.blk];
        if self.frequency == 0.0 {
            (me.mu_x == mo.mu_x && me.mu_y == mo.mu_y && me.h_c == mo.h_c && e.magdir == o.magdir)
                || (e.blk == o.blk && e.magdir == o.magdir)
        } else {
            me.mu_fdx == mo.mu_fdx && me.mu_fdy == mo.mu_fdy
        }
    }

    /// In the fan of elements around node `k`, the neighbour of `cur`
    /// across the edge (k, pt), if any
    fn fan_neighbour(&self, k: usize, cur: usize, pt: usize) -> Option<usize> {
        self.adjacency[k]
            .iter()
            .copied()
            .find(|&cand| cand != cur && self.elements[cand].p.contains(&pt))
    }

    /// Smoothed flux density at the three vertices of element `ei`
    pub(crate) fn nodal_b(&self, ei: usize) -> ([Complex64; 3], [Complex64; 3]) {
        let zero = Complex64::new(0.0, 0.0);
        let mut out1 = [zero; 3];
        let mut out2 = [zero; 3];
        let lc = self.lc();

        for i in 0..3 {
            let k = self.elements[ei].p[i];
            let p = self.mesh_nodes[k].cc();
            let deg = self.adjacency[k].len();
            let mut b1 = zero;
            let mut b2 = zero;

            let m = self
                .adjacency[k]
                .iter()
                .filter(|&&j| self.patch_compatible(ei, j))
                .count();

            if m == deg {
                // all neighbours compatible: inverse-distance average
                let mut w_sum = 0.0;
                for &j in &self.adjacency[k] {
                    let z = 1.0 / (p - self.elements[j].ctr).norm();
                    w_sum += z;
                    b1 += z * self.elements[j].b1;
                    b2 += z * self.elements[j].b2;
                }
                b1 /= w_sum;
                b2 /= w_sum;
            } else {
                let mut w_sum = 0.0;
                let mut v1 = zero;
                let mut v2 = zero;

                // one interface sample, tangential from the element
                // average and normal from the jump in A along the edge
                let mut interface_sample =
                    |cur: usize, pt: usize, b1: &mut Complex64, b2: &mut Complex64| {
                        let mut tn = self.mesh_nodes[pt].cc() - self.mesh_nodes[k].cc();
                        let r = (self.mesh_nodes[pt].pos.x + self.mesh_nodes[k].pos.x) * lc / 2.0;
                        let mut bn = (self.mesh_nodes[pt].a - self.mesh_nodes[k].a)
                            / (tn.norm() * lc);
                        if self.problem_type == ProblemType::Axisymmetric {
                            bn /= -2.0 * std::f64::consts::PI * r;
                        }
                        let z = 0.5 / tn.norm();
                        tn /= tn.norm();
                        let bt = self.elements[cur].b1 * tn.re + self.elements[cur].b2 * tn.im;
                        w_sum += z;
                        *b1 += z * tn.re * bt + z * tn.im * bn;
                        *b2 += z * tn.im * bt - z * tn.re * bn;
                        tn
                    };

                // scan counter-clockwise for an interface
                let mut cur = ei;
                for _ in 0..deg {
                    let ptj = self.elements[cur].p.iter().position(|&n| n == k).unwrap();
                    let pt = self.elements[cur].p[(ptj + 2) % 3];
                    match self.fan_neighbour(k, cur, pt) {
                        None => {
                            // open fan: take the element value as-is
                            b1 = self.elements[cur].b1;
                            b2 = self.elements[cur].b2;
                            v1 = Complex64::new(1.0, 0.0);
                            v2 = Complex64::new(1.0, 0.0);
                            break;
                        }
                        Some(nxt) if self.elements[ei].lbl != self.elements[nxt].lbl => {
                            v1 = interface_sample(cur, pt, &mut b1, &mut b2);
                            break;
                        }
                        Some(nxt) => cur = nxt,
                    }
                }

                // scan clockwise unless the first scan already punted
                if v2 == zero {
                    let mut cur = ei;
                    for _ in 0..deg {
                        let ptj = self.elements[cur].p.iter().position(|&n| n == k).unwrap();
                        let pt = self.elements[cur].p[(ptj + 1) % 3];
                        match self.fan_neighbour(k, cur, pt) {
                            None => {
                                b1 = self.elements[cur].b1;
                                b2 = self.elements[cur].b2;
                                v1 = Complex64::new(1.0, 0.0);
                                v2 = Complex64::new(1.0, 0.0);
                                break;
                            }
                            Some(nxt) if self.elements[ei].lbl != self.elements[nxt].lbl => {
                                v2 = interface_sample(cur, pt, &mut b1, &mut b2);
                                break;
                            }
                            Some(nxt) => cur = nxt,
                        }
                    }
                    b1 /= w_sum;
                    b2 /= w_sum;
                }

                // the interface rule only holds for flat-ish interfaces:
                // require two usable edges meeting at less than ~10 degrees
                let mut ok = v1.norm() < 0.9 || v2.norm() < 0.9;
                if -v1.re * v2.re - v1.im * v2.im > 0.985 {
                    ok = true;
                }

                if !ok {
                    // rescale the element B by the largest same-material
                    // neighbour magnitude, real and imaginary parts apart
                    let e = &self.elements[ei];
                    let mut bn = zero;
                    for &j in &self.adjacency[k] {
                        if e.lbl == self.elements[j].lbl {
                            let o = &self.elements[j];
                            let re = (o.b1.re * o.b1.re + o.b2.re * o.b2.re).sqrt();
                            let im = (o.b1.im * o.b1.im + o.b2.im * o.b2.im).sqrt();
                            bn.re = bn.re.max(re);
                            bn.im = bn.im.max(im);
                        }
                    }

                    let r = (e.b1.re * e.b1.re + e.b2.re * e.b2.re).sqrt();
                    if r != 0.0 {
                        b1.re = bn.re / r * e.b1.re;
                        b2.re = bn.re / r * e.b2.re;
                    } else {
                        b1.re = 0.0;
                        b2.re = 0.0;
                    }

                    let r = (e.b1.im * e.b1.im + e.b2.im * e.b2.im).sqrt();
                    if r != 0.0 {
                        b1.im = bn.im / r * e.b1.im;
                        b2.im = bn.im / r * e.b2.im;
                    } else {
                        b1.im = 0.0;
                        b2.im = 0.0;
                    }
                }
            }

            // a node carrying a point current gets no smoothing at all
            if !self.point_props.is_empty() {
                for gn in &self.nodes {
                    if (p - gn.cc()).norm() < 1.0e-08 {
                        if let Some(marker) = gn.boundary_marker {
                            let j = self.point_props[marker].j;
                            if j.re != 0.0 || j.im != 0.0 {
                                b1 = self.elements[ei].b1;
                                b2 = self.elements[ei].b2;
                            }
                        }
                    }
                }
            }

            // on the axis of an axisymmetric problem B_r is identically 0
            if p.re.abs() < 1.0e-06 && self.problem_type == ProblemType::Axisymmetric {
                b1 = zero;
            }

            out1[i] = b1;
            out2[i] = b2;
        }

        (out1, out2)
    }
}
