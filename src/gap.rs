//! Air-gap element harmonics and the derived torque, force and energy
//!
//! At load, each air-gap element's mid-gap radial and tangential flux
//! density is reconstructed pad by pad from the ten weighted nodes that
//! influence it, then projected onto cosine/sine harmonics at the pad
//! centers. The torque, force and stored-energy queries are closed forms
//! in those coefficients.
//!
//! The pad reconstruction polynomials come from the solver's air-gap
//! discretization and must match it term for term; they are transcribed
//! here verbatim.

use num_complex::Complex64;

use crate::error::GapError;
use crate::model::{AirGapElement, GapFormat};
use crate::post::PostProcessor;
use crate::units::MU0;

/// One harmonic of an air-gap element
#[derive(Debug, Clone, Copy, Default)]
pub struct GapHarmonic {
    /// Cosine/sine amplitudes of the gap potential
    pub acc: Complex64,
    pub acs: Complex64,
    /// Cosine/sine amplitudes of the radial flux density
    pub brc: Complex64,
    pub brs: Complex64,
    /// Cosine/sine amplitudes of the tangential flux density
    pub btc: Complex64,
    pub bts: Complex64,
}

/// Mid-gap field of one pad from its ten weighted node potentials.
/// `ci`/`co` are the inner and outer rotational shifts, `dt` the pad angle
/// (radians), `r` the mean gap radius and `dr` the gap thickness.
fn pad_field(a: &[Complex64; 10], ci: f64, co: f64, dt: f64, r: f64, dr: f64) -> (Complex64, Complex64) {
    let br = (-(ci * a[1]) - 2.0 * a[2] + 2.0 * a[3] + ci * (a[2] + a[3] - a[4])
        - ci * ci * ci * (a[0] - 4.0 * a[1] + 6.0 * a[2] - 4.0 * a[3] + a[4])
        + ci * ci * (a[0] - 5.0 * a[1] + 9.0 * a[2] - 7.0 * a[3] + 2.0 * a[4])
        - 2.0 * a[7]
        + 2.0 * a[8]
        + co * (-a[6] + a[7] + a[8] - a[9])
        - co * co * co * (a[5] - 4.0 * a[6] + 6.0 * a[7] - 4.0 * a[8] + a[9])
        + co * co * (a[5] - 5.0 * a[6] + 9.0 * a[7] - 7.0 * a[8] + 2.0 * a[9]))
        / (4.0 * dt * r);

    let bt = (ci * a[1] + 2.0 * a[2] + 2.0 * a[3]
        - ci * ci * (a[0] - 3.0 * a[1] + a[2] + 3.0 * a[3] - 2.0 * a[4])
        + ci * (a[2] - a[3] - a[4])
        + ci * ci * ci * (a[0] - 2.0 * a[1] + 2.0 * a[3] - a[4])
        - co * a[6]
        + (-2.0 + co) * (1.0 + co) * a[7]
        - 2.0 * a[8]
        + co * (a[8]
            + co * (a[5] - 3.0 * a[6] + 3.0 * a[8] - 2.0 * a[9])
            + a[9]
            + co * co * (-a[5] + 2.0 * a[6] - 2.0 * a[8] + a[9])))
        / (4.0 * dr);

    (br, bt)
}

/// Gap-centered potential of one pad (periodic gaps only)
fn pad_potential(a: &[Complex64; 10], ci: f64, co: f64) -> Complex64 {
    (2.0 * a[2] + 2.0 * a[3] + 2.0 * a[7] + 2.0 * a[8]
        + a[1] * ci
        + (a[2] - a[3] - a[4]) * ci
        - (a[0] - 3.0 * a[1] + a[2] + 3.0 * a[3] - 2.0 * a[4]) * ci * ci
        + (a[0] - 2.0 * a[1] + 2.0 * a[3] - a[4]) * ci * ci * ci
        + (a[6] + a[7] - a[8] - a[9]) * co
        - (a[5] - 3.0 * a[6] + a[7] + 3.0 * a[8] - 2.0 * a[9]) * co * co
        + (a[5] - 2.0 * a[6] + 2.0 * a[8] - a[9]) * co * co * co)
        / 8.0
}

/// Project the per-pad mid-gap field onto cosine/sine harmonics at the
/// pad centers, filling the coefficient tables and harmonic orders
pub(crate) fn project_harmonics(age: &mut AirGapElement, incremental: bool) {
    let ne = age.arc_elements;
    let dt = (std::f64::consts::PI / 180.0) * age.total_arc_length / ne as f64;

    let (nn_count, m) = match age.format {
        GapFormat::Periodic => (ne / 2 + 1, (360.0 / age.total_arc_length).round() as i32),
        GapFormat::Antiperiodic => ((ne + 1) / 2, (180.0 / age.total_arc_length).round() as i32),
    };

    age.nh = vec![0; nn_count];
    age.brc = vec![Complex64::new(0.0, 0.0); nn_count];
    age.brs = vec![Complex64::new(0.0, 0.0); nn_count];
    age.btc = vec![Complex64::new(0.0, 0.0); nn_count];
    age.bts = vec![Complex64::new(0.0, 0.0); nn_count];
    if incremental {
        age.brc_prev = vec![0.0; nn_count];
        age.brs_prev = vec![0.0; nn_count];
        age.btc_prev = vec![0.0; nn_count];
        age.bts_prev = vec![0.0; nn_count];
    }

    for j in 0..nn_count {
        age.nh[j] = match age.format {
            GapFormat::Periodic => m * j as i32,
            GapFormat::Antiperiodic => m * (2 * j as i32 + 1),
        };
        let n = age.nh[j] as f64;

        let mut brc = Complex64::new(0.0, 0.0);
        let mut brs = Complex64::new(0.0, 0.0);
        let mut btc = Complex64::new(0.0, 0.0);
        let mut bts = Complex64::new(0.0, 0.0);
        let mut prev = [0.0f64; 4];

        for k in 0..ne {
            let tta = (k as f64 + 0.5) * dt * n;
            let (c, s) = (tta.cos(), tta.sin());

            brc += age.br[k] * c;
            brs += age.br[k] * s;
            btc += age.bt[k] * c;
            bts += age.bt[k] * s;

            if incremental {
                prev[0] += age.br_prev[k] * c;
                prev[1] += age.br_prev[k] * s;
                prev[2] += age.bt_prev[k] * c;
                prev[3] += age.bt_prev[k] * s;
            }
        }

        // the DC bin (and the Nyquist bin of an even periodic expansion)
        // carries no factor-of-two
        let whole = age.nh[j] == 0
            || (j == nn_count - 1 && age.format == GapFormat::Periodic && ne % 2 == 0);
        let norm = if whole { ne as f64 } else { ne as f64 / 2.0 };

        age.brc[j] = brc / norm;
        age.brs[j] = brs / norm;
        age.btc[j] = btc / norm;
        age.bts[j] = bts / norm;

        if incremental {
            age.brc_prev[j] = prev[0] / norm;
            age.brs_prev[j] = prev[1] / norm;
            age.btc_prev[j] = prev[2] / norm;
            age.bts_prev[j] = prev[3] / norm;
        }
    }
}

impl PostProcessor {
    /// Gather the ten influence node indices and weights of pad `k`,
    /// applying the antiperiodic sign flips at the seam
    fn gap_pad_nodes(age: &AirGapElement, k: usize) -> ([usize; 10], [f64; 10]) {
        let ne = age.arc_elements;
        let q = &age.quad_points;
        let mut nn = [0usize; 10];
        let mut ww = [0.0f64; 10];

        // inner radius nodes
        let prev = if k == 0 { ne - 1 } else { k - 1 };
        nn[0] = q[prev].n0;
        ww[0] = q[prev].w0;
        nn[1] = q[k].n0;
        ww[1] = q[k].w0;
        nn[2] = q[k].n1;
        ww[2] = q[k].w1;
        nn[3] = q[k + 1].n1;
        ww[3] = q[k + 1].w1;
        let next = if k + 2 > ne { 1 } else { k + 2 };
        nn[4] = q[next].n1;
        ww[4] = q[next].w1;

        // outer radius nodes
        nn[5] = q[prev].n2;
        ww[5] = q[prev].w2;
        nn[6] = q[k].n2;
        ww[6] = q[k].w2;
        nn[7] = q[k].n3;
        ww[7] = q[k].w3;
        nn[8] = q[k + 1].n3;
        ww[8] = q[k + 1].w3;
        nn[9] = q[next].n3;
        ww[9] = q[next].w3;

        if age.format == GapFormat::Antiperiodic {
            if k == 0 {
                ww[0] = -ww[0];
                ww[5] = -ww[5];
            }
            if k + 1 == ne {
                ww[4] = -ww[4];
                ww[9] = -ww[9];
            }
        }

        (nn, ww)
    }

    /// Reconstruct the mid-gap field and project it onto harmonics for
    /// every air-gap element; called once at load
    pub(crate) fn compute_gap_harmonics(&mut self) {
        let incremental = self.is_incremental();
        let mut gaps = std::mem::take(&mut self.gaps);

        for age in &mut gaps {
            let ne = age.arc_elements;
            if ne == 0 {
                continue;
            }

            let r = age.mean_radius();
            let dr = age.ro - age.ri;
            let dt = (std::f64::consts::PI / 180.0) * age.total_arc_length / ne as f64;

            age.br = vec![Complex64::new(0.0, 0.0); ne];
            age.bt = vec![Complex64::new(0.0, 0.0); ne];
            if incremental {
                age.br_prev = vec![0.0; ne];
                age.bt_prev = vec![0.0; ne];
            }
            age.aco = Complex64::new(0.0, 0.0);

            let ci = age.inner_shift;
            let co = age.outer_shift;

            for k in 0..ne {
                let (nodes, weights) = Self::gap_pad_nodes(age, k);

                let mut a = [Complex64::new(0.0, 0.0); 10];
                for kk in 0..10 {
                    a[kk] = self.mesh_nodes[nodes[kk]].a * weights[kk];
                }

                if age.format == GapFormat::Periodic {
                    age.aco += pad_potential(&a, ci, co) / ne as f64;
                }

                let (br, bt) = pad_field(&a, ci, co, dt, r, dr);
                age.br[k] = br;
                age.bt[k] = bt;

                if incremental {
                    for kk in 0..10 {
                        a[kk] = Complex64::from(self.mesh_nodes[nodes[kk]].a_prev) * weights[kk];
                    }
                    let (br, bt) = pad_field(&a, ci, co, dt, r, dr);
                    age.br_prev[k] = br.re;
                    age.bt_prev[k] = bt.re;
                }
            }

            project_harmonics(age, incremental);
        }

        self.gaps = gaps;
    }

    fn gap_index(&self, name: &str) -> Result<usize, GapError> {
        self.gaps
            .iter()
            .position(|g| g.name == name)
            .ok_or(GapError::NameNotFound)
    }

    /// Names of the air-gap elements in this solution
    pub fn gap_names(&self) -> Vec<&str> {
        self.gaps.iter().map(|g| g.name.as_str()).collect()
    }

    /// DC torque carried across the gap
    pub fn gap_dc_torque(&self, name: &str) -> Result<f64, GapError> {
        let age = &self.gaps[self.gap_index(name)?];
        let r = age.mean_radius();

        let mut tq = 0.0;
        for k in 0..age.num_harmonics() {
            tq += (age.brc[k] * age.btc[k].conj() + age.brs[k] * age.bts[k].conj()).re;
        }
        tq *= std::f64::consts::PI * r * r * self.depth / MU0;
        if self.frequency != 0.0 {
            tq /= 2.0;
        }
        Ok(tq)
    }

    /// Double-frequency torque component (nonzero-frequency problems)
    pub fn gap_2x_torque(&self, name: &str) -> Result<Complex64, GapError> {
        let age = &self.gaps[self.gap_index(name)?];
        let r = age.mean_radius();

        let mut tq = Complex64::new(0.0, 0.0);
        if self.frequency != 0.0 {
            for k in 0..age.num_harmonics() {
                tq += age.brc[k] * age.btc[k] + age.brs[k] * age.bts[k];
            }
            tq *= std::f64::consts::PI * r * r * self.depth / (2.0 * MU0);
        }
        Ok(tq)
    }

    /// DC force on the rotor; defined for full-360-degree gaps only
    pub fn gap_dc_force(&self, name: &str) -> Result<(f64, f64), GapError> {
        let age = &self.gaps[self.gap_index(name)?];
        let r = age.mean_radius();

        let mut fx = 0.0;
        let mut fy = 0.0;
        if age.total_arc_length.round() == 360.0 {
            for k in 1..age.num_harmonics() {
                let dfx = (age.brs[k] + age.btc[k]) * (age.brs[k - 1] - age.btc[k - 1]).conj()
                    + (age.brs[k - 1] - age.btc[k - 1]) * (age.brs[k] + age.btc[k]).conj()
                    + (age.brc[k] - age.bts[k]) * (age.brc[k - 1] + age.bts[k - 1]).conj()
                    + (age.brc[k - 1] + age.bts[k - 1]) * (age.brc[k] - age.bts[k]).conj();

                let dfy = (-age.brc[k] + age.bts[k]) * (age.brs[k - 1] - age.btc[k - 1]).conj()
                    + (age.brc[k - 1] + age.bts[k - 1]) * (age.brs[k] + age.btc[k]).conj()
                    + (age.brs[k] + age.btc[k]) * (age.brc[k - 1] + age.bts[k - 1]).conj()
                    + (-age.brs[k - 1] + age.btc[k - 1]) * (age.brc[k] - age.bts[k]).conj();

                fx += dfx.re;
                fy += dfy.re;
            }
            let scale = self.depth * std::f64::consts::PI * r / (4.0 * MU0);
            fx *= scale;
            fy *= scale;
            if self.frequency != 0.0 {
                fx /= 2.0;
                fy /= 2.0;
            }
        }
        Ok((fx, fy))
    }

    /// Double-frequency force component (full-360-degree gaps, f != 0)
    pub fn gap_2x_force(&self, name: &str) -> Result<(Complex64, Complex64), GapError> {
        let age = &self.gaps[self.gap_index(name)?];
        let r = age.mean_radius();

        let mut fx = Complex64::new(0.0, 0.0);
        let mut fy = Complex64::new(0.0, 0.0);
        if age.total_arc_length.round() == 360.0 && self.frequency != 0.0 {
            for k in 1..age.num_harmonics() {
                fx += (age.brs[k - 1] - age.btc[k - 1]) * (age.brs[k] + age.btc[k])
                    + (age.brc[k - 1] + age.bts[k - 1]) * (age.brc[k] - age.bts[k]);

                fy += (age.brs[k] + age.btc[k]) * (age.brc[k - 1] + age.bts[k - 1])
                    - (age.brs[k - 1] - age.btc[k - 1]) * (age.brc[k] - age.bts[k]);
            }
            let scale = self.depth * std::f64::consts::PI * r / (4.0 * MU0);
            fx *= scale;
            fy *= scale;
        }
        Ok((fx, fy))
    }

    /// Incremental torque against the previous solution's gap field
    pub fn gap_incremental_torque(&self, name: &str) -> Result<Complex64, GapError> {
        let age = &self.gaps[self.gap_index(name)?];
        let r = age.mean_radius();

        let mut tq = Complex64::new(0.0, 0.0);
        for k in 0..age.num_harmonics() {
            tq += age.btc_prev[k] * age.brc[k]
                + age.brc_prev[k] * age.btc[k]
                + age.bts_prev[k] * age.brs[k]
                + age.brs_prev[k] * age.bts[k];
        }
        tq *= std::f64::consts::PI * r * r * self.depth / MU0;
        Ok(tq)
    }

    /// Incremental force against the previous solution's gap field
    /// (full-360-degree gaps, f != 0)
    pub fn gap_incremental_force(&self, name: &str) -> Result<(Complex64, Complex64), GapError> {
        let age = &self.gaps[self.gap_index(name)?];
        let r = age.mean_radius();

        let mut fx = Complex64::new(0.0, 0.0);
        let mut fy = Complex64::new(0.0, 0.0);
        if age.total_arc_length.round() == 360.0 && self.frequency != 0.0 {
            for k in 1..age.num_harmonics() {
                fx += (age.brs[k] + age.btc[k]) * (age.brs_prev[k - 1] - age.btc_prev[k - 1])
                    + (age.brs[k - 1] - age.btc[k - 1]) * (age.brs_prev[k] + age.btc_prev[k])
                    + (age.brc[k] - age.bts[k]) * (age.brc_prev[k - 1] + age.bts_prev[k - 1])
                    + (age.brc[k - 1] + age.bts[k - 1]) * (age.brc_prev[k] - age.bts_prev[k]);

                fy += (age.brs_prev[k] + age.btc_prev[k]) * (age.brc[k - 1] + age.bts[k - 1])
                    - (age.brs_prev[k - 1] - age.btc_prev[k - 1])
                        * (age.brc[k] - age.bts[k])
                    + (age.brs[k] + age.btc[k]) * (age.brc_prev[k - 1] + age.bts_prev[k - 1])
                    - (age.brs[k - 1] - age.btc[k - 1]) * (age.brc_prev[k] - age.bts_prev[k]);
            }
            let scale = self.depth * std::f64::consts::PI * r / (2.0 * MU0);
            fx *= scale;
            fy *= scale;
        }
        Ok((fx, fy))
    }

    /// Time-average magnetic energy stored in the gap
    pub fn gap_stored_energy(&self, name: &str) -> Result<f64, GapError> {
        let age = &self.gaps[self.gap_index(name)?];
        let r = age.mean_radius();

        let ri = age.ri / r;
        let ro = age.ro / r;
        let dr = r * (ro - ri);

        let mut w = Complex64::new(0.0, 0.0);
        for k in 0..age.num_harmonics() {
            if age.nh[k] != 0 {
                w += (age.brs[k] * age.brs[k]
                    + age.brc[k] * age.brc[k]
                    + age.bts[k] * age.bts[k]
                    + age.btc[k] * age.btc[k])
                    * dr;
            } else {
                w += 2.0 * dr * age.btc[k] * age.btc[k];
            }
        }
        let mut w = w.re * std::f64::consts::PI * r * self.depth / (2.0 * MU0);
        if self.frequency != 0.0 {
            w /= 2.0;
        }
        Ok(w)
    }

    /// Flux density in the gap at mechanical angle `angle` (degrees)
    pub fn gap_flux(&self, name: &str, angle: f64) -> Result<(Complex64, Complex64), GapError> {
        let age = &self.gaps[self.gap_index(name)?];

        let tta = angle * std::f64::consts::PI / 180.0;
        let mut br = Complex64::new(0.0, 0.0);
        let mut bt = Complex64::new(0.0, 0.0);
        for k in 0..age.num_harmonics() {
            let n = age.nh[k] as f64;
            br += age.brc[k] * (n * tta).cos() + age.brs[k] * (n * tta).sin();
            bt += age.btc[k] * (n * tta).cos() + age.bts[k] * (n * tta).sin();
        }
        Ok((br, bt))
    }

    /// Gap-centered potential at mechanical angle `angle` (degrees)
    pub fn gap_a(&self, name: &str, angle: f64) -> Result<Complex64, GapError> {
        let age = &self.gaps[self.gap_index(name)?];
        let r = age.mean_radius();

        let tta = angle * std::f64::consts::PI / 180.0;
        let mut ac = Complex64::new(0.0, 0.0);
        for k in 0..age.num_harmonics() {
            let n = age.nh[k] as f64;
            if age.nh[k] == 0 {
                ac += age.aco;
            } else {
                ac += (r / n) * (-age.brs[k] * (n * tta).cos() + age.brc[k] * (n * tta).sin());
            }
        }
        Ok(ac)
    }

    /// The highest harmonic order stored for a gap
    pub fn num_gap_harmonics(&self, name: &str) -> Result<i32, GapError> {
        let age = &self.gaps[self.gap_index(name)?];
        Ok(age.nh.last().copied().unwrap_or(0))
    }

    /// Amplitudes of the harmonic of order `n`, zeros when `n` matches no
    /// stored order
    pub fn gap_harmonics(&self, name: &str, n: i32) -> Result<GapHarmonic, GapError> {
        let age = &self.gaps[self.gap_index(name)?];

        if age.num_harmonics() == 0 {
            return Err(GapError::NoHarmonics);
        }
        if n < 0 {
            return Err(GapError::NegativeHarmonic);
        }
        if n > age.num_harmonics() as i32 {
            return Err(GapError::HarmonicTooLarge);
        }

        let mut out = GapHarmonic::default();
        if let Some(k) = age.nh.iter().position(|&order| order == n) {
            if n == 0 {
                out.acc = age.aco;
            } else {
                let r = age.mean_radius();
                out.acc = -(r / n as f64) * age.brs[k];
                out.acs = (r / n as f64) * age.brc[k];
                out.brc = age.brc[k];
                out.brs = age.brs[k];
                out.btc = age.btc[k];
                out.bts = age.bts[k];
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// A gap with a prescribed per-pad field, projected onto harmonics
    fn projected_gap(
        format: GapFormat,
        arc: f64,
        ne: usize,
        field: impl Fn(f64) -> (f64, f64),
    ) -> AirGapElement {
        let mut age = AirGapElement {
            name: String::from("gap"),
            format,
            ri: 1.0,
            ro: 2.0,
            total_arc_length: arc,
            arc_elements: ne,
            ..AirGapElement::default()
        };
        let dt = (std::f64::consts::PI / 180.0) * arc / ne as f64;
        for k in 0..ne {
            let tta = (k as f64 + 0.5) * dt;
            let (br, bt) = field(tta);
            age.br.push(Complex64::from(br));
            age.bt.push(Complex64::from(bt));
        }
        project_harmonics(&mut age, false);
        age
    }

    fn engine_with(age: AirGapElement) -> PostProcessor {
        let mut proc = PostProcessor::new();
        proc.depth = 1.0;
        proc.gaps.push(age);
        proc
    }

    #[test]
    fn test_periodic_harmonic_orders() {
        let age = projected_gap(GapFormat::Periodic, 360.0, 36, |t| (t.cos(), 0.0));
        assert_eq!(age.num_harmonics(), 19);
        assert_eq!(age.nh[0], 0);
        assert_eq!(age.nh[1], 1);
        assert_eq!(age.nh[18], 18);
    }

    #[test]
    fn test_pure_cosine_radial_field() {
        // B_r = cos(theta): everything lands in the first radial cosine bin
        let age = projected_gap(GapFormat::Periodic, 360.0, 36, |t| (t.cos(), 0.0));
        assert_relative_eq!(age.brc[1].re, 1.0, max_relative = 1e-12);
        for j in 0..age.num_harmonics() {
            if j != 1 {
                assert!(age.brc[j].norm() < 1e-12, "spurious brc at {}", j);
            }
            assert!(age.brs[j].norm() < 1e-12);
            assert!(age.btc[j].norm() < 1e-12);
            assert!(age.bts[j].norm() < 1e-12);
        }
    }

    #[test]
    fn test_reconstruction_matches_pads() {
        // summing the harmonics back up at the bin centers reproduces the
        // per-pad field to round-off
        let age = projected_gap(GapFormat::Periodic, 360.0, 36, |t| {
            ((t.cos() + 0.3 * (3.0 * t).sin()).abs(), 0.2 * (2.0 * t).cos())
        });
        let proc = engine_with(age);
        let age = &proc.gaps[0];
        let dt = (std::f64::consts::PI / 180.0) * 360.0 / 36.0;
        for k in 0..36 {
            let tta_deg = (k as f64 + 0.5) * dt * 180.0 / std::f64::consts::PI;
            let (br, bt) = proc.gap_flux("gap", tta_deg).unwrap();
            assert_relative_eq!(br.re, age.br[k].re, epsilon = 1e-10);
            assert_relative_eq!(bt.re, age.bt[k].re, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_dc_torque_and_stored_energy() {
        // B_r = cos(theta), B_t = 0: no torque, and the stored energy is
        // pi*R*Depth*dr/(2 mu0) for a unit first harmonic
        let age = projected_gap(GapFormat::Periodic, 360.0, 36, |t| (t.cos(), 0.0));
        let proc = engine_with(age);

        let tq = proc.gap_dc_torque("gap").unwrap();
        assert!(tq.abs() < 1e-9, "expected no torque, got {}", tq);

        let w = proc.gap_stored_energy("gap").unwrap();
        let expected = std::f64::consts::PI * 1.5 * 1.0 * 1.0 / (2.0 * MU0);
        assert_relative_eq!(w, expected, max_relative = 1e-9);
    }

    #[test]
    fn test_torque_from_crossed_harmonics() {
        // equal radial and tangential first harmonics give the classic
        // pi R^2 L Br Bt / mu0 torque
        let age = projected_gap(GapFormat::Periodic, 360.0, 36, |t| (t.cos(), t.cos()));
        let proc = engine_with(age);
        let tq = proc.gap_dc_torque("gap").unwrap();
        let expected = std::f64::consts::PI * 1.5 * 1.5 * 1.0 / MU0;
        assert_relative_eq!(tq, expected, max_relative = 1e-9);
    }

    #[test]
    fn test_antiperiodic_orders_and_first_harmonic() {
        // 180-degree antiperiodic gap: odd orders only, and a pure
        // fundamental shows up in the first bin
        let age = projected_gap(GapFormat::Antiperiodic, 180.0, 18, |t| (t.cos(), 0.0));
        assert_eq!(age.num_harmonics(), 9);
        assert_eq!(age.nh[0], 1);
        assert_eq!(age.nh[1], 3);
        assert_eq!(age.nh[8], 17);

        assert_relative_eq!(age.brc[0].re, 1.0, max_relative = 1e-12);
        for j in 1..age.num_harmonics() {
            assert!(age.brc[j].norm() < 1e-12, "spurious brc at {}", j);
        }
    }

    #[test]
    fn test_gap_errors() {
        let age = projected_gap(GapFormat::Periodic, 360.0, 36, |t| (t.cos(), 0.0));
        let proc = engine_with(age);

        assert_eq!(
            proc.gap_dc_torque("nope").unwrap_err(),
            GapError::NameNotFound
        );
        assert_eq!(
            proc.gap_harmonics("gap", -1).unwrap_err(),
            GapError::NegativeHarmonic
        );
        assert_eq!(
            proc.gap_harmonics("gap", 100).unwrap_err(),
            GapError::HarmonicTooLarge
        );
        let h = proc.gap_harmonics("gap", 1).unwrap();
        assert_relative_eq!(h.brc.re, 1.0, max_relative = 1e-12);
    }
}
