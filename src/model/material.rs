//! Material properties and the B-H kernel
//!
//! Covers linear anisotropic materials, frequency-dependent laminated
//! stacks, and nonlinear isotropic materials described by a B-H table.
//! The nonlinear curve is interpolated with monotone cubic Hermite
//! segments; at nonzero frequency the table is first replaced by an
//! effective-amplitude curve (fundamental-harmonic response to sinusoidal
//! drive) and the hysteresis lag angle is folded into a complex phase, so
//! hysteresis losses appear in `Im(mu)` the same way they do for linear
//! laminated materials.

use crate::units::MU0;
use num_complex::Complex64;

/// Lamination / winding construction of a material (file codes 0-6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LamType {
    /// Not laminated, or laminated in plane
    #[default]
    Plain,
    /// Laminated parallel to x (r)
    ParallelX,
    /// Laminated parallel to y (z)
    ParallelY,
    /// Round magnet wire
    MagnetWire,
    /// Stranded (non-litz) wire bundle
    Stranded,
    /// Litz wire
    Litz,
    /// Rectangular / foil conductor
    RectFoil,
}

impl LamType {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => LamType::ParallelX,
            2 => LamType::ParallelY,
            3 => LamType::MagnetWire,
            4 => LamType::Stranded,
            5 => LamType::Litz,
            6 => LamType::RectFoil,
            _ => LamType::Plain,
        }
    }

    /// Wound regions are subject to skin and proximity effects and use the
    /// homogenized block-label properties instead of the raw material.
    #[inline]
    pub fn is_wound(self) -> bool {
        matches!(
            self,
            LamType::MagnetWire | LamType::Stranded | LamType::Litz | LamType::RectFoil
        )
    }
}

/// A block property (material) as read from the solution file
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    /// Relative permeability along x (r)
    pub mu_x: f64,
    /// Relative permeability along y (z)
    pub mu_y: f64,
    /// Permanent-magnet coercivity, A/m
    pub h_c: f64,
    /// Applied source current density, MA/m^2
    pub j: Complex64,
    /// Conductivity, MS/m
    pub cduct: f64,
    /// Lamination thickness, mm
    pub lam_d: f64,
    /// Hysteresis lag angles, degrees
    pub theta_hn: f64,
    pub theta_hx: f64,
    pub theta_hy: f64,
    pub n_strands: i32,
    /// Wire diameter, mm
    pub wire_d: f64,
    pub lam_fill: f64,
    pub lam_type: LamType,
    /// Raw B-H table as loaded (H real)
    pub b_data: Vec<f64>,
    pub h_data: Vec<f64>,
    /// Interpolation table currently in force (effective curve at AC)
    bh_b: Vec<f64>,
    bh_h: Vec<f64>,
    bh_slope: Vec<f64>,
    bh_energy: Vec<f64>,
    /// Hysteresis phase factor applied to interpolated H (1 at DC)
    bh_phase: Complex64,
    /// Maximum relative permeability of the AC effective curve; doubles as
    /// the incremental-problem marker (0 when not incremental)
    pub mu_max: f64,
    /// Co-energy of a nonlinear PM at its coercivity (stored-energy shift)
    pub nrg: f64,
    /// Frequency-dependent permeabilities for linear/laminated materials
    pub mu_fdx: Complex64,
    pub mu_fdy: Complex64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::from("New Material"),
            mu_x: 1.0,
            mu_y: 1.0,
            h_c: 0.0,
            j: Complex64::new(0.0, 0.0),
            cduct: 0.0,
            lam_d: 0.0,
            theta_hn: 0.0,
            theta_hx: 0.0,
            theta_hy: 0.0,
            n_strands: 0,
            wire_d: 0.0,
            lam_fill: 1.0,
            lam_type: LamType::Plain,
            b_data: Vec::new(),
            h_data: Vec::new(),
            bh_b: Vec::new(),
            bh_h: Vec::new(),
            bh_slope: Vec::new(),
            bh_energy: Vec::new(),
            bh_phase: Complex64::new(1.0, 0.0),
            mu_max: 0.0,
            nrg: 0.0,
            mu_fdx: Complex64::new(1.0, 0.0),
            mu_fdy: Complex64::new(1.0, 0.0),
        }
    }
}

/// Monotone (Fritsch-Carlson limited) Hermite slopes for tabulated data
fn monotone_slopes(b: &[f64], h: &[f64]) -> Vec<f64> {
    let n = b.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let mut d = vec![0.0; n - 1];
    for k in 0..n - 1 {
        d[k] = (h[k + 1] - h[k]) / (b[k + 1] - b[k]);
    }
    let mut m = vec![0.0; n];
    m[0] = d[0];
    m[n - 1] = d[n - 2];
    for k in 1..n - 1 {
        m[k] = if d[k - 1] * d[k] <= 0.0 {
            0.0
        } else {
            0.5 * (d[k - 1] + d[k])
        };
    }
    for k in 0..n - 1 {
        if d[k] == 0.0 {
            m[k] = 0.0;
            m[k + 1] = 0.0;
        } else {
            let alpha = m[k] / d[k];
            let beta = m[k + 1] / d[k];
            let s = alpha * alpha + beta * beta;
            if s > 9.0 {
                let t = 3.0 / s.sqrt();
                m[k] = t * alpha * d[k];
                m[k + 1] = t * beta * d[k];
            }
        }
    }
    m
}

impl Material {
    /// Number of B-H points loaded from the file
    #[inline]
    pub fn bh_points(&self) -> usize {
        self.b_data.len()
    }

    #[inline]
    pub fn is_nonlinear(&self) -> bool {
        !self.b_data.is_empty()
    }

    /// Build the interpolation tables for the given angular frequency.
    ///
    /// At `omega != 0` the raw curve is replaced by the effective-amplitude
    /// curve for sinusoidal drive and `mu_max` records the curve's largest
    /// relative permeability; at `omega == 0` the raw curve is used and
    /// `mu_max` is left untouched (the loader manages it as the
    /// incremental-problem marker).
    pub fn get_slopes(&mut self, omega: f64) {
        if self.b_data.is_empty() {
            return;
        }

        // working copy, with an origin point so interpolation and energy
        // integrals start at B = 0
        let mut b: Vec<f64> = Vec::with_capacity(self.b_data.len() + 1);
        let mut h: Vec<f64> = Vec::with_capacity(self.h_data.len() + 1);
        if self.b_data[0] > 0.0 {
            b.push(0.0);
            h.push(0.0);
        }
        b.extend_from_slice(&self.b_data);
        h.extend_from_slice(&self.h_data);

        self.bh_phase = Complex64::new(1.0, 0.0);

        if omega != 0.0 {
            // Effective curve: for each table amplitude, the fundamental
            // H amplitude when B(t) = B_k sin(wt), from the DC interpolant.
            let m_dc = monotone_slopes(&b, &h);
            let dc_b = b.clone();
            let dc_h = h.clone();
            let eval_dc = |x: f64| hermite_eval(&dc_b, &dc_h, &m_dc, x);

            const NSAMP: usize = 256;
            let mut mumax = 0.0_f64;
            for k in 1..b.len() {
                let amp = b[k];
                let mut h1 = 0.0;
                for s in 0..NSAMP {
                    let tta = (s as f64 + 0.5) * std::f64::consts::FRAC_PI_2 / NSAMP as f64;
                    h1 += eval_dc(amp * tta.sin()) * tta.sin();
                }
                h1 *= 4.0 / std::f64::consts::PI * std::f64::consts::FRAC_PI_2 / NSAMP as f64;
                h[k] = h1;
                if h1 > 0.0 {
                    mumax = mumax.max(amp / (MU0 * h1));
                }
            }
            self.mu_max = mumax;
            self.bh_phase = Complex64::from_polar(1.0, self.theta_hn * std::f64::consts::PI / 180.0);
        }

        let m = monotone_slopes(&b, &h);

        // cumulative int H dB at the table points
        let mut w = vec![0.0; b.len()];
        for k in 0..b.len() - 1 {
            let db = b[k + 1] - b[k];
            w[k + 1] = w[k] + db * (h[k] + h[k + 1]) / 2.0 + db * db * (m[k] - m[k + 1]) / 12.0;
        }

        self.bh_b = b;
        self.bh_h = h;
        self.bh_slope = m;
        self.bh_energy = w;

        // initial-permeability estimate off the first table point
        if self.bh_b.len() > 1 {
            let k = 1;
            if self.bh_h[k] != 0.0 {
                self.mu_x = self.bh_b[k] / (MU0 * self.bh_h[k].abs());
                self.mu_y = self.mu_x;
            }
        }
    }

    /// Drop the interpolation tables (between the two slope passes of an
    /// incremental load)
    pub fn clear_slopes(&mut self) {
        self.bh_b.clear();
        self.bh_h.clear();
        self.bh_slope.clear();
        self.bh_energy.clear();
        self.bh_phase = Complex64::new(1.0, 0.0);
    }

    /// Interpolated H magnitude at flux density `b` (table curve)
    pub fn get_h(&self, b: f64) -> f64 {
        hermite_eval(&self.bh_b, &self.bh_h, &self.bh_slope, b)
    }

    /// Interpolated dH/dB at flux density `b`
    pub fn get_dhdb(&self, b: f64) -> f64 {
        hermite_deriv(&self.bh_b, &self.bh_h, &self.bh_slope, b)
    }

    /// Inverse lookup: flux density at field strength `h`
    pub fn get_b(&self, h: f64) -> f64 {
        let n = self.bh_b.len();
        if n < 2 || h <= 0.0 {
            return 0.0;
        }
        let h_last = self.bh_h[n - 1];
        if h >= h_last {
            let m = self.bh_slope[n - 1].max(1e-12);
            return self.bh_b[n - 1] + (h - h_last) / m;
        }
        // the curve is monotone, so bisection on get_h converges
        let (mut lo, mut hi) = (0.0, self.bh_b[n - 1]);
        for _ in 0..64 {
            let mid = 0.5 * (lo + hi);
            if self.get_h(mid) < h {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        0.5 * (lo + hi)
    }

    /// Stored energy density int_0^b H dB
    pub fn get_energy(&self, b: f64) -> f64 {
        let n = self.bh_b.len();
        if n < 2 {
            return 0.0;
        }
        let b = b.abs();
        let last = self.bh_b[n - 1];
        if b >= last {
            let db = b - last;
            return self.bh_energy[n - 1]
                + self.bh_h[n - 1] * db
                + 0.5 * self.bh_slope[n - 1] * db * db;
        }
        let k = segment_of(&self.bh_b, b);
        let db = self.bh_b[k + 1] - self.bh_b[k];
        let t = (b - self.bh_b[k]) / db;
        let (t2, t3, t4) = (t * t, t * t * t, t * t * t * t);
        // antiderivatives of the Hermite basis on [0, t]
        let i00 = 0.5 * t4 - t3 + t;
        let i10 = 0.25 * t4 - 2.0 * t3 / 3.0 + 0.5 * t2;
        let i01 = -0.5 * t4 + t3;
        let i11 = 0.25 * t4 - t3 / 3.0;
        self.bh_energy[k]
            + db * (i00 * self.bh_h[k]
                + i10 * db * self.bh_slope[k]
                + i01 * self.bh_h[k + 1]
                + i11 * db * self.bh_slope[k + 1])
    }

    /// Co-energy density B*H - int H dB
    pub fn get_coenergy(&self, b: f64) -> f64 {
        b.abs() * self.get_h(b.abs()) - self.get_energy(b)
    }

    /// DC permeability at a real flux density.
    ///
    /// For nonlinear materials with the incremental marker set, the first
    /// value is the incremental permeability `1/(mu0 dH/dB)` and the second
    /// the apparent permeability `B/(mu0 H)`; otherwise both are the
    /// apparent permeability (or the axis values for linear materials).
    pub fn get_mu_dc(&self, b1: f64, b2: f64) -> (f64, f64) {
        if !self.is_nonlinear() {
            return (self.mu_x, self.mu_y);
        }
        let b = (b1 * b1 + b2 * b2).sqrt();
        if b < 1.0e-9 {
            let m0 = self.bh_slope.first().copied().unwrap_or(0.0);
            let mu = if m0 > 0.0 { 1.0 / (MU0 * m0) } else { 1.0 };
            return (mu, mu);
        }
        let apparent = b / (MU0 * self.get_h(b));
        if self.mu_max > 0.0 {
            let m = self.get_dhdb(b);
            let inc = if m > 0.0 { 1.0 / (MU0 * m) } else { apparent };
            (inc, apparent)
        } else {
            (apparent, apparent)
        }
    }

    /// AC permeability at a complex flux density
    pub fn get_mu_ac(&self, b1: Complex64, b2: Complex64) -> (Complex64, Complex64) {
        if !self.is_nonlinear() {
            return (self.mu_fdx, self.mu_fdy);
        }
        let b = (b1.norm_sqr() + b2.norm_sqr()).sqrt();
        let mu = if b < 1.0e-9 {
            let m0 = self.bh_slope.first().copied().unwrap_or(0.0);
            if m0 > 0.0 {
                1.0 / (MU0 * m0)
            } else {
                1.0
            }
        } else {
            b / (MU0 * self.get_h(b))
        };
        // hysteresis lag rotates mu clockwise, matching the laminated form
        let mu_c = mu * self.bh_phase.conj();
        (mu_c, mu_c)
    }

    /// DC energy density at a real flux density
    pub fn do_energy_dc(&self, b1: f64, b2: f64) -> f64 {
        if self.is_nonlinear() {
            self.get_energy((b1 * b1 + b2 * b2).sqrt())
        } else {
            (b1 * b1 / self.mu_x + b2 * b2 / self.mu_y) / (2.0 * MU0)
        }
    }

    /// DC co-energy density at a real flux density
    pub fn do_coenergy_dc(&self, b1: f64, b2: f64) -> f64 {
        if self.is_nonlinear() {
            self.get_coenergy((b1 * b1 + b2 * b2).sqrt())
        } else {
            self.do_energy_dc(b1, b2)
        }
    }

    /// Time-average energy density at a complex flux density
    pub fn do_energy_ac(&self, b1: Complex64, b2: Complex64) -> f64 {
        let (mu1, mu2) = self.get_mu_ac(b1, b2);
        (b1.norm_sqr() * (1.0 / mu1).re + b2.norm_sqr() * (1.0 / mu2).re) / (4.0 * MU0)
    }

    /// Time-average co-energy density at a complex flux density
    pub fn do_coenergy_ac(&self, b1: Complex64, b2: Complex64) -> f64 {
        self.do_energy_ac(b1, b2)
    }

    /// Frequency-dependent permeabilities for linear (possibly laminated)
    /// materials, computed once after load
    pub fn compute_fd_permeability(&mut self, frequency: f64) {
        if self.lam_type != LamType::Plain {
            return;
        }
        let deg45 = Complex64::new(1.0, 1.0);
        let w = 2.0 * std::f64::consts::PI * frequency;
        let pi = std::f64::consts::PI;

        self.mu_fdx = self.mu_x * Complex64::from_polar(1.0, -self.theta_hx * pi / 180.0);
        self.mu_fdy = self.mu_y * Complex64::from_polar(1.0, -self.theta_hy * pi / 180.0);

        if self.lam_d != 0.0 {
            let halflag = Complex64::from_polar(1.0, -self.theta_hx * pi / 360.0);
            let ds = (2.0 / (0.4 * pi * w * self.cduct * self.mu_x)).sqrt();
            let k = halflag * deg45 * self.lam_d * 0.001 / (2.0 * ds);
            if self.cduct != 0.0 {
                self.mu_fdx =
                    (self.mu_fdx * k.tanh() / k) * self.lam_fill + (1.0 - self.lam_fill);
            } else {
                self.mu_fdx = self.mu_fdx * self.lam_fill + (1.0 - self.lam_fill);
            }

            let halflag = Complex64::from_polar(1.0, -self.theta_hy * pi / 360.0);
            let ds = (2.0 / (0.4 * pi * w * self.cduct * self.mu_y)).sqrt();
            let k = halflag * deg45 * self.lam_d * 0.001 / (2.0 * ds);
            if self.cduct != 0.0 {
                self.mu_fdy =
                    (self.mu_fdy * k.tanh() / k) * self.lam_fill + (1.0 - self.lam_fill);
            } else {
                self.mu_fdy = self.mu_fdy * self.lam_fill + (1.0 - self.lam_fill);
            }
        }
    }
}

fn segment_of(b: &[f64], x: f64) -> usize {
    // index k with b[k] <= x < b[k+1]; callers guarantee x within range
    match b.binary_search_by(|v| v.total_cmp(&x)) {
        Ok(k) => k.min(b.len() - 2),
        Err(k) => k.saturating_sub(1).min(b.len() - 2),
    }
}

fn hermite_eval(b: &[f64], h: &[f64], m: &[f64], x: f64) -> f64 {
    let n = b.len();
    if n < 2 {
        return 0.0;
    }
    let x = x.abs();
    if x >= b[n - 1] {
        return h[n - 1] + m[n - 1] * (x - b[n - 1]);
    }
    let k = segment_of(b, x);
    let db = b[k + 1] - b[k];
    let t = (x - b[k]) / db;
    let (t2, t3) = (t * t, t * t * t);
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    h00 * h[k] + h10 * db * m[k] + h01 * h[k + 1] + h11 * db * m[k + 1]
}

fn hermite_deriv(b: &[f64], h: &[f64], m: &[f64], x: f64) -> f64 {
    let n = b.len();
    if n < 2 {
        return 0.0;
    }
    let x = x.abs();
    if x >= b[n - 1] {
        return m[n - 1];
    }
    let k = segment_of(b, x);
    let db = b[k + 1] - b[k];
    let t = (x - b[k]) / db;
    let t2 = t * t;
    let d00 = (6.0 * t2 - 6.0 * t) / db;
    let d10 = 3.0 * t2 - 4.0 * t + 1.0;
    let d01 = (-6.0 * t2 + 6.0 * t) / db;
    let d11 = 3.0 * t2 - 2.0 * t;
    d00 * h[k] + d10 * m[k] + d01 * h[k + 1] + d11 * m[k + 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn linear_table() -> Material {
        // H = B / (1000 mu0), a linear "nonlinear" material
        let mut mat = Material::default();
        let mu = 1000.0 * MU0;
        mat.b_data = vec![0.0, 0.5, 1.0, 1.5, 2.0];
        mat.h_data = mat.b_data.iter().map(|b| b / mu).collect();
        mat.get_slopes(0.0);
        mat
    }

    #[test]
    fn test_linear_table_roundtrip() {
        let mat = linear_table();
        let mu = 1000.0 * MU0;
        assert_relative_eq!(mat.get_h(0.75), 0.75 / mu, max_relative = 1e-9);
        assert_relative_eq!(mat.get_b(0.75 / mu), 0.75, max_relative = 1e-6);
        // extrapolation past the last point stays linear
        assert_relative_eq!(mat.get_h(3.0), 3.0 / mu, max_relative = 1e-9);
    }

    #[test]
    fn test_linear_table_energy() {
        let mat = linear_table();
        let mu = 1000.0 * MU0;
        // int H dB = B^2/(2 mu)
        assert_relative_eq!(mat.get_energy(1.2), 1.2 * 1.2 / (2.0 * mu), max_relative = 1e-9);
        assert_relative_eq!(
            mat.get_coenergy(1.2),
            1.2 * 1.2 / (2.0 * mu),
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_apparent_mu() {
        let mat = linear_table();
        let (mu1, mu2) = mat.get_mu_dc(0.6, 0.8);
        assert_relative_eq!(mu1, 1000.0, max_relative = 1e-9);
        assert_relative_eq!(mu2, 1000.0, max_relative = 1e-9);
        // zero-B fallback uses the initial slope
        let (mu1, _) = mat.get_mu_dc(0.0, 0.0);
        assert_relative_eq!(mu1, 1000.0, max_relative = 1e-6);
    }

    #[test]
    fn test_incremental_marker() {
        // saturating curve: slopes fall with B, so incremental < apparent
        let mut mat = Material::default();
        mat.b_data = vec![0.0, 1.0, 1.5, 1.8, 2.0];
        mat.h_data = vec![0.0, 100.0, 1000.0, 10000.0, 100000.0];
        mat.get_slopes(0.0);
        mat.mu_max = 1.0;
        let (inc, app) = mat.get_mu_dc(1.8, 0.0);
        assert!(inc < app);
    }

    #[test]
    fn test_monotone_interpolation() {
        let mut mat = Material::default();
        mat.b_data = vec![0.0, 1.0, 1.1, 2.0];
        mat.h_data = vec![0.0, 10.0, 2000.0, 2100.0];
        mat.get_slopes(0.0);
        // monotonicity across the sharp knee
        let mut prev = 0.0;
        for i in 0..200 {
            let b = i as f64 * 0.01;
            let h = mat.get_h(b);
            assert!(h >= prev - 1e-9, "H not monotone at B={}", b);
            prev = h;
        }
    }

    #[test]
    fn test_effective_curve_softens() {
        // sinusoidal averaging through a saturating curve lowers the
        // effective H at high amplitude relative to the DC curve
        let mut dc = Material::default();
        dc.b_data = vec![0.0, 1.0, 1.5, 1.8, 2.0];
        dc.h_data = vec![0.0, 100.0, 1000.0, 10000.0, 100000.0];
        let mut ac = dc.clone();
        dc.get_slopes(0.0);
        ac.get_slopes(2.0 * std::f64::consts::PI * 50.0);
        assert!(ac.get_h(2.0) < dc.get_h(2.0));
        assert!(ac.mu_max > 0.0);
    }

    #[test]
    fn test_laminated_mu_zero_sigma() {
        let mut mat = Material {
            mu_x: 1000.0,
            mu_y: 1000.0,
            lam_d: 0.5,
            lam_fill: 0.9,
            cduct: 0.0,
            ..Material::default()
        };
        mat.compute_fd_permeability(50.0);
        // sigma = 0 skips the skin-effect rolloff, only fill mixing applies
        assert_relative_eq!(mat.mu_fdx.re, 1000.0 * 0.9 + 0.1, max_relative = 1e-12);
        assert_relative_eq!(mat.mu_fdx.im, 0.0);
    }

    #[test]
    fn test_laminated_mu_rolloff() {
        let mut mat = Material {
            mu_x: 1000.0,
            mu_y: 1000.0,
            lam_d: 0.5,
            lam_fill: 1.0,
            cduct: 10.0,
            ..Material::default()
        };
        mat.compute_fd_permeability(10000.0);
        // eddy shielding reduces the effective permeability magnitude
        assert!(mat.mu_fdx.norm() < 1000.0);
        assert!(mat.mu_fdx.im < 0.0);
    }
}
