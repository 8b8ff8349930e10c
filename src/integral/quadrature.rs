//! Closed-form triangle quadrature for products of linear fields
//!
//! Both rules integrate `u*v` exactly when `u` and `v` vary linearly over
//! the triangle, given their vertex values. The axisymmetric rule also
//! weights by the linearly-varying radius, folding the 2*pi*r volume
//! factor into the moment matrix.

use num_complex::Complex64;

/// Planar integral of u*v over a triangle of area `a`:
/// `(a/12) * sum_i v_i (2 u_i + u_{i+1} + u_{i+2})`
pub fn pln_int(a: f64, u: &[Complex64; 3], v: &[Complex64; 3]) -> Complex64 {
    let z = [
        2.0 * u[0] + u[1] + u[2],
        u[0] + 2.0 * u[1] + u[2],
        u[0] + u[1] + 2.0 * u[2],
    ];
    let mut x = Complex64::new(0.0, 0.0);
    for i in 0..3 {
        x += v[i] * z[i];
    }
    a * x / 12.0
}

/// Axisymmetric integral of 2*pi*r*u*v over a triangle of area `a` with
/// vertex radii `r` (meters)
pub fn axi_int(a: f64, u: &[Complex64; 3], v: &[Complex64; 3], r: &[f64; 3]) -> Complex64 {
    let m = [
        [
            6.0 * r[0] + 2.0 * r[1] + 2.0 * r[2],
            2.0 * r[0] + 2.0 * r[1] + r[2],
            2.0 * r[0] + r[1] + 2.0 * r[2],
        ],
        [
            2.0 * r[0] + 2.0 * r[1] + r[2],
            2.0 * r[0] + 6.0 * r[1] + 2.0 * r[2],
            r[0] + 2.0 * r[1] + 2.0 * r[2],
        ],
        [
            2.0 * r[0] + r[1] + 2.0 * r[2],
            r[0] + 2.0 * r[1] + 2.0 * r[2],
            2.0 * r[0] + 2.0 * r[1] + 6.0 * r[2],
        ],
    ];

    let mut x = Complex64::new(0.0, 0.0);
    for i in 0..3 {
        let z = m[i][0] * u[0] + m[i][1] * u[1] + m[i][2] * u[2];
        x += v[i] * z;
    }
    std::f64::consts::PI * a * x / 30.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn c(x: f64) -> Complex64 {
        Complex64::new(x, 0.0)
    }

    #[test]
    fn test_pln_constant() {
        // u = v = 1 integrates to the area
        let one = [c(1.0); 3];
        assert_relative_eq!(pln_int(0.5, &one, &one).re, 0.5, max_relative = 1e-14);
    }

    #[test]
    fn test_pln_linear_product() {
        // on the unit triangle with u = v = barycentric N_0:
        // int N0^2 dA = A/6
        let n0 = [c(1.0), c(0.0), c(0.0)];
        assert_relative_eq!(
            pln_int(0.5, &n0, &n0).re,
            0.5 / 6.0,
            max_relative = 1e-14
        );
        // int N0*N1 dA = A/12
        let n1 = [c(0.0), c(1.0), c(0.0)];
        assert_relative_eq!(
            pln_int(0.5, &n0, &n1).re,
            0.5 / 12.0,
            max_relative = 1e-14
        );
    }

    #[test]
    fn test_axi_constant_ring() {
        // u = v = 1 over a triangle at constant radius integrates to
        // 2*pi*R*A; exercised with an (almost) constant-radius triangle
        let one = [c(1.0); 3];
        let r = [2.0, 2.0, 2.0];
        let v = axi_int(0.5, &one, &one, &r);
        assert_relative_eq!(
            v.re,
            2.0 * std::f64::consts::PI * 2.0 * 0.5,
            max_relative = 1e-14
        );
    }

    #[test]
    fn test_axi_linear_radius() {
        // with u = v = 1 the rule reduces to 2*pi*Rbar*A for linear r
        let one = [c(1.0); 3];
        let r = [1.0, 2.0, 3.0];
        let v = axi_int(1.0, &one, &one, &r);
        assert_relative_eq!(
            v.re,
            2.0 * std::f64::consts::PI * 2.0,
            max_relative = 1e-14
        );
    }
}
