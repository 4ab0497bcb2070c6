//! Partial-autocorrelation parametrisation of stationary polynomials.
//!
//! ```text
//! alpha_k  --tanh-->  r_k in (-1, 1)  --Levinson-Durbin-->  phi
//! ```
//!
//! Every real vector `alpha` maps to a stationary AR (or invertible MA)
//! polynomial, so an unconstrained optimiser never leaves the admissible
//! region.

/// Largest partial autocorrelation kept by [`coeffs_to_unconstrained`].
const MAX_PACF: f64 = 1.0 - 1e-12;

/// Maps unconstrained parameters to stationary coefficients
/// (Jones 1980, Monahan 1984).
pub fn unconstrained_to_coeffs(alpha: &[f64]) -> Vec<f64> {
    let p = alpha.len();
    if p == 0 {
        return Vec::new();
    }

    let r: Vec<f64> = alpha.iter().map(|a| a.tanh()).collect();

    let mut phi = vec![0.0; p];
    let mut prev = vec![0.0; p];
    phi[0] = r[0];
    for k in 1..p {
        prev.copy_from_slice(&phi);
        phi[k] = r[k];
        for j in 0..k {
            phi[j] = prev[j] - r[k] * prev[k - 1 - j];
        }
    }
    phi
}

/// Inverse of [`unconstrained_to_coeffs`].
///
/// Runs the Levinson-Durbin recursion backwards to recover the partial
/// autocorrelations, then applies `atanh`. Partial autocorrelations on or
/// outside the unit circle are clamped to `±(1 - 1e-12)`, so the result is
/// always finite.
pub fn coeffs_to_unconstrained(phi: &[f64]) -> Vec<f64> {
    let p = phi.len();
    let mut r = vec![0.0; p];
    let mut cur = phi.to_vec();
    for k in (0..p).rev() {
        let rk = cur[k].clamp(-MAX_PACF, MAX_PACF);
        r[k] = rk;
        let denom = 1.0 - rk * rk;
        let next: Vec<f64> = (0..k)
            .map(|j| (cur[j] + rk * cur[k - 1 - j]) / denom)
            .collect();
        cur[..k].copy_from_slice(&next);
    }
    r.iter().map(|x| x.atanh()).collect()
}

/// `true` when every root of `1 - phi_1 z - ... - phi_p z^p` lies outside
/// the unit circle.
pub fn is_stationary(phi: &[f64]) -> bool {
    let p = phi.len();
    let mut cur = phi.to_vec();
    for k in (0..p).rev() {
        let rk = cur[k];
        if !rk.is_finite() || rk.abs() >= 1.0 {
            return false;
        }
        let denom = 1.0 - rk * rk;
        let next: Vec<f64> = (0..k)
            .map(|j| (cur[j] + rk * cur[k - 1 - j]) / denom)
            .collect();
        cur[..k].copy_from_slice(&next);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn empty_input() {
        assert!(unconstrained_to_coeffs(&[]).is_empty());
        assert!(coeffs_to_unconstrained(&[]).is_empty());
        assert!(is_stationary(&[]));
    }

    #[test]
    fn single_coefficient_is_tanh() {
        let phi = unconstrained_to_coeffs(&[0.7]);
        assert_abs_diff_eq!(phi[0], 0.7_f64.tanh(), epsilon = 1e-15);
    }

    #[test]
    fn two_coefficients() {
        let result = unconstrained_to_coeffs(&[0.5, 0.3]);
        let expected_0 = 0.5_f64.tanh() - 0.3_f64.tanh() * 0.5_f64.tanh();
        assert_abs_diff_eq!(result[0], expected_0, epsilon = 1e-12);
        assert_abs_diff_eq!(result[1], 0.3_f64.tanh(), epsilon = 1e-12);
    }

    #[test]
    fn inverse_recovers_parameters() {
        let cases: &[&[f64]] = &[&[0.4], &[1.0, -2.0, 3.0], &[-0.3, 0.2], &[0.1, 0.2, -0.5, 0.9]];
        for alpha in cases {
            let phi = unconstrained_to_coeffs(alpha);
            let back = coeffs_to_unconstrained(&phi);
            assert_eq!(back.len(), alpha.len());
            for (a, b) in alpha.iter().zip(&back) {
                assert_abs_diff_eq!(*a, *b, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn stationarity_guarantee() {
        let cases: &[&[f64]] = &[&[1.0, -2.0, 3.0], &[0.5], &[-3.0, 2.0], &[5.0, 5.0]];
        for alpha in cases {
            assert!(is_stationary(&unconstrained_to_coeffs(alpha)), "alpha={alpha:?}");
        }
    }

    #[test]
    fn detects_non_stationary() {
        assert!(!is_stationary(&[1.0]));
        assert!(!is_stationary(&[-1.2]));
        // 1 - 0.5z - 0.6z^2 has a root inside the unit circle.
        assert!(!is_stationary(&[0.5, 0.6]));
        assert!(is_stationary(&[0.5, -0.3]));
    }

    #[test]
    fn clamps_unit_root() {
        let alpha = coeffs_to_unconstrained(&[1.0]);
        assert!(alpha[0].is_finite());
        assert!(alpha[0] > 10.0);
    }
}
