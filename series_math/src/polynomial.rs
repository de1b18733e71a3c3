//! Lag-polynomial algebra
//!
//! Polynomials in the backshift operator `B` are stored as coefficient
//! vectors where index `k` holds the coefficient of `B^k`.

/// Multiply two lag polynomials
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let mut product = vec![0.0; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        if ai == 0.0 {
            continue;
        }
        for (j, &bj) in b.iter().enumerate() {
            product[i + j] += ai * bj;
        }
    }
    product
}

/// Build `1 + sign * (c_1 B^step + c_2 B^(2 step) + ...)`
fn lag_polynomial(coefficients: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * step + 1];
    poly[0] = 1.0;
    for (i, &c) in coefficients.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

/// Autoregressive operator `phi(B) * Phi(B^s)`
///
/// Both factors use the sign convention `1 - c_1 B - c_2 B^2 - ...`.
pub fn ar_polynomial(phi: &[f64], seasonal_phi: &[f64], period: usize) -> Vec<f64> {
    multiply(
        &lag_polynomial(phi, 1, -1.0),
        &lag_polynomial(seasonal_phi, period.max(1), -1.0),
    )
}

/// Moving-average operator `theta(B) * Theta(B^s)`
///
/// Both factors use the sign convention `1 + c_1 B + c_2 B^2 + ...`.
pub fn ma_polynomial(theta: &[f64], seasonal_theta: &[f64], period: usize) -> Vec<f64> {
    multiply(
        &lag_polynomial(theta, 1, 1.0),
        &lag_polynomial(seasonal_theta, period.max(1), 1.0),
    )
}

/// Differencing operator `(1 - B)^d (1 - B^s)^D`
pub fn difference_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = multiply(&poly, &[1.0, -1.0]);
    }
    let period = period.max(1);
    for _ in 0..seasonal_d {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        poly = multiply(&poly, &seasonal);
    }
    poly
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiply() {
        // (1 - B)(1 + B) = 1 - B^2
        assert_eq!(multiply(&[1.0, -1.0], &[1.0, 1.0]), vec![1.0, 0.0, -1.0]);
        assert!(multiply(&[], &[1.0]).is_empty());
    }

    #[test]
    fn test_ar_polynomial_is_multiplicative() {
        let poly = ar_polynomial(&[0.5], &[0.2], 4);
        // (1 - 0.5B)(1 - 0.2B^4) = 1 - 0.5B - 0.2B^4 + 0.1B^5
        assert_eq!(poly.len(), 6);
        assert_eq!(poly[0], 1.0);
        assert_eq!(poly[1], -0.5);
        assert_eq!(poly[4], -0.2);
        assert!((poly[5] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_ma_polynomial_sign() {
        let poly = ma_polynomial(&[0.3], &[], 12);
        assert_eq!(poly, vec![1.0, 0.3]);
    }

    #[test]
    fn test_difference_polynomial() {
        assert_eq!(difference_polynomial(0, 0, 12), vec![1.0]);
        assert_eq!(difference_polynomial(2, 0, 12), vec![1.0, -2.0, 1.0]);

        let poly = difference_polynomial(1, 1, 3);
        // (1 - B)(1 - B^3) = 1 - B - B^3 + B^4
        assert_eq!(poly, vec![1.0, -1.0, 0.0, -1.0, 1.0]);
    }
}
