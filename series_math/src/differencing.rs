//! Differencing and integration of series through a lag polynomial

use crate::{MathError, Result};

/// Apply a lag polynomial to a series
///
/// Returns `w_t = sum_k poly[k] * x[t - k]` for every `t` with a full history,
/// so the output is `poly.len() - 1` values shorter than the input.
pub fn apply_polynomial(values: &[f64], poly: &[f64]) -> Result<Vec<f64>> {
    if poly.is_empty() {
        return Err(MathError::InvalidInput(
            "Lag polynomial must have at least one coefficient".to_string(),
        ));
    }

    let degree = poly.len() - 1;
    if values.len() <= degree {
        return Err(MathError::InsufficientData(format!(
            "Differencing of degree {} needs more than {} observations, got {}",
            degree,
            degree,
            values.len()
        )));
    }

    Ok((degree..values.len())
        .map(|t| {
            poly.iter()
                .enumerate()
                .map(|(k, &c)| c * values[t - k])
                .sum()
        })
        .collect())
}

/// Undo differencing for values that follow `history`
///
/// Inverts `w_t = sum_k poly[k] * x[t - k]` (with `poly[0] == 1`) to
/// `x_t = w_t - sum_{k>=1} poly[k] * x[t - k]`, seeding the recursion with
/// the tail of `history`.
pub fn integrate(history: &[f64], differenced: &[f64], poly: &[f64]) -> Result<Vec<f64>> {
    if poly.first().copied() != Some(1.0) {
        return Err(MathError::InvalidInput(
            "Differencing polynomial must be monic".to_string(),
        ));
    }

    let degree = poly.len() - 1;
    if history.len() < degree {
        return Err(MathError::InsufficientData(format!(
            "Integration of degree {} needs {} history values, got {}",
            degree,
            degree,
            history.len()
        )));
    }

    let mut extended: Vec<f64> = history[history.len() - degree..].to_vec();
    let mut integrated = Vec::with_capacity(differenced.len());

    for &w in differenced {
        let t = extended.len();
        let carry: f64 = poly
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, &c)| c * extended[t - k])
            .sum();
        let x = w - carry;
        extended.push(x);
        integrated.push(x);
    }

    Ok(integrated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polynomial::difference_polynomial;

    #[test]
    fn test_apply_difference_polynomial() {
        let diffs = apply_polynomial(&[1.0, 3.0, 6.0, 10.0], &[1.0, -1.0]).unwrap();
        assert_eq!(diffs, vec![2.0, 3.0, 4.0]);

        let seasonal = apply_polynomial(&[1.0, 2.0, 4.0, 7.0], &[1.0, 0.0, -1.0]).unwrap();
        assert_eq!(seasonal, vec![3.0, 5.0]);
    }

    #[test]
    fn test_too_short() {
        assert!(matches!(
            apply_polynomial(&[1.0], &[1.0, -1.0]),
            Err(MathError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_integrate_inverts_seasonal_difference() {
        let values: Vec<f64> = (0..20)
            .map(|i| i as f64 * 2.0 + [5.0, -1.0, 3.0, 0.0][i % 4])
            .collect();
        let poly = difference_polynomial(1, 1, 4);
        let diffs = apply_polynomial(&values, &poly).unwrap();

        let split = 12;
        let rebuilt = integrate(&values[..split], &diffs[split - 5..], &poly).unwrap();
        for (a, b) in rebuilt.iter().zip(&values[split..]) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_integrate_requires_monic() {
        assert!(integrate(&[1.0], &[1.0], &[2.0, 1.0]).is_err());
    }
}
