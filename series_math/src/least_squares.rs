//! Penalised linear least squares

use crate::{MathError, Result};

/// Solve a square linear system with partial pivoting (Gauss-Jordan)
pub fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(format!(
            "Expected a {}x{} system matrix",
            n, n
        )));
    }

    for pivot in 0..n {
        let mut best_row = pivot;
        let mut best_abs = a[pivot][pivot].abs();
        for row in (pivot + 1)..n {
            let candidate = a[row][pivot].abs();
            if candidate > best_abs {
                best_abs = candidate;
                best_row = row;
            }
        }
        if !best_abs.is_finite() || best_abs <= f64::EPSILON {
            return Err(MathError::CalculationError(format!(
                "Singular system at column {}",
                pivot
            )));
        }
        if best_row != pivot {
            a.swap(pivot, best_row);
            b.swap(pivot, best_row);
        }

        let pivot_val = a[pivot][pivot];
        for col in pivot..n {
            a[pivot][col] /= pivot_val;
        }
        b[pivot] /= pivot_val;

        for row in 0..n {
            if row == pivot {
                continue;
            }
            let factor = a[row][pivot];
            if factor == 0.0 {
                continue;
            }
            for col in pivot..n {
                a[row][col] -= factor * a[pivot][col];
            }
            b[row] -= factor * b[pivot];
        }
    }

    Ok(b)
}

/// Ridge regression through the normal equations
///
/// Minimises `|y - X beta|^2 + sum_j penalties[j] * beta_j^2`. `design` is
/// row-major with one row per observation.
pub fn ridge_regression(design: &[Vec<f64>], target: &[f64], penalties: &[f64]) -> Result<Vec<f64>> {
    if design.len() != target.len() {
        return Err(MathError::InvalidInput(format!(
            "Design has {} rows but target has {} values",
            design.len(),
            target.len()
        )));
    }
    if design.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot fit a regression without observations".to_string(),
        ));
    }

    let p = penalties.len();
    if design.iter().any(|row| row.len() != p) {
        return Err(MathError::InvalidInput(format!(
            "Every design row must have {} columns",
            p
        )));
    }

    let mut gram = vec![vec![0.0; p]; p];
    let mut moment = vec![0.0; p];
    for (row, &y) in design.iter().zip(target) {
        for i in 0..p {
            moment[i] += row[i] * y;
            for j in i..p {
                gram[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..p {
        for j in 0..i {
            gram[i][j] = gram[j][i];
        }
        gram[i][i] += penalties[i];
    }

    solve_linear_system(gram, moment)
}

/// Evaluate `X beta` for every design row
pub fn predict(design: &[Vec<f64>], coefficients: &[f64]) -> Vec<f64> {
    design
        .iter()
        .map(|row| row.iter().zip(coefficients).map(|(x, b)| x * b).sum())
        .collect()
}
