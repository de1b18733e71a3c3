//! Regression features for additive trend + seasonality models

/// Fourier terms `sin(2 pi k t / period), cos(2 pi k t / period)` for `k = 1..=order`
///
/// Returns one row per time point with `2 * order` columns.
pub fn fourier_features(t: &[f64], period: f64, order: usize) -> Vec<Vec<f64>> {
    t.iter()
        .map(|&ti| {
            let mut row = Vec::with_capacity(2 * order);
            for k in 1..=order {
                let angle = 2.0 * std::f64::consts::PI * k as f64 * ti / period;
                row.push(angle.sin());
                row.push(angle.cos());
            }
            row
        })
        .collect()
}

/// Hinge terms `max(0, t - c)` for every changepoint `c`
pub fn hinge_features(t: &[f64], changepoints: &[f64]) -> Vec<Vec<f64>> {
    t.iter()
        .map(|&ti| changepoints.iter().map(|&c| (ti - c).max(0.0)).collect())
        .collect()
}

/// Potential changepoint locations
///
/// Spreads at most `n_changepoints` locations uniformly over the first
/// `range` fraction of the (sorted) time points, never using the first point.
pub fn changepoint_grid(t: &[f64], n_changepoints: usize, range: f64) -> Vec<f64> {
    let history = ((t.len() as f64) * range.clamp(0.0, 1.0)).floor() as usize;
    if history < 2 || n_changepoints == 0 {
        return Vec::new();
    }

    let count = n_changepoints.min(history - 1);
    (1..=count)
        .map(|i| {
            let idx = (i as f64 * (history - 1) as f64 / count as f64).round() as usize;
            t[idx.min(t.len() - 1)]
        })
        .collect()
}
