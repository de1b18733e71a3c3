use approx::assert_relative_eq;
use forecast_bench::metrics::{mae, rmse, smape, smape_pointwise, MetricSummary, SMAPE_EPSILON};

#[test]
fn test_perfect_forecast() {
    let y = [1.0, 2.0, 3.0];
    assert_eq!(mae(&y, &y), 0.0);
    assert_eq!(rmse(&y, &y), 0.0);
    assert_eq!(smape(&[10.0], &[10.0]), 0.0);
}

#[test]
fn test_rmse_value() {
    assert_relative_eq!(rmse(&[0.0, 0.0], &[3.0, 4.0]), 12.5_f64.sqrt(), epsilon = 1e-12);
}

#[test]
fn test_smape_with_zeros() {
    let value = smape(&[0.0], &[0.0]);
    assert!(value.is_finite());
    assert!(value.abs() < 1e-6);
    assert!(SMAPE_EPSILON > 0.0);
}

#[test]
fn test_smape_pointwise_matches_mean() {
    let y_true = [100.0, 50.0, 0.0];
    let y_pred = [110.0, 40.0, 1.0];
    let rows = smape_pointwise(&y_true, &y_pred);
    assert_eq!(rows.len(), 3);
    assert_relative_eq!(
        rows.iter().sum::<f64>() / 3.0,
        smape(&y_true, &y_pred),
        epsilon = 1e-12
    );
}

#[test]
fn test_summary() {
    let summary = MetricSummary::from_pairs("sarima", &[1.0, 2.0], &[2.0, 2.0]).unwrap();
    assert_eq!(summary.model, "sarima");
    assert_eq!(summary.n_predictions, 2);
    assert_relative_eq!(summary.mae, 0.5);
    assert_relative_eq!(summary.rmse, 0.5_f64.sqrt());
    assert!(summary.to_string().contains("sarima"));
}
