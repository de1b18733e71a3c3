use approx::assert_relative_eq;
use chrono::NaiveDate;
use forecast_bench::models::MeanForecaster;
use forecast_bench::synthetic::monthly_seasonal_series;
use forecast_bench::{
    Benchmark, BenchError, Forecaster, Frequency, Result, SeriesSlice, TimeSeries,
};
use pretty_assertions::assert_eq;

/// Returns the training mean but fails on one chosen call
#[derive(Debug)]
struct FailsOnWindow {
    fail_on: usize,
    calls: usize,
}

impl Forecaster for FailsOnWindow {
    fn name(&self) -> &str {
        "flaky"
    }

    fn forecast(&mut self, train: &SeriesSlice<'_>, horizon: usize) -> Result<Vec<f64>> {
        let call = self.calls;
        self.calls += 1;
        if call == self.fail_on {
            return Err(BenchError::Forecast(format!("did not converge on window {}", call)));
        }
        Ok(vec![train.mean().unwrap_or(0.0); horizon])
    }
}

#[derive(Debug)]
struct AlwaysFails;

impl Forecaster for AlwaysFails {
    fn name(&self) -> &str {
        "broken"
    }

    fn forecast(&mut self, _train: &SeriesSlice<'_>, _horizon: usize) -> Result<Vec<f64>> {
        Err(BenchError::Forecast("nope".to_string()))
    }
}

#[derive(Debug)]
struct Zero;

impl Forecaster for Zero {
    fn name(&self) -> &str {
        "zero"
    }

    fn forecast(&mut self, _train: &SeriesSlice<'_>, horizon: usize) -> Result<Vec<f64>> {
        Ok(vec![0.0; horizon])
    }
}

fn ramp(n: usize) -> TimeSeries {
    let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
    TimeSeries::from_start(
        "value",
        Frequency::MonthStart,
        start,
        (0..n).map(|i| 10.0 + i as f64).collect(),
    )
    .unwrap()
}

fn seasonal_48() -> TimeSeries {
    let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    monthly_seasonal_series(start, 48, 100.0, 20.0, 0.5, 1.0, 42).unwrap()
}

#[test]
fn test_failed_window_is_skipped() {
    // 16 points, horizon 2, min train 5: ten windows
    let series = ramp(16);
    let benchmark = Benchmark::new(2, 5).unwrap();
    assert_eq!(benchmark.splitter().window_count(series.len()), 10);

    let mut forecasters: Vec<Box<dyn Forecaster>> =
        vec![Box::new(FailsOnWindow { fail_on: 3, calls: 0 })];
    let report = benchmark.run(&series, &mut forecasters).unwrap();

    let summary = report.metrics_for("flaky").unwrap();
    assert_eq!(summary.n_predictions, 18);
    assert_eq!(report.predictions.len(), 18);

    // the fourth window (train_end 8) would have covered dates 8 and 9
    let dates: Vec<NaiveDate> = report.predictions.iter().map(|p| p.date).collect();
    let count = |i: usize| dates.iter().filter(|d| **d == series.timestamps()[i]).count();
    assert_eq!(count(8), 1);
    assert_eq!(count(9), 1);
    assert_eq!(count(10), 2);
}

#[test]
fn test_failing_model_does_not_affect_others() {
    let series = seasonal_48();
    let benchmark = Benchmark::new(6, 24).unwrap();

    let mut alone: Vec<Box<dyn Forecaster>> = vec![Box::new(MeanForecaster::new())];
    let baseline = benchmark.run(&series, &mut alone).unwrap();

    let mut mixed: Vec<Box<dyn Forecaster>> =
        vec![Box::new(AlwaysFails), Box::new(MeanForecaster::new())];
    let report = benchmark.run(&series, &mut mixed).unwrap();

    assert!(report.metrics_for("broken").is_none());
    assert_eq!(report.metrics, baseline.metrics);
    assert_eq!(report.predictions, baseline.predictions);
}

#[test]
fn test_all_models_failing_gives_empty_tables() {
    let series = ramp(20);
    let benchmark = Benchmark::new(3, 10).unwrap();
    let mut forecasters: Vec<Box<dyn Forecaster>> = vec![Box::new(AlwaysFails)];

    let report = benchmark.run(&series, &mut forecasters).unwrap();
    assert!(report.metrics.is_empty());
    assert!(report.predictions.is_empty());
    assert!(report.horizon_breakdown().is_empty());
}

#[test]
fn test_end_to_end_training_mean() {
    let series = seasonal_48();
    let benchmark = Benchmark::new(6, 24).unwrap();
    let mut forecasters: Vec<Box<dyn Forecaster>> = vec![Box::new(MeanForecaster::new())];

    let report = benchmark.run(&series, &mut forecasters).unwrap();
    assert_eq!(report.predictions.len(), 114);
    assert_eq!(report.metrics.len(), 1);

    let values = series.values();
    let mut deviations = Vec::new();
    for train_end in 24..=42 {
        let mean = values[..train_end].iter().sum::<f64>() / train_end as f64;
        for v in &values[train_end..train_end + 6] {
            deviations.push((v - mean).abs());
        }
    }
    assert_eq!(deviations.len(), 114);

    let summary = &report.metrics[0];
    assert_eq!(summary.model, "mean");
    assert_eq!(summary.n_predictions, 114);
    assert_relative_eq!(
        summary.mae,
        deviations.iter().sum::<f64>() / 114.0,
        epsilon = 1e-9
    );

    let steps = report.horizon_breakdown();
    assert_eq!(steps.len(), 6);
    assert!(steps.iter().all(|s| s.n == 19));
    assert_eq!(steps.iter().map(|s| s.horizon).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_metrics_are_sorted_by_smape() {
    let series = seasonal_48();
    let benchmark = Benchmark::new(6, 24).unwrap();
    let mut forecasters: Vec<Box<dyn Forecaster>> =
        vec![Box::new(Zero), Box::new(MeanForecaster::new())];

    let report = benchmark.run(&series, &mut forecasters).unwrap();
    let order: Vec<&str> = report.metrics.iter().map(|m| m.model.as_str()).collect();
    assert_eq!(order, vec!["mean", "zero"]);
    // predictions keep run order
    assert_eq!(report.predictions[0].model, "zero");
}

#[test]
fn test_series_too_short_for_any_window() {
    let series = ramp(10);
    let benchmark = Benchmark::new(6, 5).unwrap();
    let mut forecasters: Vec<Box<dyn Forecaster>> = vec![Box::new(MeanForecaster::new())];

    let err = benchmark.run(&series, &mut forecasters).unwrap_err();
    assert!(matches!(err, BenchError::Configuration(_)));
}
