//! Run configuration and the model registry

use crate::data::Frequency;
use crate::error::{BenchError, Result};
use crate::models::foundation::LocalCheckpointBackend;
use crate::models::{
    ArimaForecaster, DecompositionForecaster, Forecaster, PretrainedForecaster,
};
use crate::splitter::RollingOriginSplitter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

/// The forecaster variants that can be selected for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    StatisticalArima,
    AdditiveDecomposition,
    PretrainedFoundationModel,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::StatisticalArima,
        ModelKind::AdditiveDecomposition,
        ModelKind::PretrainedFoundationModel,
    ];

    /// Selection name
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::StatisticalArima => "statistical-arima",
            ModelKind::AdditiveDecomposition => "additive-decomposition",
            ModelKind::PretrainedFoundationModel => "pretrained-foundation-model",
        }
    }

    /// Identifier the built forecaster reports in the result tables
    pub fn model_id(&self) -> &'static str {
        match self {
            ModelKind::StatisticalArima => "sarima",
            ModelKind::AdditiveDecomposition => "prophet",
            ModelKind::PretrainedFoundationModel => "timesfm",
        }
    }

    /// Parse a comma-separated selection
    ///
    /// Blank entries are ignored and duplicates collapse to their first
    /// occurrence. Every unknown name is reported in one error.
    pub fn parse_list(raw: &str) -> Result<Vec<ModelKind>> {
        let mut kinds = Vec::new();
        let mut invalid = Vec::new();

        for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            match name.parse::<ModelKind>() {
                Ok(kind) if !kinds.contains(&kind) => kinds.push(kind),
                Ok(_) => {}
                Err(_) => invalid.push(name.to_string()),
            }
        }

        if !invalid.is_empty() {
            return Err(BenchError::Configuration(format!(
                "Unknown model name(s): {} (expected any of: {})",
                invalid.join(", "),
                ModelKind::ALL.map(|k| k.as_str()).join(", ")
            )));
        }
        if kinds.is_empty() {
            return Err(BenchError::Configuration("No models selected".to_string()));
        }
        Ok(kinds)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "statistical-arima" | "sarima" | "arima" => Ok(ModelKind::StatisticalArima),
            "additive-decomposition" | "prophet" => Ok(ModelKind::AdditiveDecomposition),
            "pretrained-foundation-model" | "timesfm" => Ok(ModelKind::PretrainedFoundationModel),
            other => Err(BenchError::Configuration(format!(
                "Unknown model name: {}",
                other
            ))),
        }
    }
}

/// Typed form of the benchmark options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub input_csv: PathBuf,
    pub date_col: String,
    pub value_col: String,
    pub freq: Frequency,
    pub horizon: usize,
    pub min_train_size: usize,
    pub models: Vec<ModelKind>,
    pub output_prefix: PathBuf,
    pub checkpoint_dir: Option<PathBuf>,
    pub validation_report: Option<PathBuf>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            input_csv: PathBuf::new(),
            date_col: "date".to_string(),
            value_col: "value".to_string(),
            freq: Frequency::MonthStart,
            horizon: 6,
            min_train_size: 36,
            models: ModelKind::ALL.to_vec(),
            output_prefix: PathBuf::from("results/benchmark"),
            checkpoint_dir: None,
            validation_report: None,
        }
    }
}

impl BenchmarkConfig {
    /// Check the options that do not depend on the data
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(BenchError::Configuration(
                "Forecast horizon must be positive".to_string(),
            ));
        }
        if self.min_train_size == 0 {
            return Err(BenchError::Configuration(
                "Minimum training size must be positive".to_string(),
            ));
        }
        if self.models.is_empty() {
            return Err(BenchError::Configuration("No models selected".to_string()));
        }
        Ok(())
    }

    /// Check that a series of length `n` yields at least one window
    pub fn check_window_count(&self, n: usize) -> Result<usize> {
        let windows = RollingOriginSplitter::new(self.horizon, self.min_train_size).window_count(n);
        if windows == 0 {
            return Err(BenchError::Configuration(format!(
                "min_train_size {} must not exceed series length {} minus horizon {}",
                self.min_train_size, n, self.horizon
            )));
        }
        Ok(windows)
    }

    /// Build the selected forecasters, see [`build_forecasters`]
    pub fn build_forecasters(&self) -> Result<Vec<Box<dyn Forecaster>>> {
        build_forecasters(&self.models, self.horizon, self.checkpoint_dir.as_deref())
    }
}

/// Construct one forecaster of `kind`
///
/// The pretrained model is built eagerly for `horizon`, so a missing backend
/// surfaces here as [`BenchError::ModelUnavailable`].
pub fn build_forecaster(
    kind: ModelKind,
    horizon: usize,
    checkpoint_dir: Option<&Path>,
) -> Result<Box<dyn Forecaster>> {
    match kind {
        ModelKind::StatisticalArima => Ok(Box::new(ArimaForecaster::default())),
        ModelKind::AdditiveDecomposition => Ok(Box::new(DecompositionForecaster::default())),
        ModelKind::PretrainedFoundationModel => {
            let dir = checkpoint_dir.ok_or_else(|| {
                BenchError::ModelUnavailable(
                    "no foundation model backend configured (pass a checkpoint directory)"
                        .to_string(),
                )
            })?;
            let mut model =
                PretrainedForecaster::new(Box::new(LocalCheckpointBackend::new(dir)));
            model.prepare(horizon)?;
            Ok(Box::new(model))
        }
    }
}

/// Construct every selected forecaster, leaving out the unavailable ones
///
/// Fails when nothing is left to run.
pub fn build_forecasters(
    kinds: &[ModelKind],
    horizon: usize,
    checkpoint_dir: Option<&Path>,
) -> Result<Vec<Box<dyn Forecaster>>> {
    let mut forecasters = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        match build_forecaster(kind, horizon, checkpoint_dir) {
            Ok(forecaster) => forecasters.push(forecaster),
            Err(BenchError::ModelUnavailable(reason)) => {
                warn!(model = kind.model_id(), %reason, "model unavailable; excluded from run");
            }
            Err(e) => return Err(e),
        }
    }

    if forecasters.is_empty() {
        return Err(BenchError::Configuration(
            "None of the selected models could be constructed".to_string(),
        ));
    }
    Ok(forecasters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("statistical-arima", ModelKind::StatisticalArima)]
    #[case("SARIMA", ModelKind::StatisticalArima)]
    #[case("additive_decomposition", ModelKind::AdditiveDecomposition)]
    #[case("prophet", ModelKind::AdditiveDecomposition)]
    #[case(" timesfm ", ModelKind::PretrainedFoundationModel)]
    fn test_model_names(#[case] raw: &str, #[case] expected: ModelKind) {
        assert_eq!(raw.parse::<ModelKind>().unwrap(), expected);
    }

    #[test]
    fn test_parse_list_reports_every_invalid_name() {
        let err = ModelKind::parse_list("sarima,lstm,prophet,xgboost").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("lstm"));
        assert!(message.contains("xgboost"));

        let kinds = ModelKind::parse_list("prophet, sarima,prophet,").unwrap();
        assert_eq!(
            kinds,
            vec![ModelKind::AdditiveDecomposition, ModelKind::StatisticalArima]
        );
        assert!(ModelKind::parse_list(" , ").is_err());
    }

    #[test]
    fn test_validate_and_window_count() {
        let config = BenchmarkConfig {
            horizon: 6,
            min_train_size: 24,
            ..BenchmarkConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.check_window_count(48).unwrap(), 19);
        assert!(matches!(
            config.check_window_count(29),
            Err(BenchError::Configuration(_))
        ));

        let zero = BenchmarkConfig {
            horizon: 0,
            ..BenchmarkConfig::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_missing_backend_excludes_foundation_model() {
        let forecasters = build_forecasters(&ModelKind::ALL, 6, None).unwrap();
        let names: Vec<&str> = forecasters.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["sarima", "prophet"]);

        let err = build_forecasters(&[ModelKind::PretrainedFoundationModel], 6, None).unwrap_err();
        assert!(matches!(err, BenchError::Configuration(_)));
    }
}
