//! Boundary check on the external dataset validator
//!
//! The acquisition pipeline writes a JSON report; a benchmark over a dataset
//! whose report did not pass is refused.

use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed: bool,
    #[serde(default)]
    pub checks: BTreeMap<String, bool>,
    #[serde(default)]
    pub raw_csv: Option<String>,
    #[serde(default)]
    pub series_csv: Option<String>,
}

impl ValidationReport {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Names of the checks that did not pass
    pub fn failed_checks(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|(_, ok)| !**ok)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn require_passed(&self) -> Result<()> {
        if self.passed {
            return Ok(());
        }
        let failed = self.failed_checks();
        let detail = if failed.is_empty() {
            "no individual check reported".to_string()
        } else {
            failed.join(", ")
        };
        Err(BenchError::Configuration(format!(
            "Dataset validation did not pass (failed: {})",
            detail
        )))
    }
}
