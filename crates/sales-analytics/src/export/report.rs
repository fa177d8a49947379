use crate::cohort::Threshold;
use crate::error::Result;
use crate::pipeline::{CohortComparison, PipelineOutput};
use crate::types::{MarginOverview, RunSummary};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Thresholds each cohort was cut with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortThresholds {
    pub customer_field: String,
    pub product_field: String,
    pub top_customers: Threshold,
    pub bottom_customers: Threshold,
    pub top_products: Threshold,
    pub bottom_products: Threshold,
}

/// Serializable snapshot of a run for `--json` and report files.
///
/// The core never sets `generated_at` or `input_file`; callers add them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_file: Option<String>,
    pub summary: RunSummary,
    pub margins: MarginOverview,
    pub cohorts: CohortComparison,
    pub thresholds: CohortThresholds,
    /// Five most profitable customer ids.
    pub leading_customers: Vec<String>,
    /// Five least profitable customer ids.
    pub trailing_customers: Vec<String>,
    pub months: usize,
}

impl AnalysisReport {
    pub fn from_output(output: &PipelineOutput, customer_field: &str, product_field: &str) -> Self {
        let cohorts = &output.cohorts;
        let ids = |n: usize, rev: bool| -> Vec<String> {
            let iter = output.customers.iter().map(|c| c.customer_id.clone());
            if rev {
                iter.rev().take(n).collect()
            } else {
                iter.take(n).collect()
            }
        };

        Self {
            generated_at: None,
            input_file: None,
            summary: output.summary.clone(),
            margins: output.margins.clone(),
            cohorts: cohorts.stats(),
            thresholds: CohortThresholds {
                customer_field: customer_field.to_string(),
                product_field: product_field.to_string(),
                top_customers: cohorts.top_customers.threshold,
                bottom_customers: cohorts.bottom_customers.threshold,
                top_products: cohorts.top_products.threshold,
                bottom_products: cohorts.bottom_products.threshold,
            },
            leading_customers: ids(5, false),
            trailing_customers: ids(5, true),
            months: output.monthly.len(),
        }
    }

    pub fn with_input(mut self, path: impl AsRef<Path>) -> Self {
        self.input_file = Some(path.as_ref().display().to_string());
        self
    }

    pub fn with_timestamp(mut self, generated_at: impl Into<String>) -> Self {
        self.generated_at = Some(generated_at.into());
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as `<dir>/<base_name>_report.json`.
    pub fn write_to_dir(&self, dir: &Path, base_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;

        let report_path = dir.join(format!("{}_report.json", base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(self.to_json()?.as_bytes())?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }
}
