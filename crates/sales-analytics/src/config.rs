//! Configuration types for the analytics pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use crate::cohort::NumericFields;
use crate::types::{CustomerSummary, Dimension, ProductSummary};
use serde::{Deserialize, Serialize};

/// Default format of the two date columns (day/month/year).
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Default multiplier for the top cohort.
pub const DEFAULT_TOP_K: f64 = 2.0;

/// Default multiplier for the bottom cohort.
pub const DEFAULT_BOTTOM_K: f64 = 1.5;

/// Source columns with no downstream use: a row counter, a personal name,
/// and a constant country column.
pub fn default_dropped_columns() -> Vec<String> {
    ["Row ID", "Customer Name", "Country"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Labels that do not normalize cleanly or that clash with derived fields.
pub fn default_column_renames() -> Vec<(String, String)> {
    [
        ("Sub-Category", "sub_category"),
        ("Sales", "total_sale"),
        ("Profit", "total_profit"),
        ("Discount", "percent_discount"),
    ]
    .iter()
    .map(|(from, to)| (from.to_string(), to.to_string()))
    .collect()
}

/// Threshold rule for one entity table's cohorts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortConfig {
    /// Numeric field compared against mean ± k·stddev.
    pub field: String,
    /// Multiplier for the top cohort (`F > mean + k·σ`).
    pub top_k: f64,
    /// Multiplier for the bottom cohort (`F < mean − k·σ`).
    pub bottom_k: f64,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            field: "total_profit".to_string(),
            top_k: DEFAULT_TOP_K,
            bottom_k: DEFAULT_BOTTOM_K,
        }
    }
}

/// Configuration for the analytics pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use sales_analytics::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .date_format("%m/%d/%Y")
///     .customer_top_k(1.5)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// chrono format of the order and ship date columns.
    /// Default: "%d/%m/%Y"
    pub date_format: String,

    /// Source column labels dropped before deduplication.
    /// Default: Row ID, Customer Name, Country
    pub dropped_columns: Vec<String>,

    /// Explicit label renames, applied before generic normalization.
    pub column_renames: Vec<(String, String)>,

    /// Cohort rule for the customer table.
    pub customer_cohort: CohortConfig,

    /// Cohort rule for the product table.
    pub product_cohort: CohortConfig,

    /// Dimension for the split monthly series, if any.
    /// Default: Region
    pub time_dimension: Option<Dimension>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            dropped_columns: default_dropped_columns(),
            column_renames: default_column_renames(),
            customer_cohort: CohortConfig::default(),
            product_cohort: CohortConfig::default(),
            time_dimension: Some(Dimension::Region),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.date_format.trim().is_empty() {
            return Err(ConfigValidationError::EmptyDateFormat);
        }

        validate_cohort(
            "customer_cohort",
            &self.customer_cohort,
            CustomerSummary::FIELDS,
        )?;
        validate_cohort(
            "product_cohort",
            &self.product_cohort,
            ProductSummary::FIELDS,
        )?;

        Ok(())
    }
}

fn validate_cohort(
    name: &str,
    cohort: &CohortConfig,
    known_fields: &[&str],
) -> Result<(), ConfigValidationError> {
    for (suffix, k) in [("top_k", cohort.top_k), ("bottom_k", cohort.bottom_k)] {
        if !k.is_finite() || k <= 0.0 {
            return Err(ConfigValidationError::InvalidMultiplier {
                field: format!("{}.{}", name, suffix),
                value: k,
            });
        }
    }

    if !known_fields.contains(&cohort.field.as_str()) {
        return Err(ConfigValidationError::UnknownCohortField {
            cohort: name.to_string(),
            field: cohort.field.clone(),
        });
    }

    Ok(())
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid multiplier for '{field}': {value} (must be finite and greater than 0)")]
    InvalidMultiplier { field: String, value: f64 },

    #[error("Unknown field '{field}' for {cohort}")]
    UnknownCohortField { cohort: String, field: String },

    #[error("Date format must not be empty")]
    EmptyDateFormat,
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    date_format: Option<String>,
    dropped_columns: Option<Vec<String>>,
    column_renames: Option<Vec<(String, String)>>,
    customer_cohort: Option<CohortConfig>,
    product_cohort: Option<CohortConfig>,
    time_dimension: Option<Option<Dimension>>,
}

impl PipelineConfigBuilder {
    /// Set the chrono format used for both date columns.
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    /// Replace the list of source columns dropped during cleaning.
    pub fn dropped_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dropped_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Add an explicit label rename on top of the defaults.
    pub fn rename_column(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.column_renames
            .get_or_insert_with(default_column_renames)
            .push((from.into(), to.into()));
        self
    }

    /// Set the full customer cohort rule.
    pub fn customer_cohort(mut self, cohort: CohortConfig) -> Self {
        self.customer_cohort = Some(cohort);
        self
    }

    /// Set the full product cohort rule.
    pub fn product_cohort(mut self, cohort: CohortConfig) -> Self {
        self.product_cohort = Some(cohort);
        self
    }

    /// Set the top-cohort multiplier for both entity tables.
    pub fn top_k(mut self, k: f64) -> Self {
        self.customer_cohort.get_or_insert_with(CohortConfig::default).top_k = k;
        self.product_cohort.get_or_insert_with(CohortConfig::default).top_k = k;
        self
    }

    /// Set the bottom-cohort multiplier for both entity tables.
    pub fn bottom_k(mut self, k: f64) -> Self {
        self.customer_cohort.get_or_insert_with(CohortConfig::default).bottom_k = k;
        self.product_cohort.get_or_insert_with(CohortConfig::default).bottom_k = k;
        self
    }

    /// Set the compared field for both entity tables.
    pub fn cohort_field(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.customer_cohort.get_or_insert_with(CohortConfig::default).field = field.clone();
        self.product_cohort.get_or_insert_with(CohortConfig::default).field = field;
        self
    }

    /// Set the dimension for the split monthly series (`None` disables it).
    pub fn time_dimension(mut self, dimension: Option<Dimension>) -> Self {
        self.time_dimension = Some(dimension);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            date_format: self
                .date_format
                .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
            dropped_columns: self.dropped_columns.unwrap_or_else(default_dropped_columns),
            column_renames: self.column_renames.unwrap_or_else(default_column_renames),
            customer_cohort: self.customer_cohort.unwrap_or_default(),
            product_cohort: self.product_cohort.unwrap_or_default(),
            time_dimension: self.time_dimension.unwrap_or(Some(Dimension::Region)),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.date_format, "%d/%m/%Y");
        assert_eq!(config.customer_cohort.top_k, 2.0);
        assert_eq!(config.customer_cohort.bottom_k, 1.5);
        assert_eq!(config.product_cohort.field, "total_profit");
        assert_eq!(config.dropped_columns.len(), 3);
        assert_eq!(config.time_dimension, Some(Dimension::Region));
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .date_format("%m/%d/%Y")
            .top_k(1.5)
            .bottom_k(2.0)
            .cohort_field("profit_margin")
            .time_dimension(None)
            .rename_column("Ship Mode", "shipping")
            .build()
            .unwrap();

        assert_eq!(config.date_format, "%m/%d/%Y");
        assert_eq!(config.customer_cohort.top_k, 1.5);
        assert_eq!(config.product_cohort.bottom_k, 2.0);
        assert_eq!(config.customer_cohort.field, "profit_margin");
        assert_eq!(config.time_dimension, None);
        assert_eq!(config.column_renames.len(), 5);
        assert_eq!(
            config.column_renames.last(),
            Some(&("Ship Mode".to_string(), "shipping".to_string()))
        );
    }

    #[test]
    fn test_validation_invalid_multiplier() {
        let result = PipelineConfig::builder().top_k(0.0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidMultiplier { .. }
        ));

        let result = PipelineConfig::builder().bottom_k(f64::NAN).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_unknown_field() {
        let result = PipelineConfig::builder().cohort_field("customer_id").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::UnknownCohortField { .. }
        ));
    }

    #[test]
    fn test_validation_empty_date_format() {
        let result = PipelineConfig::builder().date_format("  ").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyDateFormat
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "date_format": "%Y-%m-%d",
            "dropped_columns": ["Row ID"],
            "column_renames": [["Sales", "total_sale"]],
            "customer_cohort": { "field": "avg_discount", "top_k": 1.0, "bottom_k": 1.0 },
            "product_cohort": { "field": "total_profit", "top_k": 2.0, "bottom_k": 1.5 },
            "time_dimension": "category"
        }"#;

        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.date_format, "%Y-%m-%d");
        assert_eq!(config.dropped_columns, vec!["Row ID".to_string()]);
        assert_eq!(config.customer_cohort.field, "avg_discount");
        assert_eq!(config.time_dimension, Some(Dimension::Category));
        assert!(config.validate().is_ok());
    }
}
