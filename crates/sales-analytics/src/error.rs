//! Custom error types for the sales analytics pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. Errors fall
//! into two groups:
//!
//! - **Structural errors** (schema, date, value, missing-value audit) abort
//!   the whole run, since no partial pipeline state is useful.
//! - **Record-level errors** ([`AnalyticsError::EnrichmentUndefined`]) are
//!   isolated to the offending record; the enricher excludes and counts
//!   them instead of aborting.
//!
//! Errors are serializable so the CLI can emit them as part of a JSON report.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the analytics pipeline.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Header row disagrees with the declared schema.
    #[error("Schema mismatch: expected {expected} columns {expected_names:?}, found {found} columns {found_names:?}")]
    SchemaMismatch {
        expected: usize,
        found: usize,
        expected_names: Vec<String>,
        found_names: Vec<String>,
    },

    /// A date cell does not match the configured format.
    #[error("Failed to parse date in column '{column}' at row {row}: '{value}' does not match '{format}'")]
    DateParseError {
        column: String,
        row: usize,
        value: String,
        format: String,
    },

    /// A numeric cell could not be parsed.
    #[error("Invalid value in column '{column}' at row {row}: '{value}'")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    /// The post-clean audit found nulls in a retained column.
    #[error("Missing values detected after cleaning: {count} null(s) in column '{column}'")]
    MissingValueDetected { column: String, count: usize },

    /// Derived fields cannot be computed for a record.
    #[error("Derived fields undefined for order '{order_id}' / product '{product_id}': {reason}")]
    EnrichmentUndefined {
        order_id: String,
        product_id: String,
        reason: String,
    },

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Numeric field name unknown to the table it was requested on.
    #[error("Unknown numeric field '{field}' for {table}")]
    UnknownField { field: String, table: &'static str },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalyticsError>,
    },
}

impl AnalyticsError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalyticsError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            Self::DateParseError { .. } => "DATE_PARSE_ERROR",
            Self::InvalidValue { .. } => "INVALID_VALUE",
            Self::MissingValueDetected { .. } => "MISSING_VALUE_DETECTED",
            Self::EnrichmentUndefined { .. } => "ENRICHMENT_UNDEFINED",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::UnknownField { .. } => "UNKNOWN_FIELD",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error only affects a single record.
    ///
    /// Record-level errors are excluded and counted by the stage that
    /// raised them; everything else aborts the run.
    pub fn is_record_level(&self) -> bool {
        match self {
            Self::EnrichmentUndefined { .. } => true,
            Self::WithContext { source, .. } => source.is_record_level(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for AnalyticsError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalyticsError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalyticsError::Polars(e).with_context(context))
    }
}
