//! Data cleaning for loaded sales frames.
//!
//! This module provides, in order of application:
//! - Pruning columns with no downstream use
//! - Stable removal of exact duplicate rows
//! - Repair of encoding damage in free-text columns
//! - Normalization of column labels
//! - A missing-value audit over every retained column
//!
//! Labels are resolved against both their source and canonical forms, so
//! running the cleaner over its own output changes nothing.

mod naming;
mod sanitizers;

pub use naming::{canonical_label, normalize_label};
pub use sanitizers::{has_corruption, repair_text};

use crate::config::PipelineConfig;
use crate::error::{AnalyticsError, Result};
use crate::loader::TableSchema;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What a cleaning pass changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub rows_before: usize,
    pub rows_after: usize,
    pub duplicates_removed: usize,
    pub columns_dropped: Vec<String>,
    pub values_repaired: usize,
    pub renamed: Vec<(String, String)>,
    pub actions: Vec<String>,
}

/// Data cleaner for loaded sales frames.
#[derive(Debug, Clone)]
pub struct DataCleaner {
    dropped_columns: Vec<String>,
    renames: Vec<(String, String)>,
    text_columns: Vec<String>,
}

impl DataCleaner {
    /// Create a cleaner that repairs the schema's free-text columns.
    pub fn new(config: &PipelineConfig, schema: &TableSchema) -> Self {
        Self {
            dropped_columns: config.dropped_columns.clone(),
            renames: config.column_renames.clone(),
            text_columns: schema
                .text_columns()
                .into_iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Run every cleaning step and audit the result.
    pub fn clean(&self, df: DataFrame) -> Result<(DataFrame, CleaningReport)> {
        let mut report = CleaningReport {
            rows_before: df.height(),
            ..Default::default()
        };
        let mut df = df;

        info!("Performing data cleaning...");

        // 1. Prune unused columns
        let to_drop: Vec<String> = self
            .dropped_columns
            .iter()
            .filter_map(|label| self.resolve(&df, label))
            .collect();

        if !to_drop.is_empty() {
            let cols_ref: Vec<PlSmallStr> = to_drop.iter().map(|s| s.as_str().into()).collect();
            df = df.drop_many(cols_ref);
            report
                .actions
                .push(format!("Dropped {} unused columns: {:?}", to_drop.len(), to_drop));
            debug!("Dropped columns: {:?}", to_drop);
        } else {
            report.actions.push("No unused columns to drop".to_string());
        }
        report.columns_dropped = to_drop;

        // 2. Remove duplicate rows, keeping the first occurrence
        let (deduped, removed) = remove_duplicates(df)?;
        df = deduped;
        report.duplicates_removed = removed;

        // 3. Repair encoding damage in free text
        for label in &self.text_columns {
            if let Some(column) = self.resolve(&df, label) {
                report.values_repaired += sanitizers::repair_text_column(&mut df, &column)?;
            }
        }

        if report.values_repaired > 0 {
            report.actions.push(format!(
                "Repaired {} damaged text values",
                report.values_repaired
            ));

            // Repair can make two rows equal; it can never make them differ
            let (deduped, removed) = remove_duplicates(df)?;
            df = deduped;
            report.duplicates_removed += removed;
        }

        if report.duplicates_removed > 0 {
            let pct = (report.duplicates_removed as f64 / report.rows_before as f64) * 100.0;
            report.actions.push(format!(
                "Removed {} duplicate rows ({:.1}%)",
                report.duplicates_removed, pct
            ));
        } else {
            report.actions.push("No duplicate rows found".to_string());
        }

        // 4. Canonical column labels
        report.renamed = naming::normalize_column_names(&mut df, &self.renames)?;
        if !report.renamed.is_empty() {
            report
                .actions
                .push(format!("Normalized {} column labels", report.renamed.len()));
        }

        // 5. Every later average assumes complete data
        audit_missing_values(&df)?;
        report.actions.push("Missing-value audit: 0 nulls".to_string());

        report.rows_after = df.height();
        debug!(
            "Cleaning complete: {} -> {} rows",
            report.rows_before, report.rows_after
        );

        Ok((df, report))
    }

    /// Find `label` in the frame under its source or canonical name.
    fn resolve(&self, df: &DataFrame, label: &str) -> Option<String> {
        let canonical = canonical_label(label, &self.renames);
        [label.to_string(), canonical]
            .into_iter()
            .find(|name| df.column(name).is_ok())
    }
}

/// Drop exact duplicate rows, keeping first occurrences in input order.
pub fn remove_duplicates(df: DataFrame) -> Result<(DataFrame, usize)> {
    let before = df.height();
    let deduped = df
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;
    let removed = before - deduped.height();
    if removed > 0 {
        debug!("Removed {} duplicate rows", removed);
    }
    Ok((deduped, removed))
}

/// Count rows that repeat an earlier row.
pub fn count_duplicates(df: &DataFrame) -> Result<usize> {
    let (_, removed) = remove_duplicates(df.clone())?;
    Ok(removed)
}

/// Fail on the first column that still holds nulls.
pub fn audit_missing_values(df: &DataFrame) -> Result<()> {
    for col in df.get_columns() {
        let count = col.null_count();
        if count > 0 {
            return Err(AnalyticsError::MissingValueDetected {
                column: col.name().to_string(),
                count,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaner() -> DataCleaner {
        let schema = TableSchema::new(vec![
            crate::loader::ColumnSpec::new("Row ID", crate::loader::SemanticType::Integer),
            crate::loader::ColumnSpec::new("Order ID", crate::loader::SemanticType::Identifier),
            crate::loader::ColumnSpec::new("Product Name", crate::loader::SemanticType::Text),
            crate::loader::ColumnSpec::new("Sales", crate::loader::SemanticType::Decimal),
        ]);
        let config = PipelineConfig::builder()
            .dropped_columns(["Row ID"])
            .build()
            .unwrap();
        DataCleaner::new(&config, &schema)
    }

    fn raw_frame() -> DataFrame {
        df![
            "Row ID" => [1i64, 2, 3, 4],
            "Order ID" => ["CA-1", "CA-1", "CA-1", "CA-2"],
            "Product Name" => ["Chair", "Desk\u{FFFD}Lamp", "Chair", "Binder"],
            "Sales" => [10.0, 20.0, 10.0, 5.0],
        ]
        .unwrap()
    }

    #[test]
    fn test_clean_prunes_dedups_repairs_and_renames() {
        let (df, report) = cleaner().clean(raw_frame()).unwrap();

        // Row ID made every row distinct; once dropped, rows 1 and 3 match
        assert_eq!(report.columns_dropped, vec!["Row ID".to_string()]);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.values_repaired, 1);
        assert_eq!(df.height(), 3);

        let names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["order_id", "product_name", "total_sale"]);

        let products: Vec<Option<&str>> = df
            .column("product_name")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(products, vec![Some("Chair"), Some("Desk Lamp"), Some("Binder")]);
    }

    #[test]
    fn test_second_pass_is_noop() {
        let (once, _) = cleaner().clean(raw_frame()).unwrap();
        let (twice, report) = cleaner().clean(once.clone()).unwrap();

        assert!(once.equals(&twice));
        assert_eq!(report.duplicates_removed, 0);
        assert_eq!(report.values_repaired, 0);
        assert!(report.columns_dropped.is_empty());
        assert!(report.renamed.is_empty());
        assert_eq!(count_duplicates(&twice).unwrap(), 0);
    }

    #[test]
    fn test_repair_merging_rows_is_deduplicated() {
        let df = df![
            "Order ID" => ["CA-1", "CA-1"],
            "Product Name" => ["Desk\u{FFFD}Lamp", "Desk\u{FFFD}\u{FFFD}Lamp"],
            "Sales" => [20.0, 20.0],
        ]
        .unwrap();

        let (df, report) = cleaner().clean(df).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(report.duplicates_removed, 1);
    }

    #[test]
    fn test_missing_values_fail_audit() {
        let df = df![
            "Order ID" => [Some("CA-1"), None],
            "Product Name" => ["Chair", "Desk"],
            "Sales" => [10.0, 20.0],
        ]
        .unwrap();

        let err = cleaner().clean(df).unwrap_err();
        match err {
            AnalyticsError::MissingValueDetected { column, count } => {
                assert_eq!(column, "order_id");
                assert_eq!(count, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicates_keep_first_in_order() {
        let df = df![
            "a" => [3i64, 1, 3, 2, 1],
        ]
        .unwrap();

        let (deduped, removed) = remove_duplicates(df).unwrap();
        assert_eq!(removed, 2);
        let values: Vec<Option<i64>> = deduped
            .column("a")
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some(3), Some(1), Some(2)]);
    }
}
