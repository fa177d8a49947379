//! Export of pipeline tables and reports.
//!
//! Tables are converted to polars frames with named, typed columns and
//! written as CSV; [`AnalysisReport`] is the JSON view of a run.
//!
//! # Example
//!
//! ```rust,ignore
//! use sales_analytics::export::{export_tables, AnalysisReport};
//!
//! let written = export_tables(&output, Path::new("out"))?;
//! let report = AnalysisReport::from_output(&output, "total_profit", "total_profit");
//! println!("{}", report.to_json()?);
//! ```

mod frames;
mod report;

pub use frames::{
    customers_frame, products_frame, records_frame, shares_frame, time_series_frame,
};
pub use report::{AnalysisReport, CohortThresholds};

use crate::error::{Result, ResultExt};
use crate::pipeline::PipelineOutput;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Write a frame as comma-separated CSV with a header row.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)
        .context(format!("Failed to write {}", path.display()))?;

    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Write every table of a run into `dir`, one CSV per table.
///
/// Returns the written paths in a fixed order.
pub fn export_tables(output: &PipelineOutput, dir: &Path) -> Result<Vec<PathBuf>> {
    let cohorts = &output.cohorts;
    let mut tables: Vec<(&str, DataFrame)> = vec![
        ("cleaned", output.cleaned.clone()),
        ("enriched", records_frame(&output.records)?),
        ("customers", customers_frame(&output.customers)?),
        ("products", products_frame(&output.products)?),
        ("monthly", time_series_frame(&output.monthly)?),
        ("yearly", time_series_frame(&output.yearly)?),
        ("top_customers", customers_frame(&cohorts.top_customers.rows)?),
        ("bottom_customers", customers_frame(&cohorts.bottom_customers.rows)?),
        ("top_products", products_frame(&cohorts.top_products.rows)?),
        ("bottom_products", products_frame(&cohorts.bottom_products.rows)?),
    ];
    if !output.monthly_by_dimension.is_empty() {
        tables.push((
            "monthly_by_dimension",
            time_series_frame(&output.monthly_by_dimension)?,
        ));
        tables.push(("monthly_shares", shares_frame(&output.shares)?));
    }

    let mut written = Vec::with_capacity(tables.len());
    for (name, mut df) in tables {
        let path = dir.join(format!("{}.csv", name));
        write_csv(&mut df, &path)?;
        written.push(path);
    }

    info!("Exported {} tables to {}", written.len(), dir.display());
    Ok(written)
}
