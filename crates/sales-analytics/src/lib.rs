//! Sales Analytics Library
//!
//! Descriptive statistics over retail order line items, built with Rust and Polars.
//!
//! # Overview
//!
//! A run moves one CSV file through five stages, each handing an immutable
//! result to the next:
//!
//! - **Loading**: header validated against an explicit schema, dates parsed
//!   with an explicit format
//! - **Cleaning**: column pruning, stable deduplication, text repair, label
//!   normalization and a missing-value audit
//! - **Enrichment**: retail price and per-item profit for each line item
//! - **Aggregation**: customer, product and time-bucketed summaries
//! - **Cohort Selection**: top and bottom subsets by mean ± k·stddev
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sales_analytics::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .top_k(2.0)
//!     .bottom_k(1.5)
//!     .cohort_field("total_profit")
//!     .build()?;
//!
//! let output = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run_path("superstore.csv")?;
//!
//! for customer in &output.cohorts.top_customers.rows {
//!     println!("{}: {:.2}", customer.customer_id, customer.total_profit);
//! }
//! ```
//!
//! # Profit margins
//!
//! Per-entity and overall margins are ratios of sums. The average margin
//! across customers or products is a mean of per-entity ratios and is
//! reported separately in [`MarginOverview`].

pub mod aggregator;
pub mod cleaner;
pub mod cohort;
pub mod config;
pub mod enricher;
pub mod error;
pub mod export;
pub mod loader;
pub mod pipeline;
pub mod records;
pub mod types;

// Re-exports for convenient access
pub use cleaner::{CleaningReport, DataCleaner};
pub use cohort::{
    Cohort, CohortRule, CohortSelector, CohortStats, Direction, NumericFields, Threshold,
};
pub use config::{CohortConfig, ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use enricher::{Enricher, Enrichment, ExcludedRecord};
pub use error::{AnalyticsError, Result as AnalyticsResult, ResultExt};
pub use export::{AnalysisReport, export_tables, write_csv};
pub use loader::{ColumnSpec, SalesLoader, SemanticType, TableSchema};
pub use pipeline::{
    ClosureProgressReporter, CohortComparison, Cohorts, Pipeline, PipelineBuilder,
    PipelineOutput, PipelineStage, ProgressReporter, ProgressUpdate,
};
pub use records::records_from_frame;
pub use types::{
    CustomerSummary, Dimension, EnrichedRecord, MarginOverview, Period, PeriodShare,
    ProductSummary, RunSummary, SalesRecord, TimeBucket,
};
