//! Main analytics pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! running a sales file through every stage.

use crate::aggregator::{
    customer_summaries, margin_overview, period_shares, product_summaries, time_series,
};
use crate::cleaner::DataCleaner;
use crate::cohort::{CohortRule, CohortSelector};
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::enricher::Enricher;
use crate::error::Result;
use crate::loader::{SalesLoader, TableSchema};
use crate::pipeline::output::{Cohorts, PipelineOutput};
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::records::records_from_frame;
use crate::types::{Period, RunSummary};
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// The sales analytics pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use sales_analytics::{Pipeline, PipelineConfig};
///
/// let output = Pipeline::builder()
///     .config(PipelineConfig::builder().top_k(1.5).build()?)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run_path("superstore.csv")?;
///
/// println!("{} customers", output.customers.len());
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    loader: SalesLoader,
    cleaner: DataCleaner,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load a CSV file and run every stage over it.
    pub fn run_path(&self, path: impl AsRef<Path>) -> Result<PipelineOutput> {
        let path = path.as_ref();
        let result = self
            .load_with(|loader| loader.load_path(path))
            .and_then(|df| self.process_internal(df));
        self.finish(result)
    }

    /// Run every stage over CSV content held in memory.
    pub fn run_bytes(&self, bytes: impl Into<Vec<u8>>) -> Result<PipelineOutput> {
        let result = self
            .load_with(|loader| loader.load_bytes(bytes))
            .and_then(|df| self.process_internal(df));
        self.finish(result)
    }

    /// Run every stage after loading over an already typed frame.
    pub fn process(&self, df: DataFrame) -> Result<PipelineOutput> {
        let result = self.process_internal(df);
        self.finish(result)
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn finish(&self, result: Result<PipelineOutput>) -> Result<PipelineOutput> {
        match result {
            Ok(output) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(output)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn load_with<F>(&self, load: F) -> Result<DataFrame>
    where
        F: FnOnce(&SalesLoader) -> Result<DataFrame>,
    {
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            0.0,
            "Loading sales data...",
        ));
        info!("Step 1: Loading sales data...");

        let df = load(&self.loader)?;
        debug!("Loaded shape: {:?}", df.shape());

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            1.0,
            format!("Loaded {} rows", df.height()),
        ));
        Ok(df)
    }

    fn process_internal(&self, df: DataFrame) -> Result<PipelineOutput> {
        let start_time = Instant::now();

        let mut summary = RunSummary::new();
        summary.rows_loaded = df.height();
        summary.columns_loaded = df.width();

        // Step 2: Cleaning
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Cleaning,
            0.0,
            "Cleaning data...",
        ));
        info!("Step 2: Cleaning data...");

        let (cleaned, report) = self.cleaner.clean(df)?;
        summary.duplicates_removed = report.duplicates_removed;
        summary.columns_dropped = report.columns_dropped;
        summary.values_repaired = report.values_repaired;
        summary.rows_cleaned = report.rows_after;
        summary.cleaning_actions = report.actions;

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Cleaning,
            1.0,
            format!("{} rows after cleaning", cleaned.height()),
        ));

        // Step 3: Enrichment
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Enriching,
            0.0,
            "Deriving retail price and per-item profit...",
        ));
        info!("Step 3: Enriching records...");

        let enrichment = Enricher::enrich(records_from_frame(
            &cleaned,
            &self.config.column_renames,
        )?);
        summary.records_enriched = enrichment.records.len();
        summary.records_excluded = enrichment.excluded_count();
        if summary.records_excluded > 0 {
            summary.add_warning(format!(
                "{} records excluded: derived fields undefined",
                summary.records_excluded
            ));
        }

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Enriching,
            1.0,
            format!("Enriched {} records", summary.records_enriched),
        ));

        // Step 4: Aggregation
        info!("Step 4: Aggregating...");
        let records = enrichment.records;

        self.report_progress(ProgressUpdate::with_sub_stage(
            PipelineStage::Aggregating,
            "Entities",
            0.0,
            "Summarizing customers and products...",
        ));
        let customers = customer_summaries(&records);
        let products = product_summaries(&records);
        summary.customers = customers.len();
        summary.products = products.len();
        debug!("{} customers, {} products", customers.len(), products.len());

        self.report_progress(ProgressUpdate::with_sub_stage(
            PipelineStage::Aggregating,
            "Time series",
            0.5,
            "Bucketing by month and year...",
        ));
        let monthly = time_series(&records, Period::Month, None);
        let yearly = time_series(&records, Period::Year, None);
        let monthly_by_dimension = match self.config.time_dimension {
            Some(dimension) => time_series(&records, Period::Month, Some(dimension)),
            None => Vec::new(),
        };
        let shares = period_shares(&monthly_by_dimension);
        let margins = margin_overview(&records, &customers, &products);
        debug!(
            "{} monthly, {} yearly, {} split buckets",
            monthly.len(),
            yearly.len(),
            monthly_by_dimension.len()
        );

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Aggregating,
            1.0,
            "Aggregation complete",
        ));

        // Step 5: Cohort selection
        self.report_progress(ProgressUpdate::new(
            PipelineStage::CohortSelection,
            0.0,
            "Selecting cohorts...",
        ));
        info!("Step 5: Selecting cohorts...");

        let customer_rule = &self.config.customer_cohort;
        let product_rule = &self.config.product_cohort;
        let cohorts = Cohorts {
            top_customers: CohortSelector::select(&customers, &CohortRule::top(customer_rule))?,
            bottom_customers: CohortSelector::select(
                &customers,
                &CohortRule::bottom(customer_rule),
            )?,
            top_products: CohortSelector::select(&products, &CohortRule::top(product_rule))?,
            bottom_products: CohortSelector::select(&products, &CohortRule::bottom(product_rule))?,
        };

        for (name, degenerate) in [
            ("customer", cohorts.top_customers.degenerate),
            ("product", cohorts.top_products.degenerate),
        ] {
            if degenerate {
                summary.add_warning(format!(
                    "{} cohorts are empty: no variance in the compared field",
                    name
                ));
            }
        }

        self.report_progress(ProgressUpdate::new(
            PipelineStage::CohortSelection,
            1.0,
            format!(
                "Customers: {} top / {} bottom, products: {} top / {} bottom",
                cohorts.top_customers.len(),
                cohorts.bottom_customers.len(),
                cohorts.top_products.len(),
                cohorts.bottom_products.len()
            ),
        ));

        info!(
            "Pipeline finished in {:.2?}: {} records, {} customers, {} products",
            start_time.elapsed(),
            records.len(),
            customers.len(),
            products.len()
        );

        Ok(PipelineOutput {
            cleaned,
            records,
            excluded: enrichment.excluded,
            customers,
            products,
            monthly,
            yearly,
            monthly_by_dimension,
            shares,
            margins,
            cohorts,
            summary,
        })
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    schema: Option<TableSchema>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the expected input schema. Defaults to [`TableSchema::superstore`].
    pub fn schema(mut self, schema: TableSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let schema = self.schema.unwrap_or_else(TableSchema::superstore);
        let cleaner = DataCleaner::new(&config, &schema);
        let loader = SalesLoader::new(schema, config.date_format.clone());

        Ok(Pipeline {
            config,
            loader,
            cleaner,
            progress_reporter: self.progress_reporter,
        })
    }
}
