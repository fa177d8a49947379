//! Tables produced by a pipeline run.

use crate::cohort::{Cohort, CohortStats};
use crate::enricher::ExcludedRecord;
use crate::types::{
    CustomerSummary, EnrichedRecord, MarginOverview, PeriodShare, ProductSummary, RunSummary,
    TimeBucket,
};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// Top and bottom cohorts of both entity tables.
#[derive(Debug, Clone)]
pub struct Cohorts {
    pub top_customers: Cohort<CustomerSummary>,
    pub bottom_customers: Cohort<CustomerSummary>,
    pub top_products: Cohort<ProductSummary>,
    pub bottom_products: Cohort<ProductSummary>,
}

impl Cohorts {
    /// Per-cohort statistics for side-by-side comparison.
    pub fn stats(&self) -> CohortComparison {
        CohortComparison {
            top_customers: CohortStats::of(&self.top_customers),
            bottom_customers: CohortStats::of(&self.bottom_customers),
            top_products: CohortStats::of(&self.top_products),
            bottom_products: CohortStats::of(&self.bottom_products),
        }
    }
}

/// [`CohortStats`] of every cohort in a [`Cohorts`] set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortComparison {
    pub top_customers: CohortStats,
    pub bottom_customers: CohortStats,
    pub top_products: CohortStats,
    pub bottom_products: CohortStats,
}

/// Everything a run produces, each table in its documented order.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Cleaned frame with canonical labels.
    pub cleaned: DataFrame,
    /// Enriched records in cleaned-frame order.
    pub records: Vec<EnrichedRecord>,
    /// Records whose derived fields are undefined.
    pub excluded: Vec<ExcludedRecord>,
    /// Sorted by total profit, descending.
    pub customers: Vec<CustomerSummary>,
    /// Sorted by total profit, descending.
    pub products: Vec<ProductSummary>,
    pub monthly: Vec<TimeBucket>,
    pub yearly: Vec<TimeBucket>,
    /// Monthly buckets split by the configured dimension; empty when none is set.
    pub monthly_by_dimension: Vec<TimeBucket>,
    /// Shares of `monthly_by_dimension`.
    pub shares: Vec<PeriodShare>,
    pub margins: MarginOverview,
    pub cohorts: Cohorts,
    pub summary: RunSummary,
}
