use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// ============================================================================
// Record Types
// ============================================================================

/// One order line item after loading and cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub order_id: String,
    pub order_date: NaiveDate,
    pub ship_date: NaiveDate,
    pub ship_mode: String,
    pub customer_id: String,
    pub segment: String,
    pub region: String,
    pub state: String,
    pub city: String,
    pub postal_code: String,
    pub product_id: String,
    pub category: String,
    pub sub_category: String,
    pub product_name: String,
    pub quantity: i64,
    pub total_sale: f64,
    pub percent_discount: f64,
    pub total_profit: f64,
}

/// A [`SalesRecord`] with its derived per-line fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: SalesRecord,
    /// Undiscounted price of a single item.
    pub retail_price: f64,
    pub profit_per_item: f64,
}

// ============================================================================
// Aggregate Types
// ============================================================================

/// Per-customer statistics.
///
/// `profit_margin` is a ratio of sums (`total_profit / total_spend`), not the
/// mean of line-level margins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub customer_id: String,
    pub segment: String,
    /// Distinct orders, not line items.
    pub num_orders: usize,
    pub num_items: i64,
    pub avg_spend_per_order: f64,
    /// Mean of line-level discounts.
    pub avg_discount: f64,
    pub avg_profit_per_order: f64,
    pub total_spend: f64,
    pub total_profit: f64,
    pub profit_margin: f64,
}

/// Per-product statistics, keyed by product id plus its descriptive labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub product_id: String,
    pub category: String,
    pub sub_category: String,
    pub product_name: String,
    /// Mean of line-level retail prices.
    pub retail_price: f64,
    pub total_sold: i64,
    pub num_orders: usize,
    pub total_spent: f64,
    pub avg_discount: f64,
    pub avg_profit_per_item: f64,
    pub total_profit: f64,
    pub profit_margin: f64,
}

/// Bucket granularity for time-series aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Month,
    Year,
}

impl Period {
    /// Truncate a date to the first day of its period.
    pub fn truncate(&self, date: NaiveDate) -> NaiveDate {
        let (month, day) = match self {
            Self::Month => (date.month(), 1),
            Self::Year => (1, 1),
        };
        // Day 1 of an existing month always exists
        NaiveDate::from_ymd_opt(date.year(), month, day).unwrap_or(date)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

/// Categorical dimension that can split a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Region,
    Segment,
    Category,
}

impl Dimension {
    /// The record's value for this dimension.
    pub fn value<'a>(&self, record: &'a SalesRecord) -> &'a str {
        match self {
            Self::Region => &record.region,
            Self::Segment => &record.segment,
            Self::Category => &record.category,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Segment => "segment",
            Self::Category => "category",
        }
    }
}

/// Orders, revenue and profit summed over one period (and dimension value).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBucket {
    pub period: Period,
    /// First day of the period.
    pub period_start: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    /// Distinct orders placed in the bucket.
    pub orders: usize,
    pub total_sale: f64,
    pub total_profit: f64,
    pub profit_margin: f64,
    pub avg_discount: f64,
}

/// A dimension value's share of its period's totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodShare {
    pub period_start: NaiveDate,
    pub dimension: String,
    pub sale_share: f64,
    pub order_share: f64,
}

/// Profit margin computed under each convention.
///
/// The conventions are not numerically interchangeable: `overall_margin`
/// weighs every dollar equally, the `mean_*` fields weigh every entity equally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginOverview {
    /// Sum of profit over sum of sales across all records.
    pub overall_margin: f64,
    /// Mean of per-customer margins.
    pub mean_customer_margin: f64,
    /// Mean of per-product margins.
    pub mean_product_margin: f64,
    pub total_sale: f64,
    pub total_profit: f64,
}

// ============================================================================
// Run Summary
// ============================================================================

/// What each stage did to the data, for display and reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub rows_loaded: usize,
    pub columns_loaded: usize,
    pub duplicates_removed: usize,
    pub columns_dropped: Vec<String>,
    pub values_repaired: usize,
    pub rows_cleaned: usize,
    pub records_enriched: usize,
    pub records_excluded: usize,
    pub customers: usize,
    pub products: usize,
    pub cleaning_actions: Vec<String>,
    pub warnings: Vec<String>,
}

impl RunSummary {
    /// Create a new empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a warning to the summary.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Percentage of loaded rows that were duplicates.
    pub fn duplicate_percentage(&self) -> f64 {
        if self.rows_loaded == 0 {
            0.0
        } else {
            (self.duplicates_removed as f64 / self.rows_loaded as f64) * 100.0
        }
    }
}
