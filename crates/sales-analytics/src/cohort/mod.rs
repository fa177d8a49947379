//! Cohort selection by the mean ± k·stddev rule.
//!
//! For a numeric field `F` over a whole table, with `μ = mean(F)` and `σ`
//! the sample standard deviation:
//!
//! - top cohort: rows with `F > μ + k·σ`
//! - bottom cohort: rows with `F < μ − k·σ`
//!
//! The threshold is recomputed on every call from the table passed in.
//! When `σ = 0` or the table has fewer than two rows, no row can qualify and
//! the cohort comes back empty with `degenerate` set; this is not an error.

pub mod statistics;

use crate::config::CohortConfig;
use crate::error::{AnalyticsError, Result};
use crate::types::{CustomerSummary, ProductSummary, TimeBucket};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Numeric fields of a table row, addressable by name.
pub trait NumericFields {
    /// Table name used in error messages.
    const TABLE: &'static str;

    /// Names accepted by [`NumericFields::numeric`].
    const FIELDS: &'static [&'static str];

    /// Value of `field`, or `None` if the row has no such numeric field.
    fn numeric(&self, field: &str) -> Option<f64>;
}

impl NumericFields for CustomerSummary {
    const TABLE: &'static str = "customer_summary";
    const FIELDS: &'static [&'static str] = &[
        "num_orders",
        "num_items",
        "avg_spend_per_order",
        "avg_discount",
        "avg_profit_per_order",
        "total_spend",
        "total_profit",
        "profit_margin",
    ];

    fn numeric(&self, field: &str) -> Option<f64> {
        match field {
            "num_orders" => Some(self.num_orders as f64),
            "num_items" => Some(self.num_items as f64),
            "avg_spend_per_order" => Some(self.avg_spend_per_order),
            "avg_discount" => Some(self.avg_discount),
            "avg_profit_per_order" => Some(self.avg_profit_per_order),
            "total_spend" => Some(self.total_spend),
            "total_profit" => Some(self.total_profit),
            "profit_margin" => Some(self.profit_margin),
            _ => None,
        }
    }
}

impl NumericFields for ProductSummary {
    const TABLE: &'static str = "product_summary";
    const FIELDS: &'static [&'static str] = &[
        "retail_price",
        "total_sold",
        "num_orders",
        "total_spent",
        "avg_discount",
        "avg_profit_per_item",
        "total_profit",
        "profit_margin",
    ];

    fn numeric(&self, field: &str) -> Option<f64> {
        match field {
            "retail_price" => Some(self.retail_price),
            "total_sold" => Some(self.total_sold as f64),
            "num_orders" => Some(self.num_orders as f64),
            "total_spent" => Some(self.total_spent),
            "avg_discount" => Some(self.avg_discount),
            "avg_profit_per_item" => Some(self.avg_profit_per_item),
            "total_profit" => Some(self.total_profit),
            "profit_margin" => Some(self.profit_margin),
            _ => None,
        }
    }
}

impl NumericFields for TimeBucket {
    const TABLE: &'static str = "time_bucket";
    const FIELDS: &'static [&'static str] = &[
        "orders",
        "total_sale",
        "total_profit",
        "profit_margin",
        "avg_discount",
    ];

    fn numeric(&self, field: &str) -> Option<f64> {
        match field {
            "orders" => Some(self.orders as f64),
            "total_sale" => Some(self.total_sale),
            "total_profit" => Some(self.total_profit),
            "profit_margin" => Some(self.profit_margin),
            "avg_discount" => Some(self.avg_discount),
            _ => None,
        }
    }
}

/// Which tail of the distribution a cohort takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// `F > μ + k·σ`
    Top,
    /// `F < μ − k·σ`
    Bottom,
}

/// Field, multiplier and direction for one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortRule {
    pub field: String,
    pub k: f64,
    pub direction: Direction,
}

impl CohortRule {
    pub fn new(field: impl Into<String>, k: f64, direction: Direction) -> Self {
        Self {
            field: field.into(),
            k,
            direction,
        }
    }

    /// Top-cohort rule of a configured table.
    pub fn top(config: &CohortConfig) -> Self {
        Self::new(config.field.clone(), config.top_k, Direction::Top)
    }

    /// Bottom-cohort rule of a configured table.
    pub fn bottom(config: &CohortConfig) -> Self {
        Self::new(config.field.clone(), config.bottom_k, Direction::Bottom)
    }
}

/// The statistics a cohort was cut with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub mean: f64,
    pub std_dev: f64,
    /// `mean ± k·std_dev`, depending on direction.
    pub bound: f64,
    pub k: f64,
    pub direction: Direction,
}

impl Threshold {
    fn new(mean: f64, std_dev: f64, k: f64, direction: Direction) -> Self {
        let bound = match direction {
            Direction::Top => mean + k * std_dev,
            Direction::Bottom => mean - k * std_dev,
        };
        Self {
            mean,
            std_dev,
            bound,
            k,
            direction,
        }
    }

    /// Whether `value` lies strictly beyond the bound.
    pub fn admits(&self, value: f64) -> bool {
        match self.direction {
            Direction::Top => value > self.bound,
            Direction::Bottom => value < self.bound,
        }
    }
}

/// Rows selected from a table, in table order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cohort<T> {
    pub rows: Vec<T>,
    pub threshold: Threshold,
    /// Zero variance or fewer than two rows; `rows` is empty.
    pub degenerate: bool,
}

impl<T> Cohort<T> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Selects top and bottom cohorts from summary tables.
pub struct CohortSelector;

impl CohortSelector {
    /// Select rows by a named numeric field.
    pub fn select<T>(rows: &[T], rule: &CohortRule) -> Result<Cohort<T>>
    where
        T: NumericFields + Clone,
    {
        if !T::FIELDS.contains(&rule.field.as_str()) {
            return Err(AnalyticsError::UnknownField {
                field: rule.field.clone(),
                table: T::TABLE,
            });
        }

        let field = rule.field.as_str();
        Self::select_by(
            rows,
            |row| row.numeric(field).unwrap_or(f64::NAN),
            rule.k,
            rule.direction,
        )
    }

    /// Select rows by a value extracted with `value`.
    pub fn select_by<T, F>(rows: &[T], value: F, k: f64, direction: Direction) -> Result<Cohort<T>>
    where
        T: Clone,
        F: Fn(&T) -> f64,
    {
        if !k.is_finite() || k <= 0.0 {
            return Err(AnalyticsError::InvalidConfig(format!(
                "cohort multiplier must be finite and greater than 0, got {}",
                k
            )));
        }

        let values: Vec<f64> = rows.iter().map(&value).collect();
        let mean = statistics::mean(&values).unwrap_or(0.0);

        // Rounding leaves a tiny nonzero sigma on equal floats, so test the values
        let constant = values.windows(2).all(|w| w[0] == w[1]);
        let std_dev = if constant {
            0.0
        } else {
            statistics::sample_std(&values)
        };
        let threshold = Threshold::new(mean, std_dev, k, direction);

        if values.len() < 2 || constant {
            warn!(
                "Degenerate cohort ({:?}): {} rows, std dev {}",
                direction,
                values.len(),
                std_dev
            );
            return Ok(Cohort {
                rows: Vec::new(),
                threshold,
                degenerate: true,
            });
        }

        let selected: Vec<T> = rows
            .iter()
            .zip(&values)
            .filter(|(_, v)| threshold.admits(**v))
            .map(|(row, _)| row.clone())
            .collect();

        debug!(
            "Cohort {:?}: mean={:.4}, std={:.4}, bound={:.4}, {} of {} rows",
            direction,
            mean,
            std_dev,
            threshold.bound,
            selected.len(),
            rows.len()
        );

        Ok(Cohort {
            rows: selected,
            threshold,
            degenerate: false,
        })
    }
}

/// Summary of a cohort for top-vs-bottom comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortStats {
    pub count: usize,
    pub mean_avg_discount: f64,
    pub mean_profit_margin: f64,
    pub total_profit: f64,
    pub degenerate: bool,
}

impl CohortStats {
    pub fn of<T: NumericFields>(cohort: &Cohort<T>) -> Self {
        let column = |field: &str| -> Vec<f64> {
            cohort
                .rows
                .iter()
                .filter_map(|row| row.numeric(field))
                .collect()
        };

        Self {
            count: cohort.len(),
            mean_avg_discount: statistics::mean(&column("avg_discount")).unwrap_or(0.0),
            mean_profit_margin: statistics::mean(&column("profit_margin")).unwrap_or(0.0),
            total_profit: column("total_profit").iter().sum(),
            degenerate: cohort.degenerate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::customer_summaries;
    use crate::enricher::Enricher;
    use crate::enricher::tests::record;

    fn values(v: &[f64]) -> Vec<f64> {
        v.to_vec()
    }

    #[test]
    fn test_outlier_selected_on_top_only() {
        let table = values(&[1.0, 1.0, 1.0, 1.0, 100.0]);

        let top = CohortSelector::select_by(&table, |v| *v, 1.0, Direction::Top).unwrap();
        let bottom = CohortSelector::select_by(&table, |v| *v, 1.0, Direction::Bottom).unwrap();

        // mean 20.8, sample variance 1960.2
        let std_dev = 1960.2_f64.sqrt();
        assert!((top.threshold.mean - 20.8).abs() < 1e-12);
        assert!((top.threshold.std_dev - std_dev).abs() < 1e-9);
        assert!((top.threshold.bound - (20.8 + std_dev)).abs() < 1e-9);

        assert_eq!(top.rows, vec![100.0]);
        assert!(bottom.is_empty());
        assert!(!bottom.degenerate);
    }

    #[test]
    fn test_equal_values_give_empty_cohorts() {
        let table = values(&[7.0, 7.0, 7.0, 7.0]);

        for direction in [Direction::Top, Direction::Bottom] {
            let cohort = CohortSelector::select_by(&table, |v| *v, 2.0, direction).unwrap();
            assert!(cohort.is_empty());
            assert!(cohort.degenerate);
            assert_eq!(cohort.threshold.std_dev, 0.0);
        }
    }

    #[test]
    fn test_equal_inexact_values_are_degenerate() {
        // 0.1 has no exact binary form; the computed mean is one ulp off
        for len in [3, 6] {
            let table = vec![0.1; len];
            for k in [0.05, 0.5, 2.0] {
                for direction in [Direction::Top, Direction::Bottom] {
                    let cohort = CohortSelector::select_by(&table, |v| *v, k, direction).unwrap();
                    assert!(cohort.is_empty(), "len {len}, k {k}, {direction:?}");
                    assert!(cohort.degenerate);
                    assert_eq!(cohort.threshold.std_dev, 0.0);
                }
            }
        }
    }

    #[test]
    fn test_single_row_is_degenerate() {
        let cohort = CohortSelector::select_by(&[5.0], |v| *v, 1.0, Direction::Top).unwrap();
        assert!(cohort.degenerate);

        let empty: [f64; 0] = [];
        let cohort = CohortSelector::select_by(&empty, |v| *v, 1.0, Direction::Top).unwrap();
        assert!(cohort.degenerate);
    }

    #[test]
    fn test_bottom_keeps_table_order() {
        let table = values(&[-50.0, 10.0, 11.0, 9.0, 10.0, -60.0, 12.0]);
        let bottom = CohortSelector::select_by(&table, |v| *v, 0.5, Direction::Bottom).unwrap();
        assert_eq!(bottom.rows, vec![-50.0, -60.0]);
    }

    #[test]
    fn test_invalid_multiplier() {
        let err = CohortSelector::select_by(&[1.0, 2.0], |v| *v, 0.0, Direction::Top).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_select_by_field_name() {
        let mut rows = Vec::new();
        for (i, profit) in [5.0, 6.0, 5.0, 4.0, 500.0].iter().enumerate() {
            let mut r = record(&format!("CA-{}", i), 1, 100.0, 0.0, *profit);
            r.customer_id = format!("C-{}", i);
            rows.push(r);
        }
        let customers = customer_summaries(&Enricher::enrich(rows).records);

        let rule = CohortRule::new("total_profit", 1.0, Direction::Top);
        let top = CohortSelector::select(&customers, &rule).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top.rows[0].customer_id, "C-4");

        let stats = CohortStats::of(&top);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.total_profit, 500.0);
        assert_eq!(stats.mean_profit_margin, 5.0);
    }

    #[test]
    fn test_unknown_field() {
        let customers: Vec<CustomerSummary> = Vec::new();
        let rule = CohortRule::new("segment", 2.0, Direction::Top);
        let err = CohortSelector::select(&customers, &rule).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::UnknownField { table: "customer_summary", .. }
        ));
    }

    #[test]
    fn test_rules_from_config() {
        let config = CohortConfig::default();
        assert_eq!(CohortRule::top(&config).k, 2.0);
        assert_eq!(CohortRule::bottom(&config).k, 1.5);
        assert_eq!(CohortRule::bottom(&config).direction, Direction::Bottom);
    }

    #[test]
    fn test_every_listed_field_resolves() {
        let rows = vec![record("CA-1", 2, 100.0, 0.5, 10.0)];
        let enriched = Enricher::enrich(rows).records;
        let customer = &customer_summaries(&enriched)[0];
        for field in CustomerSummary::FIELDS {
            assert!(customer.numeric(field).is_some(), "{field}");
        }
    }
}
