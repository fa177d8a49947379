//! Per-record derived fields.
//!
//! - `retail_price = (total_sale / quantity) / (1 - percent_discount)`
//! - `profit_per_item = total_profit / quantity`
//!
//! Both are undefined for `quantity <= 0` or a discount outside `[0, 1)`.
//! Such records are excluded from the enriched set and reported with their
//! position, never turned into infinities or NaN.

use crate::error::{AnalyticsError, Result};
use crate::types::{EnrichedRecord, SalesRecord};
use serde::Serialize;
use tracing::{debug, warn};

/// A record that could not be enriched.
#[derive(Debug, Serialize)]
pub struct ExcludedRecord {
    /// Position in the enricher's input.
    pub index: usize,
    pub record: SalesRecord,
    pub error: AnalyticsError,
}

/// Output of [`Enricher::enrich`].
#[derive(Debug, Default)]
pub struct Enrichment {
    pub records: Vec<EnrichedRecord>,
    pub excluded: Vec<ExcludedRecord>,
}

impl Enrichment {
    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }
}

/// Derives retail price and per-item profit.
pub struct Enricher;

impl Enricher {
    /// Compute the derived fields of a single record.
    pub fn enrich_record(record: SalesRecord) -> Result<EnrichedRecord> {
        if record.quantity <= 0 {
            return Err(undefined(
                &record,
                format!("quantity is {}", record.quantity),
            ));
        }
        if !(0.0..1.0).contains(&record.percent_discount) {
            return Err(undefined(
                &record,
                format!("discount {} is outside [0, 1)", record.percent_discount),
            ));
        }

        let quantity = record.quantity as f64;
        let retail_price = (record.total_sale / quantity) / (1.0 - record.percent_discount);
        let profit_per_item = record.total_profit / quantity;

        if !retail_price.is_finite() || !profit_per_item.is_finite() {
            return Err(undefined(&record, "non-finite result".to_string()));
        }

        Ok(EnrichedRecord {
            record,
            retail_price,
            profit_per_item,
        })
    }

    /// Enrich every record, isolating failures to the offending record.
    pub fn enrich(records: Vec<SalesRecord>) -> Enrichment {
        let mut enrichment = Enrichment {
            records: Vec::with_capacity(records.len()),
            excluded: Vec::new(),
        };

        for (index, record) in records.into_iter().enumerate() {
            let kept = record.clone();
            match Self::enrich_record(record) {
                Ok(enriched) => enrichment.records.push(enriched),
                Err(error) => {
                    debug!("Excluding record {}: {}", index, error);
                    enrichment.excluded.push(ExcludedRecord {
                        index,
                        record: kept,
                        error,
                    });
                }
            }
        }

        if !enrichment.excluded.is_empty() {
            warn!(
                "Excluded {} records with undefined derived fields",
                enrichment.excluded.len()
            );
        }

        enrichment
    }
}

fn undefined(record: &SalesRecord, reason: String) -> AnalyticsError {
    AnalyticsError::EnrichmentUndefined {
        order_id: record.order_id.clone(),
        product_id: record.product_id.clone(),
        reason,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    /// A record with the given economics; everything else is filler.
    pub(crate) fn record(
        order_id: &str,
        quantity: i64,
        total_sale: f64,
        percent_discount: f64,
        total_profit: f64,
    ) -> SalesRecord {
        SalesRecord {
            order_id: order_id.to_string(),
            order_date: NaiveDate::from_ymd_opt(2016, 11, 8).unwrap(),
            ship_date: NaiveDate::from_ymd_opt(2016, 11, 11).unwrap(),
            ship_mode: "Second Class".to_string(),
            customer_id: "CG-12520".to_string(),
            segment: "Consumer".to_string(),
            region: "South".to_string(),
            state: "Kentucky".to_string(),
            city: "Henderson".to_string(),
            postal_code: "42420".to_string(),
            product_id: "FUR-BO-10001798".to_string(),
            category: "Furniture".to_string(),
            sub_category: "Bookcases".to_string(),
            product_name: "Bush Somerset Collection Bookcase".to_string(),
            quantity,
            total_sale,
            percent_discount,
            total_profit,
        }
    }

    #[test]
    fn test_enrich_record_formulas() {
        let enriched = Enricher::enrich_record(record("CA-1", 2, 100.0, 0.5, -30.0)).unwrap();
        assert_eq!(enriched.retail_price, 100.0);
        assert_eq!(enriched.profit_per_item, -15.0);
    }

    #[test]
    fn test_retail_price_roundtrip() {
        let cases = [
            (2, 261.96, 0.0),
            (3, 731.94, 0.2),
            (5, 957.5775, 0.45),
            (7, 48.86, 0.8),
        ];
        for (quantity, sale, discount) in cases {
            let enriched =
                Enricher::enrich_record(record("CA-1", quantity, sale, discount, 1.0)).unwrap();
            let back = enriched.retail_price * (1.0 - discount) * quantity as f64;
            assert!((back - sale).abs() < 1e-9, "{back} != {sale}");
        }
    }

    #[test]
    fn test_zero_quantity_is_undefined() {
        let err = Enricher::enrich_record(record("CA-1", 0, 10.0, 0.0, 1.0)).unwrap_err();
        assert_eq!(err.error_code(), "ENRICHMENT_UNDEFINED");
    }

    #[test]
    fn test_full_discount_is_undefined() {
        let err = Enricher::enrich_record(record("CA-1", 1, 10.0, 1.0, 1.0)).unwrap_err();
        assert!(err.is_record_level());
    }

    #[test]
    fn test_enrich_excludes_and_counts() {
        let records = vec![
            record("CA-1", 1, 10.0, 0.0, 1.0),
            record("CA-2", 0, 10.0, 0.0, 1.0),
            record("CA-3", 2, 10.0, 1.0, 1.0),
            record("CA-4", 4, 10.0, 0.2, 1.0),
        ];

        let enrichment = Enricher::enrich(records);
        assert_eq!(enrichment.records.len(), 2);
        assert_eq!(enrichment.excluded_count(), 2);

        let excluded: Vec<usize> = enrichment.excluded.iter().map(|e| e.index).collect();
        assert_eq!(excluded, vec![1, 2]);
        assert_eq!(enrichment.records[1].record.order_id, "CA-4");
    }
}
