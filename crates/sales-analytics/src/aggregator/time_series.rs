//! Time-bucketed aggregation for trend and proportion-over-time views.

use super::grouping::{count_distinct, group_reduce, mean, partition, ratio};
use crate::types::{Dimension, EnrichedRecord, Period, PeriodShare, TimeBucket};

/// Sum orders, sales and profit per period, optionally split by a dimension.
///
/// Buckets are ordered by period start, then by dimension value.
pub fn time_series(
    records: &[EnrichedRecord],
    period: Period,
    dimension: Option<Dimension>,
) -> Vec<TimeBucket> {
    let mut buckets = group_reduce(
        records,
        |r| {
            (
                period.truncate(r.record.order_date),
                dimension.map(|d| d.value(&r.record).to_string()),
            )
        },
        |(period_start, dimension_value), group| {
            let total_sale: f64 = group.iter().map(|r| r.record.total_sale).sum();
            let total_profit: f64 = group.iter().map(|r| r.record.total_profit).sum();
            TimeBucket {
                period,
                period_start: *period_start,
                dimension: dimension_value.clone(),
                orders: count_distinct(group, |r| r.record.order_id.clone()),
                total_sale,
                total_profit,
                profit_margin: ratio(total_profit, total_sale),
                avg_discount: mean(group.iter().map(|r| r.record.percent_discount)),
            }
        },
    );

    buckets.sort_by(|a, b| {
        a.period_start
            .cmp(&b.period_start)
            .then_with(|| a.dimension.cmp(&b.dimension))
    });
    buckets
}

/// Each dimension value's share of its period's sales and orders.
///
/// Input rows without a dimension are ignored.
pub fn period_shares(buckets: &[TimeBucket]) -> Vec<PeriodShare> {
    let split: Vec<&TimeBucket> = buckets.iter().filter(|b| b.dimension.is_some()).collect();

    let mut shares = Vec::with_capacity(split.len());
    for (period_start, group) in partition(&split, |b| b.period_start) {
        let period_sale: f64 = group.iter().map(|b| b.total_sale).sum();
        let period_orders: usize = group.iter().map(|b| b.orders).sum();

        for bucket in group {
            shares.push(PeriodShare {
                period_start,
                dimension: bucket.dimension.clone().unwrap_or_default(),
                sale_share: ratio(bucket.total_sale, period_sale),
                order_share: ratio(bucket.orders as f64, period_orders as f64),
            });
        }
    }

    shares
}
