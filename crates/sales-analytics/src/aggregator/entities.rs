//! Customer and product summaries.
//!
//! Per-entity `profit_margin` is a ratio of sums. Averages of margins across
//! entities live in [`margin_overview`] under their own names.

use super::grouping::{count_distinct, group_reduce, mean, ratio};
use crate::types::{CustomerSummary, EnrichedRecord, MarginOverview, ProductSummary};

/// One summary per customer, most profitable first.
pub fn customer_summaries(records: &[EnrichedRecord]) -> Vec<CustomerSummary> {
    let mut summaries = group_reduce(
        records,
        |r| r.record.customer_id.clone(),
        |customer_id, group| {
            let num_orders = count_distinct(group, |r| r.record.order_id.clone());
            let total_spend: f64 = group.iter().map(|r| r.record.total_sale).sum();
            let total_profit: f64 = group.iter().map(|r| r.record.total_profit).sum();

            CustomerSummary {
                customer_id: customer_id.clone(),
                segment: group
                    .first()
                    .map(|r| r.record.segment.clone())
                    .unwrap_or_default(),
                num_orders,
                num_items: group.iter().map(|r| r.record.quantity).sum(),
                avg_spend_per_order: ratio(total_spend, num_orders as f64),
                avg_discount: mean(group.iter().map(|r| r.record.percent_discount)),
                avg_profit_per_order: ratio(total_profit, num_orders as f64),
                total_spend,
                total_profit,
                profit_margin: ratio(total_profit, total_spend),
            }
        },
    );

    sort_by_total_profit(&mut summaries, |s| s.total_profit);
    summaries
}

/// One summary per (product id, category, sub-category, name), most
/// profitable first.
pub fn product_summaries(records: &[EnrichedRecord]) -> Vec<ProductSummary> {
    let mut summaries = group_reduce(
        records,
        |r| {
            (
                r.record.product_id.clone(),
                r.record.category.clone(),
                r.record.sub_category.clone(),
                r.record.product_name.clone(),
            )
        },
        |(product_id, category, sub_category, product_name), group| {
            let total_spent: f64 = group.iter().map(|r| r.record.total_sale).sum();
            let total_profit: f64 = group.iter().map(|r| r.record.total_profit).sum();

            ProductSummary {
                product_id: product_id.clone(),
                category: category.clone(),
                sub_category: sub_category.clone(),
                product_name: product_name.clone(),
                retail_price: mean(group.iter().map(|r| r.retail_price)),
                total_sold: group.iter().map(|r| r.record.quantity).sum(),
                num_orders: count_distinct(group, |r| r.record.order_id.clone()),
                total_spent,
                avg_discount: mean(group.iter().map(|r| r.record.percent_discount)),
                avg_profit_per_item: mean(group.iter().map(|r| r.profit_per_item)),
                total_profit,
                profit_margin: ratio(total_profit, total_spent),
            }
        },
    );

    sort_by_total_profit(&mut summaries, |s| s.total_profit);
    summaries
}

/// Descending by profit; equal profits keep their relative order.
pub fn sort_by_total_profit<T>(rows: &mut [T], profit: impl Fn(&T) -> f64) {
    rows.sort_by(|a, b| profit(b).total_cmp(&profit(a)));
}

/// Profit margin under both conventions.
pub fn margin_overview(
    records: &[EnrichedRecord],
    customers: &[CustomerSummary],
    products: &[ProductSummary],
) -> MarginOverview {
    let total_sale: f64 = records.iter().map(|r| r.record.total_sale).sum();
    let total_profit: f64 = records.iter().map(|r| r.record.total_profit).sum();

    MarginOverview {
        overall_margin: ratio(total_profit, total_sale),
        mean_customer_margin: mean(customers.iter().map(|c| c.profit_margin)),
        mean_product_margin: mean(products.iter().map(|p| p.profit_margin)),
        total_sale,
        total_profit,
    }
}
