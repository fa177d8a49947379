//! Typed rows → polars frames.

use crate::error::Result;
use crate::loader::days_since_epoch;
use crate::types::{CustomerSummary, EnrichedRecord, PeriodShare, ProductSummary, TimeBucket};
use chrono::NaiveDate;
use polars::prelude::*;

fn text<'a, T: 'a>(
    name: &str,
    rows: impl IntoIterator<Item = &'a T>,
    get: impl Fn(&'a T) -> &'a str,
) -> Column {
    let values: Vec<&str> = rows.into_iter().map(get).collect();
    Column::new(name.into(), values)
}

fn float<'a, T: 'a>(
    name: &str,
    rows: impl IntoIterator<Item = &'a T>,
    get: impl Fn(&'a T) -> f64,
) -> Column {
    let values: Vec<f64> = rows.into_iter().map(get).collect();
    Column::new(name.into(), values)
}

fn count<'a, T: 'a>(
    name: &str,
    rows: impl IntoIterator<Item = &'a T>,
    get: impl Fn(&'a T) -> i64,
) -> Column {
    let values: Vec<i64> = rows.into_iter().map(get).collect();
    Column::new(name.into(), values)
}

fn date<'a, T: 'a>(
    name: &str,
    rows: impl IntoIterator<Item = &'a T>,
    get: impl Fn(&'a T) -> NaiveDate,
) -> Result<Column> {
    let days: Vec<i32> = rows.into_iter().map(|r| days_since_epoch(get(r))).collect();
    let series = Series::new(name.into(), days).cast(&DataType::Date)?;
    Ok(Column::from(series))
}

/// Customer table, one row per summary.
pub fn customers_frame(rows: &[CustomerSummary]) -> Result<DataFrame> {
    let columns = vec![
        text("customer_id", rows, |r| r.customer_id.as_str()),
        text("segment", rows, |r| r.segment.as_str()),
        count("num_orders", rows, |r| r.num_orders as i64),
        count("num_items", rows, |r| r.num_items),
        float("avg_spend_per_order", rows, |r| r.avg_spend_per_order),
        float("avg_discount", rows, |r| r.avg_discount),
        float("avg_profit_per_order", rows, |r| r.avg_profit_per_order),
        float("total_spend", rows, |r| r.total_spend),
        float("total_profit", rows, |r| r.total_profit),
        float("profit_margin", rows, |r| r.profit_margin),
    ];
    Ok(DataFrame::new(columns)?)
}

/// Product table, one row per summary.
pub fn products_frame(rows: &[ProductSummary]) -> Result<DataFrame> {
    let columns = vec![
        text("product_id", rows, |r| r.product_id.as_str()),
        text("category", rows, |r| r.category.as_str()),
        text("sub_category", rows, |r| r.sub_category.as_str()),
        text("product_name", rows, |r| r.product_name.as_str()),
        float("retail_price", rows, |r| r.retail_price),
        count("total_sold", rows, |r| r.total_sold),
        count("num_orders", rows, |r| r.num_orders as i64),
        float("total_spent", rows, |r| r.total_spent),
        float("avg_discount", rows, |r| r.avg_discount),
        float("avg_profit_per_item", rows, |r| r.avg_profit_per_item),
        float("total_profit", rows, |r| r.total_profit),
        float("profit_margin", rows, |r| r.profit_margin),
    ];
    Ok(DataFrame::new(columns)?)
}

/// Time buckets; the `dimension` column is present only for split series.
pub fn time_series_frame(rows: &[TimeBucket]) -> Result<DataFrame> {
    let mut columns = vec![date("period_start", rows, |r| r.period_start)?];

    if rows.iter().any(|r| r.dimension.is_some()) {
        columns.push(text("dimension", rows, |r| {
            r.dimension.as_deref().unwrap_or_default()
        }));
    }

    columns.extend([
        count("orders", rows, |r| r.orders as i64),
        float("total_sale", rows, |r| r.total_sale),
        float("total_profit", rows, |r| r.total_profit),
        float("profit_margin", rows, |r| r.profit_margin),
        float("avg_discount", rows, |r| r.avg_discount),
    ]);
    Ok(DataFrame::new(columns)?)
}

/// Per-period shares of each dimension value.
pub fn shares_frame(rows: &[PeriodShare]) -> Result<DataFrame> {
    let columns = vec![
        date("period_start", rows, |r| r.period_start)?,
        text("dimension", rows, |r| r.dimension.as_str()),
        float("sale_share", rows, |r| r.sale_share),
        float("order_share", rows, |r| r.order_share),
    ];
    Ok(DataFrame::new(columns)?)
}

/// Enriched line items with their derived fields.
pub fn records_frame(rows: &[EnrichedRecord]) -> Result<DataFrame> {
    let columns = vec![
        text("order_id", rows, |r| r.record.order_id.as_str()),
        date("order_date", rows, |r| r.record.order_date)?,
        date("ship_date", rows, |r| r.record.ship_date)?,
        text("ship_mode", rows, |r| r.record.ship_mode.as_str()),
        text("customer_id", rows, |r| r.record.customer_id.as_str()),
        text("segment", rows, |r| r.record.segment.as_str()),
        text("region", rows, |r| r.record.region.as_str()),
        text("state", rows, |r| r.record.state.as_str()),
        text("city", rows, |r| r.record.city.as_str()),
        text("postal_code", rows, |r| r.record.postal_code.as_str()),
        text("product_id", rows, |r| r.record.product_id.as_str()),
        text("category", rows, |r| r.record.category.as_str()),
        text("sub_category", rows, |r| r.record.sub_category.as_str()),
        text("product_name", rows, |r| r.record.product_name.as_str()),
        count("quantity", rows, |r| r.record.quantity),
        float("total_sale", rows, |r| r.record.total_sale),
        float("percent_discount", rows, |r| r.record.percent_discount),
        float("total_profit", rows, |r| r.record.total_profit),
        float("retail_price", rows, |r| r.retail_price),
        float("profit_per_item", rows, |r| r.profit_per_item),
    ];
    Ok(DataFrame::new(columns)?)
}
