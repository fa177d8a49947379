//! Conversion of a cleaned frame into typed [`SalesRecord`] rows.
//!
//! The frame must carry the canonical column labels produced by the
//! cleaner. Nulls are rejected here as well, so records can never be built
//! from a frame that skipped the missing-value audit.

use crate::cleaner::canonical_label;
use crate::error::{AnalyticsError, Result};
use crate::loader::date_from_days;
use crate::types::SalesRecord;
use chrono::NaiveDate;
use polars::prelude::*;

fn series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| AnalyticsError::ColumnNotFound(name.to_string()))
}

fn missing(name: &str, series: &Series) -> AnalyticsError {
    AnalyticsError::MissingValueDetected {
        column: name.to_string(),
        count: series.null_count(),
    }
}

fn text_values(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let series = series(df, name)?;
    let cast = series.cast(&DataType::String)?;
    cast.str()?
        .into_iter()
        .map(|v| v.map(str::to_string).ok_or_else(|| missing(name, series)))
        .collect()
}

fn integer_values(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    let series = series(df, name)?;
    let cast = series.cast(&DataType::Int64)?;
    cast.i64()?
        .into_iter()
        .map(|v| v.ok_or_else(|| missing(name, series)))
        .collect()
}

fn decimal_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = series(df, name)?;
    let cast = series.cast(&DataType::Float64)?;
    cast.f64()?
        .into_iter()
        .map(|v| v.ok_or_else(|| missing(name, series)))
        .collect()
}

fn date_values(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>> {
    let series = series(df, name)?;
    if series.dtype() != &DataType::Date {
        return Err(AnalyticsError::InvalidValue {
            column: name.to_string(),
            row: 0,
            value: format!("column of type {}", series.dtype()),
        });
    }
    let cast = series.cast(&DataType::Int32)?;
    cast.i32()?
        .into_iter()
        .map(|v| v.and_then(date_from_days).ok_or_else(|| missing(name, series)))
        .collect()
}

/// Build one [`SalesRecord`] per frame row, in row order.
///
/// Columns are looked up under the labels the cleaner gave them, i.e. each
/// source label passed through `renames` and then normalized.
pub fn records_from_frame(
    df: &DataFrame,
    renames: &[(String, String)],
) -> Result<Vec<SalesRecord>> {
    let label = |source: &str| canonical_label(source, renames);

    let order_id = text_values(df, &label("Order ID"))?;
    let order_date = date_values(df, &label("Order Date"))?;
    let ship_date = date_values(df, &label("Ship Date"))?;
    let ship_mode = text_values(df, &label("Ship Mode"))?;
    let customer_id = text_values(df, &label("Customer ID"))?;
    let segment = text_values(df, &label("Segment"))?;
    let region = text_values(df, &label("Region"))?;
    let state = text_values(df, &label("State"))?;
    let city = text_values(df, &label("City"))?;
    let postal_code = text_values(df, &label("Postal Code"))?;
    let product_id = text_values(df, &label("Product ID"))?;
    let category = text_values(df, &label("Category"))?;
    let sub_category = text_values(df, &label("Sub-Category"))?;
    let product_name = text_values(df, &label("Product Name"))?;
    let quantity = integer_values(df, &label("Quantity"))?;
    let total_sale = decimal_values(df, &label("Sales"))?;
    let percent_discount = decimal_values(df, &label("Discount"))?;
    let total_profit = decimal_values(df, &label("Profit"))?;

    let records = (0..df.height())
        .map(|i| SalesRecord {
            order_id: order_id[i].clone(),
            order_date: order_date[i],
            ship_date: ship_date[i],
            ship_mode: ship_mode[i].clone(),
            customer_id: customer_id[i].clone(),
            segment: segment[i].clone(),
            region: region[i].clone(),
            state: state[i].clone(),
            city: city[i].clone(),
            postal_code: postal_code[i].clone(),
            product_id: product_id[i].clone(),
            category: category[i].clone(),
            sub_category: sub_category[i].clone(),
            product_name: product_name[i].clone(),
            quantity: quantity[i],
            total_sale: total_sale[i],
            percent_discount: percent_discount[i],
            total_profit: total_profit[i],
        })
        .collect();

    Ok(records)
}
