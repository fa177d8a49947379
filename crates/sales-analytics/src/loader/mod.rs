//! Loading raw sales files into typed frames.
//!
//! Every column is first read as text so that the header can be validated
//! against the declared [`TableSchema`] before any value is interpreted.
//! Numeric and date columns are then parsed cell by cell; a cell that does
//! not parse aborts the load instead of becoming null. A blank date is a
//! parse failure too; other empty cells stay null and are caught by the
//! cleaner's missing-value audit.

mod schema;

pub use schema::{ColumnSpec, SemanticType, TableSchema};

use crate::error::{AnalyticsError, Result, ResultExt};
use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Reads a sales file and types its columns according to a schema.
#[derive(Debug, Clone)]
pub struct SalesLoader {
    schema: TableSchema,
    date_format: String,
}

impl SalesLoader {
    pub fn new(schema: TableSchema, date_format: impl Into<String>) -> Self {
        Self {
            schema,
            date_format: date_format.into(),
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Load and type a CSV file from disk.
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        std::fs::metadata(path)?;

        info!("Loading sales data from: {}", path.display());
        let raw = raw_read_options()
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .context("Failed to open CSV reader")?
            .finish()
            .context("Failed to read CSV file")?;

        self.type_frame(raw)
    }

    /// Load and type CSV content held in memory.
    pub fn load_bytes(&self, bytes: impl Into<Vec<u8>>) -> Result<DataFrame> {
        let raw = raw_read_options()
            .into_reader_with_file_handle(Cursor::new(bytes.into()))
            .finish()
            .context("Failed to read CSV content")?;

        self.type_frame(raw)
    }

    /// Validate a text-only frame against the schema and parse its typed columns.
    pub fn type_frame(&self, df: DataFrame) -> Result<DataFrame> {
        let header: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        self.schema.validate_header(&header)?;

        let mut df = df;
        for (found, spec) in header.iter().zip(self.schema.columns()) {
            if found != &spec.name {
                df.rename(found, spec.name.as_str().into())?;
            }

            let series = df.column(&spec.name)?.as_materialized_series().clone();
            let typed = match spec.kind {
                SemanticType::Integer => parse_integer_column(&series, &spec.name)?,
                SemanticType::Decimal => parse_decimal_column(&series, &spec.name)?,
                SemanticType::Date => {
                    parse_date_column(&series, &spec.name, &self.date_format)?
                }
                SemanticType::Identifier | SemanticType::Categorical | SemanticType::Text => {
                    continue;
                }
            };
            df.replace(&spec.name, typed)?;
        }

        debug!("Typed {} rows x {} columns", df.height(), df.width());
        Ok(df)
    }
}

impl Default for SalesLoader {
    fn default() -> Self {
        Self::new(TableSchema::superstore(), crate::config::DEFAULT_DATE_FORMAT)
    }
}

/// Text-only read: no inference, corrupt bytes decoded lossily.
fn raw_read_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(
            CsvParseOptions::default()
                .with_quote_char(Some(b'"'))
                .with_encoding(CsvEncoding::LossyUtf8),
        )
}

/// Iterate the non-blank cells of a text column, with 1-based data row numbers.
fn parse_cells<T>(
    series: &Series,
    mut parse: impl FnMut(usize, &str) -> Result<T>,
) -> Result<Vec<Option<T>>> {
    let str_series = series.str()?;
    let mut values = Vec::with_capacity(str_series.len());

    for (idx, opt_val) in str_series.into_iter().enumerate() {
        match opt_val.map(str::trim) {
            Some(val) if !val.is_empty() => values.push(Some(parse(idx + 1, val)?)),
            _ => values.push(None),
        }
    }

    Ok(values)
}

fn parse_integer_column(series: &Series, column: &str) -> Result<Series> {
    let values = parse_cells(series, |row, val| {
        val.parse::<i64>().map_err(|_| AnalyticsError::InvalidValue {
            column: column.to_string(),
            row,
            value: val.to_string(),
        })
    })?;
    Ok(Series::new(column.into(), values))
}

fn parse_decimal_column(series: &Series, column: &str) -> Result<Series> {
    let values = parse_cells(series, |row, val| {
        val.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| AnalyticsError::InvalidValue {
                column: column.to_string(),
                row,
                value: val.to_string(),
            })
    })?;
    Ok(Series::new(column.into(), values))
}

/// Dates are never left null: a blank cell fails like any other bad date.
fn parse_date_column(series: &Series, column: &str, format: &str) -> Result<Series> {
    let str_series = series.str()?;
    let mut days = Vec::with_capacity(str_series.len());

    for (idx, opt_val) in str_series.into_iter().enumerate() {
        let val = opt_val.map(str::trim).unwrap_or_default();
        let parsed = NaiveDate::parse_from_str(val, format).map_err(|_| {
            AnalyticsError::DateParseError {
                column: column.to_string(),
                row: idx + 1,
                value: val.to_string(),
                format: format.to_string(),
            }
        })?;
        days.push(days_since_epoch(parsed));
    }

    Ok(Series::new(column.into(), days).cast(&DataType::Date)?)
}

/// Physical representation of a polars `Date`.
pub(crate) fn days_since_epoch(date: NaiveDate) -> i32 {
    date.signed_duration_since(NaiveDate::default()).num_days() as i32
}

pub(crate) fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::default().checked_add_signed(Duration::days(days as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Order ID,Order Date,Quantity,Sales";

    fn small_loader() -> SalesLoader {
        let schema = TableSchema::new(vec![
            ColumnSpec::new("Order ID", SemanticType::Identifier),
            ColumnSpec::new("Order Date", SemanticType::Date),
            ColumnSpec::new("Quantity", SemanticType::Integer),
            ColumnSpec::new("Sales", SemanticType::Decimal),
        ]);
        SalesLoader::new(schema, "%d/%m/%Y")
    }

    #[test]
    fn test_load_bytes_types_columns() {
        let csv = format!("{}\nCA-1,08/11/2016,2,261.96\nCA-2,12/06/2016,3,14.62\n", HEADER);
        let df = small_loader().load_bytes(csv).unwrap();

        assert_eq!(df.shape(), (2, 4));
        assert_eq!(df.column("Order Date").unwrap().dtype(), &DataType::Date);
        assert_eq!(df.column("Quantity").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("Sales").unwrap().dtype(), &DataType::Float64);

        let days = df
            .column("Order Date")
            .unwrap()
            .cast(&DataType::Int32)
            .unwrap();
        let first = days.as_materialized_series().i32().unwrap().get(0).unwrap();
        assert_eq!(
            date_from_days(first),
            NaiveDate::from_ymd_opt(2016, 11, 8)
        );
    }

    #[test]
    fn test_day_month_year_is_not_month_day_year() {
        let csv = format!("{}\nCA-1,25/12/2016,1,10.0\n", HEADER);
        assert!(small_loader().load_bytes(csv).is_ok());

        let csv = format!("{}\nCA-1,12/25/2016,1,10.0\n", HEADER);
        let err = small_loader().load_bytes(csv).unwrap_err();
        assert!(matches!(err, AnalyticsError::DateParseError { row: 1, .. }));
    }

    #[test]
    fn test_schema_mismatch_aborts_load() {
        let csv = "Order ID,Quantity,Order Date,Sales\nCA-1,2,08/11/2016,1.0\n";
        let err = small_loader().load_bytes(csv).unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
    }

    #[test]
    fn test_invalid_number_reports_row() {
        let csv = format!("{}\nCA-1,08/11/2016,2,1.0\nCA-2,08/11/2016,two,1.0\n", HEADER);
        let err = small_loader().load_bytes(csv).unwrap_err();
        match err {
            AnalyticsError::InvalidValue { column, row, value } => {
                assert_eq!(column, "Quantity");
                assert_eq!(row, 2);
                assert_eq!(value, "two");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_date_is_a_parse_error() {
        let csv = format!("{}\nCA-1,08/11/2016,2,1.0\nCA-2,,2,1.0\n", HEADER);
        let err = small_loader().load_bytes(csv).unwrap_err();
        match err {
            AnalyticsError::DateParseError { column, row, value, .. } => {
                assert_eq!(column, "Order Date");
                assert_eq!(row, 2);
                assert_eq!(value, "");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_cells_stay_null() {
        let csv = format!("{}\nCA-1,08/11/2016,,1.0\n", HEADER);
        let df = small_loader().load_bytes(csv).unwrap();
        assert_eq!(df.column("Quantity").unwrap().null_count(), 1);
    }

    #[test]
    fn test_epoch_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2017, 2, 28).unwrap();
        assert_eq!(date_from_days(days_since_epoch(date)), Some(date));
        assert_eq!(days_since_epoch(NaiveDate::default()), 0);
    }
}
