//! Repair of encoding damage in free-text columns.

use crate::error::Result;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use tracing::debug;

/// Runs of the replacement character or C1 control characters.
///
/// Invalid UTF-8 is decoded lossily to U+FFFD at load time; Latin-1 bytes
/// mis-read as code points land in U+0080..U+009F.
static CORRUPTION_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x{FFFD}\x{0080}-\x{009F}]+").expect("valid marker pattern"));

/// Replace every run of corruption markers with a single space.
pub fn repair_text(value: &str) -> String {
    CORRUPTION_MARKERS.replace_all(value, " ").into_owned()
}

/// Check whether a value contains any corruption marker.
pub fn has_corruption(value: &str) -> bool {
    CORRUPTION_MARKERS.is_match(value)
}

/// Repair a text column in place. Returns how many values changed.
pub(crate) fn repair_text_column(df: &mut DataFrame, column: &str) -> Result<usize> {
    let series = df.column(column)?.as_materialized_series();
    let str_series = series.str()?;

    let mut repaired = 0;
    let mut values = Vec::with_capacity(str_series.len());
    for opt_val in str_series.into_iter() {
        match opt_val {
            Some(val) if has_corruption(val) => {
                repaired += 1;
                values.push(Some(repair_text(val)));
            }
            Some(val) => values.push(Some(val.to_string())),
            None => values.push(None),
        }
    }

    if repaired > 0 {
        df.replace(column, Series::new(column.into(), values))?;
        debug!("Repaired {} values in column '{}'", repaired, column);
    }

    Ok(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repair_text_replacement_char() {
        assert_eq!(
            repair_text("Eldon Base for stackable storage shelf\u{FFFD}\u{FFFD}platinum"),
            "Eldon Base for stackable storage shelf platinum"
        );
    }

    #[test]
    fn test_repair_text_c1_controls() {
        assert_eq!(repair_text("Bush Westfield\u{0092}s Chair"), "Bush Westfield s Chair");
    }

    #[test]
    fn test_repair_text_leaves_clean_values() {
        let clean = "Xerox 1967, Blue Paper";
        assert!(!has_corruption(clean));
        assert_eq!(repair_text(clean), clean);
        // Non-ASCII text that is not damage is untouched
        assert_eq!(repair_text("Café Table"), "Café Table");
    }

    #[test]
    fn test_repair_text_column_counts_changes() {
        let mut df = df![
            "Product Name" => ["Good", "Bad\u{FFFD}Name", "Fine"],
        ]
        .unwrap();

        let repaired = repair_text_column(&mut df, "Product Name").unwrap();
        assert_eq!(repaired, 1);

        let col = df.column("Product Name").unwrap();
        let values: Vec<Option<&str>> = col
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some("Good"), Some("Bad Name"), Some("Fine")]);

        assert_eq!(repair_text_column(&mut df, "Product Name").unwrap(), 0);
    }
}
