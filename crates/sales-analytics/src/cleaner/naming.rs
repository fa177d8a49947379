//! Column label normalization.

use crate::error::Result;
use polars::prelude::*;
use tracing::debug;

/// Convert a display label into a lower-case, underscore-separated identifier.
///
/// Whitespace runs become a single underscore. Other punctuation is kept,
/// which is why hyphenated labels need an explicit rename.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Canonical name for `label`: an explicit rename wins over normalization.
pub fn canonical_label(label: &str, renames: &[(String, String)]) -> String {
    renames
        .iter()
        .find(|(from, _)| from == label.trim())
        .map(|(_, to)| to.clone())
        .unwrap_or_else(|| normalize_label(label))
}

/// Rename every column of `df` to its canonical label.
///
/// Returns the `(old, new)` pairs that actually changed.
pub(crate) fn normalize_column_names(
    df: &mut DataFrame,
    renames: &[(String, String)],
) -> Result<Vec<(String, String)>> {
    let current: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    let mut changed = Vec::new();
    for name in current {
        let canonical = canonical_label(&name, renames);
        if canonical != name {
            df.rename(&name, canonical.as_str().into())?;
            debug!("Renamed column '{}' -> '{}'", name, canonical);
            changed.push((name, canonical));
        }
    }

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_column_renames;

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("Order ID"), "order_id");
        assert_eq!(normalize_label("  Ship   Mode "), "ship_mode");
        assert_eq!(normalize_label("Sub-Category"), "sub-category");
        assert_eq!(normalize_label("order_id"), "order_id");
    }

    #[test]
    fn test_canonical_label_prefers_renames() {
        let renames = default_column_renames();
        assert_eq!(canonical_label("Sub-Category", &renames), "sub_category");
        assert_eq!(canonical_label("Sales", &renames), "total_sale");
        assert_eq!(canonical_label("Discount", &renames), "percent_discount");
        assert_eq!(canonical_label("Postal Code", &renames), "postal_code");
        // Already canonical labels are stable
        assert_eq!(canonical_label("total_profit", &renames), "total_profit");
    }

    #[test]
    fn test_normalize_column_names() {
        let mut df = df![
            "Order ID" => ["CA-1"],
            "Sub-Category" => ["Chairs"],
            "Profit" => [1.5],
        ]
        .unwrap();

        let changed = normalize_column_names(&mut df, &default_column_renames()).unwrap();
        assert_eq!(changed.len(), 3);

        let names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["order_id", "sub_category", "total_profit"]);

        // Second pass changes nothing
        let changed = normalize_column_names(&mut df, &default_column_renames()).unwrap();
        assert!(changed.is_empty());
    }
}
