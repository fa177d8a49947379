//! Declared column schema for the raw sales file.

use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};

/// Semantic type of a source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    /// Opaque key (order id, customer id, postal code)
    Identifier,
    /// Low-cardinality label
    Categorical,
    /// Free text that may carry encoding damage
    Text,
    /// Day/month/year text parsed into a calendar date
    Date,
    Integer,
    Decimal,
}

/// One `(name, type)` entry of a [`TableSchema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: SemanticType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: SemanticType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered column declarations, validated against the header at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<ColumnSpec>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    /// The 21-column Superstore sales layout.
    pub fn superstore() -> Self {
        use SemanticType::*;

        let columns = [
            ("Row ID", Integer),
            ("Order ID", Identifier),
            ("Order Date", Date),
            ("Ship Date", Date),
            ("Ship Mode", Categorical),
            ("Customer ID", Identifier),
            ("Customer Name", Text),
            ("Segment", Categorical),
            ("Country", Categorical),
            ("City", Categorical),
            ("State", Categorical),
            ("Postal Code", Identifier),
            ("Region", Categorical),
            ("Product ID", Identifier),
            ("Category", Categorical),
            ("Sub-Category", Categorical),
            ("Product Name", Text),
            ("Sales", Decimal),
            ("Quantity", Integer),
            ("Discount", Decimal),
            ("Profit", Decimal),
        ]
        .into_iter()
        .map(|(name, kind)| ColumnSpec::new(name, kind))
        .collect();

        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Names of the free-text columns.
    pub fn text_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == SemanticType::Text)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Check that `header` names exactly the declared columns, in order.
    ///
    /// Surrounding whitespace in header cells is ignored.
    pub fn validate_header(&self, header: &[String]) -> Result<()> {
        let matches = header.len() == self.columns.len()
            && header
                .iter()
                .zip(&self.columns)
                .all(|(found, spec)| found.trim() == spec.name);

        if matches {
            Ok(())
        } else {
            Err(AnalyticsError::SchemaMismatch {
                expected: self.columns.len(),
                found: header.len(),
                expected_names: self.names(),
                found_names: header.to_vec(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_superstore_schema_shape() {
        let schema = TableSchema::superstore();
        assert_eq!(schema.len(), 21);
        assert_eq!(schema.columns()[2].kind, SemanticType::Date);
        assert_eq!(schema.text_columns(), vec!["Customer Name", "Product Name"]);
    }

    #[test]
    fn test_validate_header_accepts_padded_names() {
        let schema = TableSchema::new(vec![
            ColumnSpec::new("Order ID", SemanticType::Identifier),
            ColumnSpec::new("Sales", SemanticType::Decimal),
        ]);
        assert!(schema.validate_header(&header(&[" Order ID", "Sales "])).is_ok());
    }

    #[test]
    fn test_validate_header_rejects_wrong_order() {
        let schema = TableSchema::new(vec![
            ColumnSpec::new("Order ID", SemanticType::Identifier),
            ColumnSpec::new("Sales", SemanticType::Decimal),
        ]);
        let err = schema
            .validate_header(&header(&["Sales", "Order ID"]))
            .unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
    }

    #[test]
    fn test_validate_header_rejects_wrong_count() {
        let schema = TableSchema::superstore();
        let err = schema.validate_header(&header(&["Row ID"])).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::SchemaMismatch {
                expected: 21,
                found: 1,
                ..
            }
        ));
    }
}
