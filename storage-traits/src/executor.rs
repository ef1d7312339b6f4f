//! Prepared-statement executor trait and its exchange types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;

/// Table-name prefix token carried by statement templates.
///
/// Catalog statements never hard-code table names; executors replace
/// this token with their configured prefix before preparing.
pub const PREFIX_TOKEN: &str = "*PREFIX*";

/// One result row, keyed by column name.
pub type SqlRow = HashMap<String, SqlValue>;

/// Value bound to a statement parameter or read from a result column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Real(r) => Some(*r),
            SqlValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match self {
            SqlValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            SqlValue::Blob(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

/// Executor the catalog layer runs its statements against.
///
/// Statements use positional `?` parameters, bound in order from
/// `params`. Implementations own pooling and prefix substitution; row
/// order is whatever the statement's ORDER BY produced.
#[async_trait::async_trait]
pub trait StorageExecutor: Send + Sync {
    /// Run a read statement and return all matching rows.
    async fn query(&self, statement: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>>;

    /// Run a read statement expected to match at most one row.
    async fn query_one_optional(
        &self,
        statement: &str,
        params: &[SqlValue],
    ) -> Result<Option<SqlRow>>;

    /// Run a read statement that must match exactly one row.
    async fn query_one(&self, statement: &str, params: &[SqlValue]) -> Result<SqlRow>;

    /// Run a write statement and return the number of affected rows.
    async fn execute(&self, statement: &str, params: &[SqlValue]) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_conversions() {
        assert_eq!(SqlValue::Integer(42).as_i64(), Some(42));
        assert_eq!(SqlValue::Text("42".to_string()).as_i64(), None);

        assert_eq!(SqlValue::Real(1.5).as_f64(), Some(1.5));
        assert_eq!(SqlValue::Integer(2).as_f64(), Some(2.0));

        assert_eq!(SqlValue::Text("abc".to_string()).as_str(), Some("abc"));
        assert_eq!(SqlValue::Integer(1).as_str(), None);
        assert_eq!(
            SqlValue::Text("abc".to_string()).as_string(),
            Some("abc".to_string())
        );

        assert_eq!(
            SqlValue::Blob(vec![1, 2, 3]).as_bytes(),
            Some(&[1u8, 2, 3][..])
        );

        assert!(SqlValue::Null.is_null());
        assert!(!SqlValue::Integer(0).is_null());
    }

    #[test]
    fn test_row_lookup_by_column_name() {
        let mut row = SqlRow::new();
        row.insert("id".to_string(), SqlValue::Integer(7));
        row.insert("name".to_string(), SqlValue::Text("Abbey Road".to_string()));

        assert_eq!(row.get("id").and_then(|v| v.as_i64()), Some(7));
        assert_eq!(row.get("name").and_then(|v| v.as_str()), Some("Abbey Road"));
        assert!(row.get("missing").is_none());
    }
}
