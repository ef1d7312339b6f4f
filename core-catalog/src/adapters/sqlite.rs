//! SQLite Storage Executor
//!
//! Implements the `StorageExecutor` trait using `sqlx` with the native
//! SQLite driver.
//!
//! ## Features
//!
//! - Table-name prefix substitution for the `*PREFIX*` token
//! - Positional parameter binding for all `SqlValue` variants
//! - Row conversion into column/value maps
//! - Unique-constraint violations reported as their own error variant

use async_trait::async_trait;
use sqlx::{Column, Pool, Row, Sqlite};
use std::collections::HashMap;
use storage_traits::{
    Result as StorageResult, SqlRow, SqlValue, StorageError, StorageExecutor, PREFIX_TOKEN,
};
use tracing::debug;

use crate::db::{create_pool, DatabaseConfig, DEFAULT_TABLE_PREFIX};
use crate::error::Result;

/// SQLite implementation of `StorageExecutor`
///
/// Wraps a `sqlx::Pool<Sqlite>` and renders the `*PREFIX*` token into the
/// configured table-name prefix before preparing each statement.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    table_prefix: String,
}

impl SqliteStore {
    /// Create a store with its own connection pool.
    ///
    /// Builds the pool via [`create_pool`], which also runs migrations and
    /// a health check. The store keeps the config's table prefix.
    pub async fn connect(config: DatabaseConfig) -> Result<Self> {
        let table_prefix = config.table_prefix.clone();
        let pool = create_pool(config).await?;
        Ok(Self { pool, table_prefix })
    }

    /// Wrap an existing pool, using the default table prefix.
    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
        }
    }

    /// Wrap an existing pool with an explicit table prefix.
    pub fn with_prefix(pool: Pool<Sqlite>, table_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            table_prefix: table_prefix.into(),
        }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Render a statement template into executable SQL.
    fn render(&self, statement: &str) -> String {
        statement.replace(PREFIX_TOKEN, &self.table_prefix)
    }

    /// Convert a sqlx Row to a SqlRow (HashMap)
    fn row_to_sql_row(row: &sqlx::sqlite::SqliteRow) -> SqlRow {
        let mut result = HashMap::new();

        for column in row.columns() {
            let column_name = column.name().to_string();

            // Try to get the value as different types
            let value = if let Ok(v) = row.try_get::<Option<i64>, _>(column.ordinal()) {
                v.map(SqlValue::Integer).unwrap_or(SqlValue::Null)
            } else if let Ok(v) = row.try_get::<Option<f64>, _>(column.ordinal()) {
                v.map(SqlValue::Real).unwrap_or(SqlValue::Null)
            } else if let Ok(v) = row.try_get::<Option<String>, _>(column.ordinal()) {
                v.map(SqlValue::Text).unwrap_or(SqlValue::Null)
            } else if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(column.ordinal()) {
                v.map(SqlValue::Blob).unwrap_or(SqlValue::Null)
            } else {
                SqlValue::Null
            };

            result.insert(column_name, value);
        }

        result
    }

    /// Convert SqlValue parameters to sqlx-compatible format
    fn bind_params<'q>(
        query: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
        params: &'q [SqlValue],
    ) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        let mut query = query;
        for param in params {
            query = match param {
                SqlValue::Null => query.bind(None::<i64>),
                SqlValue::Integer(i) => query.bind(i),
                SqlValue::Real(r) => query.bind(r),
                SqlValue::Text(s) => query.bind(s.as_str()),
                SqlValue::Blob(b) => query.bind(b.as_slice()),
            };
        }
        query
    }
}

/// Classify a sqlx failure into the executor error contract.
fn map_error(error: sqlx::Error) -> StorageError {
    match &error {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StorageError::Unavailable(error.to_string())
        }
        sqlx::Error::Database(db_error)
            if matches!(db_error.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
        {
            StorageError::UniqueViolation(error.to_string())
        }
        _ => StorageError::Statement(error.to_string()),
    }
}

#[async_trait]
impl StorageExecutor for SqliteStore {
    async fn query(&self, statement: &str, params: &[SqlValue]) -> StorageResult<Vec<SqlRow>> {
        let sql = self.render(statement);
        debug!(statement = %sql, param_count = params.len(), "Executing query");

        let sqlx_query = Self::bind_params(sqlx::query(&sql), params);
        let rows = sqlx_query.fetch_all(&self.pool).await.map_err(map_error)?;

        let result: Vec<SqlRow> = rows.iter().map(Self::row_to_sql_row).collect();

        debug!(row_count = result.len(), "Query executed successfully");
        Ok(result)
    }

    async fn query_one_optional(
        &self,
        statement: &str,
        params: &[SqlValue],
    ) -> StorageResult<Option<SqlRow>> {
        let sql = self.render(statement);
        debug!(statement = %sql, param_count = params.len(), "Executing query_one_optional");

        let sqlx_query = Self::bind_params(sqlx::query(&sql), params);
        let row = sqlx_query
            .fetch_optional(&self.pool)
            .await
            .map_err(map_error)?;

        Ok(row.as_ref().map(Self::row_to_sql_row))
    }

    async fn query_one(&self, statement: &str, params: &[SqlValue]) -> StorageResult<SqlRow> {
        let sql = self.render(statement);
        debug!(statement = %sql, param_count = params.len(), "Executing query_one");

        let sqlx_query = Self::bind_params(sqlx::query(&sql), params);
        let row = sqlx_query.fetch_one(&self.pool).await.map_err(map_error)?;

        Ok(Self::row_to_sql_row(&row))
    }

    async fn execute(&self, statement: &str, params: &[SqlValue]) -> StorageResult<u64> {
        let sql = self.render(statement);
        debug!(statement = %sql, param_count = params.len(), "Executing statement");

        let sqlx_query = Self::bind_params(sqlx::query(&sql), params);
        let result = sqlx_query.execute(&self.pool).await.map_err(map_error)?;

        let rows_affected = result.rows_affected();
        debug!(rows_affected, "Statement executed successfully");

        Ok(rows_affected)
    }
}
