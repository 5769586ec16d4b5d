use std::marker::PhantomData;

use querykit_core::{QueryError, QueryExecutor};
use sqlx::sqlite::SqliteRow;
use sqlx::{Sqlite, SqlitePool};

use crate::builder::{SqlExpression, SqlParam};
use crate::error::SqlxErrorExt;

/// Runs [`SqlExpression`]s against an SQLite pool and decodes each row as `T`.
///
/// The pool is the per-call connection handle; the executor itself holds no
/// state and can be shared freely.
///
/// # Example
///
/// ```ignore
/// #[derive(sqlx::FromRow)]
/// struct Item { id: i64, name: String }
///
/// let service = QueryOrchestrator::new(
///     "items",
///     "id",
///     SqlExpressionBuilder::new("items").order_by("id", true),
///     SqlxExecutor::<Item>::new(),
/// );
/// let page = service.fetch_with_filters_and_pagination(&query, &pool).await?;
/// ```
pub struct SqlxExecutor<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> SqlxExecutor<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SqlxExecutor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SqlxExecutor<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SqlxExecutor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlxExecutor").finish()
    }
}

impl<T> QueryExecutor for SqlxExecutor<T>
where
    T: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin + 'static,
{
    type Expression = SqlExpression;
    type Connection = SqlitePool;
    type Row = T;

    async fn execute_query(&self, params: &SqlExpression, pool: &SqlitePool) -> Result<Vec<T>, QueryError> {
        let mut query = sqlx::query_as::<Sqlite, T>(&params.sql);
        for param in &params.params {
            query = match param {
                SqlParam::Null => query.bind(None::<String>),
                SqlParam::Bool(b) => query.bind(*b),
                SqlParam::Int(i) => query.bind(*i),
                SqlParam::Float(f) => query.bind(*f),
                SqlParam::Text(s) => query.bind(s.as_str()),
            };
        }
        let rows = query.fetch_all(pool).await.map_err(|e| {
            tracing::error!(sql = %params.sql, error = %e, "sqlite query failed");
            e.into_query_error()
        })?;
        tracing::debug!(sql = %params.sql, rows = rows.len(), "sqlite query executed");
        Ok(rows)
    }
}
