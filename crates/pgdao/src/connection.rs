//! The connection contract the executor runs queries through.
//!
//! A [`Connection`] takes a query name, SQL text and positional arguments and
//! answers with the field list, the rows (values in field order) and the
//! affected row count. Implementations exist for `tokio_postgres` clients and
//! transactions and, with the `pool` feature, for `deadpool_postgres` clients
//! and pools.

use crate::error::{DaoError, DaoResult};
use crate::row::RowMap;
use crate::value::Value;
use futures_util::TryStreamExt;
use tokio_postgres::types::ToSql;
use tokio_postgres::{RowStream, Statement};

/// A column descriptor, in result-set order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Everything a connection returns for one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Column descriptors, in column order.
    pub fields: Vec<Field>,
    /// Row values, each positionally paired with `fields`.
    pub rows: Vec<Vec<Value>>,
    /// Rows returned (SELECT) or affected (INSERT/UPDATE/DELETE).
    pub row_count: u64,
}

impl ResultSet {
    /// Build a result set whose `row_count` is the number of rows.
    pub fn new(fields: Vec<Field>, rows: Vec<Vec<Value>>) -> Self {
        let row_count = rows.len() as u64;
        Self {
            fields,
            rows,
            row_count,
        }
    }

    /// Override the affected row count.
    pub fn with_row_count(mut self, row_count: u64) -> Self {
        self.row_count = row_count;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Name-keyed view of row `index`. Same-named columns collapse onto the
    /// last one.
    pub fn row_map(&self, index: usize) -> Option<RowMap> {
        let row = self.rows.get(index)?;
        Some(
            self.fields
                .iter()
                .zip(row)
                .map(|(field, value)| (field.name.clone(), value.clone()))
                .collect(),
        )
    }
}

/// A trait that unifies database clients, transactions and pools for the
/// executor.
///
/// Implementations must fail on any transport or query error and must keep
/// field and row order stable.
pub trait Connection: Send + Sync {
    /// Execute `sql` with positional `args`. `name` identifies the query for
    /// logging and telemetry.
    fn execute(
        &self,
        name: &str,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = DaoResult<ResultSet>> + Send;
}

impl<C: Connection> Connection for &C {
    fn execute(
        &self,
        name: &str,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = DaoResult<ResultSet>> + Send {
        (**self).execute(name, sql, args)
    }
}

fn params_ref(args: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

async fn collect_result_set(stmt: &Statement, stream: RowStream) -> DaoResult<ResultSet> {
    let fields: Vec<Field> = stmt.columns().iter().map(|c| Field::new(c.name())).collect();

    let mut stream = std::pin::pin!(stream);
    let mut rows = Vec::new();
    while let Some(row) = stream.try_next().await.map_err(DaoError::from_db_error)? {
        let mut values = Vec::with_capacity(fields.len());
        for (idx, field) in fields.iter().enumerate() {
            let value = row
                .try_get::<_, Value>(idx)
                .map_err(|e| DaoError::decode(field.name.as_str(), e.to_string()))?;
            values.push(value);
        }
        rows.push(values);
    }

    let row_count = stream.rows_affected().unwrap_or(rows.len() as u64);
    Ok(ResultSet {
        fields,
        rows,
        row_count,
    })
}

impl Connection for tokio_postgres::Client {
    async fn execute(&self, name: &str, sql: &str, args: &[Value]) -> DaoResult<ResultSet> {
        tracing::trace!(target: "pgdao.sql", query = name, "executing");
        let stmt = self.prepare(sql).await.map_err(DaoError::from_db_error)?;
        let params = params_ref(args);
        let stream = self
            .query_raw(&stmt, params.iter().copied())
            .await
            .map_err(DaoError::from_db_error)?;
        collect_result_set(&stmt, stream).await
    }
}

impl Connection for tokio_postgres::Transaction<'_> {
    async fn execute(&self, name: &str, sql: &str, args: &[Value]) -> DaoResult<ResultSet> {
        tracing::trace!(target: "pgdao.sql", query = name, "executing in transaction");
        let stmt = self.prepare(sql).await.map_err(DaoError::from_db_error)?;
        let params = params_ref(args);
        let stream = self
            .query_raw(&stmt, params.iter().copied())
            .await
            .map_err(DaoError::from_db_error)?;
        collect_result_set(&stmt, stream).await
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl Connection for deadpool_postgres::Client {
    async fn execute(&self, name: &str, sql: &str, args: &[Value]) -> DaoResult<ResultSet> {
        let client: &tokio_postgres::Client = self;
        Connection::execute(client, name, sql, args).await
    }
}

#[cfg(feature = "pool")]
impl Connection for deadpool_postgres::Transaction<'_> {
    async fn execute(&self, name: &str, sql: &str, args: &[Value]) -> DaoResult<ResultSet> {
        let tx: &tokio_postgres::Transaction<'_> = self;
        Connection::execute(tx, name, sql, args).await
    }
}

/// Each call checks a client out of the pool for the duration of the query.
#[cfg(feature = "pool")]
impl Connection for deadpool_postgres::Pool {
    async fn execute(&self, name: &str, sql: &str, args: &[Value]) -> DaoResult<ResultSet> {
        let client = self.get().await?;
        Connection::execute(&client, name, sql, args).await
    }
}
