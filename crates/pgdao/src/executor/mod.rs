//! The generic query executor every DAO issues SQL through.
//!
//! [`Executor`] wraps a [`Connection`], flattens each returned row with
//! [`flatten_row`], hands it to a caller-supplied converter and enforces the
//! row-count contract of the call:
//!
//! - [`Executor::query_one`]: zero or one row expected. Extra rows are logged
//!   as a warning and the first one is used. With `required`, zero rows is a
//!   [`DaoError::MissingRequiredRow`].
//! - [`Executor::query_many`]: any number of rows, converted in result order.
//! - [`Executor::execute`]: mutations, answering the affected row count.
//!
//! Connection errors propagate unmodified; the executor never retries.
//!
//! # Example
//!
//! ```ignore
//! use pgdao::{Executor, FlatRow, FromFlatRow, DaoResult};
//!
//! let exec = Executor::new(pool);
//! let proposition: Option<Proposition> = exec
//!     .query_one_as(
//!         "readPropositionForId",
//!         "SELECT * FROM propositions WHERE proposition_id = $1 AND deleted IS NULL",
//!         &[proposition_id.into()],
//!         false,
//!     )
//!     .await?;
//! ```

mod config;
mod logger;


pub use config::ExecutorConfig;
pub use logger::{NoopLogger, QueryLogger, TracingLogger};

use crate::connection::{Connection, ResultSet};
use crate::error::{DaoError, DaoResult};
use crate::flatten::flatten_row;
use crate::query::Query;
use crate::row::{FlatRow, FromFlatRow};
use crate::value::Value;
use logger::truncate_sql;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Executes named queries against a [`Connection`] and maps flattened rows.
///
/// Holds no per-call state; share it by reference across concurrent requests.
pub struct Executor<C> {
    conn: C,
    logger: Arc<dyn QueryLogger>,
    config: ExecutorConfig,
}

impl<C: Connection> Executor<C> {
    /// Create an executor logging through `tracing`.
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            logger: Arc::new(TracingLogger),
            config: ExecutorConfig::default(),
        }
    }

    /// Set the logger.
    pub fn with_logger<L: QueryLogger + 'static>(mut self, logger: L) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    /// Set the logger from an Arc.
    pub fn with_logger_arc(mut self, logger: Arc<dyn QueryLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Set the logging configuration.
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Get a reference to the inner connection.
    pub fn inner(&self) -> &C {
        &self.conn
    }

    /// Get the inner connection, consuming this executor.
    pub fn into_inner(self) -> C {
        self.conn
    }

    async fn run(&self, name: &str, sql: &str, args: &[Value]) -> DaoResult<ResultSet> {
        let start = Instant::now();
        let result = self.conn.execute(name, sql, args).await?;
        let elapsed = start.elapsed();

        if self.config.log_queries {
            self.logger.debug(&format!(
                "query '{}' ({} params) -> {} row(s) in {:?} | {}",
                name,
                args.len(),
                result.row_count,
                elapsed,
                truncate_sql(sql, self.config.max_sql_length)
            ));
        }
        self.check_slow(name, sql, elapsed);
        Ok(result)
    }

    fn check_slow(&self, name: &str, sql: &str, elapsed: Duration) {
        if let Some(threshold) = self.config.slow_query_threshold {
            if elapsed > threshold {
                self.logger.warn(&format!(
                    "slow query '{}' took {:?} | {}",
                    name,
                    elapsed,
                    truncate_sql(sql, self.config.max_sql_length)
                ));
            }
        }
    }

    /// Execute a query expected to return at most one row.
    ///
    /// Semantics:
    /// - 0 rows: `required` fails with [`DaoError::MissingRequiredRow`],
    ///   otherwise `convert(None)`
    /// - 1 row: `convert(Some(flattened))`
    /// - multiple rows: one warning is logged and the first row is converted
    pub async fn query_one<T, F>(
        &self,
        name: &str,
        sql: &str,
        args: &[Value],
        required: bool,
        convert: F,
    ) -> DaoResult<Option<T>>
    where
        F: FnOnce(Option<&FlatRow>) -> DaoResult<Option<T>>,
    {
        let result = self.run(name, sql, args).await?;
        if result.rows.len() > 1 {
            self.logger.warn(&format!(
                "query '{}' expected at most one row but returned {}; using the first",
                name,
                result.rows.len()
            ));
        }

        let row = match result.rows.first() {
            Some(values) => Some(flatten_row(&result.fields, values)?),
            None if required => return Err(DaoError::missing_required_row(name)),
            None => None,
        };
        convert(row.as_ref())
    }

    /// [`Executor::query_one`] converting with `T`'s [`FromFlatRow`] impl.
    pub async fn query_one_as<T: FromFlatRow>(
        &self,
        name: &str,
        sql: &str,
        args: &[Value],
        required: bool,
    ) -> DaoResult<Option<T>> {
        self.query_one(name, sql, args, required, |row| {
            row.map(T::from_flat_row).transpose()
        })
        .await
    }

    /// Execute a query whose row must exist and convert it with `T`'s
    /// [`FromFlatRow`] impl.
    pub async fn query_required_as<T: FromFlatRow>(
        &self,
        name: &str,
        sql: &str,
        args: &[Value],
    ) -> DaoResult<T> {
        self.query_one_as(name, sql, args, true)
            .await?
            .ok_or_else(|| DaoError::missing_required_row(name))
    }

    /// Execute a query and convert every row, preserving result order.
    pub async fn query_many<T, F>(
        &self,
        name: &str,
        sql: &str,
        args: &[Value],
        mut convert: F,
    ) -> DaoResult<Vec<T>>
    where
        F: FnMut(&FlatRow) -> DaoResult<T>,
    {
        let result = self.run(name, sql, args).await?;
        result
            .rows
            .iter()
            .map(|values| {
                let row = flatten_row(&result.fields, values)?;
                convert(&row)
            })
            .collect()
    }

    /// [`Executor::query_many`] converting with `T`'s [`FromFlatRow`] impl.
    pub async fn query_many_as<T: FromFlatRow>(
        &self,
        name: &str,
        sql: &str,
        args: &[Value],
    ) -> DaoResult<Vec<T>> {
        self.query_many(name, sql, args, T::from_flat_row).await
    }

    /// Execute a statement and return the number of affected rows.
    pub async fn execute(&self, name: &str, sql: &str, args: &[Value]) -> DaoResult<u64> {
        Ok(self.run(name, sql, args).await?.row_count)
    }

    // ==================== Composed queries ====================

    /// [`Executor::query_one`] for a composed [`Query`], validated first.
    pub async fn fetch_one<T, F>(
        &self,
        query: &Query,
        required: bool,
        convert: F,
    ) -> DaoResult<Option<T>>
    where
        F: FnOnce(Option<&FlatRow>) -> DaoResult<Option<T>>,
    {
        query.validate()?;
        self.query_one(query.name(), query.text(), query.args(), required, convert)
            .await
    }

    /// [`Executor::query_one_as`] for a composed [`Query`], validated first.
    pub async fn fetch_one_as<T: FromFlatRow>(
        &self,
        query: &Query,
        required: bool,
    ) -> DaoResult<Option<T>> {
        query.validate()?;
        self.query_one_as(query.name(), query.text(), query.args(), required)
            .await
    }

    /// [`Executor::query_many`] for a composed [`Query`], validated first.
    pub async fn fetch_many<T, F>(&self, query: &Query, convert: F) -> DaoResult<Vec<T>>
    where
        F: FnMut(&FlatRow) -> DaoResult<T>,
    {
        query.validate()?;
        self.query_many(query.name(), query.text(), query.args(), convert)
            .await
    }

    /// [`Executor::query_many_as`] for a composed [`Query`], validated first.
    pub async fn fetch_many_as<T: FromFlatRow>(&self, query: &Query) -> DaoResult<Vec<T>> {
        query.validate()?;
        self.query_many_as(query.name(), query.text(), query.args())
            .await
    }

    /// [`Executor::execute`] for a composed [`Query`], validated first.
    pub async fn execute_query(&self, query: &Query) -> DaoResult<u64> {
        query.validate()?;
        self.execute(query.name(), query.text(), query.args()).await
    }
}
