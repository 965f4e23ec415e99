//! # pgdao
//!
//! A micro-ORM for hand-written Postgres DAOs.
//!
//! ## Features
//!
//! - **SQL explicit**: every DAO method is a named, hand-written SQL string
//! - **Prefix flattening**: one joined row carries several entities, separated
//!   by empty-string marker columns instead of per-column aliases
//! - **Composable placeholders**: splice `$1`-numbered fragments and
//!   variable-length `IN (...)` lists without a query builder
//! - **Row-count discipline**: `query_one` / `query_many` / `execute` with
//!   explicit required-row semantics
//! - **Typed conversion**: `FlatRow` → entity via `FromFlatRow`
//! - **Logging**: per-query debug events and anomaly warnings via `tracing`
//!
//! ## Example
//!
//! ```ignore
//! use pgdao::{start_prefix, DaoResult, Executor, FlatRow, FromFlatRow, STOP_PREFIX};
//!
//! let sql = format!(
//!     "SELECT p.proposition_id AS id, p.text, \
//!             '' AS {start}, u.user_id AS id, u.long_name, '' AS {STOP_PREFIX} \
//!        FROM propositions p JOIN users u ON u.user_id = p.creator_user_id \
//!       WHERE p.proposition_id = $1",
//!     start = start_prefix("creator_"),
//! );
//!
//! let exec = Executor::new(pool);
//! let proposition: Proposition = exec
//!     .query_required_as("readPropositionForId", &sql, &[proposition_id.into()])
//!     .await?;
//! ```

pub mod connection;
pub mod error;
pub mod executor;
pub mod flatten;
pub mod params;
pub mod query;
pub mod row;
pub mod value;

pub use connection::{Connection, Field, ResultSet};
pub use error::{DaoError, DaoResult};
pub use executor::{Executor, ExecutorConfig, NoopLogger, QueryLogger, TracingLogger};
pub use flatten::{
    START_PREFIX, STOP_PREFIX, flatten_map, flatten_result, flatten_row, is_marker, start_prefix,
};
pub use params::{
    ExpandedParams, expand_array_params, join_placeholders, make_placeholders, max_placeholder,
    placeholder, renumber_placeholders,
};
pub use query::Query;
pub use row::{FlatRow, FromFlatRow, RowMap};
pub use value::{FromValue, Value};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config, create_pool_with_tls};

// Re-export the driver so DAOs can name connection types without a direct dependency
pub use tokio_postgres;
