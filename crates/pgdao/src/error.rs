//! Error types for pgdao

use thiserror::Error;

/// Result type alias for pgdao operations
pub type DaoResult<T> = Result<T, DaoError>;

/// Error types for DAO query execution
#[derive(Debug, Error)]
pub enum DaoError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error, propagated unmodified from the driver
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// A caller asked for a required row and the query returned none
    #[error("Missing required row for query '{query}'")]
    MissingRequiredRow { query: String },

    /// An internal invariant was broken (malformed marker columns, `$0`
    /// placeholders, field/value width mismatch). Never retried.
    #[error("Impossible: contract violation: {0}")]
    ContractViolation(String),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Flat row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Query validation error (placeholder/argument mismatch)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl DaoError {
    /// Create a contract violation error
    pub fn contract(message: impl Into<String>) -> Self {
        Self::ContractViolation(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a missing required row error for the named query
    pub fn missing_required_row(query: impl Into<String>) -> Self {
        Self::MissingRequiredRow {
            query: query.into(),
        }
    }

    /// Check if this is a contract violation
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::ContractViolation(_))
    }

    /// Check if this is a missing required row error
    pub fn is_missing_required_row(&self) -> bool {
        matches!(self, Self::MissingRequiredRow { .. })
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Parse a tokio_postgres error into a more specific DaoError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for DaoError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
