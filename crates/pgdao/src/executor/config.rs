use std::time::Duration;

/// Configuration for query logging.
///
/// By default every successful query is logged at debug level with its SQL
/// truncated to 200 bytes, and no slow-query threshold is set.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Emit a debug event per executed query.
    pub log_queries: bool,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Queries slower than this are reported as warnings.
    pub slow_query_threshold: Option<Duration>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            log_queries: true,
            max_sql_length: Some(200),
            slow_query_threshold: None,
        }
    }
}

impl ExecutorConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum SQL length to log.
    pub fn with_max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Stop emitting per-query debug events.
    pub fn without_query_logging(mut self) -> Self {
        self.log_queries = false;
        self
    }

    /// Set the slow query threshold.
    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }
}
