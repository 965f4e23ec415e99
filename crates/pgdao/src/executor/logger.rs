/// Sink for the executor's diagnostics.
///
/// Methods cannot fail, so logging can never abort a query.
pub trait QueryLogger: Send + Sync {
    fn warn(&self, message: &str);

    fn debug(&self, message: &str);
}

/// Forwards to `tracing` under the `pgdao.sql` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl QueryLogger for TracingLogger {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "pgdao.sql", "{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: "pgdao.sql", "{}", message);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl QueryLogger for NoopLogger {
    fn warn(&self, _message: &str) {}

    fn debug(&self, _message: &str) {}
}

pub(crate) fn truncate_sql(sql: &str, max_bytes: Option<usize>) -> String {
    match max_bytes {
        Some(max) if sql.len() > max => {
            let mut end = max;
            while end > 0 && !sql.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &sql[..end])
        }
        _ => sql.to_string(),
    }
}
