//! Named SQL text with its positional arguments.

use crate::error::{DaoError, DaoResult};
use crate::params::{expand_array_params, max_placeholder, renumber_placeholders};
use crate::value::Value;

/// A named SQL statement with pre-numbered placeholders (`$1, $2, ...`) and
/// the arguments they bind.
///
/// Every composition method consumes the query and returns a new one, so a
/// fragment's text and its arguments always travel together.
///
/// # Example
///
/// ```
/// use pgdao::Query;
///
/// let base = Query::new("readJustifications", "SELECT * FROM justifications WHERE deleted IS NULL")
///     .push(" AND root_proposition_id = $1")
///     .bind(42_i64);
/// let filter = Query::new("filter", " AND polarity = $1").bind("POSITIVE");
///
/// let q = base.append(filter).push(" AND creator_user_id IN (").push_array([1_i64, 2]).push(")");
/// assert_eq!(
///     q.text(),
///     "SELECT * FROM justifications WHERE deleted IS NULL AND root_proposition_id = $1 \
///      AND polarity = $2 AND creator_user_id IN ($3, $4)"
/// );
/// assert_eq!(q.args().len(), 4);
/// assert!(q.validate().is_ok());
/// ```
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    name: String,
    text: String,
    args: Vec<Value>,
}

impl Query {
    /// Create a query with no bound arguments.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            args: Vec::new(),
        }
    }

    /// Replace the argument list.
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Bind the next argument.
    ///
    /// This does not modify the SQL text; it must already reference the
    /// argument's placeholder.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Append raw SQL text that references no new arguments.
    pub fn push(mut self, sql: &str) -> Self {
        self.text.push_str(sql);
        self
    }

    /// Append a fragment numbered from `$1`, shifting its placeholders past
    /// the arguments already bound and taking over its arguments. The
    /// fragment's name is dropped.
    pub fn append(self, fragment: Query) -> Self {
        let offset = self.args.len();
        let mut text = self.text;
        text.push_str(&renumber_placeholders(&fragment.text, offset));
        let mut args = self.args;
        args.extend(fragment.args);
        Self {
            name: self.name,
            text,
            args,
        }
    }

    /// Bind each value as its own argument and append the comma-separated
    /// placeholders. An empty list appends `NULL`, so `IN (NULL)` stays
    /// valid SQL.
    pub fn push_array<T: Into<Value>>(self, values: impl IntoIterator<Item = T>) -> Self {
        let expanded = expand_array_params(self.args.as_slice(), values.into_iter().map(Into::into));
        let mut text = self.text;
        if expanded.placeholders.is_empty() {
            text.push_str("NULL");
        } else {
            text.push_str(&expanded.joined());
        }
        Self {
            name: self.name,
            text,
            args: expanded.args,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn into_parts(self) -> (String, String, Vec<Value>) {
        (self.name, self.text, self.args)
    }

    /// Check that the highest placeholder in the text equals the number of
    /// bound arguments.
    pub fn validate(&self) -> DaoResult<()> {
        let highest = max_placeholder(&self.text).map_err(|e| match e {
            DaoError::Validation(message) => {
                DaoError::validation(format!("query '{}': {}", self.name, message))
            }
            other => other,
        })?;
        if highest != self.args.len() {
            return Err(DaoError::validation(format!(
                "query '{}' references ${} but binds {} argument(s)",
                self.name,
                highest,
                self.args.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_renumbers_fragment() {
        let q = Query::new("q", "SELECT * FROM votes WHERE user_id = $1")
            .bind(7_i64)
            .append(Query::new("f", " AND target_id = $1 AND polarity = $2").bind(9_i64).bind("UP"));
        assert_eq!(
            q.text(),
            "SELECT * FROM votes WHERE user_id = $1 AND target_id = $2 AND polarity = $3"
        );
        assert_eq!(
            q.args(),
            &[Value::Int(7), Value::Int(9), Value::text("UP")]
        );
        assert_eq!(q.name(), "q");
        q.validate().unwrap();
    }

    #[test]
    fn append_to_empty_leaves_fragment_numbering() {
        let q = Query::new("q", "").append(Query::new("f", "x = $1").bind(1_i64));
        assert_eq!(q.text(), "x = $1");
    }

    #[test]
    fn composition_leaves_the_base_query_untouched() {
        let base = Query::new("q", "a = $1").bind(1_i64);
        let extended = base.clone().append(Query::new("f", " AND b = $1").bind(2_i64));
        assert_eq!(base.args().len(), 1);
        assert_eq!(extended.args().len(), 2);
    }

    #[test]
    fn push_array_expands_placeholders() {
        let q = Query::new("q", "SELECT * FROM tags WHERE owner = $1 AND tag_id IN (")
            .bind(1_i64)
            .push_array(vec![10_i64, 11, 12])
            .push(")");
        assert_eq!(
            q.text(),
            "SELECT * FROM tags WHERE owner = $1 AND tag_id IN ($2, $3, $4)"
        );
        assert_eq!(q.args().len(), 4);
    }

    #[test]
    fn push_array_empty_is_valid_sql() {
        let q = Query::new("q", "SELECT * FROM tags WHERE tag_id IN (")
            .push_array(Vec::<i64>::new())
            .push(")");
        assert_eq!(q.text(), "SELECT * FROM tags WHERE tag_id IN (NULL)");
        q.validate().unwrap();
    }

    #[test]
    fn validate_detects_mismatch() {
        let q = Query::new("q", "a = $1 AND b = $2").bind(1_i64);
        let err = q.validate().unwrap_err();
        assert!(matches!(err, DaoError::Validation(_)));

        let q = Query::new("q", "a = 1").bind(1_i64);
        assert!(q.validate().is_err());
    }

    #[test]
    fn validate_reports_out_of_range_placeholders() {
        let q = Query::new("readVotes", "SELECT * FROM votes WHERE id = $18446744073709551616");
        let err = q.validate().unwrap_err();
        assert!(matches!(err, DaoError::Validation(_)));
        assert!(err.to_string().contains("readVotes"));
    }

    #[test]
    fn validate_sees_through_e_string_escapes() {
        let q = Query::new("q", r"SELECT * FROM t WHERE note = E'it\'s $2' AND id = $1").bind(1_i64);
        q.validate().unwrap();
    }
}
