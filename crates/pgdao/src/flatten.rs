//! Prefix flattening of joined rows.
//!
//! A query joining several entities can mark where each entity's columns
//! begin with an empty-string marker column instead of aliasing every column:
//!
//! ```sql
//! SELECT p.proposition_id AS id, p.text,
//!        '' AS prefix__creator_, u.user_id AS id, u.long_name,
//!        '' AS _prefix__end, p.created
//!   FROM propositions p JOIN users u ON u.user_id = p.creator_user_id
//! ```
//!
//! flattens to `{id, text, creator_id, creator_long_name, created}`.
//!
//! The scan is a single left-to-right pass over the field list carrying one
//! piece of state, the active prefix. Marker columns never reach the output
//! and must carry `''`; anything else is a contract violation.

use crate::connection::{Field, ResultSet};
use crate::error::{DaoError, DaoResult};
use crate::row::{FlatRow, RowMap};
use crate::value::Value;
use std::collections::HashSet;

/// Marker columns named `START_PREFIX + prefix` begin a prefixed span.
pub const START_PREFIX: &str = "prefix__";

/// A marker column with exactly this name ends the current prefixed span.
pub const STOP_PREFIX: &str = "_prefix__end";

/// Name of the marker column that starts a span prefixed with `prefix`.
///
/// ```
/// assert_eq!(pgdao::start_prefix("creator_"), "prefix__creator_");
/// ```
pub fn start_prefix(prefix: &str) -> String {
    format!("{}{}", START_PREFIX, prefix)
}

/// Whether `name` is a start or stop marker column.
pub fn is_marker(name: &str) -> bool {
    name == STOP_PREFIX || name.starts_with(START_PREFIX)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PrefixState<'a> {
    NoPrefix,
    Active(&'a str),
}

enum Column<'a> {
    Start(&'a str),
    Stop,
    Data,
}

fn classify(name: &str) -> Column<'_> {
    if name == STOP_PREFIX {
        Column::Stop
    } else if let Some(prefix) = name.strip_prefix(START_PREFIX) {
        Column::Start(prefix)
    } else {
        Column::Data
    }
}

fn check_marker(name: &str, value: Option<&Value>) -> DaoResult<()> {
    match value {
        Some(v) if v.is_empty_text() => Ok(()),
        Some(v) => Err(DaoError::contract(format!(
            "marker column '{}' must hold the empty string, got {:?}",
            name, v
        ))),
        None => Err(DaoError::contract(format!(
            "marker column '{}' is missing from the row",
            name
        ))),
    }
}

/// The flattening reducer shared by the positional and name-keyed entry
/// points.
///
/// `lookup(index, name)` yields the raw value of a column. With
/// `drop_shadowed`, a bare key written by the unprefixed branch is removed
/// once a prefixed column of the same name is moved under its prefix, since in
/// a name-keyed row both columns read the same collapsed cell.
fn flatten_with<'r>(
    fields: &[Field],
    lookup: impl Fn(usize, &str) -> Option<&'r Value>,
    drop_shadowed: bool,
) -> DaoResult<FlatRow> {
    let mut result = FlatRow::with_capacity(fields.len());
    let mut written_bare: HashSet<&str> = HashSet::new();
    let mut state = PrefixState::NoPrefix;

    for (index, field) in fields.iter().enumerate() {
        let name = field.name.as_str();
        let value = lookup(index, name);
        match classify(name) {
            Column::Start(prefix) => {
                check_marker(name, value)?;
                state = PrefixState::Active(prefix);
            }
            Column::Stop => {
                check_marker(name, value)?;
                state = PrefixState::NoPrefix;
            }
            Column::Data => {
                let value = value.cloned().unwrap_or(Value::Null);
                match state {
                    PrefixState::Active(prefix) => {
                        if drop_shadowed && written_bare.remove(name) {
                            result.remove(name);
                        }
                        result.insert(format!("{}{}", prefix, name), value);
                    }
                    PrefixState::NoPrefix => {
                        written_bare.insert(name);
                        result.insert(name.to_string(), value);
                    }
                }
            }
        }
    }

    Ok(result)
}

/// Flatten one positional row: `values[i]` belongs to `fields[i]`.
///
/// Same-named columns are distinct cells here, so a bare column and a
/// prefixed column of the same name both survive (`id` and `creator_id`).
///
/// ```
/// use pgdao::{flatten_row, start_prefix, Field, Value, STOP_PREFIX};
///
/// let start = start_prefix("my_prefix_");
/// let fields = ["id", start.as_str(), "foo", STOP_PREFIX, "baz"].map(Field::new);
/// let values = [
///     Value::Int(1),
///     Value::text(""),
///     Value::text("bar"),
///     Value::text(""),
///     Value::text("spaz"),
/// ];
/// let row = flatten_row(&fields, &values).unwrap();
/// assert_eq!(row.keys().collect::<Vec<_>>(), ["id", "my_prefix_foo", "baz"]);
/// ```
pub fn flatten_row(fields: &[Field], values: &[Value]) -> DaoResult<FlatRow> {
    if fields.len() != values.len() {
        return Err(DaoError::contract(format!(
            "row has {} values for {} fields",
            values.len(),
            fields.len()
        )));
    }
    flatten_with(fields, |index, _| values.get(index), false)
}

/// Flatten a name-keyed row, as produced by [`ResultSet::row_map`].
///
/// A prefixed column also reachable under its bare name removes the bare key
/// written earlier in the scan. Columns absent from `row` flatten to NULL.
pub fn flatten_map(fields: &[Field], row: &RowMap) -> DaoResult<FlatRow> {
    flatten_with(fields, |_, name| row.get(name), true)
}

/// Flatten every row of a result set against its shared field list,
/// preserving row order.
pub fn flatten_result(result: &ResultSet) -> DaoResult<Vec<FlatRow>> {
    result
        .rows
        .iter()
        .map(|values| flatten_row(&result.fields, values))
        .collect()
}
