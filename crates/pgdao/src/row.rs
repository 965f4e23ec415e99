//! Flattened rows and typed row conversion.

use crate::error::{DaoError, DaoResult};
use crate::value::{FromValue, Value};
use indexmap::IndexMap;

/// A name-keyed row, in column order. Duplicate column names collapse onto
/// one entry (last column wins).
pub type RowMap = IndexMap<String, Value>;

/// A result row after prefix flattening.
///
/// Keys keep the order in which they were first written; writing an existing
/// key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRow {
    columns: IndexMap<String, Value>,
}

impl FlatRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: IndexMap::with_capacity(capacity),
        }
    }

    pub(crate) fn insert(&mut self, key: String, value: Value) {
        self.columns.insert(key, value);
    }

    pub(crate) fn remove(&mut self, key: &str) {
        self.columns.shift_remove(key);
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.columns.contains_key(key)
    }

    /// Raw access to a column value.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.columns.get(key)
    }

    /// Typed access to a column; a missing column or a value of the wrong
    /// shape is a [`DaoError::Decode`] naming the column.
    pub fn get<T: FromValue>(&self, key: &str) -> DaoResult<T> {
        let value = self
            .columns
            .get(key)
            .ok_or_else(|| DaoError::decode(key, "column not present in row"))?;
        T::from_value(value).map_err(|message| DaoError::decode(key, message))
    }

    /// Like [`FlatRow::get`], but a missing column or NULL yields `None`.
    pub fn get_opt<T: FromValue>(&self, key: &str) -> DaoResult<Option<T>> {
        match self.columns.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::from_value(value)
                .map(Some)
                .map_err(|message| DaoError::decode(key, message)),
        }
    }

    /// The columns under `prefix`, with the prefix removed.
    ///
    /// Lets a joined sub-entity reuse its own [`FromFlatRow`] impl.
    pub fn sub_row(&self, prefix: &str) -> FlatRow {
        let columns = self
            .columns
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .map(|rest| (rest.to_string(), value.clone()))
            })
            .collect();
        FlatRow { columns }
    }

    /// Whether any column under `prefix` is non-NULL (e.g. a LEFT JOIN matched).
    pub fn has_prefixed(&self, prefix: &str) -> bool {
        self.columns
            .iter()
            .any(|(key, value)| key.starts_with(prefix) && !value.is_null())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_map(self) -> RowMap {
        self.columns
    }
}

impl FromIterator<(String, Value)> for FlatRow {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// Trait for converting a flattened row into a domain entity.
///
/// Implement it per entity, reading each column with [`FlatRow::get`] so a
/// mismatched row shape fails at the conversion boundary.
///
/// # Example
///
/// ```
/// use pgdao::{DaoResult, FlatRow, FromFlatRow};
///
/// struct User {
///     id: i64,
///     long_name: String,
/// }
///
/// impl FromFlatRow for User {
///     fn from_flat_row(row: &FlatRow) -> DaoResult<Self> {
///         Ok(User {
///             id: row.get("id")?,
///             long_name: row.get("long_name")?,
///         })
///     }
/// }
/// ```
pub trait FromFlatRow: Sized {
    fn from_flat_row(row: &FlatRow) -> DaoResult<Self>;
}

impl FromFlatRow for FlatRow {
    fn from_flat_row(row: &FlatRow) -> DaoResult<Self> {
        Ok(row.clone())
    }
}
