//! Positional placeholder composition.
//!
//! Hand-written SQL fragments each number their placeholders from `$1`.
//! These helpers shift a fragment's placeholders past the arguments already
//! bound, and mint numbered placeholders for variable-length lists (`IN (...)`,
//! `VALUES (...)`). All functions are pure: inputs are never mutated and every
//! call returns fresh SQL text and argument vectors.
//!
//! Placeholder matching understands enough SQL to leave alone anything that
//! only looks like a placeholder: `$1` inside `'string literals'` (including
//! `E'...'` strings with backslash escapes), `"quoted identifiers"`, comments
//! or `$tag$dollar-quoted$tag$` bodies, and identifiers such as `col$1`.

use crate::error::{DaoError, DaoResult};
use std::fmt::Write;
use std::ops::Range;

/// Render a single placeholder token (`$index`).
pub fn placeholder(index: usize) -> String {
    format!("${}", index)
}

/// Rewrite every placeholder `$k` in `sql` to `$(k + offset)`.
///
/// `renumber_placeholders(sql, 0)` returns `sql` unchanged. A placeholder
/// whose shifted index does not fit in `usize` is left as written, so
/// [`max_placeholder`] still reports it.
///
/// # Example
/// ```
/// use pgdao::renumber_placeholders;
///
/// assert_eq!(
///     renumber_placeholders("a = $1 AND b = $2", 2),
///     "a = $3 AND b = $4"
/// );
/// ```
pub fn renumber_placeholders(sql: &str, offset: usize) -> String {
    if offset == 0 {
        return sql.to_string();
    }

    let mut out = String::with_capacity(sql.len() + 8);
    let mut copied = 0;
    scan_placeholders(sql, |range, index| {
        if let Some(shifted) = index.and_then(|k| k.checked_add(offset)) {
            out.push_str(&sql[copied..range.start]);
            let _ = write!(&mut out, "${}", shifted);
            copied = range.end;
        }
    });
    out.push_str(&sql[copied..]);
    out
}

/// The highest placeholder index referenced by `sql` (0 when there is none).
///
/// A placeholder whose index does not fit in `usize` is a
/// [`DaoError::Validation`].
pub fn max_placeholder(sql: &str) -> DaoResult<usize> {
    let mut max = 0;
    let mut oversized = None;
    scan_placeholders(sql, |range, index| match index {
        Some(k) => max = max.max(k),
        None => {
            oversized.get_or_insert(range);
        }
    });
    match oversized {
        Some(range) => Err(DaoError::validation(format!(
            "placeholder {} is out of range",
            &sql[range]
        ))),
        None => Ok(max),
    }
}

/// Arguments and placeholders produced by [`expand_array_params`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedParams<T> {
    /// `existing` followed by the new values.
    pub args: Vec<T>,
    /// One placeholder per new value, in order.
    pub placeholders: Vec<String>,
}

impl<T> ExpandedParams<T> {
    /// The placeholders joined with `", "`, ready to splice into `IN (...)`.
    pub fn joined(&self) -> String {
        join_placeholders(&self.placeholders)
    }
}

/// Append `new_values` to a copy of `existing`, minting one placeholder per
/// new value starting at `$(existing.len() + 1)`.
///
/// # Example
/// ```
/// use pgdao::expand_array_params;
///
/// let expanded = expand_array_params(&["a", "b"], ["c", "d"]);
/// assert_eq!(expanded.args, vec!["a", "b", "c", "d"]);
/// assert_eq!(expanded.placeholders, vec!["$3", "$4"]);
/// ```
pub fn expand_array_params<T: Clone>(
    existing: &[T],
    new_values: impl IntoIterator<Item = T>,
) -> ExpandedParams<T> {
    let mut args = existing.to_vec();
    let first = args.len() + 1;
    args.extend(new_values);
    let placeholders = (first..=args.len()).map(placeholder).collect();
    ExpandedParams { args, placeholders }
}

/// `count` consecutive placeholders beginning at `$start`.
///
/// Placeholders are 1-based; `start == 0` is a contract violation.
pub fn make_placeholders(count: usize, start: usize) -> DaoResult<Vec<String>> {
    if start == 0 {
        return Err(DaoError::contract(
            "make_placeholders: placeholders start at $1, got start index 0",
        ));
    }
    let end = start.checked_add(count).ok_or_else(|| {
        DaoError::contract(format!(
            "make_placeholders: {} placeholders from ${} overflow",
            count, start
        ))
    })?;
    Ok((start..end).map(placeholder).collect())
}

/// Join placeholder tokens with `", "`.
pub fn join_placeholders(placeholders: &[String]) -> String {
    placeholders.join(", ")
}

fn is_ident_byte(b: u8) -> bool {
    b == b'_' || b == b'$' || b.is_ascii_alphanumeric() || b >= 0x80
}

/// If a dollar-quote tag (`$$` or `$tag$`) opens at `start`, return the index
/// of its closing `$`.
fn dollar_tag_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut j = start + 1;
    match bytes.get(j) {
        Some(b'$') => return Some(j),
        Some(&b) if b == b'_' || b.is_ascii_alphabetic() || b >= 0x80 => {}
        _ => return None,
    }
    while let Some(&b) = bytes.get(j) {
        if b == b'$' {
            return Some(j);
        }
        if !is_ident_byte(b) {
            return None;
        }
        j += 1;
    }
    None
}

fn find_from(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from > bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| from + pos)
}

/// Whether the quote at `quote_at` opens an `E'...'` escape string.
fn opens_escape_string(bytes: &[u8], quote_at: usize) -> bool {
    match quote_at.checked_sub(1).map(|i| bytes[i]) {
        Some(b'E' | b'e') => quote_at < 2 || !is_ident_byte(bytes[quote_at - 2]),
        _ => false,
    }
}

/// Call `f` with the byte range and index of every positional placeholder in
/// `sql`, in order of appearance. The index is `None` when it does not fit in
/// `usize`.
fn scan_placeholders(sql: &str, mut f: impl FnMut(Range<usize>, Option<usize>)) {
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while i < len {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                let backslash_escapes = quote == b'\'' && opens_escape_string(bytes, i);
                i += 1;
                while i < len {
                    if backslash_escapes && bytes[i] == b'\\' {
                        i += 2;
                        continue;
                    }
                    if bytes[i] == quote {
                        if bytes.get(i + 1) == Some(&quote) {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = find_from(bytes, i, b"\n").map_or(len, |pos| pos + 1);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = find_from(bytes, i + 2, b"*/").map_or(len, |pos| pos + 2);
            }
            b'$' => {
                if i > 0 && is_ident_byte(bytes[i - 1]) {
                    i += 1;
                    continue;
                }

                let digits_end = bytes[i + 1..]
                    .iter()
                    .position(|b| !b.is_ascii_digit())
                    .map_or(len, |pos| i + 1 + pos);
                let whole_token = bytes.get(digits_end).is_none_or(|&b| !is_ident_byte(b));
                if digits_end > i + 1 && whole_token {
                    let index = sql[i + 1..digits_end].parse::<usize>().ok();
                    f(i..digits_end, index);
                    i = digits_end;
                    continue;
                }

                if let Some(tag_end) = dollar_tag_end(bytes, i) {
                    let tag = &bytes[i..=tag_end];
                    i = find_from(bytes, tag_end + 1, tag).map_or(len, |pos| pos + tag.len());
                    continue;
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
}
