// src/extract/join.rs
use crate::error::{EtlError, Result};
use crate::table::{Table, Value};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Hashable form of a join-key cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum JoinKey {
    Int(i64),
    Float(u64),
    Bool(bool),
    Str(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

/// Nulls (and NaN) never match. Integral floats match the equal integer.
fn join_key(v: &Value) -> Option<JoinKey> {
    match v {
        Value::Null => None,
        Value::Int(i) => Some(JoinKey::Int(*i)),
        Value::Float(f) if f.is_nan() => None,
        Value::Float(f) if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
            Some(JoinKey::Int(*f as i64))
        }
        Value::Float(f) => Some(JoinKey::Float(f.to_bits())),
        Value::Bool(b) => Some(JoinKey::Bool(*b)),
        Value::Str(s) => Some(JoinKey::Str(s.clone())),
        Value::Date(d) => Some(JoinKey::Date(*d)),
        Value::Timestamp(ts) => Some(JoinKey::Timestamp(*ts)),
    }
}

/// Broad type of a key cell; only keys of a shared kind can ever match.
fn key_kind(k: &JoinKey) -> &'static str {
    match k {
        JoinKey::Int(_) | JoinKey::Float(_) => "numeric",
        JoinKey::Bool(_) => "bool",
        JoinKey::Str(_) => "string",
        JoinKey::Date(_) => "date",
        JoinKey::Timestamp(_) => "timestamp",
    }
}

/// Inner equi-join of `left` and `right` on column `key`.
///
/// Output rows follow `left` order; a left row matching several right rows
/// is repeated once per match, in `right` order. Columns are every `left`
/// column followed by the `right` columns other than `key`. Non-key names
/// present on both sides are suffixed `_x` (left) and `_y` (right).
///
/// Fails with a merge error when both key columns hold values but no value
/// kind is common to them, e.g. text keys against integer keys.
pub fn inner_join(left: &Table, right: &Table, key: &str) -> Result<Table> {
    let left_key = left.column_index(key).ok_or_else(|| {
        EtlError::merge(format!("join key '{}' missing from row-oriented source", key))
    })?;
    let right_key = right.column_index(key).ok_or_else(|| {
        EtlError::merge(format!("join key '{}' missing from columnar source", key))
    })?;

    let mut index: HashMap<JoinKey, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows().iter().enumerate() {
        if let Some(k) = join_key(&row[right_key]) {
            index.entry(k).or_default().push(i);
        }
    }

    let right_kinds: HashSet<&str> = index.keys().map(key_kind).collect();
    let left_kinds: HashSet<&str> = left
        .rows()
        .iter()
        .filter_map(|row| join_key(&row[left_key]))
        .map(|k| key_kind(&k))
        .collect();
    if !left_kinds.is_empty()
        && !right_kinds.is_empty()
        && left_kinds.is_disjoint(&right_kinds)
    {
        let mut l: Vec<_> = left_kinds.into_iter().collect();
        let mut r: Vec<_> = right_kinds.into_iter().collect();
        l.sort_unstable();
        r.sort_unstable();
        return Err(EtlError::merge(format!(
            "join key '{}' has incompatible types: {} in row-oriented source, {} in columnar source",
            key,
            l.join("/"),
            r.join("/")
        )));
    }

    let right_cols: Vec<usize> = (0..right.num_columns()).filter(|&i| i != right_key).collect();
    let left_names: HashSet<&str> = left
        .columns()
        .iter()
        .filter(|c| c.as_str() != key)
        .map(String::as_str)
        .collect();
    let shared: HashSet<&str> = right_cols
        .iter()
        .map(|&i| right.columns()[i].as_str())
        .filter(|c| left_names.contains(c))
        .collect();

    let mut columns: Vec<String> = left
        .columns()
        .iter()
        .map(|c| {
            if shared.contains(c.as_str()) {
                format!("{}_x", c)
            } else {
                c.clone()
            }
        })
        .collect();
    columns.extend(right_cols.iter().map(|&i| {
        let c = &right.columns()[i];
        if shared.contains(c.as_str()) {
            format!("{}_y", c)
        } else {
            c.clone()
        }
    }));

    let mut out = Table::new(columns);
    for lrow in left.rows() {
        let Some(matches) = join_key(&lrow[left_key]).and_then(|k| index.get(&k)) else {
            continue;
        };
        for &ri in matches {
            let rrow = &right.rows()[ri];
            let mut row = Vec::with_capacity(out.num_columns());
            row.extend(lrow.iter().cloned());
            row.extend(right_cols.iter().map(|&c| rrow[c].clone()));
            out.push_row(row)?;
        }
    }

    debug!(
        key,
        left_rows = left.num_rows(),
        right_rows = right.num_rows(),
        joined_rows = out.num_rows(),
        shared_columns = shared.len(),
        "inner join"
    );
    Ok(out)
}
