// src/table/mod.rs
pub mod convert;

use crate::error::{EtlError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Missing value. A NaN float counts as missing.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the cell; ints widen to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(v) => f.write_str(v),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// An ordered, row-oriented table. Row order is the order rows were read or produced in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Empty table with the given header.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table, checking every row has one value per column.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut table = Self::new(columns);
        table.rows.reserve(rows.len());
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(EtlError::schema(format!(
                "row {} has {} values, expected {}",
                self.rows.len(),
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Indices of `names`, in the order given. Fails listing every missing column.
    pub fn require_columns(&self, names: &[&str]) -> Result<Vec<usize>> {
        let mut indices = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.column_index(name) {
                Some(idx) => indices.push(idx),
                None => missing.push(*name),
            }
        }
        if !missing.is_empty() {
            return Err(EtlError::schema(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }
        Ok(indices)
    }

    /// Values of one column, top to bottom.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Value> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// New table holding exactly `names`, in that order.
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let indices = self.require_columns(names)?;
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Table {
            columns: names.iter().map(|n| n.to_string()).collect(),
            rows,
        })
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    pub fn rename_column(&mut self, idx: usize, name: impl Into<String>) {
        if let Some(col) = self.columns.get_mut(idx) {
            *col = name.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            vec!["a".into(), "b".into(), "c".into()],
            vec![
                vec![Value::Int(1), Value::Str("x".into()), Value::Null],
                vec![Value::Int(2), Value::Str("y".into()), Value::Float(1.5)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn select_reorders_columns() {
        let t = sample().select(&["c", "a"]).unwrap();
        assert_eq!(t.columns(), &["c".to_string(), "a".to_string()]);
        assert_eq!(t.rows()[1], vec![Value::Float(1.5), Value::Int(2)]);
    }

    #[test]
    fn require_columns_lists_all_missing() {
        let err = sample().require_columns(&["a", "zz", "yy"]).unwrap_err();
        match err {
            EtlError::Schema(msg) => {
                assert!(msg.contains("zz"));
                assert!(msg.contains("yy"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn push_row_rejects_wrong_width() {
        let mut t = sample();
        assert!(t.push_row(vec![Value::Int(3)]).is_err());
        assert_eq!(t.num_rows(), 2);
    }

    #[test]
    fn nan_counts_as_missing() {
        assert!(Value::Float(f64::NAN).is_null());
        assert!(Value::Null.is_null());
        assert!(!Value::Float(0.0).is_null());
        assert!(!Value::Str(String::new()).is_null());
    }

    #[test]
    fn head_truncates() {
        assert_eq!(sample().head(1).num_rows(), 1);
        assert_eq!(sample().head(10).num_rows(), 2);
    }
}
