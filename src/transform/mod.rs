// src/transform/mod.rs
pub mod date_parser;

use crate::error::{EtlError, Result};
use crate::table::{Table, Value};
use chrono::Datelike;
use tracing::{debug, info, warn};

/// Columns kept from the merged sources, in output order (before `Date` → `Month`).
pub const COLS_TO_KEEP: [&str; 7] = [
    "Store_ID",
    "Date",
    "Dept",
    "IsHoliday",
    "Weekly_Sales",
    "CPI",
    "Unemployment",
];

/// Exact column layout of a cleaned table.
pub const CLEAN_COLUMNS: [&str; 7] = [
    "Store_ID",
    "Dept",
    "IsHoliday",
    "Weekly_Sales",
    "CPI",
    "Unemployment",
    "Month",
];

/// Imputed from the previous row when missing. `Weekly_Sales` is deliberately absent.
pub const FORWARD_FILL_COLUMNS: [&str; 3] = ["Date", "CPI", "Unemployment"];

/// Inclusive floor for `Weekly_Sales`.
pub const DEFAULT_SALES_THRESHOLD: f64 = 10_000.0;

const DATE: &str = "Date";
const MONTH: &str = "Month";
const WEEKLY_SALES: &str = "Weekly_Sales";

/// Clean a merged table with the default sales floor.
pub fn transform(raw: &Table) -> Result<Table> {
    transform_with_threshold(raw, DEFAULT_SALES_THRESHOLD)
}

/// Clean a merged table:
/// 1) project to [`COLS_TO_KEEP`],
/// 2) forward-fill [`FORWARD_FILL_COLUMNS`],
/// 3) replace `Date` with its calendar `Month`,
/// 4) keep rows with `Weekly_Sales >= sales_threshold`.
///
/// Rows still missing any value afterwards (a leading null in a forward-filled
/// column, or a null in a column that is never filled) are dropped, so the
/// result never holds a null.
#[tracing::instrument(level = "info", skip(raw), fields(rows = raw.num_rows()))]
pub fn transform_with_threshold(raw: &Table, sales_threshold: f64) -> Result<Table> {
    let projected = raw.select(&COLS_TO_KEEP)?;
    let filled = forward_fill(&projected, &FORWARD_FILL_COLUMNS)?;
    let with_month = derive_month(&filled)?;
    let above_floor = filter_sales(&with_month, sales_threshold)?;
    let clean = drop_incomplete(&above_floor, &CLEAN_COLUMNS)?;

    info!(
        raw_rows = raw.num_rows(),
        clean_rows = clean.num_rows(),
        sales_threshold,
        "transformed"
    );
    Ok(clean)
}

/// Replace each null in `columns` with the last non-null value seen above it.
/// Single top-to-bottom pass; leading nulls stay null.
pub fn forward_fill(table: &Table, columns: &[&str]) -> Result<Table> {
    let indices = table.require_columns(columns)?;
    let mut last_seen: Vec<Option<Value>> = vec![None; indices.len()];
    let mut filled = 0usize;

    let mut out = Table::new(table.columns().to_vec());
    for row in table.rows() {
        let mut row = row.clone();
        for (slot, &idx) in last_seen.iter_mut().zip(&indices) {
            if row[idx].is_null() {
                if let Some(prev) = slot {
                    row[idx] = prev.clone();
                    filled += 1;
                }
            } else {
                *slot = Some(row[idx].clone());
            }
        }
        out.push_row(row)?;
    }

    debug!(filled, "forward-filled cells");
    Ok(out)
}

fn month_of(value: &Value, row: usize) -> Result<Value> {
    let month = match value {
        Value::Null => return Ok(Value::Null),
        Value::Date(d) => d.month(),
        Value::Timestamp(ts) => ts.month(),
        Value::Str(s) => date_parser::parse_date(s)
            .ok_or_else(|| {
                EtlError::parse(format!("row {}: cannot parse {:?} as a date", row, s))
            })?
            .month(),
        other => {
            return Err(EtlError::parse(format!(
                "row {}: {:?} is not a date",
                row, other
            )))
        }
    };
    Ok(Value::Int(i64::from(month)))
}

/// Drop `Date` and append `Month` (1-12) derived from it.
pub fn derive_month(table: &Table) -> Result<Table> {
    let date_idx = table.require_columns(&[DATE])?[0];

    let mut columns: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| c.as_str() != DATE)
        .cloned()
        .collect();
    columns.push(MONTH.to_string());

    let mut out = Table::new(columns);
    for (i, row) in table.rows().iter().enumerate() {
        let month = month_of(&row[date_idx], i)?;
        let mut next: Vec<Value> = row
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != date_idx)
            .map(|(_, v)| v.clone())
            .collect();
        next.push(month);
        out.push_row(next)?;
    }
    Ok(out)
}

/// Keep rows whose `Weekly_Sales` is at least `threshold`. Null sales never pass.
/// Surviving sales are stored as floats.
pub fn filter_sales(table: &Table, threshold: f64) -> Result<Table> {
    let sales_idx = table.require_columns(&[WEEKLY_SALES])?[0];

    let mut out = Table::new(table.columns().to_vec());
    for (i, row) in table.rows().iter().enumerate() {
        let sales = match &row[sales_idx] {
            Value::Null => continue,
            v => v.as_f64().ok_or_else(|| {
                EtlError::schema(format!(
                    "row {}: {} must be numeric, got {:?}",
                    i, WEEKLY_SALES, v
                ))
            })?,
        };
        if sales >= threshold {
            let mut kept = row.clone();
            kept[sales_idx] = Value::Float(sales);
            out.push_row(kept)?;
        }
    }
    Ok(out)
}

/// Drop rows holding a null in any of `columns`.
fn drop_incomplete(table: &Table, columns: &[&str]) -> Result<Table> {
    let indices = table.require_columns(columns)?;

    let mut out = Table::new(table.columns().to_vec());
    let mut dropped = 0usize;
    for row in table.rows() {
        if indices.iter().any(|&i| row[i].is_null()) {
            dropped += 1;
            continue;
        }
        out.push_row(row.clone())?;
    }
    if dropped > 0 {
        warn!(dropped, "dropped rows with missing values");
    }
    Ok(out)
}
