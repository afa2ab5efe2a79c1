// src/aggregate.rs
use crate::error::{EtlError, Result};
use crate::table::{Table, Value};
use std::collections::HashMap;
use tracing::info;

/// Exact column layout of the monthly aggregate.
pub const AGG_COLUMNS: [&str; 2] = ["Month", "Weekly_Sales"];

/// Round half-to-even at `decimals` places, applied to the scaled value.
pub fn round_half_even(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

/// Mean `Weekly_Sales` per `Month`, rounded to 2 decimals, ascending by month.
///
/// One output row per distinct month in `clean`; months with no rows are not
/// invented. Rows with a null month or null sales are skipped. An empty input
/// yields an empty table with the aggregate columns.
pub fn avg_weekly_sales_per_month(clean: &Table) -> Result<Table> {
    let monthly = clean.select(&AGG_COLUMNS)?;

    // pass 1: month -> (sum, count), in row order
    let mut groups: HashMap<i64, (f64, usize)> = HashMap::new();
    for (i, row) in monthly.rows().iter().enumerate() {
        if row[0].is_null() || row[1].is_null() {
            continue;
        }
        let month = row[0].as_i64().ok_or_else(|| {
            EtlError::schema(format!("row {}: Month must be an integer, got {:?}", i, row[0]))
        })?;
        let sales = row[1].as_f64().ok_or_else(|| {
            EtlError::schema(format!(
                "row {}: Weekly_Sales must be numeric, got {:?}",
                i, row[1]
            ))
        })?;
        let acc = groups.entry(month).or_insert((0.0, 0));
        acc.0 += sales;
        acc.1 += 1;
    }

    // pass 2: finalise means, then order by month
    let mut averages: Vec<(i64, f64)> = groups
        .into_iter()
        .map(|(month, (sum, count))| (month, round_half_even(sum / count as f64, 2)))
        .collect();
    averages.sort_by_key(|(month, _)| *month);

    let rows = averages
        .into_iter()
        .map(|(month, avg)| vec![Value::Int(month), Value::Float(avg)])
        .collect();
    let agg = Table::from_rows(AGG_COLUMNS.iter().map(|c| c.to_string()).collect(), rows)?;

    info!(months = agg.num_rows(), input_rows = clean.num_rows(), "aggregated");
    Ok(agg)
}
