//! Batch ETL for retail sales: merge a CSV and a Parquet source, clean the
//! rows, average weekly sales per month, and write both results as CSV.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod table;
pub mod transform;

#[cfg(test)]
mod test_support;

pub use aggregate::avg_weekly_sales_per_month;
pub use config::PipelineConfig;
pub use error::{EtlError, Result};
pub use extract::extract;
pub use load::load;
pub use table::{Table, Value};
pub use transform::transform;
