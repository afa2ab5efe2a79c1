// src/extract/mod.rs
pub mod join;

use crate::error::{EtlError, Result};
use crate::table::Table;
use arrow::csv::{reader::Format, ReaderBuilder};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{
    fs::File,
    io::{Seek, SeekFrom},
    path::Path,
    sync::Arc,
};
use tracing::{debug, info};

pub use join::inner_join;

/// Column the two sources are merged on unless told otherwise.
pub const DEFAULT_JOIN_KEY: &str = "index";

/// Read both sources fully and inner-join them on `join_key`.
///
/// Row order follows the CSV source. Fails with a source error if either
/// file is missing or malformed, and with a merge error if `join_key` is
/// absent from either side.
pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(
    row_source: P,
    columnar_source: Q,
    join_key: &str,
) -> Result<Table> {
    let store = read_csv(row_source)?;
    let extra = read_parquet(columnar_source)?;
    let merged = inner_join(&store, &extra, join_key)?;
    info!(
        rows = merged.num_rows(),
        columns = merged.num_columns(),
        "extracted and merged sources"
    );
    Ok(merged)
}

/// Load a comma-separated file with a header row.
///
/// Cell types are inferred over the whole file (ints, floats, booleans,
/// `YYYY-MM-DD` dates, otherwise strings); empty cells are null. A blank
/// header is named `Unnamed: <position>`.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| EtlError::source_file(path, e))?;

    // pass 1: infer types over every record
    let (schema, records) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, None)
        .map_err(|e| EtlError::source_file(path, e))?;
    debug!(records, fields = schema.fields().len(), "inferred csv schema");

    // pass 2: read with the inferred schema
    file.seek(SeekFrom::Start(0))
        .map_err(|e| EtlError::source_file(path, e))?;
    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .build(file)
        .map_err(|e| EtlError::source_file(path, e))?;
    let batches = reader
        .collect::<std::result::Result<Vec<RecordBatch>, ArrowError>>()
        .map_err(|e| EtlError::source_file(path, e))?;

    let mut table =
        Table::from_batches(&schema, &batches).map_err(|e| EtlError::source_file(path, e))?;
    name_unnamed_columns(&mut table);

    info!(rows = table.num_rows(), columns = table.num_columns(), "read csv");
    Ok(table)
}

/// Load a Parquet file using its embedded schema.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_parquet<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| EtlError::source_file(path, e))?;

    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| EtlError::source_file(path, e))?;
    let schema = builder.schema().clone();
    debug!(
        row_groups = builder.metadata().num_row_groups(),
        fields = schema.fields().len(),
        "opened parquet"
    );
    let reader = builder
        .build()
        .map_err(|e| EtlError::source_file(path, e))?;
    let batches = reader
        .collect::<std::result::Result<Vec<RecordBatch>, ArrowError>>()
        .map_err(|e| EtlError::source_file(path, e))?;

    let table =
        Table::from_batches(&schema, &batches).map_err(|e| EtlError::source_file(path, e))?;
    info!(rows = table.num_rows(), columns = table.num_columns(), "read parquet");
    Ok(table)
}

fn name_unnamed_columns(table: &mut Table) {
    let blanks: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.trim().is_empty())
        .map(|(i, _)| i)
        .collect();
    for i in blanks {
        table.rename_column(i, format!("Unnamed: {}", i));
    }
}
