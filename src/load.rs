// src/load.rs
use crate::error::{EtlError, Result};
use crate::table::Table;
use arrow::csv::WriterBuilder;
use arrow::record_batch::RecordBatch;
use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::info;

/// Write the clean table, then the aggregate, each as CSV with a header row.
///
/// Parent directories must already exist. If the second write fails the
/// first file stays on disk.
#[tracing::instrument(
    level = "info",
    skip_all,
    fields(clean = %clean_path.as_ref().display(), agg = %agg_path.as_ref().display())
)]
pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
    clean: &Table,
    clean_path: P,
    agg: &Table,
    agg_path: Q,
) -> Result<()> {
    write_csv(clean, clean_path)?;
    write_csv(agg, agg_path)?;
    Ok(())
}

fn arrow_io(path: &Path, err: arrow::error::ArrowError) -> EtlError {
    EtlError::io(path, io::Error::new(io::ErrorKind::Other, err))
}

/// Write `table` to `path` in column order, no index column.
///
/// Goes through a sibling `.tmp` file renamed over `path`, so an existing
/// file is only replaced by a complete one.
pub fn write_csv<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    let batch = table.to_batch().map_err(|e| arrow_io(path, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path: PathBuf = path.with_file_name(format!(".{}.tmp", file_name));

    let file = File::create(&tmp_path).map_err(|e| EtlError::io(path, e))?;
    if let Err(e) = write_and_rename(&batch, file, &tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    info!(path = %path.display(), rows = table.num_rows(), "wrote csv");
    Ok(())
}

fn write_and_rename(batch: &RecordBatch, file: File, tmp_path: &Path, path: &Path) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .with_header(true)
        .build(BufWriter::new(file));
    writer.write(batch).map_err(|e| arrow_io(path, e))?;
    writer
        .into_inner()
        .flush()
        .map_err(|e| EtlError::io(path, e))?;
    fs::rename(tmp_path, path).map_err(|e| EtlError::io(path, e))
}
