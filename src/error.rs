//! Error types for the ETL pipeline.

use std::path::Path;
use thiserror::Error;

/// Result type alias using [`EtlError`].
pub type Result<T> = std::result::Result<T, EtlError>;

/// Every failure a pipeline run can end with. All of them are fatal for the run.
#[derive(Error, Debug)]
pub enum EtlError {
    /// Input file missing, unreadable, or structurally invalid.
    #[error("Source error: {0}")]
    Source(String),

    /// A required column is absent (or has an unusable type).
    #[error("Schema error: {0}")]
    Schema(String),

    /// The join key is absent from one side of the merge, or its types cannot match.
    #[error("Merge error: {0}")]
    Merge(String),

    /// A non-null value could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Destination unwritable, or any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file unreadable or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EtlError {
    /// Source error tied to the file it came from.
    pub fn source_file(path: &Path, msg: impl std::fmt::Display) -> Self {
        EtlError::Source(format!("{}: {}", path.display(), msg))
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        EtlError::Schema(msg.into())
    }

    pub fn merge(msg: impl Into<String>) -> Self {
        EtlError::Merge(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        EtlError::Parse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        EtlError::Config(msg.into())
    }

    /// I/O error annotated with the path being written.
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        EtlError::Io(std::io::Error::new(
            err.kind(),
            format!("{}: {}", path.display(), err),
        ))
    }
}
