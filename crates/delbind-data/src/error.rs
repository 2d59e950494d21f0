//! Error types for dataset access and submission output.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DataError>;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot open dataset {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parquet error in {path}: {source}")]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },

    #[error("error decoding batch from {path}: {source}")]
    Batch {
        path: PathBuf,
        #[source]
        source: arrow_schema::ArrowError,
    },

    #[error("column {column:?} not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("column {column:?} has unsupported type {datatype}")]
    ColumnType { column: String, datatype: String },

    #[error("null value in column {column:?} at row {row}")]
    NullValue { column: String, row: usize },

    #[error("id column {column:?} value {value} at row {row} overflows i64")]
    IdOverflow {
        column: String,
        value: u64,
        row: usize,
    },

    #[error("outcome column {column:?} holds non-binary value {value}")]
    NonBinaryOutcome { column: String, value: i64 },

    #[error("class {label} has only {available} rows, {requested} requested")]
    InsufficientClass {
        label: u8,
        available: usize,
        requested: usize,
    },

    #[error("submission file error: {0}")]
    Submission(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
