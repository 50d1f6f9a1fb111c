use thiserror::Error;

/// Errors raised while loading a listings file. All of them are fatal at
/// startup: there is nothing to query without a dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `csv::Error` already names itself in its message.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("Malformed input: {0}")]
    Malformed(String),

    #[error("Row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}
