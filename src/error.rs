use thiserror::Error;

/// Errors that can escape the summary pipeline.
///
/// Failures of external summary commands never show up here: they are
/// recovered by moving on to the next candidate or to the local summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// The dataset could not be serialized to JSON
    #[error("failed to serialize dataset: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while turning uploaded bytes into a dataset
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("uploaded file is empty")]
    Empty,

    #[error("file has no extension")]
    MissingExtension,

    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read workbook: {0}")]
    Workbook(String),

    #[error("no sheets found in workbook")]
    NoSheets,
}

/// Errors raised by the upload store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage data is corrupt: {0}")]
    Json(#[from] serde_json::Error),

    #[error("upload not found or not authorized")]
    NotFound,
}
