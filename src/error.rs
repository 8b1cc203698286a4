use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the collection and aggregation pipeline.
///
/// Per-source failures (`Fetch`, `Csv`, `NoValidListings`, `LocalFileMissing`)
/// are caught at the per-source boundary and turned into a skip; only
/// batch-level preconditions propagate to the caller.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("currency {0} not found in conversion rates")]
    UnknownCurrency(String),

    #[error("no valid listings found for {0}")]
    NoValidListings(String),

    #[error("no local CSV files found; run `pull_data pull` first to download the data")]
    NoLocalDataAvailable,

    #[error("local CSV file not found: {0}; run a hard pull first")]
    LocalFileMissing(PathBuf),

    #[error("city {0} not found in sources")]
    UnknownSource(String),

    #[error("invalid source url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
