//! Error types for rgeocoder.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GeocodeError>;

/// Errors surfaced by the geocoder, its loader, and the query dispatcher.
#[derive(Error, Debug)]
pub enum GeocodeError {
    /// A coordinate or configuration value is out of range or non-finite.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The dataset header or shape does not match the expected layout.
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    /// The dispatcher was cancelled while a batch was in flight.
    #[error("query batch cancelled")]
    Cancelled,

    /// A worker thread or its channel failed unexpectedly.
    #[error("worker pool failure: {0}")]
    WorkerPool(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
