//! Error types for the intramom pipeline.
//!
//! Only genuine failures are represented here. A security without enough
//! history, a date without a loading table or a missing weight row are
//! reported as `Ok(None)` by the components and never reach this type.

use thiserror::Error;

/// The main error type for intramom operations.
#[derive(Debug, Error)]
pub enum IntramomError {
    /// A numeric computation failed, e.g. a log-return over a non-positive price.
    #[error("Computation failed: {0}")]
    Computation(String),

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error when data is insufficient for the requested operation.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Error when a date is out of range or invalid.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Error fetching data from a collaborator.
    #[error("Data fetch error: {0}")]
    DataFetch(String),

    /// Error reading or writing the file system.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reading or writing CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl From<String> for IntramomError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for IntramomError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for intramom operations.
pub type Result<T> = std::result::Result<T, IntramomError>;
