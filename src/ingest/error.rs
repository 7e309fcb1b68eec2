//! Ingestion error types

use crate::source::SourceError;
use thiserror::Error;

/// Errors that can occur while populating the mapping database
#[derive(Error, Debug)]
pub enum IngestError {
    /// Request could not be sent or the body not read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a failure status
    #[error("API error: {0}")]
    Api(String),

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// A change timestamp was not RFC 3339
    #[error("Invalid timestamp {value:?}: {error}")]
    Timestamp { value: String, error: String },

    /// Mapping database write failed; the page was rolled back
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Table error: {0}")]
    Table(#[from] SourceError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// CSV row with missing or unparseable columns
    #[error("Line {line}: {message}")]
    Row { line: u64, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure while processing a specific page
    #[error("Page {page}: {source}")]
    Page {
        page: u32,
        #[source]
        source: Box<IngestError>,
    },
}

/// Result type alias for ingestion operations
pub type IngestResult<T> = Result<T, IngestError>;
