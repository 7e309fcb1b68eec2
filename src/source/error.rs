//! Label source error types

use thiserror::Error;

/// Errors raised while reading mapping rows
#[derive(Error, Debug)]
pub enum SourceError {
    /// Database could not be opened or queried
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Table name is not a plain SQL identifier
    #[error("Invalid table name: {0:?}")]
    InvalidTable(String),

    /// Database file is missing
    #[error("Mapping database not found: {0}")]
    NotFound(String),
}

/// Result type alias for label source operations
pub type SourceResult<T> = Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SourceError::InvalidTable("x; DROP TABLE y".to_string());
        assert_eq!(err.to_string(), "Invalid table name: \"x; DROP TABLE y\"");

        let err = SourceError::NotFound("/tmp/none.db".to_string());
        assert_eq!(err.to_string(), "Mapping database not found: /tmp/none.db");
    }
}
