//! Tagging engine error types

use crate::source::SourceError;
use thiserror::Error;

/// Errors surfaced by the tagging engine
#[derive(Error, Debug)]
pub enum TaggerError {
    /// A label source failed while rebuilding an index.
    /// The previous indices stay in service.
    #[error("Reload of {attribute} from {location} failed: {source}")]
    Reload {
        attribute: String,
        location: String,
        #[source]
        source: SourceError,
    },

    /// A label source could not be constructed
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Two attribute specs read the same tag
    #[error("Attribute already registered: {0}")]
    DuplicateAttribute(String),
}

/// Result type alias for tagging engine operations
pub type TaggerResult<T> = Result<T, TaggerError>;
