//! Error taxonomy for engine operations.
//!
//! Geometry operations (snap, guides, align, distribute) never return these;
//! they degrade to no-ops. Only document-level operations and the exchange
//! format fail.

use crate::pages::PageId;
use crate::shapes::ObjectId;
use thiserror::Error;

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The page cannot be rendered or loaded: empty or non-positive dimensions.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// An image source reference could not be resolved.
    #[error("Unresolved asset: {0}")]
    UnresolvedAsset(String),
    /// Attempt to delete the only remaining page of a document.
    #[error("Cannot delete the last remaining page")]
    LastPageDeletion,
    #[error("Page not found: {0}")]
    PageNotFound(PageId),
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),
    /// A strict batch record left a placeholder unresolved.
    #[error("Record {record} has no value for placeholder {{{{{key}}}}}")]
    MissingPlaceholder { record: String, key: String },
    #[error("Invalid export settings: {0}")]
    InvalidExportSpec(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_placeholder_message() {
        let err = EngineError::MissingPlaceholder {
            record: "row-1".to_string(),
            key: "city".to_string(),
        };
        assert_eq!(err.to_string(), "Record row-1 has no value for placeholder {{city}}");
    }
}
