//! Error types shared by collection handles and typed resources.

use thiserror::Error;

use crate::models::CategoryKind;
use crate::store::StoreError;

/// Input rejected on the client before any remote call is made.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("A {kind} category named '{name}' already exists")]
    DuplicateCategory { name: String, kind: CategoryKind },

    #[error("Price must be a non-negative number, got {0}")]
    InvalidPrice(f64),

    #[error("Rating must be between 0 and 5, got {0}")]
    InvalidRating(f64),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("Opening time {open} must be before closing time {close}")]
    InvalidPeriod { open: String, close: String },

    #[error("Invalid country code '{0}', expected two letters")]
    InvalidCountry(String),
}

/// Errors returned by [`crate::Collection`] and the typed resources.
#[derive(Error, Debug)]
pub enum CollectionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to encode fields: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode document {id}: {source}")]
    Decode {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Fields must serialize to an object")]
    NotAnObject,
}

impl CollectionError {
    /// Returns true when the error was raised before reaching the store.
    pub fn is_validation(&self) -> bool {
        matches!(self, CollectionError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_category_message() {
        let err = ValidationError::DuplicateCategory {
            name: "Pottery".to_string(),
            kind: CategoryKind::Crafts,
        };
        assert_eq!(
            err.to_string(),
            "A crafts category named 'Pottery' already exists"
        );
    }

    #[test]
    fn test_store_error_is_transparent() {
        let err = CollectionError::from(StoreError::Network("connection reset".to_string()));
        assert_eq!(err.to_string(), "Network error: connection reset");
        assert!(!err.is_validation());
    }

    #[test]
    fn test_validation_detection() {
        let err = CollectionError::from(ValidationError::Empty("name"));
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "name must not be empty");
    }
}
