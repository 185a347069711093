//! Error types for docmap
//!
//! This module defines the error taxonomy shared by every layer.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Store failures are carried through [`Error::Store`] unchanged: the
//! container never retries and never reinterprets a backend error.

use crate::types::{DocId, MappingKey};
use thiserror::Error;

/// Result type alias for docmap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for operations against a [`Store`](crate::traits::Store)
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by a document store backend
///
/// Retry and backoff are the backend's concern; these are surfaced to the
/// caller as-is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The operation did not complete in time
    #[error("store operation timed out: {0}")]
    Timeout(String),

    /// The connection to the backend was lost
    #[error("store connection lost: {0}")]
    ConnectionLost(String),

    /// Any other backend failure
    #[error("store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether the failure is transient (a retry by the backend could succeed)
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Timeout(_) | StoreError::ConnectionLost(_))
    }
}

/// Error types for container operations
#[derive(Debug, Error)]
pub enum Error {
    /// A mapping key could not be derived, or conflicts with the identity policy
    #[error("identity error: {0}")]
    Identity(String),

    /// Invalid policy/field combination, detected before any store access
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No object is stored under the key
    #[error("key not found: {0}")]
    KeyNotFound(MappingKey),

    /// The key is already bound to a different object
    #[error("key '{0}' is already bound to a different object")]
    KeyCollision(MappingKey),

    /// More than one stored row matches what must be a unique key
    #[error("integrity violation: more than one row in '{table}' matches key '{key}'")]
    Integrity {
        /// Backing table
        table: String,
        /// The key that should have been unique
        key: MappingKey,
    },

    /// A single-result lookup matched more than one row
    #[error("expected at most one result in '{table}', found several")]
    MultipleResults {
        /// Backing table
        table: String,
    },

    /// The codec could not turn a stored document into an object
    #[error("failed to decode document {id}: {reason}")]
    Decode {
        /// Identifier of the offending row
        id: DocId,
        /// Codec failure description
        reason: String,
    },

    /// The codec could not turn an object into a document
    #[error("failed to encode object: {0}")]
    Encode(String),

    /// A predicate, field path or legacy filter could not be translated
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Backend failure, forwarded unchanged
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    /// Build an [`Error::Identity`]
    pub fn identity(msg: impl Into<String>) -> Self {
        Error::Identity(msg.into())
    }

    /// Build an [`Error::Configuration`]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Build an [`Error::Decode`]
    pub fn decode(id: DocId, reason: impl Into<String>) -> Self {
        Error::Decode {
            id,
            reason: reason.into(),
        }
    }

    /// Build an [`Error::Encode`]
    pub fn encode(msg: impl Into<String>) -> Self {
        Error::Encode(msg.into())
    }

    /// Build an [`Error::InvalidQuery`]
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Error::InvalidQuery(msg.into())
    }

    /// True for [`Error::KeyNotFound`]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound(_))
    }

    /// The forwarded store error, if this is one
    pub fn as_store_error(&self) -> Option<&StoreError> {
        match self {
            Error::Store(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_key_not_found() {
        let err = Error::KeyNotFound(MappingKey::from("roy"));
        let msg = err.to_string();
        assert!(msg.contains("key not found"));
        assert!(msg.contains("roy"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_error_display_integrity() {
        let err = Error::Integrity {
            table: "person".to_string(),
            key: MappingKey::from("stephan"),
        };
        let msg = err.to_string();
        assert!(msg.contains("integrity violation"));
        assert!(msg.contains("person"));
        assert!(msg.contains("stephan"));
    }

    #[test]
    fn test_error_display_decode() {
        let err = Error::decode(DocId::new("abc"), "missing field `name`");
        let msg = err.to_string();
        assert!(msg.contains("abc"));
        assert!(msg.contains("missing field"));
    }

    #[test]
    fn test_store_error_is_forwarded_transparently() {
        let store_err = StoreError::Timeout("select on person".to_string());
        let err: Error = store_err.clone().into();
        assert_eq!(err.to_string(), store_err.to_string());
        assert_eq!(err.as_store_error(), Some(&store_err));
    }

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::Timeout("t".into()).is_transient());
        assert!(StoreError::ConnectionLost("c".into()).is_transient());
        assert!(!StoreError::Backend("b".into()).is_transient());
    }

    #[test]
    fn test_error_pattern_matching() {
        let err = Error::KeyCollision(MappingKey::from("a"));
        match err {
            Error::KeyCollision(key) => assert_eq!(key.as_str(), "a"),
            _ => panic!("Wrong error variant"),
        }
    }
}
