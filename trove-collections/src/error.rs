//! Error types for the collections engine

use std::path::PathBuf;
use thiserror::Error;

/// Result type for collection operations
pub type Result<T> = std::result::Result<T, CollectionsError>;

/// Errors that can occur in collection operations
#[derive(Debug, Error)]
pub enum CollectionsError {
    /// No collection store found at or above the given path
    #[error("no collection store found at {path}")]
    NotInitialized { path: PathBuf },

    /// Collection not found
    #[error("collection not found: {id}")]
    NotFound { id: i64 },

    /// Actor lacks the capability for the attempted action
    #[error("permission denied: cannot {action} {target}")]
    PermissionDenied { action: String, target: String },

    /// Input failed validation
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// State changed underneath a mutation and the whole operation aborted
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Lock is held by another process
    #[error("lock busy - another operation in progress")]
    LockBusy,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CollectionsError {
    /// Create a not-found error for a raw collection id
    pub fn not_found(id: i64) -> Self {
        Self::NotFound { id }
    }

    /// Create a permission-denied error
    pub fn permission_denied(action: impl Into<String>, target: impl Into<String>) -> Self {
        Self::PermissionDenied {
            action: action.into(),
            target: target.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockBusy | Self::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CollectionsError::not_found(42);
        assert_eq!(err.to_string(), "collection not found: 42");
    }

    #[test]
    fn test_permission_denied_display() {
        let err = CollectionsError::permission_denied("write", "collection 7");
        assert_eq!(err.to_string(), "permission denied: cannot write collection 7");
    }

    #[test]
    fn test_validation_error() {
        let err = CollectionsError::validation("name must not be blank");
        assert!(err.to_string().contains("name must not be blank"));
    }

    #[test]
    fn test_retryable() {
        assert!(CollectionsError::LockBusy.is_retryable());
        assert!(CollectionsError::conflict("location changed").is_retryable());
        assert!(!CollectionsError::not_found(1).is_retryable());
    }
}
