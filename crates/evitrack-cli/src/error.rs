//! Error types for the Evitrack CLI
//!
//! Every variant is user-facing: the message says what went wrong and, where
//! there is one, what to do about it.

use thiserror::Error;

/// Result type alias for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Error taxonomy for the evidence tracker
#[derive(Error, Debug)]
pub enum TrackerError {
    /// A required field was blank or malformed
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Preloaded evidence is protected under the controls policy
    #[error("'{name}' on {node} is preloaded evidence and cannot be deleted. Only evidence uploaded in this session can be removed.")]
    PolicyViolation { node: String, name: String },

    /// Node, attachment, or ledger entry does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Catalog file is structurally invalid
    #[error("Invalid catalog: {0}. Every node needs a unique, non-empty id.")]
    InvalidCatalog(String),

    /// Key/value store failed (rusqlite)
    #[error("Storage error: {0}. Check that the data directory is writable.")]
    Storage(#[from] rusqlite::Error),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// YAML catalog parsing failed
    #[error("Failed to parse catalog YAML: {0}. Check the file syntax at the indicated line/column.")]
    YamlParse(#[from] serde_yaml::Error),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your EVITRACK_* environment variables.")]
    Config(String),

    /// Shared utility failure (checksums and the like)
    #[error(transparent)]
    Common(#[from] evitrack_common::CommonError),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// An error the user has already seen as a notice
    #[error(transparent)]
    Reported(Box<TrackerError>),
}

impl TrackerError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a policy violation for a protected attachment
    pub fn policy_violation(node: impl Into<String>, name: impl Into<String>) -> Self {
        Self::PolicyViolation {
            node: node.into(),
            name: name.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid catalog error
    pub fn invalid_catalog(msg: impl Into<String>) -> Self {
        Self::InvalidCatalog(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Mark the error as already shown, so front ends do not print it again
    pub fn reported(self) -> Self {
        match self {
            Self::Reported(_) => self,
            other => Self::Reported(Box::new(other)),
        }
    }

    pub fn is_reported(&self) -> bool {
        matches!(self, Self::Reported(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_violation_message_names_the_record() {
        let err = TrackerError::policy_violation("5.1", "Access-Policy.pdf");
        let msg = err.to_string();
        assert!(msg.contains("Access-Policy.pdf"));
        assert!(msg.contains("5.1"));
    }

    #[test]
    fn test_reported_keeps_message_and_does_not_nest() {
        let err = TrackerError::validation("evidence name cannot be empty").reported();
        assert!(err.is_reported());
        assert_eq!(err.to_string(), "Validation failed: evidence name cannot be empty");

        match err.reported() {
            TrackerError::Reported(inner) => assert!(matches!(*inner, TrackerError::Validation(_))),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!TrackerError::not_found("node 9.9").is_reported());
    }

    #[test]
    fn test_checksum_errors_pass_through() {
        let err: TrackerError = evitrack_common::CommonError::ChecksumMismatch {
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Checksum mismatch: expected aa, got bb");
    }
}
