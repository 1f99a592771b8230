//! Error types for the ManualQA core.
//!
//! This module defines a unified error enum covering every failure
//! category in the system: collaborator failures (parsing, embedding,
//! generation, timeouts), input validation, configuration, and I/O.

use thiserror::Error;

/// Unified error type for ManualQA.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
///
/// Collaborator-origin errors (`Parse`, `Embedding`, `Generation`,
/// `CollaboratorTimeout`) are never retried automatically: on the
/// ingestion path they drive the owning document to `Failed`, on the
/// query path they resolve to the insufficient-information fallback.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF-structuring collaborator failures
    #[error("Parse error: {0}")]
    Parse(String),

    /// Embedding collaborator failures
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// LLM completion collaborator failures
    #[error("Generation error: {0}")]
    Generation(String),

    /// An external collaborator call exceeded its deadline
    #[error("Collaborator '{collaborator}' timed out after {timeout_secs}s")]
    CollaboratorTimeout {
        collaborator: String,
        timeout_secs: u64,
    },

    /// Bad input rejected before any collaborator call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Construct a timeout error for a named collaborator.
    pub fn timeout(collaborator: impl Into<String>, timeout_secs: u64) -> Self {
        AppError::CollaboratorTimeout {
            collaborator: collaborator.into(),
            timeout_secs,
        }
    }

    /// Whether this error originated in an external collaborator.
    ///
    /// The query path degrades these to the fallback answer instead of
    /// surfacing a fault to the presentation layer.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            AppError::Parse(_)
                | AppError::Embedding(_)
                | AppError::Generation(_)
                | AppError::CollaboratorTimeout { .. }
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = AppError::timeout("parser", 30);
        assert_eq!(err.to_string(), "Collaborator 'parser' timed out after 30s");
    }

    #[test]
    fn test_collaborator_failure_classification() {
        assert!(AppError::Parse("bad pdf".into()).is_collaborator_failure());
        assert!(AppError::Embedding("down".into()).is_collaborator_failure());
        assert!(AppError::Generation("down".into()).is_collaborator_failure());
        assert!(AppError::timeout("llm", 10).is_collaborator_failure());
        assert!(!AppError::Validation("empty".into()).is_collaborator_failure());
        assert!(!AppError::Config("missing".into()).is_collaborator_failure());
    }
}
