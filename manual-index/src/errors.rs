//! Unified error types for the crate.

use std::time::Duration;

use thiserror::Error;

use crate::record::RecordId;

/// Top-level error for store, embedding, index and query operations.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The service has not published an index yet.
    #[error("index is not ready yet, retry later")]
    NotReady,

    /// The published index holds no entries.
    #[error("index is empty")]
    EmptyIndex,

    /// No candidate reached the configured similarity floor.
    #[error("no match with similarity >= {min_score}")]
    NoMatch { min_score: f32 },

    /// Input could not be embedded (corrupt image, empty text, wrong modality).
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// A record with the same id is already stored.
    #[error("duplicate record id {0}")]
    Duplicate(RecordId),

    /// No record with this id.
    #[error("record {0} not found")]
    NotFound(RecordId),

    /// Embedding or index query exceeded the caller's deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Mismatch in vector dimensionality.
    #[error("vector size mismatch: got {got}, want {want}")]
    DimensionMismatch { got: usize, want: usize },

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Corpus manifest line could not be parsed.
    #[error("parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// Remote embedding backend failed.
    #[error("embedding backend error: {0}")]
    Embedding(String),

    /// Background task failure or broken invariant.
    #[error("internal: {0}")]
    Internal(String),
}

/// Coarse classification used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Retry once the service is ready.
    Unavailable,
    /// Valid request, nothing usable found (no hit, unknown record).
    NoResult,
    /// The caller sent something wrong.
    InvalidInput,
    /// Retry with backoff.
    Transient,
    /// Server-side fault.
    Internal,
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::NotReady => ErrorKind::Unavailable,
            SearchError::EmptyIndex | SearchError::NoMatch { .. } | SearchError::NotFound(_) => {
                ErrorKind::NoResult
            }
            SearchError::UnsupportedInput(_)
            | SearchError::Duplicate(_)
            | SearchError::DimensionMismatch { .. } => ErrorKind::InvalidInput,
            SearchError::Timeout(_) => ErrorKind::Transient,
            SearchError::Config(_)
            | SearchError::Io(_)
            | SearchError::Parse { .. }
            | SearchError::Embedding(_)
            | SearchError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<tokio::task::JoinError> for SearchError {
    fn from(err: tokio::task::JoinError) -> Self {
        SearchError::Internal(format!("background task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_errors_by_caller_reaction() {
        assert_eq!(SearchError::NotReady.kind(), ErrorKind::Unavailable);
        assert_eq!(SearchError::EmptyIndex.kind(), ErrorKind::NoResult);
        assert_eq!(SearchError::NoMatch { min_score: 0.4 }.kind(), ErrorKind::NoResult);
        assert_eq!(SearchError::NotFound(RecordId(9)).kind(), ErrorKind::NoResult);
        assert_eq!(
            SearchError::UnsupportedInput("empty text".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            SearchError::DimensionMismatch { got: 3, want: 4 }.kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            SearchError::Timeout(Duration::from_secs(1)).kind(),
            ErrorKind::Transient
        );
        assert_eq!(
            SearchError::Embedding("connection refused".into()).kind(),
            ErrorKind::Internal
        );
    }
}
