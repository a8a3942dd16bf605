//! Error types for document store operations.

use std::fmt;

/// Errors that can occur while reading or writing documents.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// The requested document was not found.
    #[error("Document not found: {partition_key}/{id}")]
    NotFound {
        /// Partition the document was looked up in.
        partition_key: String,
        /// Document id or resource key.
        id: String,
    },

    /// The stored concurrency token no longer matches the one supplied.
    #[error("Concurrency conflict on {id}: expected {expected}, found {actual}")]
    ConcurrencyConflict {
        id: String,
        expected: String,
        actual: String,
    },

    /// An insert-only write found an existing document.
    #[error("Document already exists: {partition_key}/{id}")]
    AlreadyExists { partition_key: String, id: String },

    /// A document did not have the expected shape.
    #[error("Invalid document: {message}")]
    InvalidDocument { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal store error occurred.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DatabaseError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(partition_key: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            partition_key: partition_key.into(),
            id: id.into(),
        }
    }

    /// Creates a new `ConcurrencyConflict` error.
    #[must_use]
    pub fn concurrency_conflict(
        id: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::ConcurrencyConflict {
            id: id.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(partition_key: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            partition_key: partition_key.into(),
            id: id.into(),
        }
    }

    /// Creates a new `InvalidDocument` error.
    #[must_use]
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a concurrency conflict.
    #[must_use]
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }

    /// Returns `true` if this is an already exists error.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Returns `true` if re-reading and redeciding may succeed.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrencyConflict { .. } | Self::AlreadyExists { .. }
        )
    }

    /// Returns the error category for logging.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::ConcurrencyConflict { .. } | Self::AlreadyExists { .. } => {
                ErrorCategory::Conflict
            }
            Self::InvalidDocument { .. } | Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of database errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Conflict,
    Serialization,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Serialization => write!(f, "serialization"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
