//! Errors raised while assembling the version registry or rendering
//! resources for the wire.

use std::fmt;

/// Errors from the versioned API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A version name was requested that no implementation provides.
    #[error("Unknown API version: {name}")]
    UnknownVersion {
        /// The requested version name.
        name: String,
    },

    /// The process-wide registry was already published.
    #[error("Version registry already published")]
    AlreadyPublished,

    /// The process-wide registry has not been published yet.
    #[error("Version registry not published")]
    NotPublished,

    /// A canonical value could not be rendered to its wire shape.
    #[error("Marshal error: {0}")]
    Marshal(#[from] serde_json::Error),
}

impl ApiError {
    /// Creates a new `UnknownVersion` error.
    #[must_use]
    pub fn unknown_version(name: impl Into<String>) -> Self {
        Self::UnknownVersion { name: name.into() }
    }

    /// Returns `true` if this is an unknown version error.
    #[must_use]
    pub fn is_unknown_version(&self) -> bool {
        matches!(self, Self::UnknownVersion { .. })
    }

    /// Returns the error category for logging.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownVersion { .. } => ErrorCategory::Configuration,
            Self::AlreadyPublished | Self::NotPublished => ErrorCategory::Initialization,
            Self::Marshal(_) => ErrorCategory::Serialization,
        }
    }
}

/// Error categories for classification in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Initialization,
    Serialization,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Initialization => write!(f, "initialization"),
            Self::Serialization => write!(f, "serialization"),
        }
    }
}

/// Result type for versioned API operations.
pub type Result<T> = std::result::Result<T, ApiError>;
