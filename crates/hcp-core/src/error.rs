use thiserror::Error;

/// Core error types for HCP frontend primitives
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid resource ID '{id}': {reason}")]
    InvalidResourceId { id: String, reason: String },

    #[error("Invalid provisioning state: {0}")]
    InvalidProvisioningState(String),

    #[error("Invalid request method: {0}")]
    InvalidMethod(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Time parsing error: {0}")]
    TimeError(#[from] time::error::Parse),
}

impl CoreError {
    /// Create a new InvalidResourceId error
    pub fn invalid_resource_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResourceId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidProvisioningState error
    pub fn invalid_provisioning_state(state: impl Into<String>) -> Self {
        Self::InvalidProvisioningState(state.into())
    }

    /// Create a new InvalidMethod error
    pub fn invalid_method(method: impl Into<String>) -> Self {
        Self::InvalidMethod(method.into())
    }

    /// Create a new InvalidTimestamp error
    pub fn invalid_timestamp(message: impl Into<String>) -> Self {
        Self::InvalidTimestamp(message.into())
    }

    /// Check if this error was caused by caller input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidResourceId { .. }
                | Self::InvalidProvisioningState(_)
                | Self::InvalidMethod(_)
                | Self::JsonError(_)
        )
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidResourceId { .. }
            | Self::InvalidProvisioningState(_)
            | Self::InvalidMethod(_) => ErrorCategory::Validation,
            Self::InvalidTimestamp(_) | Self::TimeError(_) => ErrorCategory::System,
            Self::JsonError(_) => ErrorCategory::Serialization,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Serialization,
    System,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Serialization => write!(f, "serialization"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
