//! Error taxonomy of the request flow.
//!
//! Every variant maps onto an ARM error response through
//! [`FrontendError::to_cloud_error`].

use std::fmt;

use hcp_api::ApiError;
use hcp_core::CloudError;
use hcp_core::arm::error::CLOUD_ERROR_CODE_SERVICE_UNAVAILABLE;
use hcp_database::DatabaseError;

#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    /// The request names an `api-version` nobody registered.
    #[error("Unsupported API version: {api_version}")]
    UnsupportedApiVersion { api_version: String },

    /// The request body failed structural validation.
    #[error("Validation failed: {0}")]
    Validation(CloudError),

    /// Another operation already owns the resource.
    #[error("An operation is already in progress on {resource_id}")]
    AlreadyInProgress {
        resource_id: String,
        operation_id: Option<String>,
    },

    #[error("Not found: {target}")]
    NotFound { target: String },

    /// Concurrency conflicts outlasted the retry budget.
    #[error("Transient failure: {0}")]
    Transient(DatabaseError),

    #[error("Database error: {0}")]
    Database(DatabaseError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration could not be loaded at startup.
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl FrontendError {
    #[must_use]
    pub fn unsupported_api_version(api_version: impl Into<String>) -> Self {
        Self::UnsupportedApiVersion {
            api_version: api_version.into(),
        }
    }

    #[must_use]
    pub fn already_in_progress(
        resource_id: impl Into<String>,
        operation_id: Option<String>,
    ) -> Self {
        Self::AlreadyInProgress {
            resource_id: resource_id.into(),
            operation_id,
        }
    }

    #[must_use]
    pub fn not_found(target: impl Into<String>) -> Self {
        Self::NotFound {
            target: target.into(),
        }
    }

    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_already_in_progress(&self) -> bool {
        matches!(self, Self::AlreadyInProgress { .. })
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedApiVersion { .. } | Self::Validation(_) => ErrorCategory::Validation,
            Self::AlreadyInProgress { .. } => ErrorCategory::Conflict,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Transient(_) => ErrorCategory::Transient,
            Self::Database(_) | Self::Api(_) | Self::Config { .. } | Self::Internal { .. } => {
                ErrorCategory::Internal
            }
        }
    }

    /// The ARM error response for this failure.
    pub fn to_cloud_error(&self) -> CloudError {
        match self {
            Self::UnsupportedApiVersion { api_version } => {
                CloudError::unsupported_api_version(api_version)
            }
            Self::Validation(err) => err.clone(),
            Self::AlreadyInProgress { resource_id, .. } => CloudError::conflict(
                resource_id.clone(),
                format!("An operation is already in progress on '{resource_id}'."),
            ),
            Self::NotFound { target } => CloudError::not_found(target.clone()),
            Self::Transient(_) => CloudError::new(
                503,
                CLOUD_ERROR_CODE_SERVICE_UNAVAILABLE,
                None,
                "The request conflicted with concurrent changes. Retry the request.",
            ),
            Self::Database(_) | Self::Api(_) | Self::Config { .. } | Self::Internal { .. } => {
                CloudError::internal_server_error()
            }
        }
    }
}

impl From<DatabaseError> for FrontendError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { id, .. } => Self::NotFound { target: id },
            e if e.is_retriable() => Self::Transient(e),
            e => Self::Database(e),
        }
    }
}

impl From<CloudError> for FrontendError {
    fn from(err: CloudError) -> Self {
        Self::Validation(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    NotFound,
    Transient,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Conflict => write!(f, "conflict"),
            Self::NotFound => write!(f, "not_found"),
            Self::Transient => write!(f, "transient"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrontendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_escalates_as_transient() {
        let err: FrontendError = DatabaseError::concurrency_conflict("doc", "\"a\"", "\"b\"").into();
        assert!(err.is_transient());
        assert_eq!(err.category().to_string(), "transient");
        assert_eq!(err.to_cloud_error().status_code, 503);
    }

    #[test]
    fn test_not_found_keeps_target() {
        let err: FrontendError = DatabaseError::not_found("sub", "/subscriptions/sub/x").into();
        assert!(err.is_not_found());
        let cloud = err.to_cloud_error();
        assert_eq!(cloud.status_code, 404);
        assert_eq!(cloud.target(), Some("/subscriptions/sub/x"));
    }

    #[test]
    fn test_already_in_progress_is_conflict() {
        let err = FrontendError::already_in_progress("/subscriptions/sub/x", Some("op".into()));
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert_eq!(err.to_cloud_error().status_code, 409);
    }

    #[test]
    fn test_validation_passes_cloud_error_through() {
        let cloud = CloudError::property_change_not_allowed("properties.spec.vmSize");
        let err = FrontendError::from(cloud.clone());
        assert!(err.is_validation());
        assert_eq!(err.to_cloud_error(), cloud);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err: FrontendError = DatabaseError::internal("disk full").into();
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert_eq!(err.to_cloud_error(), CloudError::internal_server_error());
    }
}
