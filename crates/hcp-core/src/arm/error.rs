//! ARM cloud error envelope.
//!
//! Structural validation failures are reported with these types. The body
//! follows the OData error shape ARM clients expect: a code, a message, an
//! optional target naming the offending field, and nested details.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const CLOUD_ERROR_CODE_INTERNAL_SERVER_ERROR: &str = "InternalServerError";
pub const CLOUD_ERROR_CODE_INVALID_REQUEST_CONTENT: &str = "InvalidRequestContent";
pub const CLOUD_ERROR_CODE_INVALID_RESOURCE: &str = "InvalidResource";
pub const CLOUD_ERROR_CODE_INVALID_RESOURCE_TYPE: &str = "InvalidResourceType";
pub const CLOUD_ERROR_CODE_PROPERTY_CHANGE_NOT_ALLOWED: &str = "PropertyChangeNotAllowed";
pub const CLOUD_ERROR_CODE_MULTIPLE_ERRORS_OCCURRED: &str = "MultipleErrorsOccurred";
pub const CLOUD_ERROR_CODE_CONFLICT: &str = "Conflict";
pub const CLOUD_ERROR_CODE_NOT_FOUND: &str = "NotFound";
pub const CLOUD_ERROR_CODE_UNSUPPORTED_API_VERSION: &str = "UnsupportedApiVersion";
pub const CLOUD_ERROR_CODE_INVALID_SUBSCRIPTION_STATE: &str = "InvalidSubscriptionState";
pub const CLOUD_ERROR_CODE_SERVICE_UNAVAILABLE: &str = "ServiceUnavailable";

/// The body of an ARM error response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<CloudErrorBody>,
}

impl CloudErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            target: None,
            details: Vec::new(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

impl fmt::Display for CloudErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.code)?;
        if let Some(target) = &self.target {
            write!(f, "{target}: ")?;
        }
        f.write_str(&self.message)?;
        for detail in &self.details {
            write!(f, "; {detail}")?;
        }
        Ok(())
    }
}

/// An ARM error response: an HTTP status code plus the error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudError {
    #[serde(skip)]
    pub status_code: u16,
    pub error: CloudErrorBody,
}

impl CloudError {
    pub fn new(
        status_code: u16,
        code: impl Into<String>,
        target: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status_code,
            error: CloudErrorBody {
                code: code.into(),
                message: message.into(),
                target,
                details: Vec::new(),
            },
        }
    }

    /// A request field carries a value this request may not set.
    pub fn invalid_request_content(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            400,
            CLOUD_ERROR_CODE_INVALID_REQUEST_CONTENT,
            Some(target.into()),
            message,
        )
    }

    /// The request as a whole is malformed.
    pub fn invalid_request_body(message: impl Into<String>) -> Self {
        Self::new(400, CLOUD_ERROR_CODE_INVALID_REQUEST_CONTENT, None, message)
    }

    /// A field that may not change after creation was changed.
    pub fn property_change_not_allowed(target: impl Into<String>) -> Self {
        let target = target.into();
        let message = format!("Changing property '{target}' is not allowed.");
        Self::new(
            400,
            CLOUD_ERROR_CODE_PROPERTY_CHANGE_NOT_ALLOWED,
            Some(target),
            message,
        )
    }

    /// A required field is missing.
    pub fn missing_required_field(target: impl Into<String>) -> Self {
        let target = target.into();
        let message = format!("Missing required field '{target}'");
        Self::new(400, CLOUD_ERROR_CODE_INVALID_REQUEST_CONTENT, Some(target), message)
    }

    /// The requested API version is not served (406 Not Acceptable).
    pub fn unsupported_api_version(api_version: &str) -> Self {
        Self::new(
            406,
            CLOUD_ERROR_CODE_UNSUPPORTED_API_VERSION,
            None,
            format!("The requested API version '{api_version}' is not supported"),
        )
    }

    pub fn not_found(target: impl Into<String>) -> Self {
        let target = target.into();
        let message = format!("The resource '{target}' was not found.");
        Self::new(404, CLOUD_ERROR_CODE_NOT_FOUND, Some(target), message)
    }

    pub fn conflict(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(409, CLOUD_ERROR_CODE_CONFLICT, Some(target.into()), message)
    }

    pub fn internal_server_error() -> Self {
        Self::new(
            500,
            CLOUD_ERROR_CODE_INTERNAL_SERVER_ERROR,
            None,
            "Internal server error.",
        )
    }

    /// Folds a list of field errors into one error.
    ///
    /// Returns `None` for an empty list and the single error unchanged for a
    /// list of one; otherwise the errors become details of a
    /// `MultipleErrorsOccurred` error.
    pub fn from_details(mut errors: Vec<CloudError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => {
                let status_code = errors[0].status_code;
                let mut combined = Self::new(
                    status_code,
                    CLOUD_ERROR_CODE_MULTIPLE_ERRORS_OCCURRED,
                    None,
                    "Content validation failed on multiple fields",
                );
                combined.error.details = errors.into_iter().map(|e| e.error).collect();
                Some(combined)
            }
        }
    }

    /// Field path of the error, if it concerns a single field.
    pub fn target(&self) -> Option<&str> {
        self.error.target.as_deref()
    }
}

impl fmt::Display for CloudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status_code, self.error)
    }
}

impl std::error::Error for CloudError {}
