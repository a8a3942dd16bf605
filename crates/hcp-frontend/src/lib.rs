//! # hcp-frontend
//!
//! Request flow of the HCP resource provider frontend.
//!
//! [`Frontend`] takes an ARM request through the requested API version
//! (merge-patch overlay, static validation, normalization), records it as
//! resource and operation documents, fences concurrent deletes, and applies
//! status reports from the backend reconciler.
//!
//! Process setup lives next to it: [`config`] loads `AppConfig` from a TOML
//! file and `HCP__*` environment variables, [`observability`] installs the
//! tracing subscriber, and [`bootstrap::start`] runs both before building
//! the frontend.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod frontend;
pub mod observability;

pub use config::AppConfig;
pub use error::{ErrorCategory, FrontendError, Result};
pub use frontend::{Accepted, Frontend, RequestContext, ResourceView};
