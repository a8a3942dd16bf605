//! # hcp-core
//!
//! Primitive types shared by the HCP resource provider frontend: ARM
//! resource identifiers, provisioning states, the cloud error envelope,
//! backend internal identifiers and timestamp helpers.

pub mod arm;
pub mod error;
pub mod internal_id;
pub mod method;
pub mod timestamp;

pub use arm::{CloudError, CloudErrorBody, ProvisioningState, ResourceId};
pub use error::{CoreError, ErrorCategory, Result};
pub use internal_id::{InternalId, InternalIdKind};
pub use method::RequestMethod;
pub use timestamp::{now_after, now_utc};
