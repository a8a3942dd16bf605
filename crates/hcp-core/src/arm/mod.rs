//! Azure Resource Manager vocabulary shared by the API and database layers.

pub mod error;
pub mod operation;
pub mod provisioning;
pub mod resource;
pub mod resource_id;
pub mod subscription;

pub use error::{CloudError, CloudErrorBody};
pub use operation::Operation;
pub use provisioning::ProvisioningState;
pub use resource::{CreatedByType, Resource, SystemData, TrackedResource};
pub use resource_id::ResourceId;
pub use subscription::{Feature, Subscription, SubscriptionProperties, SubscriptionState};
