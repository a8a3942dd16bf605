use hcp_core::arm::Subscription;
use serde::{Deserialize, Serialize};

use crate::document::{BaseDocument, Document};

/// Subscription metadata as last reported by ARM. The document id is the
/// lowercased subscription id and doubles as its partition key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDocument {
    #[serde(flatten)]
    pub base: BaseDocument,
    pub subscription: Subscription,
}

impl SubscriptionDocument {
    pub fn new(subscription_id: &str, subscription: Subscription) -> Self {
        Self {
            base: BaseDocument::with_id(subscription_id.to_lowercase()),
            subscription,
        }
    }
}

impl Document for SubscriptionDocument {
    const KIND: &'static str = "subscription";

    fn base(&self) -> &BaseDocument {
        &self.base
    }

    fn partition_key(&self) -> &str {
        &self.base.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcp_core::arm::SubscriptionState;

    #[test]
    fn test_id_is_lowercased() {
        let doc = SubscriptionDocument::new("ABC-123", Subscription::default());
        assert_eq!(doc.base.id, "abc-123");
        assert_eq!(doc.partition_key(), "abc-123");
        assert_eq!(doc.subscription.state, SubscriptionState::Registered);
    }
}
