use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Provisioning state of a resource, also used as the status vocabulary of
/// asynchronous operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProvisioningState {
    #[default]
    Accepted,
    Provisioning,
    Updating,
    Deleting,
    Succeeded,
    Failed,
    Canceled,
}

impl ProvisioningState {
    /// Terminal states are never left once reached.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::Provisioning => "Provisioning",
            Self::Updating => "Updating",
            Self::Deleting => "Deleting",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Canceled => "Canceled",
        }
    }
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProvisioningState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::Accepted,
            Self::Provisioning,
            Self::Updating,
            Self::Deleting,
            Self::Succeeded,
            Self::Failed,
            Self::Canceled,
        ]
        .into_iter()
        .find(|state| state.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| CoreError::invalid_provisioning_state(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(ProvisioningState::Succeeded.is_terminal());
        assert!(ProvisioningState::Failed.is_terminal());
        assert!(ProvisioningState::Canceled.is_terminal());

        assert!(!ProvisioningState::Accepted.is_terminal());
        assert!(!ProvisioningState::Provisioning.is_terminal());
        assert!(!ProvisioningState::Updating.is_terminal());
        assert!(!ProvisioningState::Deleting.is_terminal());
    }

    #[test]
    fn test_serialization_is_pascal_case() {
        let json = serde_json::to_string(&ProvisioningState::Deleting).unwrap();
        assert_eq!(json, "\"Deleting\"");

        let state: ProvisioningState = serde_json::from_str("\"Canceled\"").unwrap();
        assert_eq!(state, ProvisioningState::Canceled);
    }

    #[test]
    fn test_from_str_ignores_case() {
        assert_eq!(
            "succeeded".parse::<ProvisioningState>().unwrap(),
            ProvisioningState::Succeeded
        );
        assert!("Done".parse::<ProvisioningState>().is_err());
    }
}
