//! Identities and their overrides

use crate::feature::FeatureState;
use crate::value::{TraitValue, Traits};
use serde::{Deserialize, Serialize};

/// An identity within an environment
///
/// Identities arriving with an evaluation request are transient: they
/// carry no id and no overrides. Stored identities (from the primary
/// store or the edge store) carry both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Surrogate id; `None` for transient identities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    /// Unique within the identity's environment
    pub identifier: String,

    #[serde(default)]
    pub traits: Traits,

    /// Identity-scoped feature states; these win over everything else
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FeatureState>,
}

impl Identity {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            id: None,
            identifier: identifier.into(),
            traits: Traits::new(),
            flags: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_trait(mut self, key: impl Into<String>, value: impl Into<TraitValue>) -> Self {
        self.traits.set(key, value);
        self
    }

    pub fn with_traits(mut self, traits: Traits) -> Self {
        self.traits = traits;
        self
    }

    /// Attach an identity-scoped override state
    pub fn with_flag(mut self, state: FeatureState) -> Self {
        self.flags.push(state);
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn traits(&self) -> &Traits {
        &self.traits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_identity_has_no_id() {
        let identity = Identity::new("user-1").with_trait("plan", "pro");
        assert_eq!(identity.id, None);
        assert_eq!(identity.traits.get("plan"), Some(&TraitValue::from("pro")));
        assert!(identity.flags.is_empty());
    }
}
