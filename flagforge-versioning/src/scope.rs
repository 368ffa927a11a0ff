//! Configuration scopes
//!
//! A scope is the tuple `(environment, feature, segment-or-none,
//! identity-or-none)` that identifies one line of feature-state
//! versions. Version numbers are monotonic within a scope and unrelated
//! scopes never contend with each other.

use flagforge_core::FeatureState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of one version line
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateScope {
    pub environment_id: u64,
    pub feature_id: u64,
    pub feature_segment: Option<u64>,
    pub identity: Option<u64>,
}

impl StateScope {
    pub fn environment(environment_id: u64, feature_id: u64) -> Self {
        Self {
            environment_id,
            feature_id,
            feature_segment: None,
            identity: None,
        }
    }

    pub fn segment(environment_id: u64, feature_id: u64, feature_segment_id: u64) -> Self {
        Self {
            environment_id,
            feature_id,
            feature_segment: Some(feature_segment_id),
            identity: None,
        }
    }

    pub fn identity(environment_id: u64, feature_id: u64, identity_id: u64) -> Self {
        Self {
            environment_id,
            feature_id,
            feature_segment: None,
            identity: Some(identity_id),
        }
    }

    /// The scope a feature state belongs to
    pub fn of(state: &FeatureState) -> Self {
        Self {
            environment_id: state.environment_id,
            feature_id: state.feature_id,
            feature_segment: state.feature_segment,
            identity: state.identity,
        }
    }
}

impl fmt::Display for StateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "env:{}/feature:{}", self.environment_id, self.feature_id)?;
        if let Some(segment) = self.feature_segment {
            write!(f, "/segment:{}", segment)?;
        }
        if let Some(identity) = self.identity {
            write!(f, "/identity:{}", identity)?;
        }
        Ok(())
    }
}
