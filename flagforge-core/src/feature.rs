//! Features and feature states
//!
//! A [`Feature`] is the identity-less flag definition owned by a project;
//! a [`FeatureState`] is one resolvable configuration of that feature in
//! a scope: `(environment, feature, segment-or-none, identity-or-none)`.
//! States are immutable once committed; configuration changes create new
//! versions instead of updating old ones, and the stamped `live_from` is
//! the only field touched after creation (by a deferred commit).

use crate::error::ModelError;
use crate::value::FlagValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A flag definition, unique by name within its project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: u64,
    pub name: String,

    /// Enabled flag a fresh environment default starts from
    pub default_enabled: bool,

    /// Value a fresh environment default starts from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<FlagValue>,

    /// Weighted value options; non-empty makes the feature multivariate
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub multivariate_options: Vec<MultivariateOption>,
}

impl Feature {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            default_enabled: false,
            initial_value: None,
            multivariate_options: Vec::new(),
        }
    }

    pub fn with_default_enabled(mut self, enabled: bool) -> Self {
        self.default_enabled = enabled;
        self
    }

    pub fn with_initial_value(mut self, value: impl Into<FlagValue>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    pub fn with_option(mut self, option: MultivariateOption) -> Self {
        self.multivariate_options.push(option);
        self
    }

    pub fn is_multivariate(&self) -> bool {
        !self.multivariate_options.is_empty()
    }

    pub fn option(&self, option_id: u64) -> Option<&MultivariateOption> {
        self.multivariate_options.iter().find(|o| o.id == option_id)
    }

    /// Validate write-time invariants: default allocations must leave the
    /// remainder for the feature's base value
    pub fn validate(&self) -> Result<(), ModelError> {
        let total: f64 = self
            .multivariate_options
            .iter()
            .map(|o| o.default_percentage_allocation)
            .sum();
        if total > 100.0 {
            return Err(ModelError::AllocationOverflow { total });
        }
        Ok(())
    }
}

/// One possible value of a multivariate feature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultivariateOption {
    pub id: u64,
    pub value: FlagValue,

    /// Share of the population this option takes when a feature state
    /// does not override it
    pub default_percentage_allocation: f64,
}

impl MultivariateOption {
    pub fn new(id: u64, value: impl Into<FlagValue>, allocation: f64) -> Self {
        Self {
            id,
            value: value.into(),
            default_percentage_allocation: allocation,
        }
    }
}

/// Allocation override linking a feature state to a multivariate option
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultivariateStateValue {
    pub option_id: u64,
    pub percentage_allocation: f64,
}

/// One resolvable configuration of a feature in a scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureState {
    pub id: u64,
    pub feature_id: u64,
    pub environment_id: u64,

    /// Set when this state overrides the feature for a segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_segment: Option<u64>,

    /// Set when this state overrides the feature for one identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<u64>,

    pub enabled: bool,
    pub value: FlagValue,

    /// Monotonically increasing within the scope; `None` until committed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    /// `None` means immediately live; a future timestamp defers visibility
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_from: Option<DateTime<Utc>>,

    /// Per-state allocation overrides for multivariate features
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub multivariate_values: Vec<MultivariateStateValue>,
}

impl FeatureState {
    pub fn new(
        id: u64,
        feature_id: u64,
        environment_id: u64,
        enabled: bool,
        value: impl Into<FlagValue>,
    ) -> Self {
        Self {
            id,
            feature_id,
            environment_id,
            feature_segment: None,
            identity: None,
            enabled,
            value: value.into(),
            version: None,
            live_from: None,
            multivariate_values: Vec::new(),
        }
    }

    /// Seed the environment-scope default state from a feature definition
    pub fn environment_default(environment_id: u64, feature: &Feature) -> Self {
        Self::new(
            0,
            feature.id,
            environment_id,
            feature.default_enabled,
            feature.initial_value.clone().unwrap_or_default(),
        )
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Scope this state to a segment binding
    pub fn for_segment(mut self, feature_segment_id: u64) -> Self {
        self.feature_segment = Some(feature_segment_id);
        self
    }

    /// Scope this state to one identity
    pub fn for_identity(mut self, identity_id: u64) -> Self {
        self.identity = Some(identity_id);
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_live_from(mut self, live_from: DateTime<Utc>) -> Self {
        self.live_from = Some(live_from);
        self
    }

    pub fn with_multivariate_value(mut self, option_id: u64, allocation: f64) -> Self {
        self.multivariate_values.push(MultivariateStateValue {
            option_id,
            percentage_allocation: allocation,
        });
        self
    }

    /// Whether this state is visible at `now`
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.live_from.is_none_or(|live_from| live_from <= now)
    }

    /// Validate write-time invariants: scope exclusivity and the
    /// allocation budget
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.feature_segment.is_some() && self.identity.is_some() {
            return Err(ModelError::ConflictingScope(self.id));
        }
        let total: f64 = self
            .multivariate_values
            .iter()
            .map(|v| v.percentage_allocation)
            .sum();
        if total > 100.0 {
            return Err(ModelError::AllocationOverflow { total });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_environment_default_inherits_feature_defaults() {
        let feature = Feature::new(3, "dark-mode")
            .with_default_enabled(true)
            .with_initial_value("on");
        let state = FeatureState::environment_default(9, &feature);

        assert_eq!(state.feature_id, 3);
        assert_eq!(state.environment_id, 9);
        assert!(state.enabled);
        assert_eq!(state.value.as_str(), Some("on"));
        assert_eq!(state.version, None);
    }

    #[test]
    fn test_is_live() {
        let now = Utc::now();
        let state = FeatureState::new(1, 1, 1, true, true);
        assert!(state.is_live(now));

        let future = state.clone().with_live_from(now + Duration::hours(1));
        assert!(!future.is_live(now));
        assert!(future.is_live(now + Duration::hours(2)));
    }

    #[test]
    fn test_conflicting_scope_is_rejected() {
        let state = FeatureState::new(1, 1, 1, true, true)
            .for_segment(5)
            .for_identity(6);
        assert!(matches!(
            state.validate(),
            Err(ModelError::ConflictingScope(1))
        ));
    }

    #[test]
    fn test_allocation_overflow_is_rejected() {
        let feature = Feature::new(1, "variant-test")
            .with_option(MultivariateOption::new(1, "a", 60.0))
            .with_option(MultivariateOption::new(2, "b", 50.0));
        assert!(matches!(
            feature.validate(),
            Err(ModelError::AllocationOverflow { .. })
        ));

        let state = FeatureState::new(1, 1, 1, true, "base")
            .with_multivariate_value(1, 70.0)
            .with_multivariate_value(2, 40.0);
        assert!(matches!(
            state.validate(),
            Err(ModelError::AllocationOverflow { .. })
        ));
    }

    #[test]
    fn test_allocation_within_budget_is_accepted() {
        let feature = Feature::new(1, "variant-test")
            .with_option(MultivariateOption::new(1, "a", 50.0))
            .with_option(MultivariateOption::new(2, "b", 50.0));
        assert!(feature.validate().is_ok());
    }
}
