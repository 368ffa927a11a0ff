//! Multivariate value selection
//!
//! Assigns one of a feature's weighted options to an identity. The
//! assignment hashes `(feature id, identifier)` through the same
//! bucketing primitive percentage-split conditions use, so an identity's
//! bucket for one feature never moves when an unrelated feature changes.

use crate::bucketing;
use crate::feature::{Feature, FeatureState};
use crate::value::FlagValue;

/// Resolve the value a multivariate feature state serves to one identity
///
/// Walks the state's allocation table in definition order, accumulating
/// percentages; the identity's bucket picks the option whose cumulative
/// range contains it, and the unallocated remainder falls through to the
/// state's own value. States without explicit allocation overrides use
/// the options' default allocations. Entries referencing unknown options
/// are skipped; allocations past 100 mean the last matching bucket wins.
pub fn select_value(feature: &Feature, state: &FeatureState, identifier: &str) -> FlagValue {
    let feature_id = feature.id.to_string();
    let bucket = bucketing::percentage_for(&[&feature_id, identifier]);

    let mut cumulative = 0.0;
    if state.multivariate_values.is_empty() {
        for option in &feature.multivariate_options {
            cumulative += option.default_percentage_allocation;
            if bucket < cumulative {
                return option.value.clone();
            }
        }
    } else {
        for entry in &state.multivariate_values {
            let Some(option) = feature.option(entry.option_id) else {
                continue;
            };
            cumulative += entry.percentage_allocation;
            if bucket < cumulative {
                return option.value.clone();
            }
        }
    }

    state.value.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::MultivariateOption;

    fn fifty_fifty() -> Feature {
        Feature::new(10, "button-color")
            .with_option(MultivariateOption::new(1, "red", 50.0))
            .with_option(MultivariateOption::new(2, "blue", 50.0))
    }

    #[test]
    fn test_selection_is_stable_across_calls() {
        let feature = fifty_fifty();
        let state = FeatureState::new(1, feature.id, 1, true, "green");

        let first = select_value(&feature, &state, "user-1");
        for _ in 0..100 {
            assert_eq!(select_value(&feature, &state, "user-1"), first);
        }
    }

    #[test]
    fn test_full_allocation_never_serves_base_value() {
        let feature = fifty_fifty();
        let state = FeatureState::new(1, feature.id, 1, true, "green");

        for i in 0..200 {
            let id = format!("user-{}", i);
            let value = select_value(&feature, &state, &id);
            assert_ne!(value.as_str(), Some("green"));
        }
    }

    #[test]
    fn test_unallocated_remainder_serves_base_value() {
        let feature = Feature::new(10, "button-color")
            .with_option(MultivariateOption::new(1, "red", 0.0));
        let state = FeatureState::new(1, feature.id, 1, true, "green");

        assert_eq!(select_value(&feature, &state, "user-1").as_str(), Some("green"));
    }

    #[test]
    fn test_state_overrides_beat_default_allocations() {
        // Defaults split 50/50, but this state gives everything to blue.
        let feature = fifty_fifty();
        let state = FeatureState::new(1, feature.id, 1, true, "green")
            .with_multivariate_value(2, 100.0);

        for i in 0..50 {
            let id = format!("user-{}", i);
            assert_eq!(select_value(&feature, &state, &id).as_str(), Some("blue"));
        }
    }

    #[test]
    fn test_unknown_option_entries_are_skipped() {
        let feature = fifty_fifty();
        let state = FeatureState::new(1, feature.id, 1, true, "green")
            .with_multivariate_value(99, 100.0);

        assert_eq!(select_value(&feature, &state, "user-1").as_str(), Some("green"));
    }

    #[test]
    fn test_unrelated_feature_does_not_move_buckets() {
        let feature = fifty_fifty();
        let state = FeatureState::new(1, feature.id, 1, true, "green");
        let before = select_value(&feature, &state, "user-1");

        // A different feature with its own options buckets independently
        // and must not affect user-1's assignment for the first feature.
        let other = Feature::new(11, "unrelated")
            .with_option(MultivariateOption::new(5, "x", 100.0));
        let other_state = FeatureState::new(2, other.id, 1, true, "y");
        let _ = select_value(&other, &other_state, "user-1");

        assert_eq!(select_value(&feature, &state, "user-1"), before);
    }

    #[test]
    fn test_split_respects_rough_proportions() {
        let feature = Feature::new(10, "rollout")
            .with_option(MultivariateOption::new(1, "on", 10.0));
        let state = FeatureState::new(1, feature.id, 1, true, "off");

        let mut on = 0;
        for i in 0..1000 {
            let id = format!("user-{}", i);
            if select_value(&feature, &state, &id).as_str() == Some("on") {
                on += 1;
            }
        }
        assert!((50..=200).contains(&on), "10% allocation served {} of 1000", on);
    }
}
