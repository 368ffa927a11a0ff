//! Precedence resolution
//!
//! Combines environment defaults, segment overrides, and identity
//! overrides into the effective feature-state set for one identity.
//! Precedence, lowest to highest: environment default, lowest-priority
//! matching segment, identity override. Resolution is a pure function of
//! the document, the identity, and `now`; the only side effect anywhere
//! in the path is a log line when a corrupt segment is skipped.

use crate::document::EnvironmentDocument;
use crate::feature::FeatureState;
use crate::identity::Identity;
use crate::multivariate;
use crate::value::FlagValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// One effective feature state in a resolution result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedFlag {
    pub feature_id: u64,
    pub feature_name: String,
    pub enabled: bool,
    pub value: FlagValue,
}

/// The current state of a scope: highest version already live at `now`.
/// Unversioned states are drafts and never resolvable.
fn current_of<'a>(
    states: impl Iterator<Item = &'a FeatureState>,
    now: DateTime<Utc>,
) -> Option<&'a FeatureState> {
    states
        .filter(|s| s.version.is_some() && s.is_live(now))
        .max_by_key(|s| s.version)
}

/// Compute the effective feature set for one identity
///
/// Output is ordered by feature name so repeated invocations compare
/// equal structurally as well as semantically.
pub fn resolve(
    document: &EnvironmentDocument,
    identity: &Identity,
    now: DateTime<Utc>,
) -> Vec<ResolvedFlag> {
    let project = &document.project;

    // Baseline: the current environment-scope state of every feature.
    let mut effective: HashMap<u64, &FeatureState> = HashMap::new();
    for feature in &project.features {
        let current = current_of(
            document.feature_states.iter().filter(|s| {
                s.feature_id == feature.id && s.feature_segment.is_none() && s.identity.is_none()
            }),
            now,
        );
        if let Some(state) = current {
            effective.insert(feature.id, state);
        }
    }

    // Segment overrides: evaluate each referenced segment once, then let
    // the lowest-priority matching binding win per feature.
    let mut segment_matches: HashMap<u64, bool> = HashMap::new();
    let mut matching: Vec<_> = project
        .feature_segments
        .iter()
        .filter(|binding| {
            *segment_matches.entry(binding.segment_id).or_insert_with(|| {
                let Some(segment) = project.segment(binding.segment_id) else {
                    warn!(segment_id = binding.segment_id, "segment referenced by binding does not exist");
                    return false;
                };
                match segment.matches(&identity.identifier, &identity.traits) {
                    Ok(matched) => matched,
                    Err(err) => {
                        warn!(segment = %segment.name, error = %err, "skipping segment with corrupt rule tree");
                        false
                    }
                }
            })
        })
        .collect();
    matching.sort_by_key(|binding| binding.priority);

    let mut overridden: HashSet<u64> = HashSet::new();
    for binding in matching {
        if overridden.contains(&binding.feature_id) {
            continue;
        }
        let current = current_of(
            document
                .feature_states
                .iter()
                .filter(|s| s.feature_segment == Some(binding.id)),
            now,
        );
        if let Some(state) = current {
            effective.insert(binding.feature_id, state);
            overridden.insert(binding.feature_id);
        }
    }

    // Identity overrides win unconditionally.
    for feature in &project.features {
        let current = current_of(
            identity
                .flags
                .iter()
                .filter(|s| s.feature_id == feature.id && s.identity.is_some()),
            now,
        );
        if let Some(state) = current {
            effective.insert(feature.id, state);
        }
    }

    let mut flags: Vec<ResolvedFlag> = effective
        .into_iter()
        .filter_map(|(feature_id, state)| {
            let feature = project.feature(feature_id)?;
            let value = if feature.is_multivariate() {
                multivariate::select_value(feature, state, &identity.identifier)
            } else {
                state.value.clone()
            };
            Some(ResolvedFlag {
                feature_id,
                feature_name: feature.name.clone(),
                enabled: state.enabled,
                value,
            })
        })
        .collect();
    flags.sort_by(|a, b| a.feature_name.cmp(&b.feature_name));
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, Operator};
    use crate::document::{FeatureSegment, ProjectConfig};
    use crate::feature::Feature;
    use crate::segment::{RuleCombinator, Segment, SegmentRule};
    use chrono::Duration;

    const ENV: u64 = 1;

    fn plan_segment(id: u64, name: &str, plan: &str) -> Segment {
        let mut segment = Segment::new(id, name);
        segment.add_rule(
            SegmentRule::new(RuleCombinator::All)
                .with_condition(Condition::new("plan", Operator::Equal, plan)),
        );
        segment
    }

    /// Environment with feature F (default off), segment S1 (priority 1)
    /// turning it on for plan=pro, segment S2 (priority 2) turning it
    /// back off for the same plan.
    fn competing_segments_document() -> EnvironmentDocument {
        EnvironmentDocument::new(ENV, "key", "Test")
            .with_project(
                ProjectConfig::new(1, "Demo")
                    .with_feature(Feature::new(1, "f"))
                    .with_segment(plan_segment(1, "s1", "pro"))
                    .with_segment(plan_segment(2, "s2", "pro"))
                    .with_feature_segment(FeatureSegment::new(10, 1, 1, ENV, 1))
                    .with_feature_segment(FeatureSegment::new(11, 2, 1, ENV, 2)),
            )
            .with_feature_state(FeatureState::new(1, 1, ENV, false, false).with_version(1))
            .with_feature_state(
                FeatureState::new(2, 1, ENV, true, true)
                    .for_segment(10)
                    .with_version(1),
            )
            .with_feature_state(
                FeatureState::new(3, 1, ENV, false, false)
                    .for_segment(11)
                    .with_version(1),
            )
    }

    #[test]
    fn test_environment_default_is_baseline() {
        let document = competing_segments_document();
        let identity = Identity::new("user-1");

        let flags = resolve(&document, &identity, Utc::now());
        assert_eq!(flags.len(), 1);
        assert!(!flags[0].enabled);
    }

    #[test]
    fn test_lowest_priority_matching_segment_wins() {
        let document = competing_segments_document();
        let identity = Identity::new("user-1").with_trait("plan", "pro");

        let flags = resolve(&document, &identity, Utc::now());
        assert!(flags[0].enabled, "segment s1 (priority 1) must win");
    }

    #[test]
    fn test_identity_override_beats_matching_segments() {
        let document = competing_segments_document();
        let identity = Identity::new("user-1")
            .with_id(77)
            .with_trait("plan", "pro")
            .with_flag(
                FeatureState::new(9, 1, ENV, false, false)
                    .for_identity(77)
                    .with_version(1),
            );

        let flags = resolve(&document, &identity, Utc::now());
        assert!(!flags[0].enabled);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let document = competing_segments_document();
        let identity = Identity::new("user-1").with_trait("plan", "pro");
        let now = Utc::now();

        let first = resolve(&document, &identity, now);
        for _ in 0..10 {
            let again = resolve(&document, &identity, now);
            assert_eq!(serde_json::to_string(&again).unwrap(), serde_json::to_string(&first).unwrap());
        }
    }

    #[test]
    fn test_higher_version_wins_within_scope() {
        let document = EnvironmentDocument::new(ENV, "key", "Test")
            .with_project(ProjectConfig::new(1, "Demo").with_feature(Feature::new(1, "f")))
            .with_feature_state(FeatureState::new(1, 1, ENV, false, false).with_version(1))
            .with_feature_state(FeatureState::new(2, 1, ENV, true, true).with_version(2));

        let flags = resolve(&document, &Identity::new("u"), Utc::now());
        assert!(flags[0].enabled);
    }

    #[test]
    fn test_future_dated_state_is_invisible_until_live() {
        let now = Utc::now();
        let document = EnvironmentDocument::new(ENV, "key", "Test")
            .with_project(ProjectConfig::new(1, "Demo").with_feature(Feature::new(1, "f")))
            .with_feature_state(FeatureState::new(1, 1, ENV, false, false).with_version(1))
            .with_feature_state(
                FeatureState::new(2, 1, ENV, true, true)
                    .with_version(2)
                    .with_live_from(now + Duration::hours(1)),
            );

        let before = resolve(&document, &Identity::new("u"), now);
        assert!(!before[0].enabled);

        let after = resolve(&document, &Identity::new("u"), now + Duration::hours(2));
        assert!(after[0].enabled);
    }

    #[test]
    fn test_draft_state_is_not_resolvable() {
        let document = EnvironmentDocument::new(ENV, "key", "Test")
            .with_project(ProjectConfig::new(1, "Demo").with_feature(Feature::new(1, "f")))
            .with_feature_state(FeatureState::new(1, 1, ENV, false, false).with_version(1))
            .with_feature_state(FeatureState::new(2, 1, ENV, true, true));

        let flags = resolve(&document, &Identity::new("u"), Utc::now());
        assert!(!flags[0].enabled);
    }

    #[test]
    fn test_corrupt_segment_is_skipped_not_fatal() {
        let corrupt: Segment = serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": "corrupt",
            "rules": [{"combinator": "ALL", "conditions": [], "children": [0]}],
            "root_rules": [0]
        }))
        .unwrap();

        let document = EnvironmentDocument::new(ENV, "key", "Test")
            .with_project(
                ProjectConfig::new(1, "Demo")
                    .with_feature(Feature::new(1, "f"))
                    .with_segment(corrupt)
                    .with_feature_segment(FeatureSegment::new(10, 1, 1, ENV, 1)),
            )
            .with_feature_state(FeatureState::new(1, 1, ENV, false, false).with_version(1))
            .with_feature_state(
                FeatureState::new(2, 1, ENV, true, true)
                    .for_segment(10)
                    .with_version(1),
            );

        // The corrupt segment's override must not apply, and resolution
        // must still produce the environment default.
        let flags = resolve(&document, &Identity::new("u"), Utc::now());
        assert_eq!(flags.len(), 1);
        assert!(!flags[0].enabled);
    }

    #[test]
    fn test_output_sorted_by_feature_name() {
        let document = EnvironmentDocument::new(ENV, "key", "Test")
            .with_project(
                ProjectConfig::new(1, "Demo")
                    .with_feature(Feature::new(1, "zeta"))
                    .with_feature(Feature::new(2, "alpha")),
            )
            .with_feature_state(FeatureState::new(1, 1, ENV, true, true).with_version(1))
            .with_feature_state(FeatureState::new(2, 2, ENV, true, true).with_version(1));

        let flags = resolve(&document, &Identity::new("u"), Utc::now());
        assert_eq!(flags[0].feature_name, "alpha");
        assert_eq!(flags[1].feature_name, "zeta");
    }

    #[test]
    fn test_feature_without_states_is_omitted() {
        let document = EnvironmentDocument::new(ENV, "key", "Test")
            .with_project(ProjectConfig::new(1, "Demo").with_feature(Feature::new(1, "f")));

        assert!(resolve(&document, &Identity::new("u"), Utc::now()).is_empty());
    }

    #[test]
    fn test_non_matching_segment_does_not_override() {
        let document = competing_segments_document();
        let identity = Identity::new("user-1").with_trait("plan", "free");

        let flags = resolve(&document, &identity, Utc::now());
        assert!(!flags[0].enabled);
    }
}
