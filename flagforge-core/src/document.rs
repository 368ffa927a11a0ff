//! Environment configuration documents
//!
//! The resolver consumes a denormalized snapshot of one environment's
//! configuration: the project's feature and segment definitions, the
//! segment-to-feature bindings with their priorities, and every feature
//! state visible to the environment. Building the snapshot from a
//! persistent store is the write path's concern; the read path treats it
//! as an immutable value.

use crate::feature::{Feature, FeatureState};
use crate::segment::Segment;
use serde::{Deserialize, Serialize};

/// Binds a segment to a feature within an environment
///
/// `priority` orders competing segment overrides for the same feature;
/// the lowest number wins first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSegment {
    pub id: u64,
    pub segment_id: u64,
    pub feature_id: u64,
    pub environment_id: u64,
    pub priority: i32,
}

impl FeatureSegment {
    pub fn new(id: u64, segment_id: u64, feature_id: u64, environment_id: u64, priority: i32) -> Self {
        Self {
            id,
            segment_id,
            feature_id,
            environment_id,
            priority,
        }
    }
}

/// Project-level configuration shared by the project's environments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub id: u64,
    pub name: String,

    /// Whether identities for this project live in the edge store
    #[serde(default)]
    pub edge_enabled: bool,

    pub features: Vec<Feature>,
    pub segments: Vec<Segment>,
    pub feature_segments: Vec<FeatureSegment>,
}

impl ProjectConfig {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            edge_enabled: false,
            features: Vec::new(),
            segments: Vec::new(),
            feature_segments: Vec::new(),
        }
    }

    pub fn with_edge_enabled(mut self, enabled: bool) -> Self {
        self.edge_enabled = enabled;
        self
    }

    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    pub fn with_segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn with_feature_segment(mut self, feature_segment: FeatureSegment) -> Self {
        self.feature_segments.push(feature_segment);
        self
    }

    pub fn feature(&self, feature_id: u64) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == feature_id)
    }

    pub fn segment(&self, segment_id: u64) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == segment_id)
    }
}

/// Denormalized snapshot of one environment's configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentDocument {
    pub id: u64,

    /// The environment's API key, the handle evaluation requests use
    pub key: String,

    pub name: String,
    pub project: ProjectConfig,

    /// Environment-scope defaults and segment-override states; identity
    /// overrides travel with their identity instead
    pub feature_states: Vec<FeatureState>,
}

impl EnvironmentDocument {
    pub fn new(id: u64, key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            key: key.into(),
            name: name.into(),
            project: ProjectConfig::new(0, ""),
            feature_states: Vec::new(),
        }
    }

    pub fn with_project(mut self, project: ProjectConfig) -> Self {
        self.project = project;
        self
    }

    pub fn with_feature_state(mut self, state: FeatureState) -> Self {
        self.feature_states.push(state);
        self
    }
}
