//! Feature State Resolution for Flagforge
//!
//! This crate is the read path of the Flagforge engine: given an
//! environment's configuration document and an identity, it computes the
//! effective set of feature states.
//!
//! # Features
//!
//! - **Typed flags** - boolean, string, and integer flag values
//! - **Segments** - reusable rule trees matched against identity traits
//! - **Multivariate flags** - weighted values assigned deterministically
//! - **Precedence** - environment defaults, segment overrides, identity
//!   overrides, in that order
//!
//! # Quick Start
//!
//! ```
//! use flagforge_core::*;
//! use chrono::Utc;
//!
//! let feature = Feature::new(1, "new-ui").with_default_enabled(true);
//! let document = EnvironmentDocument::new(1, "env-key", "Production")
//!     .with_project(ProjectConfig::new(1, "Demo").with_feature(feature.clone()))
//!     .with_feature_state(FeatureState::environment_default(1, &feature).with_version(1));
//!
//! let identity = Identity::new("user-123");
//! let flags = resolve(&document, &identity, Utc::now());
//! assert!(flags[0].enabled);
//! ```
//!
//! # Segment Targeting
//!
//! ```
//! use flagforge_core::*;
//!
//! let mut segment = Segment::new(1, "pro-users");
//! segment.add_rule(
//!     SegmentRule::new(RuleCombinator::All)
//!         .with_condition(Condition::new("plan", Operator::Equal, "pro")),
//! );
//!
//! let identity = Identity::new("user-1").with_trait("plan", "pro");
//! assert!(segment.matches(identity.identifier(), identity.traits()).unwrap());
//! ```

pub mod bucketing;
pub mod condition;
pub mod document;
pub mod engine;
pub mod error;
pub mod feature;
pub mod identity;
pub mod multivariate;
pub mod resolver;
pub mod segment;
pub mod value;

pub use condition::{Condition, EvalContext, Operator};
pub use document::{EnvironmentDocument, FeatureSegment, ProjectConfig};
pub use engine::{
    EngineOptions, EvaluationRequest, FlagEngine, IdentitySource, IdentitySourceError,
};
pub use error::{EvaluationError, ModelError, SegmentEvaluationError};
pub use feature::{Feature, FeatureState, MultivariateOption, MultivariateStateValue};
pub use identity::Identity;
pub use multivariate::select_value;
pub use resolver::{resolve, ResolvedFlag};
pub use segment::{RuleCombinator, RuleId, Segment, SegmentRule};
pub use value::{FlagValue, TraitValue, Traits};

/// Result type for evaluation operations
pub type Result<T> = std::result::Result<T, EvaluationError>;
