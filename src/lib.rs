// Flagforge - feature flag resolution and versioning engine
//
// This library re-exports the engine crates: resolution (core),
// versioning and change requests, the edge identity store adapter,
// signed webhook notifications, and settings loading.

// Re-export the resolution engine
pub use flagforge_core::*;

// Re-export optional crates
#[cfg(feature = "versioning")]
pub use flagforge_versioning;

#[cfg(feature = "edge")]
pub use flagforge_edge;

#[cfg(feature = "webhooks")]
pub use flagforge_webhooks;

#[cfg(feature = "config")]
pub use flagforge_config;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Condition,
        EngineOptions,
        EnvironmentDocument,
        EvaluationError,
        EvaluationRequest,
        Feature,
        FeatureSegment,
        FeatureState,
        FlagEngine,
        FlagValue,
        Identity,
        IdentitySource,
        MultivariateOption,
        Operator,
        ProjectConfig,
        ResolvedFlag,
        RuleCombinator,
        Segment,
        SegmentRule,
        TraitValue,
        Traits,
        resolve,
    };

    #[cfg(feature = "versioning")]
    pub use flagforge_versioning::{
        ChangeRequest, ChangeRequestState, FeatureStateStore, InMemoryFeatureStateStore,
        StateScope,
    };

    #[cfg(feature = "webhooks")]
    pub use flagforge_webhooks::{WebhookEvent, WebhookNotifier, WebhookPayload};
}
