//! Feature State Versioning for Flagforge
//!
//! The write path of the engine: every configuration scope carries its
//! own monotonically increasing line of feature-state versions, new
//! versions are created (never updated) through a store that serializes
//! writers per scope, and proposed changes travel through an
//! approval-gated change request before they are stamped and become
//! resolvable.
//!
//! # Example
//!
//! ```
//! use flagforge_core::FeatureState;
//! use flagforge_versioning::*;
//! use chrono::Utc;
//!
//! # tokio_test::block_on(async {
//! let store = InMemoryFeatureStateStore::new();
//!
//! let baseline = store
//!     .insert(FeatureState::new(1, 1, 1, false, false), None)
//!     .await
//!     .unwrap();
//! assert_eq!(baseline.version, Some(1));
//!
//! let mut change = ChangeRequest::new("Enable the feature")
//!     .with_from_state(baseline)
//!     .with_to_state(FeatureState::new(2, 1, 1, true, true));
//! let approval = change.add_approval(42, true).unwrap();
//! change.approve(approval).unwrap();
//!
//! let committed = change.commit(&store, Utc::now()).await.unwrap();
//! assert_eq!(committed.version, Some(2));
//! # });
//! ```

pub mod change_request;
pub mod promotion;
pub mod scope;
pub mod store;

pub use change_request::{
    ChangeRequest, ChangeRequestApproval, ChangeRequestError, ChangeRequestState,
};
pub use promotion::due_states;
pub use scope::StateScope;
pub use store::{FeatureStateStore, InMemoryFeatureStateStore, StoreError};

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
