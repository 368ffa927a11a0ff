//! Feature state store
//!
//! Versions are assigned where states are persisted: `insert` stamps
//! `1 + max(existing versions in scope)` and writes as one atomic unit
//! per scope, so concurrent writers can never mint the same number. An
//! optional expected-head check gives optimistic concurrency to callers
//! that must detect a scope moving underneath them.

use crate::scope::StateScope;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use flagforge_core::FeatureState;
use std::sync::Arc;
use tracing::debug;

/// Feature state store error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Version conflict in {scope}: expected head {expected}, found {actual}")]
    VersionConflict {
        scope: StateScope,
        expected: u32,
        actual: u32,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Persistence seam for versioned feature states
///
/// Implement this trait to back the version manager with a real
/// database; the contract is that `insert` is atomic per scope.
#[async_trait]
pub trait FeatureStateStore: Send + Sync {
    /// The version the next insert into this scope will receive
    async fn next_version(&self, scope: &StateScope) -> Result<u32, StoreError>;

    /// Stamp and persist a new version in the state's scope
    ///
    /// When `expected_head` is given and the scope's current head version
    /// differs, fails with [`StoreError::VersionConflict`] and writes
    /// nothing. Returns the stored state with its version assigned.
    async fn insert(
        &self,
        state: FeatureState,
        expected_head: Option<u32>,
    ) -> Result<FeatureState, StoreError>;

    /// Every version in a scope, oldest first (retained for audit)
    async fn history(&self, scope: &StateScope) -> Result<Vec<FeatureState>, StoreError>;

    /// The scope's current state: highest version with `live_from <= now`
    async fn current(
        &self,
        scope: &StateScope,
        now: DateTime<Utc>,
    ) -> Result<Option<FeatureState>, StoreError>;

    /// All scopes the store has ever written
    async fn scopes(&self) -> Result<Vec<StateScope>, StoreError>;
}

/// In-memory store (for testing/development)
///
/// The `DashMap` entry guard is the per-scope transactional boundary:
/// two inserts into one scope serialize on its entry, inserts into
/// different scopes run concurrently.
#[derive(Clone, Default)]
pub struct InMemoryFeatureStateStore {
    states: Arc<DashMap<StateScope, Vec<FeatureState>>>,
}

impl InMemoryFeatureStateStore {
    pub fn new() -> Self {
        Self {
            states: Arc::new(DashMap::new()),
        }
    }

    pub fn clear(&self) {
        self.states.clear();
    }

    fn head_version(states: &[FeatureState]) -> u32 {
        states.iter().filter_map(|s| s.version).max().unwrap_or(0)
    }
}

#[async_trait]
impl FeatureStateStore for InMemoryFeatureStateStore {
    async fn next_version(&self, scope: &StateScope) -> Result<u32, StoreError> {
        let head = self
            .states
            .get(scope)
            .map(|entry| Self::head_version(entry.value()))
            .unwrap_or(0);
        Ok(head + 1)
    }

    async fn insert(
        &self,
        mut state: FeatureState,
        expected_head: Option<u32>,
    ) -> Result<FeatureState, StoreError> {
        let scope = StateScope::of(&state);
        let mut entry = self.states.entry(scope.clone()).or_default();

        let head = Self::head_version(entry.value());
        if let Some(expected) = expected_head
            && head != expected
        {
            return Err(StoreError::VersionConflict {
                scope,
                expected,
                actual: head,
            });
        }

        state.version = Some(head + 1);
        debug!(scope = %scope, version = head + 1, "persisting feature state");
        entry.push(state.clone());
        Ok(state)
    }

    async fn history(&self, scope: &StateScope) -> Result<Vec<FeatureState>, StoreError> {
        let mut states = self
            .states
            .get(scope)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        states.sort_by_key(|s| s.version);
        Ok(states)
    }

    async fn current(
        &self,
        scope: &StateScope,
        now: DateTime<Utc>,
    ) -> Result<Option<FeatureState>, StoreError> {
        Ok(self.states.get(scope).and_then(|entry| {
            entry
                .value()
                .iter()
                .filter(|s| s.is_live(now))
                .max_by_key(|s| s.version)
                .cloned()
        }))
    }

    async fn scopes(&self) -> Result<Vec<StateScope>, StoreError> {
        Ok(self.states.iter().map(|entry| entry.key().clone()).collect())
    }
}
