//! Change request workflow
//!
//! A change request proposes replacing a scope's current feature state
//! with a new one. It starts as a draft, collects reviewer approvals,
//! and on commit the proposed state is stamped with `live_from` and the
//! scope's next version, making it a resolvable candidate. The state is
//! an explicit enum so illegal transitions (double commit, approving a
//! withdrawn request) are matched arms, not accidents of timestamp
//! bookkeeping.

use crate::store::{FeatureStateStore, StoreError};
use chrono::{DateTime, Utc};
use flagforge_core::FeatureState;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;
use uuid::Uuid;

/// Change request workflow error
#[derive(Debug, thiserror::Error)]
pub enum ChangeRequestError {
    /// A required approval is still outstanding; approve and retry
    #[error("Change request has not been approved by all required approvers")]
    NotApproved,

    /// The requested operation is not legal in the current state
    #[error("Cannot {action} a change request in state {state}")]
    IllegalState {
        state: ChangeRequestState,
        action: &'static str,
    },

    /// The approval id does not belong to this change request
    #[error("Approval {0} not found")]
    ApprovalNotFound(u64),

    /// The underlying store rejected the commit; recompute and retry
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Lifecycle state of a change request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeRequestState {
    /// Editable; the proposed state exists but is not current
    Draft,

    /// Terminal; the proposed state has been stamped and persisted
    Committed,

    /// Terminal; abandoned without committing
    Withdrawn,
}

impl fmt::Display for ChangeRequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Committed => write!(f, "committed"),
            Self::Withdrawn => write!(f, "withdrawn"),
        }
    }
}

/// One reviewer's verdict on a change request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequestApproval {
    pub id: u64,
    pub user_id: u64,

    /// Whether commit is gated on this approval
    pub required: bool,

    /// Unset while the approval is pending
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
}

/// An approval-gated proposal to replace a feature state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub id: String,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The state this request intends to supersede
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_feature_state: Option<FeatureState>,

    /// The proposed replacement; stays a draft (no version) until commit
    pub to_feature_state: FeatureState,

    /// Deferred activation; `None` means live at commit time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_live_from: Option<DateTime<Utc>>,

    pub approvals: Vec<ChangeRequestApproval>,
    pub state: ChangeRequestState,

    pub created_at: DateTime<Utc>,
}

impl ChangeRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            from_feature_state: None,
            to_feature_state: FeatureState::new(0, 0, 0, false, false),
            scheduled_live_from: None,
            approvals: Vec::new(),
            state: ChangeRequestState::Draft,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_from_state(mut self, state: FeatureState) -> Self {
        self.from_feature_state = Some(state);
        self
    }

    pub fn with_to_state(mut self, state: FeatureState) -> Self {
        self.to_feature_state = state;
        self
    }

    pub fn with_scheduled_live_from(mut self, live_from: DateTime<Utc>) -> Self {
        self.scheduled_live_from = Some(live_from);
        self
    }

    /// Register a reviewer, returning the pending approval's id
    pub fn add_approval(&mut self, user_id: u64, required: bool) -> Result<u64, ChangeRequestError> {
        self.ensure_draft("add an approval to")?;
        let id = self.approvals.len() as u64 + 1;
        self.approvals.push(ChangeRequestApproval {
            id,
            user_id,
            required,
            approved_at: None,
        });
        Ok(id)
    }

    /// Record a reviewer's approval; idempotent once approved
    pub fn approve(&mut self, approval_id: u64) -> Result<(), ChangeRequestError> {
        self.ensure_draft("approve")?;
        let approval = self
            .approvals
            .iter_mut()
            .find(|a| a.id == approval_id)
            .ok_or(ChangeRequestError::ApprovalNotFound(approval_id))?;
        if approval.approved_at.is_none() {
            approval.approved_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Whether every required approval has been granted
    pub fn is_approved(&self) -> bool {
        self.approvals
            .iter()
            .filter(|a| a.required)
            .all(|a| a.approved_at.is_some())
    }

    /// Abandon a draft; terminal
    pub fn withdraw(&mut self) -> Result<(), ChangeRequestError> {
        self.ensure_draft("withdraw")?;
        self.state = ChangeRequestState::Withdrawn;
        Ok(())
    }

    /// Stamp and persist the proposed state, making it resolvable
    ///
    /// Fails without side effects when a required approval is missing or
    /// the request already left draft; a store-level version conflict
    /// also leaves the request in draft so the caller can retry.
    pub async fn commit(
        &mut self,
        store: &dyn FeatureStateStore,
        now: DateTime<Utc>,
    ) -> Result<FeatureState, ChangeRequestError> {
        self.ensure_draft("commit")?;
        if !self.is_approved() {
            return Err(ChangeRequestError::NotApproved);
        }

        let mut state = self.to_feature_state.clone();
        state.live_from = Some(self.scheduled_live_from.unwrap_or(now));

        let stored = store.insert(state, None).await?;
        info!(
            change_request = %self.id,
            version = stored.version.unwrap_or_default(),
            "change request committed"
        );

        self.to_feature_state = stored.clone();
        self.state = ChangeRequestState::Committed;
        Ok(stored)
    }

    fn ensure_draft(&self, action: &'static str) -> Result<(), ChangeRequestError> {
        match self.state {
            ChangeRequestState::Draft => Ok(()),
            state => Err(ChangeRequestError::IllegalState { state, action }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryFeatureStateStore;
    use crate::StateScope;
    use chrono::Duration;

    fn draft() -> ChangeRequest {
        ChangeRequest::new("Enable feature")
            .with_to_state(FeatureState::new(2, 1, 1, true, true))
    }

    #[tokio::test]
    async fn test_commit_without_required_approval_fails() {
        let store = InMemoryFeatureStateStore::new();
        let mut change = draft();
        change.add_approval(42, true).unwrap();

        let err = change.commit(&store, Utc::now()).await.unwrap_err();
        assert!(matches!(err, ChangeRequestError::NotApproved));

        // No partial effects: still a draft, version still unset.
        assert_eq!(change.state, ChangeRequestState::Draft);
        assert_eq!(change.to_feature_state.version, None);
        assert!(store
            .history(&StateScope::environment(1, 1))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_commit_after_required_approvals() {
        let store = InMemoryFeatureStateStore::new();
        let mut change = draft();
        let first = change.add_approval(42, true).unwrap();
        change.add_approval(43, false).unwrap();
        change.approve(first).unwrap();

        // The optional approval stays pending; only required ones gate.
        let committed = change.commit(&store, Utc::now()).await.unwrap();
        assert_eq!(committed.version, Some(1));
        assert_eq!(change.state, ChangeRequestState::Committed);
        assert!(committed.live_from.is_some());
    }

    #[tokio::test]
    async fn test_commit_is_not_reentrant() {
        let store = InMemoryFeatureStateStore::new();
        let mut change = draft();
        change.commit(&store, Utc::now()).await.unwrap();

        let err = change.commit(&store, Utc::now()).await.unwrap_err();
        assert!(matches!(
            err,
            ChangeRequestError::IllegalState {
                state: ChangeRequestState::Committed,
                action: "commit"
            }
        ));

        // The scope still holds exactly one version.
        let history = store.history(&StateScope::environment(1, 1)).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_scheduled_live_from_is_stamped() {
        let store = InMemoryFeatureStateStore::new();
        let now = Utc::now();
        let scheduled = now + Duration::hours(6);
        let mut change = draft().with_scheduled_live_from(scheduled);

        let committed = change.commit(&store, now).await.unwrap();
        assert_eq!(committed.live_from, Some(scheduled));

        // Not current until the schedule passes.
        let scope = StateScope::environment(1, 1);
        assert!(store.current(&scope, now).await.unwrap().is_none());
        assert!(store
            .current(&scope, scheduled + Duration::seconds(1))
            .await
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_approve_is_idempotent() {
        let mut change = draft();
        let id = change.add_approval(42, true).unwrap();

        change.approve(id).unwrap();
        let first = change.approvals[0].approved_at.unwrap();
        change.approve(id).unwrap();
        assert_eq!(change.approvals[0].approved_at, Some(first));
    }

    #[test]
    fn test_approve_unknown_approval() {
        let mut change = draft();
        assert!(matches!(
            change.approve(99),
            Err(ChangeRequestError::ApprovalNotFound(99))
        ));
    }

    #[test]
    fn test_withdrawn_request_rejects_everything() {
        let mut change = draft();
        let id = change.add_approval(42, true).unwrap();
        change.withdraw().unwrap();

        assert!(matches!(
            change.approve(id),
            Err(ChangeRequestError::IllegalState {
                state: ChangeRequestState::Withdrawn,
                ..
            })
        ));
        assert!(matches!(
            change.add_approval(43, true),
            Err(ChangeRequestError::IllegalState { .. })
        ));
        assert!(change.withdraw().is_err());
    }

    #[test]
    fn test_no_approvals_means_approved() {
        let change = draft();
        assert!(change.is_approved());
    }

    #[tokio::test]
    async fn test_concurrent_commits_same_scope_get_distinct_versions() {
        let store = InMemoryFeatureStateStore::new();

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..8 {
            let store = store.clone();
            tasks.spawn(async move {
                let mut change = ChangeRequest::new(format!("change {}", i))
                    .with_to_state(FeatureState::new(10 + i, 1, 1, true, true));
                change
                    .commit(&store, Utc::now())
                    .await
                    .unwrap()
                    .version
                    .unwrap()
            });
        }

        let mut versions = Vec::new();
        while let Some(version) = tasks.join_next().await {
            versions.push(version.unwrap());
        }
        versions.sort_unstable();
        assert_eq!(versions, (1..=8).collect::<Vec<_>>());
    }
}
