//! Scheduled promotion sweep
//!
//! Future-dated feature states become current on their own once
//! `live_from` passes; the sweep exists so something can observe the
//! transition and notify. It reads, it never writes, so running it zero
//! or many times over the same data converges to the same answer —
//! callers dedupe notifications by `(scope, version)`.

use crate::store::{FeatureStateStore, StoreError};
use chrono::{DateTime, Utc};
use flagforge_core::FeatureState;
use tracing::debug;

/// Feature states that went live inside `(since, now]` and are the
/// current state of their scope at `now`
pub async fn due_states(
    store: &dyn FeatureStateStore,
    since: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Vec<FeatureState>, StoreError> {
    let mut due = Vec::new();
    for scope in store.scopes().await? {
        let Some(current) = store.current(&scope, now).await? else {
            continue;
        };
        let Some(live_from) = current.live_from else {
            continue;
        };
        if live_from > since && live_from <= now {
            debug!(scope = %scope, version = current.version.unwrap_or_default(), "state went live");
            due.push(current);
        }
    }
    Ok(due)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryFeatureStateStore;
    use chrono::Duration;

    #[tokio::test]
    async fn test_sweep_reports_states_once_per_window() {
        let store = InMemoryFeatureStateStore::new();
        let start = Utc::now();
        let goes_live = start + Duration::hours(1);

        store
            .insert(FeatureState::new(1, 1, 1, false, false).with_live_from(start), None)
            .await
            .unwrap();
        store
            .insert(
                FeatureState::new(2, 1, 1, true, true).with_live_from(goes_live),
                None,
            )
            .await
            .unwrap();

        // Before the schedule passes: nothing due.
        let early = due_states(&store, start, start + Duration::minutes(30))
            .await
            .unwrap();
        assert!(early.is_empty());

        // The window containing live_from reports it.
        let hit = due_states(&store, start, start + Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].version, Some(2));

        // Re-running the same window returns the same answer.
        let again = due_states(&store, start, start + Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(again.len(), 1);

        // The next window no longer contains it.
        let later = due_states(
            &store,
            start + Duration::hours(2),
            start + Duration::hours(3),
        )
        .await
        .unwrap();
        assert!(later.is_empty());
    }

    #[tokio::test]
    async fn test_superseded_state_is_not_reported() {
        let store = InMemoryFeatureStateStore::new();
        let start = Utc::now();
        let goes_live = start + Duration::hours(1);

        store
            .insert(
                FeatureState::new(1, 1, 1, true, true).with_live_from(goes_live),
                None,
            )
            .await
            .unwrap();
        // A later version that is already live supersedes the scheduled one.
        store
            .insert(FeatureState::new(2, 1, 1, false, false).with_live_from(start), None)
            .await
            .unwrap();

        let due = due_states(&store, start, start + Duration::hours(2))
            .await
            .unwrap();
        assert!(due.is_empty());
    }
}
