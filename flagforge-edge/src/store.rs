//! Edge store adapter trait and in-memory reference backend

use crate::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use flagforge_core::Identity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors from an edge store backend
#[derive(Error, Debug)]
pub enum EdgeStoreError {
    /// The store could not be reached inside its timeout
    #[error("Edge store unavailable: {0}")]
    Unavailable(String),

    /// The project is not provisioned for an edge store
    #[error("Edge store is not enabled for this project")]
    NotEnabled,

    /// No identity under the given key
    #[error("Identity not found: {0}")]
    NotFound(String),

    /// A stored document could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// How a search query matches identifiers
///
/// Follows the admin search convention: a quoted query is an exact
/// lookup, anything else matches identifiers beginning with the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchQuery {
    Equal(String),
    BeginsWith(String),
}

impl SearchQuery {
    /// Parse raw user input into a query
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
            Self::Equal(trimmed[1..trimmed.len() - 1].to_string())
        } else {
            Self::BeginsWith(trimmed.to_string())
        }
    }

    pub fn matches(&self, identifier: &str) -> bool {
        match self {
            Self::Equal(value) => identifier == value,
            Self::BeginsWith(prefix) => identifier.starts_with(prefix),
        }
    }
}

/// Cursor-based page request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_size: usize,

    /// Cursor from the previous page's `last_evaluated_key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<String>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_size: 100,
            last_evaluated_key: None,
        }
    }
}

impl PageRequest {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            last_evaluated_key: None,
        }
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.last_evaluated_key = Some(cursor.into());
        self
    }
}

/// One page of identities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityPage {
    pub identities: Vec<Identity>,

    /// Cursor for the next page; `None` when this page is the last
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<String>,
}

/// An external, possibly stale store of identities and traits
///
/// Implementations are keyed by environment key; identifiers are unique
/// within an environment. Reads have a bounded timeout enforced by the
/// implementation and surface [`EdgeStoreError::Unavailable`] on
/// failure instead of degrading silently.
#[async_trait]
pub trait EdgeStore: Send + Sync {
    /// Fetch one identity with its traits and overrides
    async fn get_identity(
        &self,
        environment_key: &str,
        identifier: &str,
    ) -> Result<Option<Identity>>;

    /// Create or replace an identity document
    async fn put_identity(&self, environment_key: &str, identity: Identity) -> Result<()>;

    /// Page through identities matching a query, ordered by identifier
    async fn search(
        &self,
        environment_key: &str,
        query: &SearchQuery,
        page: &PageRequest,
    ) -> Result<IdentityPage>;

    /// Remove an identity document
    async fn delete(&self, environment_key: &str, identifier: &str) -> Result<()>;
}

/// In-memory edge store (for testing/development)
#[derive(Clone, Default)]
pub struct InMemoryEdgeStore {
    /// Identities per environment, ordered by identifier so pagination
    /// cursors are stable
    environments: Arc<DashMap<String, BTreeMap<String, Identity>>>,
}

impl InMemoryEdgeStore {
    pub fn new() -> Self {
        Self {
            environments: Arc::new(DashMap::new()),
        }
    }

    pub fn clear(&self) {
        self.environments.clear();
    }
}

#[async_trait]
impl EdgeStore for InMemoryEdgeStore {
    async fn get_identity(
        &self,
        environment_key: &str,
        identifier: &str,
    ) -> Result<Option<Identity>> {
        Ok(self
            .environments
            .get(environment_key)
            .and_then(|env| env.get(identifier).cloned()))
    }

    async fn put_identity(&self, environment_key: &str, identity: Identity) -> Result<()> {
        debug!(environment = environment_key, identifier = %identity.identifier, "storing identity");
        self.environments
            .entry(environment_key.to_string())
            .or_default()
            .insert(identity.identifier.clone(), identity);
        Ok(())
    }

    async fn search(
        &self,
        environment_key: &str,
        query: &SearchQuery,
        page: &PageRequest,
    ) -> Result<IdentityPage> {
        let Some(env) = self.environments.get(environment_key) else {
            return Ok(IdentityPage {
                identities: Vec::new(),
                last_evaluated_key: None,
            });
        };

        let mut matches = env
            .iter()
            .filter(|(identifier, _)| query.matches(identifier))
            .skip_while(|(identifier, _)| {
                page.last_evaluated_key
                    .as_deref()
                    .is_some_and(|cursor| identifier.as_str() <= cursor)
            })
            .map(|(_, identity)| identity.clone())
            .take(page.page_size + 1)
            .collect::<Vec<_>>();

        let last_evaluated_key = if matches.len() > page.page_size {
            matches.truncate(page.page_size);
            matches.last().map(|i| i.identifier.clone())
        } else {
            None
        };

        Ok(IdentityPage {
            identities: matches,
            last_evaluated_key,
        })
    }

    async fn delete(&self, environment_key: &str, identifier: &str) -> Result<()> {
        if let Some(mut env) = self.environments.get_mut(environment_key) {
            env.remove(identifier);
        }
        Ok(())
    }
}
