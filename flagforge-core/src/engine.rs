//! Evaluation engine facade
//!
//! Validates incoming evaluation requests, sources the identity (from
//! the request itself, or from an edge identity store when the project
//! is provisioned for one), and runs the resolver. Whether an edge store
//! is consulted is explicit configuration on [`EngineOptions`] plus the
//! project's own flag; there is no ambient global toggle.

use crate::document::EnvironmentDocument;
use crate::error::EvaluationError;
use crate::identity::Identity;
use crate::resolver::{self, ResolvedFlag};
use crate::value::{TraitValue, Traits};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// An evaluation request from the API boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub environment_key: String,
    pub identifier: String,

    #[serde(default)]
    pub traits: Traits,
}

impl EvaluationRequest {
    pub fn new(environment_key: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            environment_key: environment_key.into(),
            identifier: identifier.into(),
            traits: Traits::new(),
        }
    }

    pub fn with_trait(mut self, key: impl Into<String>, value: impl Into<TraitValue>) -> Self {
        self.traits.set(key, value);
        self
    }

    fn validate(&self) -> Result<(), EvaluationError> {
        if self.identifier.trim().is_empty() {
            return Err(EvaluationError::BadRequest(
                "identifier must not be blank".to_string(),
            ));
        }
        if self.environment_key.trim().is_empty() {
            return Err(EvaluationError::BadRequest(
                "environment key must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

/// Failure inside an identity source
#[derive(Error, Debug)]
pub enum IdentitySourceError {
    #[error("Identity source unavailable: {0}")]
    Unavailable(String),
}

/// An alternate source of identities and their traits
///
/// Implementations own their consistency model; the engine treats the
/// returned identity as possibly stale but never mixes sources within a
/// single request.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    /// Fetch an identity by identifier, `None` when it has never been seen
    async fn get_identity(
        &self,
        environment_key: &str,
        identifier: &str,
    ) -> Result<Option<Identity>, IdentitySourceError>;
}

/// Engine construction options
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Kill switch over every project's edge flag
    pub edge_enabled: bool,

    /// Bound on a single identity-source read
    pub edge_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            edge_enabled: true,
            edge_timeout: Duration::from_secs(2),
        }
    }
}

/// The evaluation entry point
#[derive(Clone)]
pub struct FlagEngine {
    options: EngineOptions,
    identities: Option<Arc<dyn IdentitySource>>,
}

impl FlagEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            identities: None,
        }
    }

    pub fn with_identity_source(mut self, source: Arc<dyn IdentitySource>) -> Self {
        self.identities = Some(source);
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Evaluate a request against an environment document at `Utc::now()`
    pub async fn evaluate(
        &self,
        document: &EnvironmentDocument,
        request: &EvaluationRequest,
    ) -> Result<Vec<ResolvedFlag>, EvaluationError> {
        self.evaluate_at(document, request, Utc::now()).await
    }

    /// Evaluate at an explicit instant; the engine itself reads no clocks
    /// beyond this, so results are reproducible
    pub async fn evaluate_at(
        &self,
        document: &EnvironmentDocument,
        request: &EvaluationRequest,
        now: DateTime<Utc>,
    ) -> Result<Vec<ResolvedFlag>, EvaluationError> {
        request.validate()?;
        if request.environment_key != document.key {
            return Err(EvaluationError::BadRequest(format!(
                "environment key {} does not match document {}",
                request.environment_key, document.key
            )));
        }

        let identity = self.source_identity(document, request).await?;
        Ok(resolver::resolve(document, &identity, now))
    }

    /// Build the identity to resolve for
    ///
    /// A configured identity source is consulted whenever the kill
    /// switch is on, and a failing read fails the request rather than
    /// silently evaluating against request traits alone. Edge-enabled
    /// projects additionally require a source to be configured at all.
    /// Stored traits are merged under the request's traits (the request
    /// wins).
    async fn source_identity(
        &self,
        document: &EnvironmentDocument,
        request: &EvaluationRequest,
    ) -> Result<Identity, EvaluationError> {
        let transient = Identity::new(&request.identifier).with_traits(request.traits.clone());

        if !self.options.edge_enabled {
            return Ok(transient);
        }

        let Some(source) = &self.identities else {
            if document.project.edge_enabled {
                return Err(EvaluationError::EdgeStoreUnavailable(format!(
                    "project {} requires an edge store but none is configured",
                    document.project.name
                )));
            }
            return Ok(transient);
        };

        let lookup = source.get_identity(&document.key, &request.identifier);
        let stored = match tokio::time::timeout(self.options.edge_timeout, lookup).await {
            Ok(Ok(stored)) => stored,
            Ok(Err(IdentitySourceError::Unavailable(reason))) => {
                return Err(EvaluationError::EdgeStoreUnavailable(reason));
            }
            Err(_) => {
                return Err(EvaluationError::EdgeStoreUnavailable(format!(
                    "identity read exceeded {:?}",
                    self.options.edge_timeout
                )));
            }
        };

        match stored {
            Some(mut identity) => {
                identity.traits.merge(&request.traits);
                Ok(identity)
            }
            None => Ok(transient),
        }
    }
}
