//! Bridge from an edge store to the resolution engine

use crate::store::{EdgeStore, EdgeStoreError};
use async_trait::async_trait;
use flagforge_core::{Identity, IdentitySource, IdentitySourceError};
use std::sync::Arc;

/// Adapts any [`EdgeStore`] into the engine's identity seam
///
/// Adapter failures become `EdgeStoreUnavailable` at the engine: the
/// request fails fast rather than falling back to a different source.
#[derive(Clone)]
pub struct EdgeIdentitySource {
    store: Arc<dyn EdgeStore>,
}

impl EdgeIdentitySource {
    pub fn new(store: Arc<dyn EdgeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IdentitySource for EdgeIdentitySource {
    async fn get_identity(
        &self,
        environment_key: &str,
        identifier: &str,
    ) -> Result<Option<Identity>, IdentitySourceError> {
        match self.store.get_identity(environment_key, identifier).await {
            Ok(identity) => Ok(identity),
            Err(EdgeStoreError::NotFound(_)) => Ok(None),
            Err(err) => Err(IdentitySourceError::Unavailable(err.to_string())),
        }
    }
}
