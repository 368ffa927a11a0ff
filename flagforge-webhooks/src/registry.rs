//! Per-environment webhook registry

use crate::endpoint::Webhook;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Holds each environment's registered webhooks
#[derive(Debug, Clone, Default)]
pub struct WebhookRegistry {
    environments: Arc<RwLock<HashMap<String, Vec<Webhook>>>>,
}

impl WebhookRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            environments: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a webhook for an environment, returning its id
    pub fn register(&self, environment_key: impl Into<String>, webhook: Webhook) -> String {
        let id = webhook.id.clone();
        let mut environments = self.environments.write().unwrap();
        environments
            .entry(environment_key.into())
            .or_default()
            .push(webhook);
        id
    }

    /// Remove a webhook by id
    pub fn remove(&self, environment_key: &str, webhook_id: &str) {
        let mut environments = self.environments.write().unwrap();
        if let Some(webhooks) = environments.get_mut(environment_key) {
            webhooks.retain(|w| w.id != webhook_id);
        }
    }

    /// Enabled webhooks for an environment, the set a broadcast targets
    pub fn enabled_webhooks(&self, environment_key: &str) -> Vec<Webhook> {
        let environments = self.environments.read().unwrap();
        environments
            .get(environment_key)
            .map(|webhooks| webhooks.iter().filter(|w| w.enabled).cloned().collect())
            .unwrap_or_default()
    }

    /// Every webhook for an environment, enabled or not
    pub fn all_webhooks(&self, environment_key: &str) -> Vec<Webhook> {
        let environments = self.environments.read().unwrap();
        environments.get(environment_key).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_filter() {
        let registry = WebhookRegistry::new();
        registry.register("env", Webhook::new("http://url.1.com"));
        registry.register("env", Webhook::new("http://url.2.com").disabled());

        assert_eq!(registry.enabled_webhooks("env").len(), 1);
        assert_eq!(registry.all_webhooks("env").len(), 2);
        assert!(registry.enabled_webhooks("other").is_empty());
    }

    #[test]
    fn test_remove() {
        let registry = WebhookRegistry::new();
        registry.register("env", Webhook::new("http://url.1.com").with_id("wh-1"));

        registry.remove("env", "wh-1");
        assert!(registry.all_webhooks("env").is_empty());
    }
}
