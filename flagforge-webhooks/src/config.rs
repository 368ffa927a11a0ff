//! Notifier configuration

use crate::retry::RetryPolicy;
use std::time::Duration;

/// Configuration for the webhook notifier
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Per-request timeout
    pub timeout: Duration,

    /// User agent sent with deliveries
    pub user_agent: String,

    /// Retry policy for failed deliveries
    pub retry_policy: RetryPolicy,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: format!("flagforge-webhooks/{}", env!("CARGO_PKG_VERSION")),
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl NotifierConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Disable retries entirely
    pub fn no_retries(mut self) -> Self {
        self.retry_policy = RetryPolicy::none();
        self
    }
}
