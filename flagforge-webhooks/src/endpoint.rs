//! Webhook endpoint configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered webhook endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    /// Unique endpoint ID
    pub id: String,

    /// Target URL for delivery
    pub url: String,

    /// Whether deliveries are made to this endpoint
    pub enabled: bool,

    /// Signing secret; deliveries are unsigned when unset
    #[serde(skip_serializing)]
    pub secret: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Last successful delivery timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success: Option<DateTime<Utc>>,

    /// Last failed delivery timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<DateTime<Utc>>,

    /// Consecutive failure count
    pub failure_count: u32,
}

impl Webhook {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url: url.into(),
            enabled: true,
            secret: None,
            created_at: Utc::now(),
            last_success: None,
            last_failure: None,
            failure_count: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Record a successful delivery
    pub fn record_success(&mut self) {
        self.last_success = Some(Utc::now());
        self.failure_count = 0;
    }

    /// Record a failed delivery
    pub fn record_failure(&mut self) {
        self.last_failure = Some(Utc::now());
        self.failure_count += 1;
    }
}
