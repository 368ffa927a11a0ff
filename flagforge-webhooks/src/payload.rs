//! Webhook payload and delivery types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Engine events delivered over webhooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEvent {
    FlagUpdated,
    FlagDeleted,
    ChangeRequestCommitted,
    AuditLogCreated,
}

impl WebhookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlagUpdated => "flag_updated",
            Self::FlagDeleted => "flag_deleted",
            Self::ChangeRequestCommitted => "change_request_committed",
            Self::AuditLogCreated => "audit_log_created",
        }
    }
}

/// The body posted to a webhook endpoint
///
/// The serialized form of this struct is exactly what gets signed; any
/// re-serialization on the wire would break signature verification, so
/// the notifier sends the same bytes it signs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event_type: WebhookEvent,
    pub data: serde_json::Value,
}

impl WebhookPayload {
    pub fn new(event_type: WebhookEvent) -> Self {
        Self {
            event_type,
            data: serde_json::Value::Null,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// The JSON bytes that are posted and signed
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// A representative payload for testing an endpoint's configuration
pub fn sample_payload() -> WebhookPayload {
    WebhookPayload::new(WebhookEvent::FlagUpdated).with_data(serde_json::json!({
        "changed_by": "sample@flagforge.dev",
        "new_state": {
            "feature": {"id": 1, "name": "sample_feature"},
            "enabled": true,
            "feature_state_value": "sample",
        },
        "previous_state": {
            "feature": {"id": 1, "name": "sample_feature"},
            "enabled": false,
            "feature_state_value": null,
        },
    }))
}

/// Status of a webhook delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookDeliveryStatus {
    Pending,
    Succeeded,

    /// Failed with retries exhausted
    Failed,
}

/// Record of one delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDelivery {
    pub id: String,
    pub webhook_id: String,
    pub event_type: WebhookEvent,
    pub status: WebhookDeliveryStatus,
    pub attempts: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_status_code: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl WebhookDelivery {
    pub fn new(webhook_id: impl Into<String>, event_type: WebhookEvent) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            webhook_id: webhook_id.into(),
            event_type,
            status: WebhookDeliveryStatus::Pending,
            attempts: 0,
            last_status_code: None,
            last_error: None,
            created_at: Utc::now(),
        }
    }

    pub fn mark_succeeded(&mut self, status_code: u16) {
        self.status = WebhookDeliveryStatus::Succeeded;
        self.last_status_code = Some(status_code);
        self.last_error = None;
        self.attempts += 1;
    }

    pub fn mark_failed(&mut self, status_code: Option<u16>, error: String) {
        self.status = WebhookDeliveryStatus::Failed;
        self.last_status_code = status_code;
        self.last_error = Some(error);
        self.attempts += 1;
    }
}
