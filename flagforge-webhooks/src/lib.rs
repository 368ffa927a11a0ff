//! Webhook Notifications for Flagforge
//!
//! Delivers engine events (flag updates, committed change requests) to
//! registered HTTP endpoints. When an endpoint has a signing secret
//! configured, the request carries an HMAC-SHA256 signature of the JSON
//! body, hex-encoded, in the `X-Flagforge-Signature` header; without a
//! secret no signature header is sent at all.
//!
//! # Example: Notifying Endpoints
//!
//! ```rust,no_run
//! use flagforge_webhooks::{NotifierConfig, Webhook, WebhookEvent, WebhookNotifier, WebhookPayload};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let notifier = WebhookNotifier::new(NotifierConfig::default());
//!
//!     let webhook = Webhook::new("https://example.com/hooks").with_secret("endpoint-secret");
//!     let payload = WebhookPayload::new(WebhookEvent::FlagUpdated)
//!         .with_data(serde_json::json!({"feature": "new-ui", "enabled": true}));
//!
//!     notifier.send(&webhook, &payload).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Example: Verifying an Incoming Webhook
//!
//! ```rust
//! use flagforge_webhooks::WebhookReceiver;
//!
//! let receiver = WebhookReceiver::new("endpoint-secret");
//! let valid = receiver.verify(b"{\"key\":\"value\"}", "deadbeef");
//! assert!(!valid);
//! ```

mod client;
mod config;
mod endpoint;
mod error;
mod payload;
mod receiver;
mod registry;
mod retry;
mod signature;

pub use client::WebhookNotifier;
pub use config::NotifierConfig;
pub use endpoint::Webhook;
pub use error::WebhookError;
pub use payload::{sample_payload, WebhookDelivery, WebhookDeliveryStatus, WebhookEvent, WebhookPayload};
pub use receiver::WebhookReceiver;
pub use registry::WebhookRegistry;
pub use retry::RetryPolicy;
pub use signature::{PayloadSignature, EVENT_HEADER, SIGNATURE_HEADER};

/// Result type for webhook operations
pub type Result<T> = std::result::Result<T, WebhookError>;
