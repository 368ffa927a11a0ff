//! Error types for webhook operations

use thiserror::Error;

/// Errors that can occur during webhook operations
#[derive(Error, Debug)]
pub enum WebhookError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Payload serialization failed
    #[error("Payload error: {0}")]
    Payload(String),

    /// Delivery failed after all retries
    #[error("Delivery failed after {attempts} attempts: {message}")]
    DeliveryFailed { attempts: u32, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::Payload(err.to_string())
    }
}
