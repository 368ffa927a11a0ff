//! Webhook notifier for outgoing deliveries

use crate::payload::{sample_payload, WebhookDelivery, WebhookPayload};
use crate::signature::{PayloadSignature, EVENT_HEADER, SIGNATURE_HEADER};
use crate::{NotifierConfig, Result, Webhook, WebhookError, WebhookRegistry};
use reqwest::Client;
use tracing::{debug, info, warn};

/// Delivers signed payloads to registered webhook endpoints
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    config: NotifierConfig,
    http_client: Client,
}

impl WebhookNotifier {
    pub fn new(config: NotifierConfig) -> Self {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
        }
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// Deliver one payload to one endpoint
    ///
    /// The body is signed with the endpoint's secret when it has one;
    /// endpoints without a secret receive no signature header at all.
    pub async fn send(&self, webhook: &Webhook, payload: &WebhookPayload) -> Result<WebhookDelivery> {
        if !webhook.enabled {
            return Err(WebhookError::Config(format!(
                "webhook {} is disabled",
                webhook.id
            )));
        }

        let body = payload.to_bytes()?;
        let signature = webhook
            .secret
            .as_deref()
            .map(|secret| PayloadSignature::new(secret).sign(&body));

        let mut delivery = WebhookDelivery::new(&webhook.id, payload.event_type);
        let policy = &self.config.retry_policy;
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(url = %webhook.url, attempt, "webhook delivery attempt");

            let mut request = self
                .http_client
                .post(&webhook.url)
                .header("Content-Type", "application/json")
                .header(EVENT_HEADER, payload.event_type.as_str());
            if let Some(signature) = &signature {
                request = request.header(SIGNATURE_HEADER, signature);
            }

            match request.body(body.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        info!(url = %webhook.url, attempt, "webhook delivered");
                        delivery.mark_succeeded(status.as_u16());
                        return Ok(delivery);
                    }

                    warn!(url = %webhook.url, status = status.as_u16(), attempt, "webhook delivery failed");
                    delivery.mark_failed(Some(status.as_u16()), format!("HTTP {}", status));

                    if !(Self::should_retry_status(status.as_u16()) && policy.should_retry(attempt))
                    {
                        return Ok(delivery);
                    }
                }
                Err(err) => {
                    warn!(url = %webhook.url, error = %err, attempt, "webhook delivery error");
                    delivery.mark_failed(None, err.to_string());

                    if !policy.should_retry(attempt) {
                        return Ok(delivery);
                    }
                }
            }

            tokio::time::sleep(policy.delay_for_attempt(attempt)).await;
        }
    }

    /// Deliver one payload to every enabled webhook of an environment
    pub async fn broadcast(
        &self,
        registry: &WebhookRegistry,
        environment_key: &str,
        payload: &WebhookPayload,
    ) -> Result<Vec<WebhookDelivery>> {
        let webhooks = registry.enabled_webhooks(environment_key);
        let mut deliveries = Vec::with_capacity(webhooks.len());
        for webhook in webhooks {
            deliveries.push(self.send(&webhook, payload).await?);
        }
        Ok(deliveries)
    }

    /// Post a representative payload so an endpoint can be tested
    /// before real events flow through it
    pub async fn trigger_sample(&self, webhook: &Webhook) -> Result<WebhookDelivery> {
        self.send(webhook, &sample_payload()).await
    }

    /// Status codes worth retrying
    fn should_retry_status(status: u16) -> bool {
        matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
    }
}

impl Default for WebhookNotifier {
    fn default() -> Self {
        Self::new(NotifierConfig::default())
    }
}
