//! Incoming webhook verification

use crate::signature::PayloadSignature;

/// Verifies webhooks received from a Flagforge deployment
#[derive(Debug, Clone)]
pub struct WebhookReceiver {
    signature: PayloadSignature,
}

impl WebhookReceiver {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            signature: PayloadSignature::new(secret),
        }
    }

    /// Check a signature header against the raw request body
    pub fn verify(&self, body: &[u8], signature_header: &str) -> bool {
        self.signature.verify(body, signature_header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receiver_accepts_matching_signature() {
        let body = b"{\"event_type\":\"flag_updated\",\"data\":null}";
        let signature = PayloadSignature::new("secret").sign(body);

        let receiver = WebhookReceiver::new("secret");
        assert!(receiver.verify(body, &signature));
        assert!(!receiver.verify(b"other body", &signature));
        assert!(!WebhookReceiver::new("wrong").verify(body, &signature));
    }
}
