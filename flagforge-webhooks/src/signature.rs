//! Payload signing
//!
//! The signing contract is bit-exact: `hex(HMAC_SHA256(secret,
//! json_bytes))` over the request body, carried in
//! [`SIGNATURE_HEADER`]. Receivers recompute the same MAC over the raw
//! body bytes and compare in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature, present only when the target
/// webhook has a secret configured
pub const SIGNATURE_HEADER: &str = "X-Flagforge-Signature";

/// Header naming the event type
pub const EVENT_HEADER: &str = "X-Flagforge-Event";

/// HMAC-SHA256 signer for webhook payloads
#[derive(Debug, Clone)]
pub struct PayloadSignature {
    secret: String,
}

impl PayloadSignature {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Hex-encoded HMAC-SHA256 of the payload bytes
    pub fn sign(&self, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take any size key");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verify a received signature against the raw body bytes
    pub fn verify(&self, payload: &[u8], signature: &str) -> bool {
        constant_time_compare(&self.sign(payload), signature)
    }
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
