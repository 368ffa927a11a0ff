//! Deterministic percentage bucketing
//!
//! Percentage-split conditions and the multivariate selector must agree on
//! where an identity lands, so both go through [`percentage_for`]. The
//! result depends only on the ids passed in: same ids, same percentage,
//! across calls and across process restarts.

use sha2::{Digest, Sha256};

/// Resolution of the bucket space: 10_000 slots gives 0.01% granularity.
const BUCKET_SLOTS: u64 = 10_000;

/// Hash a list of object ids into a percentage in `[0, 100)`
///
/// Ids are joined with `,` before hashing, so `["1", "23"]` and
/// `["12", "3"]` land in different buckets.
pub fn percentage_for(object_ids: &[&str]) -> f64 {
    let mut hasher = Sha256::new();
    for (i, id) in object_ids.iter().enumerate() {
        if i > 0 {
            hasher.update(b",");
        }
        hasher.update(id.as_bytes());
    }
    let digest = hasher.finalize();

    // First 8 digest bytes as a big-endian integer, reduced to the slot
    // space. SHA-256 output is uniform enough that the modulo bias over
    // 10_000 slots is negligible.
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let n = u64::from_be_bytes(bytes);

    (n % BUCKET_SLOTS) as f64 * 100.0 / BUCKET_SLOTS as f64
}
