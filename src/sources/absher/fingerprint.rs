//! Device fingerprint derivation.

use super::catalog::{pick, DeviceTraits};
use rand::Rng;
use sha2::{Digest, Sha256};

const FINGERPRINT_PREFIX: &str = "fp_";
const FINGERPRINT_HEX_LEN: usize = 12;

/// Derives a device identifier for `user_id`'s device number `device_number`.
///
/// Browser, OS, locale and screen resolution are drawn uniformly from `traits`;
/// the identifier is the first 12 hex chars of the SHA-256 of the composite
/// string. Truncation can collide, so identifiers are not unique.
pub fn generate_fingerprint<R: Rng + ?Sized>(
    rng: &mut R,
    traits: &DeviceTraits,
    user_id: u32,
    device_number: u32,
) -> String {
    let browser = pick(rng, &traits.browsers);
    let os = pick(rng, &traits.oses);
    let locale = pick(rng, &traits.locales);
    let screen = pick(rng, &traits.screen_resolutions);

    fingerprint_for(&format!(
        "{user_id}-{device_number}-{browser}-{os}-{locale}-{screen}"
    ))
}

/// Hashes a composite device string into `fp_<12 hex>`.
pub fn fingerprint_for(base: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(base.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{FINGERPRINT_PREFIX}{}", &digest[..FINGERPRINT_HEX_LEN])
}

/// Returns whether `value` has the `fp_<12 lowercase hex>` shape.
#[cfg(test)]
pub(crate) fn is_fingerprint(value: &str) -> bool {
    value
        .strip_prefix(FINGERPRINT_PREFIX)
        .map(|hex| {
            hex.len() == FINGERPRINT_HEX_LEN
                && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        })
        .unwrap_or(false)
}
