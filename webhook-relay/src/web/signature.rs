//! GitHub webhook signature verification.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw request body and
//! sends the hex digest in `X-Hub-Signature-256` as `sha256=<hex>`.
//! Reference: https://docs.github.com/en/webhooks/using-webhooks/validating-webhook-deliveries

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Verify a GitHub webhook signature.
///
/// # Arguments
///
/// * `secret` - The webhook secret configured on the GitHub side
/// * `body` - The raw request body, exactly as received
/// * `signature` - The `X-Hub-Signature-256` header value
///
/// # Returns
///
/// `true` if the signature matches, `false` otherwise.
pub fn verify_github_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    if secret.is_empty() || signature.is_empty() {
        warn!(
            has_secret = !secret.is_empty(),
            has_signature = !signature.is_empty(),
            "github_signature_missing_fields"
        );
        return false;
    }

    let provided = match signature.strip_prefix(SIGNATURE_PREFIX) {
        Some(hex) => hex,
        None => {
            warn!("github_signature_unsupported_algorithm");
            return false;
        }
    };

    let expected_signature = sign(secret, body);

    // Constant-time comparison to prevent timing attacks
    let valid = constant_time_compare(&expected_signature, &provided.to_ascii_lowercase());

    if !valid {
        warn!(
            expected_length = expected_signature.len(),
            actual_length = provided.len(),
            "github_signature_mismatch"
        );
    }

    valid
}

/// Hex HMAC-SHA256 of `body` keyed with `secret`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length.
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return String::new(),
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time string comparison to prevent timing attacks.
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

/// Check if signature verification is enabled.
pub fn is_signature_verification_enabled(secret: &Option<String>) -> bool {
    secret
        .as_ref()
        .map(|k| !k.trim().is_empty())
        .unwrap_or(false)
}
