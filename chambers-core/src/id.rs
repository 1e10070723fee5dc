//! Prefixed random identifiers (`usr_...`)
//!
//! IDs carry 96 bits of entropy, base64 URL-safe encoded, behind a short type prefix.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};

use crate::crypto::fill_random;

/// Generate `{prefix}_{random}` with 96 bits of randomness.
pub fn generate_prefixed_id(prefix: &str) -> String {
    let mut bytes = [0u8; 12];
    fill_random(&mut bytes);
    format!("{prefix}_{}", BASE64_URL_SAFE_NO_PAD.encode(bytes))
}

/// Check that `id` is `{expected_prefix}_` followed by at least 96 bits of base64.
pub fn validate_prefixed_id(id: &str, expected_prefix: &str) -> bool {
    let Some(random_part) = id
        .strip_prefix(expected_prefix)
        .and_then(|rest| rest.strip_prefix('_'))
    else {
        return false;
    };

    BASE64_URL_SAFE_NO_PAD
        .decode(random_part)
        .is_ok_and(|decoded| decoded.len() >= 12)
}
