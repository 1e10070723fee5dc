//! Token and password hashing helpers
//!
//! Session tokens are high-entropy random strings. Only their SHA-256 hash is stored,
//! and stored hashes are compared in constant time so lookups do not leak timing
//! information. Passwords are low-entropy secrets and go through argon2 instead
//! (via `password-auth`).

use std::sync::LazyLock;

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Fill `bytes` from the operating system's CSPRNG.
///
/// # Panics
///
/// Panics if the OS random number generator fails. There is no safe way to continue
/// issuing identifiers or tokens without an entropy source.
pub(crate) fn fill_random(bytes: &mut [u8]) {
    OsRng
        .try_fill_bytes(bytes)
        .expect("OS RNG failure - system entropy source unavailable");
}

/// Generate a 256-bit random token encoded as URL-safe base64 (43 characters).
pub fn generate_secure_token() -> String {
    let mut bytes = [0u8; 32];
    fill_random(&mut bytes);
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex-encoded SHA-256 of a token, used as its storage key.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a plaintext token against a stored hash in constant time.
pub fn verify_token_hash(token: &str, stored_hash: &str) -> bool {
    let computed_hash = hash_token(token);
    constant_time_compare(computed_hash.as_bytes(), stored_hash.as_bytes())
}

pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Hash a password with argon2 and a random salt (PHC string format).
pub fn hash_password(password: &str) -> String {
    password_auth::generate_hash(password)
}

/// Verify a password against a PHC hash produced by [`hash_password`].
///
/// Malformed hashes verify as `false`.
pub fn verify_password(password: &str, hash: &str) -> bool {
    password_auth::verify_password(password, hash).is_ok()
}

// Hash of a random password nobody knows.
static DUMMY_PASSWORD_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password(&generate_secure_token()));

/// Run a full argon2 verification that can never succeed.
///
/// Used when there is no stored hash to check against, so a missing user costs the
/// same time as a wrong password.
pub(crate) fn verify_dummy_password(password: &str) -> bool {
    verify_password(password, &DUMMY_PASSWORD_HASH)
}
