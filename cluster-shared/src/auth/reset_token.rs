/// Password-reset token utilities
///
/// Reset tokens are 20 random bytes rendered as 40 hex characters. Only the
/// SHA-256 of a token is persisted; the plaintext travels by email.
///
/// # Example
///
/// ```
/// use cluster_shared::auth::reset_token::{generate_reset_token, verify_reset_token};
///
/// let (token, hash) = generate_reset_token();
/// assert_eq!(token.len(), 40);
/// assert!(verify_reset_token(&token, &hash));
/// assert!(!verify_reset_token("deadbeef", &hash));
/// ```

use chrono::Duration;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in a reset token
const TOKEN_BYTES: usize = 20;

/// How long a reset token stays valid
pub fn reset_token_ttl() -> Duration {
    Duration::hours(1)
}

/// Generates a new reset token
///
/// Returns `(plaintext_token, sha256_hex)`.
pub fn generate_reset_token() -> (String, String) {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    let token = hex::encode(bytes);
    let hash = hash_reset_token(&token);

    (token, hash)
}

/// Hex-encoded SHA-256 of a token
pub fn hash_reset_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks a presented token against the stored hash in constant time
pub fn verify_reset_token(token: &str, stored_hash: &str) -> bool {
    constant_time_compare(&hash_reset_token(token), stored_hash)
}

/// Constant-time string comparison
///
/// Always walks the full input so timing does not reveal the first
/// differing byte.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
