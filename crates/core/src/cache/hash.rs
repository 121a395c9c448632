//! Request-identity key generation.

use sha2::{Digest, Sha256};

/// Compute the store key for a request URL.
///
/// The URL is hashed verbatim; query strings take part and nothing is
/// reordered or lowercased.
pub fn compute_cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
