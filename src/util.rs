//! Shared utility functions for the exampay application.

use axum::http::HeaderMap;
use rand::Rng;

/// Generate a random bearer API key. Only the SHA-256 hash is stored; the
/// plaintext is shown once at creation time.
pub fn generate_api_key() -> String {
    let bytes: [u8; 24] = rand::thread_rng().r#gen();
    format!("xp_{}", hex::encode(bytes))
}

/// Hash an API key for storage/lookup (no plaintext keys in the DB).
pub fn hash_api_key(key: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"exampay-key-v1:");
    hasher.update(key.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Extract a Bearer token from the Authorization header.
///
/// Returns the token string without the "Bearer " prefix, or None if
/// the header is missing, malformed, or empty after the prefix.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Append query parameters to a URL, percent-encoding the values.
pub fn append_query_params(base_url: &str, params: &[(&str, &str)]) -> String {
    let query_string: String = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    if base_url.contains('?') {
        format!("{}&{}", base_url, query_string)
    } else {
        format!("{}?{}", base_url, query_string)
    }
}
