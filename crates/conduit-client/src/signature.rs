//! Handshake signing for `conduit.connect`.
//!
//! The server checks that `authToken` is within 15 minutes of its own
//! clock and that `authSignature` is the SHA-1 of the decimal token
//! immediately followed by the certificate.

use std::time::{SystemTime, UNIX_EPOCH};

use sha1::{Digest, Sha1};

/// Current wall-clock time in whole seconds since the Unix epoch.
pub fn current_auth_token() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Lowercase hex SHA-1 over `"{auth_token}{certificate}"`.
pub fn auth_signature(auth_token: u64, certificate: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(auth_token.to_string().as_bytes());
    hasher.update(certificate.as_bytes());
    hex::encode(hasher.finalize())
}
