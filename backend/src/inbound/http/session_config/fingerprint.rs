//! Session key fingerprinting for operational visibility.
//!
//! A truncated SHA-256 of the key's signing half lets operators confirm which
//! secret a deployment is using without printing the secret itself.

use actix_web::cookie::Key;
use sha2::{Digest, Sha256};

/// Length of the fingerprint in bytes before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

/// Generate a 16-character lowercase hex fingerprint of `key`.
///
/// # Examples
///
/// ```rust
/// use actix_web::cookie::Key;
/// use session_gate::inbound::http::session_config::fingerprint::key_fingerprint;
///
/// let fp = key_fingerprint(&Key::generate());
/// assert_eq!(fp.len(), 16);
/// assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(digest.iter().take(FINGERPRINT_BYTES).copied().collect::<Vec<u8>>())
}
