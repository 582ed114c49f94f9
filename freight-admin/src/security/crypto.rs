// Hash helpers for log-safe identifiers.

use base64::Engine;
use sha2::{Digest, Sha256};

/// SHA-256 hex digest (lowercase).
pub fn sha256_hex(input: &[u8]) -> String {
    Sha256::digest(input)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Short, stable fingerprint of a secret (bearer token, OTP) for logs.
/// First 12 characters of the URL-safe base64 SHA-256.
pub fn secret_fingerprint(input: &str) -> String {
    let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(Sha256::digest(input.as_bytes()));
    encoded.chars().take(12).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_digest_matches_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn fingerprint_is_short_stable_and_opaque() {
        let a = secret_fingerprint("eyJhbGciOiJIUzI1NiJ9.payload.sig");
        assert_eq!(a.len(), 12);
        assert_eq!(a, secret_fingerprint("eyJhbGciOiJIUzI1NiJ9.payload.sig"));
        assert_ne!(a, secret_fingerprint("other"));
        assert!(!a.contains("eyJ"));
    }
}
