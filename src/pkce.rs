//! PKCE verifier/challenge generation (RFC 7636, S256 only).
//!
//! The verifier is 32 cryptographically random bytes encoded as
//! base64url without padding (43 characters); the challenge is the
//! base64url-encoded SHA-256 digest of the verifier's UTF-8 bytes.
//! Both functions are pure apart from the entropy source.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// A generated PKCE verifier/challenge pair.
///
/// The verifier is the secret half, persisted tab-scoped until the
/// login callback completes; the challenge is sent in the
/// authorization URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkcePair {
    /// Secret, sent with the token exchange as `code_verifier`.
    pub verifier: String,
    /// Public, sent in the authorization URL as `code_challenge`.
    pub challenge: String,
}

impl PkcePair {
    /// Generate a fresh verifier and derive its S256 challenge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CryptoUnavailable`] when the OS entropy
    /// source fails; callers must not proceed with login.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| Error::CryptoUnavailable(e.to_string()))?;

        let verifier = URL_SAFE_NO_PAD.encode(bytes);
        let challenge = challenge_for(&verifier);

        Ok(Self { verifier, challenge })
    }
}

/// Compute the S256 challenge for a verifier:
/// `BASE64URL(SHA256(verifier))`.
pub fn challenge_for(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Generate the random `state` parameter for CSRF protection:
/// 16 random bytes, base64url encoded (22 characters).
///
/// # Errors
///
/// Returns [`Error::CryptoUnavailable`] when the entropy source fails.
pub fn generate_state() -> Result<String> {
    let mut bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| Error::CryptoUnavailable(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verifier_length_and_charset() {
        let pair = PkcePair::generate().unwrap();
        // 32 bytes base64url encoded = 43 characters
        assert_eq!(pair.verifier.len(), 43);
        assert!(pair
            .verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_challenge_matches_sha256_of_verifier() {
        let pair = PkcePair::generate().unwrap();

        let digest = Sha256::digest(pair.verifier.as_bytes());
        let expected = URL_SAFE_NO_PAD.encode(digest);

        assert_eq!(pair.challenge, expected);
    }

    #[test]
    fn test_challenge_deterministic_for_verifier() {
        assert_eq!(challenge_for("fixed-verifier"), challenge_for("fixed-verifier"));
        assert_ne!(challenge_for("verifier-a"), challenge_for("verifier-b"));
    }

    #[test]
    fn test_known_vector() {
        // RFC 7636 appendix B test vector.
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(challenge_for(verifier), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn test_pairs_unique() {
        let a = PkcePair::generate().unwrap();
        let b = PkcePair::generate().unwrap();
        assert_ne!(a.verifier, b.verifier);
        assert_ne!(a.challenge, b.challenge);
    }

    #[test]
    fn test_state_length_and_uniqueness() {
        let s1 = generate_state().unwrap();
        let s2 = generate_state().unwrap();
        // 16 bytes base64url encoded = 22 characters
        assert_eq!(s1.len(), 22);
        assert_ne!(s1, s2);
        assert!(s1.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
