//! Signature verification primitives
//!
//! The verifier never does curve math itself. It hands the signing input, the decoded
//! signature and the header's `alg` to a [`SignatureVerifier`], which holds the key.
//!
//! Built in: [`Ed25519Verifier`] (`EdDSA`) and [`Es256Verifier`] (`ES256`, P-256 with
//! the fixed-width `r || s` signature encoding).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use jsonwebtoken::{Algorithm, DecodingKey};
use std::fmt;

/// Verifies a detached signature for one public key
pub trait SignatureVerifier: Send + Sync {
    /// Whether this verifier handles `algorithm` at all
    fn supports(&self, algorithm: &str) -> bool;

    /// Verify `signature` over `signing_input` with the algorithm named in the header
    fn verify(&self, signing_input: &[u8], signature: &[u8], algorithm: &str) -> bool;
}

impl<T: SignatureVerifier + ?Sized> SignatureVerifier for Box<T> {
    fn supports(&self, algorithm: &str) -> bool {
        (**self).supports(algorithm)
    }

    fn verify(&self, signing_input: &[u8], signature: &[u8], algorithm: &str) -> bool {
        (**self).verify(signing_input, signature, algorithm)
    }
}

/// Ed25519 (`alg: EdDSA`) verifier
#[derive(Debug, Clone)]
pub struct Ed25519Verifier {
    key: VerifyingKey,
}

impl Ed25519Verifier {
    /// JOSE algorithm names accepted by this verifier
    pub const ALGORITHMS: [&'static str; 2] = ["EdDSA", "Ed25519"];

    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Build from a raw 32-byte public key
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; 32] = bytes.try_into().ok()?;
        VerifyingKey::from_bytes(bytes).ok().map(Self::new)
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.key
    }
}

impl SignatureVerifier for Ed25519Verifier {
    fn supports(&self, algorithm: &str) -> bool {
        Self::ALGORITHMS.contains(&algorithm)
    }

    fn verify(&self, signing_input: &[u8], signature: &[u8], algorithm: &str) -> bool {
        if !self.supports(algorithm) {
            return false;
        }

        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };

        self.key.verify(signing_input, &signature).is_ok()
    }
}

/// ECDSA P-256 / SHA-256 (`alg: ES256`) verifier
pub struct Es256Verifier {
    key: DecodingKey,
}

impl fmt::Debug for Es256Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Es256Verifier").finish_non_exhaustive()
    }
}

impl Es256Verifier {
    /// JOSE algorithm names accepted by this verifier
    pub const ALGORITHMS: [&'static str; 1] = ["ES256"];

    /// Build from a PEM encoded EC public key (`-----BEGIN PUBLIC KEY-----`)
    pub fn from_pem(pem: &[u8]) -> Option<Self> {
        DecodingKey::from_ec_pem(pem).ok().map(|key| Self { key })
    }

    /// Build from base64url affine coordinates, as found in a JWK
    pub fn from_components(x: &str, y: &str) -> Option<Self> {
        DecodingKey::from_ec_components(x, y)
            .ok()
            .map(|key| Self { key })
    }
}

impl SignatureVerifier for Es256Verifier {
    fn supports(&self, algorithm: &str) -> bool {
        Self::ALGORITHMS.contains(&algorithm)
    }

    fn verify(&self, signing_input: &[u8], signature: &[u8], algorithm: &str) -> bool {
        if !self.supports(algorithm) {
            return false;
        }

        let encoded = URL_SAFE_NO_PAD.encode(signature);
        jsonwebtoken::crypto::verify(&encoded, signing_input, &self.key, Algorithm::ES256)
            .unwrap_or(false)
    }
}
