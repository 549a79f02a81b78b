//! Token verification
//!
//! The only place trust is established. A token passes through, in order:
//!
//! ```text
//! split → header → signature check → payload (decompress) → claims → time bounds
//! ```
//!
//! The payload is never decompressed or parsed before its signature verifies.

pub mod claims;
pub mod codec;
pub mod signature;

pub use claims::TokenClaims;
pub use codec::{RawToken, TokenHeader};
pub use signature::{Ed25519Verifier, Es256Verifier, SignatureVerifier};

use crate::error::TokenError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default clock-skew tolerance in seconds
pub const DEFAULT_LEEWAY_SECS: u64 = 0;

/// Leeway values above this are clamped
const MAX_LEEWAY_SECS: u64 = u32::MAX as u64;

/// Default upper bound on the decoded payload size
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Token verifier configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Clock-skew tolerance applied to every time check
    pub leeway_secs: u64,

    /// Reject tokens whose `iat` lies in the future
    pub validate_issued_at: bool,

    /// Required `iss` value, if any
    pub expected_issuer: Option<String>,

    /// Accepted `ver` values; empty accepts any version
    pub accepted_versions: Vec<String>,

    /// Maximum decoded (and decompressed) payload size
    pub max_payload_bytes: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            leeway_secs: DEFAULT_LEEWAY_SECS,
            validate_issued_at: false,
            expected_issuer: None,
            accepted_versions: Vec::new(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

/// A token whose signature, claims and time bounds have been checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    header: TokenHeader,
    claims: TokenClaims,
}

impl VerifiedToken {
    pub fn header(&self) -> &TokenHeader {
        &self.header
    }

    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    /// Principal the token speaks for
    pub fn principal(&self) -> &str {
        &self.claims.principal
    }

    /// Raw embedded policy document
    pub fn policy_document(&self) -> &str {
        &self.claims.entitlements
    }

    pub fn into_claims(self) -> TokenClaims {
        self.claims
    }
}

/// Verifies compact signed tokens against one public key
pub struct TokenVerifier {
    signature_verifier: Box<dyn SignatureVerifier>,
    config: VerifierConfig,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Create a verifier with the default configuration
    pub fn new(signature_verifier: impl SignatureVerifier + 'static) -> Self {
        Self::with_config(signature_verifier, VerifierConfig::default())
    }

    /// Create a verifier with the given configuration
    pub fn with_config(
        signature_verifier: impl SignatureVerifier + 'static,
        config: VerifierConfig,
    ) -> Self {
        Self {
            signature_verifier: Box::new(signature_verifier),
            config,
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify a token against the current time
    pub fn verify_now(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        self.verify(token, Utc::now())
    }

    /// Verify a token as of `now`
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedToken, TokenError> {
        let result = self.verify_inner(token, now);

        match &result {
            Ok(verified) => debug!(
                principal = verified.principal(),
                organization = %verified.claims.organization,
                "Token verified"
            ),
            Err(e) => warn!(error = %e, "Token rejected"),
        }

        result
    }

    fn verify_inner(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedToken, TokenError> {
        let raw = RawToken::split(token)?;
        let header = raw.decode_header()?;

        if header.alg.is_empty() || header.alg.eq_ignore_ascii_case("none") {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }
        if !self.signature_verifier.supports(&header.alg) {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }

        let signature = raw.decode_signature()?;
        if !self
            .signature_verifier
            .verify(raw.signing_input.as_bytes(), &signature, &header.alg)
        {
            return Err(TokenError::InvalidSignature);
        }

        let payload = raw.decode_payload(&header, self.config.max_payload_bytes)?;
        let claims = TokenClaims::from_json(&payload)?;

        self.check_time_bounds(&claims, now)?;
        self.check_issuer_and_version(&claims)?;

        Ok(VerifiedToken { header, claims })
    }

    fn check_time_bounds(&self, claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
        let leeway = Duration::seconds(self.config.leeway_secs.min(MAX_LEEWAY_SECS) as i64);
        let shifted = |t: DateTime<Utc>| {
            t.checked_add_signed(leeway)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        };

        if now > shifted(claims.expires_at) {
            return Err(TokenError::TokenExpired {
                expired_at: claims.expires_at,
                now,
            });
        }

        if let Some(not_before) = claims.not_before {
            if shifted(now) < not_before {
                return Err(TokenError::TokenNotYetValid {
                    valid_from: not_before,
                    now,
                });
            }
        }

        if self.config.validate_issued_at && shifted(now) < claims.issued_at {
            return Err(TokenError::TokenNotYetValid {
                valid_from: claims.issued_at,
                now,
            });
        }

        Ok(())
    }

    fn check_issuer_and_version(&self, claims: &TokenClaims) -> Result<(), TokenError> {
        if let Some(expected) = &self.config.expected_issuer {
            if &claims.issuer != expected {
                return Err(TokenError::InvalidIssuer {
                    expected: expected.clone(),
                    actual: claims.issuer.clone(),
                });
            }
        }

        if !self.config.accepted_versions.is_empty()
            && !self.config.accepted_versions.contains(&claims.version)
        {
            return Err(TokenError::UnsupportedVersion(claims.version.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::codec::encode_segment;
    use ed25519_dalek::{Signer, SigningKey};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use serde_json::{json, Value};
    use std::io::Write;

    const NOW: i64 = 1_700_000_000;

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[7u8; 32])
    }

    fn verifier(config: VerifierConfig) -> TokenVerifier {
        TokenVerifier::with_config(Ed25519Verifier::new(signing_key().verifying_key()), config)
    }

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(NOW, 0).unwrap()
    }

    fn claims() -> Value {
        json!({
            "iss": "https://iam.hypto.com",
            "iat": NOW - 60,
            "exp": NOW + 3600,
            "ver": "1.0",
            "usr": "hrn:wkqmk8N7EM::iam-user/name1",
            "org": "wkqmk8N7EM",
            "entitlements": "p, hrn:wkqmk8N7EM::iam-policy/p1, hrn:wkqmk8N7EM::res/1, hrn:wkqmk8N7EM::res$read, allow\n",
        })
    }

    fn sign(header: Value, payload: &[u8]) -> String {
        let signing_input = format!(
            "{}.{}",
            encode_segment(header.to_string().as_bytes()),
            encode_segment(payload)
        );
        let signature = signing_key().sign(signing_input.as_bytes()).to_bytes();
        format!("{}.{}", signing_input, encode_segment(&signature))
    }

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    fn token(claims: &Value) -> String {
        let payload = gzip(claims.to_string().as_bytes());
        sign(json!({"alg": "EdDSA", "zip": "GZIP"}), &payload)
    }

    #[test]
    fn test_verify_valid_token() {
        let verified = verifier(VerifierConfig::default())
            .verify(&token(&claims()), now())
            .unwrap();

        assert_eq!(verified.principal(), "hrn:wkqmk8N7EM::iam-user/name1");
        assert_eq!(verified.claims().organization, "wkqmk8N7EM");
        assert_eq!(verified.header().zip.as_deref(), Some("GZIP"));
        assert!(verified.policy_document().starts_with("p, "));
    }

    #[test]
    fn test_uncompressed_payload() {
        let token = sign(json!({"alg": "EdDSA"}), claims().to_string().as_bytes());
        assert!(verifier(VerifierConfig::default()).verify(&token, now()).is_ok());
    }

    #[test]
    fn test_tampered_signature() {
        let mut token = token(&claims());
        let last = token.pop().unwrap();
        token.push(if last == 'A' { 'B' } else { 'A' });

        let err = verifier(VerifierConfig::default()).verify(&token, now()).unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature | TokenError::MalformedToken(_)));
    }

    #[test]
    fn test_tampered_payload() {
        let genuine = token(&claims());
        let forged = token(&json!({"usr": "mallory"}));

        let parts: Vec<&str> = genuine.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        let err = verifier(VerifierConfig::default()).verify(&spliced, now()).unwrap_err();
        assert_eq!(err, TokenError::InvalidSignature);
    }

    #[test]
    fn test_wrong_key() {
        let other = SigningKey::from_bytes(&[9u8; 32]);
        let verifier = TokenVerifier::new(Ed25519Verifier::new(other.verifying_key()));

        let err = verifier.verify(&token(&claims()), now()).unwrap_err();
        assert_eq!(err, TokenError::InvalidSignature);
    }

    #[test]
    fn test_rejected_algorithms() {
        let payload = claims().to_string();
        let verifier = verifier(VerifierConfig::default());

        for alg in ["none", "NONE", "", "ES256", "HS256"] {
            let token = sign(json!({ "alg": alg }), payload.as_bytes());
            assert_eq!(
                verifier.verify(&token, now()).unwrap_err(),
                TokenError::UnsupportedAlgorithm(alg.to_string()),
                "alg {:?}",
                alg
            );
        }
    }

    #[test]
    fn test_expired_token() {
        let mut value = claims();
        value["exp"] = json!(NOW - 1);

        let err = verifier(VerifierConfig::default())
            .verify(&token(&value), now())
            .unwrap_err();
        assert!(matches!(err, TokenError::TokenExpired { .. }));
    }

    #[test]
    fn test_expiry_boundary_and_leeway() {
        let mut value = claims();
        value["exp"] = json!(NOW);
        assert!(verifier(VerifierConfig::default()).verify(&token(&value), now()).is_ok());

        value["exp"] = json!(NOW - 30);
        let lenient = VerifierConfig {
            leeway_secs: 60,
            ..Default::default()
        };
        assert!(verifier(lenient).verify(&token(&value), now()).is_ok());
    }

    #[test]
    fn test_not_before() {
        let mut value = claims();
        value["nbf"] = json!(NOW + 120);

        let err = verifier(VerifierConfig::default())
            .verify(&token(&value), now())
            .unwrap_err();
        assert!(matches!(err, TokenError::TokenNotYetValid { .. }));

        let lenient = VerifierConfig {
            leeway_secs: 300,
            ..Default::default()
        };
        assert!(verifier(lenient).verify(&token(&value), now()).is_ok());
    }

    #[test]
    fn test_issued_at_check_is_opt_in() {
        let mut value = claims();
        value["iat"] = json!(NOW + 600);
        let token = token(&value);

        assert!(verifier(VerifierConfig::default()).verify(&token, now()).is_ok());

        let strict = VerifierConfig {
            validate_issued_at: true,
            ..Default::default()
        };
        assert!(matches!(
            verifier(strict).verify(&token, now()),
            Err(TokenError::TokenNotYetValid { .. })
        ));
    }

    #[test]
    fn test_issuer_and_version() {
        let token = token(&claims());

        let config = VerifierConfig {
            expected_issuer: Some("https://other.example".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            verifier(config).verify(&token, now()),
            Err(TokenError::InvalidIssuer { .. })
        ));

        let config = VerifierConfig {
            expected_issuer: Some("https://iam.hypto.com".to_string()),
            accepted_versions: vec!["1.0".to_string()],
            ..Default::default()
        };
        assert!(verifier(config).verify(&token, now()).is_ok());

        let config = VerifierConfig {
            accepted_versions: vec!["2.0".to_string()],
            ..Default::default()
        };
        assert_eq!(
            verifier(config).verify(&token, now()).unwrap_err(),
            TokenError::UnsupportedVersion("1.0".to_string())
        );
    }

    #[test]
    fn test_missing_claim() {
        let mut value = claims();
        value.as_object_mut().unwrap().remove("entitlements");

        assert_eq!(
            verifier(VerifierConfig::default())
                .verify(&token(&value), now())
                .unwrap_err(),
            TokenError::MissingClaim("entitlements")
        );
    }

    #[test]
    fn test_payload_size_limit() {
        let config = VerifierConfig {
            max_payload_bytes: 64,
            ..Default::default()
        };
        assert!(matches!(
            verifier(config).verify(&token(&claims()), now()),
            Err(TokenError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        let verifier = verifier(VerifierConfig::default());
        for token in ["", "invalid_token", "part1.part2.part3", "a.b.c.d"] {
            assert!(
                matches!(verifier.verify(token, now()), Err(TokenError::MalformedToken(_))),
                "token {:?}",
                token
            );
        }
    }
}
