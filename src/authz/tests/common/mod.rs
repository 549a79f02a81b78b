//! Shared fixtures: Ed25519 and ES256 issuers that mint compact tokens

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use ed25519_dalek::{Signer, SigningKey};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use iam_authz::token::codec::{encode_segment, DEFLATE, GZIP};
use iam_authz::{Ed25519Verifier, Es256Verifier, TokenVerifier, VerifierConfig};
use jsonwebtoken::{Algorithm, EncodingKey};
use serde_json::{json, Value};
use std::io::Write;

pub const ORGANIZATION: &str = "wkqmk8N7EM";
pub const USER: &str = "hrn:wkqmk8N7EM::iam-user/name1";
pub const NOW: i64 = 1_700_000_000;

pub const INVOICE_POLICY: &str = "\
p, hrn:wkqmk8N7EM::iam-policy/policy_view_invoice2, hrn:wkqmk8N7EM::invoice/1, hrn:wkqmk8N7EM::invoice$view, deny
p, hrn:wkqmk8N7EM::iam-policy/policy_view_invoice2, hrn:wkqmk8N7EM::invoice/*, hrn:wkqmk8N7EM::invoice$view, allow
g, hrn:wkqmk8N7EM::iam-user/name1, hrn:wkqmk8N7EM::iam-policy/policy_view_invoice2
";

pub fn now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(NOW, 0).unwrap()
}

/// Payload compression used when minting
#[derive(Debug, Clone, Copy)]
pub enum Zip {
    None,
    Gzip,
    Deflate,
}

/// Test issuer holding a fixed Ed25519 key
pub struct Issuer {
    key: SigningKey,
}

impl Issuer {
    pub fn new() -> Self {
        Self::with_seed(7)
    }

    pub fn with_seed(seed: u8) -> Self {
        Self {
            key: SigningKey::from_bytes(&[seed; 32]),
        }
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    pub fn verifier(&self) -> TokenVerifier {
        self.verifier_with(VerifierConfig::default())
    }

    pub fn verifier_with(&self, config: VerifierConfig) -> TokenVerifier {
        TokenVerifier::with_config(Ed25519Verifier::new(self.key.verifying_key()), config)
    }

    /// Claims valid for an hour around [`NOW`]
    pub fn claims(&self, policy: &str) -> Value {
        json!({
            "iss": "https://iam.hypto.com",
            "iat": NOW - 60,
            "exp": NOW + 3600,
            "ver": "1.0",
            "usr": USER,
            "org": ORGANIZATION,
            "entitlements": policy,
        })
    }

    pub fn mint(&self, claims: &Value) -> String {
        self.mint_with(claims, Zip::Gzip)
    }

    pub fn mint_with(&self, claims: &Value, zip: Zip) -> String {
        let json = claims.to_string();
        let (header, payload) = match zip {
            Zip::None => (json!({"alg": "EdDSA"}), json.into_bytes()),
            Zip::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(json.as_bytes()).unwrap();
                (json!({"alg": "EdDSA", "zip": GZIP}), encoder.finish().unwrap())
            }
            Zip::Deflate => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(json.as_bytes()).unwrap();
                (json!({"alg": "EdDSA", "zip": DEFLATE}), encoder.finish().unwrap())
            }
        };

        let signing_input = format!(
            "{}.{}",
            encode_segment(header.to_string().as_bytes()),
            encode_segment(&payload)
        );
        let signature = self.key.sign(signing_input.as_bytes()).to_bytes();
        format!("{}.{}", signing_input, encode_segment(&signature))
    }
}

pub const ES256_PRIVATE_PEM: &[u8] = include_bytes!("../fixtures/es256_private.pem");
pub const ES256_PUBLIC_PEM: &[u8] = include_bytes!("../fixtures/es256_public.pem");

/// Test issuer holding a fixed P-256 key, signing gzip payloads with ES256
pub struct Es256Issuer {
    key: EncodingKey,
}

impl Es256Issuer {
    pub fn new() -> Self {
        Self {
            key: EncodingKey::from_ec_pem(ES256_PRIVATE_PEM).unwrap(),
        }
    }

    pub fn verifier(&self) -> TokenVerifier {
        TokenVerifier::new(Es256Verifier::from_pem(ES256_PUBLIC_PEM).unwrap())
    }

    pub fn mint(&self, claims: &Value) -> String {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(claims.to_string().as_bytes()).unwrap();
        let header = json!({"alg": "ES256", "zip": GZIP});

        let signing_input = format!(
            "{}.{}",
            encode_segment(header.to_string().as_bytes()),
            encode_segment(&encoder.finish().unwrap())
        );
        // already base64url without padding
        let signature =
            jsonwebtoken::crypto::sign(signing_input.as_bytes(), &self.key, Algorithm::ES256)
                .unwrap();
        format!("{}.{}", signing_input, signature)
    }
}
