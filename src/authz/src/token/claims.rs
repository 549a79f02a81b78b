//! Typed token claims
//!
//! Claims are validated once, up front: a missing key becomes
//! [`TokenError::MissingClaim`], a key of the wrong JSON type becomes
//! [`TokenError::InvalidClaim`].

use crate::error::TokenError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ISSUER_CLAIM: &str = "iss";
pub const ISSUED_AT_CLAIM: &str = "iat";
pub const EXPIRATION_CLAIM: &str = "exp";
pub const NOT_BEFORE_CLAIM: &str = "nbf";
pub const VERSION_CLAIM: &str = "ver";
pub const USER_CLAIM: &str = "usr";
pub const SUBJECT_CLAIM: &str = "sub";
pub const ORGANIZATION_CLAIM: &str = "org";
pub const ENTITLEMENTS_CLAIM: &str = "entitlements";
pub const AUDIENCE_CLAIM: &str = "aud";
pub const TOKEN_ID_CLAIM: &str = "jti";

/// Validated claims of an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Token issuer (`iss`)
    pub issuer: String,

    /// Issue time (`iat`)
    pub issued_at: DateTime<Utc>,

    /// Expiry time (`exp`)
    pub expires_at: DateTime<Utc>,

    /// Not-before time (`nbf`), when present
    pub not_before: Option<DateTime<Utc>>,

    /// Token format version (`ver`)
    pub version: String,

    /// Principal the token speaks for (`usr`, falling back to `sub`)
    pub principal: String,

    /// Organization / tenant (`org`)
    pub organization: String,

    /// Raw policy document (`entitlements`)
    pub entitlements: String,

    /// Standard subject (`sub`), when present
    pub subject: Option<String>,

    /// Audience (`aud`), string or array form
    pub audience: Vec<String>,

    /// Token identifier (`jti`), when present
    pub token_id: Option<String>,
}

impl TokenClaims {
    /// Validate a decoded claims object
    pub fn from_map(claims: &Map<String, Value>) -> Result<Self, TokenError> {
        let subject = optional_string(claims, SUBJECT_CLAIM)?;
        let principal = match optional_string(claims, USER_CLAIM)? {
            Some(user) => user,
            None => subject.clone().ok_or(TokenError::MissingClaim(USER_CLAIM))?,
        };

        Ok(Self {
            issuer: required_string(claims, ISSUER_CLAIM)?,
            issued_at: required_timestamp(claims, ISSUED_AT_CLAIM)?,
            expires_at: required_timestamp(claims, EXPIRATION_CLAIM)?,
            not_before: optional_timestamp(claims, NOT_BEFORE_CLAIM)?,
            version: required_string(claims, VERSION_CLAIM)?,
            principal,
            organization: required_string(claims, ORGANIZATION_CLAIM)?,
            entitlements: required_string(claims, ENTITLEMENTS_CLAIM)?,
            subject,
            audience: audience(claims)?,
            token_id: optional_string(claims, TOKEN_ID_CLAIM)?,
        })
    }

    /// Parse and validate a JSON claims payload
    pub fn from_json(payload: &[u8]) -> Result<Self, TokenError> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| TokenError::MalformedToken(format!("invalid payload JSON: {}", e)))?;

        match value {
            Value::Object(map) => Self::from_map(&map),
            _ => Err(TokenError::MalformedToken(
                "payload is not a JSON object".to_string(),
            )),
        }
    }
}

fn optional_string(claims: &Map<String, Value>, claim: &'static str) -> Result<Option<String>, TokenError> {
    match claims.get(claim) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(TokenError::InvalidClaim {
            claim,
            reason: format!("expected string, found {}", json_type(other)),
        }),
    }
}

fn required_string(claims: &Map<String, Value>, claim: &'static str) -> Result<String, TokenError> {
    optional_string(claims, claim)?.ok_or(TokenError::MissingClaim(claim))
}

fn optional_timestamp(
    claims: &Map<String, Value>,
    claim: &'static str,
) -> Result<Option<DateTime<Utc>>, TokenError> {
    let seconds = match claims.get(claim) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(other) => {
            return Err(TokenError::InvalidClaim {
                claim,
                reason: format!("expected numeric date, found {}", json_type(other)),
            })
        }
    };

    seconds
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .map(Some)
        .ok_or_else(|| TokenError::InvalidClaim {
            claim,
            reason: "timestamp out of range".to_string(),
        })
}

fn required_timestamp(claims: &Map<String, Value>, claim: &'static str) -> Result<DateTime<Utc>, TokenError> {
    optional_timestamp(claims, claim)?.ok_or(TokenError::MissingClaim(claim))
}

fn audience(claims: &Map<String, Value>) -> Result<Vec<String>, TokenError> {
    match claims.get(AUDIENCE_CLAIM) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(TokenError::InvalidClaim {
                    claim: AUDIENCE_CLAIM,
                    reason: format!("expected string entries, found {}", json_type(other)),
                }),
            })
            .collect(),
        Some(other) => Err(TokenError::InvalidClaim {
            claim: AUDIENCE_CLAIM,
            reason: format!("expected string or array, found {}", json_type(other)),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
