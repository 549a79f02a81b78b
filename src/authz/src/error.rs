//! Error types for the authorization engine

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Token verification errors
///
/// Every variant is fatal to the verification attempt. Callers must treat any of
/// them as "authorization cannot be determined", i.e. deny.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Structural decode failure (segment count, base64, JSON, compression)
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Header names an algorithm that cannot be verified
    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Signature does not verify under the supplied key
    #[error("Invalid token signature")]
    InvalidSignature,

    /// `exp` is in the past
    #[error("Token expired at {expired_at} (now {now})")]
    TokenExpired {
        expired_at: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    /// `nbf` (or `iat`, when enforced) is in the future
    #[error("Token not valid before {valid_from} (now {now})")]
    TokenNotYetValid {
        valid_from: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    /// Required claim absent from the payload
    #[error("Missing required claim: {0}")]
    MissingClaim(&'static str),

    /// Claim present but of the wrong shape
    #[error("Invalid claim '{claim}': {reason}")]
    InvalidClaim { claim: &'static str, reason: String },

    /// Issuer does not match the configured one
    #[error("Unexpected issuer '{actual}' (expected '{expected}')")]
    InvalidIssuer { expected: String, actual: String },

    /// Token version marker is not accepted
    #[error("Unsupported token version: {0}")]
    UnsupportedVersion(String),
}

/// Policy document errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// A line violates the `p`/`g` grammar
    #[error("Malformed policy line {line} ({reason}): {text}")]
    MalformedPolicyLine {
        line: usize,
        text: String,
        reason: String,
    },

    /// Effect is neither `allow` nor `deny`
    #[error("Invalid effect '{effect}' on policy line {line}")]
    InvalidEffect { line: usize, effect: String },

    /// Statement refers to another organization
    #[error("Organization id does not match: {0}")]
    OrganizationMismatch(String),

    /// Statement added without a policy HRN to act as its principal
    #[error("Statement principal requires a bound policy hrn")]
    UnboundPolicy,

    /// Template variable substitution failed
    #[error("Invalid policy template: {0}")]
    Template(String),

    /// HRN parse failure
    #[error(transparent)]
    Hrn(#[from] HrnError),
}

/// HRN parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HrnError {
    #[error("Not a valid resource hrn: {0}")]
    InvalidResourceHrn(String),

    #[error("Not a valid action hrn: {0}")]
    InvalidActionHrn(String),

    #[error("Not a valid hrn: {0}")]
    InvalidHrn(String),
}

/// Authorization errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// Token could not be verified
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Embedded policy could not be compiled
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

impl From<HrnError> for AuthzError {
    fn from(err: HrnError) -> Self {
        AuthzError::Policy(PolicyError::Hrn(err))
    }
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
