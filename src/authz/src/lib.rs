//! # IAM Authorization Engine
//!
//! Client-side authorization from self-contained access tokens.
//!
//! ## Features
//!
//! - **Signed tokens** verified before anything else is read (Ed25519 and ES256
//!   built in, other algorithms through [`SignatureVerifier`])
//! - **Compressed payloads** (gzip and deflate) with a decompression size limit
//! - **Embedded policies** in a line-oriented `p`/`g` format
//! - **Transitive, cycle-safe roles** with an optional per-subject cache
//! - **Deny overrides allow**, default deny
//! - **HRN helpers** and a [`PolicyBuilder`] for producing policy documents
//!
//! ## Example
//!
//! ```rust
//! use iam_authz::{Enforcer, PolicyModel};
//!
//! let model = PolicyModel::compile(
//!     "p, hrn:acme::iam-policy/reader, hrn:acme::invoice/*, hrn:acme::invoice$read, allow\n\
//!      g, hrn:acme::iam-user/alice, hrn:acme::iam-policy/reader",
//! )?;
//! let enforcer = Enforcer::new(model);
//!
//! assert!(enforcer.enforce(
//!     "hrn:acme::iam-user/alice",
//!     "hrn:acme::invoice/42",
//!     "hrn:acme::invoice$read",
//! ));
//! # Ok::<(), iam_authz::AuthzError>(())
//! ```
//!
//! With a token, [`TokenAuthorizer`] runs the whole pipeline:
//!
//! ```rust,no_run
//! use iam_authz::{EngineConfig, Ed25519Verifier, TokenAuthorizer, TokenVerifier};
//!
//! # fn run(public_key: &[u8], token: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let verifier = TokenVerifier::new(Ed25519Verifier::from_bytes(public_key).ok_or("bad key")?);
//! let authorizer = TokenAuthorizer::from_token(token, &verifier, EngineConfig::default())?;
//!
//! if authorizer.has_permission("hrn:acme::invoice/42", "hrn:acme::invoice$read") {
//!     println!("Access granted!");
//! }
//! # Ok(())
//! # }
//! ```

pub mod authorizer;
pub mod engine;
pub mod error;
pub mod hrn;
pub mod pattern;
pub mod policy;
pub mod roles;
pub mod token;

// Re-export commonly used types
pub use authorizer::TokenAuthorizer;
pub use engine::{Decision, DecisionReason, EngineConfig, EnforcementQuery, Enforcer};
pub use error::{AuthzError, HrnError, PolicyError, Result, TokenError};
pub use hrn::{ActionHrn, Hrn, ResourceHrn};
pub use policy::{PolicyBuilder, PolicyEffect, PolicyModel, PolicyRule, RoleAssignment};
pub use roles::CacheStats;
pub use token::{
    Ed25519Verifier, Es256Verifier, SignatureVerifier, TokenClaims, TokenVerifier, VerifiedToken,
    VerifierConfig,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
