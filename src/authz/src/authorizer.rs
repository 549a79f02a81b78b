//! Token authorizer
//!
//! Binds one verified token to one enforcer. Build it once per token and ask
//! [`TokenAuthorizer::has_permission`] as often as needed.

use crate::engine::{Decision, EngineConfig, EnforcementQuery, Enforcer};
use crate::error::Result;
use crate::policy::PolicyModel;
use crate::token::{TokenClaims, TokenVerifier};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Answers permission questions for the principal a token speaks for
#[derive(Debug)]
pub struct TokenAuthorizer {
    principal: String,
    claims: Option<TokenClaims>,
    enforcer: Enforcer,
}

impl TokenAuthorizer {
    /// Verify `token` against the current time and compile its policy
    pub fn from_token(token: &str, verifier: &TokenVerifier, config: EngineConfig) -> Result<Self> {
        Self::from_token_at(token, verifier, config, Utc::now())
    }

    /// Verify `token` as of `now` and compile its policy
    ///
    /// Nothing is compiled unless verification succeeds.
    pub fn from_token_at(
        token: &str,
        verifier: &TokenVerifier,
        config: EngineConfig,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let claims = verifier.verify(token, now)?.into_claims();
        let model = PolicyModel::compile(&claims.entitlements)?;

        debug!(principal = %claims.principal, "Token authorizer ready");

        Ok(Self {
            principal: claims.principal.clone(),
            claims: Some(claims),
            enforcer: Enforcer::with_config(model, config),
        })
    }

    /// Build from an already trusted principal and policy document
    pub fn from_parts(principal: impl Into<String>, policy_text: &str) -> Result<Self> {
        let model = PolicyModel::compile(policy_text)?;

        Ok(Self {
            principal: principal.into(),
            claims: None,
            enforcer: Enforcer::new(model),
        })
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Verified claims; `None` when built with [`TokenAuthorizer::from_parts`]
    pub fn claims(&self) -> Option<&TokenClaims> {
        self.claims.as_ref()
    }

    /// Organization of the token, when known
    pub fn organization(&self) -> Option<&str> {
        self.claims.as_ref().map(|c| c.organization.as_str())
    }

    pub fn enforcer(&self) -> &Enforcer {
        &self.enforcer
    }

    /// May the token's principal perform `action` on `resource`?
    pub fn has_permission(&self, resource: &str, action: &str) -> bool {
        self.enforcer.enforce(&self.principal, resource, action)
    }

    /// Explain the outcome of [`TokenAuthorizer::has_permission`]
    pub fn explain(&self, resource: &str, action: &str) -> Decision {
        self.enforcer
            .decide(&EnforcementQuery::new(self.principal.as_str(), resource, action))
    }
}
