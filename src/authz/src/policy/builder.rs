//! Policy document builder
//!
//! Assembles a policy document in the `p`/`g` grammar from typed statements, stored
//! documents and principal bindings, with optional `{{variable}}` substitution.
//!
//! ```rust
//! use iam_authz::hrn::ResourceHrn;
//! use iam_authz::policy::{PolicyBuilder, PolicyEffect};
//!
//! let policy: ResourceHrn = "hrn:acme::iam-policy/invoice_viewer".parse().unwrap();
//! let document = PolicyBuilder::for_policy(policy.clone())
//!     .with_statement("hrn:acme::invoice/*", "hrn:acme::invoice$view", PolicyEffect::Allow)
//!     .unwrap()
//!     .with_principal_policy("hrn:acme::iam-user/alice", policy.to_string())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(
//!     document,
//!     "p, hrn:acme::iam-policy/invoice_viewer, hrn:acme::invoice/*, hrn:acme::invoice$view, allow\n\
//!      g, hrn:acme::iam-user/alice, hrn:acme::iam-policy/invoice_viewer\n"
//! );
//! ```

use super::{PolicyEffect, PolicyModel, PolicyRule, RoleAssignment};
use crate::error::PolicyError;
use crate::hrn::{ResourceHrn, HRN_DELIMITER, HRN_PREFIX};
use serde::{Deserialize, Serialize};
use std::fmt;

const TEMPLATE_ORGANIZATION_PREFIX: &str = "hrn:{{organization_id}}";

/// A single line of a policy document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyStatement {
    Rule(PolicyRule),
    Grouping(RoleAssignment),
}

impl PolicyStatement {
    /// `p` statement
    pub fn p(
        principal: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
        effect: PolicyEffect,
    ) -> Self {
        Self::Rule(PolicyRule::new(principal, resource, action, effect))
    }

    /// `g` statement: `principal` holds `policy`
    pub fn g(principal: impl Into<String>, policy: impl Into<String>) -> Self {
        Self::Grouping(RoleAssignment::new(principal, policy))
    }
}

impl fmt::Display for PolicyStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rule(rule) => fmt::Display::fmt(rule, f),
            Self::Grouping(assignment) => fmt::Display::fmt(assignment, f),
        }
    }
}

/// Values substituted into `{{organization_id}}`, `{{user_hrn}}` and `{{user_id}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyVariables {
    pub organization_id: String,
    #[serde(default)]
    pub user_hrn: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl PolicyVariables {
    pub fn new(organization_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            user_hrn: None,
            user_id: None,
        }
    }

    pub fn with_user(mut self, user_hrn: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.user_hrn = Some(user_hrn.into());
        self.user_id = Some(user_id.into());
        self
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "organization_id" => Some(self.organization_id.as_str()),
            "user_hrn" => self.user_hrn.as_deref(),
            "user_id" => self.user_id.as_deref(),
            _ => None,
        }
    }
}

/// Policy document builder
#[derive(Debug, Clone, Default)]
pub struct PolicyBuilder {
    policy_hrn: Option<ResourceHrn>,
    organization_id: Option<String>,
    statements: Vec<PolicyStatement>,
    documents: Vec<String>,
    bindings: Vec<PolicyStatement>,
    variables: Option<PolicyVariables>,
}

impl PolicyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder for the policy named by `policy_hrn`
    ///
    /// Statements added with [`with_statement`](Self::with_statement) use the policy HRN
    /// as their principal and must stay inside its organization.
    pub fn for_policy(policy_hrn: ResourceHrn) -> Self {
        Self {
            organization_id: Some(policy_hrn.organization.clone()),
            policy_hrn: Some(policy_hrn),
            ..Self::default()
        }
    }

    /// Builder restricted to one organization, without a bound policy
    pub fn for_organization(organization_id: impl Into<String>) -> Self {
        Self {
            organization_id: Some(organization_id.into()),
            ..Self::default()
        }
    }

    /// Add a `p` statement for the bound policy
    pub fn with_statement(
        self,
        resource: impl Into<String>,
        action: impl Into<String>,
        effect: PolicyEffect,
    ) -> Result<Self, PolicyError> {
        let principal = self
            .policy_hrn
            .as_ref()
            .map(ToString::to_string)
            .ok_or(PolicyError::UnboundPolicy)?;
        self.with_statement_for(principal, resource, action, effect)
    }

    /// Add a `p` statement for an explicit principal
    pub fn with_statement_for(
        mut self,
        principal: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
        effect: PolicyEffect,
    ) -> Result<Self, PolicyError> {
        let rule = PolicyRule::new(principal, resource, action, effect);
        self.validate_organization(&rule)?;
        self.statements.push(PolicyStatement::Rule(rule));
        Ok(self)
    }

    /// Append an already-rendered policy document verbatim
    pub fn with_policy_document(mut self, document: impl Into<String>) -> Self {
        self.documents.push(document.into());
        self
    }

    /// Bind `principal` to `policy` (`g` line)
    pub fn with_principal_policy(
        mut self,
        principal: impl Into<String>,
        policy: impl Into<String>,
    ) -> Self {
        self.bindings.push(PolicyStatement::g(principal, policy));
        self
    }

    /// Substitute template variables when building
    pub fn with_variables(mut self, variables: PolicyVariables) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Render the document: statements, then stored documents, then bindings
    pub fn build(&self) -> Result<String, PolicyError> {
        let mut document = String::new();

        for statement in &self.statements {
            document.push_str(&statement.to_string());
            document.push('\n');
        }
        for stored in &self.documents {
            document.push_str(stored.trim_end_matches('\n'));
            document.push('\n');
        }
        for binding in &self.bindings {
            document.push_str(&binding.to_string());
            document.push('\n');
        }

        match &self.variables {
            Some(variables) => render_template(&document, variables),
            None => Ok(document),
        }
    }

    /// Build and compile the document
    pub fn compile(&self) -> Result<PolicyModel, PolicyError> {
        PolicyModel::compile(&self.build()?)
    }

    fn validate_organization(&self, rule: &PolicyRule) -> Result<(), PolicyError> {
        let Some(organization_id) = &self.organization_id else {
            return Ok(());
        };

        let prefix = format!("{}{}", HRN_PREFIX, organization_id);
        let in_organization = |value: &str| {
            has_organization_prefix(value, &prefix)
                || has_organization_prefix(value, TEMPLATE_ORGANIZATION_PREFIX)
        };

        if !in_organization(&rule.resource) {
            return Err(PolicyError::OrganizationMismatch(format!(
                "resource {}",
                rule.resource
            )));
        }
        if !in_organization(&rule.action) {
            return Err(PolicyError::OrganizationMismatch(format!(
                "action {}",
                rule.action
            )));
        }

        Ok(())
    }
}

/// `value` is `prefix` itself or continues it with `:`
fn has_organization_prefix(value: &str, prefix: &str) -> bool {
    match value.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(HRN_DELIMITER),
        None => false,
    }
}

/// Replace every `{{name}}` with its value. Unknown or unset names are errors.
fn render_template(template: &str, variables: &PolicyVariables) -> Result<String, PolicyError> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| PolicyError::Template(format!("unterminated placeholder in: {}", template)))?;

        let name = after[..end].trim();
        let value = variables
            .lookup(name)
            .ok_or_else(|| PolicyError::Template(format!("unknown variable '{}'", name)))?;
        output.push_str(value);

        rest = &after[end + 2..];
    }

    output.push_str(rest);
    Ok(output)
}
