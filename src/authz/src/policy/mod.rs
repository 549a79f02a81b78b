//! Policy definitions
//!
//! A policy document is a list of `p` rules and `g` role assignments. The compiler
//! turns the text into a frozen [`PolicyModel`]; the builder goes the other way.

pub mod builder;
pub mod compiler;

pub use builder::{PolicyBuilder, PolicyStatement, PolicyVariables};
pub use compiler::compile;

use crate::roles::RoleGraph;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Policy effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyEffect {
    /// Allow the action
    Allow,
    /// Deny the action
    Deny,
}

impl PolicyEffect {
    /// Parse an effect token. Case-sensitive: only `allow` and `deny` are accepted.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "allow" => Some(Self::Allow),
            "deny" => Some(Self::Deny),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

impl fmt::Display for PolicyEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One authorization statement (`p` line)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Role or literal subject the rule applies to
    pub role_or_subject: String,

    /// Resource pattern (trailing `*` matches any suffix)
    pub resource: String,

    /// Action pattern (trailing `*` matches any suffix)
    pub action: String,

    pub effect: PolicyEffect,
}

impl PolicyRule {
    pub fn new(
        role_or_subject: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
        effect: PolicyEffect,
    ) -> Self {
        Self {
            role_or_subject: role_or_subject.into(),
            resource: resource.into(),
            action: action.into(),
            effect,
        }
    }

    /// Check the resource and action patterns against a concrete pair
    pub fn matches(&self, resource: &str, action: &str) -> bool {
        crate::pattern::matches(&self.resource, resource)
            && crate::pattern::matches(&self.action, action)
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "p, {}, {}, {}, {}",
            self.role_or_subject, self.resource, self.action, self.effect
        )
    }
}

/// Group membership (`g` line): `principal` is a member of `role`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub principal: String,
    pub role: String,
}

impl RoleAssignment {
    pub fn new(principal: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            role: role.into(),
        }
    }
}

impl fmt::Display for RoleAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g, {}, {}", self.principal, self.role)
    }
}

/// Compiled policy document
///
/// Rules and assignments keep document order. The model has no mutating methods; once
/// built it can be shared freely between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyModel {
    rules: Vec<PolicyRule>,
    assignments: Vec<RoleAssignment>,
    role_graph: RoleGraph,
}

impl PolicyModel {
    /// Freeze a set of rules and assignments into a model
    pub fn new(rules: Vec<PolicyRule>, assignments: Vec<RoleAssignment>) -> Self {
        let role_graph = RoleGraph::new(&assignments);
        Self {
            rules,
            assignments,
            role_graph,
        }
    }

    /// Compile a policy document
    pub fn compile(text: &str) -> Result<Self, crate::error::PolicyError> {
        compile(text)
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    pub fn assignments(&self) -> &[RoleAssignment] {
        &self.assignments
    }

    pub fn role_graph(&self) -> &RoleGraph {
        &self.role_graph
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.assignments.is_empty()
    }
}

impl fmt::Display for PolicyModel {
    /// Renders the model back into document form, rules first
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{}", rule)?;
        }
        for assignment in &self.assignments {
            writeln!(f, "{}", assignment)?;
        }
        Ok(())
    }
}
