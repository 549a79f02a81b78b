//! Enforcement queries and decisions

use crate::policy::PolicyRule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A concrete `(subject, resource, action)` tuple to decide on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnforcementQuery {
    /// Principal the decision is about (e.g., "hrn:acme::iam-user/alice")
    pub subject: String,

    /// Resource being accessed (e.g., "hrn:acme::invoice/1")
    pub resource: String,

    /// Action being performed (e.g., "hrn:acme::invoice$view")
    pub action: String,
}

impl EnforcementQuery {
    pub fn new(
        subject: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            resource: resource.into(),
            action: action.into(),
        }
    }
}

/// Why a decision came out the way it did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecisionReason {
    /// A matching deny rule overrides every allow
    ExplicitDeny { rule: PolicyRule },

    /// At least one allow rule matched and no deny did
    Allowed { rule: PolicyRule },

    /// No rule matched; default deny
    NoMatch,
}

/// Enforcement decision with explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the request is allowed
    pub allowed: bool,

    /// Rule (if any) that determined the outcome
    pub reason: DecisionReason,

    /// Roles the subject resolved to, including the subject itself
    pub roles: BTreeSet<String>,
}

impl Decision {
    pub fn explicit_deny(rule: PolicyRule, roles: BTreeSet<String>) -> Self {
        Self {
            allowed: false,
            reason: DecisionReason::ExplicitDeny { rule },
            roles,
        }
    }

    pub fn allow(rule: PolicyRule, roles: BTreeSet<String>) -> Self {
        Self {
            allowed: true,
            reason: DecisionReason::Allowed { rule },
            roles,
        }
    }

    pub fn no_match(roles: BTreeSet<String>) -> Self {
        Self {
            allowed: false,
            reason: DecisionReason::NoMatch,
            roles,
        }
    }

    /// The rule that decided the outcome, if any
    pub fn deciding_rule(&self) -> Option<&PolicyRule> {
        match &self.reason {
            DecisionReason::ExplicitDeny { rule } | DecisionReason::Allowed { rule } => Some(rule),
            DecisionReason::NoMatch => None,
        }
    }
}
