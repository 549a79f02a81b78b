//! Enforcement engine
//!
//! Orchestrates role resolution and pattern matching over one frozen policy model.

pub mod decision;

pub use decision::{Decision, DecisionReason, EnforcementQuery};

use crate::policy::{PolicyEffect, PolicyModel, PolicyRule};
use crate::roles::{resolver::DEFAULT_MAX_CACHED_SUBJECTS, CacheStats, RoleResolver};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Memoise resolved roles per subject
    pub cache_roles: bool,

    /// Maximum number of subjects kept in the role cache
    pub max_cached_subjects: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_roles: true,
            max_cached_subjects: DEFAULT_MAX_CACHED_SUBJECTS,
        }
    }
}

/// Policy enforcer bound to one compiled model
///
/// # Algorithm
///
/// ```text
/// subject → RoleResolver → roles
/// rules ∩ (role ∈ roles, resource matches, action matches) → candidates
/// any Deny → false | any Allow → true | otherwise → false
/// ```
///
/// The enforcer is `Send + Sync`; share it with `Arc` for concurrent queries.
#[derive(Debug)]
pub struct Enforcer {
    model: PolicyModel,
    role_resolver: RoleResolver,
}

impl Enforcer {
    /// Create an enforcer with the default configuration
    pub fn new(model: PolicyModel) -> Self {
        Self::with_config(model, EngineConfig::default())
    }

    /// Create an enforcer with the given configuration
    pub fn with_config(model: PolicyModel, config: EngineConfig) -> Self {
        let role_resolver = if config.cache_roles {
            RoleResolver::with_capacity(config.max_cached_subjects)
        } else {
            RoleResolver::uncached()
        };

        info!(
            rules = model.rules().len(),
            assignments = model.assignments().len(),
            cache_roles = config.cache_roles,
            "Enforcer initialized"
        );

        Self {
            model,
            role_resolver,
        }
    }

    /// The compiled model this enforcer evaluates
    pub fn model(&self) -> &PolicyModel {
        &self.model
    }

    /// Decide whether `subject` may perform `action` on `resource`
    pub fn enforce(&self, subject: &str, resource: &str, action: &str) -> bool {
        self.evaluate(subject, resource, action).allowed
    }

    /// Decide a query and explain the outcome
    pub fn decide(&self, query: &EnforcementQuery) -> Decision {
        self.evaluate(&query.subject, &query.resource, &query.action)
    }

    /// True when every query is allowed (vacuously true for no queries)
    pub fn enforce_all(&self, queries: &[EnforcementQuery]) -> bool {
        queries.iter().all(|q| self.decide(q).allowed)
    }

    /// True when at least one query is allowed
    pub fn enforce_any(&self, queries: &[EnforcementQuery]) -> bool {
        queries.iter().any(|q| self.decide(q).allowed)
    }

    /// True when no query is allowed
    pub fn enforce_none(&self, queries: &[EnforcementQuery]) -> bool {
        !self.enforce_any(queries)
    }

    /// Per-query results in input order
    pub fn batch_enforce(&self, queries: &[EnforcementQuery]) -> Vec<bool> {
        queries.iter().map(|q| self.decide(q).allowed).collect()
    }

    /// Roles `subject` resolves to under this model
    pub fn roles_for(&self, subject: &str) -> BTreeSet<String> {
        (*self.role_resolver.resolve(self.model.role_graph(), subject)).clone()
    }

    /// Role cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.role_resolver.cache_stats()
    }

    fn evaluate(&self, subject: &str, resource: &str, action: &str) -> Decision {
        let roles = self.role_resolver.resolve(self.model.role_graph(), subject);

        let mut first_allow: Option<&PolicyRule> = None;

        for rule in self.model.rules() {
            if !roles.contains(&rule.role_or_subject) || !rule.matches(resource, action) {
                continue;
            }

            match rule.effect {
                PolicyEffect::Deny => {
                    debug!(subject, resource, action, rule = %rule, "Explicit deny");
                    return Decision::explicit_deny(rule.clone(), (*roles).clone());
                }
                PolicyEffect::Allow => {
                    first_allow.get_or_insert(rule);
                }
            }
        }

        match first_allow {
            Some(rule) => {
                debug!(subject, resource, action, rule = %rule, "Allowed");
                Decision::allow(rule.clone(), (*roles).clone())
            }
            None => {
                debug!(subject, resource, action, "No rule matched, default deny");
                Decision::no_match((*roles).clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enforcer(text: &str) -> Enforcer {
        Enforcer::new(PolicyModel::compile(text).unwrap())
    }

    #[test]
    fn test_default_deny() {
        let admins = enforcer("p, admin, doc/*, read, allow\ng, alice, admin");
        assert!(!admins.enforce("bob", "doc/1", "read"));
        assert!(!admins.enforce("alice", "img/1", "read"));
        assert!(!admins.enforce("alice", "doc/1", "write"));

        let empty = enforcer("");
        assert!(!empty.enforce("alice", "doc/1", "read"));
    }

    #[test]
    fn test_deny_overrides_allow_in_either_order() {
        let deny_first = enforcer("p, r, doc, read, deny\np, r, doc, read, allow\ng, u, r");
        let allow_first = enforcer("p, r, doc, read, allow\np, r, doc, read, deny\ng, u, r");

        assert!(!deny_first.enforce("u", "doc", "read"));
        assert!(!allow_first.enforce("u", "doc", "read"));
    }

    #[test]
    fn test_rule_may_target_subject_directly() {
        let enforcer = enforcer("p, alice, doc/1, read, allow");
        assert!(enforcer.enforce("alice", "doc/1", "read"));
        assert!(!enforcer.enforce("bob", "doc/1", "read"));
    }

    #[test]
    fn test_decide_reports_deciding_rule() {
        let enforcer = enforcer(
            "p, r, doc/*, read, allow\np, r, doc/secret, read, deny\ng, u, r",
        );

        let decision = enforcer.decide(&EnforcementQuery::new("u", "doc/secret", "read"));
        assert!(!decision.allowed);
        assert_eq!(
            decision.deciding_rule(),
            Some(&PolicyRule::new("r", "doc/secret", "read", PolicyEffect::Deny))
        );
        assert!(decision.roles.contains("r"));

        let decision = enforcer.decide(&EnforcementQuery::new("u", "doc/public", "read"));
        assert!(decision.allowed);
        assert!(matches!(decision.reason, DecisionReason::Allowed { .. }));

        let decision = enforcer.decide(&EnforcementQuery::new("x", "doc/public", "read"));
        assert_eq!(decision.reason, DecisionReason::NoMatch);
    }

    #[test]
    fn test_batch_operations() {
        let enforcer = enforcer("p, r, doc/*, read, allow\ng, u, r");
        let allowed = EnforcementQuery::new("u", "doc/1", "read");
        let denied = EnforcementQuery::new("u", "doc/1", "write");

        assert!(enforcer.enforce_all(&[allowed.clone(), allowed.clone()]));
        assert!(!enforcer.enforce_all(&[allowed.clone(), denied.clone()]));
        assert!(enforcer.enforce_all(&[]));

        assert!(enforcer.enforce_any(&[denied.clone(), allowed.clone()]));
        assert!(!enforcer.enforce_any(&[denied.clone()]));
        assert!(!enforcer.enforce_any(&[]));

        assert!(enforcer.enforce_none(&[denied.clone()]));
        assert!(!enforcer.enforce_none(&[denied.clone(), allowed.clone()]));

        assert_eq!(
            enforcer.batch_enforce(&[allowed.clone(), denied, allowed]),
            vec![true, false, true]
        );
    }

    #[test]
    fn test_cache_configuration() {
        let model = PolicyModel::compile("g, u, r").unwrap();

        let cached = Enforcer::new(model.clone());
        cached.enforce("u", "x", "y");
        assert!(cached.cache_stats().enabled);
        assert_eq!(cached.cache_stats().size, 1);

        let uncached = Enforcer::with_config(
            model,
            EngineConfig {
                cache_roles: false,
                ..Default::default()
            },
        );
        uncached.enforce("u", "x", "y");
        assert!(!uncached.cache_stats().enabled);
        assert_eq!(uncached.roles_for("u").len(), 2);
    }

    #[test]
    fn test_enforcer_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Enforcer>();
    }
}
