//! Role membership graph
//!
//! Edges point from a member (user or role) to the roles it belongs to. The closure is
//! computed breadth-first with a visited set, so cycles and diamonds are harmless.

use crate::policy::RoleAssignment;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Adjacency index over role assignments
///
/// Built once per policy model; lookups are read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleGraph {
    /// member -> roles it is directly assigned to (document order, no duplicates)
    edges: HashMap<String, Vec<String>>,
}

impl RoleGraph {
    /// Build the adjacency index
    pub fn new(assignments: &[RoleAssignment]) -> Self {
        let mut edges: HashMap<String, Vec<String>> = HashMap::new();

        for assignment in assignments {
            let roles = edges.entry(assignment.principal.clone()).or_default();
            if !roles.contains(&assignment.role) {
                roles.push(assignment.role.clone());
            }
        }

        Self { edges }
    }

    /// Roles directly assigned to `member`
    pub fn direct_roles(&self, member: &str) -> &[String] {
        self.edges.get(member).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct members with at least one assignment
    pub fn member_count(&self) -> usize {
        self.edges.len()
    }

    /// Transitive closure of roles reachable from `principal`, including `principal`
    pub fn resolve(&self, principal: &str) -> BTreeSet<String> {
        let mut visited: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        visited.insert(principal.to_string());
        queue.push_back(principal);

        while let Some(current) = queue.pop_front() {
            for role in self.direct_roles(current) {
                if visited.insert(role.clone()) {
                    queue.push_back(role);
                }
            }
        }

        visited
    }
}

/// Resolve roles for `principal` directly from a list of assignments
pub fn resolve_roles(principal: &str, assignments: &[RoleAssignment]) -> BTreeSet<String> {
    RoleGraph::new(assignments).resolve(principal)
}
