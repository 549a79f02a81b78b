//! Role resolution
//!
//! Computes the set of roles a principal holds from the `g` assignments of a policy
//! document. Membership is transitive: a role may itself be assigned to another role.
//!
//! # Features
//!
//! - **Transitive closure**: breadth-first walk over principal → role edges
//! - **Cycle safety**: visited set bounds the walk, `A -> B -> A` terminates
//! - **Subject inclusion**: the principal's own id is always part of the result
//! - **Thread-safe caching**: optional DashMap memo keyed by subject
//!
//! # Example
//!
//! ```rust
//! use iam_authz::policy::RoleAssignment;
//! use iam_authz::roles::resolve_roles;
//!
//! let assignments = vec![
//!     RoleAssignment::new("alice", "editors"),
//!     RoleAssignment::new("editors", "viewers"),
//! ];
//!
//! let roles = resolve_roles("alice", &assignments);
//! assert!(roles.contains("alice"));
//! assert!(roles.contains("editors"));
//! assert!(roles.contains("viewers"));
//! ```

pub mod graph;
pub mod resolver;


pub use graph::{resolve_roles, RoleGraph};
pub use resolver::{CacheStats, RoleResolver};
