//! Wildcard matching for resource and action patterns
//!
//! Only a trailing `*` is special: it matches any suffix, including `/`, `:` and `$`
//! separators. A `*` anywhere else is compared literally. Matching is case-sensitive.

/// Wildcard character recognised at the end of a pattern
pub const WILDCARD: char = '*';

/// Check whether `value` satisfies `pattern`
///
/// ```
/// use iam_authz::pattern::matches;
///
/// assert!(matches("hrn:acme::invoice/*", "hrn:acme::invoice/1"));
/// assert!(matches("hrn:acme::invoice/1", "hrn:acme::invoice/1"));
/// assert!(!matches("hrn:acme::invoice/*", "hrn:acme::bill/1"));
/// ```
pub fn matches(pattern: &str, value: &str) -> bool {
    match pattern.strip_suffix(WILDCARD) {
        Some(prefix) => value.starts_with(prefix),
        None => pattern == value,
    }
}
