//! Policy document compiler
//!
//! Grammar, one statement per line, comma-separated, fields trimmed:
//!
//! ```text
//! p, <roleOrSubject>, <resourcePattern>, <actionPattern>, <allow|deny>
//! g, <principal>, <role>
//! ```
//!
//! Blank lines are skipped. There is no comment syntax. Any violation rejects the whole
//! document.

use super::{PolicyEffect, PolicyModel, PolicyRule, RoleAssignment};
use crate::error::PolicyError;
use tracing::debug;

const POLICY_MARKER: &str = "p";
const GROUPING_MARKER: &str = "g";
const POLICY_FIELDS: usize = 5;
const GROUPING_FIELDS: usize = 3;

/// A single parsed statement
enum Statement {
    Rule(PolicyRule),
    Assignment(RoleAssignment),
}

/// Compile a policy document into a frozen model
///
/// Line numbers in errors are 1-based and count blank lines.
pub fn compile(text: &str) -> Result<PolicyModel, PolicyError> {
    let mut rules = Vec::new();
    let mut assignments = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(index + 1, line)? {
            Statement::Rule(rule) => rules.push(rule),
            Statement::Assignment(assignment) => assignments.push(assignment),
        }
    }

    debug!(
        rules = rules.len(),
        assignments = assignments.len(),
        "Compiled policy document"
    );

    Ok(PolicyModel::new(rules, assignments))
}

fn parse_line(line_no: usize, line: &str) -> Result<Statement, PolicyError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();

    let malformed = |reason: String| PolicyError::MalformedPolicyLine {
        line: line_no,
        text: line.to_string(),
        reason,
    };

    let expected = match fields[0] {
        POLICY_MARKER => POLICY_FIELDS,
        GROUPING_MARKER => GROUPING_FIELDS,
        other => return Err(malformed(format!("unknown statement type '{}'", other))),
    };

    if fields.len() != expected {
        return Err(malformed(format!(
            "expected {} fields, found {}",
            expected,
            fields.len()
        )));
    }

    if let Some(position) = fields.iter().position(|field| field.is_empty()) {
        return Err(malformed(format!("field {} is empty", position + 1)));
    }

    if fields[0] == GROUPING_MARKER {
        return Ok(Statement::Assignment(RoleAssignment::new(fields[1], fields[2])));
    }

    let effect = PolicyEffect::parse(fields[4]).ok_or_else(|| PolicyError::InvalidEffect {
        line: line_no,
        effect: fields[4].to_string(),
    })?;

    Ok(Statement::Rule(PolicyRule::new(
        fields[1], fields[2], fields[3], effect,
    )))
}
