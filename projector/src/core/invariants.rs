//! Semantic invariants not expressible via JSON Schema.

use std::collections::HashSet;

use crate::core::path::child_path;
use crate::tree::TreeNode;

/// Check semantic invariants of a tree snapshot:
/// - Names are non-empty, contain no `/` and are not `.` or `..`
/// - Sibling names are unique
/// - Every `path` equals the parent's path plus `/` plus `name`
/// - No two nodes share a path
pub fn validate_invariants(tree: &[TreeNode]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    validate_level(tree, "", &mut seen, &mut errors);
    errors
}

fn validate_level(
    level: &[TreeNode],
    parent: &str,
    seen: &mut HashSet<String>,
    errors: &mut Vec<String>,
) {
    let mut names = HashSet::new();
    for node in level {
        let location = child_path(parent, &node.name);

        if node.name.is_empty()
            || node.name.contains('/')
            || node.name == "."
            || node.name == ".."
        {
            errors.push(format!("{}: invalid name '{}'", location, node.name));
        }

        if !names.insert(node.name.as_str()) {
            errors.push(format!("{}: duplicate sibling name '{}'", location, node.name));
        }

        if node.path != location {
            errors.push(format!(
                "{}: path '{}' does not match its position",
                location, node.path
            ));
        }

        if !seen.insert(node.path.clone()) {
            errors.push(format!("duplicate path '{}'", node.path));
        }

        validate_level(node.children(), &location, seen, errors);
    }
}
