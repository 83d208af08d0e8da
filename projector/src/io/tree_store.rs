//! Tree snapshot load/save helpers with schema + invariant validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde_json::Value;
use tracing::debug;

use crate::core::invariants::validate_invariants;
use crate::tree::TreeNode;

pub const TREE_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/schemas/file_tree/v1.schema.json"
));

/// Load and validate a tree snapshot from disk (schema + invariants).
pub fn load_tree(tree_path: &Path) -> Result<Vec<TreeNode>> {
    let contents = fs::read_to_string(tree_path)
        .with_context(|| format!("read tree {}", tree_path.display()))?;
    parse_tree(&contents).with_context(|| format!("load tree {}", tree_path.display()))
}

/// Parse and validate a tree snapshot from JSON text.
pub fn parse_tree(contents: &str) -> Result<Vec<TreeNode>> {
    let value: Value = serde_json::from_str(contents).context("parse tree json")?;
    validate_schema(&value)?;
    let tree: Vec<TreeNode> = serde_json::from_value(value).context("deserialize tree")?;
    validate_tree_invariants(&tree)?;
    debug!(top_level = tree.len(), "tree snapshot loaded");
    Ok(tree)
}

/// Write a tree snapshot as pretty-printed JSON with trailing newline.
pub fn write_tree(tree_path: &Path, tree: &[TreeNode]) -> Result<()> {
    if let Some(parent) = tree_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let mut buf = serde_json::to_string_pretty(tree)?;
    buf.push('\n');
    fs::write(tree_path, buf).with_context(|| format!("write tree {}", tree_path.display()))
}

fn validate_schema(tree: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(TREE_SCHEMA).context("parse tree schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    let messages: Vec<String> = compiled
        .iter_errors(tree)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        return Err(anyhow!(
            "tree schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

fn validate_tree_invariants(tree: &[TreeNode]) -> Result<()> {
    let errors = validate_invariants(tree);
    if errors.is_empty() {
        return Ok(());
    }
    Err(anyhow!("tree invariants failed: {}", errors.join("; ")))
}
