//! Folds create-file operations into the project tree.
//!
//! The fold is pure: it takes a snapshot and returns a new one. Each operation
//! is applied against the accumulating result, so later operations in a batch
//! see the effects of earlier ones.

use std::fmt;

use crate::core::path::{child_path, segments};
use crate::core::types::{Action, Operation, OperationStatus};
use crate::tree::{NodeKind, TreeNode};

/// Why a create-file operation was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    /// The path has no segments (e.g. `"/"`).
    EmptyPath,
    /// A segment is `.` or `..`.
    InvalidSegment { segment: String },
    /// An intermediate segment resolves to an existing file.
    FileInTheWay { at: String },
    /// The final segment resolves to an existing directory.
    DirectoryInTheWay { at: String },
}

/// A create-file operation rejected by the fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConflict {
    pub path: String,
    pub reason: ConflictReason,
}

impl fmt::Display for PathConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            ConflictReason::EmptyPath => write!(f, "'{}': path has no segments", self.path),
            ConflictReason::InvalidSegment { segment } => {
                write!(f, "'{}': invalid segment '{}'", self.path, segment)
            }
            ConflictReason::FileInTheWay { at } => {
                write!(f, "'{}': '{}' is a file, not a directory", self.path, at)
            }
            ConflictReason::DirectoryInTheWay { at } => {
                write!(f, "'{}': '{}' is a directory, not a file", self.path, at)
            }
        }
    }
}

/// Result of one fold pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldOutcome {
    /// The new tree snapshot.
    pub tree: Vec<TreeNode>,
    /// Canonical paths written by the pass, in application order.
    pub written: Vec<String>,
    /// Operations rejected by the pass; the tree is unchanged for each of them.
    pub conflicts: Vec<PathConflict>,
}

/// Fold every `CreateFile` in `ops` into a copy of `tree`.
///
/// Operations of other kinds are ignored, as are statuses: the caller chooses
/// the batch.
pub fn apply(tree: &[TreeNode], ops: &[Operation]) -> FoldOutcome {
    let mut outcome = FoldOutcome {
        tree: tree.to_vec(),
        written: Vec::new(),
        conflicts: Vec::new(),
    };
    for op in ops {
        let Action::CreateFile { path, content } = &op.action else {
            continue;
        };
        match upsert_file(&mut outcome.tree, path, content) {
            Ok(written) => outcome.written.push(written),
            Err(reason) => outcome.conflicts.push(PathConflict {
                path: path.clone(),
                reason,
            }),
        }
    }
    outcome
}

/// Fold the pending `CreateFile` subset of `ops`, then mark every pending
/// operation `Completed`.
///
/// Completion is batch-wide: run-command and comment operations that were
/// pending complete together with the files. Returns `None` (and changes
/// nothing) when no operation is pending.
pub fn fold_pending(tree: &[TreeNode], ops: &mut [Operation]) -> Option<FoldOutcome> {
    let batch: Vec<Operation> = ops.iter().filter(|op| op.is_pending()).cloned().collect();
    if batch.is_empty() {
        return None;
    }
    let outcome = apply(tree, &batch);
    for op in ops.iter_mut().filter(|op| op.is_pending()) {
        op.status = OperationStatus::Completed;
    }
    Some(outcome)
}

/// Create or overwrite the file at `path`, creating missing ancestor
/// directories. Returns the canonical path written.
///
/// Conflicts are detected before anything is inserted, so a rejected
/// operation never leaves half-created directories behind.
fn upsert_file(
    tree: &mut Vec<TreeNode>,
    path: &str,
    content: &str,
) -> Result<String, ConflictReason> {
    let parts = segments(path);
    let Some((file_name, dirs)) = parts.split_last() else {
        return Err(ConflictReason::EmptyPath);
    };
    if let Some(bad) = parts.iter().find(|s| **s == "." || **s == "..") {
        return Err(ConflictReason::InvalidSegment {
            segment: bad.to_string(),
        });
    }
    check_path(tree, dirs, file_name)?;

    let mut level = tree;
    let mut current = String::new();
    for dir_name in dirs {
        current = child_path(&current, dir_name);
        let idx = match level.iter().position(|node| node.name == *dir_name) {
            Some(idx) => idx,
            None => {
                level.push(TreeNode::directory(*dir_name, current.clone()));
                level.len() - 1
            }
        };
        let parent = level;
        level = match &mut parent[idx].kind {
            NodeKind::Directory { children } => children,
            NodeKind::File { .. } => return Err(ConflictReason::FileInTheWay { at: current }),
        };
    }

    let full = child_path(&current, file_name);
    match level.iter_mut().find(|node| node.name == *file_name) {
        Some(existing) => match &mut existing.kind {
            NodeKind::File { content: slot } => *slot = content.to_string(),
            NodeKind::Directory { .. } => {
                return Err(ConflictReason::DirectoryInTheWay { at: full });
            }
        },
        None => level.push(TreeNode::file(*file_name, full.clone(), content)),
    }
    Ok(full)
}

/// Walk the existing tree along `dirs` and report the first kind mismatch.
fn check_path(tree: &[TreeNode], dirs: &[&str], file_name: &str) -> Result<(), ConflictReason> {
    let mut level = tree;
    let mut current = String::new();
    for dir_name in dirs {
        current = child_path(&current, dir_name);
        let Some(node) = level.iter().find(|node| node.name == *dir_name) else {
            return Ok(());
        };
        match &node.kind {
            NodeKind::Directory { children } => level = children,
            NodeKind::File { .. } => return Err(ConflictReason::FileInTheWay { at: current }),
        }
    }
    let full = child_path(&current, file_name);
    match level.iter().find(|node| node.name == file_name) {
        Some(node) if node.is_directory() => Err(ConflictReason::DirectoryInTheWay { at: full }),
        _ => Ok(()),
    }
}
