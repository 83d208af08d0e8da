//! Per-round diagnostic artifacts under the configured log directory.
//!
//! Each generation round gets a numbered directory holding the raw payload,
//! the operations parsed from it, and the tree and mount descriptor after the
//! round was folded. Nothing reads these back; they exist for inspection.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::mount::MountDescriptor;
use crate::core::types::{Operation, RoundKind};
use crate::io::tree_store::write_tree;
use crate::tree::TreeNode;

#[derive(Debug, Clone, Serialize)]
pub struct RoundMeta {
    pub round: u32,
    pub kind: RoundKind,
    pub operations: usize,
    pub files_written: usize,
    pub conflicts: Vec<String>,
    pub mounted: bool,
}

#[derive(Debug, Clone)]
pub struct RoundPaths {
    pub dir: PathBuf,
    pub meta_path: PathBuf,
    pub payload_path: PathBuf,
    pub operations_path: PathBuf,
    pub tree_path: PathBuf,
    pub mount_path: PathBuf,
}

impl RoundPaths {
    pub fn new(log_dir: &Path, round: u32) -> Self {
        let dir = log_dir.join(format!("{round:04}"));
        Self {
            dir: dir.clone(),
            meta_path: dir.join("meta.json"),
            payload_path: dir.join("payload.txt"),
            operations_path: dir.join("operations.json"),
            tree_path: dir.join("tree.json"),
            mount_path: dir.join("mount.json"),
        }
    }
}

pub struct RoundWriteRequest<'a> {
    pub log_dir: &'a Path,
    pub meta: &'a RoundMeta,
    pub payload: &'a str,
    pub operations: &'a [Operation],
    pub tree: &'a [TreeNode],
    pub descriptor: &'a MountDescriptor,
}

pub fn write_round(request: &RoundWriteRequest<'_>) -> Result<RoundPaths> {
    let paths = RoundPaths::new(request.log_dir, request.meta.round);
    fs::create_dir_all(&paths.dir)
        .with_context(|| format!("create round dir {}", paths.dir.display()))?;

    // Write in deterministic order to keep logs stable.
    write_json(&paths.meta_path, request.meta)?;
    write_text(&paths.payload_path, request.payload)?;
    write_json(&paths.operations_path, &request.operations)?;
    write_tree(&paths.tree_path, request.tree)?;
    write_json(&paths.mount_path, request.descriptor)?;

    Ok(paths)
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(value)?;
    buf.push('\n');
    write_text(path, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::apply;
    use crate::core::mount::project;
    use crate::core::parser::parse;
    use crate::io::tree_store::load_tree;

    #[test]
    fn round_paths_are_stable() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = RoundPaths::new(temp.path(), 3);

        assert!(paths.dir.ends_with("0003"));
        assert!(paths.meta_path.ends_with("meta.json"));
        assert!(paths.payload_path.ends_with("payload.txt"));
        assert!(paths.operations_path.ends_with("operations.json"));
        assert!(paths.tree_path.ends_with("tree.json"));
        assert!(paths.mount_path.ends_with("mount.json"));
    }

    #[test]
    fn writes_all_round_artifacts() {
        let temp = tempfile::tempdir().expect("tempdir");
        let payload = "<f action=\"createFile\" path=\"src/a.ts\">a</f>";
        let operations = parse(payload);
        let tree = apply(&[], &operations).tree;
        let descriptor = project(&tree);
        let meta = RoundMeta {
            round: 1,
            kind: RoundKind::Template,
            operations: operations.len(),
            files_written: 1,
            conflicts: Vec::new(),
            mounted: false,
        };

        let paths = write_round(&RoundWriteRequest {
            log_dir: temp.path(),
            meta: &meta,
            payload,
            operations: &operations,
            tree: &tree,
            descriptor: &descriptor,
        })
        .expect("write round");

        assert_eq!(fs::read_to_string(&paths.payload_path).expect("payload"), payload);
        assert!(paths.meta_path.is_file());
        assert!(paths.operations_path.is_file());
        assert!(paths.mount_path.is_file());
        assert_eq!(load_tree(&paths.tree_path).expect("tree"), tree);
    }
}
