//! Projection of a tree snapshot into the sandbox mount descriptor.
//!
//! The descriptor is the nested form sandboxes consume:
//!
//! ```json
//! {
//!   "index.html": { "file": { "contents": "<html></html>" } },
//!   "src": { "directory": { "main.ts": { "file": { "contents": "..." } } } }
//! }
//! ```
//!
//! Entries keep the tree's insertion order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::tree::{NodeKind, TreeNode};

/// Directory listing keyed by entry name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MountDescriptor(pub IndexMap<String, MountEntry>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountEntry {
    File { contents: String },
    Directory(MountDescriptor),
}

impl MountDescriptor {
    pub fn get(&self, name: &str) -> Option<&MountEntry> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MountEntry)> {
        self.0.iter()
    }
}

/// Project `tree` depth-first into a mount descriptor.
///
/// File contents are copied byte for byte; every directory's children are
/// represented, in order, with no additions.
pub fn project(tree: &[TreeNode]) -> MountDescriptor {
    let entries = tree
        .iter()
        .map(|node| {
            let entry = match &node.kind {
                NodeKind::File { content } => MountEntry::File {
                    contents: content.clone(),
                },
                NodeKind::Directory { children } => MountEntry::Directory(project(children)),
            };
            (node.name.clone(), entry)
        })
        .collect();
    MountDescriptor(entries)
}
