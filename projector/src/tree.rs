use serde::{Deserialize, Serialize};

/// A file or directory in the projected project tree.
///
/// `path` is the canonical key: a leading `/` followed by the segments from the
/// tree root, e.g. `/src/components/Button.tsx`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    File { content: String },
    Directory { children: Vec<TreeNode> },
}

impl TreeNode {
    pub fn file(name: impl Into<String>, path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::File {
                content: content.into(),
            },
        }
    }

    pub fn directory(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Directory {
                children: Vec::new(),
            },
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { content } => Some(content),
            NodeKind::Directory { .. } => None,
        }
    }

    pub fn children(&self) -> &[TreeNode] {
        match &self.kind {
            NodeKind::File { .. } => &[],
            NodeKind::Directory { children } => children,
        }
    }
}

/// Count every node in a forest (files and directories).
pub fn count_nodes(tree: &[TreeNode]) -> usize {
    tree.iter()
        .map(|node| 1 + count_nodes(node.children()))
        .sum()
}

/// Count file nodes only.
pub fn count_files(tree: &[TreeNode]) -> usize {
    tree.iter()
        .map(|node| {
            if node.is_file() {
                1
            } else {
                count_files(node.children())
            }
        })
        .sum()
}
