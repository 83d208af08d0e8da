//! Helpers for canonical slash-delimited node paths.

use crate::tree::TreeNode;

/// Split `path` into its non-empty segments.
///
/// Leading, trailing and repeated separators are ignored, so `src/App.tsx`,
/// `/src/App.tsx` and `/src//App.tsx` address the same node.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Path of a child named `name` under the node at `parent` (`""` for the root level).
pub fn child_path(parent: &str, name: &str) -> String {
    format!("{parent}/{name}")
}

/// Look up the node addressed by `path`, walking one segment per level.
pub fn find_node<'a>(tree: &'a [TreeNode], path: &str) -> Option<&'a TreeNode> {
    let mut level = tree;
    let mut found = None;
    for segment in segments(path) {
        let node = level.iter().find(|node| node.name == segment)?;
        level = node.children();
        found = Some(node);
    }
    found
}
