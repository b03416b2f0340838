//! # Traversal of Validated Trees
//!
//! Read-only helpers for consumers of validated trees. Every walk is
//! iterative, so trees of any depth can be traversed.

use std::collections::BTreeMap;

use mkt_core::IssuePath;

use crate::tree::CHILDREN;

/// Common view over validated node types.
pub trait TreeNode: Sized {
    /// Variant tag.
    fn tag(&self) -> &'static str;

    fn id(&self) -> Option<&str>;

    /// Child nodes; empty for leaf variants.
    fn children(&self) -> &[Self];
}

/// A node visited by [`walk`], with its depth (root = 0) and path.
///
/// Each visit owns its full path. For depth or size only, prefer
/// [`max_depth`] and [`count`], which do not build paths.
#[derive(Debug)]
pub struct Visit<'t, N> {
    pub node: &'t N,
    pub depth: usize,
    pub path: IssuePath,
}

/// Pre-order iterator over a tree.
pub struct Walk<'t, N> {
    pending: Vec<Visit<'t, N>>,
}

impl<'t, N: TreeNode> Iterator for Walk<'t, N> {
    type Item = Visit<'t, N>;

    fn next(&mut self) -> Option<Self::Item> {
        let visit = self.pending.pop()?;
        let children = visit.node.children();
        // Reverse so the first child is popped next.
        for (index, child) in children.iter().enumerate().rev() {
            self.pending.push(Visit {
                node: child,
                depth: visit.depth + 1,
                path: visit.path.key(CHILDREN).index(index),
            });
        }
        Some(visit)
    }
}

/// Walk `root` and its descendants in document order.
pub fn walk<N: TreeNode>(root: &N) -> Walk<'_, N> {
    Walk {
        pending: vec![Visit {
            node: root,
            depth: 0,
            path: IssuePath::root(),
        }],
    }
}

/// Depth of every node in pre-order, without building paths.
fn depths<'t, N: TreeNode>(root: &'t N) -> impl Iterator<Item = usize> + 't {
    let mut pending = vec![(root, 0usize)];
    std::iter::from_fn(move || {
        let (node, depth) = pending.pop()?;
        pending.extend(node.children().iter().rev().map(|child| (child, depth + 1)));
        Some(depth)
    })
}

/// Total number of nodes, root included.
pub fn count<N: TreeNode>(root: &N) -> usize {
    depths(root).count()
}

/// Depth of the deepest node (0 for a lone root).
pub fn max_depth<N: TreeNode>(root: &N) -> usize {
    depths(root).max().unwrap_or_default()
}

/// First node in document order carrying `id`.
pub fn find_by_id<'t, N: TreeNode>(root: &'t N, id: &str) -> Option<Visit<'t, N>> {
    walk(root).find(|visit| visit.node.id() == Some(id))
}

/// Ids used by more than one node, with every path that uses them.
pub fn duplicate_ids<N: TreeNode>(root: &N) -> BTreeMap<String, Vec<IssuePath>> {
    let mut seen: BTreeMap<String, Vec<IssuePath>> = BTreeMap::new();
    for visit in walk(root) {
        if let Some(id) = visit.node.id() {
            seen.entry(id.to_string()).or_default().push(visit.path);
        }
    }
    seen.retain(|_, paths| paths.len() > 1);
    seen
}
