//! Tab order over one focus scope.

use crate::tree::{NodeId, NodeTree};

use super::FocusScope;

/// The focus scope a node declares. A node checked out of the tree reports
/// `None`.
pub fn scope_of(tree: &NodeTree, id: NodeId) -> FocusScope {
    tree.node(id).map(|node| node.focus_scope()).unwrap_or_default()
}

/// Ordered focus entries of one scope.
///
/// Rebuilt on demand from the tree, never stored across frames, so it cannot
/// go stale when nodes come and go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusRing {
    entries: Vec<NodeId>,
}

impl FocusRing {
    /// Collect the entries below `scope` (not `scope` itself), depth-first in
    /// document order.
    ///
    /// Hidden or disabled nodes are skipped with their subtrees. Managed
    /// composites are a single entry and are not descended into.
    pub fn collect(tree: &NodeTree, scope: NodeId) -> Self {
        let mut entries = Vec::new();
        let mut stack: Vec<NodeId> = tree.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if !tree.state(id).is_some_and(|s| s.is_interactive()) {
                continue;
            }
            match scope_of(tree, id) {
                FocusScope::Managed { .. } => {
                    entries.push(id);
                    continue;
                }
                FocusScope::Focusable => entries.push(id),
                FocusScope::None => {}
            }
            stack.extend(tree.children(id).iter().rev().copied());
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[NodeId] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<NodeId> {
        self.entries.first().copied()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.entries.last().copied()
    }

    /// Index of the entry that is `node` or contains it.
    pub fn position_of(&self, tree: &NodeTree, node: NodeId) -> Option<usize> {
        self.entries.iter().position(|&entry| tree.is_within(node, entry))
    }

    /// The entry after (or before) `from`.
    ///
    /// With no current position this is the first (or last) entry. Past
    /// either end it wraps when `wrap` is set and gives `None` otherwise.
    pub fn step(&self, from: Option<usize>, forward: bool, wrap: bool) -> Option<NodeId> {
        let len = self.entries.len();
        if len == 0 {
            return None;
        }
        let next = match (from, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) if i + 1 < len => i + 1,
            (Some(i), false) if i > 0 => i - 1,
            (Some(_), true) if wrap => 0,
            (Some(_), false) if wrap => len - 1,
            _ => return None,
        };
        self.entries.get(next).copied()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;

    use crate::node::Node;

    struct Stub(FocusScope);

    impl Node for Stub {
        fn kind(&self) -> &str {
            "stub"
        }

        fn focus_scope(&self) -> FocusScope {
            self.0
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn plain() -> Stub {
        Stub(FocusScope::None)
    }

    fn leaf() -> Stub {
        Stub(FocusScope::Focusable)
    }

    // ── Collection ───────────────────────────────────────────────────

    #[test]
    fn collects_in_document_order() {
        let mut tree = NodeTree::new();
        let root = tree.insert(plain());
        let a = tree.insert_child(root, leaf()).unwrap();
        let group = tree.insert_child(root, plain()).unwrap();
        let b = tree.insert_child(group, leaf()).unwrap();
        let c = tree.insert_child(root, leaf()).unwrap();

        let ring = FocusRing::collect(&tree, root);
        assert_eq!(ring.entries(), &[a, b, c]);
    }

    #[test]
    fn managed_composite_is_one_entry() {
        let mut tree = NodeTree::new();
        let root = tree.insert(plain());
        let composite = tree.insert_child(root, Stub(FocusScope::Managed { wrap: true })).unwrap();
        let inner = tree.insert_child(composite, leaf()).unwrap();
        tree.insert_child(composite, leaf()).unwrap();

        let ring = FocusRing::collect(&tree, root);
        assert_eq!(ring.entries(), &[composite]);
        assert_eq!(ring.position_of(&tree, inner), Some(0));
        assert_eq!(FocusRing::collect(&tree, composite).len(), 2);
    }

    #[test]
    fn skips_hidden_and_disabled_subtrees() {
        let mut tree = NodeTree::new();
        let root = tree.insert(plain());
        let hidden = tree.insert_child(root, plain()).unwrap();
        tree.insert_child(hidden, leaf()).unwrap();
        let disabled = tree.insert_child(root, leaf()).unwrap();
        let kept = tree.insert_child(root, leaf()).unwrap();
        tree.set_visible(hidden, false);
        tree.set_disabled(disabled, true);

        assert_eq!(FocusRing::collect(&tree, root).entries(), &[kept]);
    }

    #[test]
    fn adding_leaves_grows_ring() {
        let mut tree = NodeTree::new();
        let root = tree.insert(plain());
        let container = tree.insert_child(root, plain()).unwrap();
        let before = FocusRing::collect(&tree, root).len();
        for _ in 0..5 {
            tree.insert_child(container, leaf()).unwrap();
        }
        assert_eq!(FocusRing::collect(&tree, root).len(), before + 5);
    }

    // ── Stepping ─────────────────────────────────────────────────────

    #[test]
    fn step_wraps_or_releases() {
        let mut tree = NodeTree::new();
        let root = tree.insert(plain());
        let a = tree.insert_child(root, leaf()).unwrap();
        let b = tree.insert_child(root, leaf()).unwrap();
        let ring = FocusRing::collect(&tree, root);

        assert_eq!(ring.step(None, true, false), Some(a));
        assert_eq!(ring.step(None, false, false), Some(b));
        assert_eq!(ring.step(Some(0), true, false), Some(b));
        assert_eq!(ring.step(Some(1), true, true), Some(a));
        assert_eq!(ring.step(Some(1), true, false), None);
        assert_eq!(ring.step(Some(0), false, true), Some(b));
        assert_eq!(ring.step(Some(0), false, false), None);
    }

    #[test]
    fn step_on_empty_ring() {
        let ring = FocusRing::default();
        assert!(ring.is_empty());
        assert_eq!(ring.step(None, true, true), None);
    }
}
