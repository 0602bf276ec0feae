//! The single focus of a tree and Tab navigation across nested scopes.

use slotmap::SecondaryMap;

use crate::tree::{NodeId, NodeTree};

use super::ring::{scope_of, FocusRing};
use super::FocusScope;

/// Owns which node is focused. At most one node in the tree has
/// `NodeState::focused` set, and it is always the one this manager reports.
#[derive(Debug, Default)]
pub struct FocusManager {
    focused: Option<NodeId>,
    /// Last focused descendant of each managed composite.
    remembered: SecondaryMap<NodeId, NodeId>,
}

impl FocusManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently focused node, if any.
    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Focus `id`.
    ///
    /// A managed composite passes focus on to the entry it last had focused,
    /// or its first entry. Returns `false` when `id` cannot take focus.
    pub fn focus(&mut self, tree: &mut NodeTree, id: NodeId) -> bool {
        if !is_reachable(tree, id) {
            return false;
        }
        let target = self.resolve(tree, id, None);
        self.set(tree, Some(target));
        true
    }

    /// Clear focus (no node focused).
    pub fn blur(&mut self, tree: &mut NodeTree) {
        self.set(tree, None);
    }

    /// Move focus forward (Tab) or backward (Shift+Tab) within `scope`.
    ///
    /// The nearest managed ancestor of the focused node gets the first chance
    /// to move inside its own ring. A non-wrapping composite at either end
    /// passes the move outward; the ring of `scope` itself always wraps.
    /// Returns `false` when nothing in `scope` can take focus.
    pub fn navigate(&mut self, tree: &mut NodeTree, scope: NodeId, forward: bool) -> bool {
        let current = self
            .focused
            .filter(|&id| tree.contains(id) && tree.is_within(id, scope));

        if let Some(current) = current {
            for ancestor in tree.ancestors(current) {
                if ancestor == scope || !tree.is_within(ancestor, scope) {
                    break;
                }
                let FocusScope::Managed { wrap } = scope_of(tree, ancestor) else {
                    continue;
                };
                let ring = FocusRing::collect(tree, ancestor);
                let position = ring.position_of(tree, current);
                if let Some(next) = ring.step(position, forward, wrap) {
                    tracing::trace!(?ancestor, ?next, "composite claimed navigation");
                    let target = self.resolve(tree, next, Some(forward));
                    self.set(tree, Some(target));
                    return true;
                }
            }
        }

        let ring = FocusRing::collect(tree, scope);
        let position = current.and_then(|id| ring.position_of(tree, id));
        match ring.step(position, forward, true) {
            Some(next) => {
                let target = self.resolve(tree, next, Some(forward));
                self.set(tree, Some(target));
                true
            }
            None => false,
        }
    }

    /// Drop focus from a node that was removed, hidden or disabled, and
    /// forget remembered entries of removed nodes.
    pub fn prune(&mut self, tree: &mut NodeTree) {
        if let Some(id) = self.focused {
            if !is_reachable(tree, id) {
                tracing::debug!(?id, "focused node no longer reachable");
                self.set(tree, None);
            }
        }
        self.remembered
            .retain(|composite, entry| tree.contains(composite) && tree.contains(*entry));
    }

    /// Follow managed composites down to the node that actually takes focus.
    /// `direction` picks the first or last entry; `None` prefers the
    /// remembered one.
    fn resolve(&self, tree: &NodeTree, id: NodeId, direction: Option<bool>) -> NodeId {
        let mut current = id;
        while scope_of(tree, current).is_managed() {
            let ring = FocusRing::collect(tree, current);
            let next = match direction {
                Some(true) => ring.first(),
                Some(false) => ring.last(),
                None => self
                    .remembered
                    .get(current)
                    .copied()
                    .filter(|&entry| tree.is_ancestor(current, entry) && is_reachable(tree, entry))
                    .or_else(|| ring.first()),
            };
            match next {
                Some(next) if next != current => current = next,
                _ => break,
            }
        }
        current
    }

    fn set(&mut self, tree: &mut NodeTree, target: Option<NodeId>) {
        if self.focused == target {
            return;
        }
        if let Some(old) = self.focused.take() {
            if let Some(state) = tree.state_mut(old) {
                state.focused = false;
                tree.mark_dirty(old);
            }
        }
        if let Some(new) = target {
            if let Some(state) = tree.state_mut(new) {
                state.focused = true;
                tree.mark_dirty(new);
                self.focused = Some(new);
            }
            for ancestor in tree.ancestors(new) {
                if scope_of(tree, ancestor).is_managed() {
                    self.remembered.insert(ancestor, new);
                }
            }
        }
        tracing::debug!(focused = ?self.focused, "focus changed");
    }
}

/// Whether `id` and all its ancestors are visible and enabled.
pub fn is_reachable(tree: &NodeTree, id: NodeId) -> bool {
    let interactive = |id| tree.state(id).is_some_and(|s| s.is_interactive());
    interactive(id) && tree.ancestors(id).into_iter().all(interactive)
}

// ===========================================================================
// Tests
// ===========================================================================
