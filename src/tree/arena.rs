//! The node arena: insert, remove, reparent, walk, invalidate.

use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};
use tokio_util::sync::CancellationToken;

use super::node::{NodeId, NodeState};
use crate::event::binding::{BindingBuilder, InputBindings};
use crate::geometry::Rect;
use crate::layout::SizeHint;
use crate::node::Node;

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

struct Slot {
    /// `None` while the node is checked out for one of its own phases.
    node: Option<Box<dyn Node>>,
    state: NodeState,
    bindings: InputBindings,
}

/// The retained node tree, backed by a slotmap arena.
///
/// Parent/child relationships live in secondary maps; a parent link is a
/// plain [`NodeId`] and never keeps a node alive. Removing a node frees its
/// whole subtree: each removed node is disposed, its lifetime token is
/// cancelled, and its id is queued so render caches can evict it.
pub struct NodeTree {
    slots: SlotMap<NodeId, Slot>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    tokens: SecondaryMap<NodeId, CancellationToken>,
    root: Option<NodeId>,
    removed: Vec<NodeId>,
}

impl NodeTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            tokens: SecondaryMap::new(),
            root: None,
            removed: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Structure
    // -----------------------------------------------------------------------

    /// Insert a detached node (no parent).
    ///
    /// If no root has been set yet, this node becomes the root.
    pub fn insert(&mut self, node: impl Node) -> NodeId {
        self.insert_boxed(Box::new(node))
    }

    /// Insert an already boxed node with no parent.
    pub fn insert_boxed(&mut self, node: Box<dyn Node>) -> NodeId {
        let mut builder = BindingBuilder::new();
        node.configure_bindings(&mut builder);
        let id = self.slots.insert(Slot {
            node: Some(node),
            state: NodeState::new(),
            bindings: builder.build(),
        });
        self.children.insert(id, Vec::new());
        if self.root.is_none() {
            self.root = Some(id);
        }
        tracing::trace!(?id, "node inserted");
        id
    }

    /// Insert a node as the last child of `parent`.
    ///
    /// Returns `None` if `parent` does not exist.
    pub fn insert_child(&mut self, parent: NodeId, node: impl Node) -> Option<NodeId> {
        self.insert_child_boxed(parent, Box::new(node))
    }

    /// Boxed variant of [`insert_child`](Self::insert_child).
    pub fn insert_child_boxed(&mut self, parent: NodeId, node: Box<dyn Node>) -> Option<NodeId> {
        if !self.slots.contains_key(parent) {
            return None;
        }
        let id = self.insert_boxed(node);
        self.attach(id, parent);
        Some(id)
    }

    /// Remove a node and all its descendants.
    ///
    /// Every removed node has [`Node::dispose`] called and its cancellation
    /// token cancelled. The former parent is marked layout-dirty. Returns
    /// `false` if the node did not exist.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if !self.slots.contains_key(id) {
            return false;
        }

        if let Some(parent_id) = self.parent.remove(id) {
            if let Some(siblings) = self.children.get_mut(parent_id) {
                siblings.retain(|&child| child != id);
            }
            self.mark_layout_dirty(parent_id);
        }

        if self.root == Some(id) {
            self.root = None;
        }

        let mut queue = VecDeque::new();
        queue.push_back(id);
        let mut count = 0usize;

        while let Some(current) = queue.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                queue.extend(kids);
            }
            self.parent.remove(current);
            if let Some(token) = self.tokens.remove(current) {
                token.cancel();
            }
            if let Some(mut slot) = self.slots.remove(current) {
                if let Some(node) = slot.node.as_mut() {
                    node.dispose();
                }
            }
            self.removed.push(current);
            count += 1;
        }

        tracing::debug!(?id, count, "subtree removed");
        true
    }

    /// Move `node` to become the last child of `new_parent`.
    ///
    /// The node keeps its subtree. Returns `false` if either node is missing
    /// or the move would make a node its own ancestor.
    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId) -> bool {
        if !self.contains(node) || !self.contains(new_parent) {
            return false;
        }
        if node == new_parent || self.is_ancestor(node, new_parent) {
            return false;
        }

        if let Some(old_parent) = self.parent.remove(node) {
            if let Some(siblings) = self.children.get_mut(old_parent) {
                siblings.retain(|&child| child != node);
            }
            self.mark_layout_dirty(old_parent);
        }
        if self.root == Some(node) {
            self.root = None;
        }
        self.attach(node, new_parent);
        true
    }

    fn attach(&mut self, id: NodeId, parent: NodeId) {
        self.parent.insert(id, parent);
        if let Some(kids) = self.children.get_mut(parent) {
            kids.push(id);
        }
        self.mark_layout_dirty(parent);
    }

    /// Get the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Get the children of a node in document order. Returns an empty slice
    /// if the node has no children or does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Walk from `id` up to the root, collecting ancestor node ids.
    ///
    /// The returned vec does **not** include `id` itself; it starts with the
    /// immediate parent and ends at the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            if p == ancestor {
                return true;
            }
            current = p;
        }
        false
    }

    /// `id` itself or one of its descendants.
    pub fn is_within(&self, id: NodeId, scope: NodeId) -> bool {
        id == scope || self.is_ancestor(scope, id)
    }

    /// Pre-order depth-first traversal starting from `start` (document order).
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.slots.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// The current root node, if set.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Explicitly set the root node.
    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether the tree contains a node with the given id.
    pub fn contains(&self, id: NodeId) -> bool {
        self.slots.contains_key(id)
    }

    /// Drain the ids removed since the last call.
    pub fn take_removed(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.removed)
    }

    // -----------------------------------------------------------------------
    // State
    // -----------------------------------------------------------------------

    /// Engine state of a node.
    pub fn state(&self, id: NodeId) -> Option<&NodeState> {
        self.slots.get(id).map(|slot| &slot.state)
    }

    /// Mutable engine state of a node.
    pub fn state_mut(&mut self, id: NodeId) -> Option<&mut NodeState> {
        self.slots.get_mut(id).map(|slot| &mut slot.state)
    }

    /// Bounds from the last arrange.
    pub fn bounds(&self, id: NodeId) -> Option<Rect> {
        self.state(id).and_then(|s| s.bounds)
    }

    /// Set the size hint a node presents to its parent container.
    pub fn set_hint(&mut self, id: NodeId, hint: SizeHint) {
        if let Some(state) = self.state_mut(id) {
            if state.hint != hint {
                state.hint = hint;
                self.mark_layout_dirty(id);
            }
        }
    }

    /// Show or hide a node. Hidden nodes are skipped by render, focus and
    /// hit testing.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(state) = self.state_mut(id) {
            if state.visible != visible {
                state.visible = visible;
                self.mark_layout_dirty(id);
            }
        }
    }

    /// Enable or disable a node.
    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) {
        if let Some(state) = self.state_mut(id) {
            if state.disabled != disabled {
                state.disabled = disabled;
                self.mark_dirty(id);
            }
        }
    }

    /// Mark a node's output stale, along with every ancestor to the root.
    ///
    /// Siblings and unrelated subtrees keep their cached output.
    pub fn mark_dirty(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node) = current {
            match self.slots.get_mut(node) {
                Some(slot) => slot.state.dirty = true,
                None => break,
            }
            current = self.parent.get(node).copied();
        }
    }

    /// Mark a geometry change: the node and its parent need layout, and the
    /// path to the root needs repainting.
    pub fn mark_layout_dirty(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get_mut(id) {
            slot.state.layout_dirty = true;
        }
        if let Some(parent) = self.parent(id) {
            if let Some(slot) = self.slots.get_mut(parent) {
                slot.state.layout_dirty = true;
            }
        }
        self.mark_dirty(id);
    }

    /// Mark every node dirty (theme or capability change, resize).
    pub fn mark_all_dirty(&mut self) {
        for (_, slot) in self.slots.iter_mut() {
            slot.state.dirty = true;
            slot.state.layout_dirty = true;
        }
    }

    // -----------------------------------------------------------------------
    // Behavior access
    // -----------------------------------------------------------------------

    /// The node's behavior, unless it is currently checked out.
    pub fn node(&self, id: NodeId) -> Option<&dyn Node> {
        self.slots.get(id).and_then(|slot| slot.node.as_deref())
    }

    /// Mutable access to the node's behavior.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut (dyn Node + 'static)> {
        self.slots.get_mut(id).and_then(|slot| slot.node.as_deref_mut())
    }

    /// Downcast a node to its concrete type.
    pub fn downcast_ref<T: Node>(&self, id: NodeId) -> Option<&T> {
        self.node(id).and_then(|node| node.as_any().downcast_ref::<T>())
    }

    /// Mutably downcast a node to its concrete type.
    pub fn downcast_mut<T: Node>(&mut self, id: NodeId) -> Option<&mut T> {
        self.node_mut(id)
            .and_then(|node| node.as_any_mut().downcast_mut::<T>())
    }

    /// Edit a node of type `T` in place and mark its layout dirty.
    ///
    /// Returns `None` if the node is missing or of another type.
    pub fn update<T: Node, R>(&mut self, id: NodeId, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let result = f(self.downcast_mut::<T>(id)?);
        self.mark_layout_dirty(id);
        Some(result)
    }

    /// Run `f` with the node checked out of its slot, so the node can reach
    /// the rest of the tree through `&mut NodeTree`.
    ///
    /// The node goes back into its slot when `f` returns or unwinds. Returns
    /// `None` if the node is missing or already checked out.
    pub(crate) fn with_node<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut (dyn Node + 'static), &mut NodeTree) -> R,
    ) -> Option<R> {
        let node = self.slots.get_mut(id)?.node.take()?;
        let mut guard = Checkout { tree: self, id, node: Some(node) };
        let Checkout { tree, node, .. } = &mut guard;
        let node = node.as_deref_mut()?;
        Some(f(node, &mut **tree))
    }

    /// A node's bindings.
    pub fn bindings(&self, id: NodeId) -> Option<&InputBindings> {
        self.slots.get(id).map(|slot| &slot.bindings)
    }

    /// Take a node's bindings out so an action can run with `&mut self`.
    pub(crate) fn take_bindings(&mut self, id: NodeId) -> Option<InputBindings> {
        self.slots.get_mut(id).map(|slot| std::mem::take(&mut slot.bindings))
    }

    /// Put bindings back after [`take_bindings`](Self::take_bindings).
    pub(crate) fn restore_bindings(&mut self, id: NodeId, bindings: InputBindings) {
        if let Some(slot) = self.slots.get_mut(id) {
            slot.bindings = bindings;
        }
    }

    /// The node's lifetime token, created on first use. Cancelled when the
    /// node is removed.
    pub fn token(&mut self, id: NodeId) -> Option<CancellationToken> {
        if !self.slots.contains_key(id) {
            return None;
        }
        if let Some(token) = self.tokens.get(id) {
            return Some(token.clone());
        }
        let token = CancellationToken::new();
        self.tokens.insert(id, token.clone());
        Some(token)
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns a checked-out node to its slot on drop, including during unwind.
struct Checkout<'t> {
    tree: &'t mut NodeTree,
    id: NodeId,
    node: Option<Box<dyn Node>>,
}

impl Drop for Checkout<'_> {
    fn drop(&mut self) {
        if let Some(mut node) = self.node.take() {
            match self.tree.slots.get_mut(self.id) {
                Some(slot) => slot.node = Some(node),
                // Removed while running; it missed its dispose.
                None => node.dispose(),
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
