//! Anchored overlays and their LIFO stack.
//!
//! A popup is a [`PopupHost`] appended to the screen's layer root with the
//! popup content as its only child. The host places the content next to the
//! owner on every arrange, so a popup follows its owner through resizes.

use std::fmt;

use crate::focus::manager::is_reachable;
use crate::focus::FocusManager;
use crate::geometry::{Rect, Size};
use crate::layout::{Constraints, LayoutCx};
use crate::node::NodeFactory;
use crate::nodes::PopupHost;
use crate::tree::{NodeId, NodeTree};

/// Which side of its owner a popup opens on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AnchorSide {
    Above,
    #[default]
    Below,
    Left,
    Right,
}

/// Place a popup of `size` against `owner` on `side`, then shift it to stay
/// inside `screen`. A popup larger than the screen is cropped.
pub fn anchor_rect(owner: Rect, size: Size, side: AnchorSide, screen: Rect) -> Rect {
    let (x, y) = match side {
        AnchorSide::Below => (owner.x, owner.bottom()),
        AnchorSide::Above => (owner.x, owner.y - size.height),
        AnchorSide::Right => (owner.right(), owner.y),
        AnchorSide::Left => (owner.x - size.width, owner.y),
    };
    Rect::new(x, y, size.width, size.height).clamp_within(screen)
}

type DismissFn = Box<dyn FnOnce(&mut NodeTree)>;

/// Everything needed to open a popup.
pub struct PopupRequest {
    pub owner: NodeId,
    pub side: AnchorSide,
    content: NodeFactory,
    on_dismiss: Option<DismissFn>,
    restore_focus: Option<NodeId>,
    modal: bool,
}

impl PopupRequest {
    pub fn new(owner: NodeId, side: AnchorSide, content: NodeFactory) -> Self {
        Self { owner, side, content, on_dismiss: None, restore_focus: None, modal: false }
    }

    /// Route all keys to the popup and confine focus to it while open.
    pub fn modal(mut self) -> Self {
        self.modal = true;
        self
    }

    /// Called once when the popup closes, however it closes.
    pub fn on_dismiss(mut self, f: impl FnOnce(&mut NodeTree) + 'static) -> Self {
        self.on_dismiss = Some(Box::new(f));
        self
    }

    /// Where focus goes when the popup closes. Defaults to the node focused
    /// when it opened.
    pub fn restore_focus(mut self, id: NodeId) -> Self {
        self.restore_focus = Some(id);
        self
    }
}

impl fmt::Debug for PopupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupRequest")
            .field("owner", &self.owner)
            .field("side", &self.side)
            .field("modal", &self.modal)
            .finish_non_exhaustive()
    }
}

/// An open popup.
pub struct PopupEntry {
    pub host: NodeId,
    pub content: NodeId,
    pub owner: NodeId,
    pub side: AnchorSide,
    pub restore_focus: Option<NodeId>,
    pub modal: bool,
    on_dismiss: Option<DismissFn>,
}

impl fmt::Debug for PopupEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupEntry")
            .field("host", &self.host)
            .field("content", &self.content)
            .field("owner", &self.owner)
            .field("side", &self.side)
            .field("modal", &self.modal)
            .finish_non_exhaustive()
    }
}

/// Open popups, topmost last.
#[derive(Debug, Default)]
pub struct PopupStack {
    entries: Vec<PopupEntry>,
}

impl PopupStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a popup on top of the stack.
    ///
    /// The content is built, hosted under `layer_root`, measured and laid
    /// out at its anchored rect inside `screen`, and given focus. Returns the
    /// host id, or `None` when `layer_root` is missing.
    pub fn push(
        &mut self,
        tree: &mut NodeTree,
        focus: &mut FocusManager,
        layer_root: NodeId,
        screen: Rect,
        mut request: PopupRequest,
    ) -> Option<NodeId> {
        let host = tree.insert_child(layer_root, PopupHost::new(request.owner, request.side))?;
        let content = (request.content)(tree);
        if !tree.reparent(content, host) {
            tree.remove(host);
            return None;
        }

        let mut cx = LayoutCx::new(tree);
        if let Err(fault) = cx.arrange(host, screen) {
            tracing::warn!(%fault, "popup layout failed");
        }

        let restore_focus = request.restore_focus.or(focus.focused());
        if !focus.navigate(tree, content, true) {
            focus.focus(tree, content);
        }

        tracing::info!(
            ?host,
            owner = ?request.owner,
            side = ?request.side,
            modal = request.modal,
            "popup opened"
        );
        self.entries.push(PopupEntry {
            host,
            content,
            owner: request.owner,
            side: request.side,
            restore_focus,
            modal: request.modal,
            on_dismiss: request.on_dismiss.take(),
        });
        Some(host)
    }

    /// Close the top popup: remove it from the tree, run its dismiss
    /// callback and restore focus. Returns `false` when nothing is open.
    pub fn pop(&mut self, tree: &mut NodeTree, focus: &mut FocusManager) -> bool {
        let Some(mut entry) = self.entries.pop() else {
            return false;
        };
        tree.remove(entry.host);
        if let Some(on_dismiss) = entry.on_dismiss.take() {
            on_dismiss(tree);
        }
        focus.prune(tree);
        if let Some(target) = entry.restore_focus.filter(|&id| is_reachable(tree, id)) {
            focus.focus(tree, target);
        }
        tracing::info!(host = ?entry.host, "popup closed");
        true
    }

    /// Close `host` and every popup opened after it.
    pub fn close(&mut self, tree: &mut NodeTree, focus: &mut FocusManager, host: NodeId) -> bool {
        if !self.entries.iter().any(|e| e.host == host) {
            return false;
        }
        while let Some(top) = self.entries.last().map(|e| e.host) {
            self.pop(tree, focus);
            if top == host {
                break;
            }
        }
        true
    }

    /// Drop entries whose host left the tree some other way. Their dismiss
    /// callbacks still run.
    pub fn prune(&mut self, tree: &mut NodeTree) {
        let mut kept = Vec::with_capacity(self.entries.len());
        for mut entry in self.entries.drain(..) {
            if tree.contains(entry.host) {
                kept.push(entry);
            } else if let Some(on_dismiss) = entry.on_dismiss.take() {
                on_dismiss(tree);
            }
        }
        self.entries = kept;
    }

    pub fn top(&self) -> Option<&PopupEntry> {
        self.entries.last()
    }

    /// Host of the topmost modal popup; focus and keys stay inside it.
    pub fn modal_scope(&self) -> Option<NodeId> {
        self.entries.iter().rev().find(|e| e.modal).map(|e| e.host)
    }

    /// Whether input may reach `id`. While a modal popup is open only nodes
    /// inside it, or inside a popup opened above it, qualify.
    pub fn accepts(&self, tree: &NodeTree, id: NodeId) -> bool {
        match self.entries.iter().rposition(|e| e.modal) {
            None => true,
            Some(modal) => self.entries[modal..].iter().any(|e| tree.is_within(id, e.host)),
        }
    }

    /// Whether `(x, y)` lands on the top popup's content.
    pub fn top_contains(&self, tree: &NodeTree, x: i32, y: i32) -> bool {
        self.top()
            .and_then(|entry| tree.bounds(entry.content))
            .is_some_and(|bounds| bounds.contains(x, y))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loose constraints the content of a popup is measured under.
pub(crate) fn content_constraints(screen: Rect) -> Constraints {
    Constraints::loose(screen.size())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::nodes::{Label, Layers, Stack};

    fn screen() -> Rect {
        Rect::new(0, 0, 40, 20)
    }

    // ── Anchoring ────────────────────────────────────────────────────

    #[test]
    fn below_near_bottom_shifts_up() {
        let owner = Rect::new(5, 18, 10, 1);
        let rect = anchor_rect(owner, Size::new(12, 3), AnchorSide::Below, screen());
        assert_eq!(rect, Rect::new(5, 17, 12, 3));
        assert!(rect.bottom() <= 20);
    }

    #[test]
    fn anchor_sides() {
        let owner = Rect::new(10, 5, 4, 2);
        let size = Size::new(3, 2);
        assert_eq!(anchor_rect(owner, size, AnchorSide::Below, screen()), Rect::new(10, 7, 3, 2));
        assert_eq!(anchor_rect(owner, size, AnchorSide::Above, screen()), Rect::new(10, 3, 3, 2));
        assert_eq!(anchor_rect(owner, size, AnchorSide::Right, screen()), Rect::new(14, 5, 3, 2));
        assert_eq!(anchor_rect(owner, size, AnchorSide::Left, screen()), Rect::new(7, 5, 3, 2));
    }

    #[test]
    fn oversized_popup_is_cropped() {
        let owner = Rect::new(0, 0, 1, 1);
        let rect = anchor_rect(owner, Size::new(50, 30), AnchorSide::Below, screen());
        assert_eq!(rect, screen());
    }

    // ── Stack ────────────────────────────────────────────────────────

    fn setup() -> (NodeTree, NodeId, NodeId) {
        let mut tree = NodeTree::new();
        let root = tree.insert(Layers::new());
        let column = tree.insert_child(root, Stack::vertical()).unwrap();
        let owner = tree.insert_child(column, Label::new("owner").focusable()).unwrap();
        LayoutCx::new(&mut tree).arrange(root, screen()).unwrap();
        (tree, root, owner)
    }

    fn menu() -> NodeFactory {
        Box::new(|tree: &mut NodeTree| tree.insert(Label::new("item").focusable()))
    }

    #[test]
    fn push_places_and_focuses_content() {
        let (mut tree, root, owner) = setup();
        let mut focus = FocusManager::new();
        let mut stack = PopupStack::new();
        focus.focus(&mut tree, owner);

        let host = stack
            .push(
                &mut tree,
                &mut focus,
                root,
                screen(),
                PopupRequest::new(owner, AnchorSide::Below, menu()),
            )
            .unwrap();
        let content = stack.top().unwrap().content;
        assert_eq!(tree.parent(host), Some(root));
        assert_eq!(tree.bounds(content), Some(Rect::new(0, 1, 4, 1)));
        assert_eq!(focus.focused(), Some(content));
    }

    #[test]
    fn pop_dismisses_once_and_restores_focus() {
        let (mut tree, root, owner) = setup();
        let mut focus = FocusManager::new();
        let mut stack = PopupStack::new();
        focus.focus(&mut tree, owner);

        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        let request = PopupRequest::new(owner, AnchorSide::Below, menu())
            .on_dismiss(move |_| seen.set(seen.get() + 1));
        let host = stack.push(&mut tree, &mut focus, root, screen(), request).unwrap();

        assert!(stack.pop(&mut tree, &mut focus));
        assert!(!stack.pop(&mut tree, &mut focus));
        assert_eq!(calls.get(), 1);
        assert!(!tree.contains(host));
        assert_eq!(focus.focused(), Some(owner));
    }

    #[test]
    fn close_pops_everything_above() {
        let (mut tree, root, owner) = setup();
        let mut focus = FocusManager::new();
        let mut stack = PopupStack::new();
        let first = stack
            .push(
                &mut tree,
                &mut focus,
                root,
                screen(),
                PopupRequest::new(owner, AnchorSide::Below, menu()),
            )
            .unwrap();
        stack
            .push(
                &mut tree,
                &mut focus,
                root,
                screen(),
                PopupRequest::new(owner, AnchorSide::Right, menu()).modal(),
            )
            .unwrap();
        assert!(stack.modal_scope().is_some());

        assert!(stack.close(&mut tree, &mut focus, first));
        assert!(stack.is_empty());
    }

    #[test]
    fn top_contains_checks_content_bounds() {
        let (mut tree, root, owner) = setup();
        let mut focus = FocusManager::new();
        let mut stack = PopupStack::new();
        stack
            .push(
                &mut tree,
                &mut focus,
                root,
                screen(),
                PopupRequest::new(owner, AnchorSide::Below, menu()),
            )
            .unwrap();
        assert!(stack.top_contains(&tree, 0, 1));
        assert!(!stack.top_contains(&tree, 10, 10));
    }

    #[test]
    fn prune_runs_dismiss_for_removed_hosts() {
        let (mut tree, root, owner) = setup();
        let mut focus = FocusManager::new();
        let mut stack = PopupStack::new();
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        let host = stack
            .push(
                &mut tree,
                &mut focus,
                root,
                screen(),
                PopupRequest::new(owner, AnchorSide::Below, menu())
                    .on_dismiss(move |_| seen.set(1)),
            )
            .unwrap();
        tree.remove(host);
        stack.prune(&mut tree);
        assert!(stack.is_empty());
        assert_eq!(calls.get(), 1);
    }
}
