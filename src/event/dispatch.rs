//! Routing input to nodes: hit testing and bubbling.
//!
//! Keys go to the focused node and bubble up through its ancestors. Pointer
//! events go to the topmost node under the pointer, found by walking the
//! tree in reverse paint order. Nodes react through an [`EventCx`], which
//! collects requests (focus changes, popups) for the screen to carry out
//! once dispatch returns and no node is checked out of the tree.

use tokio::task::JoinHandle;

use crate::clip::ClipMode;
use crate::geometry::Rect;
use crate::popup::PopupRequest;
use crate::tree::{NodeId, NodeTree};

use super::action::MutationSender;
use super::drag::DragHandler;
use super::input::{KeyEvent, MouseEvent, WheelDirection};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Something a node asked for while handling input.
#[derive(Debug)]
pub enum Request {
    Focus(NodeId),
    Blur,
    OpenPopup(PopupRequest),
    /// Close the given popup host, or the top one.
    ClosePopup(Option<NodeId>),
    Quit,
    /// A named command for the application.
    Command(String),
}

// ---------------------------------------------------------------------------
// EventCx
// ---------------------------------------------------------------------------

/// Handed to node input hooks.
pub struct EventCx<'a> {
    tree: &'a mut NodeTree,
    node: NodeId,
    requests: &'a mut Vec<Request>,
}

impl<'a> EventCx<'a> {
    pub fn new(tree: &'a mut NodeTree, node: NodeId, requests: &'a mut Vec<Request>) -> Self {
        Self { tree, node, requests }
    }

    /// The node handling the event.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn bounds(&self) -> Rect {
        self.tree.bounds(self.node).unwrap_or(Rect::EMPTY)
    }

    pub fn is_focused(&self) -> bool {
        self.tree.state(self.node).is_some_and(|s| s.focused)
    }

    pub fn tree(&self) -> &NodeTree {
        self.tree
    }

    pub fn tree_mut(&mut self) -> &mut NodeTree {
        self.tree
    }

    /// Repaint this node.
    pub fn mark_dirty(&mut self) {
        self.tree.mark_dirty(self.node);
    }

    /// Re-layout this node and its parent.
    pub fn mark_layout_dirty(&mut self) {
        self.tree.mark_layout_dirty(self.node);
    }

    pub fn focus(&mut self, id: NodeId) {
        self.requests.push(Request::Focus(id));
    }

    pub fn focus_self(&mut self) {
        self.requests.push(Request::Focus(self.node));
    }

    pub fn blur(&mut self) {
        self.requests.push(Request::Blur);
    }

    pub fn open_popup(&mut self, request: PopupRequest) {
        self.requests.push(Request::OpenPopup(request));
    }

    pub fn close_popup(&mut self) {
        self.requests.push(Request::ClosePopup(None));
    }

    pub fn quit(&mut self) {
        self.requests.push(Request::Quit);
    }

    pub fn command(&mut self, name: impl Into<String>) {
        self.requests.push(Request::Command(name.into()));
    }
}

// ---------------------------------------------------------------------------
// Hit testing
// ---------------------------------------------------------------------------

/// Which nodes a hit test may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitFilter {
    /// Nodes that declare themselves hit targets.
    Targets,
    /// Any visible node.
    Any,
}

/// The topmost node under `(x, y)`.
///
/// Nodes are tested in reverse paint order, so later siblings (overlays,
/// popups) win over earlier ones, and children over their parents. A node's
/// hit rectangle is its bounds cut by every ancestor's clip region. Hidden
/// and disabled subtrees are skipped.
pub fn hit_test(
    tree: &NodeTree,
    root: NodeId,
    x: i32,
    y: i32,
    filter: HitFilter,
) -> Option<NodeId> {
    let mut candidates: Vec<(NodeId, Rect)> = Vec::new();
    let mut stack = vec![(root, Rect::new(i32::MIN / 2, i32::MIN / 2, i32::MAX, i32::MAX))];

    while let Some((id, clip)) = stack.pop() {
        let Some(state) = tree.state(id) else { continue };
        if !state.is_interactive() {
            continue;
        }
        let Some(bounds) = state.bounds else { continue };
        let node = tree.node(id);
        if !node.is_some_and(|node| node.is_hit_transparent()) {
            candidates.push((id, bounds.intersection(clip)));
        }

        let inner = match node.and_then(|node| node.clip_region(bounds)) {
            Some(region) if region.mode == ClipMode::Clip => clip.intersection(region.rect),
            _ => clip,
        };
        for &child in tree.children(id).iter().rev() {
            stack.push((child, inner));
        }
    }

    candidates.into_iter().rev().find_map(|(id, rect)| {
        let accepts = match filter {
            HitFilter::Any => true,
            HitFilter::Targets => tree.node(id).is_some_and(|node| node.is_hit_target()),
        };
        (accepts && rect.contains(x, y)).then_some(id)
    })
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Result of routing one key.
#[derive(Debug, Default)]
pub struct KeyOutcome {
    /// Some node bound or handled the key.
    pub handled: bool,
    /// Blocking async actions the caller must await before the next frame.
    pub blocking: Vec<JoinHandle<()>>,
}

/// Route `key` from `start` up to (and including) `stop`.
///
/// At each node its bindings are tried, then its `on_key` hook. The first
/// node to take the key ends the walk.
pub fn dispatch_key(
    tree: &mut NodeTree,
    start: NodeId,
    stop: Option<NodeId>,
    key: &KeyEvent,
    requests: &mut Vec<Request>,
    mutations: &MutationSender,
) -> KeyOutcome {
    let mut outcome = KeyOutcome::default();
    for id in path_to(tree, start, stop) {
        if tree.bindings(id).is_some_and(|b| b.contains(key)) {
            if let Some(mut bindings) = tree.take_bindings(id) {
                let handle = bindings
                    .lookup_mut(key)
                    .and_then(|action| action.invoke(tree, id, mutations));
                tree.restore_bindings(id, bindings);
                outcome.blocking.extend(handle);
                outcome.handled = true;
                tracing::trace!(?id, ?key, "key bound");
                break;
            }
        }

        let handled = tree
            .with_node(id, |node, tree| {
                let mut cx = EventCx::new(tree, id, requests);
                node.on_key(&mut cx, key)
            })
            .unwrap_or(false);
        if handled {
            outcome.handled = true;
            tracing::trace!(?id, ?key, "key handled");
            break;
        }
    }
    outcome
}

/// Offer a button press to `target` and its ancestors until one starts a
/// drag.
pub fn dispatch_mouse_down(
    tree: &mut NodeTree,
    target: NodeId,
    event: &MouseEvent,
    requests: &mut Vec<Request>,
) -> Option<Box<dyn DragHandler>> {
    for id in path_to(tree, target, None) {
        let handler = tree
            .with_node(id, |node, tree| {
                let mut cx = EventCx::new(tree, id, requests);
                node.on_mouse_down(&mut cx, event)
            })
            .flatten();
        if handler.is_some() {
            tracing::trace!(?id, "drag started");
            return handler;
        }
    }
    None
}

/// Offer a wheel turn to `target` and its ancestors until one consumes it.
pub fn dispatch_wheel(
    tree: &mut NodeTree,
    target: NodeId,
    direction: WheelDirection,
    requests: &mut Vec<Request>,
) -> bool {
    path_to(tree, target, None).into_iter().any(|id| {
        tree.with_node(id, |node, tree| {
            let mut cx = EventCx::new(tree, id, requests);
            node.on_wheel(&mut cx, direction)
        })
        .unwrap_or(false)
    })
}

/// `start` followed by its ancestors, ending at `stop` when given.
fn path_to(tree: &NodeTree, start: NodeId, stop: Option<NodeId>) -> Vec<NodeId> {
    let mut path = vec![start];
    if stop == Some(start) {
        return path;
    }
    for ancestor in tree.ancestors(start) {
        path.push(ancestor);
        if stop == Some(ancestor) {
            break;
        }
    }
    path
}

// ===========================================================================
// Tests
// ===========================================================================
