//! Drag gestures.
//!
//! A node returns a [`DragHandler`] from `on_mouse_down`; the screen keeps it
//! in a [`DragState`] for the rest of the gesture, feeds it deltas measured
//! from the press position, and drops it on release.

use crate::geometry::Offset;
use crate::tree::NodeTree;

use super::input::MouseBtn;

/// Receives the moves of one drag gesture.
///
/// Handlers only update state and invalidate; layout runs once per frame, so
/// any number of moves between frames cost a single re-layout.
pub trait DragHandler {
    /// The pointer moved. `delta` is relative to where the button went down.
    fn on_move(&mut self, tree: &mut NodeTree, delta: Offset);

    /// The button was released. The handler is dropped right after.
    fn on_release(&mut self, _tree: &mut NodeTree) {}
}

/// A drag handler built from a closure, for nodes that need no release step.
pub struct DragFn<F>(pub F);

impl<F: FnMut(&mut NodeTree, Offset)> DragHandler for DragFn<F> {
    fn on_move(&mut self, tree: &mut NodeTree, delta: Offset) {
        (self.0)(tree, delta);
    }
}

/// The gesture in progress.
pub struct DragState {
    handler: Box<dyn DragHandler>,
    origin: Offset,
    button: MouseBtn,
    last: Offset,
}

impl DragState {
    pub fn new(handler: Box<dyn DragHandler>, origin: Offset, button: MouseBtn) -> Self {
        Self { handler, origin, button, last: origin }
    }

    pub fn button(&self) -> MouseBtn {
        self.button
    }

    pub fn origin(&self) -> Offset {
        self.origin
    }

    /// Forward a move to `at`. Repeated positions are not forwarded.
    pub fn moved(&mut self, tree: &mut NodeTree, at: Offset) {
        if at == self.last {
            return;
        }
        self.last = at;
        self.handler.on_move(tree, at - self.origin);
    }

    /// End the gesture, consuming the state.
    pub fn release(mut self, tree: &mut NodeTree) {
        self.handler.on_release(tree);
    }
}

impl std::fmt::Debug for DragState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragState")
            .field("origin", &self.origin)
            .field("button", &self.button)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}
