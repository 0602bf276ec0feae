//! Node trait: measure, arrange, render, focus and input hooks.
//!
//! `Node` is the behavior half of a tree element. The engine half (bounds,
//! flags, children) lives in the [`NodeTree`] arena beside it, so a node only
//! ever sees the rest of the tree through the context passed to each phase.

use std::any::Any;

use crate::clip::ClipRegion;
use crate::error::{NodeFault, RenderError};
use crate::event::binding::BindingBuilder;
use crate::event::dispatch::EventCx;
use crate::event::drag::DragHandler;
use crate::event::input::{KeyEvent, MouseEvent, WheelDirection};
use crate::focus::FocusScope;
use crate::geometry::{Rect, Size};
use crate::layout::{Constraints, LayoutCx};
use crate::render::RenderCx;
use crate::tree::{NodeId, NodeTree};

/// Builds a detached subtree and returns its root.
///
/// Popup content and fault-boundary fallbacks are delivered this way, so the
/// code that owns the description of a subtree decides what gets inserted.
pub type NodeFactory = Box<dyn FnMut(&mut NodeTree) -> NodeId>;

// ---------------------------------------------------------------------------
// Node trait
// ---------------------------------------------------------------------------

/// Behavior of a retained tree element.
///
/// Every method except [`kind`](Node::kind) and the `as_any` pair has a
/// default. The defaults make a node act as a plain overlay container: it
/// measures to its largest child, gives every child its full rect, paints
/// children in document order and ignores input.
pub trait Node: Any {
    /// Short type name used in logs and snapshots.
    fn kind(&self) -> &str;

    /// Report the size this node wants under `constraints`.
    ///
    /// Must be idempotent and must not change tree structure. The caller
    /// clamps the result, so returning an out-of-range size is tolerated but
    /// logged.
    fn measure(
        &mut self,
        cx: &mut LayoutCx<'_>,
        constraints: Constraints,
    ) -> Result<Size, NodeFault> {
        let mut size = constraints.min_size();
        for child in cx.visible_children() {
            let child_size = cx.measure(child, constraints)?;
            size.width = size.width.max(child_size.width);
            size.height = size.height.max(child_size.height);
        }
        Ok(size)
    }

    /// Position children inside `rect`, this node's freshly set bounds.
    fn arrange(&mut self, cx: &mut LayoutCx<'_>, rect: Rect) -> Result<(), NodeFault> {
        for child in cx.children() {
            cx.arrange(child, rect)?;
        }
        Ok(())
    }

    /// Paint into the render context. Children are painted with
    /// [`RenderCx::render_child`].
    fn render(&mut self, cx: &mut RenderCx<'_>) -> Result<(), RenderError> {
        for child in cx.children() {
            cx.render_child(child)?;
        }
        Ok(())
    }

    /// How this node takes part in focus navigation.
    fn focus_scope(&self) -> FocusScope {
        FocusScope::None
    }

    /// Register key bindings. Called once, when the node is inserted.
    fn configure_bindings(&self, _bindings: &mut BindingBuilder) {}

    /// The region this node clips its children to, given its bounds.
    fn clip_region(&self, _bounds: Rect) -> Option<ClipRegion> {
        None
    }

    /// Whether a pointer press over this node's bounds lands on it.
    fn is_hit_target(&self) -> bool {
        self.focus_scope() != FocusScope::None
    }

    /// Hit tests look through this node to whatever lies beneath it. Its
    /// children are still tested.
    fn is_hit_transparent(&self) -> bool {
        false
    }

    /// Handle a key while this node (or a descendant) has focus. Return
    /// `true` to stop the key from bubbling further.
    fn on_key(&mut self, _cx: &mut EventCx<'_>, _key: &KeyEvent) -> bool {
        false
    }

    /// A button was pressed over this node. Returning a handler starts a
    /// drag that lasts until the button is released.
    fn on_mouse_down(
        &mut self,
        _cx: &mut EventCx<'_>,
        _event: &MouseEvent,
    ) -> Option<Box<dyn DragHandler>> {
        None
    }

    /// The wheel turned over this node or a descendant. Return `true` when
    /// consumed.
    fn on_wheel(&mut self, _cx: &mut EventCx<'_>, _direction: WheelDirection) -> bool {
        false
    }

    /// Release resources. Called once, when the node leaves the tree.
    fn dispose(&mut self) {}

    /// Downcast to `&dyn Any` for runtime type inspection.
    fn as_any(&self) -> &dyn Any;

    /// Downcast to `&mut dyn Any` for mutable runtime type inspection.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
