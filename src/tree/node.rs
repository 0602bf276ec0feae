//! Node identity and per-node engine state.

use slotmap::new_key_type;

use crate::geometry::Rect;
use crate::layout::SizeHint;

new_key_type! {
    /// Stable handle to a node in the [`NodeTree`](super::NodeTree) arena.
    /// Copy, lightweight (u64). A handle to a removed node never aliases a
    /// later one.
    pub struct NodeId;
}

/// Engine-owned state kept beside every node's behavior.
///
/// Nodes never write `bounds` themselves: it is set by the layout pass when
/// the parent arranges the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeState {
    /// Absolute rectangle from the last arrange, `None` until arranged.
    pub bounds: Option<Rect>,
    /// The node's own rendered output is stale.
    pub dirty: bool,
    /// The node's geometry (or its subtree's) must be recomputed.
    pub layout_dirty: bool,
    pub focused: bool,
    pub hovered: bool,
    pub visible: bool,
    pub disabled: bool,
    /// How the node asks its parent container to size it.
    pub hint: SizeHint,
}

impl NodeState {
    /// Fresh state: unarranged, dirty, visible.
    pub fn new() -> Self {
        Self {
            bounds: None,
            dirty: true,
            layout_dirty: true,
            focused: false,
            hovered: false,
            visible: true,
            disabled: false,
            hint: SizeHint::Content,
        }
    }

    /// Whether the node can take part in focus and hit testing.
    pub fn is_interactive(&self) -> bool {
        self.visible && !self.disabled
    }
}

impl Default for NodeState {
    fn default() -> Self {
        Self::new()
    }
}
