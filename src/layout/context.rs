//! Tree access handed to nodes during measure and arrange.

use crate::error::{NodeFault, Phase};
use crate::geometry::{Rect, Size};
use crate::tree::{NodeId, NodeTree};

use super::constraints::Constraints;

/// Context for the measure and arrange passes.
///
/// Nodes never touch another node's `bounds` directly: they call
/// [`measure`](Self::measure) and [`arrange`](Self::arrange) on their
/// children through this context, which clamps sizes and records bounds.
pub struct LayoutCx<'a> {
    tree: &'a mut NodeTree,
    node: Option<NodeId>,
}

impl<'a> LayoutCx<'a> {
    /// Context for driving layout from outside any node.
    pub fn new(tree: &'a mut NodeTree) -> Self {
        Self { tree, node: None }
    }

    /// The node currently being laid out, `None` at the top level.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Children of the current node, in document order.
    pub fn children(&self) -> Vec<NodeId> {
        match self.node {
            Some(id) => self.tree.children(id).to_vec(),
            None => Vec::new(),
        }
    }

    /// Children that take part in layout (hidden ones are skipped).
    pub fn visible_children(&self) -> Vec<NodeId> {
        self.children()
            .into_iter()
            .filter(|&id| self.tree.state(id).is_some_and(|s| s.visible))
            .collect()
    }

    pub fn tree(&self) -> &NodeTree {
        self.tree
    }

    pub fn tree_mut(&mut self) -> &mut NodeTree {
        self.tree
    }

    /// Measure `child` under `constraints`.
    ///
    /// The result always satisfies `constraints`. Hidden children measure
    /// as the smallest allowed size.
    pub fn measure(&mut self, child: NodeId, constraints: Constraints) -> Result<Size, NodeFault> {
        let visible = match self.tree.state(child) {
            Some(state) => state.visible,
            None => return Err(missing(Phase::Measure, child)),
        };
        if !visible {
            return Ok(constraints.min_size());
        }

        let raw = self
            .tree
            .with_node(child, |node, tree| {
                let mut cx = LayoutCx { tree, node: Some(child) };
                node.measure(&mut cx, constraints)
            })
            .ok_or_else(|| missing(Phase::Measure, child))??;

        let size = constraints.constrain(raw);
        if size != raw {
            tracing::debug!(
                ?child,
                returned = ?raw,
                clamped = ?size,
                "measure result outside constraints"
            );
        }
        Ok(size)
    }

    /// Place `child` at `rect`, then let it arrange its own children.
    pub fn arrange(&mut self, child: NodeId, rect: Rect) -> Result<(), NodeFault> {
        let (visible, moved) = match self.tree.state_mut(child) {
            Some(state) => {
                let moved = state.bounds != Some(rect);
                state.bounds = Some(rect);
                state.layout_dirty = false;
                (state.visible, moved)
            }
            None => return Err(missing(Phase::Arrange, child)),
        };
        if moved {
            self.tree.mark_dirty(child);
        }
        if !visible {
            return Ok(());
        }

        self.tree
            .with_node(child, |node, tree| {
                let mut cx = LayoutCx { tree, node: Some(child) };
                node.arrange(&mut cx, rect)
            })
            .ok_or_else(|| missing(Phase::Arrange, child))?
    }
}

fn missing(phase: Phase, id: NodeId) -> NodeFault {
    NodeFault::new(phase, format!("node {id:?} is not available"))
}
