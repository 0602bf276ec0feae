//! Stacked full-size layers, and the host that positions a popup.

use std::any::Any;

use crate::error::NodeFault;
use crate::geometry::{Rect, Size};
use crate::layout::{Constraints, LayoutCx};
use crate::node::Node;
use crate::popup::{anchor_rect, content_constraints, AnchorSide};
use crate::tree::NodeId;

/// Every child gets the full rect and later children paint over earlier
/// ones. The screen root is a `Layers`: the application content is its
/// first child and each open popup is appended after it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Layers;

impl Layers {
    pub fn new() -> Self {
        Self
    }
}

impl Node for Layers {
    fn kind(&self) -> &str {
        "layers"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Positions popup content against its owner.
///
/// The host covers the whole screen but is invisible to hit tests; only the
/// content, laid out at its natural size next to the owner, can be hit.
#[derive(Debug, Clone, Copy)]
pub struct PopupHost {
    owner: NodeId,
    side: AnchorSide,
}

impl PopupHost {
    pub fn new(owner: NodeId, side: AnchorSide) -> Self {
        Self { owner, side }
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    pub fn side(&self) -> AnchorSide {
        self.side
    }
}

impl Node for PopupHost {
    fn kind(&self) -> &str {
        "popup"
    }

    fn measure(
        &mut self,
        _cx: &mut LayoutCx<'_>,
        constraints: Constraints,
    ) -> Result<Size, NodeFault> {
        Ok(constraints.min_size())
    }

    fn arrange(&mut self, cx: &mut LayoutCx<'_>, rect: Rect) -> Result<(), NodeFault> {
        let owner = cx
            .tree()
            .bounds(self.owner)
            .unwrap_or(Rect::from_origin(rect.origin(), Size::ZERO));
        for child in cx.children() {
            let size = cx.measure(child, content_constraints(rect))?;
            cx.arrange(child, anchor_rect(owner, size, self.side, rect))?;
        }
        Ok(())
    }

    fn is_hit_transparent(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
