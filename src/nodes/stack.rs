//! Linear container: children one after another along an axis.

use std::any::Any;

use crate::error::NodeFault;
use crate::geometry::{Rect, Size};
use crate::layout::{distribute, Axis, Constraints, LayoutCx, SizeHint, UNBOUNDED};
use crate::node::Node;
use crate::tree::{NodeId, NodeTree};

/// Lays children out along one axis, sized by their [`SizeHint`], and
/// stretches each across the other axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stack {
    axis: Axis,
    gap: i32,
}

impl Stack {
    pub fn new(axis: Axis) -> Self {
        Self { axis, gap: 0 }
    }

    /// Children top to bottom.
    pub fn vertical() -> Self {
        Self::new(Axis::Vertical)
    }

    /// Children left to right.
    pub fn horizontal() -> Self {
        Self::new(Axis::Horizontal)
    }

    /// Blank cells between neighbours (builder).
    pub fn gap(mut self, gap: i32) -> Self {
        self.gap = gap.max(0);
        self
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    fn gaps(&self, count: usize) -> i32 {
        let between = i32::try_from(count.saturating_sub(1)).unwrap_or(i32::MAX);
        self.gap.saturating_mul(between)
    }

    /// What a child is measured under: its hint on the main axis, anything
    /// up to `cross_max` on the other.
    fn child_constraints(&self, hint: SizeHint, cross_max: i32, main_max: i32) -> Constraints {
        let (main_min, main_max) = match hint {
            SizeHint::Fixed(n) => {
                let n = n.clamp(0, main_max);
                (n, n)
            }
            SizeHint::Content | SizeHint::Fill(_) => (0, UNBOUNDED),
        };
        match self.axis {
            Axis::Vertical => Constraints::new(0, cross_max, main_min, main_max),
            Axis::Horizontal => Constraints::new(main_min, main_max, 0, cross_max),
        }
    }
}

pub(crate) fn hint_of(tree: &NodeTree, id: NodeId) -> SizeHint {
    tree.state(id).map(|s| s.hint).unwrap_or_default()
}

impl Node for Stack {
    fn kind(&self) -> &str {
        match self.axis {
            Axis::Vertical => "vstack",
            Axis::Horizontal => "hstack",
        }
    }

    fn measure(
        &mut self,
        cx: &mut LayoutCx<'_>,
        constraints: Constraints,
    ) -> Result<Size, NodeFault> {
        let children = cx.visible_children();
        let max = constraints.max_size();
        let main_max = self.axis.main(max);
        let cross_max = self.axis.cross(max);

        let mut main = self.gaps(children.len());
        let mut cross = 0;
        let mut has_fill = false;
        for child in children {
            let hint = hint_of(cx.tree(), child);
            has_fill |= hint.is_fill();
            let size = cx.measure(child, self.child_constraints(hint, cross_max, main_max))?;
            main = main.saturating_add(self.axis.main(size));
            cross = cross.max(self.axis.cross(size));
        }
        if has_fill && main_max != UNBOUNDED {
            main = main.max(main_max);
        }
        Ok(constraints.constrain(self.axis.pack(main, cross)))
    }

    fn arrange(&mut self, cx: &mut LayoutCx<'_>, rect: Rect) -> Result<(), NodeFault> {
        let children = cx.visible_children();
        let available = (self.axis.main(rect.size()) - self.gaps(children.len())).max(0);
        let cross = self.axis.cross(rect.size());

        let mut hints = Vec::with_capacity(children.len());
        let mut content = Vec::with_capacity(children.len());
        for &child in &children {
            let hint = hint_of(cx.tree(), child);
            let natural = match hint {
                SizeHint::Content => {
                    let size = cx.measure(child, self.child_constraints(hint, cross, UNBOUNDED))?;
                    self.axis.main(size)
                }
                _ => 0,
            };
            hints.push(hint);
            content.push(natural);
        }

        let sizes = distribute(available, &hints, &content);
        let mut pos = match self.axis {
            Axis::Vertical => rect.y,
            Axis::Horizontal => rect.x,
        };
        for (child, size) in children.into_iter().zip(sizes) {
            let child_rect = match self.axis {
                Axis::Vertical => Rect::new(rect.x, pos, rect.width, size),
                Axis::Horizontal => Rect::new(pos, rect.y, size, rect.height),
            };
            cx.arrange(child, child_rect)?;
            pos = pos.saturating_add(size).saturating_add(self.gap);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::Label;
    use pretty_assertions::assert_eq;

    fn layout(tree: &mut NodeTree, root: NodeId, rect: Rect) {
        LayoutCx::new(tree).arrange(root, rect).unwrap();
    }

    // ── Measure ──────────────────────────────────────────────────────

    #[test]
    fn measure_sums_main_and_maxes_cross() {
        let mut tree = NodeTree::new();
        let stack = tree.insert(Stack::vertical().gap(1));
        tree.insert_child(stack, Label::new("abc")).unwrap();
        tree.insert_child(stack, Label::new("a\nb")).unwrap();
        let size = LayoutCx::new(&mut tree).measure(stack, Constraints::unbounded()).unwrap();
        assert_eq!(size, Size::new(3, 4));
    }

    #[test]
    fn fill_child_claims_bounded_space() {
        let mut tree = NodeTree::new();
        let stack = tree.insert(Stack::horizontal());
        let fill = tree.insert_child(stack, Label::new("x")).unwrap();
        tree.set_hint(fill, SizeHint::Fill(1));
        let size = LayoutCx::new(&mut tree)
            .measure(stack, Constraints::loose(Size::new(20, 5)))
            .unwrap();
        assert_eq!(size, Size::new(20, 1));
    }

    // ── Arrange ──────────────────────────────────────────────────────

    #[test]
    fn arrange_fixed_content_fill() {
        let mut tree = NodeTree::new();
        let stack = tree.insert(Stack::vertical());
        let header = tree.insert_child(stack, Label::new("head")).unwrap();
        let body = tree.insert_child(stack, Label::new("body")).unwrap();
        let footer = tree.insert_child(stack, Label::new("a\nb")).unwrap();
        tree.set_hint(header, SizeHint::Fixed(2));
        tree.set_hint(body, SizeHint::Fill(1));

        layout(&mut tree, stack, Rect::new(0, 0, 10, 10));
        assert_eq!(tree.bounds(header), Some(Rect::new(0, 0, 10, 2)));
        assert_eq!(tree.bounds(body), Some(Rect::new(0, 2, 10, 6)));
        assert_eq!(tree.bounds(footer), Some(Rect::new(0, 8, 10, 2)));
    }

    #[test]
    fn arrange_with_gap_and_weights() {
        let mut tree = NodeTree::new();
        let stack = tree.insert(Stack::horizontal().gap(1));
        let a = tree.insert_child(stack, Label::new("a")).unwrap();
        let b = tree.insert_child(stack, Label::new("b")).unwrap();
        tree.set_hint(a, SizeHint::Fill(1));
        tree.set_hint(b, SizeHint::Fill(2));

        layout(&mut tree, stack, Rect::new(1, 1, 10, 3));
        assert_eq!(tree.bounds(a), Some(Rect::new(1, 1, 3, 3)));
        assert_eq!(tree.bounds(b), Some(Rect::new(5, 1, 6, 3)));
    }

    #[test]
    fn overfull_reservations_truncate() {
        let mut tree = NodeTree::new();
        let stack = tree.insert(Stack::vertical());
        let a = tree.insert_child(stack, Label::new("a")).unwrap();
        let b = tree.insert_child(stack, Label::new("b")).unwrap();
        tree.set_hint(a, SizeHint::Fixed(4));
        tree.set_hint(b, SizeHint::Fixed(4));

        layout(&mut tree, stack, Rect::new(0, 0, 5, 6));
        assert_eq!(tree.bounds(a).unwrap().height, 4);
        assert_eq!(tree.bounds(b).unwrap().height, 2);
    }

    #[test]
    fn hidden_children_take_no_space() {
        let mut tree = NodeTree::new();
        let stack = tree.insert(Stack::vertical());
        let hidden = tree.insert_child(stack, Label::new("gone")).unwrap();
        let shown = tree.insert_child(stack, Label::new("here")).unwrap();
        tree.set_visible(hidden, false);
        layout(&mut tree, stack, Rect::new(0, 0, 5, 5));
        assert_eq!(tree.bounds(shown), Some(Rect::new(0, 0, 5, 1)));
    }
}
