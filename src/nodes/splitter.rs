//! Two panes separated by a draggable divider.

use std::any::Any;

use crate::clip::ClipRegion;
use crate::error::{NodeFault, RenderError};
use crate::event::action::Action;
use crate::event::binding::BindingBuilder;
use crate::event::dispatch::EventCx;
use crate::event::drag::{DragFn, DragHandler};
use crate::event::input::{Key, Modifiers, MouseEvent};
use crate::focus::FocusScope;
use crate::geometry::{Offset, Rect, Size};
use crate::layout::{Axis, Constraints, LayoutCx};
use crate::node::Node;
use crate::render::RenderCx;
use crate::tree::{NodeId, NodeTree};

pub const DIVIDER_KEY: &str = "splitter.divider";

/// Splits its rect between its first two children.
///
/// The first pane gets `ratio` of the space not taken by the one-cell
/// divider, but never less than `min_pane` cells on either side. Drag the
/// divider, or press Ctrl plus an arrow key while focus is inside, to move it.
#[derive(Debug, Clone)]
pub struct Splitter {
    axis: Axis,
    ratio: f32,
    min_pane: i32,
    last_avail: i32,
    divider: Rect,
}

impl Splitter {
    pub fn new(axis: Axis) -> Self {
        Self { axis, ratio: 0.5, min_pane: 1, last_avail: 0, divider: Rect::EMPTY }
    }

    /// Panes side by side with a vertical divider.
    pub fn horizontal() -> Self {
        Self::new(Axis::Horizontal)
    }

    /// Panes stacked with a horizontal divider.
    pub fn vertical() -> Self {
        Self::new(Axis::Vertical)
    }

    pub fn ratio(mut self, ratio: f32) -> Self {
        self.set_ratio(ratio);
        self
    }

    pub fn min_pane(mut self, cells: i32) -> Self {
        self.min_pane = cells.max(0);
        self
    }

    pub fn current_ratio(&self) -> f32 {
        self.ratio
    }

    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.5 };
    }

    /// Move the divider by `cells`, using the space of the last layout.
    pub fn nudge(&mut self, cells: i32) {
        let first = self.first_size(self.last_avail) + cells;
        self.set_first(first, self.last_avail);
    }

    pub fn divider(&self) -> Rect {
        self.divider
    }

    /// Main-axis size of the first pane when `avail` cells are shared.
    fn first_size(&self, avail: i32) -> i32 {
        if avail <= 0 {
            return 0;
        }
        let wanted = (avail as f32 * self.ratio).round() as i32;
        let low = self.min_pane.min(avail / 2);
        wanted.clamp(low, avail - low)
    }

    fn set_first(&mut self, first: i32, avail: i32) {
        if avail > 0 {
            self.set_ratio(first as f32 / avail as f32);
        }
    }

    fn panes(&self, rect: Rect) -> (Rect, Rect, Rect) {
        let avail = (self.axis.main(rect.size()) - 1).max(0);
        let first = self.first_size(avail);
        let second = avail - first;
        match self.axis {
            Axis::Horizontal => (
                Rect::new(rect.x, rect.y, first, rect.height),
                Rect::new(rect.x + first, rect.y, rect.width.min(1), rect.height),
                Rect::new(rect.x + first + 1, rect.y, second, rect.height),
            ),
            Axis::Vertical => (
                Rect::new(rect.x, rect.y, rect.width, first),
                Rect::new(rect.x, rect.y + first, rect.width, rect.height.min(1)),
                Rect::new(rect.x, rect.y + first + 1, rect.width, second),
            ),
        }
    }
}

impl Node for Splitter {
    fn kind(&self) -> &str {
        "splitter"
    }

    fn measure(
        &mut self,
        cx: &mut LayoutCx<'_>,
        constraints: Constraints,
    ) -> Result<Size, NodeFault> {
        let mut main = 1;
        let mut cross = 0;
        for child in cx.visible_children().into_iter().take(2) {
            let size = cx.measure(child, constraints.loosen())?;
            main += self.axis.main(size);
            cross = cross.max(self.axis.cross(size));
        }
        Ok(constraints.constrain(self.axis.pack(main, cross)))
    }

    fn arrange(&mut self, cx: &mut LayoutCx<'_>, rect: Rect) -> Result<(), NodeFault> {
        self.last_avail = (self.axis.main(rect.size()) - 1).max(0);
        let (first, divider, second) = self.panes(rect);
        self.divider = divider;
        let children = cx.children();
        if let Some(&a) = children.first() {
            cx.arrange(a, first)?;
        }
        if let Some(&b) = children.get(1) {
            cx.arrange(b, second)?;
        }
        // Anything past two panes has no room.
        for &extra in children.iter().skip(2) {
            cx.arrange(extra, Rect::new(rect.x, rect.y, 0, 0))?;
        }
        Ok(())
    }

    fn render(&mut self, cx: &mut RenderCx<'_>) -> Result<(), RenderError> {
        let mut style = cx.ambient();
        if let Some(color) = cx.theme().color(DIVIDER_KEY) {
            style.fg = Some(color);
        }
        let d = self.divider;
        match self.axis {
            Axis::Horizontal => {
                for y in d.y..d.bottom() {
                    cx.draw_styled(d.x, y, "│", style);
                }
            }
            Axis::Vertical => {
                let line = "─".repeat(d.width.max(0) as usize);
                cx.draw_styled(d.x, d.y, &line, style);
            }
        }

        for child in cx.children().into_iter().take(2) {
            let Some(bounds) = cx.tree().bounds(child) else { continue };
            cx.with_clip(ClipRegion::clip(bounds), |cx| cx.render_child(child))?;
        }
        Ok(())
    }

    fn focus_scope(&self) -> FocusScope {
        FocusScope::Managed { wrap: false }
    }

    fn is_hit_target(&self) -> bool {
        true
    }

    fn configure_bindings(&self, bindings: &mut BindingBuilder) {
        let (back, forward) = match self.axis {
            Axis::Horizontal => (Key::Left, Key::Right),
            Axis::Vertical => (Key::Up, Key::Down),
        };
        bindings
            .bind(back, Modifiers::CTRL, Action::sync(|tree, id| nudge(tree, id, -1)))
            .bind(forward, Modifiers::CTRL, Action::sync(|tree, id| nudge(tree, id, 1)));
    }

    fn on_mouse_down(
        &mut self,
        cx: &mut EventCx<'_>,
        event: &MouseEvent,
    ) -> Option<Box<dyn DragHandler>> {
        let at = event.position();
        if !self.divider.contains(at.x, at.y) {
            return None;
        }
        let node = cx.node();
        let axis = self.axis;
        let avail = self.last_avail;
        let start = self.first_size(avail);
        Some(Box::new(DragFn(move |tree: &mut NodeTree, delta: Offset| {
            let moved = match axis {
                Axis::Horizontal => delta.x,
                Axis::Vertical => delta.y,
            };
            tree.update::<Splitter, _>(node, |s| s.set_first(start + moved, avail));
        })))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn nudge(tree: &mut NodeTree, id: NodeId, cells: i32) {
    tree.update::<Splitter, _>(id, |s| s.nudge(cells));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::input::{MouseAction, MouseBtn};
    use crate::event::KeyEvent;
    use crate::nodes::Label;

    fn split(splitter: Splitter) -> (NodeTree, NodeId, NodeId, NodeId) {
        let mut tree = NodeTree::new();
        let root = tree.insert(splitter);
        let a = tree.insert_child(root, Label::new("left").focusable()).unwrap();
        let b = tree.insert_child(root, Label::new("right").focusable()).unwrap();
        LayoutCx::new(&mut tree).arrange(root, Rect::new(0, 0, 21, 5)).unwrap();
        (tree, root, a, b)
    }

    #[test]
    fn panes_share_space_around_divider() {
        let (tree, root, a, b) = split(Splitter::horizontal());
        assert_eq!(tree.bounds(a), Some(Rect::new(0, 0, 10, 5)));
        assert_eq!(tree.bounds(b), Some(Rect::new(11, 0, 10, 5)));
        let divider = tree.downcast_ref::<Splitter>(root).unwrap().divider();
        assert_eq!(divider, Rect::new(10, 0, 1, 5));
    }

    #[test]
    fn min_pane_holds() {
        let (tree, _root, a, b) = split(Splitter::horizontal().ratio(0.0).min_pane(4));
        assert_eq!(tree.bounds(a).unwrap().width, 4);
        assert_eq!(tree.bounds(b).unwrap().width, 16);
    }

    #[test]
    fn vertical_split() {
        let mut tree = NodeTree::new();
        let root = tree.insert(Splitter::vertical().ratio(0.25));
        let a = tree.insert_child(root, Label::new("top")).unwrap();
        let b = tree.insert_child(root, Label::new("bottom")).unwrap();
        LayoutCx::new(&mut tree).arrange(root, Rect::new(0, 0, 6, 9)).unwrap();
        assert_eq!(tree.bounds(a), Some(Rect::new(0, 0, 6, 2)));
        assert_eq!(tree.bounds(b), Some(Rect::new(0, 3, 6, 6)));
    }

    #[test]
    fn ctrl_arrow_binding_nudges() {
        let (mut tree, root, a, _b) = split(Splitter::horizontal());
        let key = KeyEvent::new(Key::Right, Modifiers::CTRL);
        let mut bindings = tree.take_bindings(root).unwrap();
        let action = bindings.lookup_mut(&key).unwrap();
        let mutations = crate::event::MutationQueue::new();
        action.invoke(&mut tree, root, &mutations.sender());
        tree.restore_bindings(root, bindings);

        LayoutCx::new(&mut tree).arrange(root, Rect::new(0, 0, 21, 5)).unwrap();
        assert_eq!(tree.bounds(a).unwrap().width, 11);
    }

    #[test]
    fn divider_drag_moves_panes() {
        let (mut tree, root, a, _b) = split(Splitter::horizontal());
        let mut requests = Vec::new();
        let press = MouseEvent::new(MouseAction::Down(MouseBtn::Left), 10, 2);
        let mut handler = tree
            .with_node(root, |node, tree| {
                let mut cx = EventCx::new(tree, root, &mut requests);
                node.on_mouse_down(&mut cx, &press)
            })
            .flatten()
            .unwrap();
        handler.on_move(&mut tree, Offset::new(-4, 0));

        LayoutCx::new(&mut tree).arrange(root, Rect::new(0, 0, 21, 5)).unwrap();
        assert_eq!(tree.bounds(a).unwrap().width, 6);
    }

    #[test]
    fn press_off_divider_starts_nothing() {
        let (mut tree, root, _a, _b) = split(Splitter::horizontal());
        let mut requests = Vec::new();
        let press = MouseEvent::new(MouseAction::Down(MouseBtn::Left), 3, 2);
        let handler = tree
            .with_node(root, |node, tree| {
                let mut cx = EventCx::new(tree, root, &mut requests);
                node.on_mouse_down(&mut cx, &press)
            })
            .flatten();
        assert!(handler.is_none());
    }
}
