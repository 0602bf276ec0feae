//! Scroll state, the scrollbar, and the vertical scroll panel.
//!
//! `ScrollState` tracks the current scroll position for a viewport,
//! handling clamping, content/viewport size, and scroll percentages.
//! `ScrollbarState` provides the data needed to render a scrollbar indicator.
//! [`ScrollPanel`] puts both to work: it lays its content out at full height,
//! shifts it by the scroll offset and clips it to the viewport.

use std::any::Any;

use crate::ansi::Style;
use crate::clip::ClipRegion;
use crate::error::{NodeFault, RenderError};
use crate::event::dispatch::EventCx;
use crate::event::drag::DragHandler;
use crate::event::input::{Key, KeyEvent, MouseEvent, WheelDirection};
use crate::focus::FocusScope;
use crate::geometry::{Offset, Rect, Size};
use crate::layout::{Constraints, LayoutCx, UNBOUNDED};
use crate::node::Node;
use crate::render::RenderCx;
use crate::tree::{NodeId, NodeTree};

// ---------------------------------------------------------------------------
// ScrollState
// ---------------------------------------------------------------------------

/// Tracks the scroll position of a viewport over larger content.
///
/// The scroll offset is always clamped to `[0, max_scroll]` where
/// `max_scroll = content_size - viewport_size` (clamped to zero).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollState {
    /// Current scroll offset (always >= 0, clamped to max).
    pub offset: Offset,
    /// Total size of the scrollable content.
    pub content_size: Size,
    /// Size of the visible viewport.
    pub viewport_size: Size,
}

impl ScrollState {
    /// Create a new scroll state with zero offset.
    pub fn new(content_size: Size, viewport_size: Size) -> Self {
        Self {
            offset: Offset::ZERO,
            content_size,
            viewport_size,
        }
    }

    /// The maximum scroll offset for each axis.
    pub fn max_scroll(&self) -> Offset {
        Offset::new(
            (self.content_size.width - self.viewport_size.width).max(0),
            (self.content_size.height - self.viewport_size.height).max(0),
        )
    }

    /// Scroll to an absolute position, clamping to valid range.
    pub fn scroll_to(&mut self, x: i32, y: i32) {
        let max = self.max_scroll();
        self.offset = Offset::new(x.clamp(0, max.x), y.clamp(0, max.y));
    }

    /// Scroll by a relative delta, clamping to valid range.
    pub fn scroll_by(&mut self, dx: i32, dy: i32) {
        self.scroll_to(self.offset.x.saturating_add(dx), self.offset.y.saturating_add(dy));
    }

    /// Whether the content is taller than the viewport.
    pub fn is_scrollable_y(&self) -> bool {
        self.content_size.height > self.viewport_size.height
    }

    /// The currently visible rect, in content coordinates.
    pub fn visible_rect(&self) -> Rect {
        Rect::from_origin(self.offset, self.viewport_size)
    }

    /// Scroll the least amount that brings rows `top..bottom` (content
    /// coordinates) into view. A span taller than the viewport shows its top.
    pub fn reveal(&mut self, top: i32, bottom: i32) {
        let view_top = self.offset.y;
        let view_bottom = view_top + self.viewport_size.height;
        if top < view_top || bottom - top > self.viewport_size.height {
            self.scroll_to(self.offset.x, top);
        } else if bottom > view_bottom {
            self.scroll_to(self.offset.x, bottom - self.viewport_size.height);
        }
    }

    /// Vertical scroll progress as a fraction in `[0.0, 1.0]`.
    ///
    /// Returns 0.0 if not scrollable.
    pub fn scroll_percent_y(&self) -> f32 {
        let max = self.max_scroll().y;
        if max <= 0 {
            0.0
        } else {
            self.offset.y as f32 / max as f32
        }
    }

    /// Update both sizes and re-clamp the offset.
    pub fn resize(&mut self, content_size: Size, viewport_size: Size) {
        self.content_size = content_size;
        self.viewport_size = viewport_size;
        self.scroll_to(self.offset.x, self.offset.y);
    }
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::new(Size::ZERO, Size::ZERO)
    }
}

// ---------------------------------------------------------------------------
// ScrollbarState
// ---------------------------------------------------------------------------

/// Data needed to render a vertical scrollbar.
///
/// Both `thumb_position` and `thumb_size` are in the range `[0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollbarState {
    /// Position of the thumb as a fraction (0.0 = top, 1.0 = bottom).
    pub thumb_position: f32,
    /// Size of the thumb as a fraction of the track (viewport / content ratio).
    pub thumb_size: f32,
}

impl ScrollbarState {
    pub fn from_scroll_state(state: &ScrollState) -> Self {
        let content = state.content_size.height;
        let viewport = state.viewport_size.height;
        if content <= 0 || viewport <= 0 {
            return ScrollbarState {
                thumb_position: 0.0,
                thumb_size: 1.0,
            };
        }

        let thumb_size = (viewport as f32 / content as f32).clamp(0.0, 1.0);
        ScrollbarState {
            thumb_position: state.scroll_percent_y().clamp(0.0, 1.0),
            thumb_size,
        }
    }

    /// Thumb start row and length on a track of `track` cells.
    pub fn thumb_cells(&self, track: i32) -> (i32, i32) {
        if track <= 0 {
            return (0, 0);
        }
        let len = ((self.thumb_size * track as f32).round() as i32).clamp(1, track);
        let start = (self.thumb_position * (track - len) as f32).round() as i32;
        (start.clamp(0, track - len), len)
    }
}

// ---------------------------------------------------------------------------
// ScrollPanel
// ---------------------------------------------------------------------------

pub const SCROLLBAR_TRACK_KEY: &str = "scrollbar.track";
pub const SCROLLBAR_THUMB_KEY: &str = "scrollbar.thumb";

/// A vertical viewport over content of any height.
///
/// The last column holds the scrollbar. The panel is a managed focus scope
/// that does not wrap: Tab moves through its content and then leaves. When
/// focus moves to a descendant outside the viewport, the panel scrolls it
/// into view.
#[derive(Debug, Clone)]
pub struct ScrollPanel {
    state: ScrollState,
    wheel_step: i32,
    last_focus: Option<NodeId>,
}

impl ScrollPanel {
    pub fn new() -> Self {
        Self { state: ScrollState::default(), wheel_step: 3, last_focus: None }
    }

    /// Rows moved per wheel notch (builder).
    pub fn wheel_step(mut self, rows: i32) -> Self {
        self.wheel_step = rows.max(1);
        self
    }

    pub fn state(&self) -> &ScrollState {
        &self.state
    }

    pub fn offset(&self) -> i32 {
        self.state.offset.y
    }

    /// Scroll to row `y`. Use with [`NodeTree::update`] so the content is
    /// re-laid out.
    pub fn scroll_to(&mut self, y: i32) {
        self.state.scroll_to(0, y);
    }

    fn viewport(bounds: Rect) -> Rect {
        Rect::new(bounds.x, bounds.y, bounds.width - 1, bounds.height)
    }

    /// Scroll by `dy` rows, reporting whether the offset moved.
    fn scroll_by(&mut self, cx: &mut EventCx<'_>, dy: i32) -> bool {
        let before = self.state.offset;
        self.state.scroll_by(0, dy);
        let moved = self.state.offset != before;
        if moved {
            cx.mark_layout_dirty();
        }
        moved
    }
}

impl Default for ScrollPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn focused_descendant(tree: &NodeTree, id: NodeId) -> Option<NodeId> {
    tree.walk_depth_first(id)
        .into_iter()
        .skip(1)
        .find(|&n| tree.state(n).is_some_and(|s| s.focused))
}

impl Node for ScrollPanel {
    fn kind(&self) -> &str {
        "scroll"
    }

    fn measure(
        &mut self,
        cx: &mut LayoutCx<'_>,
        constraints: Constraints,
    ) -> Result<Size, NodeFault> {
        let max_width = constraints.max_size().width;
        let inner_width = if max_width == UNBOUNDED { UNBOUNDED } else { (max_width - 1).max(0) };
        let inner = Constraints::new(0, inner_width, 0, UNBOUNDED);
        let mut size = Size::ZERO;
        for child in cx.visible_children() {
            let child_size = cx.measure(child, inner)?;
            size.width = size.width.max(child_size.width);
            size.height = size.height.max(child_size.height);
        }
        Ok(constraints.constrain(Size::new(size.width.saturating_add(1), size.height)))
    }

    fn arrange(&mut self, cx: &mut LayoutCx<'_>, rect: Rect) -> Result<(), NodeFault> {
        let viewport = Self::viewport(rect);
        let children = cx.visible_children();
        let width = viewport.width.max(0);
        let mut content_height = 0;
        for &child in &children {
            let size = cx.measure(child, Constraints::new(width, width, 0, UNBOUNDED))?;
            content_height = content_height.max(size.height);
        }
        self.state.resize(Size::new(width, content_height), viewport.size());

        let place = |cx: &mut LayoutCx<'_>, offset: i32| -> Result<(), NodeFault> {
            let content = Rect::new(viewport.x, viewport.y - offset, width, content_height);
            for &child in &children {
                cx.arrange(child, content)?;
            }
            Ok(())
        };
        place(cx, self.state.offset.y)?;

        let Some(me) = cx.node() else { return Ok(()) };
        let focus = focused_descendant(cx.tree(), me);
        if focus != self.last_focus {
            self.last_focus = focus;
            if let Some(bounds) = focus.and_then(|id| cx.tree().bounds(id)) {
                let top = bounds.y - viewport.y + self.state.offset.y;
                let before = self.state.offset;
                self.state.reveal(top, top + bounds.height);
                if self.state.offset != before {
                    place(cx, self.state.offset.y)?;
                }
            }
        }
        Ok(())
    }

    fn render(&mut self, cx: &mut RenderCx<'_>) -> Result<(), RenderError> {
        let bounds = cx.bounds();
        if let Some(region) = self.clip_region(bounds) {
            cx.with_clip(region, |cx| {
                for child in cx.children() {
                    cx.render_child(child)?;
                }
                Ok::<(), RenderError>(())
            })?;
        }

        if !self.state.is_scrollable_y() || bounds.width < 1 {
            return Ok(());
        }
        let column = bounds.right() - 1;
        let scrollbar = ScrollbarState::from_scroll_state(&self.state);
        let (start, len) = scrollbar.thumb_cells(bounds.height);
        let mut track = Style { dim: true, ..cx.ambient() };
        let mut thumb = cx.ambient();
        if let Some(color) = cx.theme().color(SCROLLBAR_TRACK_KEY) {
            track.fg = Some(color);
        }
        if let Some(color) = cx.theme().color(SCROLLBAR_THUMB_KEY) {
            thumb.fg = Some(color);
        }
        for row in 0..bounds.height {
            if (start..start + len).contains(&row) {
                cx.draw_styled(column, bounds.y + row, "█", thumb);
            } else {
                cx.draw_styled(column, bounds.y + row, "│", track);
            }
        }
        Ok(())
    }

    fn focus_scope(&self) -> FocusScope {
        FocusScope::Managed { wrap: false }
    }

    fn clip_region(&self, bounds: Rect) -> Option<ClipRegion> {
        Some(ClipRegion::clip(Self::viewport(bounds)))
    }

    fn on_key(&mut self, cx: &mut EventCx<'_>, key: &KeyEvent) -> bool {
        if !key.modifiers.is_empty() {
            return false;
        }
        let page = self.state.viewport_size.height.max(1);
        match key.code {
            Key::PageDown => self.scroll_by(cx, page),
            Key::PageUp => self.scroll_by(cx, -page),
            Key::Home => self.scroll_by(cx, i32::MIN / 2),
            Key::End => self.scroll_by(cx, i32::MAX / 2),
            _ => false,
        }
    }

    fn on_wheel(&mut self, cx: &mut EventCx<'_>, direction: WheelDirection) -> bool {
        let delta = direction.vertical_delta();
        if delta == 0 || !self.state.is_scrollable_y() {
            return false;
        }
        self.scroll_by(cx, delta * self.wheel_step);
        true
    }

    fn on_mouse_down(
        &mut self,
        cx: &mut EventCx<'_>,
        event: &MouseEvent,
    ) -> Option<Box<dyn DragHandler>> {
        let bounds = cx.bounds();
        let at = event.position();
        if !self.state.is_scrollable_y() || at.x != bounds.right() - 1 {
            return None;
        }
        let (_, thumb) = ScrollbarState::from_scroll_state(&self.state).thumb_cells(bounds.height);
        Some(Box::new(ThumbDrag {
            panel: cx.node(),
            start: self.state.offset.y,
            rows_per_cell: self.state.max_scroll().y as f32 / (bounds.height - thumb).max(1) as f32,
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Dragging the scrollbar thumb.
struct ThumbDrag {
    panel: NodeId,
    start: i32,
    rows_per_cell: f32,
}

impl DragHandler for ThumbDrag {
    fn on_move(&mut self, tree: &mut NodeTree, delta: Offset) {
        let target = self.start + (delta.y as f32 * self.rows_per_cell).round() as i32;
        tree.update::<ScrollPanel, _>(self.panel, |panel| panel.scroll_to(target));
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Label, Stack};

    // -----------------------------------------------------------------------
    // ScrollState
    // -----------------------------------------------------------------------

    #[test]
    fn max_scroll_normal() {
        let state = ScrollState::new(Size::new(100, 200), Size::new(40, 30));
        assert_eq!(state.max_scroll(), Offset::new(60, 170));
    }

    #[test]
    fn max_scroll_content_smaller() {
        let state = ScrollState::new(Size::new(10, 10), Size::new(40, 30));
        assert_eq!(state.max_scroll(), Offset::ZERO);
    }

    #[test]
    fn scroll_to_clamps() {
        let mut state = ScrollState::new(Size::new(100, 200), Size::new(40, 30));
        state.scroll_to(999, 999);
        assert_eq!(state.offset, Offset::new(60, 170));
        state.scroll_to(-10, -5);
        assert_eq!(state.offset, Offset::ZERO);
    }

    #[test]
    fn scroll_by_clamps() {
        let mut state = ScrollState::new(Size::new(100, 200), Size::new(40, 30));
        state.scroll_to(30, 50);
        state.scroll_by(-10, -20);
        assert_eq!(state.offset, Offset::new(20, 30));
        state.scroll_by(0, i32::MAX);
        assert_eq!(state.offset.y, 170);
    }

    #[test]
    fn visible_rect_scrolled() {
        let mut state = ScrollState::new(Size::new(100, 200), Size::new(40, 30));
        state.scroll_to(10, 25);
        assert_eq!(state.visible_rect(), Rect::new(10, 25, 40, 30));
    }

    #[test]
    fn reveal_scrolls_minimally() {
        let mut state = ScrollState::new(Size::new(10, 100), Size::new(10, 10));
        state.reveal(15, 16);
        assert_eq!(state.offset.y, 6);
        state.reveal(8, 9);
        assert_eq!(state.offset.y, 6);
        state.reveal(2, 3);
        assert_eq!(state.offset.y, 2);
    }

    #[test]
    fn resize_reclamps() {
        let mut state = ScrollState::new(Size::new(100, 200), Size::new(40, 30));
        state.scroll_to(50, 150);
        state.resize(Size::new(50, 50), Size::new(40, 30));
        assert_eq!(state.offset, Offset::new(10, 20));
    }

    // -----------------------------------------------------------------------
    // ScrollbarState
    // -----------------------------------------------------------------------

    #[test]
    fn scrollbar_halfway() {
        let mut state = ScrollState::new(Size::new(40, 200), Size::new(40, 30));
        state.scroll_to(0, 85);
        let bar = ScrollbarState::from_scroll_state(&state);
        assert!((bar.thumb_position - 0.5).abs() < f32::EPSILON);
        assert!((bar.thumb_size - 30.0 / 200.0).abs() < f32::EPSILON);
    }

    #[test]
    fn scrollbar_zero_content() {
        let state = ScrollState::new(Size::ZERO, Size::new(40, 30));
        let bar = ScrollbarState::from_scroll_state(&state);
        assert_eq!(bar.thumb_position, 0.0);
        assert_eq!(bar.thumb_size, 1.0);
    }

    #[test]
    fn thumb_cells_in_track() {
        let bar = ScrollbarState { thumb_position: 1.0, thumb_size: 0.25 };
        assert_eq!(bar.thumb_cells(8), (6, 2));
        let tiny = ScrollbarState { thumb_position: 0.0, thumb_size: 0.01 };
        assert_eq!(tiny.thumb_cells(8), (0, 1));
    }

    // -----------------------------------------------------------------------
    // ScrollPanel
    // -----------------------------------------------------------------------

    fn panel_with_rows(rows: usize) -> (NodeTree, NodeId, Vec<NodeId>) {
        let mut tree = NodeTree::new();
        let panel = tree.insert(ScrollPanel::new());
        let column = tree.insert_child(panel, Stack::vertical()).unwrap();
        let labels = (0..rows)
            .map(|i| tree.insert_child(column, Label::new(format!("row {i}")).focusable()).unwrap())
            .collect();
        (tree, panel, labels)
    }

    #[test]
    fn content_shifts_by_offset() {
        let (mut tree, panel, labels) = panel_with_rows(10);
        LayoutCx::new(&mut tree).arrange(panel, Rect::new(0, 0, 8, 4)).unwrap();
        assert_eq!(tree.bounds(labels[0]), Some(Rect::new(0, 0, 7, 1)));

        tree.update::<ScrollPanel, _>(panel, |p| p.scroll_to(3));
        LayoutCx::new(&mut tree).arrange(panel, Rect::new(0, 0, 8, 4)).unwrap();
        assert_eq!(tree.bounds(labels[3]), Some(Rect::new(0, 0, 7, 1)));
        assert_eq!(tree.downcast_ref::<ScrollPanel>(panel).unwrap().state().max_scroll().y, 6);
    }

    #[test]
    fn focused_row_scrolls_into_view() {
        let (mut tree, panel, labels) = panel_with_rows(10);
        LayoutCx::new(&mut tree).arrange(panel, Rect::new(0, 0, 8, 4)).unwrap();
        tree.state_mut(labels[7]).unwrap().focused = true;
        LayoutCx::new(&mut tree).arrange(panel, Rect::new(0, 0, 8, 4)).unwrap();

        assert_eq!(tree.downcast_ref::<ScrollPanel>(panel).unwrap().offset(), 4);
        assert_eq!(tree.bounds(labels[7]), Some(Rect::new(0, 3, 7, 1)));
    }

    #[test]
    fn thumb_drag_scrolls() {
        let (mut tree, panel, _labels) = panel_with_rows(12);
        LayoutCx::new(&mut tree).arrange(panel, Rect::new(0, 0, 8, 4)).unwrap();
        let mut drag = ThumbDrag { panel, start: 0, rows_per_cell: 8.0 / 3.0 };
        drag.on_move(&mut tree, Offset::new(0, 3));
        assert_eq!(tree.downcast_ref::<ScrollPanel>(panel).unwrap().offset(), 8);
    }
}
