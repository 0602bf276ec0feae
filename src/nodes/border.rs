//! Box-drawn frame around a single child.

use std::any::Any;

use crate::ansi::{truncate, visible_width, Style};
use crate::clip::ClipRegion;
use crate::error::{NodeFault, RenderError};
use crate::geometry::{Rect, Size, Spacing};
use crate::layout::{Constraints, LayoutCx};
use crate::node::Node;
use crate::render::RenderCx;
use crate::tree::{NodeId, NodeTree};

/// Glyphs of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderGlyphs {
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub horizontal: char,
    pub vertical: char,
}

impl BorderGlyphs {
    pub const SQUARE: BorderGlyphs = BorderGlyphs {
        top_left: '┌',
        top_right: '┐',
        bottom_left: '└',
        bottom_right: '┘',
        horizontal: '─',
        vertical: '│',
    };

    pub const ROUNDED: BorderGlyphs = BorderGlyphs {
        top_left: '╭',
        top_right: '╮',
        bottom_left: '╰',
        bottom_right: '╯',
        ..Self::SQUARE
    };
}

impl Default for BorderGlyphs {
    fn default() -> Self {
        Self::SQUARE
    }
}

/// Theme key for the frame color.
pub const BORDER_KEY: &str = "border";
/// Theme key for the frame color while focus is inside.
pub const BORDER_FOCUS_KEY: &str = "border.focus";

/// A one-cell frame with an optional title. Its children are laid out in,
/// and clipped to, the inner rect.
#[derive(Debug, Clone, Default)]
pub struct Border {
    title: Option<String>,
    glyphs: BorderGlyphs,
}

impl Border {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn glyphs(mut self, glyphs: BorderGlyphs) -> Self {
        self.glyphs = glyphs;
        self
    }

    fn top_line(&self, width: usize, reset: &str) -> String {
        let inner = width.saturating_sub(2);
        let h = self.glyphs.horizontal;
        let mut line = String::new();
        line.push(self.glyphs.top_left);
        let title = self
            .title
            .as_deref()
            .map(|t| truncate(t, inner, reset))
            .unwrap_or_default();
        let used = visible_width(&title);
        line.push_str(&title);
        line.extend(std::iter::repeat(h).take(inner.saturating_sub(used)));
        line.push(self.glyphs.top_right);
        line
    }
}

fn has_focus_within(tree: &NodeTree, id: NodeId) -> bool {
    tree.walk_depth_first(id)
        .into_iter()
        .any(|n| tree.state(n).is_some_and(|s| s.focused))
}

impl Node for Border {
    fn kind(&self) -> &str {
        "border"
    }

    fn measure(
        &mut self,
        cx: &mut LayoutCx<'_>,
        constraints: Constraints,
    ) -> Result<Size, NodeFault> {
        let inner = constraints.deflate(Spacing::all(1));
        let mut size = Size::ZERO;
        for child in cx.visible_children() {
            let child_size = cx.measure(child, inner)?;
            size.width = size.width.max(child_size.width);
            size.height = size.height.max(child_size.height);
        }
        let title = self.title.as_deref().map_or(0, visible_width);
        let width = size.width.max(i32::try_from(title).unwrap_or(i32::MAX));
        Ok(constraints.constrain(Size::new(width.saturating_add(2), size.height.saturating_add(2))))
    }

    fn arrange(&mut self, cx: &mut LayoutCx<'_>, rect: Rect) -> Result<(), NodeFault> {
        let inner = rect.shrink(Spacing::all(1));
        for child in cx.children() {
            cx.arrange(child, inner)?;
        }
        Ok(())
    }

    fn render(&mut self, cx: &mut RenderCx<'_>) -> Result<(), RenderError> {
        let bounds = cx.bounds();
        if bounds.width >= 2 && bounds.height >= 2 {
            let focused = cx.node().is_some_and(|id| has_focus_within(cx.tree(), id));
            let key = if focused { BORDER_FOCUS_KEY } else { BORDER_KEY };
            let mut style: Style = cx.ambient();
            if let Some(color) = cx.theme().color(key).or_else(|| cx.theme().color(BORDER_KEY)) {
                style.fg = Some(color);
            }

            let width = bounds.width as usize;
            let reset = cx.theme().reset_codes();
            let vertical = self.glyphs.vertical.to_string();
            let mut bottom = String::new();
            bottom.push(self.glyphs.bottom_left);
            bottom.extend(std::iter::repeat(self.glyphs.horizontal).take(width - 2));
            bottom.push(self.glyphs.bottom_right);

            cx.draw_styled(bounds.x, bounds.y, &self.top_line(width, &reset), style);
            for y in bounds.y + 1..bounds.bottom() - 1 {
                cx.draw_styled(bounds.x, y, &vertical, style);
                cx.draw_styled(bounds.right() - 1, y, &vertical, style);
            }
            cx.draw_styled(bounds.x, bounds.bottom() - 1, &bottom, style);
        }

        let Some(region) = self.clip_region(bounds) else {
            return Ok(());
        };
        cx.with_clip(region, |cx| {
            for child in cx.children() {
                cx.render_child(child)?;
            }
            Ok(())
        })
    }

    fn clip_region(&self, bounds: Rect) -> Option<ClipRegion> {
        Some(ClipRegion::clip(bounds.shrink(Spacing::all(1))))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
