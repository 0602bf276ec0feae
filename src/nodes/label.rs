//! Minimal leaves: text and empty space.

use std::any::Any;

use crate::ansi::{visible_width, Style};
use crate::error::{NodeFault, RenderError};
use crate::focus::FocusScope;
use crate::geometry::Size;
use crate::layout::{Constraints, LayoutCx};
use crate::node::Node;
use crate::render::RenderCx;

// ---------------------------------------------------------------------------
// Label
// ---------------------------------------------------------------------------

/// Lines of text, which may carry their own SGR codes.
///
/// Measures to its longest line by its line count. A focusable label is
/// painted reversed while it has focus.
#[derive(Debug, Clone, Default)]
pub struct Label {
    text: String,
    focusable: bool,
    style: Option<Style>,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), focusable: false, style: None }
    }

    /// Make the label a focus ring entry (builder).
    pub fn focusable(mut self) -> Self {
        self.focusable = true;
        self
    }

    /// Paint in `style` instead of the ambient style (builder).
    pub fn styled(mut self, style: Style) -> Self {
        self.style = Some(style);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text. Go through [`NodeTree::update`](crate::tree::NodeTree::update)
    /// so the change is laid out and repainted.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl Node for Label {
    fn kind(&self) -> &str {
        "label"
    }

    fn measure(
        &mut self,
        _cx: &mut LayoutCx<'_>,
        constraints: Constraints,
    ) -> Result<Size, NodeFault> {
        let mut width = 0;
        let mut height = 0;
        for line in self.text.split('\n') {
            width = width.max(visible_width(line));
            height += 1;
        }
        let width = i32::try_from(width).unwrap_or(i32::MAX);
        Ok(constraints.constrain(Size::new(width, height)))
    }

    fn render(&mut self, cx: &mut RenderCx<'_>) -> Result<(), RenderError> {
        let bounds = cx.bounds();
        let mut style = self.style.unwrap_or(cx.ambient());
        if cx.is_focused() {
            style.reverse = !style.reverse;
        }
        for (row, line) in self.text.split('\n').take(bounds.height.max(0) as usize).enumerate() {
            let text = cx.fit(line, bounds.width);
            cx.draw_styled(bounds.x, bounds.y + row as i32, &text, style);
        }
        Ok(())
    }

    fn focus_scope(&self) -> FocusScope {
        if self.focusable {
            FocusScope::Focusable
        } else {
            FocusScope::None
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Spacer
// ---------------------------------------------------------------------------

/// Takes up space and paints it in the ambient style.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spacer;

impl Spacer {
    pub fn new() -> Self {
        Self
    }
}

impl Node for Spacer {
    fn kind(&self) -> &str {
        "spacer"
    }

    fn measure(
        &mut self,
        _cx: &mut LayoutCx<'_>,
        constraints: Constraints,
    ) -> Result<Size, NodeFault> {
        Ok(constraints.min_size())
    }

    fn render(&mut self, cx: &mut RenderCx<'_>) -> Result<(), RenderError> {
        let bounds = cx.bounds();
        cx.fill(bounds);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
