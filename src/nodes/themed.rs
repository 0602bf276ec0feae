//! Sets the ambient style for a subtree from theme keys.

use std::any::Any;

use crate::ansi::Style;
use crate::error::RenderError;
use crate::node::Node;
use crate::render::RenderCx;

/// Paints its children with foreground and background colors looked up in
/// the theme. With a background the whole rect is filled first.
///
/// The ambient style a child sees is part of its cache key, so switching
/// themes repaints everything below.
#[derive(Debug, Clone, Default)]
pub struct Themed {
    fg_key: Option<String>,
    bg_key: Option<String>,
    bold: bool,
}

impl Themed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fg(mut self, key: impl Into<String>) -> Self {
        self.fg_key = Some(key.into());
        self
    }

    pub fn bg(mut self, key: impl Into<String>) -> Self {
        self.bg_key = Some(key.into());
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn style(&self, cx: &RenderCx<'_>) -> Style {
        let mut style = cx.ambient();
        let theme = cx.theme();
        if let Some(color) = self.fg_key.as_deref().and_then(|k| theme.color(k)) {
            style.fg = Some(color);
        }
        if let Some(color) = self.bg_key.as_deref().and_then(|k| theme.color(k)) {
            style.bg = Some(color);
        }
        style.bold |= self.bold;
        style
    }
}

impl Node for Themed {
    fn kind(&self) -> &str {
        "themed"
    }

    fn render(&mut self, cx: &mut RenderCx<'_>) -> Result<(), RenderError> {
        let style = self.style(cx);
        let fill = self.bg_key.is_some();
        cx.with_ambient(style, |cx| {
            if fill {
                let bounds = cx.bounds();
                cx.fill(bounds);
            }
            for child in cx.children() {
                cx.render_child(child)?;
            }
            Ok(())
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
