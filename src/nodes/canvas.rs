//! A leaf painted through a cell surface.

use std::any::Any;
use std::fmt;

use crate::error::{NodeFault, RenderError};
use crate::geometry::Size;
use crate::layout::{Constraints, LayoutCx};
use crate::node::Node;
use crate::render::RenderCx;
use crate::surface::Surface;

type Painter = Box<dyn FnMut(&mut Surface)>;

/// Hands a fresh [`Surface`] the size of its bounds to a painter on every
/// render, then draws the flattened result. Braille dots and bar glyphs fall
/// back to full cells when the terminal lacks sub-cell graphics.
pub struct Canvas {
    painter: Painter,
    size: Size,
}

impl Canvas {
    pub fn new(painter: impl FnMut(&mut Surface) + 'static) -> Self {
        Self { painter: Box::new(painter), size: Size::ZERO }
    }

    /// Preferred size (builder). A canvas otherwise takes the smallest size
    /// it is allowed.
    pub fn size(mut self, width: i32, height: i32) -> Self {
        self.size = Size::new(width, height);
        self
    }
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas").field("size", &self.size).finish_non_exhaustive()
    }
}

impl Node for Canvas {
    fn kind(&self) -> &str {
        "canvas"
    }

    fn measure(
        &mut self,
        _cx: &mut LayoutCx<'_>,
        constraints: Constraints,
    ) -> Result<Size, NodeFault> {
        Ok(constraints.constrain(self.size))
    }

    fn render(&mut self, cx: &mut RenderCx<'_>) -> Result<(), RenderError> {
        let bounds = cx.bounds();
        if bounds.is_empty() {
            return Ok(());
        }
        let mut surface = Surface::new(bounds.width as usize, bounds.height as usize);
        (self.painter)(&mut surface);
        cx.draw_surface(&surface, bounds.origin());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
