//! Clip providers: a rectangle plus a mode, and ANSI-safe string clipping.

use crate::ansi::{slice_columns, visible_width, RESET};
use crate::geometry::Rect;

/// Whether a region restricts drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClipMode {
    /// Drawing outside the rect is discarded.
    #[default]
    Clip,
    /// No restriction of its own; enclosing regions still apply.
    Overflow,
}

/// Anything that can decide which cells are visible.
pub trait ClipProvider {
    /// The rectangle drawn text is held to.
    fn clip_rect(&self) -> Rect;

    fn clip_mode(&self) -> ClipMode;

    /// Codes appended when a styled string is cut on the right.
    fn reset_codes(&self) -> String {
        RESET.to_owned()
    }

    /// Whether the cell at `(x, y)` is visible.
    fn contains(&self, x: i32, y: i32) -> bool {
        match self.clip_mode() {
            ClipMode::Clip => self.clip_rect().contains(x, y),
            ClipMode::Overflow => true,
        }
    }

    /// Clip `text` drawn at `(x, y)` to the visible columns.
    ///
    /// Returns the column where the surviving text starts and the text
    /// itself, or `None` when nothing is visible.
    fn clip_string(&self, x: i32, y: i32, text: &str) -> Option<(i32, String)> {
        if self.clip_mode() == ClipMode::Overflow {
            return Some((x, text.to_owned()));
        }
        clip_to_rect(self.clip_rect(), x, y, text, &self.reset_codes())
    }
}

/// Clip `text` at `(x, y)` to `rect`, appending `reset` on a right cut.
pub fn clip_to_rect(rect: Rect, x: i32, y: i32, text: &str, reset: &str) -> Option<(i32, String)> {
    if rect.is_empty() || y < rect.y || y >= rect.bottom() {
        return None;
    }
    let width = i32::try_from(visible_width(text)).unwrap_or(i32::MAX);
    let start = (rect.x.saturating_sub(x)).max(0);
    let end = (rect.right().saturating_sub(x)).min(width);
    if start >= end {
        return None;
    }
    if start == 0 && end == width {
        return Some((x, text.to_owned()));
    }
    // Both bounds are within 0..=width here.
    let sliced = slice_columns(text, start as usize, end as usize, reset);
    Some((x + start, sliced))
}

/// A rectangle a container clips its children to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipRegion {
    pub rect: Rect,
    pub mode: ClipMode,
}

impl ClipRegion {
    /// A restricting region.
    pub fn clip(rect: Rect) -> Self {
        Self { rect, mode: ClipMode::Clip }
    }

    /// A region that lets its content overflow.
    pub fn overflow(rect: Rect) -> Self {
        Self { rect, mode: ClipMode::Overflow }
    }
}

impl ClipProvider for ClipRegion {
    fn clip_rect(&self) -> Rect {
        self.rect
    }

    fn clip_mode(&self) -> ClipMode {
        self.mode
    }
}
