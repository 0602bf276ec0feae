//! Nested clip regions active during a render pass.

use crate::geometry::Rect;

use super::region::{clip_to_rect, ClipMode, ClipProvider, ClipRegion};

/// The stack of clip regions entered on the way down the tree.
///
/// The effective rect is the screen intersected with every restricting
/// region. `Overflow` regions impose nothing themselves and defer to the
/// regions enclosing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipChain {
    screen: Rect,
    regions: Vec<ClipRegion>,
    reset: String,
}

impl ClipChain {
    pub fn new(screen: Rect, reset: impl Into<String>) -> Self {
        Self { screen, regions: Vec::new(), reset: reset.into() }
    }

    pub fn screen(&self) -> Rect {
        self.screen
    }

    /// Enter a region.
    pub fn push(&mut self, region: ClipRegion) {
        self.regions.push(region);
    }

    /// Leave the innermost region.
    pub fn pop(&mut self) -> Option<ClipRegion> {
        self.regions.pop()
    }

    /// Number of regions entered.
    pub fn depth(&self) -> usize {
        self.regions.len()
    }

    /// Drop regions back to `depth`, e.g. after an unwind skipped the pops.
    pub fn truncate(&mut self, depth: usize) {
        self.regions.truncate(depth);
    }

    /// The innermost region, if any.
    pub fn innermost(&self) -> Option<&ClipRegion> {
        self.regions.last()
    }

    /// Intersection of the screen with every restricting region.
    pub fn effective_rect(&self) -> Rect {
        self.regions
            .iter()
            .filter(|r| r.mode == ClipMode::Clip)
            .fold(self.screen, |acc, r| acc.intersection(r.rect))
    }
}

impl ClipProvider for ClipChain {
    fn clip_rect(&self) -> Rect {
        self.effective_rect()
    }

    fn clip_mode(&self) -> ClipMode {
        ClipMode::Clip
    }

    fn reset_codes(&self) -> String {
        self.reset.clone()
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        self.screen.contains(x, y) && self.regions.iter().rev().all(|r| r.contains(x, y))
    }

    fn clip_string(&self, x: i32, y: i32, text: &str) -> Option<(i32, String)> {
        clip_to_rect(self.effective_rect(), x, y, text, &self.reset)
    }
}
