//! Theme lookup and terminal capabilities.
//!
//! The engine never resolves colors on its own: it asks a [`Theme`] for a
//! value by key and parses what comes back. [`MapTheme`] is a plain map,
//! enough for applications and tests that do not bring their own.

use std::collections::HashMap;

use crate::ansi::{parse_color, Color, RESET};

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

/// Opaque key to value lookup.
pub trait Theme {
    /// The raw value stored under `key`.
    fn get(&self, key: &str) -> Option<&str>;

    /// Codes that restore the inherited style after a cut. Appended when a
    /// styled string is clipped on the right.
    fn reset_codes(&self) -> String {
        RESET.to_owned()
    }

    /// The value under `key` parsed as a color.
    fn color(&self, key: &str) -> Option<Color> {
        self.get(key).and_then(parse_color)
    }
}

/// A theme backed by a `HashMap`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapTheme {
    values: HashMap<String, String>,
    reset: Option<String>,
}

impl MapTheme {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a value (builder).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Override the reset codes (builder).
    pub fn with_reset(mut self, codes: impl Into<String>) -> Self {
        self.reset = Some(codes.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

impl Theme for MapTheme {
    fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn reset_codes(&self) -> String {
        self.reset.clone().unwrap_or_else(|| RESET.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// What the terminal can display. Filled in once at startup and passed
/// through every render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities {
    /// Braille and eighth-block glyphs render correctly.
    pub sub_cell_graphics: bool,
    /// 24-bit color is supported. Otherwise RGB colors are quantized to the
    /// 256-color palette on output.
    pub true_color: bool,
}

impl Capabilities {
    /// Everything on.
    pub fn full() -> Self {
        Self { sub_cell_graphics: true, true_color: true }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
