//! ANSI-aware text handling: tokenizing, measuring, slicing and styling.
//!
//! Every string that reaches the render context may carry embedded escape
//! sequences. The functions here treat those sequences as zero-width atoms
//! that are never split.

pub mod slice;
pub mod style;
pub mod token;

pub use slice::{grapheme_width, slice_columns, truncate, visible_width};
pub use style::{parse_color, sgr_params, Color, Style};
pub use token::{segments, strip, Segment};

/// The SGR sequence that returns the terminal to its default style.
pub const RESET: &str = "\x1b[0m";
