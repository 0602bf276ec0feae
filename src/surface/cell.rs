//! Surface cells and their glyphs.

use crate::ansi::Color;

/// Base code point of the braille block.
pub const BRAILLE_BASE: u32 = 0x2800;

/// Bit for the dot at `[column][row]` inside a 2×4 braille cell.
pub const DOT_BITS: [[u8; 4]; 2] = [[0, 1, 2, 6], [3, 4, 5, 7]];

const HORIZONTAL_EIGHTHS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];
const VERTICAL_EIGHTHS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Direction a partial block grows in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Grows from the left edge (horizontal bars).
    Horizontal,
    /// Grows from the bottom edge (vertical bars).
    Vertical,
}

/// What a surface cell shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Glyph {
    /// Nothing; whatever is below shows through.
    #[default]
    Transparent,
    /// One grapheme cluster.
    Text(String),
    /// A braille pattern, one bit per dot.
    Braille(u8),
    /// A partial block covering `eighths` of the cell (0..=8).
    Block { eighths: u8, orientation: Orientation },
}

impl Glyph {
    pub fn is_transparent(&self) -> bool {
        matches!(self, Glyph::Transparent)
    }

    /// The text this glyph flattens to.
    ///
    /// Without sub-cell graphics, any lit braille pattern becomes a full
    /// block and partial blocks round to full or empty.
    pub fn symbol(&self, sub_cell: bool) -> String {
        match self {
            Glyph::Transparent => " ".to_owned(),
            Glyph::Text(s) => s.clone(),
            Glyph::Braille(bits) if !sub_cell => {
                if *bits == 0 { " ".to_owned() } else { "█".to_owned() }
            }
            Glyph::Braille(bits) => char::from_u32(BRAILLE_BASE + u32::from(*bits))
                .unwrap_or(' ')
                .to_string(),
            Glyph::Block { eighths, .. } if !sub_cell => {
                if *eighths >= 4 { "█".to_owned() } else { " ".to_owned() }
            }
            Glyph::Block { eighths, orientation } => {
                let table = match orientation {
                    Orientation::Horizontal => &HORIZONTAL_EIGHTHS,
                    Orientation::Vertical => &VERTICAL_EIGHTHS,
                };
                table[usize::from((*eighths).min(8))].to_string()
            }
        }
    }
}

/// One cell of a [`Surface`](super::Surface).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SurfaceCell {
    pub glyph: Glyph,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
}

impl SurfaceCell {
    pub fn text(symbol: impl Into<String>, fg: Option<Color>) -> Self {
        Self { glyph: Glyph::Text(symbol.into()), fg, bg: None }
    }

    pub fn is_transparent(&self) -> bool {
        self.glyph.is_transparent() && self.bg.is_none()
    }

    /// Lay `src` over this cell.
    ///
    /// A transparent source leaves the cell alone. Braille over braille
    /// unions the dots; otherwise the source glyph replaces this one. When
    /// both cells carry a glyph and an explicit foreground, the foregrounds
    /// are averaged.
    pub fn overlay(&mut self, src: &SurfaceCell) {
        if src.is_transparent() {
            return;
        }
        if src.glyph.is_transparent() {
            // Background-only source: tint, keep the glyph.
            self.bg = src.bg;
            return;
        }

        let both_drawn = !self.glyph.is_transparent();
        self.fg = match (self.fg, src.fg) {
            (Some(below), Some(above)) if both_drawn => Some(below.average(above)),
            (below, above) => above.or(below),
        };
        self.bg = src.bg.or(self.bg);

        self.glyph = match (&self.glyph, &src.glyph) {
            (Glyph::Braille(below), Glyph::Braille(above)) => Glyph::Braille(below | above),
            (_, glyph) => glyph.clone(),
        };
    }
}
