//! Off-screen cell grids with sub-cell glyphs, composited and flattened to
//! ANSI lines.

pub mod cell;

pub use cell::{Glyph, Orientation, SurfaceCell, BRAILLE_BASE, DOT_BITS};

use unicode_segmentation::UnicodeSegmentation;

use crate::ansi::{grapheme_width, Color, Style, RESET};
use crate::geometry::Offset;

/// A 2-D grid of [`SurfaceCell`]s, initially transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: usize,
    height: usize,
    cells: Vec<SurfaceCell>,
}

impl Surface {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, cells: vec![SurfaceCell::default(); width * height] }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&SurfaceCell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut SurfaceCell> {
        self.index(x, y).map(|i| &mut self.cells[i])
    }

    /// Replace a cell. Out-of-range writes are ignored.
    pub fn set(&mut self, x: i32, y: i32, cell: SurfaceCell) {
        if let Some(slot) = self.get_mut(x, y) {
            *slot = cell;
        }
    }

    /// Reset every cell to transparent.
    pub fn clear(&mut self) {
        self.cells.fill(SurfaceCell::default());
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    /// Light one braille dot. `(px, py)` is in dot coordinates: two dots per
    /// column, four per row.
    pub fn set_dot(&mut self, px: i32, py: i32, fg: Option<Color>) {
        if px < 0 || py < 0 {
            return;
        }
        let bit = 1u8 << DOT_BITS[(px % 2) as usize][(py % 4) as usize];
        if let Some(cell) = self.get_mut(px / 2, py / 4) {
            cell.glyph = match cell.glyph {
                Glyph::Braille(bits) => Glyph::Braille(bits | bit),
                _ => Glyph::Braille(bit),
            };
            if fg.is_some() {
                cell.fg = fg;
            }
        }
    }

    /// Draw a horizontal bar `eighths` long (in eighths of a cell) starting
    /// at `(x, y)`.
    pub fn hbar(&mut self, x: i32, y: i32, eighths: u32, fg: Option<Color>) {
        let full = eighths / 8;
        let partial = (eighths % 8) as u8;
        let mut col = x;
        for _ in 0..full {
            self.set(col, y, block(8, Orientation::Horizontal, fg));
            col += 1;
        }
        if partial > 0 {
            self.set(col, y, block(partial, Orientation::Horizontal, fg));
        }
    }

    /// Draw a vertical bar growing upward from the bottom of row `y`.
    pub fn vbar(&mut self, x: i32, y: i32, eighths: u32, fg: Option<Color>) {
        let full = eighths / 8;
        let partial = (eighths % 8) as u8;
        let mut row = y;
        for _ in 0..full {
            self.set(x, row, block(8, Orientation::Vertical, fg));
            row -= 1;
        }
        if partial > 0 {
            self.set(x, row, block(partial, Orientation::Vertical, fg));
        }
    }

    /// Write plain text one grapheme per cell. Wide graphemes take their
    /// cell and blank the next one.
    pub fn put_text(&mut self, x: i32, y: i32, text: &str, fg: Option<Color>) {
        let mut col = x;
        for grapheme in text.graphemes(true) {
            let width = grapheme_width(grapheme) as i32;
            if width == 0 {
                continue;
            }
            self.set(col, y, SurfaceCell::text(grapheme, fg));
            if width == 2 {
                self.set(col + 1, y, SurfaceCell::text("", fg));
            }
            col += width;
        }
    }

    // -----------------------------------------------------------------------
    // Composition
    // -----------------------------------------------------------------------

    /// Lay `src` over this surface with its top-left at `offset`.
    ///
    /// Transparent source cells leave the destination untouched; see
    /// [`SurfaceCell::overlay`] for how drawn cells merge.
    pub fn composite(&mut self, src: &Surface, offset: Offset) {
        for sy in 0..src.height {
            for sx in 0..src.width {
                let src_cell = &src.cells[sy * src.width + sx];
                if src_cell.is_transparent() {
                    continue;
                }
                let (dx, dy) = (offset.x + sx as i32, offset.y + sy as i32);
                if let Some(i) = self.index(dx, dy) {
                    self.cells[i].overlay(src_cell);
                }
            }
        }
    }

    /// Flatten into one ANSI string per row.
    ///
    /// Transparent cells become unstyled spaces. Each styled run is closed
    /// with a reset so lines can be drawn independently.
    pub fn to_lines(&self, sub_cell: bool) -> Vec<String> {
        (0..self.height).map(|y| encode(self.row(y), sub_cell)).collect()
    }

    /// The drawn stretches of every row, transparent cells left out.
    ///
    /// Drawing each run at its own column lets whatever is beneath the
    /// surface show through the gaps.
    pub fn runs(&self, sub_cell: bool) -> Vec<SurfaceRun> {
        let mut runs = Vec::new();
        for y in 0..self.height {
            let row = self.row(y);
            let mut x = 0;
            while x < row.len() {
                if row[x].is_transparent() {
                    x += 1;
                    continue;
                }
                let start = x;
                while x < row.len() && !row[x].is_transparent() {
                    x += 1;
                }
                runs.push(SurfaceRun { x: start, y, text: encode(&row[start..x], sub_cell) });
            }
        }
        runs
    }

    fn row(&self, y: usize) -> &[SurfaceCell] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }
}

/// A contiguous run of drawn cells, flattened to ANSI text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceRun {
    /// Column of the first cell, relative to the surface.
    pub x: usize,
    pub y: usize,
    pub text: String,
}

fn encode(cells: &[SurfaceCell], sub_cell: bool) -> String {
    let mut line = String::new();
    let mut current = Style::new();
    for cell in cells {
        let style = if cell.is_transparent() {
            Style::new()
        } else {
            Style { fg: cell.fg, bg: cell.bg, ..Style::new() }
        };
        if style != current {
            if current != Style::new() {
                line.push_str(RESET);
            }
            line.push_str(&style.to_sgr());
            current = style;
        }
        line.push_str(&cell.glyph.symbol(sub_cell));
    }
    if current != Style::new() {
        line.push_str(RESET);
    }
    line
}

fn block(eighths: u8, orientation: Orientation, fg: Option<Color>) -> SurfaceCell {
    SurfaceCell { glyph: Glyph::Block { eighths, orientation }, fg, bg: None }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::visible_width;

    // ── Drawing ──────────────────────────────────────────────────────

    #[test]
    fn dots_map_to_cells() {
        let mut s = Surface::new(2, 1);
        s.set_dot(0, 0, None);
        s.set_dot(1, 3, None);
        s.set_dot(2, 0, None);
        assert_eq!(s.get(0, 0).unwrap().glyph, Glyph::Braille(0b1000_0001));
        assert_eq!(s.get(1, 0).unwrap().glyph, Glyph::Braille(0b0000_0001));
    }

    #[test]
    fn dots_out_of_range_are_ignored() {
        let mut s = Surface::new(1, 1);
        s.set_dot(-1, 0, None);
        s.set_dot(2, 0, None);
        s.set_dot(0, 4, None);
        assert!(s.get(0, 0).unwrap().is_transparent());
    }

    #[test]
    fn hbar_fractional_length() {
        let mut s = Surface::new(4, 1);
        s.hbar(0, 0, 19, None);
        assert_eq!(s.to_lines(true), vec!["██▍ ".to_owned()]);
        assert_eq!(s.to_lines(false), vec!["██  ".to_owned()]);
    }

    #[test]
    fn vbar_grows_upward() {
        let mut s = Surface::new(1, 3);
        s.vbar(0, 2, 12, None);
        assert_eq!(s.to_lines(true), vec![" ".to_owned(), "▄".to_owned(), "█".to_owned()]);
    }

    #[test]
    fn wide_text_blanks_continuation() {
        let mut s = Surface::new(3, 1);
        s.put_text(0, 0, "日a", None);
        assert_eq!(s.to_lines(true), vec!["日a".to_owned()]);
    }

    // ── Composition ──────────────────────────────────────────────────

    #[test]
    fn composite_at_offset_skips_transparent() {
        let mut dst = Surface::new(3, 1);
        dst.put_text(0, 0, "abc", None);
        let mut src = Surface::new(2, 1);
        src.put_text(1, 0, "Z", None);
        dst.composite(&src, Offset::new(1, 0));
        assert_eq!(dst.to_lines(true), vec!["abZ".to_owned()]);
    }

    #[test]
    fn composite_braille_is_order_independent() {
        let mut a = Surface::new(1, 1);
        a.set_dot(0, 0, Some(Color::RED));
        let mut b = Surface::new(1, 1);
        b.set_dot(1, 1, Some(Color::BLUE));

        let mut ab = a.clone();
        ab.composite(&b, Offset::ZERO);
        let mut ba = b.clone();
        ba.composite(&a, Offset::ZERO);
        assert_eq!(ab, ba);
        assert_eq!(ab.get(0, 0).unwrap().fg, Some(Color::Rgb(127, 0, 127)));
    }

    #[test]
    fn composite_clips_to_destination() {
        let mut dst = Surface::new(2, 2);
        let mut src = Surface::new(2, 2);
        src.put_text(0, 0, "xy", None);
        dst.composite(&src, Offset::new(1, 1));
        dst.composite(&src, Offset::new(-5, 0));
        assert_eq!(dst.get(1, 1).unwrap().glyph, Glyph::Text("x".into()));
        assert!(dst.get(0, 0).unwrap().is_transparent());
    }

    // ── Flattening ───────────────────────────────────────────────────

    #[test]
    fn styled_runs_are_reset() {
        let mut s = Surface::new(3, 1);
        s.put_text(0, 0, "ab", Some(Color::RED));
        let line = &s.to_lines(true)[0];
        assert_eq!(line, "\x1b[91mab\x1b[0m ");
        assert_eq!(visible_width(line), 3);
    }

    #[test]
    fn runs_leave_out_transparent_cells() {
        let mut s = Surface::new(6, 2);
        s.put_text(1, 0, "ab", None);
        s.put_text(4, 0, "c", Some(Color::RED));
        s.set_dot(0, 4, None);
        let runs = s.runs(true);
        assert_eq!(
            runs,
            vec![
                SurfaceRun { x: 1, y: 0, text: "ab".to_owned() },
                SurfaceRun { x: 4, y: 0, text: "\x1b[91mc\x1b[0m".to_owned() },
                SurfaceRun { x: 0, y: 1, text: "\u{2801}".to_owned() },
            ]
        );
    }

    #[test]
    fn blank_surface_has_no_runs() {
        assert!(Surface::new(4, 3).runs(true).is_empty());
    }
}
