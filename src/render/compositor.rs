//! The frame grid and frame-to-frame diffing.
//!
//! The `Compositor` maintains a 2D grid of `StyledCell`s representing the full
//! terminal screen. Cached draw operations are replayed into it with `draw`,
//! which interprets embedded SGR codes. The `diff` method compares two frames
//! and produces only the `CellUpdate`s needed to transition between them.

use unicode_segmentation::UnicodeSegmentation;

use crate::ansi::{grapheme_width, segments, sgr_params, Segment, Style};

// ---------------------------------------------------------------------------
// StyledCell
// ---------------------------------------------------------------------------

/// One terminal cell: a grapheme and its style.
///
/// The right half of a wide grapheme is a continuation cell holding an
/// empty symbol; the driver prints nothing for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StyledCell {
    pub symbol: String,
    pub style: Style,
}

impl StyledCell {
    /// A space with the default style.
    pub fn blank() -> Self {
        Self { symbol: " ".to_owned(), style: Style::new() }
    }

    /// A space with the given style.
    pub fn blank_styled(style: Style) -> Self {
        Self { symbol: " ".to_owned(), style }
    }

    pub fn is_continuation(&self) -> bool {
        self.symbol.is_empty()
    }
}

impl Default for StyledCell {
    fn default() -> Self {
        Self::blank()
    }
}

// ---------------------------------------------------------------------------
// CellUpdate
// ---------------------------------------------------------------------------

/// A single cell that changed between frames.
///
/// Used by the driver to emit minimal terminal escape sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub x: u16,
    pub y: u16,
    pub cell: StyledCell,
}

// ---------------------------------------------------------------------------
// Compositor
// ---------------------------------------------------------------------------

/// A full-screen cell buffer.
///
/// Each frame starts blank, has every visible draw operation replayed into it
/// in paint order, and is then diffed against the previous frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compositor {
    /// The 2D screen buffer. `screen[y][x]` is the cell at column x, row y.
    screen: Vec<Vec<StyledCell>>,
    pub width: u16,
    pub height: u16,
}

impl Compositor {
    /// Create a new compositor with a blank screen of the given dimensions.
    pub fn new(width: u16, height: u16) -> Self {
        Self { screen: Self::blank_screen(width, height), width, height }
    }

    /// Resize the screen buffer. All cells are reset to blank.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.screen = Self::blank_screen(width, height);
    }

    /// Reset every cell to blank.
    pub fn clear(&mut self) {
        for row in &mut self.screen {
            row.fill(StyledCell::blank());
        }
    }

    /// Write styled text at `(x, y)`, starting from `style`.
    ///
    /// SGR sequences in `text` update the running style; other escapes are
    /// ignored. Cells off screen are skipped, and a wide grapheme that does
    /// not fit becomes a space.
    pub fn draw(&mut self, x: i32, y: i32, text: &str, style: Style) {
        if y < 0 || y >= i32::from(self.height) {
            return;
        }
        let row = y as usize;
        let width = i32::from(self.width);
        let mut style = style;
        let mut col = x;

        for seg in segments(text) {
            match seg {
                Segment::Escape(seq) => {
                    if let Some(params) = sgr_params(seq) {
                        style.apply_sgr(params);
                    }
                }
                Segment::Text(run) => {
                    for grapheme in run.graphemes(true) {
                        let w = grapheme_width(grapheme) as i32;
                        if w == 0 {
                            continue;
                        }
                        if col >= 0 && col < width {
                            if w == 2 && col + 1 >= width {
                                self.put(row, col as usize, StyledCell::blank_styled(style));
                            } else {
                                let cell = StyledCell { symbol: grapheme.to_owned(), style };
                                self.put(row, col as usize, cell);
                                if w == 2 {
                                    let tail = StyledCell { symbol: String::new(), style };
                                    self.put(row, col as usize + 1, tail);
                                }
                            }
                        } else if w == 2 && col == -1 {
                            // Right half of a wide grapheme lands on screen.
                            self.put(row, 0, StyledCell::blank_styled(style));
                        }
                        col += w;
                    }
                }
            }
        }
    }

    /// Blank out `width` cells from `(x, y)` with `style`.
    pub fn fill_row(&mut self, x: i32, y: i32, width: i32, style: Style) {
        if y < 0 || y >= i32::from(self.height) {
            return;
        }
        let start = x.max(0);
        let end = x.saturating_add(width).min(i32::from(self.width));
        for col in start..end {
            self.put(y as usize, col as usize, StyledCell::blank_styled(style));
        }
    }

    /// Overwrite one cell, repairing any wide grapheme it splits.
    fn put(&mut self, row: usize, col: usize, cell: StyledCell) {
        let line = &mut self.screen[row];
        if col >= line.len() {
            return;
        }
        if line[col].is_continuation() && !cell.is_continuation() && col > 0 {
            line[col - 1] = StyledCell::blank_styled(line[col - 1].style);
        }
        let was_wide = !line[col].is_continuation()
            && line.get(col + 1).is_some_and(StyledCell::is_continuation);
        let incoming_wide = cell.symbol.graphemes(true).map(grapheme_width).sum::<usize>() == 2;
        line[col] = cell;
        if was_wide && !incoming_wide {
            line[col + 1] = StyledCell::blank_styled(line[col + 1].style);
        }
    }

    /// Compare this frame against a previous frame and return only the changed cells.
    pub fn diff(&self, previous: &Compositor) -> Vec<CellUpdate> {
        let mut updates = Vec::new();
        let h = self.height.min(previous.height) as usize;
        let w = self.width.min(previous.width) as usize;

        for y in 0..h {
            for x in 0..w {
                if self.screen[y][x] != previous.screen[y][x] {
                    let cell = self.screen[y][x].clone();
                    updates.push(CellUpdate { x: x as u16, y: y as u16, cell });
                }
            }
        }

        // If the new frame is larger, all new cells are updates.
        if self.height > previous.height || self.width > previous.width {
            for y in 0..self.height as usize {
                for x in 0..self.width as usize {
                    if y >= previous.height as usize || x >= previous.width as usize {
                        let cell = self.screen[y][x].clone();
                        updates.push(CellUpdate { x: x as u16, y: y as u16, cell });
                    }
                }
            }
        }

        updates
    }

    /// Every cell as an update, for the first frame or after a resize.
    pub fn full_updates(&self) -> Vec<CellUpdate> {
        self.diff(&Compositor::new(0, 0))
    }

    /// Get a reference to the screen buffer cell at (x, y).
    ///
    /// Returns `None` if coordinates are out of bounds.
    pub fn get_cell(&self, x: u16, y: u16) -> Option<&StyledCell> {
        self.screen.get(y as usize).and_then(|row| row.get(x as usize))
    }

    /// The symbols of row `y` joined, without styles.
    pub fn row_text(&self, y: u16) -> String {
        self.screen
            .get(y as usize)
            .map(|row| row.iter().map(|c| c.symbol.as_str()).collect())
            .unwrap_or_default()
    }

    /// Fill the entire screen with a given style (useful for background).
    pub fn fill(&mut self, style: Style) {
        for row in &mut self.screen {
            row.fill(StyledCell::blank_styled(style));
        }
    }

    /// Create a blank screen buffer.
    fn blank_screen(width: u16, height: u16) -> Vec<Vec<StyledCell>> {
        (0..height as usize)
            .map(|_| vec![StyledCell::blank(); width as usize])
            .collect()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
