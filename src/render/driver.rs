//! Crossterm terminal output backend.
//!
//! The `Driver` wraps a buffered stdout writer and provides methods for entering/leaving
//! alternate screen, applying cell updates from the compositor, and controlling the cursor.

use std::io::{self, BufWriter, Stdout, Write};

use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{
        Attribute, Color as TermColor, Print, ResetColor, SetAttribute, SetBackgroundColor,
        SetForegroundColor,
    },
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, SetTitle},
};

use super::compositor::CellUpdate;
use crate::ansi::{Color, Style};
use crate::theme::Capabilities;

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Terminal output backend using crossterm.
///
/// Wraps a `BufWriter<Stdout>` for efficient batched writes. The driver does NOT
/// automatically enter alternate screen on creation; call `enter_alt_screen` explicitly.
pub struct Driver {
    writer: BufWriter<Stdout>,
    capabilities: Capabilities,
    mouse_capture: bool,
}

impl Driver {
    /// Create a new driver wrapping stdout.
    pub fn new(capabilities: Capabilities) -> io::Result<Self> {
        Ok(Self {
            writer: BufWriter::new(io::stdout()),
            capabilities,
            mouse_capture: false,
        })
    }

    /// Enter alternate screen and enable raw mode, optionally capturing the mouse.
    pub fn enter_alt_screen(&mut self, mouse_capture: bool) -> io::Result<()> {
        execute!(self.writer, EnterAlternateScreen)?;
        terminal::enable_raw_mode()?;
        if mouse_capture {
            execute!(self.writer, EnableMouseCapture)?;
            self.mouse_capture = true;
        }
        Ok(())
    }

    /// Leave alternate screen and disable raw mode.
    pub fn leave_alt_screen(&mut self) -> io::Result<()> {
        if self.mouse_capture {
            execute!(self.writer, DisableMouseCapture)?;
            self.mouse_capture = false;
        }
        terminal::disable_raw_mode()?;
        execute!(self.writer, LeaveAlternateScreen, cursor::Show)?;
        Ok(())
    }

    pub fn set_title(&mut self, title: &str) -> io::Result<()> {
        execute!(self.writer, SetTitle(title))
    }

    /// Apply a batch of cell updates to the terminal.
    ///
    /// Continuation cells (right halves of wide graphemes) print nothing.
    /// Uses `queue!` for batching; call `flush()` afterward to send to the terminal.
    pub fn apply_updates(&mut self, updates: &[CellUpdate]) -> io::Result<()> {
        for update in updates {
            if update.cell.is_continuation() {
                continue;
            }
            queue!(self.writer, cursor::MoveTo(update.x, update.y))?;
            self.apply_style(&update.cell.style)?;
            queue!(self.writer, Print(&update.cell.symbol))?;
            queue!(self.writer, SetAttribute(Attribute::Reset), ResetColor)?;
        }
        Ok(())
    }

    /// Show the cursor at `(x, y)`, or hide it.
    pub fn set_cursor_position(&mut self, position: Option<(u16, u16)>) -> io::Result<()> {
        match position {
            Some((x, y)) => queue!(self.writer, cursor::MoveTo(x, y), cursor::Show),
            None => queue!(self.writer, cursor::Hide),
        }
    }

    /// Flush the internal write buffer to the terminal.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Get the terminal size (columns, rows) via crossterm.
    pub fn terminal_size() -> io::Result<(u16, u16)> {
        terminal::size()
    }

    /// Hide the cursor.
    pub fn hide_cursor(&mut self) -> io::Result<()> {
        execute!(self.writer, cursor::Hide)
    }

    /// Show the cursor.
    pub fn show_cursor(&mut self) -> io::Result<()> {
        execute!(self.writer, cursor::Show)
    }

    /// Queue crossterm style commands for a given `Style`.
    fn apply_style(&mut self, style: &Style) -> io::Result<()> {
        if let Some(fg) = style.fg {
            queue!(self.writer, SetForegroundColor(term_color(fg, self.capabilities)))?;
        }
        if let Some(bg) = style.bg {
            queue!(self.writer, SetBackgroundColor(term_color(bg, self.capabilities)))?;
        }
        if style.bold {
            queue!(self.writer, SetAttribute(Attribute::Bold))?;
        }
        if style.dim {
            queue!(self.writer, SetAttribute(Attribute::Dim))?;
        }
        if style.italic {
            queue!(self.writer, SetAttribute(Attribute::Italic))?;
        }
        if style.underline {
            queue!(self.writer, SetAttribute(Attribute::Underlined))?;
        }
        if style.strikethrough {
            queue!(self.writer, SetAttribute(Attribute::CrossedOut))?;
        }
        if style.reverse {
            queue!(self.writer, SetAttribute(Attribute::Reverse))?;
        }
        Ok(())
    }
}

/// Convert a color for output. RGB is quantized to the palette when the
/// terminal lacks true color.
pub fn term_color(color: Color, capabilities: Capabilities) -> TermColor {
    match color {
        Color::Indexed(n) => TermColor::AnsiValue(n),
        Color::Rgb(r, g, b) if capabilities.true_color => TermColor::Rgb { r, g, b },
        Color::Rgb(..) => match color.to_indexed() {
            Color::Indexed(n) => TermColor::AnsiValue(n),
            Color::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
        },
    }
}

// ===========================================================================
// Tests
// ===========================================================================
