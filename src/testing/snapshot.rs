//! Snapshot rendering helpers.
//!
//! Functions for turning a node, or a finished frame, into plain-text strings
//! suitable for snapshot testing and assertions.

use crate::error::Error;
use crate::node::Node;
use crate::render::compositor::Compositor;
use crate::screen::Screen;
use crate::theme::MapTheme;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Render a node to a plain text string using an empty theme.
///
/// The node is mounted as the content of a `width` x `height` screen and one
/// frame is produced. Each row becomes one line in the output string, with
/// trailing spaces trimmed. Lines are separated by `'\n'`. The final line does
/// not have a trailing newline.
///
/// # Examples
///
/// ```ignore
/// use tessera_tui::testing::render_to_string;
/// use tessera_tui::nodes::Label;
///
/// let output = render_to_string(Label::new("Hello"), 20, 1)?;
/// assert_eq!(output, "Hello");
/// ```
pub fn render_to_string(node: impl Node, width: u16, height: u16) -> Result<String, Error> {
    render_to_themed_string(node, width, height, MapTheme::new())
}

/// Same as [`render_to_string`] with `theme` installed. Colors do not show
/// up in the text, but theme-dependent layout and glyph choices do.
pub fn render_to_themed_string(
    node: impl Node,
    width: u16,
    height: u16,
    theme: MapTheme,
) -> Result<String, Error> {
    let mut screen = Screen::new(width, height);
    screen.set_theme(Box::new(theme));
    screen.mount(node);
    screen.frame()?;
    Ok(screen_to_string(&screen))
}

/// The current frame of `screen`, trimmed per row.
pub fn screen_to_string(screen: &Screen) -> String {
    compositor_to_string(screen.compositor())
}

/// Convert a full compositor buffer to a plain text string.
///
/// Each row is right-trimmed of spaces and rows are joined with `'\n'`.
pub fn compositor_to_string(compositor: &Compositor) -> String {
    if compositor.width == 0 || compositor.height == 0 {
        return String::new();
    }

    let lines: Vec<String> = (0..compositor.height)
        .map(|y| compositor.row_text(y).trim_end().to_owned())
        .collect();

    lines.join("\n")
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::Style;
    use crate::nodes::{Border, Label, Stack};

    // ── render_to_string ─────────────────────────────────────────────

    #[test]
    fn render_label_to_text() {
        let output = render_to_string(Label::new("Hello, World!"), 20, 1).unwrap();
        assert_eq!(output, "Hello, World!");
    }

    #[test]
    fn render_label_multiline() {
        let output = render_to_string(Label::new("Line1\nLine2\nLine3"), 10, 3).unwrap();
        let lines: Vec<&str> = output.split('\n').collect();
        assert_eq!(lines, vec!["Line1", "Line2", "Line3"]);
    }

    #[test]
    fn render_label_truncated_to_width() {
        let output = render_to_string(Label::new("abcdefgh"), 4, 1).unwrap();
        assert_eq!(output, "abcd");
    }

    #[test]
    fn render_border_with_title() {
        let output = render_to_string(Border::new().title("T"), 6, 3).unwrap();
        assert_eq!(output, "┌T───┐\n│    │\n└────┘");
    }

    #[test]
    fn render_empty_label() {
        let output = render_to_string(Label::new(""), 10, 2).unwrap();
        assert_eq!(output, "\n");
    }

    #[test]
    fn render_zero_dimensions() {
        let output = render_to_string(Label::new("Hello"), 0, 0).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn render_trims_trailing_spaces() {
        let output = render_to_string(Label::new("Hi"), 20, 1).unwrap();
        assert!(!output.ends_with(' '));
        assert_eq!(output, "Hi");
    }

    #[test]
    fn render_with_theme() {
        let theme = MapTheme::new().with("border", "#ff0000");
        let output = render_to_themed_string(Border::new(), 3, 3, theme).unwrap();
        assert_eq!(output, "┌─┐\n│ │\n└─┘");
    }

    // ── screen_to_string ─────────────────────────────────────────────

    #[test]
    fn screen_to_string_reflects_last_frame() {
        let mut screen = Screen::new(8, 2);
        let root = screen.mount(Stack::vertical()).unwrap();
        screen.tree_mut().insert_child(root, Label::new("top")).unwrap();
        screen.tree_mut().insert_child(root, Label::new("bottom")).unwrap();
        screen.frame().unwrap();
        assert_eq!(screen_to_string(&screen), "top\nbottom");
    }

    // ── compositor_to_string ─────────────────────────────────────────

    #[test]
    fn compositor_to_string_blank() {
        let compositor = Compositor::new(10, 3);
        let output = compositor_to_string(&compositor);
        let lines: Vec<&str> = output.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.is_empty()));
    }

    #[test]
    fn compositor_to_string_with_content() {
        let mut compositor = Compositor::new(10, 3);
        compositor.draw(0, 0, "Hi", Style::new());
        compositor.draw(2, 1, "there", Style::new());
        assert_eq!(compositor_to_string(&compositor), "Hi\n  there\n");
    }

    #[test]
    fn compositor_to_string_zero_size() {
        let compositor = Compositor::new(0, 0);
        assert!(compositor_to_string(&compositor).is_empty());
    }
}
