//! Cell styles and SGR (Select Graphic Rendition) encoding.
//!
//! [`Style`] is the self-contained style type used throughout the pipeline:
//! painting interprets SGR sequences into it, and the render context emits it
//! back as SGR when re-establishing ambient color.

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// A terminal color: one of the 256 palette entries or 24-bit RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Indexed(u8),
    Rgb(u8, u8, u8),
}

impl Color {
    pub const BLACK: Color = Color::Indexed(0);
    pub const DARK_RED: Color = Color::Indexed(1);
    pub const DARK_GREEN: Color = Color::Indexed(2);
    pub const DARK_YELLOW: Color = Color::Indexed(3);
    pub const DARK_BLUE: Color = Color::Indexed(4);
    pub const DARK_MAGENTA: Color = Color::Indexed(5);
    pub const DARK_CYAN: Color = Color::Indexed(6);
    pub const GREY: Color = Color::Indexed(7);
    pub const DARK_GREY: Color = Color::Indexed(8);
    pub const RED: Color = Color::Indexed(9);
    pub const GREEN: Color = Color::Indexed(10);
    pub const YELLOW: Color = Color::Indexed(11);
    pub const BLUE: Color = Color::Indexed(12);
    pub const MAGENTA: Color = Color::Indexed(13);
    pub const CYAN: Color = Color::Indexed(14);
    pub const WHITE: Color = Color::Indexed(15);

    /// Approximate RGB channels, used when blending sub-cell glyph colors.
    pub fn to_rgb(self) -> (u8, u8, u8) {
        const BASE: [(u8, u8, u8); 16] = [
            (0, 0, 0),
            (128, 0, 0),
            (0, 128, 0),
            (128, 128, 0),
            (0, 0, 128),
            (128, 0, 128),
            (0, 128, 128),
            (192, 192, 192),
            (128, 128, 128),
            (255, 0, 0),
            (0, 255, 0),
            (255, 255, 0),
            (0, 0, 255),
            (255, 0, 255),
            (0, 255, 255),
            (255, 255, 255),
        ];
        match self {
            Color::Rgb(r, g, b) => (r, g, b),
            Color::Indexed(n) if n < 16 => BASE[n as usize],
            Color::Indexed(n) if n >= 232 => {
                let level = 8 + (n - 232) * 10;
                (level, level, level)
            }
            Color::Indexed(n) => {
                let n = n - 16;
                let step = |v: u8| if v == 0 { 0 } else { 55 + v * 40 };
                (step(n / 36), step((n / 6) % 6), step(n % 6))
            }
        }
    }

    /// Average two colors channel by channel.
    pub fn average(self, other: Color) -> Color {
        let (r1, g1, b1) = self.to_rgb();
        let (r2, g2, b2) = other.to_rgb();
        let mid = |a: u8, b: u8| ((a as u16 + b as u16) / 2) as u8;
        Color::Rgb(mid(r1, r2), mid(g1, g2), mid(b1, b2))
    }

    /// Nearest entry of the 6x6x6 palette cube, for terminals without 24-bit
    /// color. Indexed colors are returned unchanged.
    pub fn to_indexed(self) -> Color {
        match self {
            Color::Indexed(_) => self,
            Color::Rgb(r, g, b) => {
                let level = |v: u8| if v < 48 { 0 } else if v < 115 { 1 } else { (v - 35) / 40 };
                Color::Indexed(16 + 36 * level(r) + 6 * level(g) + level(b))
            }
        }
    }

    fn push_sgr(self, out: &mut Vec<String>, background: bool) {
        match self {
            Color::Indexed(n) if n < 8 => {
                let base: u16 = if background { 40 } else { 30 };
                out.push((base + n as u16).to_string());
            }
            Color::Indexed(n) if n < 16 => {
                let base: u16 = if background { 100 } else { 90 };
                out.push((base + (n - 8) as u16).to_string());
            }
            Color::Indexed(n) => {
                out.push(if background { "48;5".into() } else { "38;5".into() });
                out.push(n.to_string());
            }
            Color::Rgb(r, g, b) => {
                out.push(if background { "48;2".into() } else { "38;2".into() });
                out.push(format!("{r};{g};{b}"));
            }
        }
    }
}

/// Parse a theme color string into a [`Color`].
///
/// Supports `#rrggbb`, `#rgb` and the sixteen named colors (`red`,
/// `dark_red`/`darkred`, `grey`/`gray`, ...). Returns `None` if the string
/// cannot be parsed.
pub fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();

    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex_color(hex);
    }

    match s.to_ascii_lowercase().as_str() {
        "black" => Some(Color::BLACK),
        "red" => Some(Color::RED),
        "green" => Some(Color::GREEN),
        "yellow" => Some(Color::YELLOW),
        "blue" => Some(Color::BLUE),
        "magenta" => Some(Color::MAGENTA),
        "cyan" => Some(Color::CYAN),
        "white" => Some(Color::WHITE),
        "dark_red" | "darkred" => Some(Color::DARK_RED),
        "dark_green" | "darkgreen" => Some(Color::DARK_GREEN),
        "dark_yellow" | "darkyellow" => Some(Color::DARK_YELLOW),
        "dark_blue" | "darkblue" => Some(Color::DARK_BLUE),
        "dark_magenta" | "darkmagenta" => Some(Color::DARK_MAGENTA),
        "dark_cyan" | "darkcyan" => Some(Color::DARK_CYAN),
        "dark_grey" | "dark_gray" | "darkgrey" | "darkgray" => Some(Color::DARK_GREY),
        "grey" | "gray" => Some(Color::GREY),
        _ => None,
    }
}

fn parse_hex_color(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
            Some(Color::Rgb(r * 17, g * 17, b * 17))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------------

/// Visual style of a terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub dim: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub reverse: bool,
}

impl Style {
    /// An empty style: terminal defaults.
    pub const fn new() -> Self {
        Self {
            fg: None,
            bg: None,
            bold: false,
            dim: false,
            italic: false,
            underline: false,
            strikethrough: false,
            reverse: false,
        }
    }

    /// Set the foreground (builder).
    pub fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    /// Set the background (builder).
    pub fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    /// Enable bold (builder).
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Apply the parameters of one SGR sequence (`ESC [ params m`).
    ///
    /// Unknown parameters are ignored; an empty parameter list resets.
    pub fn apply_sgr(&mut self, params: &str) {
        let mut codes = params
            .split([';', ':'])
            .map(|p| if p.is_empty() { 0 } else { p.parse::<u16>().unwrap_or(u16::MAX) });

        while let Some(code) = codes.next() {
            match code {
                0 => *self = Style::new(),
                1 => self.bold = true,
                2 => self.dim = true,
                3 => self.italic = true,
                4 => self.underline = true,
                7 => self.reverse = true,
                9 => self.strikethrough = true,
                22 => {
                    self.bold = false;
                    self.dim = false;
                }
                23 => self.italic = false,
                24 => self.underline = false,
                27 => self.reverse = false,
                29 => self.strikethrough = false,
                30..=37 => self.fg = Some(Color::Indexed((code - 30) as u8)),
                39 => self.fg = None,
                40..=47 => self.bg = Some(Color::Indexed((code - 40) as u8)),
                49 => self.bg = None,
                90..=97 => self.fg = Some(Color::Indexed((code - 90 + 8) as u8)),
                100..=107 => self.bg = Some(Color::Indexed((code - 100 + 8) as u8)),
                38 | 48 => {
                    let color = match codes.next() {
                        Some(5) => codes.next().map(|n| Color::Indexed(n.min(255) as u8)),
                        Some(2) => {
                            let mut channel = || codes.next().map(|v| v.min(255) as u8);
                            match (channel(), channel(), channel()) {
                                (Some(r), Some(g), Some(b)) => Some(Color::Rgb(r, g, b)),
                                _ => None,
                            }
                        }
                        _ => None,
                    };
                    if code == 38 {
                        self.fg = color.or(self.fg);
                    } else {
                        self.bg = color.or(self.bg);
                    }
                }
                _ => {}
            }
        }
    }

    /// Encode this style as a single SGR sequence, or an empty string for
    /// the default style.
    pub fn to_sgr(&self) -> String {
        let mut params: Vec<String> = Vec::new();
        if self.bold {
            params.push("1".into());
        }
        if self.dim {
            params.push("2".into());
        }
        if self.italic {
            params.push("3".into());
        }
        if self.underline {
            params.push("4".into());
        }
        if self.reverse {
            params.push("7".into());
        }
        if self.strikethrough {
            params.push("9".into());
        }
        if let Some(fg) = self.fg {
            fg.push_sgr(&mut params, false);
        }
        if let Some(bg) = self.bg {
            bg.push_sgr(&mut params, true);
        }
        if params.is_empty() {
            String::new()
        } else {
            format!("\x1b[{}m", params.join(";"))
        }
    }

    /// Wrap `text` in this style, resetting afterwards to `restore`.
    pub fn paint(&self, text: &str, restore: &str) -> String {
        let sgr = self.to_sgr();
        if sgr.is_empty() {
            text.to_owned()
        } else {
            format!("{sgr}{text}{restore}")
        }
    }
}

/// The parameter bytes of an SGR escape sequence, or `None` for other
/// sequences.
pub fn sgr_params(seq: &str) -> Option<&str> {
    seq.strip_prefix("\x1b[")?.strip_suffix('m')
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse_color ──────────────────────────────────────────────────

    #[test]
    fn parse_hex_colors() {
        assert_eq!(parse_color("#ff0000"), Some(Color::Rgb(255, 0, 0)));
        assert_eq!(parse_color("#abc"), Some(Color::Rgb(0xaa, 0xbb, 0xcc)));
        assert_eq!(parse_color(" #FF8800 "), Some(Color::Rgb(255, 136, 0)));
        assert_eq!(parse_color("#ff00"), None);
        assert_eq!(parse_color("#gghhii"), None);
    }

    #[test]
    fn parse_named_colors() {
        assert_eq!(parse_color("red"), Some(Color::RED));
        assert_eq!(parse_color("RED"), Some(Color::RED));
        assert_eq!(parse_color("dark_gray"), Some(Color::DARK_GREY));
        assert_eq!(parse_color("grey"), Some(Color::GREY));
        assert_eq!(parse_color("rainbow"), None);
        assert_eq!(parse_color(""), None);
    }

    // ── SGR decode ───────────────────────────────────────────────────

    #[test]
    fn apply_basic_colors_and_attrs() {
        let mut s = Style::new();
        s.apply_sgr("1;31;44");
        assert!(s.bold);
        assert_eq!(s.fg, Some(Color::DARK_RED));
        assert_eq!(s.bg, Some(Color::DARK_BLUE));
    }

    #[test]
    fn apply_reset_clears_everything() {
        let mut s = Style::new().fg(Color::RED).bold();
        s.apply_sgr("0");
        assert_eq!(s, Style::new());
        let mut s = Style::new().fg(Color::RED);
        s.apply_sgr("");
        assert_eq!(s, Style::new());
    }

    #[test]
    fn apply_extended_colors() {
        let mut s = Style::new();
        s.apply_sgr("38;5;208;48;2;1;2;3");
        assert_eq!(s.fg, Some(Color::Indexed(208)));
        assert_eq!(s.bg, Some(Color::Rgb(1, 2, 3)));
    }

    #[test]
    fn apply_bright_and_default() {
        let mut s = Style::new();
        s.apply_sgr("92;103");
        assert_eq!(s.fg, Some(Color::GREEN));
        assert_eq!(s.bg, Some(Color::YELLOW));
        s.apply_sgr("39;49");
        assert_eq!(s.fg, None);
        assert_eq!(s.bg, None);
    }

    // ── SGR encode ───────────────────────────────────────────────────

    #[test]
    fn default_style_encodes_empty() {
        assert_eq!(Style::new().to_sgr(), "");
    }

    #[test]
    fn encode_decode_agree() {
        let style = Style::new().fg(Color::Rgb(9, 8, 7)).bg(Color::Indexed(200)).bold();
        let sgr = style.to_sgr();
        let mut decoded = Style::new();
        decoded.apply_sgr(sgr_params(&sgr).unwrap());
        assert_eq!(decoded, style);
    }

    #[test]
    fn paint_wraps_with_restore() {
        let out = Style::new().fg(Color::DARK_RED).paint("x", "\x1b[0m");
        assert_eq!(out, "\x1b[31mx\x1b[0m");
        assert_eq!(Style::new().paint("x", "\x1b[0m"), "x");
    }

    // ── Blending ─────────────────────────────────────────────────────

    #[test]
    fn average_channels() {
        assert_eq!(
            Color::Rgb(200, 0, 100).average(Color::Rgb(100, 50, 0)),
            Color::Rgb(150, 25, 50)
        );
        assert_eq!(Color::RED.average(Color::BLUE), Color::Rgb(127, 0, 127));
    }

    #[test]
    fn quantize_to_palette_cube() {
        assert_eq!(Color::Rgb(0, 0, 0).to_indexed(), Color::Indexed(16));
        assert_eq!(Color::Rgb(255, 255, 255).to_indexed(), Color::Indexed(231));
        assert_eq!(Color::Indexed(3).to_indexed(), Color::Indexed(3));
    }
}
