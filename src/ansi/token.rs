//! logos-based tokenizer for styled terminal strings.
//!
//! A styled string is split into printable text runs and whole escape
//! sequences. Escape sequences are never split: every consumer (width
//! measurement, slicing, painting) works on these tokens.
//!
//! Token priority follows logos rules: longest match wins, so a complete CSI
//! sequence beats the two-byte `Escape` form.

use logos::Logos;

/// Raw token produced by the lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Control Sequence Introducer: `ESC [ params intermediates final`.
    #[regex(r"\x1b\[[0-?]*[ -/]*[@-~]")]
    Csi,

    /// Operating System Command, terminated by BEL or ST (`ESC \`).
    #[regex(r"\x1b\][^\x07\x1b]*(\x07|\x1b\\)")]
    Osc,

    /// Two-byte escape (`ESC 7`, `ESC =`, `ESC M`, ...).
    #[regex(r"\x1b[0-9=>@-Z\\^_a-z]")]
    Escape,

    /// A run of printable text containing no ESC byte.
    #[regex(r"[^\x1b]+")]
    Text,
}

/// A classified piece of a styled string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Printable text.
    Text(&'a str),
    /// A complete escape sequence (zero display width).
    Escape(&'a str),
}

impl<'a> Segment<'a> {
    /// Whether this segment is an SGR (`ESC [ ... m`) style sequence.
    pub fn is_sgr(&self) -> bool {
        matches!(self, Segment::Escape(seq) if seq.starts_with("\x1b[") && seq.ends_with('m'))
    }
}

/// Split `input` into text and escape segments.
///
/// Bytes that fail to lex (a stray ESC, a truncated sequence) are dropped:
/// they have no visible width and must never reach the terminal half-formed.
pub fn segments(input: &str) -> impl Iterator<Item = Segment<'_>> {
    Token::lexer(input)
        .spanned()
        .filter_map(move |(result, span)| match result {
            Ok(Token::Text) => Some(Segment::Text(&input[span])),
            Ok(Token::Csi | Token::Osc | Token::Escape) => Some(Segment::Escape(&input[span])),
            Err(()) => None,
        })
}

/// Remove every escape sequence, keeping only printable text.
pub fn strip(input: &str) -> String {
    segments(input)
        .filter_map(|seg| match seg {
            Segment::Text(text) => Some(text),
            Segment::Escape(_) => None,
        })
        .collect()
}
