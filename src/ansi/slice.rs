//! Visible-width measurement and column slicing of styled strings.
//!
//! Columns are display columns: a grapheme cluster occupies zero, one or two
//! cells. Escape sequences occupy none and are never split.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::token::{segments, Segment};

/// Display width of one grapheme cluster, capped at two cells.
#[inline]
pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.is_ascii() {
        return grapheme.chars().filter(|c| !c.is_ascii_control()).count().min(1);
    }
    grapheme.width().min(2)
}

/// Number of terminal columns `text` occupies, ignoring escape sequences.
pub fn visible_width(text: &str) -> usize {
    segments(text)
        .map(|seg| match seg {
            Segment::Text(run) => run.graphemes(true).map(grapheme_width).sum(),
            Segment::Escape(_) => 0,
        })
        .sum()
}

/// Slice `text` to the visible column range `[start, end)`.
///
/// - Escape sequences before or inside the range are kept, so style state
///   established before a left cut still applies.
/// - A wide grapheme straddling either edge is replaced by spaces for the
///   columns that fall inside the range.
/// - When visible text is cut off on the right and an SGR sequence has been
///   emitted, `reset` is appended so styling does not leak past the cut.
///
/// The result's visible width is exactly `min(end, w) - min(start, w)` where
/// `w = visible_width(text)`. An inverted or out-of-range request yields an
/// empty string.
pub fn slice_columns(text: &str, start: usize, end: usize, reset: &str) -> String {
    if start >= end {
        return String::new();
    }

    let mut out = String::with_capacity(text.len());
    let mut col = 0usize;
    let mut emitted_sgr = false;
    let mut cut_right = false;
    let mut emitted_text = false;

    'outer: for seg in segments(text) {
        match seg {
            Segment::Escape(seq) => {
                if seg.is_sgr() {
                    emitted_sgr = true;
                }
                out.push_str(seq);
            }
            Segment::Text(run) => {
                for grapheme in run.graphemes(true) {
                    let width = grapheme_width(grapheme);
                    let next = col + width;

                    if col >= end {
                        if width > 0 {
                            cut_right = true;
                            break 'outer;
                        }
                        // Zero-width clusters at the edge carry nothing visible.
                        continue;
                    }

                    if col >= start && next <= end {
                        out.push_str(grapheme);
                        emitted_text = true;
                    } else if next > start {
                        // Straddles an edge: keep only the in-range columns.
                        let visible = next.min(end) - col.max(start);
                        out.extend(std::iter::repeat(' ').take(visible));
                        emitted_text = true;
                        if next > end {
                            cut_right = true;
                            break 'outer;
                        }
                    }
                    col = next;
                }
            }
        }
    }

    if !emitted_text && !cut_right && col <= start {
        // Nothing of the string lies in range; keep it empty rather than a
        // bag of orphaned style codes.
        return String::new();
    }

    if cut_right && emitted_sgr {
        out.push_str(reset);
    }
    out
}

/// Truncate `text` to at most `width` visible columns.
pub fn truncate(text: &str, width: usize, reset: &str) -> String {
    slice_columns(text, 0, width, reset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::token::strip;

    const RESET: &str = "\x1b[0m";

    // ── visible_width ────────────────────────────────────────────────

    #[test]
    fn width_ignores_escapes() {
        assert_eq!(visible_width("\x1b[31mhello\x1b[0m"), 5);
        assert_eq!(visible_width("\x1b]8;;http://x\x07ab\x1b]8;;\x07"), 2);
    }

    #[test]
    fn width_of_wide_and_combining() {
        assert_eq!(visible_width("日本"), 4);
        assert_eq!(visible_width("e\u{301}"), 1);
        assert_eq!(visible_width(""), 0);
    }

    #[test]
    fn width_of_emoji_cluster() {
        // Family ZWJ sequence is one cluster, two cells.
        assert_eq!(visible_width("\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}"), 2);
    }

    // ── slice_columns: plain ─────────────────────────────────────────

    #[test]
    fn slice_plain_middle() {
        assert_eq!(slice_columns("abcdef", 1, 4, RESET), "bcd");
    }

    #[test]
    fn slice_past_end_clamps() {
        assert_eq!(slice_columns("abc", 1, 10, RESET), "bc");
        assert_eq!(slice_columns("abc", 5, 10, RESET), "");
    }

    #[test]
    fn slice_inverted_range_is_empty() {
        assert_eq!(slice_columns("abc", 2, 1, RESET), "");
        assert_eq!(slice_columns("abc", 2, 2, RESET), "");
    }

    // ── slice_columns: styled ────────────────────────────────────────

    #[test]
    fn left_cut_keeps_style_prefix() {
        let s = "\x1b[31mabcdef\x1b[0m";
        assert_eq!(slice_columns(s, 2, 6, RESET), "\x1b[31mcdef\x1b[0m");
    }

    #[test]
    fn right_cut_appends_reset() {
        let s = "\x1b[31mabcdef";
        let out = slice_columns(s, 0, 3, "<R>");
        assert_eq!(out, "\x1b[31mabc<R>");
    }

    #[test]
    fn right_cut_without_style_has_no_reset() {
        assert_eq!(slice_columns("abcdef", 0, 3, "<R>"), "abc");
    }

    #[test]
    fn trailing_codes_past_cut_are_dropped() {
        let s = "\x1b[32mab\x1b[1mcd";
        assert_eq!(slice_columns(s, 0, 2, "<R>"), "\x1b[32mab\x1b[1m<R>");
        assert_eq!(strip(&slice_columns(s, 0, 2, "<R>")), "ab<R>");
    }

    // ── slice_columns: wide graphemes ────────────────────────────────

    #[test]
    fn wide_grapheme_straddling_left_edge_pads() {
        // 日 occupies columns 0-1, 本 columns 2-3.
        assert_eq!(slice_columns("日本", 1, 4, RESET), " 本");
    }

    #[test]
    fn wide_grapheme_straddling_right_edge_pads() {
        assert_eq!(slice_columns("日本", 0, 3, RESET), "日 ");
    }

    #[test]
    fn slice_is_idempotent() {
        let s = "\x1b[44mA日B\x1b[0mC本";
        let once = slice_columns(s, 1, 5, RESET);
        let twice = slice_columns(&once, 0, 4, RESET);
        assert_eq!(visible_width(&once), 4);
        assert_eq!(once, twice);
    }

    #[test]
    fn truncate_is_prefix_slice() {
        assert_eq!(truncate("hello", 3, RESET), "hel");
    }
}
