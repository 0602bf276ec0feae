//! Input event types wrapping crossterm for decoupling.
//!
//! Defines [`InputEvent`], [`KeyEvent`], [`MouseEvent`] and supporting types.
//! Crossterm events are converted via [`try_from_crossterm`] so the rest of
//! the engine never depends on crossterm directly.

use std::ops::{BitAnd, BitOr};
use std::time::{Duration, Instant};

use crate::geometry::Offset;

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// Keyboard key, decoupled from crossterm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Tab,
    BackTab,
    Backspace,
    Delete,
    Insert,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
}

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

/// Modifier key bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(pub u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const SHIFT: Modifiers = Modifiers(1);
    pub const CTRL: Modifiers = Modifiers(2);
    pub const ALT: Modifiers = Modifiers(4);

    /// Check whether `self` contains all the bits in `other`.
    pub fn contains(self, other: Modifiers) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check whether no modifier bits are set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;
    fn bitor(self, rhs: Self) -> Self::Output {
        Modifiers(self.0 | rhs.0)
    }
}

impl BitAnd for Modifiers {
    type Output = Modifiers;
    fn bitand(self, rhs: Self) -> Self::Output {
        Modifiers(self.0 & rhs.0)
    }
}

// ---------------------------------------------------------------------------
// KeyEvent
// ---------------------------------------------------------------------------

/// A keyboard event with key and modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Create a new key event.
    pub fn new(code: Key, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// A key with no modifiers.
    pub fn plain(code: Key) -> Self {
        Self::new(code, Modifiers::NONE)
    }
}

// ---------------------------------------------------------------------------
// MouseBtn / MouseAction / MouseEvent
// ---------------------------------------------------------------------------

/// Mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseBtn {
    Left,
    Right,
    Middle,
}

/// Which way the wheel turned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WheelDirection {
    Up,
    Down,
    Left,
    Right,
}

impl WheelDirection {
    /// Signed step along the vertical axis (down is positive).
    pub fn vertical_delta(self) -> i32 {
        match self {
            WheelDirection::Up => -1,
            WheelDirection::Down => 1,
            WheelDirection::Left | WheelDirection::Right => 0,
        }
    }
}

/// Mouse action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseAction {
    Down(MouseBtn),
    Up(MouseBtn),
    Drag(MouseBtn),
    Moved,
    Wheel(WheelDirection),
}

/// A mouse event with action, position, and modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    pub kind: MouseAction,
    pub x: u16,
    pub y: u16,
    pub modifiers: Modifiers,
    /// 1 for a single click, 2 for a double click, and so on. Filled in for
    /// `Down` events by the dispatcher; 0 for other kinds.
    pub click_count: u8,
}

impl MouseEvent {
    pub fn new(kind: MouseAction, x: u16, y: u16) -> Self {
        Self { kind, x, y, modifiers: Modifiers::NONE, click_count: 0 }
    }

    pub fn position(&self) -> Offset {
        Offset::new(i32::from(self.x), i32::from(self.y))
    }
}

/// Counts consecutive presses of the same button on the same cell.
#[derive(Debug, Clone)]
pub struct ClickTracker {
    last: Option<(MouseBtn, u16, u16, Instant)>,
    count: u8,
    interval: Duration,
}

impl ClickTracker {
    /// Presses closer together than `interval` on the same cell chain.
    pub fn new(interval: Duration) -> Self {
        Self { last: None, count: 0, interval }
    }

    /// Record a press and return its click count.
    pub fn press(&mut self, button: MouseBtn, x: u16, y: u16, at: Instant) -> u8 {
        let chained = self.last.is_some_and(|(b, lx, ly, t)| {
            b == button && lx == x && ly == y && at.saturating_duration_since(t) <= self.interval
        });
        self.count = if chained { self.count.saturating_add(1) } else { 1 };
        self.last = Some((button, x, y, at));
        self.count
    }
}

impl Default for ClickTracker {
    fn default() -> Self {
        Self::new(Duration::from_millis(400))
    }
}

// ---------------------------------------------------------------------------
// InputEvent
// ---------------------------------------------------------------------------

/// Top-level input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize { width: u16, height: u16 },
}

// ---------------------------------------------------------------------------
// crossterm conversions
// ---------------------------------------------------------------------------

/// Convert crossterm key modifiers to our `Modifiers`.
fn convert_modifiers(m: crossterm::event::KeyModifiers) -> Modifiers {
    let mut out = Modifiers::NONE;
    if m.contains(crossterm::event::KeyModifiers::SHIFT) {
        out = out | Modifiers::SHIFT;
    }
    if m.contains(crossterm::event::KeyModifiers::CONTROL) {
        out = out | Modifiers::CTRL;
    }
    if m.contains(crossterm::event::KeyModifiers::ALT) {
        out = out | Modifiers::ALT;
    }
    out
}

/// Convert a crossterm key code; `None` for keys we do not route.
fn convert_key(code: crossterm::event::KeyCode) -> Option<Key> {
    use crossterm::event::KeyCode;
    Some(match code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Insert => Key::Insert,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::F(n) => Key::F(n),
        _ => return None,
    })
}

/// Convert a crossterm mouse button to our `MouseBtn`.
fn convert_mouse_button(b: crossterm::event::MouseButton) -> MouseBtn {
    match b {
        crossterm::event::MouseButton::Left => MouseBtn::Left,
        crossterm::event::MouseButton::Right => MouseBtn::Right,
        crossterm::event::MouseButton::Middle => MouseBtn::Middle,
    }
}

/// Convert a crossterm `KeyEvent`. Key releases and unsupported keys give
/// `None`.
pub fn convert_key_event(ct: crossterm::event::KeyEvent) -> Option<KeyEvent> {
    if ct.kind == crossterm::event::KeyEventKind::Release {
        return None;
    }
    let code = convert_key(ct.code)?;
    let mut modifiers = convert_modifiers(ct.modifiers);
    if code == Key::BackTab {
        // Shift is implied by BackTab.
        modifiers = Modifiers(modifiers.0 & !Modifiers::SHIFT.0);
    }
    Some(KeyEvent { code, modifiers })
}

/// Convert a crossterm `Event` into our `InputEvent`.
///
/// Returns `None` for events we don't route.
pub fn try_from_crossterm(event: crossterm::event::Event) -> Option<InputEvent> {
    use crossterm::event::{Event, MouseEventKind};
    Some(match event {
        Event::Key(ke) => InputEvent::Key(convert_key_event(ke)?),
        Event::Mouse(me) => {
            let kind = match me.kind {
                MouseEventKind::Down(b) => MouseAction::Down(convert_mouse_button(b)),
                MouseEventKind::Up(b) => MouseAction::Up(convert_mouse_button(b)),
                MouseEventKind::Drag(b) => MouseAction::Drag(convert_mouse_button(b)),
                MouseEventKind::Moved => MouseAction::Moved,
                MouseEventKind::ScrollUp => MouseAction::Wheel(WheelDirection::Up),
                MouseEventKind::ScrollDown => MouseAction::Wheel(WheelDirection::Down),
                MouseEventKind::ScrollLeft => MouseAction::Wheel(WheelDirection::Left),
                MouseEventKind::ScrollRight => MouseAction::Wheel(WheelDirection::Right),
            };
            InputEvent::Mouse(MouseEvent {
                kind,
                x: me.column,
                y: me.row,
                modifiers: convert_modifiers(me.modifiers),
                click_count: 0,
            })
        }
        Event::Resize(width, height) => InputEvent::Resize { width, height },
        Event::FocusGained | Event::FocusLost | Event::Paste(_) => return None,
    })
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind};

    fn ct_key(code: KeyCode, modifiers: KeyModifiers) -> crossterm::event::KeyEvent {
        crossterm::event::KeyEvent::new(code, modifiers)
    }

    fn ct_mouse(kind: MouseEventKind, column: u16, row: u16) -> crossterm::event::Event {
        crossterm::event::Event::Mouse(crossterm::event::MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    // ── Modifiers ────────────────────────────────────────────────────

    #[test]
    fn modifiers_combined() {
        let mods = Modifiers::CTRL | Modifiers::ALT;
        assert!(mods.contains(Modifiers::CTRL));
        assert!(mods.contains(Modifiers::ALT));
        assert!(!mods.contains(Modifiers::SHIFT));
        assert_eq!(mods & Modifiers::CTRL, Modifiers::CTRL);
        assert!(Modifiers::NONE.is_empty());
    }

    // ── Key conversion ───────────────────────────────────────────────

    #[test]
    fn key_with_modifiers() {
        let ke = convert_key_event(ct_key(KeyCode::Char('c'), KeyModifiers::CONTROL)).unwrap();
        assert_eq!(ke.code, Key::Char('c'));
        assert!(ke.modifiers.contains(Modifiers::CTRL));

        let ke = convert_key_event(ct_key(
            KeyCode::Char('A'),
            KeyModifiers::SHIFT | KeyModifiers::ALT,
        ))
        .unwrap();
        assert!(ke.modifiers.contains(Modifiers::SHIFT));
        assert!(ke.modifiers.contains(Modifiers::ALT));
    }

    #[test]
    fn navigation_keys() {
        for (ct_code, expected) in [
            (KeyCode::Left, Key::Left),
            (KeyCode::Right, Key::Right),
            (KeyCode::Up, Key::Up),
            (KeyCode::Down, Key::Down),
            (KeyCode::Home, Key::Home),
            (KeyCode::End, Key::End),
            (KeyCode::PageUp, Key::PageUp),
            (KeyCode::PageDown, Key::PageDown),
            (KeyCode::Tab, Key::Tab),
            (KeyCode::BackTab, Key::BackTab),
            (KeyCode::Esc, Key::Escape),
            (KeyCode::F(5), Key::F(5)),
        ] {
            let ke = convert_key_event(ct_key(ct_code, KeyModifiers::NONE)).unwrap();
            assert_eq!(ke.code, expected);
        }
    }

    #[test]
    fn unsupported_keys_and_releases_are_dropped() {
        assert!(convert_key_event(ct_key(KeyCode::CapsLock, KeyModifiers::NONE)).is_none());
        let mut release = ct_key(KeyCode::Enter, KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert!(convert_key_event(release).is_none());
    }

    // ── Event conversion ─────────────────────────────────────────────

    #[test]
    fn resize_converts_and_unrouted_events_drop() {
        assert_eq!(
            try_from_crossterm(crossterm::event::Event::Resize(120, 40)),
            Some(InputEvent::Resize { width: 120, height: 40 })
        );
        assert_eq!(try_from_crossterm(crossterm::event::Event::FocusGained), None);
        assert_eq!(try_from_crossterm(crossterm::event::Event::FocusLost), None);
        assert_eq!(try_from_crossterm(crossterm::event::Event::Paste("hello".into())), None);
    }

    #[test]
    fn mouse_down_from_crossterm() {
        let input = try_from_crossterm(ct_mouse(MouseEventKind::Down(MouseButton::Left), 10, 5));
        match input {
            Some(InputEvent::Mouse(me)) => {
                assert_eq!(me.kind, MouseAction::Down(MouseBtn::Left));
                assert_eq!(me.position(), Offset::new(10, 5));
                assert_eq!(me.click_count, 0);
            }
            other => panic!("expected Mouse event, got {other:?}"),
        }
    }

    #[test]
    fn wheel_directions() {
        for (kind, expected) in [
            (MouseEventKind::ScrollUp, WheelDirection::Up),
            (MouseEventKind::ScrollDown, WheelDirection::Down),
            (MouseEventKind::ScrollLeft, WheelDirection::Left),
            (MouseEventKind::ScrollRight, WheelDirection::Right),
        ] {
            match try_from_crossterm(ct_mouse(kind, 0, 0)) {
                Some(InputEvent::Mouse(me)) => assert_eq!(me.kind, MouseAction::Wheel(expected)),
                other => panic!("expected Mouse event, got {other:?}"),
            }
        }
        assert_eq!(WheelDirection::Up.vertical_delta(), -1);
        assert_eq!(WheelDirection::Right.vertical_delta(), 0);
    }

    // ── Click counting ───────────────────────────────────────────────

    #[test]
    fn clicks_chain_on_same_cell() {
        let mut tracker = ClickTracker::new(Duration::from_millis(400));
        let t0 = Instant::now();
        assert_eq!(tracker.press(MouseBtn::Left, 3, 3, t0), 1);
        assert_eq!(tracker.press(MouseBtn::Left, 3, 3, t0 + Duration::from_millis(100)), 2);
        assert_eq!(tracker.press(MouseBtn::Left, 3, 3, t0 + Duration::from_millis(200)), 3);
    }

    #[test]
    fn clicks_reset_on_move_button_or_timeout() {
        let mut tracker = ClickTracker::new(Duration::from_millis(400));
        let t0 = Instant::now();
        tracker.press(MouseBtn::Left, 3, 3, t0);
        assert_eq!(tracker.press(MouseBtn::Left, 4, 3, t0), 1);
        assert_eq!(tracker.press(MouseBtn::Right, 4, 3, t0), 1);
        assert_eq!(tracker.press(MouseBtn::Right, 4, 3, t0 + Duration::from_secs(1)), 1);
    }
}
