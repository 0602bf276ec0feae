//! Pilot: programmatic interaction with a headless App.
//!
//! The `Pilot` wraps an [`App`](crate::app::App) in headless mode and provides
//! methods to simulate user input (key presses, mouse clicks, drags, wheel
//! turns, resize), produce frames, and read the result back as text.

use crate::app::{App, AppConfig};
use crate::error::Error;
use crate::event::input::{
    InputEvent, Key, KeyEvent, Modifiers, MouseAction, MouseBtn, MouseEvent, WheelDirection,
};
use crate::node::Node;
use crate::screen::{FrameReport, Screen};
use crate::tree::NodeId;

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless app driver for testing.
///
/// Input methods route the event immediately; nothing is drawn until
/// [`frame`](Self::frame) is called. Blocking async actions started by a key
/// press are not awaited by the synchronous methods; use
/// [`press_key_async`](Self::press_key_async) inside a tokio test for those.
///
/// # Examples
///
/// ```ignore
/// use tessera_tui::testing::Pilot;
/// use tessera_tui::nodes::Label;
///
/// let mut pilot = Pilot::new(20, 1);
/// pilot.mount(Label::new("hello"));
/// pilot.frame()?;
/// assert_eq!(pilot.lines(), vec!["hello"]);
/// ```
pub struct Pilot {
    app: App,
}

impl Pilot {
    /// Create a headless app with the given terminal size.
    pub fn new(width: u16, height: u16) -> Self {
        Self { app: App::new_headless(width, height) }
    }

    /// Create a Pilot from an [`AppConfig`], forcing headless mode.
    pub fn with_config(width: u16, height: u16, config: AppConfig) -> Self {
        Self { app: App::new_headless_with(width, height, config) }
    }

    /// Replace the screen content with `node`.
    pub fn mount(&mut self, node: impl Node) -> Option<NodeId> {
        self.app.screen.mount(node)
    }

    // ── Input simulation ─────────────────────────────────────────────

    /// Simulate a key press with no modifiers.
    pub fn press_key(&mut self, key: Key) {
        self.press_key_with(key, Modifiers::NONE);
    }

    /// Simulate a key press with the given modifiers.
    pub fn press_key_with(&mut self, key: Key, modifiers: Modifiers) {
        self.send(InputEvent::Key(KeyEvent::new(key, modifiers)));
    }

    /// Press `key` and wait for any blocking action it started.
    pub async fn press_key_async(&mut self, key: Key) {
        self.app.dispatch(InputEvent::Key(KeyEvent::plain(key))).await;
    }

    /// Simulate typing each character of `text` as individual key presses.
    pub fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.press_key(Key::Char(ch));
        }
    }

    /// Simulate a left-button press and release at (x, y).
    pub fn click(&mut self, x: u16, y: u16) {
        self.mouse(MouseAction::Down(MouseBtn::Left), x, y);
        self.mouse(MouseAction::Up(MouseBtn::Left), x, y);
    }

    /// Press at `from`, drag through to `to` and release there.
    pub fn drag(&mut self, from: (u16, u16), to: (u16, u16)) {
        self.mouse(MouseAction::Down(MouseBtn::Left), from.0, from.1);
        self.mouse(MouseAction::Drag(MouseBtn::Left), to.0, to.1);
        self.mouse(MouseAction::Up(MouseBtn::Left), to.0, to.1);
    }

    /// Move the pointer without a button held.
    pub fn hover(&mut self, x: u16, y: u16) {
        self.mouse(MouseAction::Moved, x, y);
    }

    /// Turn the wheel once at (x, y).
    pub fn scroll(&mut self, x: u16, y: u16, direction: WheelDirection) {
        self.mouse(MouseAction::Wheel(direction), x, y);
    }

    /// Send a raw mouse event.
    pub fn mouse(&mut self, kind: MouseAction, x: u16, y: u16) {
        self.send(InputEvent::Mouse(MouseEvent::new(kind, x, y)));
    }

    /// Simulate a terminal resize to the given dimensions.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.send(InputEvent::Resize { width, height });
    }

    fn send(&mut self, event: InputEvent) {
        let blocking = self.app.screen.handle_input(event);
        if !blocking.is_empty() {
            tracing::debug!(count = blocking.len(), "pilot not awaiting blocking actions");
        }
    }

    // ── Frames ───────────────────────────────────────────────────────

    /// Produce one frame.
    pub fn frame(&mut self) -> Result<FrameReport, Error> {
        self.app.present()
    }

    /// Produce a frame and discard the report.
    pub fn tick(&mut self) -> Result<(), Error> {
        self.frame().map(|_| ())
    }

    // ── Query ────────────────────────────────────────────────────────

    /// Borrow the underlying app immutably.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Borrow the underlying app mutably.
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    pub fn screen(&self) -> &Screen {
        &self.app.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.app.screen
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.app.screen.focused()
    }

    /// Whether the app is still running (has not quit).
    pub fn is_running(&self) -> bool {
        !self.app.should_quit()
    }

    /// The last frame, one right-trimmed string per row.
    pub fn lines(&self) -> Vec<String> {
        self.app.screen.text().into_iter().map(|l| l.trim_end().to_owned()).collect()
    }

    /// The last frame as one string, rows joined with `'\n'`.
    pub fn text(&self) -> String {
        super::snapshot::screen_to_string(&self.app.screen)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
