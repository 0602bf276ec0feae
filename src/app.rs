//! App struct: configuration, terminal setup, the async run loop.
//!
//! [`App`] ties together the screen and the driver. The `new_headless`
//! constructor allows testing without a real terminal.

use std::time::Duration;

use crossterm::event::EventStream;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::Error;
use crate::event::input::{try_from_crossterm, InputEvent};
use crate::render::driver::Driver;
use crate::screen::{FrameReport, Screen};
use crate::theme::{Capabilities, MapTheme};

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Optional window/app title.
    pub title: Option<String>,
    /// Target frames per second for the render loop.
    pub fps: u32,
    /// Report mouse events from the terminal.
    pub mouse_capture: bool,
    /// What the terminal can display.
    pub capabilities: Capabilities,
    pub theme: MapTheme,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: None,
            fps: 60,
            mouse_capture: true,
            capabilities: Capabilities::default(),
            theme: MapTheme::new(),
        }
    }
}

impl AppConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title (builder).
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the target FPS (builder). Zero is treated as one.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Enable or disable mouse reporting (builder).
    pub fn with_mouse_capture(mut self, enabled: bool) -> Self {
        self.mouse_capture = enabled;
        self
    }

    /// Set the terminal capabilities (builder).
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set the theme (builder).
    pub fn with_theme(mut self, theme: MapTheme) -> Self {
        self.theme = theme;
        self
    }

    /// Time between frames.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// The main application struct.
///
/// Owns the screen, driver and config. The driver is optional to support
/// headless testing.
pub struct App {
    /// The screen (tree, focus, popups, compositor).
    pub screen: Screen,
    /// Terminal output driver. `None` in headless mode.
    pub driver: Option<Driver>,
    /// Application configuration.
    pub config: AppConfig,
}

impl App {
    /// Create a new app with a real terminal driver.
    ///
    /// Queries the terminal size to set the initial screen dimensions.
    pub fn new(config: AppConfig) -> Result<Self, Error> {
        let (width, height) = Driver::terminal_size()?;
        let driver = Driver::new(config.capabilities)?;
        Ok(Self::build(Screen::new(width, height), Some(driver), config))
    }

    /// Create a headless app for testing (no terminal driver).
    ///
    /// Uses the given dimensions for the screen size.
    pub fn new_headless(width: u16, height: u16) -> Self {
        Self::build(Screen::new(width, height), None, AppConfig::default())
    }

    /// A headless app with `config` applied.
    pub fn new_headless_with(width: u16, height: u16, config: AppConfig) -> Self {
        Self::build(Screen::new(width, height), None, config)
    }

    fn build(mut screen: Screen, driver: Option<Driver>, config: AppConfig) -> Self {
        screen.set_theme(Box::new(config.theme.clone()));
        screen.set_capabilities(config.capabilities);
        Self { screen, driver, config }
    }

    /// Whether the app has a terminal driver (not headless).
    pub fn has_driver(&self) -> bool {
        self.driver.is_some()
    }

    /// Whether the app should quit.
    pub fn should_quit(&self) -> bool {
        self.screen.should_quit()
    }

    /// Request the app to quit.
    pub fn request_quit(&mut self) {
        self.screen.request_quit();
    }

    /// Route one event and wait for the blocking actions it started.
    pub async fn dispatch(&mut self, event: InputEvent) {
        let blocking = self.screen.handle_input(event);
        await_blocking(blocking).await;
    }

    /// Produce a frame and, with a driver, write it to the terminal.
    pub fn present(&mut self) -> Result<FrameReport, Error> {
        let report = self.screen.frame()?;
        if let Some(driver) = self.driver.as_mut() {
            driver.apply_updates(&report.updates)?;
            driver.set_cursor_position(report.cursor)?;
            driver.flush()?;
        }
        Ok(report)
    }

    /// Run until a quit is requested or the input stream ends.
    ///
    /// Enters the alternate screen, renders at the configured frame rate and
    /// restores the terminal on the way out, even when the loop fails. A
    /// headless app returns immediately.
    pub async fn run(&mut self) -> Result<(), Error> {
        let Some(driver) = self.driver.as_mut() else {
            tracing::debug!("headless app, nothing to run");
            return Ok(());
        };
        driver.enter_alt_screen(self.config.mouse_capture)?;
        if let Some(title) = &self.config.title {
            driver.set_title(title)?;
        }
        driver.hide_cursor()?;
        tracing::info!(fps = self.config.fps, "app started");

        let result = self.event_loop().await;
        let teardown = match self.driver.as_mut() {
            Some(driver) => driver.leave_alt_screen(),
            None => Ok(()),
        };
        tracing::info!(ok = result.is_ok(), "app stopped");
        settle(result, teardown)
    }

    async fn event_loop(&mut self) -> Result<(), Error> {
        let mut events = EventStream::new();
        let mut tick = tokio::time::interval(self.config.frame_interval());
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !self.should_quit() {
            tokio::select! {
                event = events.next() => match event {
                    Some(Ok(event)) => {
                        if let Some(input) = try_from_crossterm(event) {
                            self.dispatch(input).await;
                        }
                    }
                    Some(Err(err)) => return Err(err.into()),
                    None => break,
                },
                _ = tick.tick() => {
                    self.present()?;
                }
            }
        }
        Ok(())
    }
}

/// The loop's own error wins over a failed terminal restore, which is only
/// logged then.
fn settle(result: Result<(), Error>, teardown: std::io::Result<()>) -> Result<(), Error> {
    match (result, teardown) {
        (Err(err), Err(teardown)) => {
            tracing::warn!(%teardown, "terminal restore failed");
            Err(err)
        }
        (Err(err), Ok(())) => Err(err),
        (Ok(()), teardown) => teardown.map_err(Error::from),
    }
}

async fn await_blocking(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if let Err(err) = handle.await {
            tracing::warn!(%err, "blocking action failed");
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
