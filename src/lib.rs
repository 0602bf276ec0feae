//! # tessera-tui
//!
//! A retained-mode terminal rendering engine.
//!
//! Applications build a tree of [`Node`](node::Node)s. Each frame the tree is
//! measured and arranged, repainted along dirty paths only, clipped exactly
//! around embedded ANSI codes, and diffed against the previous frame so only
//! changed cells reach the terminal. Input is routed through scoped focus,
//! popup layers and per-node key bindings.
//!
//! ## Core Systems
//!
//! - **[`tree`]**: slotmap-backed node arena with dirty tracking
//! - **[`layout`]**: two-pass measure/arrange with constraints and size hints
//! - **[`ansi`]**: escape-aware width, slicing and truncation
//! - **[`clip`]**: clip regions and the chain active while rendering
//! - **[`surface`]**: off-screen cell grids with braille and block sub-cell glyphs
//! - **[`render`]**: render context, per-node output cache, compositor, terminal driver
//! - **[`focus`]**: focus scopes, rings and the focus manager
//! - **[`event`]**: input events, bindings, async actions, drags, dispatch
//! - **[`popup`]**: anchored popup layers
//! - **[`nodes`]**: built-in nodes: labels, stacks, borders, scroll panels, splitters
//! - **[`screen`]**: one frame end to end, and input routing
//! - **[`app`]**: the terminal run loop
//! - **[`testing`]**: headless pilot and snapshot helpers

// Foundation
pub mod error;
pub mod geometry;

// Text and drawing
pub mod ansi;
pub mod clip;
pub mod surface;
pub mod theme;

// Tree and layout
pub mod layout;
pub mod node;
pub mod tree;

// Behavior
pub mod event;
pub mod focus;
pub mod popup;

// Rendering
pub mod render;

// Built-in nodes
pub mod nodes;

// Application
pub mod app;
pub mod screen;

// Testing
pub mod testing;

pub use app::{App, AppConfig};
pub use error::{Error, NodeFault, Phase, RenderError};
pub use node::Node;
pub use screen::{FrameReport, Screen};
pub use tree::{NodeId, NodeTree};

/// The types most applications need.
pub mod prelude {
    pub use crate::ansi::{Color, Style};
    pub use crate::app::{App, AppConfig};
    pub use crate::error::{Error, NodeFault, RenderError};
    pub use crate::event::{
        Action, ActionCx, BindingBuilder, EventCx, Key, KeyEvent, Modifiers, MouseEvent,
    };
    pub use crate::focus::FocusScope;
    pub use crate::geometry::{Offset, Rect, Size};
    pub use crate::layout::{Constraints, LayoutCx, SizeHint};
    pub use crate::node::Node;
    pub use crate::nodes::*;
    pub use crate::popup::{AnchorSide, PopupRequest};
    pub use crate::render::RenderCx;
    pub use crate::screen::Screen;
    pub use crate::theme::{Capabilities, MapTheme, Theme};
    pub use crate::tree::{NodeId, NodeTree};
}
