//! Built-in nodes: containers, leaves and the fault boundary.

pub mod border;
pub mod boundary;
pub mod canvas;
pub mod label;
pub mod layers;
pub mod scroll;
pub mod splitter;
pub mod stack;
pub mod themed;

pub use border::{Border, BorderGlyphs};
pub use boundary::FaultBoundary;
pub use canvas::Canvas;
pub use label::{Label, Spacer};
pub use layers::{Layers, PopupHost};
pub use scroll::{ScrollPanel, ScrollState, ScrollbarState};
pub use splitter::Splitter;
pub use stack::Stack;
pub use themed::Themed;
