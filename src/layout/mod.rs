//! Two-pass layout: constraints go down in measure, rects go down in arrange.

pub mod constraints;
pub mod context;
pub mod sizing;

pub use constraints::{Constraints, UNBOUNDED};
pub use context::LayoutCx;
pub use sizing::{distribute, Axis, SizeHint};
