//! Rendering pipeline: render context, output cache, compositor, terminal driver.

pub mod cache;
pub mod compositor;
pub mod context;
pub mod driver;

pub use cache::{CacheEntry, CacheKey, DrawOp, FrameStats, Op, RenderCache};
pub use compositor::{CellUpdate, Compositor, StyledCell};
pub use context::RenderCx;
pub use driver::Driver;
