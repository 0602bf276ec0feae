//! Clipping: regions containers impose on their children, and the chain of
//! them active while rendering.

pub mod chain;
pub mod region;

pub use chain::ClipChain;
pub use region::{clip_to_rect, ClipMode, ClipProvider, ClipRegion};
