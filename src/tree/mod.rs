//! Slotmap-backed node arena with tree operations and dirty tracking.

pub mod arena;
pub mod node;

pub use arena::NodeTree;
pub use node::{NodeId, NodeState};
