//! The node behavior contract.

pub mod traits;

pub use traits::{Node, NodeFactory};
