//! Error taxonomy for layout, render and the top-level loop.

use std::fmt;
use std::time::Instant;

use crate::tree::NodeId;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The node lifecycle phase a fault occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Measure,
    Arrange,
    Render,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Measure => "measure",
            Self::Arrange => "arrange",
            Self::Render => "render",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// NodeFault
// ---------------------------------------------------------------------------

/// A recoverable failure raised by a node during one of its phases.
///
/// Faults are contained by a [`FaultBoundary`](crate::nodes::FaultBoundary);
/// outside of one they propagate to the frame as [`RenderError::Fault`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("{phase} fault: {message}")]
pub struct NodeFault {
    pub phase: Phase,
    pub message: String,
    pub at: Instant,
    /// Set when a fallback subtree failed too; outer boundaries pass a fatal
    /// fault on instead of containing it.
    pub fatal: bool,
}

impl NodeFault {
    /// Capture a fault now.
    pub fn new(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
            at: Instant::now(),
            fatal: false,
        }
    }

    /// Mark the fault as uncontainable.
    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self
    }

    /// Build a fault from a `catch_unwind` payload.
    pub fn from_panic(phase: Phase, payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_owned()
        };
        Self::new(phase, message)
    }
}

// ---------------------------------------------------------------------------
// LayoutError
// ---------------------------------------------------------------------------

/// Constraint violations. These are programmer errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("invalid constraints: min {min} exceeds max {max} on the {axis} axis")]
    InvalidConstraints { axis: &'static str, min: i32, max: i32 },
    #[error("negative {axis} bound: {value}")]
    NegativeSize { axis: &'static str, value: i32 },
}

// ---------------------------------------------------------------------------
// RenderError
// ---------------------------------------------------------------------------

/// Errors raised while rendering a node.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderError {
    /// The node was asked to render before it was ever arranged.
    #[error("node {0:?} rendered before it was arranged")]
    Unarranged(NodeId),
    /// The node no longer exists in the tree.
    #[error("node {0:?} does not exist")]
    Missing(NodeId),
    #[error(transparent)]
    Fault(#[from] NodeFault),
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Top-level error returned by the frame loop.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("terminal i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// A fault boundary's fallback failed; there is nothing left to show.
    #[error("fallback subtree failed: {0}")]
    Fallback(NodeFault),
}

impl From<NodeFault> for Error {
    fn from(fault: NodeFault) -> Self {
        Error::Render(RenderError::Fault(fault))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
