//! Fault isolation for a subtree.
//!
//! A [`FaultBoundary`] runs every phase of its primary child under a guard
//! that turns both returned faults and panics into a [`NodeFault`]. The first
//! fault hides the primary and swaps in a fallback subtree built on demand.
//! If the fallback fails as well the fault becomes fatal and no boundary will
//! contain it again.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{NodeFault, Phase, RenderError};
use crate::geometry::{Rect, Size};
use crate::layout::{Constraints, LayoutCx};
use crate::node::{Node, NodeFactory};
use crate::render::RenderCx;
use crate::tree::{NodeId, NodeTree};

/// Run `f`, converting a panic into a fault for `phase`.
fn guarded<T>(phase: Phase, f: impl FnOnce() -> Result<T, NodeFault>) -> Result<T, NodeFault> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(NodeFault::from_panic(phase, payload)),
    }
}

fn render_fault(err: RenderError) -> NodeFault {
    match err {
        RenderError::Fault(fault) => fault,
        other => NodeFault::new(Phase::Render, other.to_string()),
    }
}

/// Contains faults of its first child.
///
/// Insert the primary subtree as the boundary's only child. The fallback
/// comes from `factory` the first time the primary fails and is a normal
/// subtree: it is laid out, painted and focusable like any other.
pub struct FaultBoundary {
    factory: NodeFactory,
    fault: Option<NodeFault>,
    fallback: Option<NodeId>,
    pending_reset: bool,
}

impl FaultBoundary {
    pub fn new(factory: impl FnMut(&mut NodeTree) -> NodeId + 'static) -> Self {
        Self { factory: Box::new(factory), fault: None, fallback: None, pending_reset: false }
    }

    /// The fault that tripped the boundary.
    pub fn fault(&self) -> Option<&NodeFault> {
        self.fault.as_ref()
    }

    pub fn is_tripped(&self) -> bool {
        self.fault.is_some()
    }

    pub fn fallback(&self) -> Option<NodeId> {
        self.fallback
    }

    /// Drop the fallback and try the primary again on the next frame. Call
    /// through [`NodeTree::update`] so the boundary is laid out again.
    pub fn reset(&mut self) {
        if self.fault.is_some() {
            self.pending_reset = true;
        }
    }

    fn primary(&self, tree: &NodeTree, me: NodeId) -> Option<NodeId> {
        tree.children(me).iter().copied().find(|&c| Some(c) != self.fallback)
    }

    fn apply_reset(&mut self, tree: &mut NodeTree, me: NodeId) {
        if !std::mem::take(&mut self.pending_reset) {
            return;
        }
        if let Some(fallback) = self.fallback.take() {
            tree.remove(fallback);
        }
        if let Some(primary) = self.primary(tree, me) {
            tree.set_visible(primary, true);
        }
        self.fault = None;
        tracing::info!(boundary = ?me, "fault boundary reset");
    }

    /// Record `fault`, hide the primary and build the fallback.
    ///
    /// A fatal fault is handed back instead of being contained.
    fn trip(
        &mut self,
        tree: &mut NodeTree,
        me: NodeId,
        fault: NodeFault,
    ) -> Result<NodeId, NodeFault> {
        if fault.fatal {
            return Err(fault);
        }
        let phase = fault.phase;
        tracing::warn!(
            boundary = ?me,
            phase = %fault.phase,
            message = %fault.message,
            "fault contained"
        );
        if let Some(primary) = self.primary(tree, me) {
            tree.set_visible(primary, false);
        }
        self.fault = Some(fault);
        if let Some(fallback) = self.fallback.filter(|&id| tree.contains(id)) {
            return Ok(fallback);
        }

        let factory = &mut self.factory;
        let fallback = guarded(phase, || Ok(factory(tree))).map_err(NodeFault::fatal)?;
        if !tree.reparent(fallback, me) {
            tree.remove(fallback);
            return Err(NodeFault::new(phase, "fallback could not be attached").fatal());
        }
        self.fallback = Some(fallback);
        Ok(fallback)
    }
}

impl fmt::Debug for FaultBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultBoundary")
            .field("fault", &self.fault)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl Node for FaultBoundary {
    fn kind(&self) -> &str {
        "boundary"
    }

    fn measure(
        &mut self,
        cx: &mut LayoutCx<'_>,
        constraints: Constraints,
    ) -> Result<Size, NodeFault> {
        let Some(me) = cx.node() else { return Ok(constraints.min_size()) };
        self.apply_reset(cx.tree_mut(), me);

        let target = match (self.fallback, self.primary(cx.tree(), me)) {
            (Some(fallback), _) if self.is_tripped() => fallback,
            (_, Some(primary)) => {
                match guarded(Phase::Measure, || cx.measure(primary, constraints)) {
                    Ok(size) => return Ok(size),
                    Err(fault) => self.trip(cx.tree_mut(), me, fault)?,
                }
            }
            (_, None) => return Ok(constraints.min_size()),
        };
        guarded(Phase::Measure, || cx.measure(target, constraints)).map_err(NodeFault::fatal)
    }

    fn arrange(&mut self, cx: &mut LayoutCx<'_>, rect: Rect) -> Result<(), NodeFault> {
        let Some(me) = cx.node() else { return Ok(()) };

        let target = match (self.fallback, self.primary(cx.tree(), me)) {
            (Some(fallback), _) if self.is_tripped() => fallback,
            (_, Some(primary)) => match guarded(Phase::Arrange, || cx.arrange(primary, rect)) {
                Ok(()) => return Ok(()),
                Err(fault) => self.trip(cx.tree_mut(), me, fault)?,
            },
            (_, None) => return Ok(()),
        };
        guarded(Phase::Arrange, || cx.arrange(target, rect)).map_err(NodeFault::fatal)
    }

    fn render(&mut self, cx: &mut RenderCx<'_>) -> Result<(), RenderError> {
        let Some(me) = cx.node() else { return Ok(()) };
        let bounds = cx.bounds();

        if !self.is_tripped() {
            let Some(primary) = self.primary(cx.tree(), me) else { return Ok(()) };
            let depth = cx.clip_depth();
            let result = guarded(Phase::Render, || cx.render_child(primary).map_err(render_fault));
            let Err(fault) = result else { return Ok(()) };

            cx.restore_clip_depth(depth);
            let fallback = self.trip(cx.tree_mut(), me, fault)?;
            cx.stats_mut().faults += 1;
            let placed = guarded(Phase::Render, || {
                cx.measure_child(fallback, Constraints::tight(bounds.size()))?;
                cx.arrange_child(fallback, bounds)
            });
            placed.map_err(NodeFault::fatal)?;
        }

        let Some(fallback) = self.fallback else { return Ok(()) };
        let depth = cx.clip_depth();
        let result = guarded(Phase::Render, || cx.render_child(fallback).map_err(render_fault));
        if result.is_err() {
            cx.restore_clip_depth(depth);
        }
        result.map_err(|fault| RenderError::Fault(fault.fatal()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::ClipChain;
    use crate::nodes::{Label, Layers};
    use crate::render::{FrameStats, RenderCache};
    use crate::theme::{Capabilities, MapTheme};

    /// Fails in the configured phase, by panic or by returned fault.
    struct Faulty {
        phase: Phase,
        panic: bool,
    }

    impl Faulty {
        fn fail(&self, phase: Phase) -> Result<(), NodeFault> {
            if phase != self.phase {
                return Ok(());
            }
            if self.panic {
                panic!("{phase} exploded");
            }
            Err(NodeFault::new(phase, "bad state"))
        }
    }

    impl Node for Faulty {
        fn kind(&self) -> &str {
            "faulty"
        }

        fn measure(&mut self, _cx: &mut LayoutCx<'_>, c: Constraints) -> Result<Size, NodeFault> {
            self.fail(Phase::Measure)?;
            Ok(c.min_size())
        }

        fn arrange(&mut self, _cx: &mut LayoutCx<'_>, _rect: Rect) -> Result<(), NodeFault> {
            self.fail(Phase::Arrange)
        }

        fn render(&mut self, cx: &mut RenderCx<'_>) -> Result<(), RenderError> {
            cx.draw(0, 0, "partial");
            self.fail(Phase::Render)?;
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn fallback_label(tree: &mut NodeTree) -> NodeId {
        tree.insert(Label::new("fallback"))
    }

    /// A fallback that fails to measure.
    fn faulty_fallback(tree: &mut NodeTree) -> NodeId {
        tree.insert(Faulty { phase: Phase::Measure, panic: false })
    }

    fn setup(phase: Phase, panic: bool) -> (NodeTree, NodeId, NodeId, NodeId) {
        let mut tree = NodeTree::new();
        let root = tree.insert(Layers::new());
        let boundary = tree.insert_child(root, FaultBoundary::new(fallback_label)).unwrap();
        let primary = tree.insert_child(boundary, Faulty { phase, panic }).unwrap();
        (tree, root, boundary, primary)
    }

    fn frame(tree: &mut NodeTree, root: NodeId) -> (Result<(), RenderError>, FrameStats) {
        let rect = Rect::new(0, 0, 10, 2);
        let layout = LayoutCx::new(tree)
            .measure(root, Constraints::tight(rect.size()))
            .and_then(|_| LayoutCx::new(tree).arrange(root, rect));
        if let Err(fault) = layout {
            return (Err(fault.into()), FrameStats::default());
        }
        let mut cache = RenderCache::new();
        let mut stats = FrameStats::default();
        let mut clip = ClipChain::new(rect, "\x1b[0m");
        let theme = MapTheme::new();
        let caps = Capabilities::default();
        let result = RenderCx::new(tree, &mut cache, &mut stats, &mut clip, &theme, caps)
            .render_child(root);
        (result, stats)
    }

    fn boundary(tree: &NodeTree, id: NodeId) -> &FaultBoundary {
        tree.downcast_ref::<FaultBoundary>(id).unwrap()
    }

    // ── Containment ──────────────────────────────────────────────────

    #[test]
    fn measure_fault_swaps_in_fallback() {
        let (mut tree, root, b, primary) = setup(Phase::Measure, false);
        let (result, _) = frame(&mut tree, root);
        assert!(result.is_ok());

        let boundary = boundary(&tree, b);
        assert_eq!(boundary.fault().unwrap().phase, Phase::Measure);
        assert_eq!(boundary.fault().unwrap().message, "bad state");
        assert!(!tree.state(primary).unwrap().visible);
        let fallback = boundary.fallback().unwrap();
        assert_eq!(tree.parent(fallback), Some(b));
        assert_eq!(tree.bounds(fallback), Some(Rect::new(0, 0, 10, 2)));
    }

    #[test]
    fn arrange_panic_is_caught() {
        let (mut tree, root, b, _primary) = setup(Phase::Arrange, true);
        let (result, _) = frame(&mut tree, root);
        assert!(result.is_ok());
        let fault = boundary(&tree, b).fault().unwrap().clone();
        assert_eq!(fault.phase, Phase::Arrange);
        assert_eq!(fault.message, "arrange exploded");
    }

    #[test]
    fn render_panic_renders_fallback_same_frame() {
        let (mut tree, root, b, _primary) = setup(Phase::Render, true);
        let (result, stats) = frame(&mut tree, root);
        assert!(result.is_ok());
        assert_eq!(stats.faults, 1);
        let fallback = boundary(&tree, b).fallback().unwrap();
        assert!(!tree.state(fallback).unwrap().dirty);
    }

    #[test]
    fn fallback_is_built_once() {
        let (mut tree, root, b, _primary) = setup(Phase::Measure, false);
        frame(&mut tree, root);
        let first = boundary(&tree, b).fallback();
        tree.mark_all_dirty();
        frame(&mut tree, root);
        assert_eq!(boundary(&tree, b).fallback(), first);
        assert_eq!(tree.children(b).len(), 2);
    }

    // ── Reset ────────────────────────────────────────────────────────

    #[test]
    fn reset_restores_primary() {
        let (mut tree, root, b, primary) = setup(Phase::Measure, false);
        frame(&mut tree, root);
        let fallback = boundary(&tree, b).fallback().unwrap();

        // Measure passes from now on.
        tree.update::<Faulty, _>(primary, |f| f.phase = Phase::Render);
        tree.update::<FaultBoundary, _>(b, FaultBoundary::reset);

        let rect = Rect::new(0, 0, 10, 2);
        LayoutCx::new(&mut tree).measure(root, Constraints::tight(rect.size())).unwrap();
        assert!(!tree.contains(fallback));
        assert!(tree.state(primary).unwrap().visible);
        assert!(!boundary(&tree, b).is_tripped());
    }

    // ── Fatal ────────────────────────────────────────────────────────

    #[test]
    fn failing_fallback_is_fatal() {
        let mut tree = NodeTree::new();
        let root = tree.insert(Layers::new());
        let b = tree.insert_child(root, FaultBoundary::new(faulty_fallback)).unwrap();
        tree.insert_child(b, Faulty { phase: Phase::Measure, panic: true }).unwrap();

        let (result, _) = frame(&mut tree, root);
        match result {
            Err(RenderError::Fault(fault)) => assert!(fault.fatal),
            other => panic!("expected fatal fault, got {other:?}"),
        }
    }

    #[test]
    fn outer_boundary_passes_fatal_through() {
        let mut tree = NodeTree::new();
        let root = tree.insert(Layers::new());
        let outer = tree.insert_child(root, FaultBoundary::new(fallback_label)).unwrap();
        let inner = tree.insert_child(outer, FaultBoundary::new(faulty_fallback)).unwrap();
        tree.insert_child(inner, Faulty { phase: Phase::Measure, panic: false }).unwrap();

        let (result, _) = frame(&mut tree, root);
        assert!(result.is_err());
        assert!(!boundary(&tree, outer).is_tripped());
    }
}
