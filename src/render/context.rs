//! The render context threaded through a paint pass.

use crate::ansi::{truncate, visible_width, Style};
use crate::clip::{ClipChain, ClipProvider, ClipRegion};
use crate::error::{NodeFault, RenderError};
use crate::geometry::{Offset, Rect, Size};
use crate::layout::{Constraints, LayoutCx};
use crate::surface::Surface;
use crate::theme::{Capabilities, Theme};
use crate::tree::{NodeId, NodeTree};

use super::cache::{CacheEntry, CacheKey, DrawOp, FrameStats, Op, RenderCache};

/// State shared by every node during one render pass.
///
/// Each node renders into its own context: draws are clipped against the
/// active [`ClipChain`] immediately and recorded as [`Op`]s, so the node's
/// output can be cached and replayed while it stays clean.
pub struct RenderCx<'a> {
    tree: &'a mut NodeTree,
    cache: &'a mut RenderCache,
    stats: &'a mut FrameStats,
    clip: &'a mut ClipChain,
    theme: &'a dyn Theme,
    caps: Capabilities,
    node: Option<NodeId>,
    ambient: Style,
    cursor: Offset,
    ops: Vec<Op>,
    cursor_request: Option<Offset>,
}

impl<'a> RenderCx<'a> {
    /// A top-level context; render the root with [`render_child`](Self::render_child).
    pub fn new(
        tree: &'a mut NodeTree,
        cache: &'a mut RenderCache,
        stats: &'a mut FrameStats,
        clip: &'a mut ClipChain,
        theme: &'a dyn Theme,
        caps: Capabilities,
    ) -> Self {
        Self {
            tree,
            cache,
            stats,
            clip,
            theme,
            caps,
            node: None,
            ambient: Style::new(),
            cursor: Offset::ZERO,
            ops: Vec::new(),
            cursor_request: None,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The node being rendered, `None` at the top level.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Bounds of the node being rendered.
    pub fn bounds(&self) -> Rect {
        self.node.and_then(|id| self.tree.bounds(id)).unwrap_or(Rect::EMPTY)
    }

    /// Children of the current node in paint order.
    pub fn children(&self) -> Vec<NodeId> {
        match self.node {
            Some(id) => self.tree.children(id).to_vec(),
            None => self.tree.root().into_iter().collect(),
        }
    }

    pub fn tree(&self) -> &NodeTree {
        self.tree
    }

    /// Whether the current node has focus.
    pub fn is_focused(&self) -> bool {
        self.node
            .and_then(|id| self.tree.state(id))
            .is_some_and(|s| s.focused)
    }

    pub fn theme(&self) -> &dyn Theme {
        self.theme
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// The inherited style draws start from.
    pub fn ambient(&self) -> Style {
        self.ambient
    }

    pub fn clip(&self) -> &ClipChain {
        self.clip
    }

    pub fn stats_mut(&mut self) -> &mut FrameStats {
        self.stats
    }

    // -----------------------------------------------------------------------
    // Scopes
    // -----------------------------------------------------------------------

    /// Run `f` with `style` as the ambient style, restoring the previous
    /// ambient afterwards.
    pub fn with_ambient<R>(&mut self, style: Style, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.ambient;
        self.ambient = style;
        let result = f(self);
        self.ambient = saved;
        result
    }

    /// Run `f` inside `region`.
    pub fn with_clip<R>(&mut self, region: ClipRegion, f: impl FnOnce(&mut Self) -> R) -> R {
        let depth = self.clip.depth();
        self.clip.push(region);
        let result = f(self);
        self.clip.truncate(depth);
        result
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    /// Draw styled text at absolute `(x, y)`, clipped to the active chain.
    pub fn draw(&mut self, x: i32, y: i32, text: &str) {
        if let Some((x, text)) = self.clip.clip_string(x, y, text) {
            self.ops.push(Op::Draw(DrawOp { x, y, text, style: self.ambient }));
        }
    }

    /// Draw text in `style` instead of the ambient style.
    pub fn draw_styled(&mut self, x: i32, y: i32, text: &str, style: Style) {
        if let Some((x, text)) = self.clip.clip_string(x, y, text) {
            self.ops.push(Op::Draw(DrawOp { x, y, text, style }));
        }
    }

    /// Fill `rect` with blanks in the ambient style.
    pub fn fill(&mut self, rect: Rect) {
        let visible = rect.intersection(self.clip.effective_rect());
        if visible.is_empty() {
            return;
        }
        for y in visible.y..visible.bottom() {
            self.ops.push(Op::Fill { x: visible.x, y, width: visible.width, style: self.ambient });
        }
    }

    /// Move the write cursor to absolute `(x, y)`.
    pub fn move_to(&mut self, x: i32, y: i32) {
        self.cursor = Offset::new(x, y);
    }

    /// Draw at the write cursor and advance it past the text.
    pub fn write(&mut self, text: &str) {
        let Offset { x, y } = self.cursor;
        self.draw(x, y, text);
        let width = i32::try_from(visible_width(text)).unwrap_or(i32::MAX);
        self.cursor.x = x.saturating_add(width);
    }

    /// Ask for the terminal cursor at absolute `(x, y)`. Ignored when that
    /// cell is clipped away.
    pub fn show_cursor_at(&mut self, x: i32, y: i32) {
        if self.clip.contains(x, y) {
            self.cursor_request = Some(Offset::new(x, y));
        }
    }

    /// Draw `surface` with its top-left at `origin`. Transparent cells are
    /// skipped, so earlier output beneath them stays visible.
    pub fn draw_surface(&mut self, surface: &Surface, origin: Offset) {
        let sub_cell = self.caps.sub_cell_graphics;
        for run in surface.runs(sub_cell) {
            self.draw(origin.x + run.x as i32, origin.y + run.y as i32, &run.text);
        }
    }

    /// Cut `text` to fit `width` columns, padding with spaces to exactly
    /// `width`.
    pub fn fit(&self, text: &str, width: i32) -> String {
        let width = usize::try_from(width).unwrap_or(0);
        let mut out = truncate(text, width, &self.clip.reset_codes());
        let used = visible_width(&out);
        out.extend(std::iter::repeat(' ').take(width.saturating_sub(used)));
        out
    }

    // -----------------------------------------------------------------------
    // Children
    // -----------------------------------------------------------------------

    /// Render `child`, or replay its cached output when it is clean and its
    /// bounds, clip and ambient style are unchanged.
    pub fn render_child(&mut self, child: NodeId) -> Result<(), RenderError> {
        let state = self.tree.state(child).ok_or(RenderError::Missing(child))?;
        if !state.visible {
            return Ok(());
        }
        let bounds = state.bounds.ok_or(RenderError::Unarranged(child))?;
        let key = CacheKey { bounds, clip: self.clip.effective_rect(), ambient: self.ambient };

        if !state.dirty && self.cache.is_fresh(child, &key) {
            self.stats.replayed += 1;
            self.ops.push(Op::Child(child));
            return Ok(());
        }

        let Self { tree, cache, stats, clip, theme, caps, ambient, .. } = self;
        let outcome = tree.with_node(child, |node, tree| {
            let mut cx = RenderCx {
                tree,
                cache: &mut **cache,
                stats: &mut **stats,
                clip: &mut **clip,
                theme: *theme,
                caps: *caps,
                node: Some(child),
                ambient: *ambient,
                cursor: bounds.origin(),
                ops: Vec::new(),
                cursor_request: None,
            };
            let result = node.render(&mut cx);
            tracing::trace!(?child, kind = node.kind(), ops = cx.ops.len(), "node rendered");
            result.map(|()| (cx.ops, cx.cursor_request))
        });

        match outcome {
            None => Err(RenderError::Missing(child)),
            Some(Err(err)) => {
                self.cache.evict(child);
                Err(err)
            }
            Some(Ok((ops, cursor))) => {
                self.cache.insert(child, CacheEntry { key, ops, cursor });
                if let Some(state) = self.tree.state_mut(child) {
                    state.dirty = false;
                }
                self.stats.rendered += 1;
                self.ops.push(Op::Child(child));
                Ok(())
            }
        }
    }

    /// Measure a node during render, e.g. one created lazily.
    pub fn measure_child(
        &mut self,
        child: NodeId,
        constraints: Constraints,
    ) -> Result<Size, NodeFault> {
        LayoutCx::new(self.tree).measure(child, constraints)
    }

    /// Arrange a node during render, e.g. one created lazily.
    pub fn arrange_child(&mut self, child: NodeId, rect: Rect) -> Result<(), NodeFault> {
        LayoutCx::new(self.tree).arrange(child, rect)
    }

    /// Structural access for nodes that build children lazily.
    pub(crate) fn tree_mut(&mut self) -> &mut NodeTree {
        self.tree
    }

    /// Number of clip regions entered, to restore after a caught unwind.
    pub(crate) fn clip_depth(&self) -> usize {
        self.clip.depth()
    }

    pub(crate) fn restore_clip_depth(&mut self, depth: usize) {
        self.clip.truncate(depth);
    }
}


// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Label, Stack, Themed};
    use crate::render::compositor::Compositor;
    use crate::theme::MapTheme;

    const SCREEN: Rect = Rect::new(0, 0, 10, 3);

    fn three_labels() -> (NodeTree, NodeId, Vec<NodeId>) {
        let mut tree = NodeTree::new();
        let root = tree.insert(Stack::vertical());
        tree.set_root(root);
        let labels = ["one", "two", "six"]
            .into_iter()
            .map(|t| tree.insert_child(root, Label::new(t)).unwrap())
            .collect();
        LayoutCx::new(&mut tree).arrange(root, SCREEN).unwrap();
        (tree, root, labels)
    }

    fn pass(tree: &mut NodeTree, cache: &mut RenderCache, root: NodeId) -> FrameStats {
        let theme = MapTheme::new();
        let mut stats = FrameStats::default();
        let mut clip = ClipChain::new(SCREEN, theme.reset_codes());
        RenderCx::new(tree, cache, &mut stats, &mut clip, &theme, Capabilities::default())
            .render_child(root)
            .unwrap();
        stats
    }

    fn rows(cache: &RenderCache, root: NodeId) -> Vec<String> {
        let mut target = Compositor::new(10, 3);
        cache.replay(root, &mut target);
        (0..3).map(|y| target.row_text(y).trim_end().to_owned()).collect()
    }

    // ── Cache replay ────────────────────────────────────────────────

    #[test]
    fn first_pass_renders_every_node() {
        let (mut tree, root, _) = three_labels();
        let mut cache = RenderCache::new();
        let stats = pass(&mut tree, &mut cache, root);
        assert_eq!(stats.rendered, 4);
        assert_eq!(cache.len(), 4);
        assert_eq!(rows(&cache, root), vec!["one", "two", "six"]);
    }

    #[test]
    fn clean_tree_replays_the_root() {
        let (mut tree, root, _) = three_labels();
        let mut cache = RenderCache::new();
        pass(&mut tree, &mut cache, root);
        let stats = pass(&mut tree, &mut cache, root);
        assert_eq!(stats, FrameStats { rendered: 0, replayed: 1, faults: 0 });
        assert_eq!(rows(&cache, root), vec!["one", "two", "six"]);
    }

    #[test]
    fn dirty_leaf_renders_only_its_path() {
        let (mut tree, root, labels) = three_labels();
        let mut cache = RenderCache::new();
        pass(&mut tree, &mut cache, root);

        tree.update::<Label, _>(labels[1], |l| l.set_text("TWO"));
        let stats = pass(&mut tree, &mut cache, root);
        assert_eq!(stats.rendered, 2);
        assert_eq!(stats.replayed, 2);
        assert_eq!(rows(&cache, root), vec!["one", "TWO", "six"]);
    }

    #[test]
    fn moved_node_is_rendered_again() {
        let (mut tree, root, labels) = three_labels();
        let mut cache = RenderCache::new();
        pass(&mut tree, &mut cache, root);

        LayoutCx::new(&mut tree).arrange(labels[2], Rect::new(2, 2, 8, 1)).unwrap();
        tree.mark_dirty(root);
        let stats = pass(&mut tree, &mut cache, root);
        assert_eq!(stats.rendered, 2);
        assert_eq!(rows(&cache, root)[2], "  six");
    }

    // ── Scopes ──────────────────────────────────────────────────────

    #[test]
    fn ambient_is_restored_after_scope() {
        let mut tree = NodeTree::new();
        let mut cache = RenderCache::new();
        let mut stats = FrameStats::default();
        let theme = MapTheme::new();
        let mut clip = ClipChain::new(SCREEN, theme.reset_codes());
        let caps = Capabilities::default();
        let mut cx = RenderCx::new(&mut tree, &mut cache, &mut stats, &mut clip, &theme, caps);

        let bold = Style::new().bold();
        let inner = cx.with_ambient(bold, |cx| cx.ambient());
        assert_eq!(inner, bold);
        assert_eq!(cx.ambient(), Style::new());
    }

    #[test]
    fn clip_scope_is_popped() {
        let mut tree = NodeTree::new();
        let mut cache = RenderCache::new();
        let mut stats = FrameStats::default();
        let theme = MapTheme::new();
        let mut clip = ClipChain::new(SCREEN, theme.reset_codes());
        let caps = Capabilities::default();
        let mut cx = RenderCx::new(&mut tree, &mut cache, &mut stats, &mut clip, &theme, caps);

        let depth = cx.with_clip(ClipRegion::clip(Rect::new(0, 0, 2, 1)), |cx| {
            cx.draw(0, 0, "cut here");
            cx.clip().depth()
        });
        assert_eq!(depth, 1);
        assert_eq!(cx.clip().depth(), 0);
        assert_eq!(
            cx.ops,
            vec![Op::Draw(DrawOp { x: 0, y: 0, text: "cu".into(), style: Style::new() })]
        );
    }

    #[test]
    fn ambient_change_invalidates_children() {
        let mut tree = NodeTree::new();
        let root = tree.insert(Themed::new().bold());
        tree.set_root(root);
        let label = tree.insert_child(root, Label::new("x")).unwrap();
        LayoutCx::new(&mut tree).arrange(root, SCREEN).unwrap();
        let mut cache = RenderCache::new();
        pass(&mut tree, &mut cache, root);
        assert!(cache.get(label).is_some_and(|e| e.key.ambient.bold));

        tree.update::<Themed, _>(root, |t| *t = Themed::new());
        let stats = pass(&mut tree, &mut cache, root);
        assert_eq!(stats.rendered, 2);
        assert!(cache.get(label).is_some_and(|e| !e.key.ambient.bold));
    }

    // ── Drawing helpers ─────────────────────────────────────────────

    #[test]
    fn write_advances_cursor() {
        let mut tree = NodeTree::new();
        let mut cache = RenderCache::new();
        let mut stats = FrameStats::default();
        let theme = MapTheme::new();
        let mut clip = ClipChain::new(SCREEN, theme.reset_codes());
        let caps = Capabilities::default();
        let mut cx = RenderCx::new(&mut tree, &mut cache, &mut stats, &mut clip, &theme, caps);

        cx.move_to(1, 0);
        cx.write("ab");
        cx.write("c");
        assert_eq!(cx.ops.len(), 2);
        assert_eq!(
            cx.ops[1],
            Op::Draw(DrawOp { x: 3, y: 0, text: "c".into(), style: Style::new() })
        );
    }

    #[test]
    fn fit_pads_and_truncates() {
        let mut tree = NodeTree::new();
        let mut cache = RenderCache::new();
        let mut stats = FrameStats::default();
        let theme = MapTheme::new();
        let mut clip = ClipChain::new(SCREEN, theme.reset_codes());
        let caps = Capabilities::default();
        let cx = RenderCx::new(&mut tree, &mut cache, &mut stats, &mut clip, &theme, caps);
        assert_eq!(cx.fit("ab", 4), "ab  ");
        assert_eq!(cx.fit("abcdef", 3), "abc");
    }

    #[test]
    fn draw_surface_skips_transparent_cells() {
        let mut tree = NodeTree::new();
        let mut cache = RenderCache::new();
        let mut stats = FrameStats::default();
        let theme = MapTheme::new();
        let mut clip = ClipChain::new(SCREEN, theme.reset_codes());
        let caps = Capabilities::default();
        let mut cx = RenderCx::new(&mut tree, &mut cache, &mut stats, &mut clip, &theme, caps);

        let mut surface = Surface::new(5, 1);
        surface.put_text(3, 0, "z", None);
        cx.draw_surface(&surface, Offset::new(2, 1));
        assert_eq!(
            cx.ops,
            vec![Op::Draw(DrawOp { x: 5, y: 1, text: "z".into(), style: Style::new() })]
        );
    }
}
