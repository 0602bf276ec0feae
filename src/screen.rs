//! The screen: node tree, focus, popups and the frame pipeline.
//!
//! [`Screen`] owns everything one terminal screen needs. Each call to
//! [`frame`](Screen::frame) applies queued mutations, lays the whole tree out,
//! renders dirty nodes (replaying cached output for the rest), replays the
//! result into a cell buffer and diffs it against the previous frame.
//! [`handle_input`](Screen::handle_input) routes one input event.

use std::time::Instant;

use tokio::task::JoinHandle;

use crate::clip::ClipChain;
use crate::error::{Error, NodeFault, RenderError};
use crate::event::action::{DrainStats, MutationQueue, MutationSender};
use crate::event::binding::{BindingAction, KeyBindingRegistry};
use crate::event::dispatch::{
    dispatch_key, dispatch_mouse_down, dispatch_wheel, hit_test, HitFilter, Request,
};
use crate::event::drag::DragState;
use crate::event::input::{ClickTracker, InputEvent, KeyEvent, MouseAction, MouseEvent};
use crate::focus::ring::scope_of;
use crate::focus::{FocusManager, FocusScope};
use crate::geometry::{Offset, Rect, Size};
use crate::layout::{Constraints, LayoutCx};
use crate::node::Node;
use crate::nodes::Layers;
use crate::popup::{PopupRequest, PopupStack};
use crate::render::{CellUpdate, Compositor, FrameStats, RenderCache, RenderCx};
use crate::theme::{Capabilities, MapTheme, Theme};
use crate::tree::{NodeId, NodeTree};

// ---------------------------------------------------------------------------
// FrameReport
// ---------------------------------------------------------------------------

/// What one frame produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Cells that differ from the previous frame.
    pub updates: Vec<CellUpdate>,
    /// Where the terminal cursor should be shown, if anywhere.
    pub cursor: Option<(u16, u16)>,
    pub stats: FrameStats,
    pub mutations: DrainStats,
}

// ---------------------------------------------------------------------------
// Screen
// ---------------------------------------------------------------------------

/// A single screen: tree, focus, popups, render cache, compositor.
///
/// The tree root is a [`Layers`] node. Application content goes in its first
/// layer through [`mount`](Self::mount); popups are appended above it.
pub struct Screen {
    tree: NodeTree,
    root: NodeId,
    content: Option<NodeId>,
    size: Size,
    focus: FocusManager,
    popups: PopupStack,
    cache: RenderCache,
    current: Compositor,
    previous: Compositor,
    theme: Box<dyn Theme>,
    capabilities: Capabilities,
    bindings: KeyBindingRegistry,
    clicks: ClickTracker,
    drag: Option<DragState>,
    hovered: Option<NodeId>,
    mutations: MutationQueue,
    commands: Vec<String>,
    quit: bool,
    /// Send every cell on the next frame, not just the changed ones.
    full_repaint: bool,
}

impl Screen {
    /// Create a screen of the given size with the default key bindings and
    /// an empty theme.
    pub fn new(width: u16, height: u16) -> Self {
        let mut tree = NodeTree::new();
        let root = tree.insert(Layers::new());
        Self {
            tree,
            root,
            content: None,
            size: Size::new(i32::from(width), i32::from(height)),
            focus: FocusManager::new(),
            popups: PopupStack::new(),
            cache: RenderCache::new(),
            current: Compositor::new(width, height),
            previous: Compositor::new(width, height),
            theme: Box::new(MapTheme::new()),
            capabilities: Capabilities::default(),
            bindings: KeyBindingRegistry::with_defaults(),
            clicks: ClickTracker::default(),
            drag: None,
            hovered: None,
            mutations: MutationQueue::new(),
            commands: Vec::new(),
            quit: false,
            full_repaint: true,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut NodeTree {
        &mut self.tree
    }

    /// The layer root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The mounted content, if any.
    pub fn content(&self) -> Option<NodeId> {
        self.content
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn rect(&self) -> Rect {
        self.size.to_rect()
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focus.focused()
    }

    pub fn popups(&self) -> &PopupStack {
        &self.popups
    }

    /// Global key bindings, consulted after the focused path declined a key.
    pub fn bindings_mut(&mut self) -> &mut KeyBindingRegistry {
        &mut self.bindings
    }

    /// The current frame's cell buffer.
    pub fn compositor(&self) -> &Compositor {
        &self.current
    }

    /// The current frame as plain text, one string per row.
    pub fn text(&self) -> Vec<String> {
        (0..self.current.height).map(|y| self.current.row_text(y)).collect()
    }

    /// A sender async work can post tree edits through.
    pub fn mutation_sender(&self) -> MutationSender {
        self.mutations.sender()
    }

    pub fn set_theme(&mut self, theme: Box<dyn Theme>) {
        self.theme = theme;
        self.tree.mark_all_dirty();
    }

    pub fn set_capabilities(&mut self, capabilities: Capabilities) {
        self.capabilities = capabilities;
        self.tree.mark_all_dirty();
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Whether a quit was requested.
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    /// Commands from [`BindingAction::Custom`] bindings and
    /// [`EventCx::command`](crate::event::EventCx::command), oldest first.
    pub fn take_commands(&mut self) -> Vec<String> {
        std::mem::take(&mut self.commands)
    }

    // -----------------------------------------------------------------------
    // Content, focus, popups
    // -----------------------------------------------------------------------

    /// Replace the content layer with `node`. Open popups are closed.
    pub fn mount(&mut self, node: impl Node) -> Option<NodeId> {
        self.mount_boxed(Box::new(node))
    }

    pub fn mount_boxed(&mut self, node: Box<dyn Node>) -> Option<NodeId> {
        while self.popups.pop(&mut self.tree, &mut self.focus) {}
        if let Some(old) = self.content.take() {
            self.tree.remove(old);
        }
        self.focus.prune(&mut self.tree);
        let id = self.tree.insert_child_boxed(self.root, node)?;
        self.content = Some(id);
        Some(id)
    }

    /// Focus `id`; see [`FocusManager::focus`]. Nodes behind a modal popup
    /// are refused.
    pub fn set_focus(&mut self, id: NodeId) -> bool {
        if !self.popups.accepts(&self.tree, id) {
            tracing::debug!(?id, "focus behind modal popup refused");
            return false;
        }
        self.focus.focus(&mut self.tree, id)
    }

    /// Focus the first entry of the active scope.
    pub fn focus_first(&mut self) -> bool {
        self.focus.blur(&mut self.tree);
        let scope = self.focus_scope();
        self.focus.navigate(&mut self.tree, scope, true)
    }

    pub fn open_popup(&mut self, request: PopupRequest) -> Option<NodeId> {
        let screen = self.rect();
        self.popups.push(&mut self.tree, &mut self.focus, self.root, screen, request)
    }

    /// Close the top popup.
    pub fn close_popup(&mut self) -> bool {
        self.popups.pop(&mut self.tree, &mut self.focus)
    }

    /// The scope Tab moves through: the top modal popup, or everything.
    fn focus_scope(&self) -> NodeId {
        self.popups.modal_scope().unwrap_or(self.root)
    }

    // -----------------------------------------------------------------------
    // Frame
    // -----------------------------------------------------------------------

    /// Resize the screen. Everything is repainted on the next frame.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.size = Size::new(i32::from(width), i32::from(height));
        self.current.resize(width, height);
        self.previous.resize(width, height);
        self.tree.mark_all_dirty();
        self.full_repaint = true;
        tracing::debug!(width, height, "screen resized");
    }

    /// Produce the next frame.
    ///
    /// Returns [`Error::Fallback`] when a fault boundary's fallback failed,
    /// and [`Error::Render`] for a fault no boundary contained.
    pub fn frame(&mut self) -> Result<FrameReport, Error> {
        let mutations = self.mutations.drain(&mut self.tree);
        self.evict_removed();
        self.popups.prune(&mut self.tree);
        self.focus.prune(&mut self.tree);

        let screen = self.rect();
        let mut cx = LayoutCx::new(&mut self.tree);
        cx.measure(self.root, Constraints::tight(screen.size())).map_err(escalate)?;
        cx.arrange(self.root, screen).map_err(escalate)?;
        self.evict_removed();

        let mut stats = FrameStats::default();
        let mut clip = ClipChain::new(screen, self.theme.reset_codes());
        let rendered = RenderCx::new(
            &mut self.tree,
            &mut self.cache,
            &mut stats,
            &mut clip,
            self.theme.as_ref(),
            self.capabilities,
        )
        .render_child(self.root);
        match rendered {
            Ok(()) => {}
            Err(RenderError::Fault(fault)) => return Err(escalate(fault)),
            Err(err) => return Err(err.into()),
        }
        // Boundaries may build or drop subtrees while rendering.
        self.focus.prune(&mut self.tree);

        std::mem::swap(&mut self.current, &mut self.previous);
        self.current.clear();
        let cursor = self
            .cache
            .replay(self.root, &mut self.current)
            .and_then(|Offset { x, y }| Some((u16::try_from(x).ok()?, u16::try_from(y).ok()?)));
        let updates = if std::mem::take(&mut self.full_repaint) {
            self.current.full_updates()
        } else {
            self.current.diff(&self.previous)
        };

        tracing::debug!(
            rendered = stats.rendered,
            replayed = stats.replayed,
            faults = stats.faults,
            changed = updates.len(),
            applied = mutations.applied,
            dropped = mutations.dropped,
            "frame"
        );
        Ok(FrameReport { updates, cursor, stats, mutations })
    }

    fn evict_removed(&mut self) {
        for id in self.tree.take_removed() {
            self.cache.evict(id);
            if self.hovered == Some(id) {
                self.hovered = None;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Route one input event. Returns the handles of blocking async actions
    /// it started, which must finish before the next frame.
    pub fn handle_input(&mut self, event: InputEvent) -> Vec<JoinHandle<()>> {
        match event {
            InputEvent::Key(key) => return self.handle_key(&key),
            InputEvent::Mouse(mouse) => self.handle_mouse(mouse),
            InputEvent::Resize { width, height } => self.resize(width, height),
        }
        Vec::new()
    }

    fn handle_key(&mut self, key: &KeyEvent) -> Vec<JoinHandle<()>> {
        let modal = self.popups.modal_scope();
        let focused = self.focus.focused().filter(|&id| self.tree.contains(id));
        let start = match (focused, modal) {
            (Some(f), Some(m)) if self.tree.is_within(f, m) => f,
            (_, Some(m)) => m,
            (Some(f), None) => f,
            (None, None) => self.root,
        };

        let mut requests = Vec::new();
        let sender = self.mutations.sender();
        let outcome = dispatch_key(&mut self.tree, start, modal, key, &mut requests, &sender);
        self.execute(requests);
        if outcome.handled {
            return outcome.blocking;
        }

        if let Some(action) = self.bindings.resolve(key).cloned() {
            tracing::trace!(?action, "global binding");
            match action {
                BindingAction::FocusNext | BindingAction::FocusPrevious => {
                    let forward = action == BindingAction::FocusNext;
                    let scope = self.focus_scope();
                    self.focus.navigate(&mut self.tree, scope, forward);
                }
                BindingAction::DismissPopup => {
                    self.close_popup();
                }
                BindingAction::Quit => self.quit = true,
                BindingAction::Custom(name) => self.commands.push(name),
            }
        }
        outcome.blocking
    }

    fn handle_mouse(&mut self, mut event: MouseEvent) {
        let at = event.position();
        match event.kind {
            MouseAction::Down(button) => {
                event.click_count = self.clicks.press(button, event.x, event.y, Instant::now());
                if !self.popups.is_empty() && !self.popups.top_contains(&self.tree, at.x, at.y) {
                    tracing::trace!(?at, "click outside popup");
                    self.close_popup();
                    return;
                }
                let Some(target) = self.hit(at, HitFilter::Targets) else {
                    return;
                };
                if scope_of(&self.tree, target) != FocusScope::None {
                    self.focus.focus(&mut self.tree, target);
                }
                let mut requests = Vec::new();
                let handler = dispatch_mouse_down(&mut self.tree, target, &event, &mut requests);
                self.execute(requests);
                if let Some(handler) = handler {
                    self.drag = Some(DragState::new(handler, at, button));
                }
            }
            MouseAction::Drag(_) => {
                if let Some(drag) = self.drag.as_mut() {
                    drag.moved(&mut self.tree, at);
                }
            }
            MouseAction::Moved => match self.drag.as_mut() {
                Some(drag) => drag.moved(&mut self.tree, at),
                None => self.hover(at),
            },
            MouseAction::Up(_) => {
                if let Some(drag) = self.drag.take() {
                    drag.release(&mut self.tree);
                }
            }
            MouseAction::Wheel(direction) => {
                if let Some(target) = self.hit(at, HitFilter::Any) {
                    let mut requests = Vec::new();
                    dispatch_wheel(&mut self.tree, target, direction, &mut requests);
                    self.execute(requests);
                }
            }
        }
    }

    /// The node under `at` that may receive pointer input.
    fn hit(&self, at: Offset, filter: HitFilter) -> Option<NodeId> {
        hit_test(&self.tree, self.root, at.x, at.y, filter)
            .filter(|&id| self.popups.accepts(&self.tree, id))
    }

    fn hover(&mut self, at: Offset) {
        let target = self.hit(at, HitFilter::Targets);
        if target == self.hovered {
            return;
        }
        for (id, hovered) in [(self.hovered, false), (target, true)] {
            let Some(id) = id else { continue };
            if let Some(state) = self.tree.state_mut(id) {
                state.hovered = hovered;
                self.tree.mark_dirty(id);
            }
        }
        self.hovered = target;
    }

    /// Carry out what nodes asked for during dispatch.
    fn execute(&mut self, requests: Vec<Request>) {
        for request in requests {
            match request {
                Request::Focus(id) => {
                    self.set_focus(id);
                }
                Request::Blur => self.focus.blur(&mut self.tree),
                Request::OpenPopup(popup) => {
                    self.open_popup(popup);
                }
                Request::ClosePopup(Some(host)) => {
                    self.popups.close(&mut self.tree, &mut self.focus, host);
                }
                Request::ClosePopup(None) => {
                    self.close_popup();
                }
                Request::Quit => self.quit = true,
                Request::Command(name) => self.commands.push(name),
            }
        }
    }
}

/// A fatal fault ends the frame loop; anything else is an ordinary render
/// error.
fn escalate(fault: NodeFault) -> Error {
    if fault.fatal {
        Error::Fallback(fault)
    } else {
        Error::from(fault)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
