//! Binding actions, and the queue async actions post tree edits through.
//!
//! A synchronous action runs inline with `&mut NodeTree`. An asynchronous one
//! is spawned on the tokio runtime and never touches the tree directly: it
//! posts [`Mutation`]s, which the frame loop applies before the next layout.
//! Every async action gets a cancellation token tied to its node, so once the
//! node is removed the action sees `cancelled()` and anything it still posts
//! is discarded.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::tree::{NodeId, NodeTree};

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

type AsyncFn = Arc<dyn Fn(ActionCx) -> BoxFuture<'static, ()> + Send + Sync>;

/// What a key binding does.
pub enum Action {
    /// Runs inline during dispatch.
    Sync(Box<dyn FnMut(&mut NodeTree, NodeId)>),
    /// Spawned on the runtime. A `blocking` action is awaited by the run
    /// loop before the next frame.
    Async { run: AsyncFn, blocking: bool },
}

impl Action {
    pub fn sync(f: impl FnMut(&mut NodeTree, NodeId) + 'static) -> Self {
        Action::Sync(Box::new(f))
    }

    /// A fire-and-forget async action.
    pub fn spawn<F, Fut>(f: F) -> Self
    where
        F: Fn(ActionCx) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Action::Async { run: Arc::new(move |cx| f(cx).boxed()), blocking: false }
    }

    /// Make an async action blocking. No effect on sync actions.
    pub fn blocking(self) -> Self {
        match self {
            Action::Async { run, .. } => Action::Async { run, blocking: true },
            sync => sync,
        }
    }

    /// Run the action for `node`.
    ///
    /// Returns the task handle of a blocking async action so the caller can
    /// await it. Without a tokio runtime an async action is dropped.
    pub fn invoke(
        &mut self,
        tree: &mut NodeTree,
        node: NodeId,
        mutations: &MutationSender,
    ) -> Option<JoinHandle<()>> {
        match self {
            Action::Sync(f) => {
                f(tree, node);
                None
            }
            Action::Async { run, blocking } => {
                let token = tree.token(node)?.child_token();
                let cx = ActionCx { node, token, mutations: mutations.clone() };
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        let task = handle.spawn(run(cx));
                        blocking.then_some(task)
                    }
                    Err(_) => {
                        tracing::warn!(?node, "no tokio runtime, async action dropped");
                        None
                    }
                }
            }
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => write!(f, "Sync(<fn>)"),
            Self::Async { blocking, .. } => write!(f, "Async {{ blocking: {blocking} }}"),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionCx
// ---------------------------------------------------------------------------

/// Handed to an async action.
#[derive(Clone)]
pub struct ActionCx {
    /// The node the binding belongs to.
    pub node: NodeId,
    /// Cancelled when the node leaves the tree.
    pub token: CancellationToken,
    mutations: MutationSender,
}

impl ActionCx {
    /// Queue a tree edit for the next frame. Returns `false` once the frame
    /// loop is gone.
    pub fn post(&self, apply: impl FnOnce(&mut NodeTree) + Send + 'static) -> bool {
        self.mutations.send(Mutation::new(self.token.clone(), apply))
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when the node is torn down.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

impl fmt::Debug for ActionCx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCx")
            .field("node", &self.node)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Mutation
// ---------------------------------------------------------------------------

/// A deferred tree edit, discarded if its token was cancelled.
pub struct Mutation {
    token: CancellationToken,
    apply: Box<dyn FnOnce(&mut NodeTree) + Send>,
}

impl Mutation {
    pub fn new(
        token: CancellationToken,
        apply: impl FnOnce(&mut NodeTree) + Send + 'static,
    ) -> Self {
        Self { token, apply: Box::new(apply) }
    }
}

/// Posts mutations to the frame loop. Cheap to clone.
#[derive(Clone)]
pub struct MutationSender {
    tx: mpsc::UnboundedSender<Mutation>,
}

impl MutationSender {
    pub fn send(&self, mutation: Mutation) -> bool {
        self.tx.send(mutation).is_ok()
    }
}

/// Outcome of one drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub applied: usize,
    pub dropped: usize,
}

/// The receiving end, owned by the frame loop.
pub struct MutationQueue {
    tx: mpsc::UnboundedSender<Mutation>,
    rx: mpsc::UnboundedReceiver<Mutation>,
}

impl MutationQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> MutationSender {
        MutationSender { tx: self.tx.clone() }
    }

    /// Apply everything posted so far, in order.
    pub fn drain(&mut self, tree: &mut NodeTree) -> DrainStats {
        let mut stats = DrainStats::default();
        while let Ok(mutation) = self.rx.try_recv() {
            if mutation.token.is_cancelled() {
                tracing::warn!("mutation from a removed node dropped");
                stats.dropped += 1;
                continue;
            }
            (mutation.apply)(tree);
            stats.applied += 1;
        }
        stats
    }
}

impl Default for MutationQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;

    use crate::layout::SizeHint;
    use crate::node::Node;

    struct Leaf;

    impl Node for Leaf {
        fn kind(&self) -> &str {
            "leaf"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    // ── Sync ─────────────────────────────────────────────────────────

    #[test]
    fn sync_action_runs_inline() {
        let mut tree = NodeTree::new();
        let id = tree.insert(Leaf);
        let queue = MutationQueue::new();
        let mut action = Action::sync(|tree, node| tree.set_hint(node, SizeHint::Fixed(2)));
        assert!(action.invoke(&mut tree, id, &queue.sender()).is_none());
        assert_eq!(tree.state(id).unwrap().hint, SizeHint::Fixed(2));
    }

    #[test]
    fn async_without_runtime_is_dropped() {
        let mut tree = NodeTree::new();
        let id = tree.insert(Leaf);
        let queue = MutationQueue::new();
        let mut action = Action::spawn(|_cx| async {}).blocking();
        assert!(action.invoke(&mut tree, id, &queue.sender()).is_none());
    }

    // ── Mutations ────────────────────────────────────────────────────

    #[test]
    fn drain_applies_in_order() {
        let mut tree = NodeTree::new();
        let id = tree.insert(Leaf);
        let mut queue = MutationQueue::new();
        let sender = queue.sender();
        let token = CancellationToken::new();
        sender.send(Mutation::new(token.clone(), move |t| t.set_hint(id, SizeHint::Fixed(1))));
        sender.send(Mutation::new(token, move |t| t.set_hint(id, SizeHint::Fill(1))));

        let stats = queue.drain(&mut tree);
        assert_eq!(stats, DrainStats { applied: 2, dropped: 0 });
        assert_eq!(tree.state(id).unwrap().hint, SizeHint::Fill(1));
    }

    #[test]
    fn cancelled_mutations_are_dropped() {
        let mut tree = NodeTree::new();
        let root = tree.insert(Leaf);
        let child = tree.insert_child(root, Leaf).unwrap();
        let mut queue = MutationQueue::new();
        let token = tree.token(child).unwrap().child_token();
        queue.sender().send(Mutation::new(token, move |t| {
            t.set_hint(root, SizeHint::Fixed(9));
        }));

        tree.remove(child);
        let stats = queue.drain(&mut tree);
        assert_eq!(stats.dropped, 1);
        assert_eq!(tree.state(root).unwrap().hint, SizeHint::Content);
    }

    // ── Async ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn blocking_async_action_posts_mutation() {
        let mut tree = NodeTree::new();
        let id = tree.insert(Leaf);
        let mut queue = MutationQueue::new();
        let mut action = Action::spawn(|cx: ActionCx| async move {
            let node = cx.node;
            cx.post(move |t| t.set_hint(node, SizeHint::Fixed(4)));
        })
        .blocking();

        let handle = action.invoke(&mut tree, id, &queue.sender()).unwrap();
        handle.await.unwrap();
        queue.drain(&mut tree);
        assert_eq!(tree.state(id).unwrap().hint, SizeHint::Fixed(4));
    }

    #[tokio::test]
    async fn removal_cancels_running_action() {
        let mut tree = NodeTree::new();
        let root = tree.insert(Leaf);
        let id = tree.insert_child(root, Leaf).unwrap();
        let queue = MutationQueue::new();
        let (seen_tx, seen_rx) = tokio::sync::oneshot::channel::<bool>();
        let seen_tx = std::sync::Mutex::new(Some(seen_tx));
        let mut action = Action::spawn(move |cx: ActionCx| {
            let tx = seen_tx.lock().ok().and_then(|mut g| g.take());
            async move {
                cx.cancelled().await;
                if let Some(tx) = tx {
                    let _ = tx.send(cx.is_cancelled());
                }
            }
        });

        assert!(action.invoke(&mut tree, id, &queue.sender()).is_none());
        tree.remove(id);
        assert!(seen_rx.await.unwrap());
    }

    #[test]
    fn cancelled_resolves_only_after_removal() {
        let mut tree = NodeTree::new();
        let root = tree.insert(Leaf);
        let id = tree.insert_child(root, Leaf).unwrap();
        let queue = MutationQueue::new();
        let cx = ActionCx {
            node: id,
            token: tree.token(id).unwrap().child_token(),
            mutations: queue.sender(),
        };

        let mut waiting = tokio_test::task::spawn(cx.cancelled());
        tokio_test::assert_pending!(waiting.poll());
        tree.remove(id);
        assert!(waiting.is_woken());
        tokio_test::assert_ready!(waiting.poll());
        assert!(cx.is_cancelled());
    }
}
