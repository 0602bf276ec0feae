//! Per-node render output kept between frames.

use slotmap::SecondaryMap;

use crate::ansi::Style;
use crate::geometry::{Offset, Rect};
use crate::tree::NodeId;

use super::compositor::Compositor;

/// Already-clipped text at an absolute position, with the ambient style it
/// was drawn under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawOp {
    pub x: i32,
    pub y: i32,
    pub text: String,
    pub style: Style,
}

/// One recorded step of a node's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Draw(DrawOp),
    /// Fill `width` cells of a row in a style.
    Fill { x: i32, y: i32, width: i32, style: Style },
    /// Splice in a child's cached output, preserving paint order.
    Child(NodeId),
}

/// Everything a node's cached output depends on besides the node itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub bounds: Rect,
    pub clip: Rect,
    pub ambient: Style,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub ops: Vec<Op>,
    pub cursor: Option<Offset>,
}

/// Rendered output per node, replayed for clean nodes.
#[derive(Debug, Default)]
pub struct RenderCache {
    entries: SecondaryMap<NodeId, CacheEntry>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&CacheEntry> {
        self.entries.get(id)
    }

    /// Whether `id` has an entry recorded under `key`.
    pub fn is_fresh(&self, id: NodeId, key: &CacheKey) -> bool {
        self.entries.get(id).is_some_and(|entry| entry.key == *key)
    }

    pub fn insert(&mut self, id: NodeId, entry: CacheEntry) {
        self.entries.insert(id, entry);
    }

    pub fn evict(&mut self, id: NodeId) {
        self.entries.remove(id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replay the output recorded for `root` and everything it spliced in,
    /// in paint order. Returns the last cursor request encountered.
    pub fn replay(&self, root: NodeId, target: &mut Compositor) -> Option<Offset> {
        let mut cursor = None;
        let mut stack = vec![root];
        let mut pending: Vec<std::slice::Iter<'_, Op>> = Vec::new();

        while let Some(id) = stack.pop() {
            if let Some(entry) = self.entries.get(id) {
                cursor = entry.cursor.or(cursor);
                pending.push(entry.ops.iter());
            }
            while let Some(ops) = pending.last_mut() {
                match ops.next() {
                    Some(Op::Draw(op)) => target.draw(op.x, op.y, &op.text, op.style),
                    Some(Op::Fill { x, y, width, style }) => {
                        target.fill_row(*x, *y, *width, *style)
                    }
                    Some(Op::Child(child)) => {
                        stack.push(*child);
                        break;
                    }
                    None => {
                        pending.pop();
                    }
                }
            }
        }
        cursor
    }
}

/// Per-frame render counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Nodes whose `render` ran.
    pub rendered: usize,
    /// Nodes whose cached output was reused.
    pub replayed: usize,
    /// Faults contained by boundaries.
    pub faults: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<NodeId> {
        let mut map: SlotMap<NodeId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn key() -> CacheKey {
        CacheKey {
            bounds: Rect::new(0, 0, 5, 1),
            clip: Rect::new(0, 0, 5, 1),
            ambient: Style::new(),
        }
    }

    fn draw(x: i32, text: &str) -> Op {
        Op::Draw(DrawOp { x, y: 0, text: text.to_owned(), style: Style::new() })
    }

    #[test]
    fn freshness_requires_matching_key() {
        let id = ids(1)[0];
        let mut cache = RenderCache::new();
        assert!(!cache.is_fresh(id, &key()));
        cache.insert(id, CacheEntry { key: key(), ops: Vec::new(), cursor: None });
        assert!(cache.is_fresh(id, &key()));
        let moved = CacheKey { bounds: Rect::new(1, 0, 5, 1), ..key() };
        assert!(!cache.is_fresh(id, &moved));
        cache.evict(id);
        assert!(cache.is_empty());
    }

    #[test]
    fn replay_preserves_paint_order() {
        let ids = ids(3);
        let (root, a, b) = (ids[0], ids[1], ids[2]);
        let mut cache = RenderCache::new();
        cache.insert(root, CacheEntry {
            key: key(),
            ops: vec![draw(0, "xxxxx"), Op::Child(a), draw(2, "R"), Op::Child(b)],
            cursor: None,
        });
        cache.insert(a, CacheEntry { key: key(), ops: vec![draw(0, "aaa")], cursor: None });
        cache.insert(b, CacheEntry {
            key: key(),
            ops: vec![draw(1, "b")],
            cursor: Some(Offset::new(4, 0)),
        });

        let mut target = Compositor::new(5, 1);
        let cursor = cache.replay(root, &mut target);
        assert_eq!(target.row_text(0), "abRxx");
        assert_eq!(cursor, Some(Offset::new(4, 0)));
    }

    #[test]
    fn replay_skips_missing_children() {
        let ids = ids(2);
        let mut cache = RenderCache::new();
        let ops = vec![Op::Child(ids[1]), draw(0, "z")];
        cache.insert(ids[0], CacheEntry { key: key(), ops, cursor: None });
        let mut target = Compositor::new(2, 1);
        cache.replay(ids[0], &mut target);
        assert_eq!(target.row_text(0), "z ");
    }
}
