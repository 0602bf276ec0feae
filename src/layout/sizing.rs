//! Main-axis sizing policy for container children.

use crate::geometry::Size;

/// How a child asks its container to size it along the main axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SizeHint {
    /// Exactly this many cells.
    Fixed(i32),
    /// Whatever the child measures to when unbounded on the main axis.
    #[default]
    Content,
    /// A share of the space left after fixed and content children, in
    /// proportion to the weight. Weights below 1 count as 1.
    Fill(u16),
}

impl SizeHint {
    pub fn is_fill(self) -> bool {
        matches!(self, SizeHint::Fill(_))
    }

    fn weight(self) -> i64 {
        match self {
            SizeHint::Fill(w) => i64::from(w.max(1)),
            _ => 0,
        }
    }
}

/// Layout direction of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    #[default]
    Vertical,
    Horizontal,
}

impl Axis {
    /// Extent of `size` along this axis.
    pub fn main(self, size: Size) -> i32 {
        match self {
            Axis::Vertical => size.height,
            Axis::Horizontal => size.width,
        }
    }

    /// Extent of `size` across this axis.
    pub fn cross(self, size: Size) -> i32 {
        match self {
            Axis::Vertical => size.width,
            Axis::Horizontal => size.height,
        }
    }

    /// Build a size from main and cross extents.
    pub fn pack(self, main: i32, cross: i32) -> Size {
        match self {
            Axis::Vertical => Size::new(cross, main),
            Axis::Horizontal => Size::new(main, cross),
        }
    }
}

/// Split `available` main-axis cells between children.
///
/// `content` holds the measured main-axis size of each child; it is only
/// consulted for [`SizeHint::Content`] children. Fixed and content children
/// reserve first, in document order, and are truncated once the space runs
/// out. The remainder is shared between fill children by weight, with the
/// last fill child taking the rounding remainder, so fill sizes sum to
/// exactly what was left.
pub fn distribute(available: i32, hints: &[SizeHint], content: &[i32]) -> Vec<i32> {
    debug_assert_eq!(hints.len(), content.len());
    let mut remaining = available.max(0);
    let mut sizes = vec![0; hints.len()];

    for (i, hint) in hints.iter().enumerate() {
        let wanted = match *hint {
            SizeHint::Fixed(n) => n,
            SizeHint::Content => content.get(i).copied().unwrap_or(0),
            SizeHint::Fill(_) => continue,
        };
        let granted = wanted.clamp(0, remaining);
        sizes[i] = granted;
        remaining -= granted;
    }

    let total_weight: i64 = hints.iter().map(|h| h.weight()).sum();
    if total_weight == 0 {
        return sizes;
    }

    let last_fill = hints.iter().rposition(|h| h.is_fill());
    let mut handed_out = 0i64;
    for (i, hint) in hints.iter().enumerate() {
        if !hint.is_fill() {
            continue;
        }
        let share = if Some(i) == last_fill {
            i64::from(remaining) - handed_out
        } else {
            i64::from(remaining) * hint.weight() / total_weight
        };
        handed_out += share;
        // `share` never exceeds `remaining`, which fits in i32.
        sizes[i] = i32::try_from(share).unwrap_or(i32::MAX);
    }
    sizes
}
