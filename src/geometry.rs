//! Core geometry types: Offset, Size, Rect, Spacing.
//!
//! All coordinates are terminal cells. `Rect` is the type a parent hands to a
//! child during arrange; its width and height are never negative.

use std::ops::{Add, Neg, Sub};

// ---------------------------------------------------------------------------
// Offset
// ---------------------------------------------------------------------------

/// A 2D displacement or position delta in terminal cells.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Offset {
    pub x: i32,
    pub y: i32,
}

impl Offset {
    /// The zero offset.
    pub const ZERO: Offset = Offset { x: 0, y: 0 };

    /// Create a new offset.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Offset {
    type Output = Offset;
    #[inline]
    fn add(self, rhs: Offset) -> Offset {
        Offset { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl Sub for Offset {
    type Output = Offset;
    #[inline]
    fn sub(self, rhs: Offset) -> Offset {
        Offset { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl Neg for Offset {
    type Output = Offset;
    #[inline]
    fn neg(self) -> Offset {
        Offset { x: -self.x, y: -self.y }
    }
}

// ---------------------------------------------------------------------------
// Size
// ---------------------------------------------------------------------------

/// A 2D size in terminal cells (width x height).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    /// A zero-sized size.
    pub const ZERO: Size = Size { width: 0, height: 0 };

    /// Create a new size.
    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Total area (width * height).
    #[inline]
    pub const fn area(self) -> i32 {
        self.width * self.height
    }

    /// Whether either dimension is zero (or negative).
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// A [`Rect`] of this size positioned at the origin.
    #[inline]
    pub const fn to_rect(self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }
}

impl Add for Size {
    type Output = Size;
    #[inline]
    fn add(self, rhs: Size) -> Size {
        Size { width: self.width + rhs.width, height: self.height + rhs.height }
    }
}

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// A rectangle defined by its top-left corner and size.
///
/// Constructors clamp negative dimensions to zero, so a `Rect` never has a
/// negative width or height.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// An empty rect at the origin.
    pub const EMPTY: Rect = Rect { x: 0, y: 0, width: 0, height: 0 };

    /// Create a new rect. Negative dimensions are clamped to zero.
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: if width > 0 { width } else { 0 },
            height: if height > 0 { height } else { 0 },
        }
    }

    /// A rect at `origin` with the given size.
    #[inline]
    pub const fn from_origin(origin: Offset, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// The right edge (exclusive).
    #[inline]
    pub const fn right(self) -> i32 {
        self.x + self.width
    }

    /// The bottom edge (exclusive).
    #[inline]
    pub const fn bottom(self) -> i32 {
        self.y + self.height
    }

    /// The top-left corner.
    #[inline]
    pub const fn origin(self) -> Offset {
        Offset { x: self.x, y: self.y }
    }

    /// The dimensions.
    #[inline]
    pub const fn size(self) -> Size {
        Size { width: self.width, height: self.height }
    }

    /// Whether the rect has zero area.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the point (x, y) lies inside this rect.
    #[inline]
    pub const fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Whether `other` is entirely contained within this rect.
    #[inline]
    pub const fn contains_rect(self, other: Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Intersection of two rects; [`Rect::EMPTY`] when they do not overlap.
    #[inline]
    pub const fn intersection(self, other: Rect) -> Rect {
        let x1 = if self.x > other.x { self.x } else { other.x };
        let y1 = if self.y > other.y { self.y } else { other.y };
        let x2 = if self.right() < other.right() { self.right() } else { other.right() };
        let y2 = if self.bottom() < other.bottom() { self.bottom() } else { other.bottom() };

        if x2 <= x1 || y2 <= y1 {
            Rect::EMPTY
        } else {
            Rect { x: x1, y: y1, width: x2 - x1, height: y2 - y1 }
        }
    }

    /// Translate the rect by an [`Offset`].
    #[inline]
    pub const fn translate(self, offset: Offset) -> Rect {
        Rect { x: self.x + offset.x, y: self.y + offset.y, width: self.width, height: self.height }
    }

    /// Contract the rect inward by the given [`Spacing`], clamping at zero.
    #[inline]
    pub const fn shrink(self, margin: Spacing) -> Rect {
        Rect::new(
            self.x + margin.left,
            self.y + margin.top,
            self.width - margin.left - margin.right,
            self.height - margin.top - margin.bottom,
        )
    }

    /// Move the rect so it lies inside `bounds` where possible.
    ///
    /// A rect larger than `bounds` is pinned to the top/left edge and cropped.
    pub fn clamp_within(self, bounds: Rect) -> Rect {
        let width = self.width.min(bounds.width);
        let height = self.height.min(bounds.height);
        let x = self.x.clamp(bounds.x, bounds.right() - width);
        let y = self.y.clamp(bounds.y, bounds.bottom() - height);
        Rect::new(x, y, width, height)
    }
}

// ---------------------------------------------------------------------------
// Spacing
// ---------------------------------------------------------------------------

/// Spacing around the four sides of a rectangle (borders, padding).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Spacing {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Spacing {
    /// Zero spacing on all sides.
    pub const ZERO: Spacing = Spacing { top: 0, right: 0, bottom: 0, left: 0 };

    /// Create spacing with explicit values for each side.
    #[inline]
    pub const fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self { top, right, bottom, left }
    }

    /// All four sides set to the same value.
    #[inline]
    pub const fn all(value: i32) -> Self {
        Self { top: value, right: value, bottom: value, left: value }
    }

    /// Total horizontal extent: `left + right`.
    #[inline]
    pub const fn width(self) -> i32 {
        self.left + self.right
    }

    /// Total vertical extent: `top + bottom`.
    #[inline]
    pub const fn height(self) -> i32 {
        self.top + self.bottom
    }
}

// ===========================================================================
// Tests
// ===========================================================================
