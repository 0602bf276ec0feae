//! Min/max size boxes passed down during measurement.

use crate::error::LayoutError;
use crate::geometry::{Size, Spacing};

/// Sentinel maximum meaning "no limit on this axis".
pub const UNBOUNDED: i32 = i32::MAX;

/// Size limits handed from a parent to a child during measure.
///
/// All four values are non-negative and `min <= max` on both axes.
/// Constructing an invalid box is a programmer error: [`Constraints::new`]
/// asserts in debug builds, [`Constraints::try_new`] reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Constraints {
    pub min_width: i32,
    pub max_width: i32,
    pub min_height: i32,
    pub max_height: i32,
}

impl Constraints {
    /// Alias of the module-level [`UNBOUNDED`] sentinel.
    pub const UNBOUNDED: i32 = UNBOUNDED;

    /// Create constraints. Debug builds panic on invalid input.
    pub fn new(min_width: i32, max_width: i32, min_height: i32, max_height: i32) -> Self {
        debug_assert!(
            Self::try_new(min_width, max_width, min_height, max_height).is_ok(),
            "invalid constraints: width {min_width}..{max_width}, height {min_height}..{max_height}"
        );
        Self { min_width, max_width, min_height, max_height }
    }

    /// Create constraints, checking every invariant.
    pub fn try_new(
        min_width: i32,
        max_width: i32,
        min_height: i32,
        max_height: i32,
    ) -> Result<Self, LayoutError> {
        for (axis, value) in [
            ("min_width", min_width),
            ("max_width", max_width),
            ("min_height", min_height),
            ("max_height", max_height),
        ] {
            if value < 0 {
                return Err(LayoutError::NegativeSize { axis, value });
            }
        }
        if min_width > max_width {
            return Err(LayoutError::InvalidConstraints {
                axis: "width",
                min: min_width,
                max: max_width,
            });
        }
        if min_height > max_height {
            return Err(LayoutError::InvalidConstraints {
                axis: "height",
                min: min_height,
                max: max_height,
            });
        }
        Ok(Self { min_width, max_width, min_height, max_height })
    }

    /// No limits in either direction.
    pub const fn unbounded() -> Self {
        Self { min_width: 0, max_width: UNBOUNDED, min_height: 0, max_height: UNBOUNDED }
    }

    /// Exactly `size`.
    pub fn tight(size: Size) -> Self {
        let w = size.width.max(0);
        let h = size.height.max(0);
        Self { min_width: w, max_width: w, min_height: h, max_height: h }
    }

    /// Anything from zero up to `size`.
    pub fn loose(size: Size) -> Self {
        Self {
            min_width: 0,
            max_width: size.width.max(0),
            min_height: 0,
            max_height: size.height.max(0),
        }
    }

    /// Clamp `size` into these constraints. A box built with a minimum above
    /// its maximum clamps to the minimum.
    pub fn constrain(&self, size: Size) -> Size {
        Size::new(
            size.width.max(self.min_width).min(self.max_width.max(self.min_width)),
            size.height.max(self.min_height).min(self.max_height.max(self.min_height)),
        )
    }

    /// Whether `size` already satisfies these constraints.
    pub fn is_satisfied_by(&self, size: Size) -> bool {
        self.constrain(size) == size
    }

    pub fn min_size(&self) -> Size {
        Size::new(self.min_width, self.min_height)
    }

    pub fn max_size(&self) -> Size {
        Size::new(self.max_width, self.max_height)
    }

    pub fn has_bounded_width(&self) -> bool {
        self.max_width != UNBOUNDED
    }

    pub fn has_bounded_height(&self) -> bool {
        self.max_height != UNBOUNDED
    }

    /// Drop the minimums, keeping the maximums.
    pub fn loosen(self) -> Self {
        Self { min_width: 0, min_height: 0, ..self }
    }

    /// Remove the height limit.
    pub fn unbounded_height(self) -> Self {
        Self { min_height: 0, max_height: UNBOUNDED, ..self }
    }

    /// Remove the width limit.
    pub fn unbounded_width(self) -> Self {
        Self { min_width: 0, max_width: UNBOUNDED, ..self }
    }

    /// Pin the height to exactly `height`.
    pub fn with_height(self, height: i32) -> Self {
        let h = height.max(0);
        Self { min_height: h, max_height: h, ..self }
    }

    /// Pin the width to exactly `width`.
    pub fn with_width(self, width: i32) -> Self {
        let w = width.max(0);
        Self { min_width: w, max_width: w, ..self }
    }

    /// Shrink by `spacing` on each axis. Unbounded maximums stay unbounded.
    pub fn deflate(self, spacing: Spacing) -> Self {
        let shrink = |v: i32, by: i32| if v == UNBOUNDED { v } else { (v - by).max(0) };
        let max_width = shrink(self.max_width, spacing.width());
        let max_height = shrink(self.max_height, spacing.height());
        Self {
            min_width: (self.min_width - spacing.width()).clamp(0, max_width),
            max_width,
            min_height: (self.min_height - spacing.height()).clamp(0, max_height),
            max_height,
        }
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Self::unbounded()
    }
}
