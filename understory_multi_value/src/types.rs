// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Inclusive range of control values.
///
/// Used for the domain, the visible viewport, per-thumb allowed ranges and the
/// derived bounds of each constrained thumb.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueRange {
    /// Smallest value in the range.
    pub min: i64,
    /// Largest value in the range.
    pub max: i64,
}

impl ValueRange {
    /// Creates a range without validating `min <= max`.
    #[must_use]
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Returns `true` if `value` lies within `min..=max`.
    #[must_use]
    pub const fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamps `value` into `min..=max`.
    ///
    /// Unlike [`i64::clamp`] this never panics; an inverted range resolves to
    /// `min`.
    #[must_use]
    pub const fn clamp(&self, value: i64) -> i64 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// Difference between `max` and `min`, widened so it cannot overflow.
    #[must_use]
    pub const fn span(&self) -> i128 {
        self.max as i128 - self.min as i128
    }

    /// Returns `true` if `min <= max`.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.min <= self.max
    }
}

/// Kind of draggable value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThumbKind {
    /// Ordered, gap-constrained thumb.
    Constrained,
    /// Independent thumb with no ordering relation to its siblings.
    Free,
}

/// Identifies a single thumb: its kind plus its index within that kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ThumbSpecifier {
    /// Which collection the thumb lives in.
    pub kind: ThumbKind,
    /// Index within the collection.
    pub index: usize,
}

impl ThumbSpecifier {
    /// Specifier for the constrained thumb at `index`.
    #[must_use]
    pub const fn constrained(index: usize) -> Self {
        Self {
            kind: ThumbKind::Constrained,
            index,
        }
    }

    /// Specifier for the free thumb at `index`.
    #[must_use]
    pub const fn free(index: usize) -> Self {
        Self {
            kind: ThumbKind::Free,
            index,
        }
    }
}

/// Origin of a change reported to listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeSource {
    /// The client area was resized.
    Resize,
    /// A setter was called directly.
    Programmatic,
    /// A drag is in progress; more updates will follow.
    DragOngoing,
    /// A drag has finished; this is the final value for the gesture.
    DragComplete,
}

impl ChangeSource {
    /// Returns `true` for both drag phases.
    #[must_use]
    pub const fn is_drag(self) -> bool {
        matches!(self, Self::DragOngoing | Self::DragComplete)
    }
}

/// How the visible range reacts when the client area width changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ResizeBehavior {
    /// Keep the visible range; the number of pixels per value unit changes.
    #[default]
    ChangePixelsPerValueUnit,
    /// Keep the number of pixels per value unit; the visible range grows or
    /// shrinks from its lower end.
    ChangeValueRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_and_contains() {
        let r = ValueRange::new(10, 20);
        assert!(r.contains(10));
        assert!(r.contains(20));
        assert!(!r.contains(21));
        assert_eq!(r.clamp(5), 10);
        assert_eq!(r.clamp(25), 20);
        assert_eq!(r.clamp(15), 15);
    }

    #[test]
    fn span_does_not_overflow() {
        let r = ValueRange::new(i64::MIN, i64::MAX);
        assert_eq!(r.span(), i128::from(u64::MAX));
    }

    #[test]
    fn inverted_range_clamps_to_min() {
        let r = ValueRange::new(5, 1);
        assert!(!r.is_valid());
        assert_eq!(r.clamp(3), 5);
    }
}
