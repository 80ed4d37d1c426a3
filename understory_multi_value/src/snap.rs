// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quantization of candidate thumb values.
//!
//! A [`SnapCalculator`] turns a raw value into one the control is willing to
//! hold, given an inclusive `min..=max` window. The control consults it while
//! computing constrained thumb bounds and while resolving drags.
//!
//! ## Minimal example
//!
//! ```
//! use understory_multi_value::{SnapCalculator, StepSnap};
//!
//! let snap = StepSnap::new(15);
//! assert_eq!(snap.snap(22, 0, 100), 15);
//! assert_eq!(snap.snap(23, 0, 100), 30);
//! // The nearest step outside the window is replaced by the closest one inside.
//! assert_eq!(snap.snap(98, 0, 100), 90);
//! ```
//!
//! Closures with the signature `Fn(value, min, max) -> i64` are calculators
//! too, which is convenient for one-off rules.

use crate::types::ValueRange;

/// Pluggable quantization of thumb values.
///
/// Implementations must return a value in `min..=max` whenever `min <= max`.
/// The control never asks for an inverted window, and additionally clamps the
/// result into the window, so a misbehaving calculator cannot break the
/// ordering invariants.
pub trait SnapCalculator {
    /// Quantizes `value` into the window `min..=max`.
    fn snap(&self, value: i64, min: i64, max: i64) -> i64;
}

impl<F> SnapCalculator for F
where
    F: Fn(i64, i64, i64) -> i64,
{
    fn snap(&self, value: i64, min: i64, max: i64) -> i64 {
        self(value, min, max)
    }
}

/// Default calculator: clamps into the window without limiting granularity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClampSnap;

impl SnapCalculator for ClampSnap {
    fn snap(&self, value: i64, min: i64, max: i64) -> i64 {
        ValueRange::new(min, max).clamp(value)
    }
}

/// Snaps to multiples of `step` offset by `origin`.
///
/// Values round to the nearest multiple (halfway rounds up). When that
/// multiple falls outside the window, the closest multiple inside the window
/// is used instead; when no multiple fits, the value is clamped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepSnap {
    step: i64,
    origin: i64,
}

impl StepSnap {
    /// Creates a calculator snapping to multiples of `step` from zero.
    ///
    /// Steps below `1` behave like [`ClampSnap`].
    #[must_use]
    pub const fn new(step: i64) -> Self {
        Self { step, origin: 0 }
    }

    /// Measures multiples from `origin` instead of zero.
    #[must_use]
    pub const fn with_origin(mut self, origin: i64) -> Self {
        self.origin = origin;
        self
    }

    /// Returns the step size.
    #[must_use]
    pub const fn step(&self) -> i64 {
        self.step
    }

    /// Returns the origin multiples are measured from.
    #[must_use]
    pub const fn origin(&self) -> i64 {
        self.origin
    }
}

impl SnapCalculator for StepSnap {
    fn snap(&self, value: i64, min: i64, max: i64) -> i64 {
        let window = ValueRange::new(min, max);
        if self.step <= 1 {
            return window.clamp(value);
        }
        let step = i128::from(self.step);
        let origin = i128::from(self.origin);

        let nearest = origin + (i128::from(value) - origin + step / 2).div_euclid(step) * step;
        let lowest = origin - (origin - i128::from(min)).div_euclid(step) * step;
        let highest = origin + (i128::from(max) - origin).div_euclid(step) * step;
        if lowest > highest {
            return window.clamp(value);
        }

        let snapped = nearest.clamp(lowest, highest);
        i64::try_from(snapped).unwrap_or_else(|_| window.clamp(value))
    }
}

/// Runs `calc` and clamps its answer into `min..=max`.
///
/// `min` must not exceed `max`.
pub(crate) fn snap_within(calc: &dyn SnapCalculator, value: i64, min: i64, max: i64) -> i64 {
    debug_assert!(min <= max, "snap window must not be inverted");
    ValueRange::new(min, max).clamp(calc.snap(value, min, max))
}
