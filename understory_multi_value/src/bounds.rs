// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Achievable ranges for constrained thumbs.
//!
//! [`compute_bounds`] derives, for every constrained thumb, the inclusive range
//! a drag may move it to. The computation is a pure function of the thumb
//! values, editability, individual allowed ranges, domain, minimum gap, lock
//! flag and snap calculator; the control reruns it whenever one of those
//! changes.
//!
//! ## Algorithm
//!
//! The minima are computed front to back. A non-editable thumb is pinned to
//! its current value. An editable thumb starts from the domain minimum (first
//! thumb) or from the previous thumb's minimum plus an interval, snaps upward
//! within `candidate..=domain.max`, and is then raised to its individual
//! minimum if it has one. The interval is the minimum gap, or the thumb's
//! current distance to its predecessor while intervals are locked.
//!
//! The maxima mirror this back to front. If any thumb ends up with
//! `min > max`, the configuration is infeasible and [`InfeasibleBounds`]
//! names the first such thumb.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::snap::{SnapCalculator, snap_within};
use crate::types::ValueRange;

/// Individual allowed ranges keyed by constrained thumb index.
pub type OverrideMap = HashMap<usize, ValueRange>;

/// Per-thumb bounds, one entry per constrained thumb.
pub type ThumbBounds = SmallVec<[ValueRange; 8]>;

/// Everything the bounds pass reads.
#[derive(Clone, Copy)]
pub struct BoundsInput<'a> {
    /// Constrained thumb values, non-decreasing.
    pub values: &'a [i64],
    /// Editability per thumb; missing entries count as editable.
    pub editable: &'a [bool],
    /// Individual allowed ranges.
    pub overrides: &'a OverrideMap,
    /// Absolute value range.
    pub domain: ValueRange,
    /// Minimum distance between adjacent thumbs.
    pub minimum_gap: i64,
    /// Whether dragging one thumb translates all of them.
    pub locked: bool,
    /// Quantization applied to each candidate bound.
    pub snap: &'a dyn SnapCalculator,
}

impl core::fmt::Debug for BoundsInput<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BoundsInput")
            .field("values", &self.values)
            .field("editable", &self.editable)
            .field("overrides", &self.overrides)
            .field("domain", &self.domain)
            .field("minimum_gap", &self.minimum_gap)
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}

/// The bounds pass found a thumb with no achievable values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InfeasibleBounds {
    /// First thumb whose minimum exceeds its maximum.
    pub index: usize,
    /// Computed minimum for that thumb.
    pub min: i64,
    /// Computed maximum for that thumb.
    pub max: i64,
}

/// Computes the achievable range of every constrained thumb.
///
/// Returns [`InfeasibleBounds`] if the inputs contradict each other; nothing
/// is mutated either way.
///
/// ```
/// use understory_multi_value::{BoundsInput, ClampSnap, OverrideMap, ValueRange, compute_bounds};
///
/// let overrides = OverrideMap::new();
/// let bounds = compute_bounds(&BoundsInput {
///     values: &[10, 50, 90],
///     editable: &[true, true, true],
///     overrides: &overrides,
///     domain: ValueRange::new(0, 100),
///     minimum_gap: 5,
///     locked: false,
///     snap: &ClampSnap,
/// })
/// .unwrap();
/// assert_eq!(bounds[1], ValueRange::new(5, 95));
/// ```
pub fn compute_bounds(input: &BoundsInput<'_>) -> Result<ThumbBounds, InfeasibleBounds> {
    let n = input.values.len();
    let editable = |i: usize| input.editable.get(i).copied().unwrap_or(true);
    let interval = |lower: usize| {
        if input.locked {
            input.values[lower + 1].saturating_sub(input.values[lower])
        } else {
            input.minimum_gap
        }
    };

    let mut mins: SmallVec<[i64; 8]> = SmallVec::with_capacity(n);
    for i in 0..n {
        let mut lo = if editable(i) {
            let candidate = if i == 0 {
                input.domain.min
            } else {
                mins[i - 1].saturating_add(interval(i - 1))
            };
            if candidate <= input.domain.max {
                snap_within(input.snap, candidate, candidate, input.domain.max)
            } else {
                candidate
            }
        } else {
            input.values[i]
        };
        if let Some(allowed) = input.overrides.get(&i) {
            lo = lo.max(allowed.min);
        }
        mins.push(lo);
    }

    let mut maxs: SmallVec<[i64; 8]> = SmallVec::from_elem(0, n);
    for i in (0..n).rev() {
        let mut hi = if editable(i) {
            let candidate = if i == n - 1 {
                input.domain.max
            } else {
                maxs[i + 1].saturating_sub(interval(i))
            };
            if candidate >= input.domain.min {
                snap_within(input.snap, candidate, input.domain.min, candidate)
            } else {
                candidate
            }
        } else {
            input.values[i]
        };
        if let Some(allowed) = input.overrides.get(&i) {
            hi = hi.min(allowed.max);
        }
        maxs[i] = hi;
    }

    let mut bounds = ThumbBounds::with_capacity(n);
    for (index, (&min, &max)) in mins.iter().zip(maxs.iter()).enumerate() {
        if min > max {
            return Err(InfeasibleBounds { index, min, max });
        }
        bounds.push(ValueRange::new(min, max));
    }
    Ok(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snap::{ClampSnap, StepSnap};

    fn run(
        values: &[i64],
        editable: &[bool],
        overrides: &OverrideMap,
        gap: i64,
        locked: bool,
        snap: &dyn SnapCalculator,
    ) -> Result<ThumbBounds, InfeasibleBounds> {
        compute_bounds(&BoundsInput {
            values,
            editable,
            overrides,
            domain: ValueRange::new(0, 100),
            minimum_gap: gap,
            locked,
            snap,
        })
    }

    #[test]
    fn unlocked_bounds_leave_room_for_neighbors() {
        let b = run(&[10, 50, 90], &[], &OverrideMap::new(), 5, false, &ClampSnap).unwrap();
        assert_eq!(
            b.as_slice(),
            &[
                ValueRange::new(0, 90),
                ValueRange::new(5, 95),
                ValueRange::new(10, 100)
            ]
        );
    }

    #[test]
    fn locked_bounds_use_current_intervals() {
        let b = run(&[10, 50, 90], &[], &OverrideMap::new(), 5, true, &ClampSnap).unwrap();
        assert_eq!(
            b.as_slice(),
            &[
                ValueRange::new(0, 20),
                ValueRange::new(40, 60),
                ValueRange::new(80, 100)
            ]
        );
    }

    #[test]
    fn non_editable_thumb_pins_itself_and_fences_neighbors() {
        let b = run(
            &[10, 50, 90],
            &[true, false, true],
            &OverrideMap::new(),
            5,
            false,
            &ClampSnap,
        )
        .unwrap();
        assert_eq!(
            b.as_slice(),
            &[
                ValueRange::new(0, 45),
                ValueRange::new(50, 50),
                ValueRange::new(55, 100)
            ]
        );
    }

    #[test]
    fn overrides_tighten_bounds() {
        let mut overrides = OverrideMap::new();
        overrides.insert(1, ValueRange::new(55, 55));
        let b = run(&[10, 55, 90], &[], &overrides, 5, false, &ClampSnap).unwrap();
        assert_eq!(
            b.as_slice(),
            &[
                ValueRange::new(0, 50),
                ValueRange::new(55, 55),
                ValueRange::new(60, 100)
            ]
        );
    }

    #[test]
    fn contradictory_overrides_are_infeasible() {
        let mut overrides = OverrideMap::new();
        overrides.insert(2, ValueRange::new(0, 5));
        let err = run(&[10, 50, 90], &[], &overrides, 5, false, &ClampSnap).unwrap_err();
        assert_eq!(err.index, 0);
        assert!(err.min > err.max);
    }

    #[test]
    fn snap_quantizes_each_bound() {
        let b = run(
            &[10, 50, 90],
            &[],
            &OverrideMap::new(),
            5,
            false,
            &StepSnap::new(10),
        )
        .unwrap();
        assert_eq!(
            b.as_slice(),
            &[
                ValueRange::new(0, 80),
                ValueRange::new(10, 90),
                ValueRange::new(20, 100)
            ]
        );
    }

    #[test]
    fn empty_and_single_thumb() {
        assert!(run(&[], &[], &OverrideMap::new(), 5, false, &ClampSnap)
            .unwrap()
            .is_empty());
        let b = run(&[42], &[], &OverrideMap::new(), 5, false, &ClampSnap).unwrap();
        assert_eq!(b.as_slice(), &[ValueRange::new(0, 100)]);
    }

    #[test]
    fn gap_too_wide_for_domain_is_infeasible() {
        let err = run(&[0, 100], &[], &OverrideMap::new(), 101, false, &ClampSnap).unwrap_err();
        assert_eq!(err.index, 0);
    }
}
