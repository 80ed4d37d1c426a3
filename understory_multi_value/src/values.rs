// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bookkeeping for the value collections owned by the control.

use alloc::vec::Vec;

use peniko::Color;

use crate::types::ValueRange;

/// Thumb values plus per-thumb editability, kept the same length.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ThumbList {
    values: Vec<i64>,
    editable: Vec<bool>,
}

impl ThumbList {
    pub(crate) fn values(&self) -> &[i64] {
        &self.values
    }

    pub(crate) fn editable(&self) -> &[bool] {
        &self.editable
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn is_editable(&self, index: usize) -> Option<bool> {
        self.editable.get(index).copied()
    }

    /// Replaces all values. Existing indices keep their editability; new
    /// thumbs start out editable.
    pub(crate) fn replace(&mut self, values: &[i64]) {
        self.values.clear();
        self.values.extend_from_slice(values);
        self.editable.resize(values.len(), true);
    }

    pub(crate) fn set(&mut self, index: usize, value: i64) {
        self.values[index] = value;
    }

    /// Sets editability and returns the previous flag.
    pub(crate) fn set_editable(&mut self, index: usize, editable: bool) -> bool {
        core::mem::replace(&mut self.editable[index], editable)
    }
}

/// Static marks plus their optional colors, kept the same length.
#[derive(Clone, Debug, Default)]
pub(crate) struct MarkList {
    values: Vec<i64>,
    colors: Vec<Option<Color>>,
}

impl MarkList {
    pub(crate) fn values(&self) -> &[i64] {
        &self.values
    }

    pub(crate) fn colors(&self) -> &[Option<Color>] {
        &self.colors
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    /// Replaces all values; colors of surviving indices are kept.
    pub(crate) fn replace(&mut self, values: &[i64]) {
        self.values.clear();
        self.values.extend_from_slice(values);
        self.colors.resize(values.len(), None);
    }

    pub(crate) fn set(&mut self, index: usize, value: i64) {
        self.values[index] = value;
    }

    pub(crate) fn color(&self, index: usize) -> Option<Color> {
        self.colors.get(index).copied().flatten()
    }

    pub(crate) fn set_color(&mut self, index: usize, color: Option<Color>) {
        self.colors[index] = color;
    }
}

/// Sparse colors for the `count + 1` ranges delimited by a value list.
///
/// Range `0` runs from the start of the control to the first value, range
/// `count` from the last value to the end.
#[derive(Clone, Debug, Default)]
pub(crate) struct RangeColors(Vec<Option<Color>>);

impl RangeColors {
    pub(crate) fn get(&self, index: usize) -> Option<Color> {
        self.0.get(index).copied().flatten()
    }

    pub(crate) fn set(&mut self, index: usize, color: Option<Color>) {
        if self.0.len() <= index {
            self.0.resize(index + 1, None);
        }
        self.0[index] = color;
    }

    /// Dense copy with exactly `len` entries.
    pub(crate) fn to_vec(&self, len: usize) -> Vec<Option<Color>> {
        (0..len).map(|i| self.get(i)).collect()
    }
}

/// Index of the first value smaller than its predecessor.
pub(crate) fn first_descending(values: &[i64]) -> Option<usize> {
    values
        .windows(2)
        .position(|w| w[1] < w[0])
        .map(|i| i + 1)
}

/// Index of the first value closer than `gap` to its predecessor.
pub(crate) fn first_gap_violation(values: &[i64], gap: i64) -> Option<usize> {
    values
        .windows(2)
        .position(|w| i128::from(w[1]) - i128::from(w[0]) < i128::from(gap))
        .map(|i| i + 1)
}

/// Index of the first value outside `domain`.
pub(crate) fn first_outside(values: &[i64], domain: ValueRange) -> Option<usize> {
    values.iter().position(|&v| !domain.contains(v))
}

/// Clamps every value into `domain`.
pub(crate) fn clamp_all(values: &mut [i64], domain: ValueRange) {
    for v in values {
        *v = domain.clamp(*v);
    }
}

/// Moves constrained values as little as possible so that they lie within
/// `domain` and respect `gap`.
///
/// Values are clamped first, then pushed upward where they sit too close to
/// their predecessor. If that pushes the tail past the maximum, the tail is
/// walked back down, stopping as soon as the remaining spacing absorbs the
/// excess.
pub(crate) fn correct_constrained(values: &mut [i64], domain: ValueRange, gap: i64) {
    clamp_all(values, domain);

    for j in 1..values.len() {
        if values[j].saturating_sub(values[j - 1]) < gap {
            values[j] = values[j - 1].saturating_add(gap);
        }
    }

    let Some(&last) = values.last() else {
        return;
    };
    let mut excess = last.saturating_sub(domain.max);
    for j in (0..values.len()).rev() {
        if excess <= 0 {
            break;
        }
        values[j] -= excess;
        excess = if j > 0 {
            gap.saturating_sub(values[j].saturating_sub(values[j - 1]))
        } else {
            0
        };
    }
}

/// Moves constrained values as little as possible so that each lies within
/// its bounds and adjacent values are at least `gap` apart.
///
/// Values are first clamped into their bounds, then pushed upward where they
/// sit too close to their predecessor. Bounds from a feasible pass leave room
/// for that push, so individual allowed ranges hold afterwards.
pub(crate) fn fit_constrained(values: &mut [i64], bounds: &[ValueRange], gap: i64) {
    for (v, b) in values.iter_mut().zip(bounds) {
        *v = b.clamp(*v);
    }
    for j in 1..values.len() {
        let floor = values[j - 1].saturating_add(gap);
        if values[j] < floor {
            values[j] = floor;
        }
    }
}
