// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The constraint engine behind a multi-value linear control.
//!
//! [`MultiValueControl`] owns every value collection of the control and is the
//! only way to change them. Mutations either succeed with all invariants intact
//! or fail with the control left exactly as it was:
//!
//! - constrained thumb values are non-decreasing, lie in the domain, respect
//!   the minimum gap and their individual allowed ranges;
//! - every constrained thumb has non-empty bounds;
//! - the visible range is a non-empty sub-range of the domain.
//!
//! Successful mutations that change values notify listeners once per call.
//! Every observable change bumps [`MultiValueControl::revision`].

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Rect;
use peniko::Color;

use crate::bounds::{BoundsInput, OverrideMap, ThumbBounds, compute_bounds};
use crate::error::{ArgumentError, Error, Rejection};
use crate::listener::{ListenerId, MultiValueListener};
use crate::mapper::CoordinateMapper;
use crate::snap::{ClampSnap, SnapCalculator};
use crate::types::{ChangeSource, ResizeBehavior, ThumbKind, ValueRange};
use crate::values::{
    MarkList, RangeColors, ThumbList, clamp_all, correct_constrained, first_descending,
    first_gap_violation, first_outside, fit_constrained,
};

/// Length of the visible range chosen when the viewport has to be
/// repositioned after falling outside the domain.
pub const DEFAULT_VISIBLE_OFFSET: i64 = 100;

/// Everything a renderer needs to draw the control, copied out in one go.
///
/// Range color vectors have one more entry than the value list they belong
/// to: entry `0` covers the space before the first value and the last entry
/// the space after the last value.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSnapshot {
    /// Absolute value range.
    pub domain: ValueRange,
    /// Visible value range.
    pub visible: ValueRange,
    /// Client area in widget-local pixels.
    pub client: Rect,
    /// Whether the control accepts drags.
    pub enabled: bool,
    /// Constrained thumb values.
    pub constrained_values: Vec<i64>,
    /// Constrained thumb editability.
    pub constrained_editable: Vec<bool>,
    /// Achievable range of each constrained thumb.
    pub constrained_bounds: Vec<ValueRange>,
    /// Free thumb values.
    pub free_values: Vec<i64>,
    /// Free thumb editability.
    pub free_editable: Vec<bool>,
    /// Constrained mark values.
    pub constrained_marks: Vec<i64>,
    /// Colors of constrained marks.
    pub constrained_mark_colors: Vec<Option<Color>>,
    /// Colors of the ranges between constrained marks.
    pub constrained_mark_range_colors: Vec<Option<Color>>,
    /// Free mark values.
    pub free_marks: Vec<i64>,
    /// Colors of free marks.
    pub free_mark_colors: Vec<Option<Color>>,
    /// Colors of the ranges between constrained thumbs.
    pub constrained_thumb_range_colors: Vec<Option<Color>>,
    /// Thumb kinds from bottom to top.
    pub thumb_drawing_order: [ThumbKind; 2],
    /// Mark kinds from bottom to top.
    pub mark_drawing_order: [ThumbKind; 2],
    /// Revision the snapshot was taken at.
    pub revision: u64,
}

/// Constraint state saved before a fallible mutation.
struct SavedConstraints {
    constrained: ThumbList,
    overrides: OverrideMap,
    bounds: ThumbBounds,
    minimum_gap: i64,
    locked: bool,
}

/// Headless model of a multi-value linear control.
///
/// ```
/// use understory_multi_value::{MultiValueControl, ValueRange};
///
/// let mut control = MultiValueControl::new(0, 100).unwrap();
/// control.set_minimum_gap(5).unwrap();
/// control.set_constrained_values(&[10, 50, 90]).unwrap();
/// assert_eq!(control.constrained_bounds(1), Some(ValueRange::new(5, 95)));
///
/// // Too close to the third thumb.
/// assert!(control.set_constrained_value(1, 88).unwrap_err().is_rejection());
/// assert_eq!(control.constrained_values(), [10, 50, 90]);
/// ```
pub struct MultiValueControl {
    domain: ValueRange,
    visible: ValueRange,
    client: Rect,
    resize_behavior: ResizeBehavior,
    constrained: ThumbList,
    free: ThumbList,
    constrained_marks: MarkList,
    free_marks: MarkList,
    constrained_mark_ranges: RangeColors,
    constrained_thumb_ranges: RangeColors,
    overrides: OverrideMap,
    bounds: ThumbBounds,
    minimum_gap: i64,
    locked: bool,
    snap: Box<dyn SnapCalculator>,
    custom_snap: bool,
    enabled: bool,
    viewport_draggable: bool,
    constrained_thumbs_above_free: bool,
    constrained_marks_above_free: bool,
    listeners: Vec<(ListenerId, Box<dyn MultiValueListener>)>,
    next_listener: u64,
    revision: u64,
}

impl fmt::Debug for MultiValueControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiValueControl")
            .field("domain", &self.domain)
            .field("visible", &self.visible)
            .field("client", &self.client)
            .field("constrained", &self.constrained)
            .field("free", &self.free)
            .field("overrides", &self.overrides)
            .field("bounds", &self.bounds)
            .field("minimum_gap", &self.minimum_gap)
            .field("locked", &self.locked)
            .field("custom_snap", &self.custom_snap)
            .field("enabled", &self.enabled)
            .field("listeners", &self.listeners.len())
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl MultiValueControl {
    /// Creates an empty control over `min..=max`.
    ///
    /// The visible range starts out as the whole domain; there are no thumbs,
    /// no marks, and the minimum gap is `0`.
    pub fn new(min: i64, max: i64) -> Result<Self, ArgumentError> {
        if min >= max {
            return Err(ArgumentError::EmptyRange { min, max });
        }
        let domain = ValueRange::new(min, max);
        Ok(Self {
            domain,
            visible: domain,
            client: Rect::ZERO,
            resize_behavior: ResizeBehavior::default(),
            constrained: ThumbList::default(),
            free: ThumbList::default(),
            constrained_marks: MarkList::default(),
            free_marks: MarkList::default(),
            constrained_mark_ranges: RangeColors::default(),
            constrained_thumb_ranges: RangeColors::default(),
            overrides: OverrideMap::new(),
            bounds: ThumbBounds::new(),
            minimum_gap: 0,
            locked: false,
            snap: Box::new(ClampSnap),
            custom_snap: false,
            enabled: true,
            viewport_draggable: false,
            constrained_thumbs_above_free: true,
            constrained_marks_above_free: true,
            listeners: Vec::new(),
            next_listener: 0,
            revision: 0,
        })
    }

    /// Sets how the visible range reacts to client area resizes.
    #[must_use]
    pub fn with_resize_behavior(mut self, behavior: ResizeBehavior) -> Self {
        self.resize_behavior = behavior;
        self
    }

    /// Monotonic counter bumped on every observable change.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // --- Domain, viewport and client area ---

    /// Returns the domain.
    #[must_use]
    pub fn domain(&self) -> ValueRange {
        self.domain
    }

    /// Replaces the domain.
    ///
    /// Clears all individual allowed ranges, moves the visible range back
    /// inside the domain, and shrinks the minimum gap if the constrained thumbs
    /// no longer fit. Constrained thumbs are then moved as little as possible
    /// to satisfy the domain and gap; free thumbs and marks are clamped.
    pub fn set_domain(&mut self, min: i64, max: i64) -> Result<(), ArgumentError> {
        if min >= max {
            return Err(ArgumentError::EmptyRange { min, max });
        }
        let domain = ValueRange::new(min, max);
        if domain == self.domain {
            return Ok(());
        }
        self.domain = domain;
        self.overrides.clear();

        let mut lower = self.visible.min;
        let mut upper = self.visible.max;
        if lower < min || lower > max {
            lower = min;
            upper = min.saturating_add(DEFAULT_VISIBLE_OFFSET).min(max);
        }
        if upper < min || upper > max {
            upper = max;
            lower = max.saturating_sub(DEFAULT_VISIBLE_OFFSET).max(min);
        }
        self.apply_visible_range(lower, upper, ChangeSource::Programmatic, false);

        let count = self.constrained.len();
        if count > 1 {
            let limit = largest_fitting_gap(count, domain);
            if self.minimum_gap > limit {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    old = self.minimum_gap,
                    new = limit,
                    "minimum gap shrunk to fit the new domain"
                );
                self.minimum_gap = limit;
            }
        }

        let mut values = self.constrained.values().to_vec();
        correct_constrained(&mut values, domain, self.minimum_gap);
        if values != self.constrained.values() {
            self.constrained.replace(&values);
            self.notify_constrained(ChangeSource::Programmatic);
        }

        let mut free = self.free.values().to_vec();
        clamp_all(&mut free, domain);
        if free != self.free.values() {
            self.free.replace(&free);
            self.notify_free(ChangeSource::Programmatic);
        }

        let mut marks = self.constrained_marks.values().to_vec();
        clamp_all(&mut marks, domain);
        self.constrained_marks.replace(&marks);
        let mut marks = self.free_marks.values().to_vec();
        clamp_all(&mut marks, domain);
        self.free_marks.replace(&marks);

        let bounds = self.checked_bounds();
        match bounds {
            Ok(bounds) => self.bounds = bounds,
            Err(_rejection) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    %_rejection,
                    "bounds infeasible after domain change; pinning constrained thumbs"
                );
                self.bounds = self
                    .constrained
                    .values()
                    .iter()
                    .map(|&v| ValueRange::new(v, v))
                    .collect();
            }
        }
        self.bump();
        Ok(())
    }

    /// Returns the visible range.
    #[must_use]
    pub fn visible_range(&self) -> ValueRange {
        self.visible
    }

    /// Sets the visible range.
    ///
    /// Bounds outside the domain are pulled back in: a lower bound past the
    /// domain maximum becomes `max - DEFAULT_VISIBLE_OFFSET`, an upper bound
    /// below the minimum becomes `min + DEFAULT_VISIBLE_OFFSET`, and both are
    /// finally clamped into the domain.
    pub fn set_visible_range(&mut self, lower: i64, upper: i64) -> Result<(), ArgumentError> {
        if lower >= upper {
            return Err(ArgumentError::EmptyRange {
                min: lower,
                max: upper,
            });
        }
        self.apply_visible_range(lower, upper, ChangeSource::Programmatic, false);
        Ok(())
    }

    /// Resizes the visible range to `length` values around its center.
    ///
    /// The result is shifted to stay inside the domain and capped at the
    /// domain's extent. Returns `true` if the visible range changed.
    pub fn zoom_visible_range(&mut self, length: i64) -> bool {
        if length < 2 {
            return false;
        }
        let lower = i128::from(self.visible.min);
        let extent = i128::from(self.visible.max) + 1 - lower;
        let center = lower + (extent + 1) / 2;

        let length = i128::from(length).min(self.domain.span() + 1);
        let mut new_lower = center - (length + 1) / 2;
        let mut new_upper = new_lower + length - 1;
        let (min, max) = (i128::from(self.domain.min), i128::from(self.domain.max));
        if new_lower < min {
            new_upper += min - new_lower;
            new_lower = min;
        }
        if new_upper > max {
            new_lower -= new_upper - max;
            new_upper = max;
        }
        let (Ok(new_lower), Ok(new_upper)) = (i64::try_from(new_lower), i64::try_from(new_upper))
        else {
            return false;
        };
        self.apply_visible_range(new_lower, new_upper, ChangeSource::Programmatic, false)
    }

    /// Returns the client area.
    #[must_use]
    pub fn client_area(&self) -> Rect {
        self.client
    }

    /// Returns the resize behavior.
    #[must_use]
    pub fn resize_behavior(&self) -> ResizeBehavior {
        self.resize_behavior
    }

    /// Sets the resize behavior.
    pub fn set_resize_behavior(&mut self, behavior: ResizeBehavior) {
        self.resize_behavior = behavior;
    }

    /// Records a new client area.
    ///
    /// With [`ResizeBehavior::ChangeValueRange`] a width change keeps the
    /// number of values per pixel and grows or shrinks the visible range from
    /// its lower end, reporting [`ChangeSource::Resize`].
    pub fn set_client_area(&mut self, client: Rect) {
        if client == self.client {
            return;
        }
        let old_width = libm::round(self.client.width());
        let new_width = libm::round(client.width());
        self.client = client;
        self.bump();

        if self.resize_behavior != ResizeBehavior::ChangeValueRange
            || old_width <= 0.0
            || new_width <= 0.0
            || old_width == new_width
        {
            return;
        }
        let per_pixel = self.visible.span() as f64 / old_width;
        let extent = round_to_i64(per_pixel * new_width).max(1);
        let mut lower = self.visible.min;
        let mut upper = lower.saturating_add(extent);
        if upper > self.domain.max {
            lower = lower
                .saturating_sub(upper - self.domain.max)
                .max(self.domain.min);
            upper = self.domain.max;
        }
        self.apply_visible_range(lower, upper, ChangeSource::Resize, false);
    }

    /// Returns a mapper for the current visible range and client area.
    #[must_use]
    pub fn coordinate_mapper(&self) -> CoordinateMapper {
        CoordinateMapper::new(self.visible, self.client)
    }

    // --- Constrained thumbs ---

    /// Number of constrained thumbs.
    #[must_use]
    pub fn constrained_count(&self) -> usize {
        self.constrained.len()
    }

    /// Value of the constrained thumb at `index`.
    #[must_use]
    pub fn constrained_value(&self, index: usize) -> Option<i64> {
        self.constrained.values().get(index).copied()
    }

    /// Copy of all constrained thumb values.
    #[must_use]
    pub fn constrained_values(&self) -> Vec<i64> {
        self.constrained.values().to_vec()
    }

    /// Whether the constrained thumb at `index` can be dragged.
    #[must_use]
    pub fn is_constrained_editable(&self, index: usize) -> Option<bool> {
        self.constrained.is_editable(index)
    }

    /// Achievable range of the constrained thumb at `index`.
    #[must_use]
    pub fn constrained_bounds(&self, index: usize) -> Option<ValueRange> {
        self.bounds.get(index).copied()
    }

    /// Copy of the achievable ranges of all constrained thumbs.
    #[must_use]
    pub fn all_constrained_bounds(&self) -> Vec<ValueRange> {
        self.bounds.to_vec()
    }

    /// The individual allowed range of the constrained thumb at `index`, or
    /// the domain if it has none.
    #[must_use]
    pub fn constrained_allowed_range(&self, index: usize) -> ValueRange {
        self.overrides.get(&index).copied().unwrap_or(self.domain)
    }

    /// Restricts the constrained thumb at `index` to `min..=max`.
    ///
    /// The thumb's current value is clamped into the new range. If the clamped
    /// value would violate the minimum gap, or the bounds become infeasible,
    /// the call is rejected and both the previous range and value stay.
    pub fn set_constrained_allowed_range(
        &mut self,
        index: usize,
        min: i64,
        max: i64,
    ) -> Result<(), Error> {
        if min > max {
            return Err(ArgumentError::InvertedRange { min, max }.into());
        }
        self.check_constrained_index(index)?;
        let range = ValueRange::new(min, max);
        if self.overrides.get(&index) == Some(&range) {
            return Ok(());
        }
        let before = self.constrained_values();
        self.transact(|this| {
            this.overrides.insert(index, range);
            let current = this.constrained.values()[index];
            let clamped = range.clamp(current);
            if clamped != current {
                this.constrained.set(index, clamped);
                if first_gap_violation(this.constrained.values(), this.minimum_gap).is_some() {
                    return Err(Rejection::GapViolation { index }.into());
                }
            }
            this.recompute_bounds()
        })?;
        self.finish_constrained(&before, ChangeSource::Programmatic);
        Ok(())
    }

    /// Removes the individual allowed range of the constrained thumb at
    /// `index`.
    pub fn clear_constrained_allowed_range(&mut self, index: usize) -> Result<(), Error> {
        if !self.overrides.contains_key(&index) {
            return Ok(());
        }
        self.transact(|this| {
            this.overrides.remove(&index);
            this.recompute_bounds()
        })?;
        self.bump();
        Ok(())
    }

    /// Moves the constrained thumb at `index` to `value`.
    ///
    /// Fails with an argument error if the value lies outside the domain, and
    /// is rejected if it leaves the thumb's allowed range or sits closer to a
    /// neighbor than the minimum gap allows.
    pub fn set_constrained_value(&mut self, index: usize, value: i64) -> Result<(), Error> {
        self.check_constrained_index(index)?;
        self.check_in_domain(value)?;
        let current = self.constrained.values()[index];
        if value == current {
            return Ok(());
        }
        if !self.constrained_allowed_range(index).contains(value) {
            return self.reject(Rejection::OutsideAllowedRange { index });
        }
        let values = self.constrained.values();
        let gap = i128::from(self.minimum_gap);
        let too_close_below = index > 0 && i128::from(value) - i128::from(values[index - 1]) < gap;
        let too_close_above =
            index + 1 < values.len() && i128::from(values[index + 1]) - i128::from(value) < gap;
        if too_close_below || too_close_above {
            return self.reject(Rejection::GapViolation { index });
        }

        let before = self.constrained_values();
        self.transact(|this| {
            this.constrained.set(index, value);
            this.recompute_bounds()
        })?;
        self.finish_constrained(&before, ChangeSource::Programmatic);
        Ok(())
    }

    /// Replaces all constrained thumb values; the slice length becomes the
    /// new thumb count.
    ///
    /// Existing thumbs keep their editability and new thumbs are editable.
    /// Values must be non-decreasing and inside the domain; the minimum gap
    /// and individual allowed ranges must be respected, else the call is
    /// rejected.
    pub fn set_constrained_values(&mut self, values: &[i64]) -> Result<(), Error> {
        if let Some(index) = first_descending(values) {
            return Err(ArgumentError::NotAscending { index }.into());
        }
        if let Some(index) = first_outside(values, self.domain) {
            return Err(self.out_of_range(values[index]).into());
        }
        if values == self.constrained.values() {
            return Ok(());
        }
        if let Some(index) = first_gap_violation(values, self.minimum_gap) {
            return self.reject(Rejection::GapViolation { index });
        }
        if let Some(index) = (0..values.len())
            .find(|&i| !self.constrained_allowed_range(i).contains(values[i]))
        {
            return self.reject(Rejection::OutsideAllowedRange { index });
        }

        let before = self.constrained_values();
        self.transact(|this| {
            this.constrained.replace(values);
            this.recompute_bounds()
        })?;
        self.finish_constrained(&before, ChangeSource::Programmatic);
        Ok(())
    }

    /// Allows or forbids dragging the constrained thumb at `index`.
    pub fn set_constrained_editable(&mut self, index: usize, editable: bool) -> Result<(), Error> {
        self.check_constrained_index(index)?;
        if self.constrained.is_editable(index) == Some(editable) {
            return Ok(());
        }
        self.transact(|this| {
            this.constrained.set_editable(index, editable);
            this.recompute_bounds()
        })?;
        self.bump();
        Ok(())
    }

    // --- Gap, lock and snap ---

    /// Returns the minimum gap between adjacent constrained thumbs.
    #[must_use]
    pub fn minimum_gap(&self) -> i64 {
        self.minimum_gap
    }

    /// Sets the minimum gap between adjacent constrained thumbs.
    ///
    /// The gap must fit the current thumb count into the domain. Existing
    /// values are then moved as little as possible to satisfy it while
    /// staying inside their bounds; the call is rejected if the bounds become
    /// infeasible under the new gap.
    pub fn set_minimum_gap(&mut self, gap: i64) -> Result<(), Error> {
        if gap < 0 {
            return Err(ArgumentError::NegativeGap(gap).into());
        }
        if gap == self.minimum_gap {
            return Ok(());
        }
        let count = self.constrained.len();
        if count > 1 {
            let pairs = i128::try_from(count - 1).unwrap_or(i128::MAX);
            if pairs.saturating_mul(i128::from(gap)) > self.domain.span() + 1 {
                let limit = i64::try_from((self.domain.span() + 1) / pairs).unwrap_or(i64::MAX);
                return self.reject(Rejection::GapTooLarge { gap, limit });
            }
        }

        let before = self.constrained_values();
        self.transact(|this| {
            this.minimum_gap = gap;
            // Current values may not satisfy the new gap yet, so only the
            // min/max consistency is checked here.
            let bounds = compute_bounds(&this.bounds_input());
            let bounds = bounds.map_err(|infeasible| Rejection::InfeasibleBounds {
                index: infeasible.index,
            })?;
            let mut values = this.constrained.values().to_vec();
            fit_constrained(&mut values, &bounds, gap);
            this.constrained.replace(&values);
            this.recompute_bounds()
        })?;
        self.finish_constrained(&before, ChangeSource::Programmatic);
        Ok(())
    }

    /// Returns `true` if dragging one constrained thumb moves all of them.
    #[must_use]
    pub fn is_interval_locked(&self) -> bool {
        self.locked
    }

    /// Locks or unlocks the intervals between constrained thumbs.
    pub fn set_interval_locked(&mut self, locked: bool) -> Result<(), Error> {
        if locked == self.locked {
            return Ok(());
        }
        self.transact(|this| {
            this.locked = locked;
            this.recompute_bounds()
        })?;
        self.bump();
        Ok(())
    }

    /// Returns the active snap calculator.
    #[must_use]
    pub fn snap_calculator(&self) -> &dyn SnapCalculator {
        &*self.snap
    }

    /// Returns `true` if a calculator other than the default is installed.
    #[must_use]
    pub fn has_custom_snap_calculator(&self) -> bool {
        self.custom_snap
    }

    /// Installs a snap calculator, rolling back if the bounds become
    /// infeasible under it or no longer contain the current values.
    pub fn set_snap_calculator<S>(&mut self, calculator: S) -> Result<(), Error>
    where
        S: SnapCalculator + 'static,
    {
        self.replace_snap(Box::new(calculator), true)
    }

    /// Reinstalls the default [`ClampSnap`] calculator.
    pub fn clear_snap_calculator(&mut self) -> Result<(), Error> {
        if !self.custom_snap {
            return Ok(());
        }
        self.replace_snap(Box::new(ClampSnap), false)
    }

    fn replace_snap(&mut self, snap: Box<dyn SnapCalculator>, custom: bool) -> Result<(), Error> {
        let old = core::mem::replace(&mut self.snap, snap);
        let old_custom = core::mem::replace(&mut self.custom_snap, custom);
        if let Err(err) = self.recompute_bounds() {
            self.snap = old;
            self.custom_snap = old_custom;
            #[cfg(feature = "tracing")]
            tracing::debug!(%err, "snap calculator rolled back");
            return Err(err);
        }
        self.bump();
        Ok(())
    }

    // --- Free thumbs ---

    /// Number of free thumbs.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Value of the free thumb at `index`.
    #[must_use]
    pub fn free_value(&self, index: usize) -> Option<i64> {
        self.free.values().get(index).copied()
    }

    /// Copy of all free thumb values.
    #[must_use]
    pub fn free_values(&self) -> Vec<i64> {
        self.free.values().to_vec()
    }

    /// Whether the free thumb at `index` can be dragged.
    #[must_use]
    pub fn is_free_editable(&self, index: usize) -> Option<bool> {
        self.free.is_editable(index)
    }

    /// Moves the free thumb at `index` to `value`.
    pub fn set_free_value(&mut self, index: usize, value: i64) -> Result<(), ArgumentError> {
        check_index(index, self.free.len())?;
        self.check_in_domain(value)?;
        if self.free.values()[index] == value {
            return Ok(());
        }
        self.free.set(index, value);
        self.notify_free(ChangeSource::Programmatic);
        self.bump();
        Ok(())
    }

    /// Replaces all free thumb values; the slice length becomes the new
    /// count.
    pub fn set_free_values(&mut self, values: &[i64]) -> Result<(), ArgumentError> {
        if let Some(index) = first_outside(values, self.domain) {
            return Err(self.out_of_range(values[index]));
        }
        if values == self.free.values() {
            return Ok(());
        }
        self.free.replace(values);
        self.notify_free(ChangeSource::Programmatic);
        self.bump();
        Ok(())
    }

    /// Allows or forbids dragging the free thumb at `index`.
    pub fn set_free_editable(&mut self, index: usize, editable: bool) -> Result<(), ArgumentError> {
        check_index(index, self.free.len())?;
        if self.free.set_editable(index, editable) != editable {
            self.bump();
        }
        Ok(())
    }

    // --- Marks and colors ---

    /// Copy of the constrained mark values.
    #[must_use]
    pub fn constrained_marks(&self) -> Vec<i64> {
        self.constrained_marks.values().to_vec()
    }

    /// Replaces the constrained marks. Values must be non-decreasing and
    /// inside the domain.
    pub fn set_constrained_marks(&mut self, values: &[i64]) -> Result<(), ArgumentError> {
        if let Some(index) = first_descending(values) {
            return Err(ArgumentError::NotAscending { index });
        }
        if let Some(index) = first_outside(values, self.domain) {
            return Err(self.out_of_range(values[index]));
        }
        if values != self.constrained_marks.values() {
            self.constrained_marks.replace(values);
            self.bump();
        }
        Ok(())
    }

    /// Moves the constrained mark at `index`; rejected if it would overtake a
    /// neighbor.
    pub fn set_constrained_mark(&mut self, index: usize, value: i64) -> Result<(), Error> {
        check_index(index, self.constrained_marks.len())?;
        self.check_in_domain(value)?;
        let marks = self.constrained_marks.values();
        if marks[index] == value {
            return Ok(());
        }
        if (index > 0 && marks[index - 1] > value)
            || (index + 1 < marks.len() && marks[index + 1] < value)
        {
            return self.reject(Rejection::OrderViolation { index });
        }
        self.constrained_marks.set(index, value);
        self.bump();
        Ok(())
    }

    /// Copy of the free mark values.
    #[must_use]
    pub fn free_marks(&self) -> Vec<i64> {
        self.free_marks.values().to_vec()
    }

    /// Replaces the free marks.
    pub fn set_free_marks(&mut self, values: &[i64]) -> Result<(), ArgumentError> {
        if let Some(index) = first_outside(values, self.domain) {
            return Err(self.out_of_range(values[index]));
        }
        if values != self.free_marks.values() {
            self.free_marks.replace(values);
            self.bump();
        }
        Ok(())
    }

    /// Moves the free mark at `index`.
    pub fn set_free_mark(&mut self, index: usize, value: i64) -> Result<(), ArgumentError> {
        check_index(index, self.free_marks.len())?;
        self.check_in_domain(value)?;
        if self.free_marks.values()[index] != value {
            self.free_marks.set(index, value);
            self.bump();
        }
        Ok(())
    }

    /// Color of the constrained mark at `index`.
    #[must_use]
    pub fn constrained_mark_color(&self, index: usize) -> Option<Color> {
        self.constrained_marks.color(index)
    }

    /// Sets or clears the color of the constrained mark at `index`.
    pub fn set_constrained_mark_color(
        &mut self,
        index: usize,
        color: Option<Color>,
    ) -> Result<(), ArgumentError> {
        check_index(index, self.constrained_marks.len())?;
        if self.constrained_marks.color(index) != color {
            self.constrained_marks.set_color(index, color);
            self.bump();
        }
        Ok(())
    }

    /// Color of the free mark at `index`.
    #[must_use]
    pub fn free_mark_color(&self, index: usize) -> Option<Color> {
        self.free_marks.color(index)
    }

    /// Sets or clears the color of the free mark at `index`.
    pub fn set_free_mark_color(
        &mut self,
        index: usize,
        color: Option<Color>,
    ) -> Result<(), ArgumentError> {
        check_index(index, self.free_marks.len())?;
        if self.free_marks.color(index) != color {
            self.free_marks.set_color(index, color);
            self.bump();
        }
        Ok(())
    }

    /// Color of range `index` between constrained marks.
    #[must_use]
    pub fn constrained_mark_range_color(&self, index: usize) -> Option<Color> {
        self.constrained_mark_ranges.get(index)
    }

    /// Sets or clears the color of range `index` between constrained marks.
    ///
    /// There are `count + 1` ranges; `index` may be at most the mark count.
    pub fn set_constrained_mark_range_color(
        &mut self,
        index: usize,
        color: Option<Color>,
    ) -> Result<(), ArgumentError> {
        check_index(index, self.constrained_marks.len() + 1)?;
        if self.constrained_mark_ranges.get(index) != color {
            self.constrained_mark_ranges.set(index, color);
            self.bump();
        }
        Ok(())
    }

    /// Color of range `index` between constrained thumbs.
    #[must_use]
    pub fn constrained_thumb_range_color(&self, index: usize) -> Option<Color> {
        self.constrained_thumb_ranges.get(index)
    }

    /// Sets or clears the color of range `index` between constrained thumbs.
    ///
    /// There are `count + 1` ranges; `index` may be at most the thumb count.
    pub fn set_constrained_thumb_range_color(
        &mut self,
        index: usize,
        color: Option<Color>,
    ) -> Result<(), ArgumentError> {
        check_index(index, self.constrained.len() + 1)?;
        if self.constrained_thumb_ranges.get(index) != color {
            self.constrained_thumb_ranges.set(index, color);
            self.bump();
        }
        Ok(())
    }

    // --- Drawing order and flags ---

    /// Sets whether constrained thumbs are drawn above free thumbs.
    pub fn set_constrained_thumbs_above_free(&mut self, above: bool) {
        if self.constrained_thumbs_above_free != above {
            self.constrained_thumbs_above_free = above;
            self.bump();
        }
    }

    /// Sets whether constrained marks are drawn above free marks.
    pub fn set_constrained_marks_above_free(&mut self, above: bool) {
        if self.constrained_marks_above_free != above {
            self.constrained_marks_above_free = above;
            self.bump();
        }
    }

    /// Thumb kinds from bottom to top.
    #[must_use]
    pub fn thumb_drawing_order(&self) -> [ThumbKind; 2] {
        stacking(self.constrained_thumbs_above_free)
    }

    /// Thumb kinds in the order pointer hits should be tested: topmost
    /// first.
    #[must_use]
    pub fn thumb_hit_test_order(&self) -> [ThumbKind; 2] {
        let [bottom, top] = self.thumb_drawing_order();
        [top, bottom]
    }

    /// Mark kinds from bottom to top.
    #[must_use]
    pub fn mark_drawing_order(&self) -> [ThumbKind; 2] {
        stacking(self.constrained_marks_above_free)
    }

    /// Returns `true` if the control accepts drags.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables the control.
    ///
    /// A [`DragCoordinator`](crate::DragCoordinator) completes its current
    /// drag the next time it sees the control disabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.bump();
        }
    }

    /// Returns `true` if dragging empty space pans the visible range.
    #[must_use]
    pub fn is_viewport_draggable(&self) -> bool {
        self.viewport_draggable
    }

    /// Allows or forbids panning the visible range by dragging empty space.
    pub fn set_viewport_draggable(&mut self, draggable: bool) {
        self.viewport_draggable = draggable;
    }

    // --- Listeners and snapshots ---

    /// Registers a listener and returns a handle for removing it.
    pub fn add_listener<L>(&mut self, listener: L) -> ListenerId
    where
        L: MultiValueListener + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener; returns `false` if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(other, _)| *other != id);
        self.listeners.len() != before
    }

    /// Copies out everything needed to draw the control.
    #[must_use]
    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot {
            domain: self.domain,
            visible: self.visible,
            client: self.client,
            enabled: self.enabled,
            constrained_values: self.constrained.values().to_vec(),
            constrained_editable: self.constrained.editable().to_vec(),
            constrained_bounds: self.bounds.to_vec(),
            free_values: self.free.values().to_vec(),
            free_editable: self.free.editable().to_vec(),
            constrained_marks: self.constrained_marks.values().to_vec(),
            constrained_mark_colors: self.constrained_marks.colors().to_vec(),
            constrained_mark_range_colors: self
                .constrained_mark_ranges
                .to_vec(self.constrained_marks.len() + 1),
            free_marks: self.free_marks.values().to_vec(),
            free_mark_colors: self.free_marks.colors().to_vec(),
            constrained_thumb_range_colors: self
                .constrained_thumb_ranges
                .to_vec(self.constrained.len() + 1),
            thumb_drawing_order: self.thumb_drawing_order(),
            mark_drawing_order: self.mark_drawing_order(),
            revision: self.revision,
        }
    }

    // --- Drag commits ---

    pub(crate) fn constrained_slice(&self) -> &[i64] {
        self.constrained.values()
    }

    pub(crate) fn bounds_slice(&self) -> &[ValueRange] {
        &self.bounds
    }

    /// Applies constrained values resolved by a drag.
    ///
    /// The values are revalidated; anything that would break an invariant is
    /// dropped. Returns `true` if listeners were notified.
    pub(crate) fn commit_constrained_drag(&mut self, values: &[i64], source: ChangeSource) -> bool {
        let valid = values.len() == self.constrained.len()
            && first_outside(values, self.domain).is_none()
            && first_gap_violation(values, self.minimum_gap).is_none()
            && first_descending(values).is_none()
            && (0..values.len()).all(|i| self.constrained_allowed_range(i).contains(values[i]));
        if !valid {
            #[cfg(feature = "tracing")]
            tracing::debug!(?values, "dropped invalid drag commit");
            return false;
        }
        let changed = values != self.constrained.values();
        if !changed && source != ChangeSource::DragComplete {
            return false;
        }
        if changed {
            let saved = self.save_constraints();
            self.constrained.replace(values);
            if self.recompute_bounds().is_err() {
                self.restore_constraints(saved);
                return false;
            }
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(?values, ?source, "constrained drag commit");
        self.notify_constrained(source);
        if changed {
            self.bump();
        }
        true
    }

    /// Applies a free thumb value resolved by a drag. Returns `true` if
    /// listeners were notified.
    pub(crate) fn commit_free_drag(&mut self, index: usize, value: i64, source: ChangeSource) -> bool {
        if index >= self.free.len() || !self.domain.contains(value) {
            return false;
        }
        let changed = self.free.values()[index] != value;
        if !changed && source != ChangeSource::DragComplete {
            return false;
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(index, value, ?source, "free drag commit");
        if changed {
            self.free.set(index, value);
            self.bump();
        }
        self.notify_free(source);
        true
    }

    /// Pans the visible range by `delta`, stopping at the domain edges.
    /// Returns `true` if listeners were notified.
    pub(crate) fn pan_visible_range(&mut self, delta: i64, source: ChangeSource) -> bool {
        let room_below = i128::from(self.domain.min) - i128::from(self.visible.min);
        let room_above = i128::from(self.domain.max) - i128::from(self.visible.max);
        let delta = i128::from(delta).clamp(room_below.min(0), room_above.max(0));
        let delta = i64::try_from(delta).unwrap_or(0);
        self.apply_visible_range(
            self.visible.min.saturating_add(delta),
            self.visible.max.saturating_add(delta),
            source,
            source == ChangeSource::DragComplete,
        )
    }

    // --- Internals ---

    fn bounds_input(&self) -> BoundsInput<'_> {
        BoundsInput {
            values: self.constrained.values(),
            editable: self.constrained.editable(),
            overrides: &self.overrides,
            domain: self.domain,
            minimum_gap: self.minimum_gap,
            locked: self.locked,
            snap: &*self.snap,
        }
    }

    /// Runs the bounds pass and checks that every constrained value lies
    /// inside its bounds.
    fn checked_bounds(&self) -> Result<ThumbBounds, Rejection> {
        let bounds = compute_bounds(&self.bounds_input());
        let bounds = bounds.map_err(|infeasible| Rejection::InfeasibleBounds {
            index: infeasible.index,
        })?;
        let values = self.constrained.values();
        if let Some(index) = (0..values.len()).find(|&i| !bounds[i].contains(values[i])) {
            return Err(Rejection::InfeasibleBounds { index });
        }
        Ok(bounds)
    }

    fn recompute_bounds(&mut self) -> Result<(), Error> {
        self.bounds = self.checked_bounds()?;
        Ok(())
    }

    fn save_constraints(&self) -> SavedConstraints {
        SavedConstraints {
            constrained: self.constrained.clone(),
            overrides: self.overrides.clone(),
            bounds: self.bounds.clone(),
            minimum_gap: self.minimum_gap,
            locked: self.locked,
        }
    }

    fn restore_constraints(&mut self, saved: SavedConstraints) {
        self.constrained = saved.constrained;
        self.overrides = saved.overrides;
        self.bounds = saved.bounds;
        self.minimum_gap = saved.minimum_gap;
        self.locked = saved.locked;
    }

    /// Runs `op`, restoring the constraint state if it fails.
    fn transact(&mut self, op: impl FnOnce(&mut Self) -> Result<(), Error>) -> Result<(), Error> {
        let saved = self.save_constraints();
        if let Err(err) = op(self) {
            self.restore_constraints(saved);
            #[cfg(feature = "tracing")]
            tracing::debug!(%err, "constrained mutation rolled back");
            return Err(err);
        }
        Ok(())
    }

    fn reject<T>(&self, rejection: Rejection) -> Result<T, Error> {
        #[cfg(feature = "tracing")]
        tracing::debug!(%rejection, "constrained mutation rejected");
        Err(rejection.into())
    }

    /// Notifies and bumps the revision if the constrained values differ from
    /// `before`; otherwise only bumps for the configuration change.
    fn finish_constrained(&mut self, before: &[i64], source: ChangeSource) {
        if before != self.constrained.values() {
            self.notify_constrained(source);
        }
        self.bump();
    }

    fn apply_visible_range(
        &mut self,
        lower: i64,
        upper: i64,
        source: ChangeSource,
        always_notify: bool,
    ) -> bool {
        let (min, max) = (self.domain.min, self.domain.max);
        let mut lower = lower;
        let mut upper = upper;
        if lower > max {
            lower = max.saturating_sub(DEFAULT_VISIBLE_OFFSET);
        }
        if lower < min {
            lower = min;
        }
        if upper < min {
            upper = min.saturating_add(DEFAULT_VISIBLE_OFFSET);
        }
        if upper > max {
            upper = max;
        }
        if lower >= upper {
            lower = min;
            upper = max;
        }
        let visible = ValueRange::new(lower, upper);
        if visible == self.visible && !always_notify {
            return false;
        }
        if visible != self.visible {
            self.visible = visible;
            self.bump();
        }
        for (_, listener) in &mut self.listeners {
            listener.visible_range_changed(visible, source);
        }
        true
    }

    fn notify_constrained(&mut self, source: ChangeSource) {
        let values = self.constrained.values();
        for (_, listener) in &mut self.listeners {
            listener.constrained_values_changed(values, source);
        }
    }

    fn notify_free(&mut self, source: ChangeSource) {
        let values = self.free.values();
        for (_, listener) in &mut self.listeners {
            listener.free_values_changed(values, source);
        }
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn check_constrained_index(&self, index: usize) -> Result<(), ArgumentError> {
        check_index(index, self.constrained.len())
    }

    fn check_in_domain(&self, value: i64) -> Result<(), ArgumentError> {
        if self.domain.contains(value) {
            Ok(())
        } else {
            Err(self.out_of_range(value))
        }
    }

    fn out_of_range(&self, value: i64) -> ArgumentError {
        ArgumentError::OutOfRange {
            value,
            min: self.domain.min,
            max: self.domain.max,
        }
    }
}

fn check_index(index: usize, len: usize) -> Result<(), ArgumentError> {
    if index < len {
        Ok(())
    } else {
        Err(ArgumentError::IndexOutOfBounds { index, len })
    }
}

fn stacking(constrained_on_top: bool) -> [ThumbKind; 2] {
    if constrained_on_top {
        [ThumbKind::Free, ThumbKind::Constrained]
    } else {
        [ThumbKind::Constrained, ThumbKind::Free]
    }
}

/// Largest gap that still spreads `count` thumbs over `domain`.
///
/// Uses `span / (count - 1)` rather than the `span + 1` of the gap check so
/// the first and last thumb can sit exactly on the domain edges.
fn largest_fitting_gap(count: usize, domain: ValueRange) -> i64 {
    let pairs = i128::try_from(count.saturating_sub(1).max(1)).unwrap_or(i128::MAX);
    i64::try_from(domain.span() / pairs).unwrap_or(i64::MAX)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "float to int casts saturate and the input is rounded first"
)]
fn round_to_i64(value: f64) -> i64 {
    libm::round(value) as i64
}
