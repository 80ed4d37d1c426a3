// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag resolution: turn pointer positions into committed thumb values.
//!
//! ## Usage
//!
//! 1) On pointer down, hit-test the control yourself and pass the thumb under
//!    the pointer (if any) to [`DragCoordinator::pointer_down`].
//! 2) Forward pointer moves to [`DragCoordinator::pointer_move`]; each move
//!    commits a [`ChangeSource::DragOngoing`] update.
//! 3) Finish with [`DragCoordinator::pointer_up`], which commits a
//!    [`ChangeSource::DragComplete`] update even if nothing moved.
//!
//! Unlocked constrained drags push neighbors out of the way to keep the
//! minimum gap; locked drags translate every constrained thumb by the same
//! delta.
//!
//! ## Minimal example
//!
//! ```
//! use kurbo::{Point, Rect};
//! use understory_multi_value::{DragCoordinator, MultiValueControl, ThumbSpecifier};
//!
//! let mut control = MultiValueControl::new(0, 100).unwrap();
//! // One pixel per value.
//! control.set_client_area(Rect::new(0.0, 0.0, 101.0, 20.0));
//! control.set_minimum_gap(5).unwrap();
//! control.set_constrained_values(&[10, 50, 90]).unwrap();
//!
//! let mut drag = DragCoordinator::default();
//! let thumb = ThumbSpecifier::constrained(1);
//! assert!(drag.pointer_down(&mut control, Some(thumb), Point::new(50.0, 10.0)));
//! drag.pointer_move(&mut control, Point::new(92.0, 10.0));
//! drag.pointer_up(&mut control, Point::new(92.0, 10.0));
//!
//! assert_eq!(control.constrained_values(), [10, 92, 97]);
//! ```

use alloc::vec::Vec;

use kurbo::Point;

use crate::control::MultiValueControl;
use crate::snap::{SnapCalculator, snap_within};
use crate::types::{ChangeSource, ThumbKind, ThumbSpecifier, ValueRange};

/// What a drag gesture is moving.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragTarget {
    /// A single thumb.
    Thumb(ThumbSpecifier),
    /// The visible range.
    Viewport,
}

/// Drives one drag gesture at a time against a [`MultiValueControl`].
///
/// The coordinator keeps no reference to the control; every call borrows it.
/// If the control is disabled, or the dragged thumb stops being editable or
/// disappears, the next call completes the drag at the last committed values
/// instead of moving anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct DragCoordinator {
    target: Option<DragTarget>,
    last_pos: Option<Point>,
}

impl DragCoordinator {
    /// Returns the current drag target, if a drag is in progress.
    #[must_use]
    pub fn dragging(&self) -> Option<DragTarget> {
        self.target
    }

    /// Returns `true` while a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.target.is_some()
    }

    /// Starts a drag.
    ///
    /// `hit` is the thumb under the pointer as determined by the caller. With
    /// no thumb hit, a viewport pan starts if the control allows it. Returns
    /// `true` if a drag started. A drag still in flight is completed first.
    pub fn pointer_down(
        &mut self,
        control: &mut MultiValueControl,
        hit: Option<ThumbSpecifier>,
        pos: Point,
    ) -> bool {
        if self.is_dragging() {
            self.cancel(control);
        }
        if !control.is_enabled() {
            return false;
        }
        let target = match hit {
            Some(thumb) if thumb_editable(control, thumb) => DragTarget::Thumb(thumb),
            Some(_) => return false,
            None if control.is_viewport_draggable() => DragTarget::Viewport,
            None => return false,
        };
        self.target = Some(target);
        self.last_pos = Some(pos);
        true
    }

    /// Moves the drag to `pos`. Returns `true` if listeners were notified.
    pub fn pointer_move(&mut self, control: &mut MultiValueControl, pos: Point) -> bool {
        self.step(control, pos, ChangeSource::DragOngoing)
    }

    /// Finishes the drag at `pos`. Returns `true` if listeners were notified.
    pub fn pointer_up(&mut self, control: &mut MultiValueControl, pos: Point) -> bool {
        let notified = self.step(control, pos, ChangeSource::DragComplete);
        self.end();
        notified
    }

    /// Finishes the drag at the last committed values, as if the pointer was
    /// released where it last moved. Returns `true` if listeners were
    /// notified.
    pub fn cancel(&mut self, control: &mut MultiValueControl) -> bool {
        let notified = match self.target {
            Some(target) => complete_in_place(control, target),
            None => false,
        };
        self.end();
        notified
    }

    /// Drags the current thumb toward the raw value `value`.
    ///
    /// This is the pointer-free core of [`pointer_move`](Self::pointer_move)
    /// and [`pointer_up`](Self::pointer_up): the value is snapped and resolved
    /// against the other thumbs, then committed with `source`. Does nothing
    /// unless a thumb drag is in progress. Returns `true` if listeners were
    /// notified.
    pub fn drag_to_value(
        &mut self,
        control: &mut MultiValueControl,
        value: i64,
        source: ChangeSource,
    ) -> bool {
        let Some(DragTarget::Thumb(thumb)) = self.target else {
            return false;
        };
        if !control.is_enabled() || !thumb_editable(control, thumb) {
            let notified = complete_in_place(control, DragTarget::Thumb(thumb));
            self.end();
            return notified;
        }
        match thumb.kind {
            ThumbKind::Constrained => {
                let resolved = if control.is_interval_locked() {
                    resolve_locked_drag(
                        control.constrained_slice(),
                        control.bounds_slice(),
                        control.domain(),
                        control.snap_calculator(),
                        thumb.index,
                        value,
                    )
                } else {
                    resolve_unlocked_drag(
                        control.constrained_slice(),
                        control.bounds_slice(),
                        control.minimum_gap(),
                        control.snap_calculator(),
                        thumb.index,
                        value,
                    )
                };
                control.commit_constrained_drag(&resolved, source)
            }
            ThumbKind::Free => {
                let domain = control.domain();
                let target = snap_within(control.snap_calculator(), value, domain.min, domain.max);
                control.commit_free_drag(thumb.index, target, source)
            }
        }
    }

    fn step(&mut self, control: &mut MultiValueControl, pos: Point, source: ChangeSource) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        let mapper = control.coordinate_mapper();
        match target {
            DragTarget::Thumb(_) => {
                self.last_pos = Some(pos);
                self.drag_to_value(control, mapper.point_to_value(pos, true), source)
            }
            DragTarget::Viewport => {
                if !control.is_enabled() || !control.is_viewport_draggable() {
                    let notified = complete_in_place(control, target);
                    self.end();
                    return notified;
                }
                let last = self.last_pos.unwrap_or(pos);
                self.last_pos = Some(pos);
                let delta = mapper.pixel_width_to_value_delta(last.x - pos.x);
                control.pan_visible_range(delta, source)
            }
        }
    }

    fn end(&mut self) {
        self.target = None;
        self.last_pos = None;
    }
}

fn thumb_editable(control: &MultiValueControl, thumb: ThumbSpecifier) -> bool {
    let editable = match thumb.kind {
        ThumbKind::Constrained => control.is_constrained_editable(thumb.index),
        ThumbKind::Free => control.is_free_editable(thumb.index),
    };
    editable == Some(true)
}

/// Commits the current values as the final state of a drag.
fn complete_in_place(control: &mut MultiValueControl, target: DragTarget) -> bool {
    match target {
        DragTarget::Thumb(ThumbSpecifier {
            kind: ThumbKind::Constrained,
            ..
        }) => {
            let values = control.constrained_values();
            control.commit_constrained_drag(&values, ChangeSource::DragComplete)
        }
        DragTarget::Thumb(ThumbSpecifier {
            kind: ThumbKind::Free,
            index,
        }) => match control.free_value(index) {
            Some(value) => control.commit_free_drag(index, value, ChangeSource::DragComplete),
            None => false,
        },
        DragTarget::Viewport => control.pan_visible_range(0, ChangeSource::DragComplete),
    }
}

/// Resolves an unlocked drag of thumb `index` toward `raw`.
///
/// The target is snapped into the thumb's bounds. Thumbs in the direction of
/// motion that end up closer than `gap` are pushed, each to the snapped
/// position `gap` away from its predecessor; the walk stops at the first
/// thumb that already has enough room. Returns `values` unchanged if the
/// snapped target equals the current value or `index` is out of range.
#[must_use]
pub fn resolve_unlocked_drag(
    values: &[i64],
    bounds: &[ValueRange],
    gap: i64,
    snap: &dyn SnapCalculator,
    index: usize,
    raw: i64,
) -> Vec<i64> {
    let mut out = values.to_vec();
    let Some(own) = bounds.get(index).filter(|b| b.is_valid()) else {
        return out;
    };
    if index >= out.len() || bounds.len() != out.len() {
        return out;
    }
    let target = snap_within(snap, raw, own.min, own.max);
    let current = out[index];
    if target == current {
        return out;
    }
    out[index] = target;

    if target > current {
        for j in index + 1..out.len() {
            let floor = out[j - 1].saturating_add(gap);
            if out[j] >= floor {
                break;
            }
            let hi = bounds[j].max;
            out[j] = if floor <= hi {
                snap_within(snap, floor, floor, hi)
            } else {
                floor
            };
        }
    } else {
        for j in (0..index).rev() {
            let ceiling = out[j + 1].saturating_sub(gap);
            if out[j] <= ceiling {
                break;
            }
            let lo = bounds[j].min;
            out[j] = if lo <= ceiling {
                snap_within(snap, ceiling, lo, ceiling)
            } else {
                ceiling
            };
        }
    }
    out
}

/// Resolves a locked drag of thumb `index` toward `raw`.
///
/// The target is snapped into the thumb's bounds and every value moves by the
/// same delta. The delta is limited so the first and last values stay inside
/// `domain` and every thumb stays inside its own bounds.
#[must_use]
pub fn resolve_locked_drag(
    values: &[i64],
    bounds: &[ValueRange],
    domain: ValueRange,
    snap: &dyn SnapCalculator,
    index: usize,
    raw: i64,
) -> Vec<i64> {
    let (Some(&first), Some(&last), Some(&current), Some(own)) = (
        values.first(),
        values.last(),
        values.get(index),
        bounds.get(index).filter(|b| b.is_valid()),
    ) else {
        return values.to_vec();
    };
    if bounds.len() != values.len() {
        return values.to_vec();
    }
    let target = snap_within(snap, raw, own.min, own.max);
    let mut lowest = i128::from(domain.min) - i128::from(first);
    let mut highest = i128::from(domain.max) - i128::from(last);
    for (&v, b) in values.iter().zip(bounds) {
        lowest = lowest.max(i128::from(b.min) - i128::from(v));
        highest = highest.min(i128::from(b.max) - i128::from(v));
    }
    if lowest > highest {
        return values.to_vec();
    }
    let delta = (i128::from(target) - i128::from(current)).clamp(lowest, highest);
    values
        .iter()
        .map(|&v| i64::try_from(i128::from(v) + delta).unwrap_or(v))
        .collect()
}
