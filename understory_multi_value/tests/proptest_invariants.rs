// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property-based invariant tests for the constraint engine.
//!
//! These drive a control through random mutation sequences and check:
//!
//! 1. Every constrained thumb lies inside its bounds, and bounds are non-empty,
//!    including under step snapping.
//! 2. Adjacent constrained thumbs keep the minimum gap.
//! 3. Locked drags preserve every interval.
//! 4. Failed mutations leave the whole control unchanged.
//! 5. Re-applying the current values is silent.
//! 6. Snap calculators never leave their window.
//! 7. Both ends of every editable thumb's bounds are reachable by a drag, even
//!    with several overlapping allowed ranges.

use std::cell::Cell;
use std::rc::Rc;

use kurbo::Point;
use proptest::prelude::*;
use understory_multi_value::{
    ChangeSource, ClampSnap, DragCoordinator, MultiValueControl, MultiValueListener, SnapCalculator,
    StepSnap, ThumbSpecifier, resolve_unlocked_drag,
};

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
enum Op {
    SetValue(usize, i64),
    SetValues(Vec<i64>),
    Drag(usize, i64),
    AllowedRange(usize, i64, i64),
    ClearAllowedRange(usize),
    Gap(i64),
    Lock(bool),
    Editable(usize, bool),
    Domain(i64, i64),
    Snap(i64),
    ClearSnap,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..6, -20i64..220).prop_map(|(i, v)| Op::SetValue(i, v)),
        prop::collection::vec(-20i64..220, 0..6).prop_map(|mut v| {
            v.sort_unstable();
            Op::SetValues(v)
        }),
        (0usize..6, -50i64..250).prop_map(|(i, v)| Op::Drag(i, v)),
        (0usize..6, -20i64..220, 0i64..80).prop_map(|(i, lo, len)| Op::AllowedRange(i, lo, lo + len)),
        (0usize..6).prop_map(Op::ClearAllowedRange),
        (0i64..60).prop_map(Op::Gap),
        any::<bool>().prop_map(Op::Lock),
        (0usize..6, any::<bool>()).prop_map(|(i, e)| Op::Editable(i, e)),
        (-50i64..50, 1i64..250).prop_map(|(lo, len)| Op::Domain(lo, lo + len)),
        (0i64..30).prop_map(Op::Snap),
        Just(Op::ClearSnap),
    ]
}

/// Sorted thumbs spread over `0..=200` with the given gap.
fn thumbs_strategy() -> impl Strategy<Value = (i64, Vec<i64>)> {
    (0i64..20, prop::collection::vec(0i64..40, 0..6)).prop_map(|(gap, steps)| {
        let mut values = Vec::with_capacity(steps.len());
        let mut next = 0;
        for step in steps {
            next += step;
            values.push(next.min(200));
            next += gap;
        }
        (gap, values)
    })
}

fn build(gap: i64, values: &[i64]) -> Option<MultiValueControl> {
    let mut control = MultiValueControl::new(0, 200).unwrap();
    control.set_minimum_gap(gap).ok()?;
    control.set_constrained_values(values).ok()?;
    Some(control)
}

fn apply(control: &mut MultiValueControl, op: &Op) -> bool {
    match *op {
        Op::SetValue(i, v) => control.set_constrained_value(i, v).is_ok(),
        Op::SetValues(ref v) => control.set_constrained_values(v).is_ok(),
        Op::Drag(i, v) => {
            let mut drag = DragCoordinator::default();
            if !drag.pointer_down(control, Some(ThumbSpecifier::constrained(i)), Point::ZERO) {
                return false;
            }
            drag.drag_to_value(control, v, ChangeSource::DragOngoing);
            drag.cancel(control);
            true
        }
        Op::AllowedRange(i, lo, hi) => control.set_constrained_allowed_range(i, lo, hi).is_ok(),
        Op::ClearAllowedRange(i) => control.clear_constrained_allowed_range(i).is_ok(),
        Op::Gap(g) => control.set_minimum_gap(g).is_ok(),
        Op::Lock(b) => control.set_interval_locked(b).is_ok(),
        Op::Editable(i, e) => control.set_constrained_editable(i, e).is_ok(),
        Op::Domain(lo, hi) => control.set_domain(lo, hi).is_ok(),
        Op::Snap(step) => control.set_snap_calculator(StepSnap::new(step)).is_ok(),
        Op::ClearSnap => control.clear_snap_calculator().is_ok(),
    }
}

fn check_invariants(control: &MultiValueControl) -> Result<(), TestCaseError> {
    let values = control.constrained_values();
    let bounds = control.all_constrained_bounds();
    let domain = control.domain();
    prop_assert_eq!(values.len(), bounds.len());
    for (i, (&v, b)) in values.iter().zip(&bounds).enumerate() {
        prop_assert!(b.min <= b.max, "empty bounds {:?} at {}", b, i);
        prop_assert!(
            b.min <= v && v <= b.max,
            "value {} outside bounds {:?} at {}",
            v,
            b,
            i
        );
        prop_assert!(domain.contains(v), "value {} outside domain {:?}", v, domain);
        prop_assert!(
            control.constrained_allowed_range(i).contains(v),
            "value {} outside allowed range at {}",
            v,
            i
        );
    }
    for w in values.windows(2) {
        prop_assert!(
            w[1] - w[0] >= control.minimum_gap(),
            "gap violated in {:?} (gap {})",
            values,
            control.minimum_gap()
        );
    }
    let visible = control.visible_range();
    prop_assert!(visible.min < visible.max);
    prop_assert!(domain.contains(visible.min) && domain.contains(visible.max));
    Ok(())
}

#[derive(Clone, Default)]
struct Count(Rc<Cell<usize>>);

impl MultiValueListener for Count {
    fn constrained_values_changed(&mut self, _: &[i64], _: ChangeSource) {
        self.0.set(self.0.get() + 1);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1 + 2. Bounds validity and gap invariant under random operations
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn invariants_hold_after_every_operation(
        (gap, values) in thumbs_strategy(),
        ops in prop::collection::vec(op_strategy(), 0..24),
    ) {
        let Some(mut control) = build(gap, &values) else {
            return Ok(());
        };
        check_invariants(&control)?;
        for op in &ops {
            apply(&mut control, op);
            check_invariants(&control)?;
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Locked drags preserve intervals
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn locked_drag_preserves_intervals(
        (gap, values) in thumbs_strategy(),
        index in 0usize..6,
        target in -50i64..250,
    ) {
        let Some(mut control) = build(gap, &values) else {
            return Ok(());
        };
        if values.is_empty() {
            return Ok(());
        }
        let index = index % values.len();
        control.set_interval_locked(true).unwrap();
        let before = control.constrained_values();
        apply(&mut control, &Op::Drag(index, target));
        let after = control.constrained_values();
        let intervals = |v: &[i64]| v.windows(2).map(|w| w[1] - w[0]).collect::<Vec<_>>();
        prop_assert_eq!(intervals(&before), intervals(&after));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Rollback on failure
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn failed_mutations_change_nothing(
        (gap, values) in thumbs_strategy(),
        setup in prop::collection::vec(op_strategy(), 0..8),
        op in op_strategy(),
        step in 2i64..60,
    ) {
        let Some(mut control) = build(gap, &values) else {
            return Ok(());
        };
        for op in &setup {
            apply(&mut control, op);
        }
        let before = control.snapshot();
        if !matches!(op, Op::Drag(..)) && !apply(&mut control, &op) {
            prop_assert_eq!(control.snapshot(), before);
        }

        let before = control.snapshot();
        if control.set_snap_calculator(StepSnap::new(step)).is_err() {
            prop_assert!(!control.has_custom_snap_calculator());
            prop_assert_eq!(control.snapshot(), before);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reapplying_values_is_silent((gap, values) in thumbs_strategy()) {
        let Some(mut control) = build(gap, &values) else {
            return Ok(());
        };
        let count = Count::default();
        control.add_listener(count.clone());
        let revision = control.revision();
        control.set_constrained_values(&control.constrained_values()).unwrap();
        prop_assert_eq!(count.0.get(), 0);
        prop_assert_eq!(control.revision(), revision);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Snap contract
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn snap_stays_in_window(
        value in any::<i64>(),
        lo in -1_000_000i64..1_000_000,
        len in 0i64..1_000_000,
        step in -5i64..1_000,
        origin in -1_000i64..1_000,
    ) {
        let hi = lo + len;
        let snapped = StepSnap::new(step).with_origin(origin).snap(value, lo, hi);
        prop_assert!(lo <= snapped && snapped <= hi, "{} not in {}..={}", snapped, lo, hi);
        let clamped = ClampSnap.snap(value, lo, hi);
        prop_assert!(lo <= clamped && clamped <= hi);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Bounds are reachable
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn bounds_are_reachable_by_push(
        (gap, values) in thumbs_strategy(),
        ranges in prop::collection::vec((0usize..6, -20i64..220, 0i64..120), 0..6),
        read_only in prop::collection::vec(0usize..6, 0..2),
    ) {
        let Some(mut control) = build(gap, &values) else {
            return Ok(());
        };
        for &(i, lo, len) in &ranges {
            let _ = control.set_constrained_allowed_range(i, lo, lo + len);
        }
        for &i in &read_only {
            let _ = control.set_constrained_editable(i, false);
        }
        let values = control.constrained_values();
        let bounds = control.all_constrained_bounds();
        for i in 0..values.len() {
            if control.is_constrained_editable(i) != Some(true) {
                continue;
            }
            for end in [bounds[i].min, bounds[i].max] {
                let resolved = resolve_unlocked_drag(
                    &values,
                    &bounds,
                    control.minimum_gap(),
                    &ClampSnap,
                    i,
                    end,
                );
                prop_assert_eq!(resolved[i], end);
                let mut probe = build(control.minimum_gap(), &values).unwrap();
                for (j, &v) in resolved.iter().enumerate() {
                    let allowed = control.constrained_allowed_range(j);
                    prop_assert!(allowed.contains(v), "thumb {} pushed to {} outside {:?}", j, v, allowed);
                    prop_assert!(bounds[j].contains(v), "thumb {} pushed to {} outside {:?}", j, v, bounds[j]);
                }
                prop_assert!(probe.set_constrained_values(&resolved).is_ok());
            }
        }
    }
}
