// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_multi_value`.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect};

use understory_multi_value::{
    BoundsInput, ClampSnap, DragCoordinator, MultiValueControl, OverrideMap,
    StepSnap, ThumbSpecifier, ValueRange, compute_bounds, resolve_locked_drag,
    resolve_unlocked_drag,
};

const DOMAIN_MAX: i64 = 1_000_000;
const GAP: i64 = 10;

/// `n` thumbs evenly spread over the domain.
fn spread(n: usize) -> Vec<i64> {
    let n = n as i64;
    (0..n).map(|i| i * (DOMAIN_MAX / n)).collect()
}

/// Every other thumb gets a narrow allowed range around its value.
fn sparse_overrides(values: &[i64]) -> OverrideMap {
    values
        .iter()
        .enumerate()
        .step_by(2)
        .map(|(i, &v)| (i, ValueRange::new((v - 50).max(0), v + 50)))
        .collect()
}

fn bench_bounds(c: &mut Criterion) {
    let domain = ValueRange::new(0, DOMAIN_MAX);
    let mut group = c.benchmark_group("multi_value/bounds");

    for &n in &[4_usize, 32, 256, 2048] {
        let values = spread(n);
        let editable = vec![true; n];
        let empty = OverrideMap::new();
        let overrides = sparse_overrides(&values);
        let step = StepSnap::new(7);

        group.bench_function(BenchmarkId::new("clamp", n), |b| {
            let input = BoundsInput {
                values: &values,
                editable: &editable,
                overrides: &empty,
                domain,
                minimum_gap: GAP,
                locked: false,
                snap: &ClampSnap,
            };
            b.iter(|| black_box(compute_bounds(black_box(&input))))
        });

        group.bench_function(BenchmarkId::new("overrides_step", n), |b| {
            let input = BoundsInput {
                values: &values,
                editable: &editable,
                overrides: &overrides,
                domain,
                minimum_gap: GAP,
                locked: false,
                snap: &step,
            };
            b.iter(|| black_box(compute_bounds(black_box(&input))))
        });

        group.bench_function(BenchmarkId::new("locked", n), |b| {
            let input = BoundsInput {
                values: &values,
                editable: &editable,
                overrides: &empty,
                domain,
                minimum_gap: GAP,
                locked: true,
                snap: &ClampSnap,
            };
            b.iter(|| black_box(compute_bounds(black_box(&input))))
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let domain = ValueRange::new(0, DOMAIN_MAX);
    let mut group = c.benchmark_group("multi_value/resolve");

    for &n in &[4_usize, 32, 256, 2048] {
        // Packed at the minimum gap so a drag of the first thumb pushes all of them.
        let packed: Vec<i64> = (0..n as i64).map(|i| i * GAP).collect();
        let editable = vec![true; n];
        let overrides = OverrideMap::new();
        let bounds = compute_bounds(&BoundsInput {
            values: &packed,
            editable: &editable,
            overrides: &overrides,
            domain,
            minimum_gap: GAP,
            locked: false,
            snap: &ClampSnap,
        })
        .unwrap();
        let target = bounds[0].max;

        group.bench_function(BenchmarkId::new("push_all", n), |b| {
            b.iter(|| {
                black_box(resolve_unlocked_drag(
                    black_box(&packed),
                    &bounds,
                    GAP,
                    &ClampSnap,
                    0,
                    target,
                ))
            })
        });

        let locked_bounds = compute_bounds(&BoundsInput {
            values: &packed,
            editable: &editable,
            overrides: &overrides,
            domain,
            minimum_gap: GAP,
            locked: true,
            snap: &ClampSnap,
        })
        .unwrap();

        group.bench_function(BenchmarkId::new("locked", n), |b| {
            b.iter(|| {
                black_box(resolve_locked_drag(
                    black_box(&packed),
                    &locked_bounds,
                    domain,
                    &ClampSnap,
                    n / 2,
                    DOMAIN_MAX,
                ))
            })
        });
    }

    group.finish();
}

fn control_with(values: &[i64]) -> MultiValueControl {
    let mut control = MultiValueControl::new(0, DOMAIN_MAX).unwrap();
    control.set_minimum_gap(GAP).unwrap();
    control.set_constrained_values(values).unwrap();
    control.set_client_area(Rect::new(0.0, 0.0, 1000.0, 20.0));
    control
}

fn bench_control(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_value/control");

    for &n in &[4_usize, 256] {
        let values = spread(n);
        let mid = n / 2;

        group.bench_function(BenchmarkId::new("set_value", n), |b| {
            b.iter_batched(
                || control_with(&values),
                |mut control| {
                    let _ = control.set_constrained_value(mid, values[mid] + 1);
                    black_box(control);
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(BenchmarkId::new("drag_sweep", n), |b| {
            b.iter_batched(
                || control_with(&values),
                |mut control| {
                    let mut drag = DragCoordinator::default();
                    drag.pointer_down(
                        &mut control,
                        Some(ThumbSpecifier::constrained(mid)),
                        Point::ZERO,
                    );
                    for x in 0..100 {
                        drag.pointer_move(&mut control, Point::new(f64::from(x) * 10.0, 10.0));
                    }
                    drag.pointer_up(&mut control, Point::new(1000.0, 10.0));
                    black_box(control);
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(BenchmarkId::new("snapshot", n), |b| {
            let control = control_with(&values);
            b.iter(|| black_box(control.snapshot()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_bounds, bench_resolve, bench_control);
criterion_main!(benches);
