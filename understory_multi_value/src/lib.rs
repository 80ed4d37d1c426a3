// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_multi_value --heading-base-level=0

//! Understory Multi Value: headless model for multi-value linear controls.
//!
//! A multi-value linear control is a slider with several thumbs at once. This
//! crate models its state and rules without drawing anything:
//! - Constrained thumbs: ordered values that keep a minimum gap between
//!   neighbors, optionally limited to individual allowed ranges, and either
//!   pushed apart or moved together while dragging.
//! - Free thumbs: independent values limited only by the domain.
//! - Marks: static reference values with optional colors.
//! - A visible range (viewport) and a client area for pixel projection.
//!
//! Every mutation either succeeds with all invariants intact or fails with the
//! control unchanged. Failures are split into argument errors ([`ArgumentError`])
//! and rejections of well-formed but infeasible requests ([`Rejection`]).
//!
//! Callers are expected to:
//! - Render from [`MultiValueControl::snapshot`] using a [`CoordinateMapper`].
//! - Hit-test thumbs themselves and feed pointer events to a
//!   [`DragCoordinator`].
//! - Observe changes through [`MultiValueListener`] or by polling
//!   [`MultiValueControl::revision`].
//!
//! ## Minimal example
//!
//! ```rust
//! use understory_multi_value::{
//!     ChangeSource, DragCoordinator, MultiValueControl, ThumbSpecifier, ValueRange,
//! };
//!
//! let mut control = MultiValueControl::new(0, 100).unwrap();
//! control.set_minimum_gap(5).unwrap();
//! control.set_constrained_values(&[10, 50, 90]).unwrap();
//!
//! // Each thumb leaves room for its neighbors.
//! assert_eq!(control.constrained_bounds(0), Some(ValueRange::new(0, 90)));
//!
//! // Dragging the middle thumb to 92 pushes the last one along.
//! let mut drag = DragCoordinator::default();
//! drag.pointer_down(&mut control, Some(ThumbSpecifier::constrained(1)), kurbo::Point::ZERO);
//! drag.drag_to_value(&mut control, 92, ChangeSource::DragOngoing);
//! assert_eq!(control.constrained_values(), [10, 92, 97]);
//! ```
//!
//! ## Snapping
//!
//! A [`SnapCalculator`] quantizes values during bounds computation and drags.
//! The default [`ClampSnap`] only clamps; [`StepSnap`] rounds to multiples of a
//! step, and any `Fn(i64, i64, i64) -> i64` closure works too.
//!
//! ## Features
//!
//! - `std` (default): forwards to `kurbo/std` and `peniko/std`.
//! - `tracing`: emit `tracing` events for rejected mutations, domain
//!   corrections and drag commits.
//!
//! This crate is `no_std` compatible (with `alloc`).

#![no_std]

extern crate alloc;

mod bounds;
mod control;
mod drag;
mod error;
mod listener;
mod mapper;
mod snap;
mod types;
mod values;

pub use bounds::{BoundsInput, InfeasibleBounds, OverrideMap, ThumbBounds, compute_bounds};
pub use control::{DEFAULT_VISIBLE_OFFSET, MultiValueControl, RenderSnapshot};
pub use drag::{DragCoordinator, DragTarget, resolve_locked_drag, resolve_unlocked_drag};
pub use error::{ArgumentError, Error, Rejection};
pub use listener::{ListenerId, MultiValueListener};
pub use mapper::CoordinateMapper;
pub use snap::{ClampSnap, SnapCalculator, StepSnap};
pub use types::{ChangeSource, ResizeBehavior, ThumbKind, ThumbSpecifier, ValueRange};
