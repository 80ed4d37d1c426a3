// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Point, Rect};

use crate::types::ValueRange;

/// Linear conversion between control values and pixel X coordinates.
///
/// A `CoordinateMapper` is a snapshot of the visible range and the client
/// area; it holds no reference to the control and goes stale when either
/// changes. Obtain a fresh one from [`MultiValueControl::coordinate_mapper`]
/// after resizes or viewport changes.
///
/// The lower visible value maps to the left edge of the client area
/// (`client.x0`) and the upper visible value to its last pixel column
/// (`client.x0 + width - 1`). Pixel results are whole numbers.
///
/// [`MultiValueControl::coordinate_mapper`]: crate::MultiValueControl::coordinate_mapper
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateMapper {
    visible: ValueRange,
    left: f64,
    width: f64,
}

impl CoordinateMapper {
    /// Creates a mapper for `visible` values spread over `client`.
    ///
    /// `visible.min` must be below `visible.max`.
    #[must_use]
    pub fn new(visible: ValueRange, client: Rect) -> Self {
        Self {
            visible,
            left: client.x0,
            width: libm::round(client.width()).max(0.0),
        }
    }

    /// Returns the visible range this mapper projects.
    #[must_use]
    pub fn visible_range(&self) -> ValueRange {
        self.visible
    }

    /// Returns the left inset in pixels.
    #[must_use]
    pub fn left_inset(&self) -> f64 {
        self.left
    }

    /// Returns the client width in pixels.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    fn visible_span(&self) -> f64 {
        to_f64(self.visible.span())
    }

    /// Maps a value to an X coordinate.
    ///
    /// Values outside the visible range map outside the client area. A zero
    /// width client area maps everything to `0`.
    #[must_use]
    pub fn value_to_pixel(&self, value: i64) -> f64 {
        if self.width == 0.0 || self.visible_span() <= 0.0 {
            return 0.0;
        }
        let offset = to_f64(i128::from(value) - i128::from(self.visible.min));
        libm::round(offset * (self.width - 1.0) / self.visible_span()) + self.left
    }

    /// Maps an X coordinate to a value.
    ///
    /// With `must_be_visible` the coordinate is first clamped to the client
    /// area, so pointer excursions past either edge map to the corresponding
    /// boundary value instead of extrapolating.
    #[must_use]
    pub fn pixel_to_value(&self, x: f64, must_be_visible: bool) -> i64 {
        if self.width <= 1.0 {
            return self.visible.min;
        }
        let mut x = x;
        if must_be_visible {
            x = x.clamp(self.left, self.left + self.width - 1.0);
        }
        let offset = libm::round((x - self.left) * self.visible_span() / (self.width - 1.0));
        saturating_add_f64(self.visible.min, offset)
    }

    /// Convenience wrapper over [`pixel_to_value`](Self::pixel_to_value)
    /// using only the point's X coordinate.
    #[must_use]
    pub fn point_to_value(&self, point: Point, must_be_visible: bool) -> i64 {
        self.pixel_to_value(point.x, must_be_visible)
    }

    /// Converts a pixel width into a value delta.
    #[must_use]
    pub fn pixel_width_to_value_delta(&self, width: f64) -> i64 {
        if self.width == 0.0 {
            return 0;
        }
        saturating_add_f64(0, libm::round(width * self.visible_span() / self.width))
    }

    /// Converts a value delta into a pixel width.
    #[must_use]
    pub fn value_delta_to_pixel_width(&self, delta: i64) -> f64 {
        if self.visible_span() <= 0.0 {
            return 0.0;
        }
        libm::round(to_f64(i128::from(delta)) * self.width / self.visible_span())
    }
}

fn to_f64(value: i128) -> f64 {
    value as f64
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "float to int casts saturate and the offset is already rounded"
)]
fn saturating_add_f64(base: i64, offset: f64) -> i64 {
    base.saturating_add(offset as i64)
}
