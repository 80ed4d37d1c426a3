// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change notification.

use crate::types::{ChangeSource, ValueRange};

/// Receives value and viewport changes from a [`MultiValueControl`].
///
/// Each logical operation produces at most one call per affected collection;
/// a bulk replacement is one call, not one per element. All methods default to
/// doing nothing, so implementors only override what they need.
///
/// Listeners that only care about final values can ignore calls whose source
/// is [`ChangeSource::DragOngoing`].
///
/// [`MultiValueControl`]: crate::MultiValueControl
pub trait MultiValueListener {
    /// The constrained thumb values changed.
    fn constrained_values_changed(&mut self, values: &[i64], source: ChangeSource) {
        let _ = (values, source);
    }

    /// The free thumb values changed.
    fn free_values_changed(&mut self, values: &[i64], source: ChangeSource) {
        let _ = (values, source);
    }

    /// The visible range changed.
    fn visible_range_changed(&mut self, visible: ValueRange, source: ChangeSource) {
        let _ = (visible, source);
    }
}

/// Handle returned by [`MultiValueControl::add_listener`], used to remove the
/// listener again.
///
/// [`MultiValueControl::add_listener`]: crate::MultiValueControl::add_listener
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);
