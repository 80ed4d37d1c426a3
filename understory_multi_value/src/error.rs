// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for control mutations.
//!
//! Failures come in two tiers. An [`ArgumentError`] means the caller broke a
//! basic precondition and nothing was looked at beyond the arguments. A
//! [`Rejection`] means the request was well formed but could not be satisfied
//! together with the current configuration. Either way the control is left
//! exactly as it was before the call.

/// A precondition on the arguments of a mutation was violated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    /// A range whose minimum must be strictly below its maximum was not.
    #[error("minimum {min} must be less than maximum {max}")]
    EmptyRange {
        /// Requested minimum.
        min: i64,
        /// Requested maximum.
        max: i64,
    },
    /// A range whose minimum must not exceed its maximum did.
    #[error("minimum {min} must not be greater than maximum {max}")]
    InvertedRange {
        /// Requested minimum.
        min: i64,
        /// Requested maximum.
        max: i64,
    },
    /// An index did not refer to an existing element.
    #[error("index {index} out of bounds for {len} elements")]
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Number of elements in the collection.
        len: usize,
    },
    /// A value lay outside the domain.
    #[error("value {value} outside allowable range {min}..={max}")]
    OutOfRange {
        /// Offending value.
        value: i64,
        /// Domain minimum.
        min: i64,
        /// Domain maximum.
        max: i64,
    },
    /// A list that must be non-decreasing was not.
    #[error("values must be in non-decreasing order (violated at index {index})")]
    NotAscending {
        /// Index of the first value smaller than its predecessor.
        index: usize,
    },
    /// A negative minimum gap was requested.
    #[error("minimum gap must be 0 or greater, got {0}")]
    NegativeGap(i64),
}

/// A well-formed request that cannot be satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The bounds pass produced `min > max` for the given thumb, or bounds
    /// that exclude its current value.
    #[error("constrained thumb {index} would have no consistent bounds")]
    InfeasibleBounds {
        /// First thumb with contradictory bounds.
        index: usize,
    },
    /// The value would sit closer to a neighbor than the minimum gap allows.
    #[error("constrained thumb {index} would violate the minimum gap")]
    GapViolation {
        /// Thumb whose spacing would be violated.
        index: usize,
    },
    /// The value lies outside the thumb's individual allowed range.
    #[error("constrained thumb {index} would leave its allowed range")]
    OutsideAllowedRange {
        /// Offending thumb.
        index: usize,
    },
    /// A constrained mark would break the non-decreasing order.
    #[error("constrained mark {index} would break ordering")]
    OrderViolation {
        /// Offending mark.
        index: usize,
    },
    /// The minimum gap cannot fit the current thumbs into the domain.
    #[error("minimum gap {gap} exceeds the largest fitting gap {limit}")]
    GapTooLarge {
        /// Requested gap.
        gap: i64,
        /// Largest gap accepted for the current thumb count and domain.
        limit: i64,
    },
}

/// Failure of a control mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Invalid argument; see [`ArgumentError`].
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    /// Infeasible request; see [`Rejection`].
    #[error(transparent)]
    Rejected(#[from] Rejection),
}

impl Error {
    /// Returns `true` if the request was well formed but infeasible.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Returns the rejection, if this is one.
    #[must_use]
    pub const fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Rejected(r) => Some(*r),
            Self::Argument(_) => None,
        }
    }
}
