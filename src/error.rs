//! Error types for the lfukit library.
//!
//! ## Key Components
//!
//! - [`InvariantError`]: Returned by `check_invariants` when an engine or
//!   data structure finds its internal bookkeeping inconsistent.
//! - [`ConfigError`]: Returned when engine options are invalid (e.g. zero
//!   hands per clock).
//! - [`RangeOverlapError`]: Returned by [`RangeList::try_insert`] when the
//!   incoming range intersects a range already in the list.
//!
//! Capacity exhaustion is never an error here: engines report it by
//! returning `false` from `put`.
//!
//! ## Example Usage
//!
//! ```
//! use lfukit::builder::MultiClockOptions;
//! use lfukit::error::ConfigError;
//!
//! let bad = MultiClockOptions {
//!     hands_per_clock: 0,
//!     ..MultiClockOptions::default()
//! };
//! let err: ConfigError = bad.validate().unwrap_err();
//! assert!(err.to_string().contains("hands_per_clock"));
//! ```
//!
//! [`RangeList::try_insert`]: crate::ds::RangeList::try_insert

use std::fmt;

use crate::ds::range_list::Range;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal invariants are violated.
///
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when engine options are invalid.
///
/// Produced by `validate()` on the option structs in [`crate::builder`] and
/// by the `try_build_*` methods of [`CacheBuilder`](crate::builder::CacheBuilder).
/// The infallible constructors clamp out-of-range values instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// RangeOverlapError
// ---------------------------------------------------------------------------

/// Error returned when a range would overlap one already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeOverlapError {
    /// Range already present in the list.
    pub existing: Range,
    /// Range that was rejected.
    pub incoming: Range,
}

impl fmt::Display for RangeOverlapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "range {} overlaps existing range {}",
            self.incoming, self.existing
        )
    }
}

impl std::error::Error for RangeOverlapError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
