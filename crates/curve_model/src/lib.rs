//! Curve Model - Pure linear bonding-curve math for the launchpad engine
//!
//! The price of the next pricing unit is `a + b·k` once `k` units have been
//! sold; with a unit of one base unit this is `p(s) = a + b·s`. Everything
//! here is integer-only and total: no floats, no panics, every overflow is
//! reported as [`CurveError::Overflow`].
//!
//! The launchpad crate imports these functions directly; nothing in this
//! crate knows about ledgers, holders or migration.

#![no_std]
#![forbid(unsafe_code)]

pub mod math;

pub use math::{isqrt, Fill, LinearCurve, MAX_UNIT};

/// Error types for curve math
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveError {
    /// Base price and slope are both zero, or the pricing unit is out of range
    InvalidCurve,
    /// Invalid amount (zero)
    InvalidAmount,
    /// Range end lies below range start
    InvalidRange,
    /// Selling more than the curve has sold
    InsufficientSupply,
    /// Payment does not cover a single base unit
    PaymentTooSmall,
    /// Arithmetic overflow
    Overflow,
}
