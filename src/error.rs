//! Engine error types

use crate::InstrumentId;
use curve_model::CurveError;

/// Every failure the engine can report
///
/// All errors are local and synchronous. None of them leaves partial effects
/// behind, so a caller may retry with corrected input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LaunchpadError {
    /// Zero quantity requested
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// Payment too small to buy a single base unit
    #[error("payment of {payment} does not cover a single base unit")]
    InsufficientPayment { payment: u128 },

    /// Sell or transfer exceeds holdings
    #[error("insufficient balance: {available} available, {requested} requested")]
    InsufficientBalance { available: u128, requested: u128 },

    /// `transfer_from` exceeds the approved allowance
    #[error("insufficient allowance: {available} approved, {requested} requested")]
    InsufficientAllowance { available: u128, requested: u128 },

    /// Quote asks to sell back more than the curve has sold
    #[error("curve has sold {supply} base units, cannot price a sale of {requested}")]
    InsufficientSupply { supply: u128, requested: u128 },

    /// Buy or sell attempted after the terminal state
    #[error("curve for instrument {0} has migrated")]
    CurveMigrated(InstrumentId),

    /// Registry conflict
    #[error("symbol {0} is already registered")]
    DuplicateSymbol(String),

    /// External handoff rejected; the triggering buy was discarded
    #[error("migration target rejected handoff: {0}")]
    MigrationTargetFailure(String),

    /// No instrument behind this id
    #[error("unknown instrument {0}")]
    UnknownInstrument(InstrumentId),

    /// Buy filled fewer tokens than the caller's floor
    #[error("slippage: {received} base units below the minimum of {minimum}")]
    SlippageExceeded { received: u128, minimum: u128 },

    /// Name or symbol rejected at creation
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Configuration rejected at construction
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Arithmetic overflow
    #[error("arithmetic overflow")]
    Overflow,

    /// Persisted snapshot fails an integrity check
    #[error("corrupt state: {0}")]
    CorruptState(String),
}

pub type Result<T> = core::result::Result<T, LaunchpadError>;

impl LaunchpadError {
    /// Translate a curve math failure, given the amount the caller asked for
    /// and the supply it was priced against
    pub(crate) fn from_curve(err: CurveError, requested: u128, supply: u128) -> Self {
        match err {
            CurveError::InvalidAmount => Self::InvalidAmount,
            CurveError::PaymentTooSmall => Self::InsufficientPayment { payment: requested },
            CurveError::InsufficientSupply => Self::InsufficientSupply { supply, requested },
            CurveError::InvalidCurve => {
                Self::InvalidConfig(
                    "base price and slope cannot both be zero, and the price unit must be 1..=2^64"
                        .into(),
                )
            }
            CurveError::InvalidRange | CurveError::Overflow => Self::Overflow,
        }
    }
}
