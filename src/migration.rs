//! Migration target seam and a simulated liquidity venue
//!
//! The curve engine hands its reserves to a [`MigrationTarget`] exactly once,
//! inside the buy that crosses the threshold. The target is the only external
//! call in the engine and it may refuse; a refusal discards the whole buy.

use curve_model::isqrt;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{Address, InstrumentId};

/// What the curve hands over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationRequest<'a> {
    pub instrument: InstrumentId,
    pub symbol: &'a str,
    /// All of `capital_raised` at migration time
    pub capital: u128,
    /// `supply_sold` snapshot at migration time
    pub tokens: u128,
}

/// Proof of deposit returned by the venue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityReceipt {
    pub pool_id: u64,
    pub liquidity: u128,
    pub capital: u128,
    pub tokens: u128,
}

/// Venue refused the handoff
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct MigrationRejected {
    pub reason: String,
}

impl MigrationRejected {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Trait for pluggable liquidity venues
///
/// # Contract
/// * Accept the deposited capital and supply snapshot, return a receipt
/// * Or refuse with [`MigrationRejected`]; the engine then aborts the
///   triggering buy and applies nothing
///
/// A venue that returns `Ok` must have taken custody: the engine marks the
/// curve migrated and never calls the venue for that instrument again.
pub trait MigrationTarget {
    fn deposit(&mut self, request: &MigrationRequest<'_>)
        -> Result<LiquidityReceipt, MigrationRejected>;
}

impl<T: MigrationTarget + ?Sized> MigrationTarget for &mut T {
    fn deposit(
        &mut self,
        request: &MigrationRequest<'_>,
    ) -> Result<LiquidityReceipt, MigrationRejected> {
        (**self).deposit(request)
    }
}

/// Emitted once per instrument when the curve migrates. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub instrument: InstrumentId,
    /// Buyer whose purchase crossed the threshold
    pub triggered_by: Address,
    /// Final capital handed to the venue
    pub capital_raised: u128,
    /// Final supply snapshot handed to the venue
    pub supply_sold: u128,
    pub receipt: LiquidityReceipt,
}

// ============================================================================
// Simulated constant-product venue
// ============================================================================

/// One seeded pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolPosition {
    pub pool_id: u64,
    pub instrument: InstrumentId,
    pub symbol: String,
    pub capital_reserve: u128,
    pub token_reserve: u128,
    pub liquidity: u128,
}

/// In-process stand-in for an AMM factory
///
/// Seeds one x·y=k pool per migrated instrument and mints liquidity equal to
/// the geometric mean of the two reserves. Refuses empty deposits, a second
/// deposit for the same instrument, deposits above the optional capital cap,
/// and everything while `reject_all` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedPool {
    positions: Vec<PoolPosition>,
    #[serde(default)]
    max_capital: Option<u128>,
    #[serde(default)]
    reject_all: bool,
}

impl SimulatedPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capital_cap(max_capital: u128) -> Self {
        Self {
            max_capital: Some(max_capital),
            ..Self::default()
        }
    }

    pub fn set_reject_all(&mut self, reject: bool) {
        self.reject_all = reject;
    }

    pub fn positions(&self) -> &[PoolPosition] {
        &self.positions
    }

    pub fn position_for(&self, instrument: InstrumentId) -> Option<&PoolPosition> {
        self.positions.iter().find(|p| p.instrument == instrument)
    }

    /// Geometric mean of the reserves; past u128 the roots are multiplied
    /// separately, which can only round down
    fn initial_liquidity(capital: u128, tokens: u128) -> u128 {
        match capital.checked_mul(tokens) {
            Some(product) => isqrt(product),
            None => isqrt(capital).saturating_mul(isqrt(tokens)),
        }
    }
}

impl MigrationTarget for SimulatedPool {
    fn deposit(
        &mut self,
        request: &MigrationRequest<'_>,
    ) -> Result<LiquidityReceipt, MigrationRejected> {
        if self.reject_all {
            return Err(MigrationRejected::new("venue is not accepting deposits"));
        }
        if request.capital == 0 || request.tokens == 0 {
            return Err(MigrationRejected::new("cannot seed a pool with an empty reserve"));
        }
        if let Some(cap) = self.max_capital {
            if request.capital > cap {
                return Err(MigrationRejected::new(format!(
                    "deposit of {} exceeds venue cap {}",
                    request.capital, cap
                )));
            }
        }
        if self.position_for(request.instrument).is_some() {
            return Err(MigrationRejected::new(format!(
                "pool for instrument {} already exists",
                request.instrument
            )));
        }

        let pool_id = self.positions.len() as u64;
        let liquidity = Self::initial_liquidity(request.capital, request.tokens);
        self.positions.push(PoolPosition {
            pool_id,
            instrument: request.instrument,
            symbol: request.symbol.to_string(),
            capital_reserve: request.capital,
            token_reserve: request.tokens,
            liquidity,
        });

        info!(
            "seeded pool {} for {} ({}): capital={} tokens={} liquidity={}",
            pool_id, request.instrument, request.symbol, request.capital, request.tokens, liquidity
        );

        Ok(LiquidityReceipt {
            pool_id,
            liquidity,
            capital: request.capital,
            tokens: request.tokens,
        })
    }
}
