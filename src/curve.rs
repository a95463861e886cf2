//! Curve engine: price discovery and the Active -> Migrated transition for
//! exactly one instrument
//!
//! The engine only plans. `plan_buy` / `plan_sell` compute the complete next
//! state without touching anything; [`crate::Instrument`] commits the plan
//! after the ledger and (when migrating) the migration target have agreed.

use curve_model::LinearCurve;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{LaunchpadConfig, RemainderPolicy};
use crate::error::{LaunchpadError, Result};
use crate::InstrumentId;

/// Lifecycle of a curve. `Migrated` has no outgoing edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurvePhase {
    Active,
    Migrated,
}

/// Per-instrument curve state (read-only copy for callers)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveState {
    /// Base units minted through the curve; equals ledger total supply
    pub supply_sold: u128,
    /// Net capital held: Σ retained payments - Σ sell payouts
    pub capital_raised: u128,
    /// Portion of `capital_raised` that is unspent buy remainder
    /// (always `capital_raised == cost(0, supply_sold) + retained_remainder`)
    pub retained_remainder: u128,
    /// Permanently true once the threshold has been crossed
    pub migrated: bool,
}

impl CurveState {
    pub fn phase(&self) -> CurvePhase {
        if self.migrated {
            CurvePhase::Migrated
        } else {
            CurvePhase::Active
        }
    }
}

/// Preview of a buy for a given payment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuyQuote {
    pub payment: u128,
    /// Base units the payment buys
    pub tokens: u128,
    /// Exact curve cost of those units
    pub cost: u128,
    /// `payment - cost`
    pub remainder: u128,
    /// Remainder handed back to the buyer (Refund policy)
    pub refunded: u128,
    /// Capital the curve will hold afterwards
    pub capital_after: u128,
    /// Whether this buy crosses the migration threshold
    pub triggers_migration: bool,
}

/// Complete next state of a buy, not yet applied
#[derive(Debug, Clone, Copy)]
pub(crate) struct BuyPlan {
    pub quote: BuyQuote,
    pub next: CurveState,
}

/// Complete next state of a sell, not yet applied
#[derive(Debug, Clone, Copy)]
pub(crate) struct SellPlan {
    pub refund: u128,
    pub next: CurveState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveEngine {
    instrument: InstrumentId,
    curve: LinearCurve,
    threshold: u128,
    policy: RemainderPolicy,
    state: CurveState,
}

impl CurveEngine {
    pub fn new(instrument: InstrumentId, config: &LaunchpadConfig) -> Self {
        Self::restore(instrument, config, CurveState::default())
    }

    pub(crate) fn restore(
        instrument: InstrumentId,
        config: &LaunchpadConfig,
        state: CurveState,
    ) -> Self {
        Self {
            instrument,
            curve: config.curve.curve(),
            threshold: config.migration_threshold,
            policy: config.remainder_policy,
            state,
        }
    }

    pub fn state(&self) -> CurveState {
        self.state
    }

    pub fn phase(&self) -> CurvePhase {
        self.state.phase()
    }

    pub fn is_migrated(&self) -> bool {
        self.state.migrated
    }

    pub fn threshold(&self) -> u128 {
        self.threshold
    }

    pub fn curve(&self) -> LinearCurve {
        self.curve
    }

    /// Capital still held by the curve. Zero after migration: everything was
    /// handed to the migration target.
    pub fn held_reserve(&self) -> u128 {
        if self.state.migrated {
            0
        } else {
            self.state.capital_raised
        }
    }

    // ========================================================================
    // Quotes (pure)
    // ========================================================================

    /// Price of the pricing unit the next base unit falls in
    pub fn spot_price(&self) -> Result<u128> {
        self.curve
            .price_at(self.state.supply_sold)
            .map_err(|e| LaunchpadError::from_curve(e, 0, self.state.supply_sold))
    }

    /// Cost of buying exactly `amount` base units at the current supply
    pub fn quote_buy(&self, amount: u128) -> Result<u128> {
        let supply = self.state.supply_sold;
        self.curve
            .quote_buy(supply, amount)
            .map_err(|e| LaunchpadError::from_curve(e, amount, supply))
    }

    /// Payout for selling `amount` base units at the current supply
    pub fn quote_sell(&self, amount: u128) -> Result<u128> {
        let supply = self.state.supply_sold;
        self.curve
            .quote_sell(supply, amount)
            .map_err(|e| LaunchpadError::from_curve(e, amount, supply))
    }

    /// Full preview of `buy(payment)`
    pub fn quote_payment(&self, payment: u128) -> Result<BuyQuote> {
        self.plan_buy(payment).map(|plan| plan.quote)
    }

    // ========================================================================
    // Planning
    // ========================================================================

    fn ensure_active(&self) -> Result<()> {
        if self.state.migrated {
            return Err(LaunchpadError::CurveMigrated(self.instrument));
        }
        Ok(())
    }

    pub(crate) fn plan_buy(&self, payment: u128) -> Result<BuyPlan> {
        self.ensure_active()?;
        let supply = self.state.supply_sold;
        let fill = self
            .curve
            .fill_for_payment(supply, payment)
            .map_err(|e| LaunchpadError::from_curve(e, payment, supply))?;

        let (taken, refunded, retained) = match self.policy {
            RemainderPolicy::Retain => (payment, 0, fill.remainder),
            RemainderPolicy::Refund => (fill.cost, fill.remainder, 0),
        };

        let capital_after = self
            .state
            .capital_raised
            .checked_add(taken)
            .ok_or(LaunchpadError::Overflow)?;
        let triggers_migration = capital_after >= self.threshold;

        let next = CurveState {
            supply_sold: supply + fill.tokens,
            capital_raised: capital_after,
            retained_remainder: self
                .state
                .retained_remainder
                .checked_add(retained)
                .ok_or(LaunchpadError::Overflow)?,
            migrated: triggers_migration,
        };

        debug!(
            "instrument {} buy plan: payment={} tokens={} cost={} remainder={} migrate={}",
            self.instrument, payment, fill.tokens, fill.cost, fill.remainder, triggers_migration
        );

        Ok(BuyPlan {
            quote: BuyQuote {
                payment,
                tokens: fill.tokens,
                cost: fill.cost,
                remainder: fill.remainder,
                refunded,
                capital_after,
                triggers_migration,
            },
            next,
        })
    }

    pub(crate) fn plan_sell(&self, amount: u128) -> Result<SellPlan> {
        self.ensure_active()?;
        let refund = self.quote_sell(amount)?;

        // cost(0, s) is monotone, so the payout never exceeds the integral part
        // of capital_raised; the retained remainder is never paid out
        let capital_after = self
            .state
            .capital_raised
            .checked_sub(refund)
            .ok_or(LaunchpadError::Overflow)?;

        let next = CurveState {
            supply_sold: self.state.supply_sold - amount,
            capital_raised: capital_after,
            ..self.state
        };

        debug!(
            "instrument {} sell plan: tokens={} refund={}",
            self.instrument, amount, refund
        );

        Ok(SellPlan { refund, next })
    }

    pub(crate) fn commit(&mut self, next: CurveState) {
        debug_assert!(!self.state.migrated || next == self.state);
        self.state = next;
    }
}
