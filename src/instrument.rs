//! One launched instrument: its ledger, its curve engine, and the commit
//! protocol that keeps the two in lockstep
//!
//! # Buy (two-phase)
//! 1. Plan the next curve state (pure)
//! 2. Check the slippage floor and that the ledger can take the mint
//! 3. If the plan crosses the threshold, call the migration target
//! 4. Only after every step above succeeded: mint, commit curve state,
//!    record the migration
//!
//! Nothing after step 3 can fail, so a refused migration leaves the
//! instrument exactly as it was.

use log::{info, warn};

use crate::curve::{CurveEngine, CurveState};
use crate::error::{LaunchpadError, Result};
use crate::ledger::Ledger;
use crate::migration::{MigrationRecord, MigrationRequest, MigrationTarget};
use crate::{Address, InstrumentId};

/// Result of a committed buy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyReceipt {
    pub instrument: InstrumentId,
    pub buyer: Address,
    pub payment: u128,
    pub tokens_minted: u128,
    /// Exact curve cost of the minted units
    pub cost: u128,
    /// Remainder returned to the buyer (Refund policy only)
    pub refunded: u128,
    /// Remainder kept by the curve (Retain policy only)
    pub retained: u128,
    /// Present when this buy migrated the curve
    pub migration: Option<MigrationRecord>,
}

/// Result of a committed sell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellReceipt {
    pub instrument: InstrumentId,
    pub seller: Address,
    pub tokens_burned: u128,
    pub refund: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    id: InstrumentId,
    name: String,
    symbol: String,
    creator: Address,
    created_seq: u64,
    ledger: Ledger,
    curve: CurveEngine,
    migration: Option<MigrationRecord>,
}

impl Instrument {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: InstrumentId,
        name: String,
        symbol: String,
        creator: Address,
        created_seq: u64,
        ledger: Ledger,
        curve: CurveEngine,
        migration: Option<MigrationRecord>,
    ) -> Self {
        Self {
            id,
            name,
            symbol,
            creator,
            created_seq,
            ledger,
            curve,
            migration,
        }
    }

    pub fn id(&self) -> InstrumentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn creator(&self) -> &Address {
        &self.creator
    }

    /// Sequence number of the creation event
    pub fn created_seq(&self) -> u64 {
        self.created_seq
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn curve(&self) -> &CurveEngine {
        &self.curve
    }

    pub fn curve_state(&self) -> CurveState {
        self.curve.state()
    }

    pub fn migration(&self) -> Option<&MigrationRecord> {
        self.migration.as_ref()
    }

    // ========================================================================
    // Curve trades
    // ========================================================================

    pub(crate) fn buy<T: MigrationTarget + ?Sized>(
        &mut self,
        target: &mut T,
        buyer: &Address,
        payment: u128,
        min_tokens_out: u128,
    ) -> Result<BuyReceipt> {
        let plan = self.curve.plan_buy(payment)?;
        let quote = plan.quote;

        if quote.tokens < min_tokens_out {
            return Err(LaunchpadError::SlippageExceeded {
                received: quote.tokens,
                minimum: min_tokens_out,
            });
        }
        self.ledger.check_mint(quote.tokens)?;

        let migration = if quote.triggers_migration {
            let request = MigrationRequest {
                instrument: self.id,
                symbol: &self.symbol,
                capital: plan.next.capital_raised,
                tokens: plan.next.supply_sold,
            };
            let receipt = target.deposit(&request).map_err(|e| {
                warn!(
                    "instrument {} ({}): migration refused, buy discarded: {}",
                    self.id, self.symbol, e
                );
                LaunchpadError::MigrationTargetFailure(e.reason)
            })?;
            Some(MigrationRecord {
                instrument: self.id,
                triggered_by: buyer.clone(),
                capital_raised: plan.next.capital_raised,
                supply_sold: plan.next.supply_sold,
                receipt,
            })
        } else {
            None
        };

        // Commit. check_mint passed, so mint cannot fail from here.
        self.ledger.mint(buyer, quote.tokens)?;
        self.curve.commit(plan.next);

        if let Some(record) = &migration {
            info!(
                "instrument {} ({}) migrated: capital={} supply={} pool={}",
                self.id, self.symbol, record.capital_raised, record.supply_sold, record.receipt.pool_id
            );
            self.migration = Some(record.clone());
        }

        Ok(BuyReceipt {
            instrument: self.id,
            buyer: buyer.clone(),
            payment,
            tokens_minted: quote.tokens,
            cost: quote.cost,
            refunded: quote.refunded,
            retained: quote.remainder - quote.refunded,
            migration,
        })
    }

    pub(crate) fn sell(&mut self, seller: &Address, amount: u128) -> Result<SellReceipt> {
        if self.curve.is_migrated() {
            return Err(LaunchpadError::CurveMigrated(self.id));
        }
        if amount == 0 {
            return Err(LaunchpadError::InvalidAmount);
        }
        let available = self.ledger.balance_of(seller);
        if available < amount {
            return Err(LaunchpadError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        let plan = self.curve.plan_sell(amount)?;
        self.ledger.burn(seller, amount)?;
        self.curve.commit(plan.next);

        Ok(SellReceipt {
            instrument: self.id,
            seller: seller.clone(),
            tokens_burned: amount,
            refund: plan.refund,
        })
    }

    // ========================================================================
    // Holder operations
    // ========================================================================

    pub(crate) fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<()> {
        self.ledger.transfer(from, to, amount)
    }

    pub(crate) fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) {
        self.ledger.approve(owner, spender, amount)
    }

    pub(crate) fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<()> {
        self.ledger.transfer_from(spender, from, to, amount)
    }
}
