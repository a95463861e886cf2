//! Instrument registry (factory) and the façade every external caller uses
//!
//! Instruments live in an owned arena indexed by [`InstrumentId`]; a symbol
//! index sits next to it. There is no global state: two `Launchpad` values are
//! two independent worlds.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::config::{LaunchpadConfig, SymbolPolicy, MAX_NAME_LEN, MAX_SYMBOL_LEN};
use crate::curve::{BuyQuote, CurveEngine, CurveState};
use crate::error::{LaunchpadError, Result};
use crate::events::{EventLog, EventRecord, LaunchEvent};
use crate::instrument::{BuyReceipt, Instrument, SellReceipt};
use crate::ledger::Ledger;
use crate::migration::{MigrationRecord, MigrationTarget};
use crate::{Address, InstrumentId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launchpad {
    config: LaunchpadConfig,
    instruments: Vec<Instrument>,
    /// Normalised symbol -> first instrument registered under it
    symbols: BTreeMap<String, InstrumentId>,
    events: EventLog,
}

/// Symbols compare case-insensitively and ignore surrounding whitespace
pub(crate) fn symbol_key(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

pub(crate) fn validate_metadata(name: &str, symbol: &str) -> Result<()> {
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(LaunchpadError::InvalidMetadata(format!(
            "name must be 1..={} characters",
            MAX_NAME_LEN
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(LaunchpadError::InvalidMetadata(
            "name contains control characters".into(),
        ));
    }
    if symbol.is_empty() || symbol.chars().count() > MAX_SYMBOL_LEN {
        return Err(LaunchpadError::InvalidMetadata(format!(
            "symbol must be 1..={} characters",
            MAX_SYMBOL_LEN
        )));
    }
    if !symbol.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
        return Err(LaunchpadError::InvalidMetadata(format!(
            "symbol {:?} may only contain letters, digits, '-' and '_'",
            symbol
        )));
    }
    Ok(())
}

impl Launchpad {
    pub fn new(config: LaunchpadConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            instruments: Vec::new(),
            symbols: BTreeMap::new(),
            events: EventLog::new(),
        })
    }

    /// Assemble from already-validated parts (see `state.rs`)
    pub(crate) fn from_parts(
        config: LaunchpadConfig,
        instruments: Vec<Instrument>,
        events: EventLog,
    ) -> Self {
        let mut symbols = BTreeMap::new();
        for inst in &instruments {
            symbols.entry(symbol_key(inst.symbol())).or_insert(inst.id());
        }
        Self {
            config,
            instruments,
            symbols,
            events,
        }
    }

    pub fn config(&self) -> &LaunchpadConfig {
        &self.config
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Launch a new instrument: fresh ledger, fresh curve in `Active`
    ///
    /// # Errors
    /// * `InvalidMetadata` - empty/oversized name or symbol
    /// * `DuplicateSymbol` - symbol taken under `SymbolPolicy::Unique`
    pub fn create(&mut self, creator: &Address, name: &str, symbol: &str) -> Result<InstrumentId> {
        let name = name.trim();
        let symbol = symbol.trim();
        validate_metadata(name, symbol)?;

        let key = symbol_key(symbol);
        if self.config.symbol_policy == SymbolPolicy::Unique && self.symbols.contains_key(&key) {
            return Err(LaunchpadError::DuplicateSymbol(symbol.to_string()));
        }

        let index = u32::try_from(self.instruments.len()).map_err(|_| LaunchpadError::Overflow)?;
        let id = InstrumentId::new(index);

        let created_seq = self.events.push(LaunchEvent::InstrumentCreated {
            instrument: id,
            name: name.to_string(),
            symbol: symbol.to_string(),
            creator: creator.clone(),
        });
        self.instruments.push(Instrument::new(
            id,
            name.to_string(),
            symbol.to_string(),
            creator.clone(),
            created_seq,
            Ledger::new(name, symbol, self.config.token_decimals),
            CurveEngine::new(id, &self.config),
            None,
        ));
        self.symbols.entry(key).or_insert(id);

        info!("created instrument {} {} ({}) for {}", id, symbol, name, creator);
        Ok(id)
    }

    /// Every instrument id in creation order
    pub fn list(&self) -> Vec<InstrumentId> {
        self.instruments.iter().map(Instrument::id).collect()
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    pub fn instrument(&self, id: InstrumentId) -> Result<&Instrument> {
        self.instruments
            .get(id.index())
            .ok_or(LaunchpadError::UnknownInstrument(id))
    }

    fn instrument_mut(&mut self, id: InstrumentId) -> Result<&mut Instrument> {
        self.instruments
            .get_mut(id.index())
            .ok_or(LaunchpadError::UnknownInstrument(id))
    }

    /// First instrument registered under `symbol` (case-insensitive)
    pub fn find_by_symbol(&self, symbol: &str) -> Option<InstrumentId> {
        self.symbols.get(&symbol_key(symbol)).copied()
    }

    pub fn get_curve_state(&self, id: InstrumentId) -> Result<CurveState> {
        self.instrument(id).map(Instrument::curve_state)
    }

    pub fn is_migrated(&self, id: InstrumentId) -> Result<bool> {
        self.get_curve_state(id).map(|s| s.migrated)
    }

    pub fn migration_record(&self, id: InstrumentId) -> Result<Option<&MigrationRecord>> {
        self.instrument(id).map(Instrument::migration)
    }

    // ========================================================================
    // Quotes
    // ========================================================================

    pub fn quote_buy(&self, id: InstrumentId, amount: u128) -> Result<u128> {
        self.instrument(id)?.curve().quote_buy(amount)
    }

    pub fn quote_sell(&self, id: InstrumentId, amount: u128) -> Result<u128> {
        self.instrument(id)?.curve().quote_sell(amount)
    }

    pub fn quote_payment(&self, id: InstrumentId, payment: u128) -> Result<BuyQuote> {
        self.instrument(id)?.curve().quote_payment(payment)
    }

    pub fn spot_price(&self, id: InstrumentId) -> Result<u128> {
        self.instrument(id)?.curve().spot_price()
    }

    // ========================================================================
    // Trades
    // ========================================================================

    /// Spend `payment` on the curve; migrates if the threshold is crossed
    pub fn buy<T: MigrationTarget + ?Sized>(
        &mut self,
        target: &mut T,
        id: InstrumentId,
        buyer: &Address,
        payment: u128,
    ) -> Result<BuyReceipt> {
        self.buy_with_min_out(target, id, buyer, payment, 0)
    }

    /// `buy` with a slippage floor on the minted amount
    pub fn buy_with_min_out<T: MigrationTarget + ?Sized>(
        &mut self,
        target: &mut T,
        id: InstrumentId,
        buyer: &Address,
        payment: u128,
        min_tokens_out: u128,
    ) -> Result<BuyReceipt> {
        let receipt = self
            .instrument_mut(id)?
            .buy(target, buyer, payment, min_tokens_out)?;

        debug!(
            "{} bought {} of {} for {} (refunded {})",
            buyer, receipt.tokens_minted, id, receipt.cost, receipt.refunded
        );
        self.events.push(LaunchEvent::TokensBought {
            instrument: id,
            buyer: buyer.clone(),
            payment,
            tokens: receipt.tokens_minted,
            cost: receipt.cost,
            refunded: receipt.refunded,
        });
        if let Some(record) = &receipt.migration {
            self.events.push(LaunchEvent::Migrated(record.clone()));
        }
        Ok(receipt)
    }

    pub fn sell(&mut self, id: InstrumentId, seller: &Address, amount: u128) -> Result<SellReceipt> {
        let receipt = self.instrument_mut(id)?.sell(seller, amount)?;

        debug!("{} sold {} of {} for {}", seller, amount, id, receipt.refund);
        self.events.push(LaunchEvent::TokensSold {
            instrument: id,
            seller: seller.clone(),
            tokens: amount,
            refund: receipt.refund,
        });
        Ok(receipt)
    }

    // ========================================================================
    // Ledger
    // ========================================================================

    pub fn balance_of(&self, id: InstrumentId, holder: &Address) -> Result<u128> {
        Ok(self.instrument(id)?.ledger().balance_of(holder))
    }

    pub fn total_supply(&self, id: InstrumentId) -> Result<u128> {
        Ok(self.instrument(id)?.ledger().total_supply())
    }

    pub fn allowance(&self, id: InstrumentId, owner: &Address, spender: &Address) -> Result<u128> {
        Ok(self.instrument(id)?.ledger().allowance(owner, spender))
    }

    pub fn transfer(
        &mut self,
        id: InstrumentId,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<()> {
        self.instrument_mut(id)?.transfer(from, to, amount)?;
        self.events.push(LaunchEvent::Transferred {
            instrument: id,
            from: from.clone(),
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    pub fn approve(
        &mut self,
        id: InstrumentId,
        owner: &Address,
        spender: &Address,
        amount: u128,
    ) -> Result<()> {
        self.instrument_mut(id)?.approve(owner, spender, amount);
        self.events.push(LaunchEvent::Approved {
            instrument: id,
            owner: owner.clone(),
            spender: spender.clone(),
            amount,
        });
        Ok(())
    }

    pub fn transfer_from(
        &mut self,
        id: InstrumentId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<()> {
        self.instrument_mut(id)?
            .transfer_from(spender, from, to, amount)?;
        self.events.push(LaunchEvent::Transferred {
            instrument: id,
            from: from.clone(),
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn events(&self) -> &[EventRecord] {
        self.events.records()
    }

    /// Restartable read: records with `seq >= from`
    pub fn events_since(&self, from: u64) -> &[EventRecord] {
        self.events.since(from)
    }

    pub(crate) fn event_log(&self) -> &EventLog {
        &self.events
    }
}
