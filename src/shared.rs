//! Thread-safe handle over a launchpad and its migration target
//!
//! Every call takes one lock over both, so operations on the same launchpad
//! are linearised and a buy that migrates sees the venue exclusively. A
//! panic while holding the lock cannot leave a half-applied trade (all
//! mutations happen after the last fallible step), so a poisoned lock is
//! recovered rather than propagated.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::curve::{BuyQuote, CurveState};
use crate::error::Result;
use crate::events::EventRecord;
use crate::instrument::{BuyReceipt, SellReceipt};
use crate::migration::MigrationTarget;
use crate::registry::Launchpad;
use crate::{Address, InstrumentId};

#[derive(Debug)]
struct Venue<T> {
    launchpad: Launchpad,
    target: T,
}

#[derive(Debug)]
pub struct SharedLaunchpad<T> {
    inner: Arc<Mutex<Venue<T>>>,
}

impl<T> Clone for SharedLaunchpad<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: MigrationTarget> SharedLaunchpad<T> {
    pub fn new(launchpad: Launchpad, target: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Venue { launchpad, target })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Venue<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a read-only closure against a consistent view
    pub fn with<R>(&self, f: impl FnOnce(&Launchpad, &T) -> R) -> R {
        let venue = self.lock();
        f(&venue.launchpad, &venue.target)
    }

    pub fn create(&self, creator: &Address, name: &str, symbol: &str) -> Result<InstrumentId> {
        self.lock().launchpad.create(creator, name, symbol)
    }

    pub fn list(&self) -> Vec<InstrumentId> {
        self.lock().launchpad.list()
    }

    pub fn get_curve_state(&self, id: InstrumentId) -> Result<CurveState> {
        self.lock().launchpad.get_curve_state(id)
    }

    pub fn quote_buy(&self, id: InstrumentId, amount: u128) -> Result<u128> {
        self.lock().launchpad.quote_buy(id, amount)
    }

    pub fn quote_sell(&self, id: InstrumentId, amount: u128) -> Result<u128> {
        self.lock().launchpad.quote_sell(id, amount)
    }

    pub fn quote_payment(&self, id: InstrumentId, payment: u128) -> Result<BuyQuote> {
        self.lock().launchpad.quote_payment(id, payment)
    }

    pub fn buy(&self, id: InstrumentId, buyer: &Address, payment: u128) -> Result<BuyReceipt> {
        self.buy_with_min_out(id, buyer, payment, 0)
    }

    pub fn buy_with_min_out(
        &self,
        id: InstrumentId,
        buyer: &Address,
        payment: u128,
        min_tokens_out: u128,
    ) -> Result<BuyReceipt> {
        let mut guard = self.lock();
        let venue = &mut *guard;
        venue
            .launchpad
            .buy_with_min_out(&mut venue.target, id, buyer, payment, min_tokens_out)
    }

    pub fn sell(&self, id: InstrumentId, seller: &Address, amount: u128) -> Result<SellReceipt> {
        self.lock().launchpad.sell(id, seller, amount)
    }

    pub fn balance_of(&self, id: InstrumentId, holder: &Address) -> Result<u128> {
        self.lock().launchpad.balance_of(id, holder)
    }

    pub fn transfer(&self, id: InstrumentId, from: &Address, to: &Address, amount: u128) -> Result<()> {
        self.lock().launchpad.transfer(id, from, to, amount)
    }

    pub fn approve(
        &self,
        id: InstrumentId,
        owner: &Address,
        spender: &Address,
        amount: u128,
    ) -> Result<()> {
        self.lock().launchpad.approve(id, owner, spender, amount)
    }

    pub fn transfer_from(
        &self,
        id: InstrumentId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<()> {
        self.lock()
            .launchpad
            .transfer_from(id, spender, from, to, amount)
    }

    pub fn events_since(&self, from: u64) -> Vec<EventRecord> {
        self.lock().launchpad.events_since(from).to_vec()
    }

    /// Unwrap when this is the last handle; gives the handle back otherwise
    pub fn into_inner(self) -> std::result::Result<(Launchpad, T), Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => {
                let venue = mutex.into_inner().unwrap_or_else(PoisonError::into_inner);
                Ok((venue.launchpad, venue.target))
            }
            Err(inner) => Err(Self { inner }),
        }
    }
}
