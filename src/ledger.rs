//! Fungible unit ledger for one launched token
//!
//! Mint and burn are crate-private: only the owning curve engine reaches them,
//! through [`crate::Instrument`]. Holders move balance with `transfer` and
//! `transfer_from`, which never create or destroy units.

use std::collections::BTreeMap;

use crate::error::{LaunchpadError, Result};
use crate::Address;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    name: String,
    symbol: String,
    decimals: u8,
    /// Zero balances are never stored
    balances: BTreeMap<Address, u128>,
    /// (owner, spender) -> remaining allowance; zero entries are never stored
    allowances: BTreeMap<(Address, Address), u128>,
    total_supply: u128,
}

impl Ledger {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            total_supply: 0,
        }
    }

    /// Rebuild from persisted rows; total supply is recomputed, never trusted
    pub(crate) fn restore(
        name: String,
        symbol: String,
        decimals: u8,
        balances: BTreeMap<Address, u128>,
        allowances: BTreeMap<(Address, Address), u128>,
    ) -> Result<Self> {
        let total_supply = balances
            .values()
            .try_fold(0u128, |acc, v| acc.checked_add(*v))
            .ok_or(LaunchpadError::Overflow)?;
        Ok(Self {
            name,
            symbol,
            decimals,
            balances,
            allowances,
            total_supply,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Holders with a non-zero balance, in address order
    pub fn holders(&self) -> impl Iterator<Item = (&Address, u128)> + '_ {
        self.balances.iter().map(|(a, v)| (a, *v))
    }

    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    pub(crate) fn allowances(&self) -> impl Iterator<Item = (&Address, &Address, u128)> + '_ {
        self.allowances.iter().map(|((o, s), v)| (o, s, *v))
    }

    // ========================================================================
    // Curve-only mutations
    // ========================================================================

    /// Would `mint(_, amount)` succeed? Checked before any external call so
    /// the later mint cannot fail.
    pub(crate) fn check_mint(&self, amount: u128) -> Result<()> {
        if amount == 0 {
            return Err(LaunchpadError::InvalidAmount);
        }
        self.total_supply
            .checked_add(amount)
            .map(|_| ())
            .ok_or(LaunchpadError::Overflow)
    }

    pub(crate) fn mint(&mut self, holder: &Address, amount: u128) -> Result<()> {
        self.check_mint(amount)?;
        // balance <= total_supply, so this cannot overflow once total does not
        self.total_supply += amount;
        *self.balances.entry(holder.clone()).or_insert(0) += amount;
        Ok(())
    }

    pub(crate) fn burn(&mut self, holder: &Address, amount: u128) -> Result<()> {
        self.check_debit(holder, amount)?;
        self.debit(holder, amount);
        self.total_supply -= amount;
        Ok(())
    }

    // ========================================================================
    // Holder operations
    // ========================================================================

    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<()> {
        self.check_debit(from, amount)?;
        self.debit(from, amount);
        *self.balances.entry(to.clone()).or_insert(0) += amount;
        Ok(())
    }

    /// Set (not add to) the allowance of `spender` over `owner`'s balance.
    /// Zero revokes.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) {
        let key = (owner.clone(), spender.clone());
        if amount == 0 {
            self.allowances.remove(&key);
        } else {
            self.allowances.insert(key, amount);
        }
    }

    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<()> {
        let approved = self.allowance(from, spender);
        if amount > approved {
            return Err(LaunchpadError::InsufficientAllowance {
                available: approved,
                requested: amount,
            });
        }
        self.transfer(from, to, amount)?;
        self.approve(from, spender, approved - amount);
        Ok(())
    }

    fn check_debit(&self, holder: &Address, amount: u128) -> Result<()> {
        if amount == 0 {
            return Err(LaunchpadError::InvalidAmount);
        }
        let available = self.balance_of(holder);
        if available < amount {
            return Err(LaunchpadError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Caller has already run `check_debit`
    fn debit(&mut self, holder: &Address, amount: u128) {
        if let Some(balance) = self.balances.get_mut(holder) {
            *balance -= amount;
            if *balance == 0 {
                self.balances.remove(holder);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::from(s)
    }

    fn sum_of_balances(ledger: &Ledger) -> u128 {
        ledger.holders().map(|(_, v)| v).sum()
    }

    #[test]
    fn test_mint_and_burn_track_total_supply() {
        let mut ledger = Ledger::new("Pepe Coin", "PEPE", 18);
        ledger.mint(&addr("alice"), 100).unwrap();
        ledger.mint(&addr("bob"), 50).unwrap();
        assert_eq!(ledger.total_supply(), 150);

        ledger.burn(&addr("alice"), 30).unwrap();
        assert_eq!(ledger.balance_of(&addr("alice")), 70);
        assert_eq!(ledger.total_supply(), 120);
        assert_eq!(sum_of_balances(&ledger), ledger.total_supply());
    }

    #[test]
    fn test_transfer_conserves_supply() {
        let mut ledger = Ledger::new("Pepe Coin", "PEPE", 18);
        ledger.mint(&addr("alice"), 100).unwrap();

        ledger.transfer(&addr("alice"), &addr("bob"), 100).unwrap();
        assert_eq!(ledger.balance_of(&addr("alice")), 0);
        assert_eq!(ledger.balance_of(&addr("bob")), 100);
        assert_eq!(ledger.total_supply(), 100);
        // Emptied holders are dropped
        assert_eq!(ledger.holder_count(), 1);
    }

    #[test]
    fn test_transfer_insufficient_balance_leaves_state() {
        let mut ledger = Ledger::new("Pepe Coin", "PEPE", 18);
        ledger.mint(&addr("alice"), 10).unwrap();
        let before = ledger.clone();

        let result = ledger.transfer(&addr("alice"), &addr("bob"), 11);
        assert_eq!(
            result,
            Err(LaunchpadError::InsufficientBalance { available: 10, requested: 11 })
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_zero_amounts_rejected() {
        let mut ledger = Ledger::new("Pepe Coin", "PEPE", 18);
        assert_eq!(ledger.mint(&addr("alice"), 0), Err(LaunchpadError::InvalidAmount));
        assert_eq!(
            ledger.transfer(&addr("alice"), &addr("bob"), 0),
            Err(LaunchpadError::InvalidAmount)
        );
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let mut ledger = Ledger::new("Pepe Coin", "PEPE", 18);
        ledger.mint(&addr("alice"), 100).unwrap();
        ledger.approve(&addr("alice"), &addr("router"), 60);

        ledger
            .transfer_from(&addr("router"), &addr("alice"), &addr("carol"), 40)
            .unwrap();
        assert_eq!(ledger.allowance(&addr("alice"), &addr("router")), 20);
        assert_eq!(ledger.balance_of(&addr("carol")), 40);

        let result = ledger.transfer_from(&addr("router"), &addr("alice"), &addr("carol"), 21);
        assert_eq!(
            result,
            Err(LaunchpadError::InsufficientAllowance { available: 20, requested: 21 })
        );
    }

    #[test]
    fn test_restore_recomputes_supply() {
        let mut balances = BTreeMap::new();
        balances.insert(addr("alice"), 7);
        balances.insert(addr("bob"), 3);
        let ledger = Ledger::restore("X".into(), "X".into(), 0, balances, BTreeMap::new()).unwrap();
        assert_eq!(ledger.total_supply(), 10);
    }
}
