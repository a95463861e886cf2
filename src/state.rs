//! Persisted snapshot of a whole launchpad
//!
//! The snapshot is flat rows (instruments, balances, allowances, migrations,
//! events) so it can be written as JSON and diffed by hand. Restoring never
//! trusts it: every conservation law the live engine maintains is re-checked
//! and any mismatch is reported as `CorruptState`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::{LaunchpadConfig, RemainderPolicy, SymbolPolicy};
use crate::curve::{CurveEngine, CurveState};
use crate::error::{LaunchpadError, Result};
use crate::events::{EventLog, EventRecord};
use crate::instrument::Instrument;
use crate::ledger::Ledger;
use crate::migration::MigrationRecord;
use crate::registry::{symbol_key, validate_metadata, Launchpad};
use crate::{Address, InstrumentId};

/// Bumped whenever the row layout changes
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentRow {
    pub id: InstrumentId,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub creator: Address,
    pub supply_sold: u128,
    pub capital_raised: u128,
    #[serde(default)]
    pub retained_remainder: u128,
    pub migrated: bool,
    pub created_seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRow {
    pub instrument: InstrumentId,
    pub holder: Address,
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceRow {
    pub instrument: InstrumentId,
    pub owner: Address,
    pub spender: Address,
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedLaunchpad {
    pub version: u32,
    pub config: LaunchpadConfig,
    pub instruments: Vec<InstrumentRow>,
    #[serde(default)]
    pub balances: Vec<BalanceRow>,
    #[serde(default)]
    pub allowances: Vec<AllowanceRow>,
    #[serde(default)]
    pub migrations: Vec<MigrationRecord>,
    #[serde(default)]
    pub events: Vec<EventRecord>,
}

fn corrupt(msg: impl Into<String>) -> LaunchpadError {
    LaunchpadError::CorruptState(msg.into())
}

/// Per-instrument rows gathered before the ledger is rebuilt
#[derive(Default)]
struct Holdings {
    balances: BTreeMap<Address, u128>,
    allowances: BTreeMap<(Address, Address), u128>,
}

impl Launchpad {
    /// Flatten into rows. Row order is deterministic (id, then address).
    pub fn to_persisted(&self) -> PersistedLaunchpad {
        let mut instruments = Vec::with_capacity(self.len());
        let mut balances = Vec::new();
        let mut allowances = Vec::new();
        let mut migrations = Vec::new();

        for inst in self.instruments() {
            let state = inst.curve_state();
            instruments.push(InstrumentRow {
                id: inst.id(),
                name: inst.name().to_string(),
                symbol: inst.symbol().to_string(),
                decimals: inst.ledger().decimals(),
                creator: inst.creator().clone(),
                supply_sold: state.supply_sold,
                capital_raised: state.capital_raised,
                retained_remainder: state.retained_remainder,
                migrated: state.migrated,
                created_seq: inst.created_seq(),
            });
            balances.extend(inst.ledger().holders().map(|(holder, amount)| BalanceRow {
                instrument: inst.id(),
                holder: holder.clone(),
                amount,
            }));
            allowances.extend(inst.ledger().allowances().map(|(owner, spender, amount)| {
                AllowanceRow {
                    instrument: inst.id(),
                    owner: owner.clone(),
                    spender: spender.clone(),
                    amount,
                }
            }));
            if let Some(record) = inst.migration() {
                migrations.push(record.clone());
            }
        }

        PersistedLaunchpad {
            version: STATE_VERSION,
            config: self.config().clone(),
            instruments,
            balances,
            allowances,
            migrations,
            events: self.event_log().records().to_vec(),
        }
    }

    /// Rebuild from a snapshot, re-validating every invariant
    ///
    /// # Errors
    /// * `CorruptState` - version mismatch, sparse ids, duplicate rows,
    ///   balances not summing to supply, capital not matching the curve
    ///   integral, migration flag without a record (or vice versa)
    /// * `InvalidConfig` - the embedded configuration itself is invalid
    pub fn from_persisted(snapshot: PersistedLaunchpad) -> Result<Self> {
        if snapshot.version != STATE_VERSION {
            return Err(corrupt(format!(
                "state version {} is not supported (expected {})",
                snapshot.version, STATE_VERSION
            )));
        }
        let config = snapshot.config;
        config.validate()?;
        let curve = config.curve.curve();
        let count = snapshot.instruments.len();

        // Holdings per instrument
        let mut holdings: Vec<Holdings> = (0..count).map(|_| Holdings::default()).collect();
        for row in snapshot.balances {
            let slot = holdings
                .get_mut(row.instrument.index())
                .ok_or_else(|| corrupt(format!("balance row for unknown instrument {}", row.instrument)))?;
            if row.amount == 0 {
                return Err(corrupt(format!("zero balance row for {} on {}", row.holder, row.instrument)));
            }
            if slot.balances.insert(row.holder.clone(), row.amount).is_some() {
                return Err(corrupt(format!("duplicate balance row for {} on {}", row.holder, row.instrument)));
            }
        }
        for row in snapshot.allowances {
            let slot = holdings
                .get_mut(row.instrument.index())
                .ok_or_else(|| corrupt(format!("allowance row for unknown instrument {}", row.instrument)))?;
            if row.amount == 0 {
                return Err(corrupt(format!("zero allowance row on {}", row.instrument)));
            }
            if slot
                .allowances
                .insert((row.owner, row.spender), row.amount)
                .is_some()
            {
                return Err(corrupt(format!("duplicate allowance row on {}", row.instrument)));
            }
        }

        let mut migrations: Vec<Option<MigrationRecord>> = (0..count).map(|_| None).collect();
        for record in snapshot.migrations {
            let slot = migrations
                .get_mut(record.instrument.index())
                .ok_or_else(|| corrupt(format!("migration record for unknown instrument {}", record.instrument)))?;
            if slot.is_some() {
                return Err(corrupt(format!("instrument {} migrated twice", record.instrument)));
            }
            *slot = Some(record);
        }

        let events = EventLog::restore(snapshot.events)?;

        let mut symbols = BTreeSet::new();
        let mut instruments = Vec::with_capacity(count);
        for ((index, row), (held, migration)) in snapshot
            .instruments
            .into_iter()
            .enumerate()
            .zip(holdings.into_iter().zip(migrations))
        {
            if row.id.index() != index {
                return Err(corrupt(format!("instrument {} stored at position {}", row.id, index)));
            }
            validate_metadata(&row.name, &row.symbol)
                .map_err(|e| corrupt(format!("instrument {}: {}", row.id, e)))?;
            if !symbols.insert(symbol_key(&row.symbol))
                && config.symbol_policy == SymbolPolicy::Unique
            {
                return Err(corrupt(format!("symbol {} registered twice", row.symbol)));
            }
            if row.created_seq >= events.next_seq() {
                return Err(corrupt(format!(
                    "instrument {} created at seq {} past the end of the event log",
                    row.id, row.created_seq
                )));
            }

            // Conservation
            let ledger = Ledger::restore(
                row.name.clone(),
                row.symbol.clone(),
                row.decimals,
                held.balances,
                held.allowances,
            )
            .map_err(|_| corrupt(format!("instrument {}: balances overflow", row.id)))?;
            if ledger.total_supply() != row.supply_sold {
                return Err(corrupt(format!(
                    "instrument {}: balances sum to {} but {} were sold",
                    row.id,
                    ledger.total_supply(),
                    row.supply_sold
                )));
            }
            let integral = curve
                .cost(0, row.supply_sold)
                .map_err(|_| corrupt(format!("instrument {}: supply cannot be priced", row.id)))?;
            if integral.checked_add(row.retained_remainder) != Some(row.capital_raised) {
                return Err(corrupt(format!(
                    "instrument {}: capital {} != integral {} + retained {}",
                    row.id, row.capital_raised, integral, row.retained_remainder
                )));
            }
            if config.remainder_policy == RemainderPolicy::Refund && row.retained_remainder != 0 {
                return Err(corrupt(format!(
                    "instrument {}: retained remainder under refund policy",
                    row.id
                )));
            }

            // Lifecycle
            if row.migrated != (row.capital_raised >= config.migration_threshold) {
                return Err(corrupt(format!(
                    "instrument {}: migrated={} inconsistent with capital {} and threshold {}",
                    row.id, row.migrated, row.capital_raised, config.migration_threshold
                )));
            }
            match (&migration, row.migrated) {
                (Some(record), true) => {
                    if record.capital_raised != row.capital_raised
                        || record.supply_sold != row.supply_sold
                    {
                        return Err(corrupt(format!(
                            "instrument {}: migration record disagrees with curve state",
                            row.id
                        )));
                    }
                }
                (None, false) => {}
                _ => {
                    return Err(corrupt(format!(
                        "instrument {}: migration flag and record disagree",
                        row.id
                    )))
                }
            }

            let state = CurveState {
                supply_sold: row.supply_sold,
                capital_raised: row.capital_raised,
                retained_remainder: row.retained_remainder,
                migrated: row.migrated,
            };
            instruments.push(Instrument::new(
                row.id,
                row.name,
                row.symbol,
                row.creator,
                row.created_seq,
                ledger,
                CurveEngine::restore(row.id, &config, state),
                migration,
            ));
        }

        Ok(Launchpad::from_parts(config, instruments, events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CurveParams;
    use crate::migration::SimulatedPool;

    fn populated() -> Launchpad {
        let config = LaunchpadConfig {
            curve: CurveParams::new(1, 1),
            migration_threshold: 5_000,
            ..LaunchpadConfig::default()
        };
        let mut lp = Launchpad::new(config).unwrap();
        let mut pool = SimulatedPool::new();
        let alice = Address::from("alice");
        let bob = Address::from("bob");

        let pepe = lp.create(&alice, "Pepe Coin", "PEPE").unwrap();
        let doge = lp.create(&bob, "Doge 2.0", "DOG2").unwrap();
        lp.buy(&mut pool, pepe, &alice, 1_000).unwrap();
        lp.buy(&mut pool, pepe, &bob, 100).unwrap();
        lp.approve(pepe, &alice, &bob, 5).unwrap();
        lp.buy(&mut pool, doge, &bob, 6_000).unwrap();
        lp.transfer(doge, &bob, &alice, 3).unwrap();
        lp
    }

    #[test]
    fn test_round_trip_preserves_everything() {
        let lp = populated();
        let snapshot = lp.to_persisted();
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: PersistedLaunchpad = serde_json::from_str(&json).unwrap();

        let restored = Launchpad::from_persisted(parsed).unwrap();
        assert_eq!(restored, lp);
        assert!(restored.is_migrated(InstrumentId::new(1)).unwrap());
    }

    #[test]
    fn test_restored_launchpad_keeps_trading() {
        let lp = populated();
        let mut restored = Launchpad::from_persisted(lp.to_persisted()).unwrap();
        let mut pool = SimulatedPool::new();
        let next_seq = lp.events().last().unwrap().seq + 1;

        restored
            .buy(&mut pool, InstrumentId::new(0), &Address::from("carol"), 50)
            .unwrap();
        assert_eq!(restored.events().last().unwrap().seq, next_seq);
    }

    #[test]
    fn test_tampered_balance_rejected() {
        let mut snapshot = populated().to_persisted();
        snapshot.balances[0].amount += 1;
        assert!(matches!(
            Launchpad::from_persisted(snapshot),
            Err(LaunchpadError::CorruptState(_))
        ));
    }

    #[test]
    fn test_tampered_capital_rejected() {
        let mut snapshot = populated().to_persisted();
        snapshot.instruments[0].capital_raised += 1;
        assert!(matches!(
            Launchpad::from_persisted(snapshot),
            Err(LaunchpadError::CorruptState(_))
        ));
    }

    #[test]
    fn test_dropped_migration_record_rejected() {
        let mut snapshot = populated().to_persisted();
        snapshot.migrations.clear();
        assert!(matches!(
            Launchpad::from_persisted(snapshot),
            Err(LaunchpadError::CorruptState(_))
        ));
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut snapshot = populated().to_persisted();
        snapshot.version = STATE_VERSION + 1;
        assert!(matches!(
            Launchpad::from_persisted(snapshot),
            Err(LaunchpadError::CorruptState(_))
        ));
    }
}
