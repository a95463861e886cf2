//! Append-only notification log
//!
//! Observers (UI, indexers) read records by sequence number; nothing is ever
//! rewritten. Records are appended only after an operation has fully
//! committed, so a failed call never shows up here.

use serde::{Deserialize, Serialize};

use crate::error::{LaunchpadError, Result};
use crate::migration::MigrationRecord;
use crate::{Address, InstrumentId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchEvent {
    InstrumentCreated {
        instrument: InstrumentId,
        name: String,
        symbol: String,
        creator: Address,
    },
    TokensBought {
        instrument: InstrumentId,
        buyer: Address,
        payment: u128,
        tokens: u128,
        cost: u128,
        refunded: u128,
    },
    TokensSold {
        instrument: InstrumentId,
        seller: Address,
        tokens: u128,
        refund: u128,
    },
    Transferred {
        instrument: InstrumentId,
        from: Address,
        to: Address,
        amount: u128,
    },
    Approved {
        instrument: InstrumentId,
        owner: Address,
        spender: Address,
        amount: u128,
    },
    Migrated(MigrationRecord),
}

impl LaunchEvent {
    pub fn instrument(&self) -> InstrumentId {
        match self {
            Self::InstrumentCreated { instrument, .. }
            | Self::TokensBought { instrument, .. }
            | Self::TokensSold { instrument, .. }
            | Self::Transferred { instrument, .. }
            | Self::Approved { instrument, .. } => *instrument,
            Self::Migrated(record) => record.instrument,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub event: LaunchEvent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    records: Vec<EventRecord>,
    next_seq: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted records; sequence numbers must strictly increase
    pub(crate) fn restore(records: Vec<EventRecord>) -> Result<Self> {
        if records.windows(2).any(|w| w[0].seq >= w[1].seq) {
            return Err(LaunchpadError::CorruptState(
                "event sequence numbers are not strictly increasing".into(),
            ));
        }
        let next_seq = match records.last() {
            Some(last) => last.seq.checked_add(1).ok_or(LaunchpadError::Overflow)?,
            None => 0,
        };
        Ok(Self { records, next_seq })
    }

    /// Append and return the assigned sequence number
    pub(crate) fn push(&mut self, event: LaunchEvent) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.records.push(EventRecord { seq, event });
        seq
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with `seq >= from`
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = self.records.partition_point(|r| r.seq < from);
        &self.records[start..]
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
