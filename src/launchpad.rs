//! Bonding-Curve Launchpad Engine
//!
//! Lets anyone launch a fungible token whose early price is set by a linear
//! bonding curve. Once the capital committed to a curve reaches the configured
//! threshold, the triggering buy migrates the curve's reserves to an external
//! liquidity venue and the curve stops trading for good.
//!
//! The engine guarantees:
//! 1. Quotes are pure and deterministic: a quote equals what the next trade charges
//! 2. Conservation: Σ balances == supply sold, and capital raised equals the curve
//!    integral plus any retained remainder, bit for bit (no floats)
//! 3. Migration happens exactly once, atomically with the buy that triggers it
//! 4. Every operation is all-or-nothing; a failed call leaves no trace
//! 5. Instruments are isolated - one instrument's failure never touches another
//!
//! All state lives in an owned [`Launchpad`] arena. Callers that share it
//! across threads go through [`SharedLaunchpad`], which linearises every call.

#![forbid(unsafe_code)]

use core::fmt;
use serde::{Deserialize, Serialize};

pub mod config;
pub mod curve;
pub mod error;
pub mod events;
pub mod instrument;
pub mod ledger;
pub mod migration;
pub mod registry;
pub mod shared;
pub mod state;

pub use config::{CurveParams, LaunchpadConfig, RemainderPolicy, SymbolPolicy};
pub use curve::{BuyQuote, CurveEngine, CurvePhase, CurveState};
pub use error::{LaunchpadError, Result};
pub use events::{EventLog, EventRecord, LaunchEvent};
pub use instrument::{BuyReceipt, Instrument, SellReceipt};
pub use ledger::Ledger;
pub use migration::{
    LiquidityReceipt, MigrationRecord, MigrationRejected, MigrationRequest, MigrationTarget,
    PoolPosition, SimulatedPool,
};
pub use registry::Launchpad;
pub use shared::SharedLaunchpad;
pub use state::{PersistedLaunchpad, STATE_VERSION};

// ============================================================================
// Core Identifiers
// ============================================================================

/// Identity of a holder, creator or spender
///
/// Opaque to the engine; the wallet layer decides what goes in here.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle of an instrument inside the registry arena
///
/// Ids are dense and allocated in creation order, starting at 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentId(u32);

impl InstrumentId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl core::str::FromStr for InstrumentId {
    type Err = core::num::ParseIntError;

    /// Accepts both `3` and `#3`
    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(Self)
    }
}
