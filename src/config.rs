//! Launchpad configuration
//!
//! Amounts are u128 in base units. TOML cannot hold integers above i64, so
//! every amount field also accepts a decimal string (`"80_000000000000000000"`).

use curve_model::LinearCurve;
use serde::{Deserialize, Serialize};

use crate::error::{LaunchpadError, Result};

/// 80 capital units at 18 decimals
pub const DEFAULT_MIGRATION_THRESHOLD: u128 = 80_000_000_000_000_000_000;

/// ERC20-style default
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// One whole token at the default decimals
pub const DEFAULT_PRICE_UNIT: u128 = 1_000_000_000_000_000_000;

/// 10^-8 capital units per whole token
pub const DEFAULT_BASE_PRICE: u128 = 10_000_000_000;

/// Price rise per whole token sold; the default curve migrates after roughly
/// 845 million tokens
pub const DEFAULT_SLOPE: u128 = 200;

pub const MAX_NAME_LEN: usize = 64;
pub const MAX_SYMBOL_LEN: usize = 16;

/// Coefficients of `p(k) = base_price + slope·k`, priced per `unit` base units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveParams {
    #[serde(with = "amount")]
    pub base_price: u128,
    #[serde(with = "amount")]
    pub slope: u128,
    /// Token base units one price covers; 1 prices every base unit separately
    #[serde(with = "amount")]
    pub unit: u128,
}

impl CurveParams {
    pub const fn new(base_price: u128, slope: u128) -> Self {
        Self {
            base_price,
            slope,
            unit: 1,
        }
    }

    pub const fn with_unit(self, unit: u128) -> Self {
        Self { unit, ..self }
    }

    pub const fn curve(&self) -> LinearCurve {
        LinearCurve::new(self.base_price, self.slope).with_unit(self.unit)
    }
}

impl Default for CurveParams {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_PRICE, DEFAULT_SLOPE).with_unit(DEFAULT_PRICE_UNIT)
    }
}

/// What happens to the part of a payment that does not buy a whole base unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Kept by the curve as protocol revenue (counts toward the threshold)
    #[default]
    Retain,
    /// Returned to the buyer; the curve only takes the exact cost
    Refund,
}

/// Whether two instruments may share a symbol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolPolicy {
    /// Symbols are unique, compared case-insensitively
    #[default]
    Unique,
    AllowDuplicates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchpadConfig {
    pub curve: CurveParams,
    /// Capital raised at which a curve migrates (T)
    #[serde(with = "amount")]
    pub migration_threshold: u128,
    pub remainder_policy: RemainderPolicy,
    pub symbol_policy: SymbolPolicy,
    pub token_decimals: u8,
}

impl Default for LaunchpadConfig {
    fn default() -> Self {
        Self {
            curve: CurveParams::default(),
            migration_threshold: DEFAULT_MIGRATION_THRESHOLD,
            remainder_policy: RemainderPolicy::default(),
            symbol_policy: SymbolPolicy::default(),
            token_decimals: DEFAULT_TOKEN_DECIMALS,
        }
    }
}

impl LaunchpadConfig {
    pub fn validate(&self) -> Result<()> {
        self.curve
            .curve()
            .validate()
            .map_err(|e| LaunchpadError::from_curve(e, 0, 0))?;

        if self.migration_threshold == 0 {
            return Err(LaunchpadError::InvalidConfig(
                "migration threshold must be positive".into(),
            ));
        }
        // 10^38 is the largest power of ten below u128::MAX
        if self.token_decimals > 38 {
            return Err(LaunchpadError::InvalidConfig(format!(
                "token decimals {} exceed 38",
                self.token_decimals
            )));
        }
        Ok(())
    }
}

/// u128 as a decimal string on the way out, integer or string on the way in
pub(crate) mod amount {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(v) => Ok(v as u128),
            Raw::Text(s) => s
                .trim()
                .replace('_', "")
                .parse()
                .map_err(|e| D::Error::custom(format!("invalid amount {:?}: {}", s, e))),
        }
    }
}
