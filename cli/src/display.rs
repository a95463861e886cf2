//! Formatting and parsing helpers for terminal output

use colored::Colorize;
use launchpad::{Address, LaunchEvent};

/// Render base units with the token's decimals (`1500000000000000000`, 18 → `1.5`)
pub fn format_amount(value: u128, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let digits = value.to_string();
    let decimals = decimals as usize;
    let (whole, frac) = if digits.len() > decimals {
        let split = digits.len() - decimals;
        (digits[..split].to_string(), digits[split..].to_string())
    } else {
        ("0".to_string(), format!("{:0>width$}", digits, width = decimals))
    };
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole
    } else {
        format!("{}.{}", whole, frac)
    }
}

/// Amount with both the human and the raw form
pub fn format_units(value: u128, decimals: u8) -> String {
    format!("{} {}", format_amount(value, decimals), format!("({} base units)", value).dimmed())
}

/// Clap value parser for u128 amounts; accepts `_` separators
pub fn parse_amount(raw: &str) -> Result<u128, String> {
    raw.trim()
        .replace('_', "")
        .parse()
        .map_err(|e| format!("invalid amount {:?}: {}", raw, e))
}

pub fn format_address(address: &Address) -> String {
    address.as_str().bright_yellow().to_string()
}

/// One-line description of a log entry
pub fn describe_event(event: &LaunchEvent) -> String {
    match event {
        LaunchEvent::InstrumentCreated { instrument, name, symbol, creator } => format!(
            "{} {} {} ({}) by {}",
            "CREATE  ".bright_green(),
            instrument,
            symbol,
            name,
            format_address(creator)
        ),
        LaunchEvent::TokensBought { instrument, buyer, payment, tokens, refunded, .. } => format!(
            "{} {} {} paid {} for {} units{}",
            "BUY     ".bright_green(),
            instrument,
            format_address(buyer),
            payment,
            tokens,
            if *refunded > 0 {
                format!(" (refunded {})", refunded)
            } else {
                String::new()
            }
        ),
        LaunchEvent::TokensSold { instrument, seller, tokens, refund } => format!(
            "{} {} {} sold {} units for {}",
            "SELL    ".bright_red(),
            instrument,
            format_address(seller),
            tokens,
            refund
        ),
        LaunchEvent::Transferred { instrument, from, to, amount } => format!(
            "{} {} {} -> {} {} units",
            "TRANSFER".bright_blue(),
            instrument,
            format_address(from),
            format_address(to),
            amount
        ),
        LaunchEvent::Approved { instrument, owner, spender, amount } => format!(
            "{} {} {} lets {} spend {} units",
            "APPROVE ".bright_blue(),
            instrument,
            format_address(owner),
            format_address(spender),
            amount
        ),
        LaunchEvent::Migrated(record) => format!(
            "{} {} capital {} / supply {} -> pool {} (liquidity {})",
            "MIGRATE ".bright_magenta().bold(),
            record.instrument,
            record.capital_raised,
            record.supply_sold,
            record.receipt.pool_id,
            record.receipt.liquidity
        ),
    }
}
