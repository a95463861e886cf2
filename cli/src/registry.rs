//! Launchpad setup and instrument registry commands

use anyhow::Result;
use colored::Colorize;

use crate::config::CliConfig;
use crate::display::{format_address, format_units};
use crate::store::Session;

pub async fn init(config: &CliConfig, force: bool) -> Result<()> {
    println!("{}", "=== Initialize Launchpad ===".bright_green().bold());

    let mut session = Session::init(&config.state_path, config.launchpad.clone(), force).await?;
    session.save().await?;

    let params = session.launchpad.config();
    println!("{} {}", "State file:".bright_cyan(), session.path().display());
    println!("{} {}", "Base price:".bright_cyan(), params.curve.base_price);
    println!("{} {}", "Slope:".bright_cyan(), params.curve.slope);
    println!("{} {}", "Price unit:".bright_cyan(), params.curve.unit);
    println!("{} {}", "Migration threshold:".bright_cyan(), params.migration_threshold);
    println!("{} {:?}", "Remainder policy:".bright_cyan(), params.remainder_policy);
    println!("{} {:?}", "Symbol policy:".bright_cyan(), params.symbol_policy);
    println!("{} {}", "Token decimals:".bright_cyan(), params.token_decimals);

    println!("\n{} Launchpad ready", "✓".bright_green());
    Ok(())
}

pub async fn create(config: &CliConfig, name: String, symbol: String) -> Result<()> {
    println!("{}", "=== Create Instrument ===".bright_green().bold());

    let mut session = Session::load(&config.state_path).await?;
    let id = session.launchpad.create(&config.caller, &name, &symbol)?;
    session.save().await?;

    println!("{} {}", "Instrument:".bright_cyan(), id);
    println!("{} {}", "Name:".bright_cyan(), name.trim());
    println!("{} {}", "Symbol:".bright_cyan(), symbol.trim());
    println!("{} {}", "Creator:".bright_cyan(), format_address(&config.caller));
    println!(
        "{} {}",
        "Spot price:".bright_cyan(),
        session.launchpad.spot_price(id)?
    );

    println!("\n{} Instrument {} created", "✓".bright_green(), id);
    Ok(())
}

pub async fn list(config: &CliConfig) -> Result<()> {
    println!("{}", "=== Instruments ===".bright_green().bold());

    let session = Session::load(&config.state_path).await?;
    let launchpad = &session.launchpad;
    if launchpad.is_empty() {
        println!("\n{}", "No instruments yet".dimmed());
        return Ok(());
    }

    let threshold = launchpad.config().migration_threshold;
    println!(
        "\n{:<6} {:<10} {:<24} {:>28} {:>10}",
        "ID".bold(),
        "SYMBOL".bold(),
        "NAME".bold(),
        "CAPITAL".bold(),
        "PHASE".bold()
    );
    for inst in launchpad.instruments() {
        let state = inst.curve_state();
        let phase = if state.migrated {
            "migrated".bright_magenta()
        } else {
            "active".bright_green()
        };
        println!(
            "{:<6} {:<10} {:<24} {:>28} {:>10}",
            inst.id().to_string(),
            inst.symbol(),
            inst.name(),
            format!("{}/{}", state.capital_raised, threshold),
            phase
        );
    }
    Ok(())
}

pub async fn status(config: &CliConfig, instrument: String) -> Result<()> {
    println!("{}", "=== Instrument Status ===".bright_green().bold());

    let session = Session::load(&config.state_path).await?;
    let id = session.resolve(&instrument)?;
    let inst = session.launchpad.instrument(id)?;
    let state = inst.curve_state();
    let decimals = inst.ledger().decimals();
    let threshold = inst.curve().threshold();

    println!("{} {}", "Instrument:".bright_cyan(), id);
    println!("{} {} ({})", "Token:".bright_cyan(), inst.name(), inst.symbol());
    println!("{} {}", "Creator:".bright_cyan(), format_address(inst.creator()));
    println!("{} {:?}", "Phase:".bright_cyan(), state.phase());

    println!("\n{}", "Curve:".bright_yellow());
    println!("  {} {}", "Supply sold:".bright_cyan(), format_units(state.supply_sold, decimals));
    println!("  {} {}", "Capital raised:".bright_cyan(), state.capital_raised);
    println!("  {} {}", "Retained remainder:".bright_cyan(), state.retained_remainder);
    println!("  {} {}", "Held reserve:".bright_cyan(), inst.curve().held_reserve());
    println!("  {} {}", "Spot price:".bright_cyan(), session.launchpad.spot_price(id)?);
    // Integer percent; capital and threshold are both base units
    let progress = state.capital_raised.saturating_mul(100) / threshold.max(1);
    println!(
        "  {} {}/{} ({}%)",
        "Threshold:".bright_cyan(),
        state.capital_raised.min(threshold),
        threshold,
        progress.min(100)
    );

    println!("\n{}", "Ledger:".bright_yellow());
    println!("  {} {}", "Holders:".bright_cyan(), inst.ledger().holder_count());
    for (holder, amount) in inst.ledger().holders() {
        println!("    {} {}", format_address(holder), format_units(amount, decimals));
    }

    if let Some(record) = inst.migration() {
        println!("\n{}", "Migration:".bright_yellow());
        println!("  {} {}", "Triggered by:".bright_cyan(), format_address(&record.triggered_by));
        println!("  {} {}", "Pool:".bright_cyan(), record.receipt.pool_id);
        println!("  {} {}", "Liquidity:".bright_cyan(), record.receipt.liquidity);
    }

    if let Some(saved_at) = &session.saved_at {
        println!("\n{} {}", "Last saved:".dimmed(), saved_at.dimmed());
    }
    Ok(())
}
