//! Curve trading: quotes, buys and sells

use anyhow::Result;
use colored::Colorize;

use crate::config::CliConfig;
use crate::display::{format_address, format_units};
use crate::store::Session;

pub async fn quote_buy(config: &CliConfig, instrument: String, amount: u128) -> Result<()> {
    println!("{}", "=== Quote Buy ===".bright_green().bold());

    let session = Session::load(&config.state_path).await?;
    let id = session.resolve(&instrument)?;
    let decimals = session.launchpad.instrument(id)?.ledger().decimals();
    let cost = session.launchpad.quote_buy(id, amount)?;

    println!("{} {}", "Instrument:".bright_cyan(), id);
    println!("{} {}", "Amount:".bright_cyan(), format_units(amount, decimals));
    println!("{} {}", "Cost:".bright_cyan(), cost);
    if session.launchpad.is_migrated(id)? {
        println!("\n{}", "Curve has migrated; this quote is informational only".yellow());
    }
    Ok(())
}

pub async fn quote_sell(config: &CliConfig, instrument: String, amount: u128) -> Result<()> {
    println!("{}", "=== Quote Sell ===".bright_green().bold());

    let session = Session::load(&config.state_path).await?;
    let id = session.resolve(&instrument)?;
    let decimals = session.launchpad.instrument(id)?.ledger().decimals();
    let refund = session.launchpad.quote_sell(id, amount)?;

    println!("{} {}", "Instrument:".bright_cyan(), id);
    println!("{} {}", "Amount:".bright_cyan(), format_units(amount, decimals));
    println!("{} {}", "Refund:".bright_cyan(), refund);
    if session.launchpad.is_migrated(id)? {
        println!("\n{}", "Curve has migrated; this quote is informational only".yellow());
    }
    Ok(())
}

pub async fn preview(config: &CliConfig, instrument: String, payment: u128) -> Result<()> {
    println!("{}", "=== Preview Buy ===".bright_green().bold());

    let session = Session::load(&config.state_path).await?;
    let id = session.resolve(&instrument)?;
    let decimals = session.launchpad.instrument(id)?.ledger().decimals();
    let quote = session.launchpad.quote_payment(id, payment)?;

    println!("{} {}", "Instrument:".bright_cyan(), id);
    println!("{} {}", "Payment:".bright_cyan(), quote.payment);
    println!("{} {}", "Tokens:".bright_cyan(), format_units(quote.tokens, decimals));
    println!("{} {}", "Cost:".bright_cyan(), quote.cost);
    println!("{} {}", "Remainder:".bright_cyan(), quote.remainder);
    println!("{} {}", "Refunded:".bright_cyan(), quote.refunded);
    println!("{} {}", "Capital after:".bright_cyan(), quote.capital_after);
    if quote.triggers_migration {
        println!("\n{}", "This buy crosses the migration threshold".bright_magenta().bold());
    }
    Ok(())
}

pub async fn buy(
    config: &CliConfig,
    instrument: String,
    payment: u128,
    min_out: Option<u128>,
) -> Result<()> {
    println!("{}", "=== Buy ===".bright_green().bold());

    let mut session = Session::load(&config.state_path).await?;
    let id = session.resolve(&instrument)?;
    let decimals = session.launchpad.instrument(id)?.ledger().decimals();

    let receipt = session.launchpad.buy_with_min_out(
        &mut session.pool,
        id,
        &config.caller,
        payment,
        min_out.unwrap_or(0),
    )?;
    session.save().await?;

    println!("{} {}", "Instrument:".bright_cyan(), id);
    println!("{} {}", "Buyer:".bright_cyan(), format_address(&receipt.buyer));
    println!("{} {}", "Payment:".bright_cyan(), receipt.payment);
    println!("{} {}", "Minted:".bright_cyan(), format_units(receipt.tokens_minted, decimals));
    println!("{} {}", "Cost:".bright_cyan(), receipt.cost);
    if receipt.refunded > 0 {
        println!("{} {}", "Refunded:".bright_cyan(), receipt.refunded);
    }
    if receipt.retained > 0 {
        println!("{} {}", "Retained:".bright_cyan(), receipt.retained);
    }

    if let Some(record) = &receipt.migration {
        println!("\n{}", "=== Curve Migrated ===".bright_magenta().bold());
        println!("{} {}", "Capital handed over:".bright_cyan(), record.capital_raised);
        println!("{} {}", "Supply snapshot:".bright_cyan(), format_units(record.supply_sold, decimals));
        println!("{} {}", "Pool:".bright_cyan(), record.receipt.pool_id);
        println!("{} {}", "Liquidity:".bright_cyan(), record.receipt.liquidity);
    }

    println!("\n{} Buy confirmed", "✓".bright_green());
    Ok(())
}

pub async fn sell(config: &CliConfig, instrument: String, amount: u128) -> Result<()> {
    println!("{}", "=== Sell ===".bright_green().bold());

    let mut session = Session::load(&config.state_path).await?;
    let id = session.resolve(&instrument)?;
    let decimals = session.launchpad.instrument(id)?.ledger().decimals();

    let receipt = session.launchpad.sell(id, &config.caller, amount)?;
    session.save().await?;

    println!("{} {}", "Instrument:".bright_cyan(), id);
    println!("{} {}", "Seller:".bright_cyan(), format_address(&receipt.seller));
    println!("{} {}", "Burned:".bright_cyan(), format_units(receipt.tokens_burned, decimals));
    println!("{} {}", "Refund:".bright_cyan(), receipt.refund);

    println!("\n{} Sell confirmed", "✓".bright_green());
    Ok(())
}
