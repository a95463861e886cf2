//! Token ledger commands: balances, transfers, allowances

use anyhow::Result;
use colored::Colorize;
use launchpad::Address;

use crate::config::CliConfig;
use crate::display::{format_address, format_units};
use crate::store::Session;

pub async fn balance(config: &CliConfig, instrument: String, holder: Option<String>) -> Result<()> {
    println!("{}", "=== Balance ===".bright_green().bold());

    let session = Session::load(&config.state_path).await?;
    let id = session.resolve(&instrument)?;
    let holder = holder.map(Address::new).unwrap_or_else(|| config.caller.clone());
    let inst = session.launchpad.instrument(id)?;
    let decimals = inst.ledger().decimals();

    println!("{} {} ({})", "Instrument:".bright_cyan(), id, inst.symbol());
    println!("{} {}", "Holder:".bright_cyan(), format_address(&holder));
    println!(
        "{} {}",
        "Balance:".bright_cyan(),
        format_units(session.launchpad.balance_of(id, &holder)?, decimals)
    );
    println!(
        "{} {}",
        "Total supply:".bright_cyan(),
        format_units(session.launchpad.total_supply(id)?, decimals)
    );
    Ok(())
}

pub async fn transfer(config: &CliConfig, instrument: String, to: String, amount: u128) -> Result<()> {
    println!("{}", "=== Transfer ===".bright_green().bold());

    let mut session = Session::load(&config.state_path).await?;
    let id = session.resolve(&instrument)?;
    let to = Address::new(to);
    session.launchpad.transfer(id, &config.caller, &to, amount)?;
    session.save().await?;

    println!("{} {}", "Instrument:".bright_cyan(), id);
    println!("{} {}", "From:".bright_cyan(), format_address(&config.caller));
    println!("{} {}", "To:".bright_cyan(), format_address(&to));
    println!("{} {}", "Amount:".bright_cyan(), amount);

    println!("\n{} Transfer confirmed", "✓".bright_green());
    Ok(())
}

pub async fn approve(config: &CliConfig, instrument: String, spender: String, amount: u128) -> Result<()> {
    println!("{}", "=== Approve ===".bright_green().bold());

    let mut session = Session::load(&config.state_path).await?;
    let id = session.resolve(&instrument)?;
    let spender = Address::new(spender);
    session.launchpad.approve(id, &config.caller, &spender, amount)?;
    session.save().await?;

    println!("{} {}", "Instrument:".bright_cyan(), id);
    println!("{} {}", "Owner:".bright_cyan(), format_address(&config.caller));
    println!("{} {}", "Spender:".bright_cyan(), format_address(&spender));
    println!("{} {}", "Allowance:".bright_cyan(), amount);
    if amount == 0 {
        println!("\n{}", "Allowance revoked".yellow());
    }
    Ok(())
}

pub async fn transfer_from(
    config: &CliConfig,
    instrument: String,
    from: String,
    to: String,
    amount: u128,
) -> Result<()> {
    println!("{}", "=== Transfer From ===".bright_green().bold());

    let mut session = Session::load(&config.state_path).await?;
    let id = session.resolve(&instrument)?;
    let from = Address::new(from);
    let to = Address::new(to);
    session
        .launchpad
        .transfer_from(id, &config.caller, &from, &to, amount)?;
    session.save().await?;

    println!("{} {}", "Instrument:".bright_cyan(), id);
    println!("{} {}", "Spender:".bright_cyan(), format_address(&config.caller));
    println!("{} {}", "From:".bright_cyan(), format_address(&from));
    println!("{} {}", "To:".bright_cyan(), format_address(&to));
    println!("{} {}", "Amount:".bright_cyan(), amount);
    println!(
        "{} {}",
        "Remaining allowance:".bright_cyan(),
        session.launchpad.allowance(id, &from, &config.caller)?
    );

    println!("\n{} Transfer confirmed", "✓".bright_green());
    Ok(())
}
