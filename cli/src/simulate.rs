//! Concurrent buyer simulation against one instrument
//!
//! Each simulated buyer runs as its own task against a `SharedLaunchpad`, so
//! the run exercises the same serialisation a multi-client deployment would.

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use launchpad::{Address, LaunchpadError, SharedLaunchpad};

use crate::config::CliConfig;
use crate::store::Session;

#[derive(Debug, Default)]
struct Tally {
    filled: usize,
    tokens: u128,
    after_migration: usize,
    failed: usize,
    migrated_by: Option<Address>,
}

pub async fn simulate(
    config: &CliConfig,
    instrument: String,
    buyers: usize,
    payment: u128,
    dry_run: bool,
) -> Result<()> {
    println!("{}", "=== Simulate Buyers ===".bright_green().bold());

    let mut session = Session::load(&config.state_path).await?;
    let id = session.resolve(&instrument)?;
    println!("{} {}", "Instrument:".bright_cyan(), id);
    println!("{} {}", "Buyers:".bright_cyan(), buyers);
    println!("{} {}", "Payment each:".bright_cyan(), payment);
    if dry_run {
        println!("{} {}", "Dry run:".bright_cyan(), "Yes");
    }

    let shared = SharedLaunchpad::new(session.launchpad, session.pool);

    let progress = ProgressBar::new(buyers as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress template")?
            .progress_chars("=> "),
    );

    let mut handles = Vec::with_capacity(buyers);
    for i in 0..buyers {
        let shared = shared.clone();
        let buyer = Address::new(format!("sim-{}", i));
        handles.push(tokio::task::spawn_blocking(move || {
            let result = shared.buy(id, &buyer, payment);
            (buyer, result)
        }));
    }

    let mut tally = Tally::default();
    for handle in handles {
        let (buyer, result) = handle.await.context("Simulated buyer task panicked")?;
        match result {
            Ok(receipt) => {
                tally.filled += 1;
                tally.tokens += receipt.tokens_minted;
                if receipt.migration.is_some() {
                    progress.set_message(format!("migrated by {}", buyer));
                    tally.migrated_by = Some(buyer);
                }
            }
            Err(LaunchpadError::CurveMigrated(_)) => tally.after_migration += 1,
            Err(e) => {
                log::debug!("{} failed: {}", buyer, e);
                tally.failed += 1;
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    let (launchpad, pool) = shared
        .into_inner()
        .map_err(|_| anyhow::anyhow!("Simulation handles still alive"))?;
    let state = launchpad.get_curve_state(id)?;

    println!("\n{}", "Results:".bright_yellow());
    println!("  {} {}", "Filled:".bright_cyan(), tally.filled);
    println!("  {} {}", "Tokens minted:".bright_cyan(), tally.tokens);
    println!("  {} {}", "Rejected (migrated):".bright_cyan(), tally.after_migration);
    println!("  {} {}", "Rejected (other):".bright_cyan(), tally.failed);
    println!("  {} {}", "Supply sold:".bright_cyan(), state.supply_sold);
    println!("  {} {}", "Capital raised:".bright_cyan(), state.capital_raised);
    if let Some(buyer) = &tally.migrated_by {
        println!("  {} {}", "Migrated by:".bright_magenta(), buyer);
    }

    if dry_run {
        println!("\n{}", "Dry run: state not saved".yellow());
        return Ok(());
    }

    session.launchpad = launchpad;
    session.pool = pool;
    session.save().await?;

    println!(
        "\n{} Simulation saved at {}",
        "✓".bright_green(),
        chrono::Local::now().format("%H:%M:%S")
    );
    Ok(())
}
