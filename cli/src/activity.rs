//! Event log and migration venue views

use anyhow::Result;
use colored::Colorize;
use launchpad::InstrumentId;

use crate::config::CliConfig;
use crate::display::describe_event;
use crate::store::Session;

pub async fn events(
    config: &CliConfig,
    since: u64,
    instrument: Option<String>,
    limit: Option<usize>,
) -> Result<()> {
    println!("{}", "=== Events ===".bright_green().bold());

    let session = Session::load(&config.state_path).await?;
    let filter: Option<InstrumentId> = instrument
        .as_deref()
        .map(|i| session.resolve(i))
        .transpose()?;

    let records: Vec<_> = session
        .launchpad
        .events_since(since)
        .iter()
        .filter(|r| filter.map_or(true, |id| r.event.instrument() == id))
        .collect();
    let skip = limit.map_or(0, |n| records.len().saturating_sub(n));

    if records.is_empty() {
        println!("\n{}", "No events".dimmed());
        return Ok(());
    }
    for record in &records[skip..] {
        println!("{:>6}  {}", record.seq.to_string().dimmed(), describe_event(&record.event));
    }

    if let Some(last) = records.last() {
        println!(
            "\n{} {}",
            "Resume with:".dimmed(),
            format!("--since {}", last.seq + 1).dimmed()
        );
    }
    Ok(())
}

pub async fn pool(config: &CliConfig) -> Result<()> {
    println!("{}", "=== Migration Venue ===".bright_green().bold());

    let session = Session::load(&config.state_path).await?;
    let positions = session.pool.positions();
    if positions.is_empty() {
        println!("\n{}", "No pools seeded yet".dimmed());
        return Ok(());
    }

    for position in positions {
        println!(
            "\n{} {} ({} {})",
            "Pool".bright_yellow(),
            position.pool_id,
            position.instrument,
            position.symbol
        );
        println!("  {} {}", "Capital reserve:".bright_cyan(), position.capital_reserve);
        println!("  {} {}", "Token reserve:".bright_cyan(), position.token_reserve);
        println!("  {} {}", "Liquidity:".bright_cyan(), position.liquidity);
    }
    Ok(())
}
