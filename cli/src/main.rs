//! Launchpad CLI - Bonding-curve token launches from the terminal
//!
//! Drives a local launchpad persisted to a JSON state file: create
//! instruments, trade against their curves, move tokens between holders and
//! watch curves migrate into the simulated liquidity venue.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod activity;
mod config;
mod display;
mod ledger;
mod registry;
mod simulate;
mod store;
mod trading;

use config::CliConfig;
use display::parse_amount;

#[derive(Parser)]
#[command(name = "launchpad")]
#[command(about = "Launchpad CLI - Launch and trade bonding-curve tokens", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/launchpad/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to state file (overrides config)
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Identity to act as (overrides config and $USER)
    #[arg(long)]
    caller: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a fresh state file using the configured curve
    Init {
        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },

    /// Launch a new instrument
    Create {
        /// Token name
        name: String,

        /// Token symbol (e.g., PEPE)
        symbol: String,
    },

    /// List all instruments in creation order
    List,

    /// Show curve, ledger and migration details
    Status {
        /// Instrument id or symbol
        instrument: String,
    },

    /// Cost of buying an exact number of base units
    Quote {
        /// Instrument id or symbol
        instrument: String,

        /// Base units to buy
        #[arg(value_parser = parse_amount)]
        amount: u128,
    },

    /// Payout for selling an exact number of base units
    QuoteSell {
        /// Instrument id or symbol
        instrument: String,

        /// Base units to sell
        #[arg(value_parser = parse_amount)]
        amount: u128,
    },

    /// Preview what a payment would buy
    Preview {
        /// Instrument id or symbol
        instrument: String,

        /// Payment in capital base units
        #[arg(value_parser = parse_amount)]
        payment: u128,
    },

    /// Buy from the curve
    Buy {
        /// Instrument id or symbol
        instrument: String,

        /// Payment in capital base units
        #[arg(value_parser = parse_amount)]
        payment: u128,

        /// Fail unless at least this many base units are minted
        #[arg(long, value_parser = parse_amount)]
        min_out: Option<u128>,
    },

    /// Sell back to the curve
    Sell {
        /// Instrument id or symbol
        instrument: String,

        /// Base units to sell
        #[arg(value_parser = parse_amount)]
        amount: u128,
    },

    /// Show a holder's balance
    Balance {
        /// Instrument id or symbol
        instrument: String,

        /// Holder (defaults to the caller)
        holder: Option<String>,
    },

    /// Send tokens to another holder
    Transfer {
        /// Instrument id or symbol
        instrument: String,

        /// Recipient
        to: String,

        /// Base units to send
        #[arg(value_parser = parse_amount)]
        amount: u128,
    },

    /// Allow a spender to move the caller's tokens (0 revokes)
    Approve {
        /// Instrument id or symbol
        instrument: String,

        /// Spender
        spender: String,

        /// Allowance in base units
        #[arg(value_parser = parse_amount)]
        amount: u128,
    },

    /// Move tokens on behalf of an owner, spending the caller's allowance
    TransferFrom {
        /// Instrument id or symbol
        instrument: String,

        /// Owner
        from: String,

        /// Recipient
        to: String,

        /// Base units to move
        #[arg(value_parser = parse_amount)]
        amount: u128,
    },

    /// Show the event log
    Events {
        /// First sequence number to show
        #[arg(long, default_value = "0")]
        since: u64,

        /// Only events for this instrument
        #[arg(short, long)]
        instrument: Option<String>,

        /// Show at most the last N events
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Run many concurrent buyers against one instrument
    Simulate {
        /// Instrument id or symbol
        instrument: String,

        /// Number of buyers
        #[arg(short, long, default_value = "10")]
        buyers: usize,

        /// Payment per buyer in capital base units
        #[arg(short, long, value_parser = parse_amount)]
        payment: u128,

        /// Do not save the resulting state
        #[arg(long)]
        dry_run: bool,
    },

    /// Show pools seeded by migrations
    Pool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = CliConfig::new(cli.config.clone(), cli.state.clone(), cli.caller.clone())?;

    if cli.verbose {
        println!("{} {}", "Config:".bright_cyan(), config.config_path.display());
        println!("{} {}", "State:".bright_cyan(), config.state_path.display());
        println!("{} {}", "Caller:".bright_cyan(), config.caller);
    }

    // Execute command
    match cli.command {
        Commands::Init { force } => {
            registry::init(&config, force).await?;
        }
        Commands::Create { name, symbol } => {
            registry::create(&config, name, symbol).await?;
        }
        Commands::List => {
            registry::list(&config).await?;
        }
        Commands::Status { instrument } => {
            registry::status(&config, instrument).await?;
        }
        Commands::Quote { instrument, amount } => {
            trading::quote_buy(&config, instrument, amount).await?;
        }
        Commands::QuoteSell { instrument, amount } => {
            trading::quote_sell(&config, instrument, amount).await?;
        }
        Commands::Preview { instrument, payment } => {
            trading::preview(&config, instrument, payment).await?;
        }
        Commands::Buy { instrument, payment, min_out } => {
            trading::buy(&config, instrument, payment, min_out).await?;
        }
        Commands::Sell { instrument, amount } => {
            trading::sell(&config, instrument, amount).await?;
        }
        Commands::Balance { instrument, holder } => {
            ledger::balance(&config, instrument, holder).await?;
        }
        Commands::Transfer { instrument, to, amount } => {
            ledger::transfer(&config, instrument, to, amount).await?;
        }
        Commands::Approve { instrument, spender, amount } => {
            ledger::approve(&config, instrument, spender, amount).await?;
        }
        Commands::TransferFrom { instrument, from, to, amount } => {
            ledger::transfer_from(&config, instrument, from, to, amount).await?;
        }
        Commands::Events { since, instrument, limit } => {
            activity::events(&config, since, instrument, limit).await?;
        }
        Commands::Simulate { instrument, buyers, payment, dry_run } => {
            simulate::simulate(&config, instrument, buyers, payment, dry_run).await?;
        }
        Commands::Pool => {
            activity::pool(&config).await?;
        }
    }

    Ok(())
}
