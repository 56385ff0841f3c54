use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::trading::SortKey;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print request and swap counters before exiting
    #[arg(long)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show spot prices and 24h change
    Prices {
        #[arg(required = true)]
        coins: Vec<String>,
    },
    /// Price of one coin in another currency
    Convert {
        coin: String,
        #[arg(default_value = "usd")]
        currency: String,
    },
    /// Look up coins by name
    Search { query: String },
    /// Summarise a coin's recent price history
    History {
        coin: String,
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Show the portfolio table
    Assets {
        /// Sort keys in precedence order: name, price, trend, volume
        #[arg(long, value_delimiter = ',')]
        sort: Vec<SortKey>,
    },
    /// Add a coin to the portfolio by name
    Add { name: String, volume: f64 },
    /// Drop a holding from the portfolio
    Remove { coin: String },
    /// Swap part of one holding into another coin
    Swap {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: f64,
    },
    /// Refresh the exchange rate of a pair on a schedule
    Watch {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        /// Stop after this many refreshes
        #[arg(long)]
        ticks: Option<u64>,
    },
}
