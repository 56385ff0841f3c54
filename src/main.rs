use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::interval;

use coin_dashboard::api::{CoinGeckoClient, PriceSource};
use coin_dashboard::cli::{Cli, Command};
use coin_dashboard::config::Config;
use coin_dashboard::dashboard::{refresh_selected, Dashboard, RefreshOutcome};
use coin_dashboard::display;
use coin_dashboard::models::USD;
use coin_dashboard::trading::CoinPair;
use coin_dashboard::{logging, metrics};

fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.debug { LevelFilter::Debug } else { LevelFilter::Info };
    match &cli.log_file {
        Some(path) => logging::init(path, level),
        None => {
            env_logger::Builder::from_default_env()
                .filter_level(level)
                .init();
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => {
            let default_path = std::path::Path::new("config/config.toml");
            if default_path.exists() {
                Config::load(default_path)?
            } else {
                info!("No configuration file found, using defaults");
                Config::default()
            }
        }
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli)?;
    if let Err(e) = metrics::init() {
        warn!("Metrics registry unavailable: {}", e);
    }

    let config = load_config(&cli)?;
    info!("Configuration loaded successfully.");

    let source: Arc<dyn PriceSource> = Arc::new(CoinGeckoClient::new(&config.api)?);
    let dashboard = Dashboard::from_config(source, &config);

    let outcome = run(cli.command, dashboard, &config).await;

    if cli.metrics {
        println!("{}", metrics::render());
    }
    if let Err(e) = &outcome {
        error!("{}", e);
    }
    outcome
}

async fn run(command: Command, mut dashboard: Dashboard, config: &Config) -> Result<()> {
    match command {
        Command::Prices { coins } => {
            let quotes = dashboard
                .source()
                .get_spot_prices(&coins, &[USD.to_string()])
                .await?;
            for coin in &coins {
                if let Some(quote) = quotes.get(coin) {
                    println!(
                        "{:<16} {:>16} {}",
                        coin,
                        display::format_usd(quote.usd_price().unwrap_or_default()),
                        quote
                            .change_24h
                            .map(display::format_trend)
                            .unwrap_or_else(|| "--".to_string())
                    );
                }
            }
        }
        Command::Convert { coin, currency } => {
            let price = dashboard.convert(&coin, &currency).await?;
            println!("1 {} = {} {}", coin.to_uppercase(), price, currency.to_uppercase());
        }
        Command::Search { query } => {
            let hits = dashboard.search(&query).await?;
            if hits.is_empty() {
                println!("No coins match {:?}", query);
            }
            for hit in hits {
                println!("{:<24} {:<8} {}", hit.id, hit.symbol, hit.name);
            }
        }
        Command::History { coin, days } => {
            let history = dashboard.price_history(&coin, days).await?;
            println!("{}", display::history_summary(&history));
        }
        Command::Assets { sort } => {
            refresh_holdings(&mut dashboard).await;
            for key in sort {
                dashboard.activate_filter(key);
            }
            println!("{}", display::render_table(&dashboard.visible_rows()));
        }
        Command::Add { name, volume } => {
            let record = dashboard.add_asset_by_name(&name, volume).await?;
            info!("Added {} {}", record.volume, record.symbol);
            println!("{}", display::render_table(&dashboard.visible_rows()));
        }
        Command::Remove { coin } => {
            let record = dashboard.remove_asset(&coin)?;
            info!("Removed {} {}", record.volume, record.symbol);
            println!("{}", display::render_table(&dashboard.visible_rows()));
        }
        Command::Swap { from, to, amount } => {
            let swap = dashboard.execute_swap(&from, &to, amount).await?;
            println!(
                "{}",
                display::rate_line(&dashboard.symbol_for(&from), &dashboard.symbol_for(&to), &swap)
            );
            println!("{}", display::render_table(&dashboard.visible_rows()));
        }
        Command::Watch { from, to, ticks } => {
            let from = from.unwrap_or_else(|| config.refresh.from_coin.clone());
            let to = to.unwrap_or_else(|| config.refresh.to_coin.clone());
            dashboard.select_pair(CoinPair::new(from, to)?);
            watch(Arc::new(Mutex::new(dashboard)), config, ticks).await;
        }
    }
    Ok(())
}

async fn refresh_holdings(dashboard: &mut Dashboard) {
    if let Err(e) = dashboard.refresh_holdings().await {
        warn!("Showing cached prices, refresh failed: {}", e);
    }
}

/// Scheduled refresh of the selected pair. Results for a pair that was
/// re-selected while the fetch was in flight are dropped.
async fn watch(session: Arc<Mutex<Dashboard>>, config: &Config, ticks: Option<u64>) {
    let mut timer = interval(config.refresh.interval());
    let mut count = 0u64;
    info!("Refreshing every {}s", config.refresh.interval_secs);

    loop {
        timer.tick().await;

        match refresh_selected(&session).await {
            Ok(Some((pair, RefreshOutcome::Applied(rate)))) => {
                let dashboard = session.lock().await;
                println!(
                    "{}",
                    display::rate_line(&dashboard.symbol_for(&pair.from), &dashboard.symbol_for(&pair.to), &rate)
                );
            }
            Ok(Some((_, RefreshOutcome::Superseded))) => info!("Selection changed, refresh discarded"),
            Ok(None) => {
                warn!("No exchange pair selected");
                break;
            }
            Err(e) => warn!("Rate refresh failed, keeping last display: {}", e),
        }

        count += 1;
        if ticks.is_some_and(|limit| count >= limit) {
            break;
        }
    }
}
