use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::Mutex;

use crate::api::PriceSource;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::metrics::SWAPS;
use crate::models::{AssetMetadata, AssetRecord, CoinPrice, CoinSearchHit, PriceHistory, SwapResult, USD};
use crate::trading::{
    ActiveFilterSet, AssetLedger, AssetSorter, CoinPair, DeltaOutcome, PairSelection,
    RateCalculator, RefreshTicket, SortKey,
};
use crate::utils::{HistoryCache, PriceCache};
use crate::validation::{validate_amount, validate_coin_id, validate_pair};

/// Result of applying a background rate refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Prices were stored; carries the current one-unit rate of the pair.
    Applied(SwapResult),
    /// The selection changed while the fetch was in flight.
    Superseded,
}

/// Work needed to refresh the selected pair: which fetch it belongs to and
/// which of its coins are stale.
#[derive(Debug, Clone)]
pub struct RefreshPlan {
    pub ticket: RefreshTicket,
    pub stale: Vec<String>,
}

/// One dashboard session: price cache, ledger, table filters and the pair
/// selected for exchange, backed by a [`PriceSource`].
///
/// All state changes happen in synchronous methods. The async methods only
/// await the price source before they start mutating, so a swap never
/// observes prices that change between calculation and bookkeeping.
pub struct Dashboard {
    source: Arc<dyn PriceSource>,
    prices: PriceCache,
    histories: HistoryCache,
    ledger: AssetLedger,
    filters: ActiveFilterSet,
    selection: PairSelection,
    directory: HashMap<String, AssetMetadata>,
}

impl Dashboard {
    pub fn new(source: Arc<dyn PriceSource>, ttl: Duration) -> Self {
        Self {
            source,
            prices: PriceCache::new(ttl),
            histories: HistoryCache::new(ttl),
            ledger: AssetLedger::new(),
            filters: ActiveFilterSet::new(),
            selection: PairSelection::new(),
            directory: HashMap::new(),
        }
    }

    /// Builds a session seeded with the holdings listed in the config.
    pub fn from_config(source: Arc<dyn PriceSource>, config: &Config) -> Self {
        let mut dashboard = Self::new(source, config.cache.ttl());
        let seeds: Vec<AssetRecord> = config
            .portfolio
            .holdings
            .iter()
            .map(|holding| {
                let metadata = holding.metadata();
                dashboard
                    .directory
                    .insert(holding.coin_id.clone(), metadata.clone());
                AssetRecord::from_metadata(holding.coin_id.clone(), holding.volume, metadata)
            })
            .collect();
        dashboard.ledger = AssetLedger::from_records(seeds);
        match CoinPair::new(&config.refresh.from_coin, &config.refresh.to_coin) {
            Ok(pair) => dashboard.select_pair(pair),
            Err(e) => warn!("Ignoring configured exchange pair: {}", e),
        }
        info!("Dashboard seeded with {} holdings", dashboard.ledger.len());
        dashboard
    }

    pub fn source(&self) -> Arc<dyn PriceSource> {
        Arc::clone(&self.source)
    }

    pub fn ledger(&self) -> &AssetLedger {
        &self.ledger
    }

    pub fn prices(&self) -> &PriceCache {
        &self.prices
    }

    pub fn filters(&self) -> &ActiveFilterSet {
        &self.filters
    }

    pub fn toggle_filter(&mut self, key: SortKey) -> bool {
        self.filters.toggle(key)
    }

    pub fn activate_filter(&mut self, key: SortKey) -> bool {
        self.filters.activate(key)
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    /// Ledger rows ordered by the active filters.
    pub fn visible_rows(&self) -> Vec<AssetRecord> {
        AssetSorter::sort(self.ledger.list_visible(), &self.filters)
    }

    pub fn asset_count(&self) -> usize {
        self.ledger.len()
    }

    /// Remembers the display name and symbol of a coin.
    pub fn register_coin(&mut self, coin_id: &str, name: &str, symbol: &str) {
        self.directory
            .insert(coin_id.to_string(), AssetMetadata::new(name, symbol));
    }

    /// Metadata for a coin entering the ledger, enriched with its cached price.
    pub fn metadata_for(&self, coin_id: &str) -> AssetMetadata {
        let metadata = self
            .directory
            .get(coin_id)
            .cloned()
            .unwrap_or_else(|| AssetMetadata::placeholder(coin_id));
        match self.prices.get(coin_id) {
            Some(price) => metadata.with_price(&price),
            None => metadata,
        }
    }

    pub fn symbol_for(&self, coin_id: &str) -> String {
        self.ledger
            .get(coin_id)
            .map(|r| r.symbol.clone())
            .unwrap_or_else(|| self.metadata_for(coin_id).symbol)
    }

    /// Caches fetched quotes and refreshes the price columns of held coins.
    pub fn store_prices(&mut self, prices: HashMap<String, CoinPrice>) {
        for (coin_id, price) in prices {
            self.ledger.update_market(&price);
            self.prices.set(coin_id, price);
        }
    }

    /// Fetches the coins among `coin_ids` whose cached price is missing or stale.
    pub async fn ensure_prices(&mut self, coin_ids: &[&str]) -> Result<()> {
        let stale: Vec<String> = self
            .prices
            .stale_keys(coin_ids)
            .into_iter()
            .map(str::to_string)
            .collect();
        if stale.is_empty() {
            debug!("Prices for {:?} are fresh", coin_ids);
            return Ok(());
        }
        let fetched = self
            .source
            .get_spot_prices(&stale, &[USD.to_string()])
            .await?;
        self.store_prices(fetched);
        Ok(())
    }

    /// Fetches prices for every held coin, stale or not.
    pub async fn refresh_holdings(&mut self) -> Result<()> {
        let ids: Vec<String> = self
            .ledger
            .list_visible()
            .iter()
            .map(|r| r.coin_id.clone())
            .collect();
        if ids.is_empty() {
            return Ok(());
        }
        let fetched = self.source.get_spot_prices(&ids, &[USD.to_string()]).await?;
        self.store_prices(fetched);
        Ok(())
    }

    pub async fn calculate_swap(&mut self, from: &str, to: &str, from_amount: f64) -> Result<SwapResult> {
        validate_pair(from, to)?;
        validate_amount(from_amount)?;
        self.ensure_prices(&[from, to]).await?;
        RateCalculator::calculate_swap(&self.prices, from, to, from_amount)
    }

    /// Simulated swap. Input checks run before any fetch; once prices are
    /// fresh the calculation and both ledger updates run without yielding.
    pub async fn execute_swap(&mut self, from: &str, to: &str, from_amount: f64) -> Result<SwapResult> {
        validate_pair(from, to)?;
        validate_amount(from_amount)?;
        let held = self
            .ledger
            .get(from)
            .map(|r| r.volume)
            .ok_or_else(|| Error::RecordNotFound(from.to_string()))?;
        if held < from_amount {
            return Err(Error::InsufficientBalance {
                coin_id: from.to_string(),
                held,
                requested: from_amount,
            });
        }

        self.ensure_prices(&[from, to]).await?;

        let to_metadata = self.metadata_for(to);
        let swap = self
            .ledger
            .execute_swap(&self.prices, from, to, from_amount, Some(to_metadata))?;
        SWAPS.inc();
        Ok(swap)
    }

    pub fn selected_pair(&self) -> Option<&CoinPair> {
        self.selection.current()
    }

    pub fn select_pair(&mut self, pair: CoinPair) {
        self.selection.select(pair);
    }

    /// What the scheduled refresh should fetch for the selected pair.
    pub fn plan_refresh(&self) -> Option<RefreshPlan> {
        let ticket = self.selection.ticket()?;
        let stale = self
            .prices
            .stale_keys(&ticket.pair.ids())
            .into_iter()
            .map(str::to_string)
            .collect();
        Some(RefreshPlan { ticket, stale })
    }

    /// Applies prices fetched for `ticket`. Results for a pair that is no
    /// longer selected are dropped.
    pub fn apply_refresh(
        &mut self,
        ticket: &RefreshTicket,
        prices: HashMap<String, CoinPrice>,
    ) -> Result<RefreshOutcome> {
        if !self.selection.is_current(ticket) {
            debug!(
                "Dropping refresh for {} -> {}, selection changed",
                ticket.pair.from, ticket.pair.to
            );
            return Ok(RefreshOutcome::Superseded);
        }
        self.store_prices(prices);
        let rate = RateCalculator::quote_rate(&self.prices, &ticket.pair.from, &ticket.pair.to)?;
        Ok(RefreshOutcome::Applied(rate))
    }

    /// Price of one coin in another currency.
    pub async fn convert(&self, coin_id: &str, currency: &str) -> Result<f64> {
        validate_coin_id(coin_id)?;
        let currency = currency.to_lowercase();
        let ids = vec![coin_id.to_string()];
        let quotes = self
            .source
            .get_spot_prices(&ids, std::slice::from_ref(&currency))
            .await?;
        quotes
            .get(coin_id)
            .and_then(|quote| quote.price_in(&currency))
            .ok_or_else(|| {
                Error::InvalidResponseShape(format!("No {} price for {}", currency, coin_id))
            })
    }

    pub async fn search(&mut self, query: &str) -> Result<Vec<CoinSearchHit>> {
        let hits = self.source.search_by_name(query).await?;
        for hit in &hits {
            self.directory
                .entry(hit.id.clone())
                .or_insert_with(|| AssetMetadata::new(&hit.name, &hit.symbol));
        }
        Ok(hits)
    }

    /// Credits `volume` of a coin identified by id, fetching its price first.
    pub async fn add_asset(&mut self, coin_id: &str, volume: f64) -> Result<DeltaOutcome> {
        validate_coin_id(coin_id)?;
        validate_amount(volume)?;
        self.ensure_prices(&[coin_id]).await?;
        let metadata = self.metadata_for(coin_id);
        self.ledger.apply_delta(coin_id, volume, Some(metadata))
    }

    /// Looks a coin up by name and credits `volume` of the best match.
    pub async fn add_asset_by_name(&mut self, query: &str, volume: f64) -> Result<AssetRecord> {
        validate_amount(volume)?;
        let hits = self.search(query).await?;
        let hit = hits
            .into_iter()
            .next()
            .ok_or_else(|| Error::CoinNotFound(query.to_string()))?;
        self.register_coin(&hit.id, &hit.name, &hit.symbol);
        self.add_asset(&hit.id, volume).await?;
        self.ledger
            .get(&hit.id)
            .cloned()
            .ok_or_else(|| Error::RecordNotFound(hit.id.clone()))
    }

    pub fn remove_asset(&mut self, coin_id: &str) -> Result<AssetRecord> {
        self.ledger.remove(coin_id)
    }

    /// USD series for a coin, served from the history cache while fresh.
    pub async fn price_history(&mut self, coin_id: &str, days: u32) -> Result<PriceHistory> {
        validate_coin_id(coin_id)?;
        let key = format!("{}:{}", coin_id, days);
        if let Some(history) = self.histories.get(&key) {
            debug!("Using cached {}-day history for {}", days, coin_id);
            return Ok(history);
        }
        let history = self.source.get_historical_series(coin_id, days).await?;
        self.histories.set(key, history.clone());
        Ok(history)
    }
}

/// One scheduled refresh of the selected pair on a shared session.
///
/// The lock is released while the fetch is in flight, so the session stays
/// usable; a pair selected in the meantime turns the result into
/// [`RefreshOutcome::Superseded`]. Returns `None` when no pair is selected.
pub async fn refresh_selected(
    session: &Mutex<Dashboard>,
) -> Result<Option<(CoinPair, RefreshOutcome)>> {
    let (plan, source) = {
        let dashboard = session.lock().await;
        (dashboard.plan_refresh(), dashboard.source())
    };
    let Some(plan) = plan else {
        return Ok(None);
    };

    let prices = if plan.stale.is_empty() {
        HashMap::new()
    } else {
        source
            .get_spot_prices(&plan.stale, &[USD.to_string()])
            .await?
    };

    let outcome = session.lock().await.apply_refresh(&plan.ticket, prices)?;
    Ok(Some((plan.ticket.pair, outcome)))
}
