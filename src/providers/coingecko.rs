use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::util::{Attempt, with_rate_limit_retry};
use crate::core::config::FeedConfig;
use crate::core::feed::{FetchError, MarketFeed, Sleeper, TokioSleeper};
use crate::core::quote::{AssetQuote, GlobalSnapshot, MarketData};

const USER_AGENT: &str = concat!("coinfolio/", env!("CARGO_PKG_VERSION"));

// Listing entries as returned by /coins/markets. Any numeric field may be null.
#[derive(Deserialize, Debug)]
struct MarketEntry {
    id: String,
    symbol: String,
    name: String,
    market_cap_rank: Option<u32>,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    total_volume: Option<f64>,
    circulating_supply: Option<f64>,
    total_supply: Option<f64>,
    max_supply: Option<f64>,
    price_change_percentage_1h_in_currency: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    price_change_percentage_7d_in_currency: Option<f64>,
    last_updated: Option<String>,
}

impl From<MarketEntry> for AssetQuote {
    fn from(entry: MarketEntry) -> Self {
        AssetQuote {
            id: entry.id,
            name: entry.name,
            symbol: entry.symbol,
            rank: entry.market_cap_rank.unwrap_or_default(),
            price: entry.current_price.unwrap_or_default().max(0.0),
            market_cap: entry.market_cap.unwrap_or_default(),
            volume_24h: entry.total_volume.unwrap_or_default(),
            circulating_supply: entry.circulating_supply.unwrap_or_default(),
            total_supply: entry.total_supply.unwrap_or_default(),
            max_supply: entry.max_supply.unwrap_or_default(),
            percent_change_1h: entry
                .price_change_percentage_1h_in_currency
                .unwrap_or_default(),
            percent_change_24h: entry.price_change_percentage_24h.unwrap_or_default(),
            percent_change_7d: entry
                .price_change_percentage_7d_in_currency
                .unwrap_or_default(),
            last_updated: entry.last_updated.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct GlobalResponse {
    data: GlobalData,
}

// Market cap and volume come keyed by lower-case currency code.
#[derive(Deserialize, Debug)]
struct GlobalData {
    #[serde(default)]
    active_cryptocurrencies: u64,
    #[serde(default)]
    active_assets: u64,
    #[serde(default)]
    markets: u64,
    #[serde(default)]
    total_market_cap: HashMap<String, f64>,
    #[serde(default)]
    total_volume: HashMap<String, f64>,
    #[serde(default)]
    market_cap_percentage: HashMap<String, f64>,
    #[serde(default)]
    updated_at: i64,
}

impl GlobalData {
    fn into_snapshot(self, currency: &str) -> GlobalSnapshot {
        let key = currency.to_lowercase();
        let whole_units = |map: &HashMap<String, f64>| {
            map.get(&key).map_or(0, |v| v.round().max(0.0) as u64)
        };
        GlobalSnapshot {
            total_market_cap: whole_units(&self.total_market_cap),
            total_24h_volume: whole_units(&self.total_volume),
            btc_dominance_percent: self
                .market_cap_percentage
                .get("btc")
                .copied()
                .unwrap_or_default(),
            active_currencies: self.active_cryptocurrencies,
            active_assets: self.active_assets,
            active_markets: self.markets,
            last_updated: self.updated_at,
        }
    }
}

async fn get_once(client: &reqwest::Client, url: &str) -> Result<Attempt<String>, FetchError> {
    debug!("Requesting {}", url);
    let response = client.get(url).send().await?;
    match response.status() {
        StatusCode::OK => Ok(Attempt::Done(response.text().await?)),
        StatusCode::TOO_MANY_REQUESTS => {
            warn!("Rate limit hit (HTTP 429) for {}", url);
            Ok(Attempt::RateLimited)
        }
        status => Err(FetchError::BadStatus(status.as_u16())),
    }
}

/// Market feed backed by the CoinGecko v3 REST API.
pub struct CoinGeckoFeed {
    base_url: String,
    client: reqwest::Client,
    per_page: u32,
    max_attempts: u32,
    backoff: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl CoinGeckoFeed {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(CoinGeckoFeed {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            per_page: 100,
            max_attempts: 3,
            backoff: Duration::from_secs(5),
            sleeper: Arc::new(TokioSleeper),
        })
    }

    pub fn from_config(config: &FeedConfig) -> Result<Self, FetchError> {
        Ok(Self::new(&config.base_url, config.timeout())?
            .with_retry(config.max_attempts, config.backoff())
            .with_per_page(config.per_page))
    }

    pub fn with_retry(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.backoff = backoff;
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// GETs `url`, retrying on HTTP 429, and returns the body of a 200 response.
    async fn get_body(&self, url: &str) -> Result<String, FetchError> {
        let client = &self.client;
        with_rate_limit_retry(
            move || get_once(client, url),
            self.max_attempts,
            self.backoff,
            self.sleeper.as_ref(),
        )
        .await
    }

    async fn fetch_quotes(&self, currency: &str) -> Result<Vec<AssetQuote>, FetchError> {
        let url = format!(
            "{}/coins/markets?vs_currency={}&order=market_cap_desc&per_page={}&page=1&price_change_percentage=1h,24h,7d",
            self.base_url,
            currency.to_lowercase(),
            self.per_page
        );
        let body = self.get_body(&url).await?;
        let entries: Vec<MarketEntry> = serde_json::from_str(&body)
            .map_err(|e| FetchError::EmptyPayload(format!("market listing ({e})")))?;
        if entries.is_empty() {
            return Err(FetchError::EmptyPayload("market listing".to_string()));
        }
        Ok(entries.into_iter().map(AssetQuote::from).collect())
    }

    async fn fetch_global(&self, currency: &str) -> Result<GlobalSnapshot, FetchError> {
        let url = format!("{}/global", self.base_url);
        let body = self.get_body(&url).await?;
        let response: GlobalResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::EmptyPayload(format!("global stats ({e})")))?;
        Ok(response.data.into_snapshot(currency))
    }
}

#[async_trait]
impl MarketFeed for CoinGeckoFeed {
    #[instrument(name = "CoinGeckoFetch", skip(self), fields(currency = %reference_currency))]
    async fn fetch(&self, reference_currency: &str) -> Result<MarketData, FetchError> {
        let (quotes, global) = futures::future::try_join(
            self.fetch_quotes(reference_currency),
            self.fetch_global(reference_currency),
        )
        .await?;
        debug!(quotes = quotes.len(), "Fetched market data");
        Ok(MarketData::new(reference_currency, global, quotes))
    }
}
