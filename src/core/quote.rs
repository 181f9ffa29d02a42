//! Market snapshot types shared by the feed, the cache and the valuation engine.

use crate::core::convert::{PricedAsset, format_grouped, format_price};
use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// One asset's market snapshot.
///
/// Missing supply figures are stored as zero, which is indistinguishable from
/// an unlimited or unknown supply. Do not derive ratios from them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetQuote {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub rank: u32,
    pub price: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    pub circulating_supply: f64,
    pub total_supply: f64,
    pub max_supply: f64,
    pub percent_change_1h: f64,
    pub percent_change_24h: f64,
    pub percent_change_7d: f64,
    pub last_updated: String,
}

impl AssetQuote {
    /// Multi-line description of the quote, prices in `currency`.
    pub fn info(&self, currency: &str) -> String {
        format!(
            "Rank: {}\nID: {}\nName: {}\nSymbol: {}\nPrice {}: {}\nMarket Cap: {}\n24 Hour Volume: {}\nAvailable Supply: {}\nTotal Supply: {}\nMax Supply: {}\nPercent 1 Hour: {}%\nPercent 24 Hour: {}%\nPercent 7 Days: {}%\nLast Updated: {}",
            self.rank,
            self.id,
            self.name,
            self.symbol,
            currency,
            format_price(self.price),
            format_grouped(self.market_cap),
            format_grouped(self.volume_24h),
            format_grouped(self.circulating_supply),
            format_grouped(self.total_supply),
            format_grouped(self.max_supply),
            self.percent_change_1h,
            self.percent_change_24h,
            self.percent_change_7d,
            self.last_updated,
        )
    }
}

/// Aggregate market statistics. All zero when the feed has never been reached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalSnapshot {
    pub total_market_cap: u64,
    pub total_24h_volume: u64,
    pub btc_dominance_percent: f64,
    pub active_currencies: u64,
    pub active_assets: u64,
    pub active_markets: u64,
    /// Unix timestamp in seconds.
    pub last_updated: i64,
}

impl GlobalSnapshot {
    pub fn info(&self) -> String {
        let last_updated = DateTime::from_timestamp(self.last_updated, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| self.last_updated.to_string());
        format!(
            "Total Market Cap: {}\nTotal 24 Hour Volume: {}\nBitcoin Dominance: {}%\nActive Currencies: {}\nActive Assets: {}\nActive Markets: {}\nLast Updated: {}",
            format_grouped(self.total_market_cap as f64),
            format_grouped(self.total_24h_volume as f64),
            format_price(self.btc_dominance_percent),
            self.active_currencies,
            self.active_assets,
            self.active_markets,
            last_updated,
        )
    }
}

/// The current market table: global stats plus quotes in feed rank order.
///
/// Replaced wholesale on every successful refresh, never merged. Every price
/// in it is denominated in `currency`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub currency: String,
    pub global: GlobalSnapshot,
    pub quotes: Vec<AssetQuote>,
}

impl MarketData {
    pub fn new(currency: &str, global: GlobalSnapshot, quotes: Vec<AssetQuote>) -> Self {
        Self {
            currency: currency.to_uppercase(),
            global,
            quotes,
        }
    }

    pub fn is_priced_in(&self, currency: &str) -> bool {
        self.currency.eq_ignore_ascii_case(currency)
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// First quote whose name matches exactly.
    pub fn find_by_name(&self, name: &str) -> Option<&AssetQuote> {
        self.quotes.iter().find(|q| q.name == name)
    }

    /// Looks an asset up by exact name first, then by case-insensitive symbol.
    pub fn find(&self, name_or_symbol: &str) -> Option<&AssetQuote> {
        self.find_by_name(name_or_symbol).or_else(|| {
            self.quotes
                .iter()
                .find(|q| q.symbol.eq_ignore_ascii_case(name_or_symbol))
        })
    }

    /// Quotes whose name or symbol contains `query`, ignoring case, in feed order.
    pub fn search(&self, query: &str) -> Vec<&AssetQuote> {
        let needle = query.to_lowercase();
        self.quotes
            .iter()
            .filter(|q| {
                q.name.to_lowercase().contains(&needle) || q.symbol.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Resolves a conversion endpoint. The reference currency code prices at 1.
    pub fn priced_asset(&self, label: &str, reference_currency: &str) -> Option<PricedAsset> {
        if label.eq_ignore_ascii_case(reference_currency) {
            return Some(PricedAsset::new(reference_currency, 1.0));
        }
        self.find(label)
            .map(|q| PricedAsset::new(q.name.clone(), q.price))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn quote(name: &str, symbol: &str, price: f64) -> AssetQuote {
        AssetQuote {
            id: name.to_lowercase(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            price,
            ..Default::default()
        }
    }

    fn sample() -> MarketData {
        MarketData::new(
            "USD",
            GlobalSnapshot::default(),
            vec![
                quote("Bitcoin", "btc", 50_000.0),
                quote("Ethereum", "eth", 3_000.0),
                quote("Bitcoin Cash", "bch", 300.0),
            ],
        )
    }

    #[test]
    fn test_find_by_name_is_exact_first_match() {
        let market = sample();
        assert_eq!(market.find_by_name("Bitcoin").unwrap().symbol, "btc");
        assert!(market.find_by_name("bitcoin").is_none());
        assert!(market.find_by_name("Bit").is_none());
    }

    #[test]
    fn test_find_falls_back_to_symbol() {
        let market = sample();
        assert_eq!(market.find("ETH").unwrap().name, "Ethereum");
        assert!(market.find("doge").is_none());
    }

    #[test]
    fn test_search_matches_name_or_symbol() {
        let market = sample();
        let names: Vec<_> = market.search("bit").iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["Bitcoin", "Bitcoin Cash"]);
        assert_eq!(market.search("BCH").len(), 1);
        assert!(market.search("solana").is_empty());
    }

    #[test]
    fn test_priced_asset_for_reference_currency() {
        let market = sample();
        let usd = market.priced_asset("usd", "USD").unwrap();
        assert_eq!(usd, PricedAsset::new("USD", 1.0));
        let eth = market.priced_asset("eth", "USD").unwrap();
        assert_eq!(eth, PricedAsset::new("Ethereum", 3_000.0));
        assert!(market.priced_asset("xyz", "USD").is_none());
    }

    #[test]
    fn test_info_blocks() {
        let mut btc = quote("Bitcoin", "btc", 50_000.0);
        btc.rank = 1;
        btc.market_cap = 1_000_000_000.0;
        let info = btc.info("USD");
        assert!(info.contains("Rank: 1"));
        assert!(info.contains("Price USD: 50000"));
        assert!(info.contains("Market Cap: 1,000,000,000"));

        let global = GlobalSnapshot {
            total_market_cap: 2_500_000,
            last_updated: 0,
            ..Default::default()
        };
        let info = global.info();
        assert!(info.contains("Total Market Cap: 2,500,000"));
        assert!(info.contains("1970-01-01"));
    }
}
