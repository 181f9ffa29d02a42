pub mod market;
pub mod snapshot;

use crate::core::portfolio::PortfolioBook;
use crate::core::quote::MarketData;
use crate::core::settings::Settings;
use crate::core::state::AppState;
use market::MarketDataCache;
use snapshot::{Loaded, SnapshotFile, StoreError};
use std::path::Path;
use tracing::{info, warn};

pub const PORTFOLIOS_FILE: &str = "portfolios.snapshot";
pub const SETTINGS_FILE: &str = "settings.snapshot";

/// The three snapshot files kept under the data directory.
pub struct Stores {
    pub market: MarketDataCache,
    pub portfolios: SnapshotFile<PortfolioBook>,
    pub settings: SnapshotFile<Settings>,
}

/// State restored at startup.
pub struct Bootstrap {
    pub state: AppState,
    /// The market cache was missing, corrupt or priced in another currency.
    /// A fetch should run before use.
    pub needs_fetch: bool,
}

impl Stores {
    pub fn open(dir: &Path) -> Self {
        Self {
            market: MarketDataCache::new(dir),
            portfolios: SnapshotFile::new(dir.join(PORTFOLIOS_FILE), "coinfolio-portfolios"),
            settings: SnapshotFile::new(dir.join(SETTINGS_FILE), "coinfolio-settings"),
        }
    }

    /// Restores settings, then the market table, then portfolios, then values them.
    pub fn bootstrap(&self, default_currency: &str) -> Bootstrap {
        let settings = match self.settings.load() {
            Loaded::Found(settings) => settings,
            outcome => {
                info!(?outcome, "Using default settings");
                Settings::with_currency(default_currency)
            }
        };

        let (market, needs_fetch) = match self.market.load() {
            Loaded::Found(market) if market.is_priced_in(&settings.currency) => (market, false),
            Loaded::Found(market) => {
                info!(
                    cached = %market.currency,
                    reference = %settings.currency,
                    "Cached market table is priced in another currency"
                );
                (market, true)
            }
            Loaded::Missing | Loaded::Corrupt => (MarketData::default(), true),
        };

        let book = self.portfolios.load().into_option().unwrap_or_else(|| {
            info!("Starting with an empty portfolio book");
            PortfolioBook::default()
        });

        Bootstrap {
            state: AppState::new(settings, market, book),
            needs_fetch,
        }
    }

    /// Persists settings and portfolios.
    pub fn save_user_data(&self, state: &AppState) -> Result<(), StoreError> {
        self.settings.store(&state.settings)?;
        self.portfolios.store(&state.book)?;
        Ok(())
    }

    pub fn save_portfolios(&self, book: &PortfolioBook) {
        if let Err(e) = self.portfolios.store(book) {
            warn!("Failed to persist portfolios: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::quote::GlobalSnapshot;
    use crate::core::quote::tests::quote;
    use crate::core::settings::Theme;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_bootstrap_from_empty_directory() {
        let dir = tempdir().unwrap();
        let stores = Stores::open(dir.path());
        let boot = stores.bootstrap("eur");

        assert!(boot.needs_fetch);
        assert_eq!(boot.state.currency(), "EUR");
        assert_eq!(boot.state.book, PortfolioBook::default());
        assert!(boot.state.market.is_empty());
    }

    #[test]
    fn test_bootstrap_restores_and_revalues() {
        let dir = tempdir().unwrap();
        let stores = Stores::open(dir.path());

        let mut state = stores.bootstrap("USD").state;
        state.apply_market(MarketData::new(
            "USD",
            GlobalSnapshot::default(),
            vec![quote("Bitcoin", "btc", 100.0)],
        ));
        state.add_holding("Bitcoin", 2.0, None).unwrap();
        state.set_theme(Theme::Dark);
        stores.save_user_data(&state).unwrap();

        // Price moved while the app was closed
        stores
            .market
            .store(&MarketData::new(
                "USD",
                GlobalSnapshot::default(),
                vec![quote("Bitcoin", "btc", 150.0)],
            ))
            .unwrap();

        let boot = stores.bootstrap("USD");
        assert!(!boot.needs_fetch);
        assert_eq!(boot.state.settings.theme, Theme::Dark);
        let summary = boot.state.active_summary();
        assert_eq!(summary.total_value, 300.0);
        assert_eq!(summary.total_gain, 100.0);
    }

    #[test]
    fn test_bootstrap_with_cache_in_other_currency_needs_fetch() {
        let dir = tempdir().unwrap();
        let stores = Stores::open(dir.path());

        let mut state = stores.bootstrap("USD").state;
        state.apply_market(MarketData::new(
            "USD",
            GlobalSnapshot::default(),
            vec![quote("Bitcoin", "btc", 50_000.0)],
        ));
        state.add_holding("Bitcoin", 1.0, Some(40_000.0)).unwrap();
        state.set_currency("EUR").unwrap();
        stores.save_user_data(&state).unwrap();
        stores.market.store(&state.market).unwrap();

        let boot = stores.bootstrap("USD");
        assert!(boot.needs_fetch);
        assert_eq!(boot.state.currency(), "EUR");
        assert!(boot.state.market.is_priced_in("USD"));
        let summary = boot.state.active_summary();
        assert_eq!(summary.total_value, 50_000.0);
        assert_eq!(summary.total_gain, 10_000.0);
    }

    #[test]
    fn test_corrupt_portfolio_file_falls_back_to_default_book() {
        let dir = tempdir().unwrap();
        let stores = Stores::open(dir.path());
        fs::write(stores.portfolios.path(), "not a snapshot").unwrap();

        let boot = stores.bootstrap("USD");
        assert_eq!(boot.state.book, PortfolioBook::default());
        assert!(!stores.portfolios.path().exists());
    }
}
