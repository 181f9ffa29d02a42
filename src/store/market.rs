use super::snapshot::{Loaded, SnapshotFile, StoreError};
use crate::core::quote::MarketData;
use std::path::Path;
use tracing::{debug, info};

pub const MARKET_FILE: &str = "market.snapshot";
const MARKET_FORMAT: &str = "coinfolio-market";

/// Durable copy of the last successful market refresh.
pub struct MarketDataCache {
    file: SnapshotFile<MarketData>,
}

impl MarketDataCache {
    pub fn new(dir: &Path) -> Self {
        Self {
            file: SnapshotFile::new(dir.join(MARKET_FILE), MARKET_FORMAT),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Restores the persisted snapshot.
    ///
    /// `Missing` and `Corrupt` both mean the caller must fetch; a corrupt file
    /// has already been removed.
    pub fn load(&self) -> Loaded<MarketData> {
        let loaded = self.file.load();
        match &loaded {
            Loaded::Found(market) => debug!(quotes = market.quotes.len(), "Market cache hit"),
            Loaded::Missing => info!("No market cache, a fetch is required"),
            Loaded::Corrupt => info!("Market cache was corrupt, a fetch is required"),
        }
        loaded
    }

    pub fn store(&self, market: &MarketData) -> Result<(), StoreError> {
        self.file.store(market)
    }
}
