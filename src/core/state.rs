//! Explicit application state: settings, the current market table and the portfolio book.
//!
//! Every mutator validates first and re-runs revaluation before returning, so
//! readers never observe holdings priced against a stale table. A table priced
//! in another currency than the reference one is never used for valuation,
//! new holdings or conversions.

use crate::core::convert::convert_between;
use crate::core::portfolio::{Holding, PortfolioBook, ValidationError};
use crate::core::quote::MarketData;
use crate::core::settings::{Settings, Theme, normalize_currency};
use crate::core::valuation::{self, PortfolioSummary};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub settings: Settings,
    pub market: MarketData,
    pub book: PortfolioBook,
}

impl AppState {
    /// Assembles the state and runs the first valuation pass.
    pub fn new(settings: Settings, market: MarketData, book: PortfolioBook) -> Self {
        let mut state = Self {
            settings,
            market,
            book: book.ensure_invariants(),
        };
        state.revalue_all();
        state
    }

    pub fn currency(&self) -> &str {
        &self.settings.currency
    }

    /// True when the market table is missing or priced in another currency.
    pub fn needs_refresh(&self) -> bool {
        self.market.is_empty() || !self.market.is_priced_in(self.currency())
    }

    /// Currency the stored holding values and the market table are denominated in.
    pub fn valuation_currency(&self) -> &str {
        if self.market.is_empty() {
            self.currency()
        } else {
            &self.market.currency
        }
    }

    fn ensure_current_market(&self) -> Result<(), ValidationError> {
        if self.market.is_empty() || self.market.is_priced_in(self.currency()) {
            return Ok(());
        }
        Err(ValidationError::StaleMarket {
            market: self.market.currency.clone(),
            reference: self.currency().to_string(),
        })
    }

    /// Replaces the market table wholesale and revalues every portfolio.
    pub fn apply_market(&mut self, market: MarketData) -> Vec<PortfolioSummary> {
        info!(quotes = market.quotes.len(), "Applying new market snapshot");
        self.market = market;
        self.revalue_all()
    }

    /// Revalues every portfolio. Leaves holdings untouched while the table needs a refresh.
    pub fn revalue_all(&mut self) -> Vec<PortfolioSummary> {
        if self.needs_refresh() {
            debug!(
                market = %self.market.currency,
                reference = %self.currency(),
                "Skipping revaluation until a matching market table is fetched"
            );
            let currency = self.valuation_currency();
            return self
                .book
                .portfolios()
                .iter()
                .map(|p| valuation::summarize(p, currency))
                .collect();
        }
        let currency = self.settings.currency.clone();
        let quotes = &self.market.quotes;
        self.book
            .portfolios_mut()
            .iter_mut()
            .map(|p| valuation::revalue(p, quotes, &currency))
            .collect()
    }

    fn revalue_active(&mut self) -> PortfolioSummary {
        if self.needs_refresh() {
            return self.active_summary();
        }
        let currency = self.settings.currency.clone();
        valuation::revalue(self.book.active_mut(), &self.market.quotes, &currency)
    }

    pub fn active_summary(&self) -> PortfolioSummary {
        valuation::summarize(self.book.active(), self.valuation_currency())
    }

    pub fn add_holding(
        &mut self,
        asset: &str,
        amount: f64,
        unit_price: Option<f64>,
    ) -> Result<PortfolioSummary, ValidationError> {
        self.ensure_current_market()?;
        let quote = self
            .market
            .find(asset)
            .ok_or_else(|| ValidationError::UnknownAsset(asset.to_string()))?;
        let holding = Holding::new(quote, amount, &self.settings.currency, unit_price)?;
        debug!(asset = %holding.name(), amount, "Adding holding");
        self.book.active_mut().holdings.push(holding);
        Ok(self.revalue_active())
    }

    pub fn set_holding_amount(
        &mut self,
        index: usize,
        amount: f64,
    ) -> Result<PortfolioSummary, ValidationError> {
        self.book.active_mut().holding_mut(index)?.set_amount(amount)?;
        Ok(self.revalue_active())
    }

    pub fn remove_holding(&mut self, index: usize) -> Result<PortfolioSummary, ValidationError> {
        let removed = self.book.active_mut().remove_holding(index)?;
        debug!(asset = %removed.name(), "Removed holding");
        Ok(self.revalue_active())
    }

    pub fn create_portfolio(&mut self, name: &str) -> Result<usize, ValidationError> {
        self.book.create(name)
    }

    pub fn rename_portfolio(&mut self, index: usize, name: &str) -> Result<(), ValidationError> {
        self.book.rename(index, name)
    }

    pub fn delete_portfolio(&mut self, index: usize) -> Result<PortfolioSummary, ValidationError> {
        self.book.delete(index)?;
        Ok(self.revalue_active())
    }

    pub fn select_portfolio(&mut self, index: usize) -> Result<PortfolioSummary, ValidationError> {
        self.book.select(index)?;
        Ok(self.revalue_active())
    }

    /// Switches the reference currency.
    ///
    /// The current table stays in the old currency until the next refresh, and
    /// valuation, new holdings and conversions wait for that refresh.
    pub fn set_currency(&mut self, code: &str) -> Result<(), ValidationError> {
        let currency = normalize_currency(code)?;
        if currency != self.settings.currency {
            info!(from = %self.settings.currency, to = %currency, "Reference currency changed");
        }
        self.settings.currency = currency;
        Ok(())
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.settings.theme = theme;
    }

    /// Converts `amount` of one asset (or the reference currency) into another.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, ValidationError> {
        self.ensure_current_market()?;
        let currency = self.currency();
        let from = self
            .market
            .priced_asset(from, currency)
            .ok_or_else(|| ValidationError::UnknownAsset(from.to_string()))?;
        let to = self
            .market
            .priced_asset(to, currency)
            .ok_or_else(|| ValidationError::UnknownAsset(to.to_string()))?;
        Ok(convert_between(amount, &from, &to, currency))
    }
}
