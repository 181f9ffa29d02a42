//! Portfolios, holdings and the validation rules guarding their mutation.

use crate::core::convert::{format_amount, format_price};
use crate::core::quote::AssetQuote;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PORTFOLIO_NAME: &str = "Main";

/// Rejections reported to the caller before any state is mutated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("A portfolio named '{0}' already exists")]
    DuplicateName(String),

    #[error("Cannot delete the last remaining portfolio")]
    LastPortfolioDelete,

    #[error("Portfolio name cannot be empty")]
    EmptyName,

    #[error("No portfolio at index {0}")]
    NoSuchPortfolio(usize),

    #[error("No holding at index {0}")]
    NoSuchHolding(usize),

    #[error("Invalid amount '{0}': must be a number greater than zero")]
    InvalidAmount(String),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Market data is priced in {market}, not {reference}. Refresh first")]
    StaleMarket { market: String, reference: String },
}

/// Parses user input into a holding amount.
pub fn parse_amount(input: &str) -> Result<f64, ValidationError> {
    let amount: f64 = input
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidAmount(input.to_string()))?;
    validate_amount(amount)
}

pub fn validate_amount(amount: f64) -> Result<f64, ValidationError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(ValidationError::InvalidAmount(amount.to_string()))
    }
}

/// One portfolio line.
///
/// `quote` is the display copy of the asset taken when the holding was added
/// and refreshed whenever it reconciles against a live quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub quote: AssetQuote,
    pub amount_held: f64,
    pub cost_basis_currency: String,
    pub cost_basis_unit_price: f64,
    pub cost_basis_total_value: f64,
    pub price_at_last_revaluation: f64,
    pub current_unit_price: f64,
    pub current_value: f64,
    pub current_gain: f64,
}

impl Holding {
    /// Records a new holding of `amount` units of `quote`, denominated in `currency`.
    ///
    /// The cost basis is `unit_price` when given, otherwise the live quote price.
    pub fn new(
        quote: &AssetQuote,
        amount: f64,
        currency: &str,
        unit_price: Option<f64>,
    ) -> Result<Self, ValidationError> {
        let amount_held = validate_amount(amount)?;
        let cost_basis_unit_price = match unit_price {
            Some(price) if price.is_finite() && price >= 0.0 => price,
            Some(price) => return Err(ValidationError::InvalidAmount(price.to_string())),
            None => quote.price,
        };
        let cost_basis_total_value = cost_basis_unit_price * amount_held;
        let current_value = quote.price * amount_held;

        Ok(Self {
            quote: quote.clone(),
            amount_held,
            cost_basis_currency: currency.to_string(),
            cost_basis_unit_price,
            cost_basis_total_value,
            price_at_last_revaluation: quote.price,
            current_unit_price: quote.price,
            current_value,
            current_gain: current_value - cost_basis_total_value,
        })
    }

    pub fn name(&self) -> &str {
        &self.quote.name
    }

    /// Changes the amount held, keeping the recorded unit cost.
    pub fn set_amount(&mut self, amount: f64) -> Result<(), ValidationError> {
        self.amount_held = validate_amount(amount)?;
        self.cost_basis_total_value = self.cost_basis_unit_price * self.amount_held;
        Ok(())
    }

    pub fn info(&self, currency: &str) -> String {
        format!(
            "{}\n\nPortfolio Amount: {}\nPortfolio Value: {}\nPortfolio Gains: {}\n\nPortfolio Currency: {}\nPortfolio Price Start: {}\nPortfolio Value Start: {}",
            self.quote.info(currency),
            format_price(self.amount_held),
            format_amount(self.current_value),
            format_amount(self.current_gain),
            self.cost_basis_currency,
            format_amount(self.cost_basis_unit_price),
            format_amount(self.cost_basis_total_value),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub name: String,
    pub holdings: Vec<Holding>,
}

impl Portfolio {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            holdings: Vec::new(),
        }
    }

    pub fn holding_mut(&mut self, index: usize) -> Result<&mut Holding, ValidationError> {
        self.holdings
            .get_mut(index)
            .ok_or(ValidationError::NoSuchHolding(index))
    }

    pub fn remove_holding(&mut self, index: usize) -> Result<Holding, ValidationError> {
        if index >= self.holdings.len() {
            return Err(ValidationError::NoSuchHolding(index));
        }
        Ok(self.holdings.remove(index))
    }
}

/// All portfolios plus the index of the active one. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioBook {
    portfolios: Vec<Portfolio>,
    active: usize,
}

impl Default for PortfolioBook {
    fn default() -> Self {
        Self {
            portfolios: vec![Portfolio::new(DEFAULT_PORTFOLIO_NAME)],
            active: 0,
        }
    }
}

impl PortfolioBook {
    /// Restores the book invariants after decoding data of unknown provenance.
    pub fn ensure_invariants(mut self) -> Self {
        if self.portfolios.is_empty() {
            return Self::default();
        }
        if self.active >= self.portfolios.len() {
            self.active = 0;
        }
        self
    }

    pub fn portfolios(&self) -> &[Portfolio] {
        &self.portfolios
    }

    pub fn portfolios_mut(&mut self) -> &mut [Portfolio] {
        &mut self.portfolios
    }

    pub fn len(&self) -> usize {
        self.portfolios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.portfolios.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &Portfolio {
        &self.portfolios[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Portfolio {
        &mut self.portfolios[self.active]
    }

    /// Checks `name` against every portfolio except the one at `except`.
    fn validate_name(&self, name: &str, except: Option<usize>) -> Result<String, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let taken = self
            .portfolios
            .iter()
            .enumerate()
            .any(|(i, p)| Some(i) != except && p.name == name);
        if taken {
            return Err(ValidationError::DuplicateName(name.to_string()));
        }
        Ok(name.to_string())
    }

    /// Appends a new empty portfolio and returns its index.
    pub fn create(&mut self, name: &str) -> Result<usize, ValidationError> {
        let name = self.validate_name(name, None)?;
        self.portfolios.push(Portfolio::new(name));
        Ok(self.portfolios.len() - 1)
    }

    pub fn rename(&mut self, index: usize, name: &str) -> Result<(), ValidationError> {
        if index >= self.portfolios.len() {
            return Err(ValidationError::NoSuchPortfolio(index));
        }
        let name = self.validate_name(name, Some(index))?;
        self.portfolios[index].name = name;
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> Result<Portfolio, ValidationError> {
        if index >= self.portfolios.len() {
            return Err(ValidationError::NoSuchPortfolio(index));
        }
        if self.portfolios.len() == 1 {
            return Err(ValidationError::LastPortfolioDelete);
        }
        let removed = self.portfolios.remove(index);
        if self.active > index || self.active >= self.portfolios.len() {
            self.active = self.active.saturating_sub(1);
        }
        Ok(removed)
    }

    pub fn select(&mut self, index: usize) -> Result<(), ValidationError> {
        if index >= self.portfolios.len() {
            return Err(ValidationError::NoSuchPortfolio(index));
        }
        self.active = index;
        Ok(())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.portfolios.iter().position(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::quote::tests::quote;

    #[test]
    fn test_new_holding_records_cost_basis() {
        let btc = quote("Bitcoin", "btc", 100.0);
        let holding = Holding::new(&btc, 10.0, "USD", None).unwrap();
        assert_eq!(holding.cost_basis_currency, "USD");
        assert_eq!(holding.cost_basis_unit_price, 100.0);
        assert_eq!(holding.cost_basis_total_value, 1000.0);
        assert_eq!(holding.price_at_last_revaluation, 100.0);
        assert_eq!(holding.current_value, 1000.0);
        assert_eq!(holding.current_gain, 0.0);

        let bought_cheaper = Holding::new(&btc, 10.0, "USD", Some(90.0)).unwrap();
        assert_eq!(bought_cheaper.cost_basis_total_value, 900.0);
        assert_eq!(bought_cheaper.current_gain, 100.0);
    }

    #[test]
    fn test_amount_validation() {
        let btc = quote("Bitcoin", "btc", 100.0);
        assert!(Holding::new(&btc, 0.0, "USD", None).is_err());
        assert!(Holding::new(&btc, -1.0, "USD", None).is_err());
        assert!(Holding::new(&btc, f64::NAN, "USD", None).is_err());
        assert!(Holding::new(&btc, 1.0, "USD", Some(-5.0)).is_err());

        assert_eq!(parse_amount(" 2.5 "), Ok(2.5));
        assert_eq!(
            parse_amount("abc"),
            Err(ValidationError::InvalidAmount("abc".to_string()))
        );
        assert!(parse_amount("-3").is_err());
        assert!(parse_amount("0").is_err());
    }

    #[test]
    fn test_set_amount_rederives_cost_basis_total() {
        let btc = quote("Bitcoin", "btc", 100.0);
        let mut holding = Holding::new(&btc, 1.0, "USD", Some(80.0)).unwrap();
        holding.set_amount(4.0).unwrap();
        assert_eq!(holding.cost_basis_total_value, 320.0);
        assert!(holding.set_amount(0.0).is_err());
        assert_eq!(holding.amount_held, 4.0);
    }

    #[test]
    fn test_info_groups_portfolio_values() {
        let btc = quote("Bitcoin", "btc", 64_123.456);
        let holding = Holding::new(&btc, 2.0, "USD", Some(50_000.0)).unwrap();
        let info = holding.info("USD");

        assert!(info.contains("Name: Bitcoin"));
        assert!(info.contains("Portfolio Amount: 2\n"));
        assert!(info.contains("Portfolio Value: 128,246.91\n"));
        assert!(info.contains("Portfolio Gains: 28,246.91\n"));
        assert!(info.contains("Portfolio Currency: USD\n"));
        assert!(info.contains("Portfolio Price Start: 50,000\n"));
        assert!(info.ends_with("Portfolio Value Start: 100,000"));
    }

    #[test]
    fn test_delete_last_portfolio_rejected() {
        let mut book = PortfolioBook::default();
        assert_eq!(book.delete(0), Err(ValidationError::LastPortfolioDelete));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_delete_one_of_many() {
        let mut book = PortfolioBook::default();
        book.create("Alt").unwrap();
        book.create("Long").unwrap();
        book.select(2).unwrap();

        let removed = book.delete(0).unwrap();
        assert_eq!(removed.name, DEFAULT_PORTFOLIO_NAME);
        assert_eq!(book.len(), 2);
        // Active portfolio is still "Long"
        assert_eq!(book.active().name, "Long");

        book.delete(1).unwrap();
        assert_eq!(book.active_index(), 0);
        assert_eq!(book.active().name, "Alt");
    }

    #[test]
    fn test_create_rejects_duplicates() {
        let mut book = PortfolioBook::default();
        assert_eq!(
            book.create("Main"),
            Err(ValidationError::DuplicateName("Main".to_string()))
        );
        // Case-sensitive
        assert_eq!(book.create("main"), Ok(1));
        assert_eq!(book.create("  "), Err(ValidationError::EmptyName));
    }

    #[test]
    fn test_rename_rules() {
        let mut book = PortfolioBook::default();
        book.create("Existing Name").unwrap();

        assert_eq!(
            book.rename(0, "Existing Name"),
            Err(ValidationError::DuplicateName("Existing Name".to_string()))
        );
        assert_eq!(book.rename(1, "Existing Name"), Ok(()));
        assert_eq!(book.rename(0, "Savings"), Ok(()));
        assert_eq!(book.portfolios()[0].name, "Savings");
        assert_eq!(
            book.rename(5, "Other"),
            Err(ValidationError::NoSuchPortfolio(5))
        );
    }

    #[test]
    fn test_select_out_of_range() {
        let mut book = PortfolioBook::default();
        assert_eq!(book.select(1), Err(ValidationError::NoSuchPortfolio(1)));
        assert_eq!(book.active_index(), 0);
    }

    #[test]
    fn test_ensure_invariants() {
        let empty = PortfolioBook {
            portfolios: Vec::new(),
            active: 3,
        };
        assert_eq!(empty.ensure_invariants(), PortfolioBook::default());

        let stale = PortfolioBook {
            portfolios: vec![Portfolio::new("A"), Portfolio::new("B")],
            active: 7,
        };
        assert_eq!(stale.ensure_invariants().active_index(), 0);
    }

    #[test]
    fn test_remove_holding() {
        let mut portfolio = Portfolio::new("Main");
        portfolio
            .holdings
            .push(Holding::new(&quote("Bitcoin", "btc", 1.0), 1.0, "USD", None).unwrap());
        assert_eq!(
            portfolio.remove_holding(3),
            Err(ValidationError::NoSuchHolding(3))
        );
        assert_eq!(portfolio.remove_holding(0).unwrap().name(), "Bitcoin");
        assert!(portfolio.holdings.is_empty());
    }
}
