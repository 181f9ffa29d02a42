//! Reconciles holdings against live quotes and aggregates portfolio totals.
use crate::core::convert::{convert, format_percent};
use crate::core::portfolio::{Holding, Portfolio};
use crate::core::quote::AssetQuote;
use tracing::debug;

/// Whether a total gain should be presented as a gain or a loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainClass {
    NonNegative,
    Negative,
}

impl GainClass {
    pub fn of(gain: f64) -> Self {
        if gain < 0.0 {
            GainClass::Negative
        } else {
            GainClass::NonNegative
        }
    }
}

/// Renderable totals for one portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSummary {
    pub name: String,
    pub currency: String,
    pub total_value: f64,
    pub total_gain: f64,
    pub total_gain_percent: f64,
    pub gain_class: GainClass,
    /// Holdings that found no live quote by name in the last revaluation.
    pub unmatched: Vec<String>,
}

impl PortfolioSummary {
    pub fn gain_percent_label(&self) -> String {
        format_percent(self.total_gain_percent)
    }
}

/// Refreshes one holding from `quote`.
///
/// Holdings recorded in another currency have their own unit price rescaled by
/// the relative move of the quote since the last revaluation.
pub fn revalue_holding(holding: &mut Holding, quote: &AssetQuote, reference_currency: &str) {
    holding.current_unit_price = if holding.cost_basis_currency == reference_currency {
        quote.price
    } else {
        convert(
            holding.cost_basis_unit_price,
            quote.price,
            holding.price_at_last_revaluation,
        )
    };
    holding.current_value = holding.current_unit_price * holding.amount_held;
    holding.current_gain = holding.current_value - holding.cost_basis_total_value;
    holding.price_at_last_revaluation = quote.price;
    holding.quote = quote.clone();
}

/// Gain relative to the invested total, zero when nothing was invested.
pub fn gain_percent(total_value: f64, total_gain: f64) -> f64 {
    let invested = total_value - total_gain;
    if invested == 0.0 {
        return 0.0;
    }
    total_gain / invested * 100.0
}

/// Totals for a portfolio as it currently stands, without touching prices.
pub fn summarize(portfolio: &Portfolio, reference_currency: &str) -> PortfolioSummary {
    let total_value: f64 = portfolio.holdings.iter().map(|h| h.current_value).sum();
    let total_gain: f64 = portfolio.holdings.iter().map(|h| h.current_gain).sum();

    PortfolioSummary {
        name: portfolio.name.clone(),
        currency: reference_currency.to_string(),
        total_value,
        total_gain,
        total_gain_percent: gain_percent(total_value, total_gain),
        gain_class: GainClass::of(total_gain),
        unmatched: Vec::new(),
    }
}

/// Matches every holding to the first quote with the same name and recomputes
/// its derived fields. Holdings without a match keep their previous values.
pub fn revalue(
    portfolio: &mut Portfolio,
    quotes: &[AssetQuote],
    reference_currency: &str,
) -> PortfolioSummary {
    let mut unmatched = Vec::new();

    for holding in &mut portfolio.holdings {
        match quotes.iter().find(|q| q.name == holding.quote.name) {
            Some(quote) => revalue_holding(holding, quote, reference_currency),
            None => {
                debug!(
                    portfolio = %portfolio.name,
                    asset = %holding.quote.name,
                    "No live quote for holding, keeping previous values"
                );
                unmatched.push(holding.quote.name.clone());
            }
        }
    }

    let mut summary = summarize(portfolio, reference_currency);
    summary.unmatched = unmatched;
    summary
}
