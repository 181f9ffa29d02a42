//! Currency conversion between priced assets and magnitude-adaptive price formatting.

use serde::{Deserialize, Serialize};

/// An asset (or the reference currency itself) together with its unit price
/// expressed in the active reference currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedAsset {
    pub label: String,
    pub unit_price: f64,
}

impl PricedAsset {
    pub fn new(label: impl Into<String>, unit_price: f64) -> Self {
        Self {
            label: label.into(),
            unit_price,
        }
    }
}

fn is_usable_price(price: f64) -> bool {
    price.is_finite() && price != 0.0
}

/// Converts `amount` units of one asset into units of another.
///
/// Returns `0.0` when either price is zero or not a finite number, so callers
/// never see `NaN` or infinities.
pub fn convert(amount: f64, unit_price_from: f64, unit_price_to: f64) -> f64 {
    if !is_usable_price(unit_price_from) || !is_usable_price(unit_price_to) {
        return 0.0;
    }
    let converted = amount * (unit_price_from / unit_price_to);
    if converted.is_finite() { converted } else { 0.0 }
}

/// Converts between two labelled assets.
///
/// A target with a zero price whose label is the reference currency is the
/// reference currency itself, so its unit price is taken as 1.
pub fn convert_between(
    amount: f64,
    from: &PricedAsset,
    to: &PricedAsset,
    reference_currency: &str,
) -> f64 {
    let unit_price_to = if to.unit_price == 0.0 && to.label == reference_currency {
        1.0
    } else {
        to.unit_price
    };
    convert(amount, from.unit_price, unit_price_to)
}

/// Number of decimals shown for a value of the given magnitude.
pub fn precision_for(magnitude: f64) -> usize {
    match magnitude {
        m if m > 1.0 => 2,
        m if m > 0.1 => 3,
        m if m > 0.01 => 4,
        m if m > 0.001 => 5,
        m if m > 0.0001 => 6,
        _ => 12,
    }
}

fn trim_trailing_zeros(mut text: String) -> String {
    if text.contains('.') {
        let trimmed_len = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed_len);
    }
    if text == "-0" { "0".to_string() } else { text }
}

/// Formats a price with precision chosen by its magnitude, trailing zeros stripped.
///
/// ```
/// use coinfolio::core::convert::format_price;
/// assert_eq!(format_price(1.0), "1");
/// assert_eq!(format_price(0.05678), "0.0568");
/// assert_eq!(format_price(-1234.567), "-1234.57");
/// ```
pub fn format_price(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let decimals = precision_for(value.abs());
    trim_trailing_zeros(format!("{value:.decimals$}"))
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Formats a value rounded to whole units with `,` thousands separators.
pub fn format_grouped(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = format!("{:.0}", value.abs());
    let grouped = group_digits(&rounded);
    if value < 0.0 && rounded != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Grouped like [`format_grouped`] but keeps up to two decimals, trailing zeros stripped.
///
/// ```
/// use coinfolio::core::convert::format_amount;
/// assert_eq!(format_amount(1234567.891), "1,234,567.89");
/// assert_eq!(format_amount(-2500.5), "-2,500.5");
/// ```
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');
    let mut formatted = group_digits(whole);
    if !fraction.is_empty() {
        formatted.push('.');
        formatted.push_str(fraction);
    }
    if value < 0.0 && formatted != "0" {
        format!("-{formatted}")
    } else {
        formatted
    }
}

/// Formats a percentage with two decimals, e.g. `12.50%`.
pub fn format_percent(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("{value:.2}%")
}
