use crate::core::portfolio::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Reference currencies the market feed can price in.
pub const SUPPORTED_CURRENCIES: &[&str] = &[
    "USD", "AUD", "BRL", "CAD", "CHF", "CLP", "CNY", "CZK", "DKK", "EUR", "GBP", "HKD", "HUF",
    "IDR", "ILS", "INR", "JPY", "KRW", "MXN", "MYR", "NOK", "NZD", "PHP", "PKR", "PLN", "RUB",
    "SEK", "SGD", "THB", "TRY", "TWD", "ZAR",
];

/// Upper-cases `code` and checks it against [`SUPPORTED_CURRENCIES`].
pub fn normalize_currency(code: &str) -> Result<String, ValidationError> {
    let upper = code.trim().to_uppercase();
    if SUPPORTED_CURRENCIES.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(ValidationError::UnsupportedCurrency(code.to_string()))
    }
}

/// Display symbol for a reference currency. Currencies without a common sign use their code.
pub fn currency_symbol(code: &str) -> &str {
    match code {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" | "CNY" => "¥",
        "INR" => "₹",
        "KRW" => "₩",
        "RUB" => "₽",
        "TRY" => "₺",
        "ILS" => "₪",
        "PHP" => "₱",
        "THB" => "฿",
        "BRL" => "R$",
        "AUD" => "A$",
        "CAD" => "C$",
        "NZD" => "NZ$",
        "HKD" => "HK$",
        "SGD" => "S$",
        "MXN" => "MX$",
        other => other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Theme::Light => "light",
                Theme::Dark => "dark",
            }
        )
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(anyhow::anyhow!("Invalid theme: {}", s)),
        }
    }
}

/// User-mutable settings, persisted separately from the YAML configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub theme: Theme,
    pub currency: String,
}

impl Settings {
    pub fn with_currency(currency: &str) -> Self {
        Self {
            theme: Theme::default(),
            currency: normalize_currency(currency).unwrap_or_else(|_| "USD".to_string()),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_currency("USD")
    }
}
