use super::ui;
use crate::core::convert::format_price;
use crate::core::portfolio::ValidationError;
use crate::core::state::AppState;
use anyhow::Result;

/// Converts `amount` between two assets or an asset and the reference currency.
pub fn run(state: &AppState, amount: &str, from: &str, to: &str) -> Result<String> {
    let value: f64 = amount
        .trim()
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| ValidationError::InvalidAmount(amount.to_string()))?;
    let converted = state.convert(value, from, to)?;
    Ok(format!(
        "{} {} = {}",
        format_price(value),
        from,
        ui::style_text(
            &format!("{} {}", format_price(converted), to),
            ui::StyleType::TotalLabel
        )
    ))
}
