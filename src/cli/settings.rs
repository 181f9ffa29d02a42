use crate::core::settings::Theme;
use crate::core::state::AppState;
use anyhow::Result;

/// Switches the reference currency. Values stay in the old currency until prices in the new one arrive.
pub fn set_currency(state: &mut AppState, code: &str) -> Result<String> {
    state.set_currency(code)?;
    Ok(format!("Reference currency set to {}", state.currency()))
}

pub fn set_theme(state: &mut AppState, theme: &str) -> Result<String> {
    let theme: Theme = theme.parse()?;
    state.set_theme(theme);
    Ok(format!("Theme set to {theme}"))
}
