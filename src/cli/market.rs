use super::ui;
use crate::core::convert::{format_grouped, format_price};
use crate::core::quote::AssetQuote;
use crate::core::state::AppState;
use comfy_table::Cell;

const NO_DATA: &str = "No market data available. Run `coinfolio refresh` to fetch it.";

fn quotes_table(quotes: &[&AssetQuote], state: &AppState) -> String {
    let theme = state.settings.theme;
    let currency = &state.market.currency;
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#", theme),
        ui::header_cell("Name", theme),
        ui::header_cell("Symbol", theme),
        ui::header_cell(&format!("Price ({currency})"), theme),
        ui::header_cell("1h", theme),
        ui::header_cell("24h", theme),
        ui::header_cell("7d", theme),
        ui::header_cell(&format!("Market Cap ({currency})"), theme),
    ]);

    for quote in quotes {
        table.add_row(vec![
            ui::right_cell(quote.rank.to_string()),
            Cell::new(&quote.name),
            Cell::new(quote.symbol.to_uppercase()),
            ui::right_cell(format_price(quote.price)),
            ui::change_cell(quote.percent_change_1h),
            ui::change_cell(quote.percent_change_24h),
            ui::change_cell(quote.percent_change_7d),
            ui::right_cell(format_grouped(quote.market_cap)),
        ]);
    }
    table.to_string()
}

/// Renders the top `limit` quotes, or the quotes matching `search`.
///
/// A search with a single hit also prints that asset's full description.
pub fn display_market(state: &AppState, limit: usize, search: Option<&str>) -> String {
    if state.market.is_empty() {
        return ui::style_text(NO_DATA, ui::StyleType::Error);
    }

    let quotes: Vec<&AssetQuote> = match search {
        Some(query) => state.market.search(query),
        None => state.market.quotes.iter().collect(),
    };
    let shown = &quotes[..quotes.len().min(limit)];

    if shown.is_empty() {
        let query = search.unwrap_or_default();
        return ui::style_text(
            &format!("No assets match \"{query}\""),
            ui::StyleType::Subtle,
        );
    }

    let mut output = format!(
        "{}\n\n{}",
        ui::style_text("Market", ui::StyleType::Title),
        quotes_table(shown, state)
    );
    if let [only] = shown {
        output.push_str(&format!("\n\n{}", only.info(&state.market.currency)));
    }
    output
}

pub fn display_global(state: &AppState) -> String {
    if state.market.is_empty() {
        return ui::style_text(NO_DATA, ui::StyleType::Error);
    }
    format!(
        "{} ({})\n\n{}",
        ui::style_text("Global Market", ui::StyleType::Title),
        state.market.currency,
        state.market.global.info()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::portfolio::PortfolioBook;
    use crate::core::quote::tests::quote;
    use crate::core::quote::{GlobalSnapshot, MarketData};
    use crate::core::settings::Settings;

    fn state() -> AppState {
        AppState::new(
            Settings::default(),
            MarketData::new(
                "USD",
                GlobalSnapshot {
                    active_markets: 812,
                    ..Default::default()
                },
                vec![
                    quote("Bitcoin", "btc", 64_000.0),
                    quote("Ethereum", "eth", 3_100.5),
                    quote("Bitcoin Cash", "bch", 240.0),
                ],
            ),
            PortfolioBook::default(),
        )
    }

    #[test]
    fn test_market_table_respects_limit() {
        let output = display_market(&state(), 2, None);
        assert!(output.contains("Bitcoin"));
        assert!(output.contains("ETH"));
        assert!(!output.contains("BCH"));
    }

    #[test]
    fn test_single_search_hit_includes_info() {
        let output = display_market(&state(), 10, Some("ether"));
        assert!(output.contains("ETH"));
        assert!(output.contains("Symbol: eth"));
        assert!(output.contains("Price USD: 3100.5"));
    }

    #[test]
    fn test_search_without_hits() {
        let output = display_market(&state(), 10, Some("doge"));
        assert!(output.contains("No assets match"));
    }

    #[test]
    fn test_empty_market_prompts_refresh() {
        let empty = AppState::new(
            Settings::default(),
            MarketData::default(),
            PortfolioBook::default(),
        );
        assert!(display_market(&empty, 10, None).contains("coinfolio refresh"));
        assert!(display_global(&empty).contains("coinfolio refresh"));
    }

    #[test]
    fn test_prices_labelled_with_table_currency() {
        let mut state = state();
        state.set_currency("EUR").unwrap();
        let output = display_market(&state, 10, Some("ether"));
        assert!(output.contains("Price (USD)"));
        assert!(output.contains("Price USD: 3100.5"));
        assert!(display_global(&state).contains("(USD)"));
    }

    #[test]
    fn test_global_info() {
        let output = display_global(&state());
        assert!(output.contains("Active Markets: 812"));
        assert!(output.contains("(USD)"));
    }
}
