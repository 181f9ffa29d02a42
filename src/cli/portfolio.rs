use super::ui;
use crate::PortfolioCommand;
use crate::core::convert::{format_amount, format_grouped, format_price};
use crate::core::portfolio::{ValidationError, parse_amount};
use crate::core::settings::currency_symbol;
use crate::core::state::AppState;
use crate::core::valuation::{self, GainClass, PortfolioSummary};
use anyhow::{Context, Result};
use comfy_table::Cell;

/// `value` with the currency sign in front, e.g. `-€1,250.5`.
fn money(currency: &str, value: f64) -> String {
    let amount = format_amount(value.abs());
    let sign = if value < 0.0 && amount != "0" { "-" } else { "" };
    format!("{sign}{}{amount}", currency_symbol(currency))
}

fn totals_line(summary: &PortfolioSummary) -> String {
    let gain = format!(
        "{} ({})",
        money(&summary.currency, summary.total_gain),
        summary.gain_percent_label()
    );
    format!(
        "Total Value ({}): {}\nTotal Gain: {}",
        ui::style_text(&summary.currency, ui::StyleType::TotalLabel),
        ui::style_text(
            &money(&summary.currency, summary.total_value),
            ui::StyleType::TotalLabel
        ),
        ui::style_text(&gain, ui::StyleType::Gain(summary.gain_class))
    )
}

/// Warns when values are still denominated in the previous reference currency.
fn stale_notice(state: &AppState) -> String {
    if !state.needs_refresh() || state.market.is_empty() {
        return String::new();
    }
    format!(
        "\n\n{}",
        ui::style_text(
            &format!(
                "Values shown in {} until prices in {} are fetched. Run `coinfolio refresh`.",
                state.valuation_currency(),
                state.currency()
            ),
            ui::StyleType::Subtle
        )
    )
}

/// Renders the active portfolio with one row per holding and its totals.
pub fn display_portfolio(state: &AppState) -> String {
    let theme = state.settings.theme;
    let currency = state.valuation_currency();
    let portfolio = state.book.active();

    let mut output = format!(
        "Portfolio: {} {}\n\n",
        ui::style_text(&portfolio.name, ui::StyleType::Title),
        ui::style_text(
            &format!(
                "({} of {})",
                state.book.active_index() + 1,
                state.book.len()
            ),
            ui::StyleType::Subtle
        )
    );

    if portfolio.holdings.is_empty() {
        output.push_str(&ui::style_text(
            "No holdings yet. Add one with `coinfolio portfolio add <ASSET> <AMOUNT>`.",
            ui::StyleType::Subtle,
        ));
    } else {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("#", theme),
            ui::header_cell("Asset", theme),
            ui::header_cell("Amount", theme),
            ui::header_cell("Basis", theme),
            ui::header_cell(&format!("Price ({currency})"), theme),
            ui::header_cell(&format!("Value ({currency})"), theme),
            ui::header_cell("Gain", theme),
        ]);

        for (i, holding) in portfolio.holdings.iter().enumerate() {
            table.add_row(vec![
                ui::right_cell((i + 1).to_string()),
                Cell::new(holding.name()),
                ui::right_cell(format_price(holding.amount_held)),
                Cell::new(format!(
                    "{} @ {}",
                    holding.cost_basis_currency,
                    format_price(holding.cost_basis_unit_price)
                )),
                ui::right_cell(format_price(holding.current_unit_price)),
                ui::right_cell(format_grouped(holding.current_value)),
                ui::gain_cell(
                    format_price(holding.current_gain),
                    GainClass::of(holding.current_gain),
                ),
            ]);
        }
        output.push_str(&table.to_string());
    }

    output.push_str("\n\n");
    output.push_str(&totals_line(&state.active_summary()));
    output.push_str(&stale_notice(state));
    output
}

/// One row per portfolio, the active one marked.
pub fn display_overview(state: &AppState) -> String {
    let theme = state.settings.theme;
    let currency = state.valuation_currency();
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("", theme),
        ui::header_cell("Portfolio", theme),
        ui::header_cell("Holdings", theme),
        ui::header_cell(&format!("Value ({currency})"), theme),
        ui::header_cell("Gain", theme),
        ui::header_cell("Gain %", theme),
    ]);

    let mut grand_total = 0.0;
    for (i, portfolio) in state.book.portfolios().iter().enumerate() {
        let summary = valuation::summarize(portfolio, currency);
        grand_total += summary.total_value;
        let marker = if i == state.book.active_index() { "*" } else { "" };
        table.add_row(vec![
            Cell::new(marker),
            Cell::new(&summary.name),
            ui::right_cell(portfolio.holdings.len().to_string()),
            ui::right_cell(format_grouped(summary.total_value)),
            ui::gain_cell(format_price(summary.total_gain), summary.gain_class),
            ui::gain_cell(summary.gain_percent_label(), summary.gain_class),
        ]);
    }

    format!(
        "{}\n\n{}\n\nGrand Total ({}): {}{}",
        ui::style_text("Portfolios", ui::StyleType::Title),
        table,
        ui::style_text(currency, ui::StyleType::TotalLabel),
        ui::style_text(&money(currency, grand_total), ui::StyleType::TotalLabel),
        stale_notice(state),
    )
}

fn parse_price(input: &str) -> Result<f64, ValidationError> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
        .ok_or_else(|| ValidationError::InvalidAmount(input.to_string()))
}

fn holding_index(position: usize) -> Result<usize> {
    position
        .checked_sub(1)
        .with_context(|| format!("Holding positions start at 1, got {position}"))
}

fn portfolio_index(state: &AppState, name: &str) -> Result<usize> {
    state
        .book
        .position(name.trim())
        .with_context(|| format!("No portfolio named '{name}'"))
}

pub fn run(state: &mut AppState, command: PortfolioCommand) -> Result<String> {
    match command {
        PortfolioCommand::Show => {}
        PortfolioCommand::Add {
            asset,
            amount,
            price,
        } => {
            let amount = parse_amount(&amount)?;
            let price = price.as_deref().map(parse_price).transpose()?;
            state.add_holding(&asset, amount, price)?;
        }
        PortfolioCommand::Edit { position, amount } => {
            let amount = parse_amount(&amount)?;
            state
                .set_holding_amount(holding_index(position)?, amount)
                .with_context(|| format!("Failed to edit holding #{position}"))?;
        }
        PortfolioCommand::Remove { position } => {
            state
                .remove_holding(holding_index(position)?)
                .with_context(|| format!("Failed to remove holding #{position}"))?;
        }
        PortfolioCommand::Info { position } => {
            let holding = state
                .book
                .active()
                .holdings
                .get(holding_index(position)?)
                .with_context(|| format!("No holding #{position} in the active portfolio"))?;
            return Ok(holding.info(state.valuation_currency()));
        }
        PortfolioCommand::Create { name } => {
            state.create_portfolio(&name)?;
            return Ok(display_overview(state));
        }
        PortfolioCommand::Rename { name, new_name } => {
            let index = portfolio_index(state, &name)?;
            state.rename_portfolio(index, &new_name)?;
            return Ok(display_overview(state));
        }
        PortfolioCommand::Delete { name } => {
            let index = portfolio_index(state, &name)?;
            state.delete_portfolio(index)?;
            return Ok(display_overview(state));
        }
        PortfolioCommand::Select { name } => {
            let index = portfolio_index(state, &name)?;
            state.select_portfolio(index)?;
        }
    }
    Ok(display_portfolio(state))
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
                GlobalSnapshot::default(),
                vec![quote("Bitcoin", "btc", 100.0), quote("Ethereum", "eth", 10.0)],
            ),
            PortfolioBook::default(),
        )
    }

    fn add(state: &mut AppState, asset: &str, amount: &str, price: Option<&str>) -> Result<String> {
        run(
            state,
            PortfolioCommand::Add {
                asset: asset.to_string(),
                amount: amount.to_string(),
                price: price.map(str::to_string),
            },
        )
    }

    #[test]
    fn test_add_by_symbol_with_purchase_price() {
        let mut state = state();
        let output = add(&mut state, "btc", "2", Some("80")).unwrap();

        let holding = &state.book.active().holdings[0];
        assert_eq!(holding.name(), "Bitcoin");
        assert_eq!(holding.cost_basis_total_value, 160.0);
        assert_eq!(holding.current_value, 200.0);
        assert!(output.contains("Bitcoin"));
        assert!(output.contains("USD @ 80"));
        assert!(output.contains("25.00%"));
    }

    #[test]
    fn test_invalid_amounts_are_rejected_before_mutation() {
        let mut state = state();
        for amount in ["abc", "-1", "0", "NaN"] {
            let err = add(&mut state, "Bitcoin", amount, None).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ValidationError>(),
                Some(ValidationError::InvalidAmount(_))
            ));
        }
        assert!(add(&mut state, "Bitcoin", "1", Some("-5")).is_err());
        assert!(state.book.active().holdings.is_empty());
    }

    #[test]
    fn test_edit_and_remove_use_one_based_positions() {
        let mut state = state();
        add(&mut state, "Bitcoin", "1", None).unwrap();
        add(&mut state, "Ethereum", "3", None).unwrap();

        run(
            &mut state,
            PortfolioCommand::Edit {
                position: 2,
                amount: "5".to_string(),
            },
        )
        .unwrap();
        assert_eq!(state.book.active().holdings[1].current_value, 50.0);

        run(&mut state, PortfolioCommand::Remove { position: 1 }).unwrap();
        assert_eq!(state.book.active().holdings.len(), 1);
        assert_eq!(state.book.active().holdings[0].name(), "Ethereum");

        let info = run(&mut state, PortfolioCommand::Info { position: 1 }).unwrap();
        assert!(info.contains("Name: Ethereum"));
        assert!(info.contains("Portfolio Amount: 5"));

        assert!(run(&mut state, PortfolioCommand::Remove { position: 0 }).is_err());
        assert!(run(&mut state, PortfolioCommand::Remove { position: 7 }).is_err());
    }

    #[test]
    fn test_portfolio_management_by_name() {
        let mut state = state();
        run(
            &mut state,
            PortfolioCommand::Create {
                name: "Cold Wallet".to_string(),
            },
        )
        .unwrap();
        let output = run(
            &mut state,
            PortfolioCommand::Select {
                name: "Cold Wallet".to_string(),
            },
        )
        .unwrap();
        assert!(output.contains("(2 of 2)"));

        let err = run(
            &mut state,
            PortfolioCommand::Rename {
                name: "Cold Wallet".to_string(),
                new_name: "Main".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::DuplicateName("Main".to_string()))
        );

        run(
            &mut state,
            PortfolioCommand::Delete {
                name: "Main".to_string(),
            },
        )
        .unwrap();
        assert_eq!(state.book.len(), 1);
        assert_eq!(state.book.active().name, "Cold Wallet");

        let err = run(
            &mut state,
            PortfolioCommand::Delete {
                name: "Cold Wallet".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::LastPortfolioDelete)
        );
        assert!(
            run(
                &mut state,
                PortfolioCommand::Select {
                    name: "Missing".to_string(),
                },
            )
            .is_err()
        );
    }

    #[test]
    fn test_totals_use_currency_sign() {
        assert_eq!(money("USD", 1_234.5), "$1,234.5");
        assert_eq!(money("EUR", -250.0), "-€250");
        assert_eq!(money("CHF", 10.0), "CHF10");

        let mut state = state();
        add(&mut state, "Bitcoin", "1.5", Some("120")).unwrap();
        let output = display_portfolio(&state);
        assert!(output.contains("Total Value (USD): $150"));
        assert!(output.contains("Total Gain: -$30 (-16.67%)"));
    }

    #[test]
    fn test_currency_switch_keeps_previous_values_on_display() {
        let mut state = state();
        add(&mut state, "Bitcoin", "1.5", Some("120")).unwrap();
        state.set_currency("EUR").unwrap();

        let output = display_portfolio(&state);
        assert!(output.contains("Total Value (USD): $150"));
        assert!(output.contains("Total Gain: -$30 (-16.67%)"));
        assert!(output.contains("Values shown in USD until prices in EUR are fetched"));
        assert!(display_overview(&state).contains("Grand Total (USD): $150"));

        let err = add(&mut state, "Ethereum", "1", None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::StaleMarket { .. })
        ));
        assert_eq!(state.book.active().holdings.len(), 1);
    }

    #[test]
    fn test_overview_marks_active_portfolio() {
        let mut state = state();
        add(&mut state, "Bitcoin", "1", None).unwrap();
        let output = display_overview(&state);
        assert!(output.contains("Main"));
        assert!(output.contains('*'));
        assert!(output.contains("Grand Total"));
        assert!(output.contains("100"));
    }
}
