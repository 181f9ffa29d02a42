pub mod cli;
pub mod core;
pub mod providers;
pub mod refresh;
pub mod store;

use crate::core::config::AppConfig;
use crate::providers::CoinGeckoFeed;
use crate::refresh::RefreshOrchestrator;
use crate::store::Stores;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Refresh,
    Market {
        limit: usize,
        search: Option<String>,
    },
    Global,
    Convert {
        amount: String,
        from: String,
        to: String,
    },
    Portfolio(PortfolioCommand),
    Currency(String),
    Theme(String),
}

pub enum PortfolioCommand {
    Show,
    /// Add a holding to the active portfolio.
    Add {
        asset: String,
        amount: String,
        price: Option<String>,
    },
    /// Change the amount of the holding at a 1-based position.
    Edit {
        position: usize,
        amount: String,
    },
    Remove {
        position: usize,
    },
    /// Full description of the holding at a 1-based position.
    Info {
        position: usize,
    },
    Create {
        name: String,
    },
    Rename {
        name: String,
        new_name: String,
    },
    Delete {
        name: String,
    },
    Select {
        name: String,
    },
}

impl AppCommand {
    /// Commands that read the market table refresh first when it is unusable
    /// or priced in another currency than the reference one.
    fn needs_market(&self) -> bool {
        !matches!(self, AppCommand::Theme(_) | AppCommand::Refresh)
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("coinfolio starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let data_dir = config.data_path()?;
    let stores = Arc::new(Stores::open(&data_dir));
    let boot = stores.bootstrap(&config.currency);
    let feed = CoinGeckoFeed::from_config(&config.feed)
        .context("Failed to create market data client")?;
    let orchestrator = RefreshOrchestrator::new(Arc::new(feed), Arc::clone(&stores), boot.state);

    let state = orchestrator.state();
    let currency_notice = match &command {
        AppCommand::Currency(code) => {
            Some(cli::settings::set_currency(&mut *state.write().await, code)?)
        }
        _ => None,
    };

    let refresh = match &command {
        AppCommand::Refresh => true,
        cmd => cmd.needs_market() && (boot.needs_fetch || state.read().await.needs_refresh()),
    };
    if refresh {
        cli::refresh::run(&orchestrator).await;
    }

    let mut state = state.write().await;
    let output = match command {
        AppCommand::Refresh => cli::portfolio::display_overview(&state),
        AppCommand::Market { limit, search } => {
            cli::market::display_market(&state, limit, search.as_deref())
        }
        AppCommand::Global => cli::market::display_global(&state),
        AppCommand::Convert { amount, from, to } => {
            cli::convert::run(&state, &amount, &from, &to)?
        }
        AppCommand::Portfolio(cmd) => cli::portfolio::run(&mut state, cmd)?,
        AppCommand::Currency(_) => format!(
            "{}\n\n{}",
            currency_notice.unwrap_or_default(),
            cli::portfolio::display_overview(&state)
        ),
        AppCommand::Theme(theme) => cli::settings::set_theme(&mut state, &theme)?,
    };
    println!("{output}");

    stores
        .save_user_data(&state)
        .with_context(|| format!("Failed to save data under {}", data_dir.display()))?;
    Ok(())
}
