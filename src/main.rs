use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use coinfolio::cli::setup::{setup, setup_at_path};
use coinfolio::core::log::init_logging;
use coinfolio::{AppCommand, PortfolioCommand};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    #[command(flatten)]
    App(AppCommands),
}

#[derive(Subcommand)]
enum AppCommands {
    /// Fetch fresh market data and revalue all portfolios
    Refresh,
    /// List assets by market cap
    Market {
        /// Number of assets to show
        #[arg(short, long, default_value_t = 25)]
        limit: usize,
        /// Only show assets whose name or symbol contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show global market statistics
    Global,
    /// Convert an amount between assets or the reference currency
    Convert {
        amount: String,
        from: String,
        to: String,
    },
    /// Manage portfolios and holdings
    #[command(subcommand)]
    Portfolio(PortfolioCommands),
    /// Set the reference currency
    Currency { code: String },
    /// Set the display theme (light or dark)
    Theme { theme: String },
}

#[derive(Subcommand)]
enum PortfolioCommands {
    /// Show the active portfolio
    Show,
    /// Add a holding to the active portfolio
    Add {
        /// Asset name or symbol
        asset: String,
        amount: String,
        /// Purchase price per unit, defaults to the current price
        #[arg(short, long)]
        price: Option<String>,
    },
    /// Change the amount of a holding
    Edit { position: usize, amount: String },
    /// Remove a holding
    Remove { position: usize },
    /// Describe a holding in detail
    Info { position: usize },
    /// Create an empty portfolio
    Create { name: String },
    /// Rename a portfolio
    Rename { name: String, new_name: String },
    /// Delete a portfolio
    Delete { name: String },
    /// Make a portfolio the active one
    Select { name: String },
}

impl From<PortfolioCommands> for PortfolioCommand {
    fn from(cmd: PortfolioCommands) -> PortfolioCommand {
        match cmd {
            PortfolioCommands::Show => PortfolioCommand::Show,
            PortfolioCommands::Add {
                asset,
                amount,
                price,
            } => PortfolioCommand::Add {
                asset,
                amount,
                price,
            },
            PortfolioCommands::Edit { position, amount } => {
                PortfolioCommand::Edit { position, amount }
            }
            PortfolioCommands::Remove { position } => PortfolioCommand::Remove { position },
            PortfolioCommands::Info { position } => PortfolioCommand::Info { position },
            PortfolioCommands::Create { name } => PortfolioCommand::Create { name },
            PortfolioCommands::Rename { name, new_name } => {
                PortfolioCommand::Rename { name, new_name }
            }
            PortfolioCommands::Delete { name } => PortfolioCommand::Delete { name },
            PortfolioCommands::Select { name } => PortfolioCommand::Select { name },
        }
    }
}

impl From<AppCommands> for AppCommand {
    fn from(cmd: AppCommands) -> AppCommand {
        match cmd {
            AppCommands::Refresh => AppCommand::Refresh,
            AppCommands::Market { limit, search } => AppCommand::Market { limit, search },
            AppCommands::Global => AppCommand::Global,
            AppCommands::Convert { amount, from, to } => AppCommand::Convert { amount, from, to },
            AppCommands::Portfolio(cmd) => AppCommand::Portfolio(cmd.into()),
            AppCommands::Currency { code } => AppCommand::Currency(code),
            AppCommands::Theme { theme } => AppCommand::Theme(theme),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => setup_at_path(path),
            None => setup(),
        },
        Some(Commands::App(cmd)) => {
            coinfolio::run_command(cmd.into(), cli.config_path.as_deref()).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
