//! Core business logic abstractions

pub mod config;
pub mod convert;
pub mod feed;
pub mod log;
pub mod portfolio;
pub mod quote;
pub mod settings;
pub mod state;
pub mod valuation;

// Re-export main types for cleaner imports
pub use feed::{FetchError, MarketFeed, Sleeper};
pub use portfolio::{Holding, Portfolio, PortfolioBook, ValidationError};
pub use quote::{AssetQuote, GlobalSnapshot, MarketData};
pub use settings::Settings;
pub use state::AppState;
