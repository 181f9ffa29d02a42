//! Market feed abstractions

use crate::core::quote::MarketData;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Unexpected response code: {0}")]
    BadStatus(u16),

    #[error("Empty or invalid payload from {0}")]
    EmptyPayload(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// A remote source of market listings and global statistics.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Fetches the full market table priced in `reference_currency`.
    ///
    /// A successful result always carries at least one quote.
    async fn fetch(&self, reference_currency: &str) -> Result<MarketData, FetchError>;
}

/// Sleeps between retry attempts. Injected so tests can skip real delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
