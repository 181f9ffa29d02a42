//! Background refresh cycle: fetch, persist, revalue, notify.
//!
//! Only one cycle runs at a time. A trigger that arrives while a cycle is in
//! flight is ignored. A table fetched for a reference currency that changed
//! while the fetch was running is dropped unapplied.

use crate::core::feed::{FetchError, MarketFeed};
use crate::core::state::AppState;
use crate::core::valuation::PortfolioSummary;
use crate::store::Stores;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Fetching,
    Reconciling,
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshEvent {
    /// New prices were applied; one summary per portfolio.
    DataChanged { summaries: Vec<PortfolioSummary> },
    /// The refresh failed and the previous snapshot was kept.
    Failed { notice: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Updated { quotes: usize },
    Failed(FetchError),
    /// The reference currency changed mid-fetch; nothing was stored or applied.
    Discarded { fetched: String, current: String },
}

// Returns the phase to Idle when a cycle ends, however it ends.
struct IdleOnDrop(Arc<Mutex<RefreshPhase>>);

impl Drop for IdleOnDrop {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = RefreshPhase::Idle;
    }
}

#[derive(Clone)]
pub struct RefreshOrchestrator {
    feed: Arc<dyn MarketFeed>,
    stores: Arc<Stores>,
    state: Arc<RwLock<AppState>>,
    phase: Arc<Mutex<RefreshPhase>>,
    events: broadcast::Sender<RefreshEvent>,
}

impl RefreshOrchestrator {
    pub fn new(feed: Arc<dyn MarketFeed>, stores: Arc<Stores>, state: AppState) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            feed,
            stores,
            state: Arc::new(RwLock::new(state)),
            phase: Arc::new(Mutex::new(RefreshPhase::Idle)),
            events,
        }
    }

    /// Shared handle to the application state. Hold the write lock only for user edits.
    pub fn state(&self) -> Arc<RwLock<AppState>> {
        Arc::clone(&self.state)
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.events.subscribe()
    }

    pub fn phase(&self) -> RefreshPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: RefreshPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }

    /// Starts a refresh on a background task.
    ///
    /// Returns `None` without doing anything when a refresh is already running.
    pub fn start(&self) -> Option<JoinHandle<RefreshOutcome>> {
        {
            let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
            if *phase != RefreshPhase::Idle {
                debug!(phase = ?*phase, "Refresh already in flight, ignoring trigger");
                return None;
            }
            *phase = RefreshPhase::Fetching;
        }

        let this = self.clone();
        Some(tokio::spawn(async move { this.run_cycle().await }))
    }

    /// Starts a refresh and waits for it. `None` when another refresh was running.
    pub async fn refresh(&self) -> Option<RefreshOutcome> {
        let handle = self.start()?;
        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!("Refresh task did not complete: {}", e);
                None
            }
        }
    }

    async fn run_cycle(&self) -> RefreshOutcome {
        let _idle = IdleOnDrop(Arc::clone(&self.phase));
        let started = Instant::now();
        let currency = self.state.read().await.currency().to_string();

        let market = match self.feed.fetch(&currency).await {
            Ok(market) if !market.is_empty() => market,
            Ok(_) => return self.fail(FetchError::EmptyPayload("market listing".to_string())),
            Err(e) => return self.fail(e),
        };

        self.set_phase(RefreshPhase::Reconciling);
        let quotes = market.quotes.len();
        let summaries = {
            let mut state = self.state.write().await;
            if !market.is_priced_in(state.currency()) {
                return self.discard(market.currency, state.currency().to_string());
            }
            if let Err(e) = self.stores.market.store(&market) {
                warn!("Failed to persist market snapshot: {}", e);
            }
            let summaries = state.apply_market(market);
            self.stores.save_portfolios(&state.book);
            summaries
        };

        info!(elapsed = ?started.elapsed(), quotes, "Refresh complete");
        let _ = self.events.send(RefreshEvent::DataChanged { summaries });
        RefreshOutcome::Updated { quotes }
    }

    fn discard(&self, fetched: String, current: String) -> RefreshOutcome {
        info!(%fetched, %current, "Reference currency changed during fetch, dropping result");
        let _ = self.events.send(RefreshEvent::Failed {
            notice: format!(
                "Prices arrived in {fetched} but the reference currency is now {current}. Refresh again."
            ),
        });
        RefreshOutcome::Discarded { fetched, current }
    }

    fn fail(&self, error: FetchError) -> RefreshOutcome {
        warn!(error = %error, "Refresh failed, keeping previous snapshot");
        let _ = self.events.send(RefreshEvent::Failed {
            notice: format!(
                "Unable to fetch market data: {error}. Check your connection or try again later."
            ),
        });
        RefreshOutcome::Failed(error)
    }
}
