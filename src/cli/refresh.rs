use super::ui;
use crate::refresh::{RefreshEvent, RefreshOrchestrator, RefreshOutcome};
use tracing::debug;

/// Runs one refresh behind a spinner and reports the outcome.
///
/// A failed refresh is not an error for the caller: the previous snapshot stays in use.
pub async fn run(orchestrator: &RefreshOrchestrator) -> Option<RefreshOutcome> {
    let mut events = orchestrator.subscribe();
    let pb = ui::new_spinner("Fetching market data...");
    let outcome = orchestrator.refresh().await;
    pb.finish_and_clear();

    match events.try_recv() {
        Ok(RefreshEvent::DataChanged { summaries }) => {
            debug!(portfolios = summaries.len(), "Market data refreshed");
            for summary in summaries.iter().filter(|s| !s.unmatched.is_empty()) {
                eprintln!(
                    "{}",
                    ui::style_text(
                        &format!(
                            "{}: no live price for {}",
                            summary.name,
                            summary.unmatched.join(", ")
                        ),
                        ui::StyleType::Subtle
                    )
                );
            }
        }
        Ok(RefreshEvent::Failed { notice }) => {
            eprintln!("{}", ui::style_text(&notice, ui::StyleType::Error));
        }
        Err(e) => debug!("No refresh notification: {}", e),
    }
    outcome
}
