use std::time::Duration;

use checkout_engine::{checkout_objects::CheckoutOptions, events::EventProducers, CheckoutFlowApi, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

use crate::integrations::ProcessorGateway;

/// Starts the invoice reconciliation worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every `interval`, crypto orders that have been `processing` for longer than `stale_after` are checked against
/// BTCPay, and any final invoice status the webhook failed to deliver is applied.
pub fn start_reconcile_worker(
    db: SqliteDatabase,
    gateway: ProcessorGateway,
    producers: EventProducers,
    options: CheckoutOptions,
    interval: Duration,
    stale_after: chrono::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = CheckoutFlowApi::new(db, gateway, producers, options);
        info!("🕰️ Invoice reconciliation worker started");
        loop {
            timer.tick().await;
            info!("🕰️ Running invoice reconciliation job");
            match api.reconcile_stale_invoices(stale_after).await {
                Ok(result) => {
                    debug!(
                        "🕰️ Reconciliation job done. {} completed, {} canceled, {} still open",
                        result.completed, result.canceled, result.untouched
                    );
                },
                Err(e) => {
                    error!("🕰️ Error running invoice reconciliation job: {e}");
                },
            }
        }
    })
}
