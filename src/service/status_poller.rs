use crate::domain::webhook::WebhookEvent;
use crate::gateways::PaymentProvider;
use crate::repo::store::{OrderStore, StaleCursor};
use crate::service::webhook_service::WebhookService;
use anyhow::Result;

pub const POLL_BATCH: i64 = 100;

/// One pass over every pending order older than `min_age_secs`, fetched in
/// pages of [`POLL_BATCH`]. Orders the provider has no answer for are skipped
/// and do not hold back the rest. The provider's answer goes through the same
/// reconcile/persist/notify path as a webhook. Returns how many orders changed status.
pub async fn poll_once(
    service: &WebhookService,
    orders: &dyn OrderStore,
    provider: &dyn PaymentProvider,
    min_age_secs: i64,
) -> Result<usize> {
    let cutoff = chrono::Utc::now() - chrono::Duration::seconds(min_age_secs);
    let mut cursor: Option<StaleCursor> = None;
    let mut moved = 0;

    loop {
        let page = orders.list_stale_pending(cutoff, cursor.as_ref(), POLL_BATCH).await?;
        let Some(last) = page.last() else {
            break;
        };
        cursor = Some(StaleCursor::from(last));
        let full_page = page.len() as i64 == POLL_BATCH;

        for order in page {
            let status = match provider.transaction_status(&order.order_id).await {
                Ok(s) => s,
                Err(err) => {
                    tracing::debug!(order_id = %order.order_id, "no provider status yet: {}", err);
                    continue;
                }
            };
            let event = WebhookEvent {
                order_id: order.order_id.clone(),
                transaction_status: status.transaction_status,
                fraud_status: status.fraud_status,
                raw_transaction_status: status.raw_transaction_status,
            };
            match service.apply_event(&event, None).await {
                Ok(outcome) if outcome.previous_status != outcome.current_status => {
                    tracing::info!(order_id = %outcome.order_id, to = %outcome.current_status, "poller reconciled order");
                    moved += 1;
                }
                Ok(_) => {}
                Err(err) => tracing::warn!(order_id = %order.order_id, "poller could not apply status: {}", err),
            }
        }

        if !full_page {
            break;
        }
    }

    Ok(moved)
}
