use crate::domain::notification::Recipient;
use crate::domain::order::{Order, PaymentStatus};
use crate::domain::webhook::{CustomerDetails, MidtransNotification, WebhookEvent};
use crate::error::AppError;
use crate::gateways::PaymentProvider;
use crate::reconcile::transitions::{reconcile, terminal_notification, Disposition, ReconcileRules};
use crate::repo::store::OrderStore;
use crate::service::notification_dispatcher::NotificationDispatcher;
use crate::signature::SignatureVerifier;
use serde::Serialize;
use std::sync::Arc;

/// A losing compare-and-set re-reads the order; by then it is terminal,
/// so a second round always settles.
const MAX_STATUS_WRITES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookOutcome {
    pub order_id: String,
    pub previous_status: PaymentStatus,
    pub current_status: PaymentStatus,
    #[serde(skip)]
    pub disposition: Disposition,
    pub notification_scheduled: bool,
}

#[derive(Clone)]
pub struct WebhookService {
    pub orders: Arc<dyn OrderStore>,
    pub provider: Arc<dyn PaymentProvider>,
    pub dispatcher: NotificationDispatcher,
    pub verifier: SignatureVerifier,
    pub rules: ReconcileRules,
    /// Ask the provider for the transaction status instead of trusting the body.
    pub verify_with_provider: bool,
}

impl WebhookService {
    /// Full inbound path: parse, authenticate, resolve the event, apply it.
    pub async fn handle(&self, body: &[u8], header_signature: Option<&str>) -> Result<WebhookOutcome, AppError> {
        let notification: MidtransNotification = serde_json::from_slice(body)
            .map_err(|e| AppError::Validation(format!("malformed notification body: {e}")))?;

        let missing = notification.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "notification is missing {}",
                missing.join(", ")
            )));
        }

        if let Err(err) = self.verifier.verify_notification(&notification, header_signature) {
            tracing::warn!(order_id = %notification.order_id, "rejected notification: {}", err);
            return Err(err.into());
        }

        tracing::info!(
            order_id = %notification.order_id,
            transaction_status = %notification.transaction_status,
            fraud_status = notification.fraud_status.as_deref().unwrap_or("-"),
            "verified payment notification"
        );

        let event = self.resolve_event(&notification).await;
        self.apply_event(&event, notification.customer_details.as_ref()).await
    }

    async fn resolve_event(&self, notification: &MidtransNotification) -> WebhookEvent {
        let from_payload = notification.to_event();
        if !self.verify_with_provider {
            return from_payload;
        }

        match self.provider.transaction_status(&notification.order_id).await {
            Ok(status) => {
                if status.raw_transaction_status != notification.transaction_status {
                    tracing::info!(
                        order_id = %notification.order_id,
                        payload = %notification.transaction_status,
                        provider = %status.raw_transaction_status,
                        "provider status differs from notification body"
                    );
                }
                WebhookEvent {
                    order_id: notification.order_id.clone(),
                    transaction_status: status.transaction_status,
                    fraud_status: status.fraud_status,
                    raw_transaction_status: status.raw_transaction_status,
                }
            }
            Err(err) => {
                tracing::warn!(order_id = %notification.order_id, "status lookup failed, using notification body: {}", err);
                from_payload
            }
        }
    }

    /// Reconcile, persist, then schedule a notification. Safe to run any
    /// number of times for the same event, concurrently or not.
    pub async fn apply_event(
        &self,
        event: &WebhookEvent,
        payload_customer: Option<&CustomerDetails>,
    ) -> Result<WebhookOutcome, AppError> {
        for _ in 0..MAX_STATUS_WRITES {
            let order = self
                .orders
                .get(&event.order_id)
                .await?
                .ok_or_else(|| AppError::NotFound(event.order_id.clone()))?;
            let previous = order.payment_status;

            let outcome = reconcile(previous, event.transaction_status, event.fraud_status, &self.rules);
            match outcome.disposition {
                Disposition::Unhandled => {
                    tracing::info!(order_id = %order.order_id, transaction_status = %event.raw_transaction_status, "acknowledged unhandled status");
                }
                Disposition::AlreadyTerminal => {
                    tracing::info!(order_id = %order.order_id, status = %previous, "order already terminal, replay only re-claims its notification");
                }
                Disposition::Transition | Disposition::NoChange => {}
            }

            if outcome.changes(previous)
                && !self
                    .orders
                    .compare_and_set_status(&order.order_id, previous, outcome.new_status)
                    .await?
            {
                tracing::debug!(order_id = %order.order_id, "concurrent status write, re-reading");
                continue;
            }
            if outcome.changes(previous) {
                tracing::info!(order_id = %order.order_id, from = %previous, to = %outcome.new_status, "order status updated");
            }

            let kind = match outcome.disposition {
                // no-op when the row exists; restores a claim lost after the status write
                Disposition::AlreadyTerminal => terminal_notification(previous),
                _ => outcome.notification,
            };
            let mut notification_scheduled = false;
            if let Some(kind) = kind {
                let recipient = recipient_for(&order, payload_customer);
                notification_scheduled = self
                    .dispatcher
                    .claim_and_dispatch(recipient, kind)
                    .await
                    .map_err(|err| {
                        tracing::error!(order_id = %order.order_id, "could not record notification: {}", err);
                        // non-2xx makes Midtrans redeliver, and the redelivery claims again
                        AppError::Upstream(err.context(format!(
                            "notification ledger write failed for order {}",
                            order.order_id
                        )))
                    })?;
            }

            return Ok(WebhookOutcome {
                order_id: order.order_id,
                previous_status: previous,
                current_status: outcome.new_status,
                disposition: outcome.disposition,
                notification_scheduled,
            });
        }

        Err(AppError::Upstream(anyhow::anyhow!(
            "order {} kept changing under concurrent updates",
            event.order_id
        )))
    }
}

/// Stored contact details win; the notification body only fills gaps.
fn recipient_for(order: &Order, payload_customer: Option<&CustomerDetails>) -> Recipient {
    let fallback = |stored: &str, from_payload: Option<&String>| {
        if stored.trim().is_empty() {
            from_payload.cloned().unwrap_or_default()
        } else {
            stored.to_string()
        }
    };
    Recipient {
        order_id: order.order_id.clone(),
        phone_number: fallback(&order.phone_number, payload_customer.and_then(|c| c.phone.as_ref())),
        customer_name: fallback(
            &order.customer_name,
            payload_customer.and_then(|c| c.first_name.as_ref()),
        ),
    }
}
