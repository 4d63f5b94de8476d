#![allow(dead_code)]

use payment_webhook_relay::domain::notification::{DeliveryReceipt, NotificationKind, Recipient};
use payment_webhook_relay::gateways::mock::MockProvider;
use payment_webhook_relay::http::router::build_router;
use payment_webhook_relay::notifier::wapisender::CallbackVerifier;
use payment_webhook_relay::notifier::{Notifier, NotifyError};
use payment_webhook_relay::reconcile::transitions::ReconcileRules;
use payment_webhook_relay::repo::in_memory::{InMemoryOrderStore, InMemoryOutbox};
use payment_webhook_relay::repo::store::{NotificationOutbox, OutboxRecord, OutboxStatus};
use payment_webhook_relay::secret::Secret;
use payment_webhook_relay::service::notification_dispatcher::NotificationDispatcher;
use payment_webhook_relay::service::order_ids::OrderIdGenerator;
use payment_webhook_relay::service::order_service::OrderService;
use payment_webhook_relay::service::webhook_service::WebhookService;
use payment_webhook_relay::signature::{compute_signature, SignatureFields, SignatureVerifier};
use payment_webhook_relay::AppState;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

pub const SERVER_KEY: &str = "SB-Mid-server-TEST";
pub const ADMIN_KEY: &str = "admin-test-key";
pub const WAPISENDER_API_KEY: &str = "wa-api";
pub const FIRST_ORDER_ID: &str = "order-1700000000000";

/// Notifier double: records every call, optionally failing them.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    calls: Arc<Mutex<Vec<(Recipient, NotificationKind)>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<(Recipient, NotificationKind)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, ledger_key: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(_, kind)| kind.ledger_key() == ledger_key)
            .count()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, recipient: &Recipient, kind: &NotificationKind) -> Result<DeliveryReceipt, NotifyError> {
        self.calls.lock().unwrap().push((recipient.clone(), kind.clone()));
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Rejected {
                status: 502,
                body: "device offline".to_string(),
            });
        }
        Ok(DeliveryReceipt {
            message_id: Some(format!("msg-{}", self.calls.lock().unwrap().len())),
            status_code: 200,
            body: serde_json::json!({"status": "ok"}),
        })
    }
}

/// Outbox whose next `claim` calls fail, standing in for a ledger outage.
#[derive(Clone)]
pub struct FlakyOutbox {
    inner: InMemoryOutbox,
    claim_failures: Arc<AtomicUsize>,
}

impl FlakyOutbox {
    pub fn fail_next_claims(&self, n: usize) {
        self.claim_failures.store(n, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl NotificationOutbox for FlakyOutbox {
    async fn claim(&self, order_id: &str, kind: &str, payload_json: serde_json::Value) -> anyhow::Result<Option<i64>> {
        let failing = self
            .claim_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            anyhow::bail!("ledger unavailable");
        }
        self.inner.claim(order_id, kind, payload_json).await
    }

    async fn mark_sent(&self, id: i64, receipt_json: serde_json::Value) -> anyhow::Result<()> {
        self.inner.mark_sent(id, receipt_json).await
    }

    async fn mark_failed(&self, id: i64, error: &str) -> anyhow::Result<()> {
        self.inner.mark_failed(id, error).await
    }

    async fn reopen(&self, id: i64) -> anyhow::Result<bool> {
        self.inner.reopen(id).await
    }

    async fn get(&self, id: i64) -> anyhow::Result<Option<OutboxRecord>> {
        self.inner.get(id).await
    }

    async fn list_by_status(&self, status: OutboxStatus, limit: i64) -> anyhow::Result<Vec<OutboxRecord>> {
        self.inner.list_by_status(status, limit).await
    }

    async fn record_delivery(&self, message_id: &str, event: serde_json::Value) -> anyhow::Result<Option<i64>> {
        self.inner.record_delivery(message_id, event).await
    }
}

pub struct Options {
    pub verify_with_provider: bool,
    pub notify_on_pending: bool,
    pub queue_capacity: usize,
    pub clock_ms: i64,
    pub redirect_template: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            verify_with_provider: false,
            notify_on_pending: false,
            queue_capacity: 64,
            clock_ms: 1_700_000_000_000,
            redirect_template: "https://pay/x".to_string(),
        }
    }
}

pub struct Harness {
    pub orders: InMemoryOrderStore,
    pub outbox: InMemoryOutbox,
    pub ledger: FlakyOutbox,
    pub provider: MockProvider,
    pub notifier: RecordingNotifier,
    pub state: AppState,
    worker: JoinHandle<()>,
}

/// What is left to inspect once every queued notification has been handled.
pub struct Settled {
    pub orders: InMemoryOrderStore,
    pub outbox: InMemoryOutbox,
    pub provider: MockProvider,
    pub notifier: RecordingNotifier,
}

impl Harness {
    pub fn new(opts: Options) -> Self {
        let orders = InMemoryOrderStore::new();
        let outbox = InMemoryOutbox::new();
        let provider = MockProvider::new(&opts.redirect_template);
        let notifier = RecordingNotifier::default();
        let ledger = FlakyOutbox {
            inner: outbox.clone(),
            claim_failures: Arc::new(AtomicUsize::new(0)),
        };

        let (dispatcher, worker) = NotificationDispatcher::spawn(
            Arc::new(notifier.clone()),
            Arc::new(ledger.clone()),
            opts.queue_capacity,
        );
        let clock = opts.clock_ms;
        let order_service = OrderService {
            orders: Arc::new(orders.clone()),
            provider: Arc::new(provider.clone()),
            dispatcher: dispatcher.clone(),
            ids: OrderIdGenerator::with_sources(move || clock, String::new),
        };
        let webhook_service = WebhookService {
            orders: Arc::new(orders.clone()),
            provider: Arc::new(provider.clone()),
            dispatcher: dispatcher.clone(),
            verifier: SignatureVerifier::new(Secret::from(SERVER_KEY)),
            rules: ReconcileRules {
                notify_on_pending: opts.notify_on_pending,
            },
            verify_with_provider: opts.verify_with_provider,
        };
        let state = AppState {
            order_service,
            webhook_service,
            dispatcher,
            orders: Arc::new(orders.clone()),
            callback_verifier: CallbackVerifier::new(Secret::from(WAPISENDER_API_KEY)),
            redis_client: None,
        };

        Self {
            orders,
            outbox,
            ledger,
            provider,
            notifier,
            state,
            worker,
        }
    }

    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), Secret::from(ADMIN_KEY), None)
    }

    /// Drops every dispatcher handle and waits for the worker to drain the queue.
    /// Routers built from this harness must be dropped first.
    pub async fn settle(self) -> Settled {
        let Harness {
            orders,
            outbox,
            provider,
            notifier,
            state,
            worker,
            ..
        } = self;
        drop(state);
        worker.await.unwrap();
        Settled {
            orders,
            outbox,
            provider,
            notifier,
        }
    }
}

pub fn status_code_for(transaction_status: &str) -> &'static str {
    match transaction_status {
        "capture" | "settlement" => "200",
        "pending" => "201",
        _ => "202",
    }
}

/// Notification body signed the way Midtrans signs it.
pub fn signed_notification(order_id: &str, transaction_status: &str, fraud_status: Option<&str>) -> serde_json::Value {
    let status_code = status_code_for(transaction_status);
    let gross_amount = "50000.00";
    let signature = compute_signature(
        SignatureFields {
            order_id,
            status_code,
            gross_amount,
        },
        SERVER_KEY,
    );
    let mut body = serde_json::json!({
        "transaction_time": "2023-11-15 05:33:20",
        "transaction_status": transaction_status,
        "transaction_id": format!("txn-{order_id}"),
        "status_message": "midtrans payment notification",
        "status_code": status_code,
        "signature_key": signature,
        "payment_type": "credit_card",
        "order_id": order_id,
        "gross_amount": gross_amount,
        "currency": "IDR",
    });
    if let Some(fraud) = fraud_status {
        body["fraud_status"] = serde_json::Value::String(fraud.to_string());
    }
    body
}

pub fn body_bytes(value: &serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap()
}
