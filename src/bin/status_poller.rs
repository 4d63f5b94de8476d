use anyhow::Result;
use payment_webhook_relay::config::AppConfig;
use payment_webhook_relay::gateways::midtrans::MidtransGateway;
use payment_webhook_relay::gateways::PaymentProvider;
use payment_webhook_relay::notifier::wapisender::WapisenderNotifier;
use payment_webhook_relay::reconcile::transitions::ReconcileRules;
use payment_webhook_relay::repo::orders_repo::OrdersRepo;
use payment_webhook_relay::repo::outbox_repo::OutboxRepo;
use payment_webhook_relay::repo::store::OrderStore;
use payment_webhook_relay::service::notification_dispatcher::NotificationDispatcher;
use payment_webhook_relay::service::status_poller::poll_once;
use payment_webhook_relay::service::webhook_service::WebhookService;
use payment_webhook_relay::signature::SignatureVerifier;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Picks up orders whose notification never arrived by asking the provider
/// directly and feeding the answer through the webhook path.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&cfg.database_url)
        .await?;

    let orders: Arc<dyn OrderStore> = Arc::new(OrdersRepo { pool: pool.clone() });
    let client = reqwest::Client::new();
    let provider: Arc<dyn PaymentProvider> = Arc::new(MidtransGateway::from_config(
        &cfg.midtrans,
        cfg.outbound_timeout_ms,
        client.clone(),
    ));
    let (dispatcher, _worker) = NotificationDispatcher::spawn(
        Arc::new(WapisenderNotifier::from_config(&cfg.wapisender, cfg.outbound_timeout_ms, client)),
        Arc::new(OutboxRepo { pool }),
        cfg.notify_queue_capacity,
    );

    let service = WebhookService {
        orders: orders.clone(),
        provider: provider.clone(),
        dispatcher,
        verifier: SignatureVerifier::new(cfg.midtrans.server_key.clone()),
        rules: ReconcileRules {
            notify_on_pending: cfg.notify_on_pending,
        },
        verify_with_provider: true,
    };

    loop {
        match poll_once(&service, orders.as_ref(), provider.as_ref(), cfg.poll_min_age_secs).await {
            Ok(0) => {}
            Ok(moved) => tracing::info!("status poll moved {} orders", moved),
            Err(err) => tracing::error!("status poll failed: {}", err),
        }
        tokio::time::sleep(Duration::from_secs(cfg.poll_interval_secs)).await;
    }
}
