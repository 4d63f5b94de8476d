use payment_webhook_relay::config::AppConfig;
use payment_webhook_relay::gateways::midtrans::MidtransGateway;
use payment_webhook_relay::gateways::PaymentProvider;
use payment_webhook_relay::http::middleware::rate_limit::RateLimitState;
use payment_webhook_relay::http::router::build_router;
use payment_webhook_relay::notifier::wapisender::{CallbackVerifier, WapisenderNotifier};
use payment_webhook_relay::notifier::Notifier;
use payment_webhook_relay::reconcile::transitions::ReconcileRules;
use payment_webhook_relay::repo::orders_repo::OrdersRepo;
use payment_webhook_relay::repo::outbox_repo::OutboxRepo;
use payment_webhook_relay::repo::store::{NotificationOutbox, OrderStore};
use payment_webhook_relay::service::notification_dispatcher::NotificationDispatcher;
use payment_webhook_relay::service::order_ids::OrderIdGenerator;
use payment_webhook_relay::service::order_service::OrderService;
use payment_webhook_relay::service::webhook_service::WebhookService;
use payment_webhook_relay::signature::SignatureVerifier;
use payment_webhook_relay::AppState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_millis(cfg.outbound_timeout_ms))
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let orders: Arc<dyn OrderStore> = Arc::new(OrdersRepo { pool: pool.clone() });
    let outbox: Arc<dyn NotificationOutbox> = Arc::new(OutboxRepo { pool: pool.clone() });

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(cfg.outbound_timeout_ms))
        .build()?;
    let provider: Arc<dyn PaymentProvider> = Arc::new(MidtransGateway::from_config(
        &cfg.midtrans,
        cfg.outbound_timeout_ms,
        client.clone(),
    ));
    let notifier: Arc<dyn Notifier> = Arc::new(WapisenderNotifier::from_config(
        &cfg.wapisender,
        cfg.outbound_timeout_ms,
        client,
    ));

    let (dispatcher, worker) = NotificationDispatcher::spawn(notifier, outbox, cfg.notify_queue_capacity);

    let order_service = OrderService {
        orders: orders.clone(),
        provider: provider.clone(),
        dispatcher: dispatcher.clone(),
        ids: OrderIdGenerator::new(),
    };
    let webhook_service = WebhookService {
        orders: orders.clone(),
        provider,
        dispatcher: dispatcher.clone(),
        verifier: SignatureVerifier::new(cfg.midtrans.server_key.clone()),
        rules: ReconcileRules {
            notify_on_pending: cfg.notify_on_pending,
        },
        verify_with_provider: cfg.midtrans.verify_status,
    };

    let redis_client = redis::Client::open(cfg.redis_url.clone())?;
    let state = AppState {
        order_service,
        webhook_service,
        dispatcher,
        orders,
        callback_verifier: CallbackVerifier::new(cfg.wapisender.api_key.clone()),
        redis_client: Some(redis_client.clone()),
    };

    let rate_limit = RateLimitState {
        redis_client,
        max_per_minute: cfg.rate_limit_per_minute,
        scope: "create-payment-link",
    };
    let app = build_router(state, cfg.internal_api_key.clone(), Some(rate_limit));

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // router and state are gone; let queued notifications finish
    if let Err(e) = worker.await {
        tracing::error!("notification worker ended abnormally: {}", e);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
