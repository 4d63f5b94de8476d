use crate::http::handlers::{delivery, notifications, ops, orders, webhook};
use crate::http::middleware::admin_auth::require_internal_api_key;
use crate::http::middleware::rate_limit::{self, RateLimitState};
use crate::secret::Secret;
use crate::AppState;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

pub fn build_router(state: AppState, admin_key: Secret<String>, rate_limit: Option<RateLimitState>) -> Router {
    let create_link = match rate_limit {
        Some(limits) => post(orders::create_payment_link).layer(from_fn_with_state(limits, rate_limit::enforce)),
        None => post(orders::create_payment_link),
    };

    let admin_routes = Router::new()
        .route("/admin/notifications", get(notifications::list_notifications))
        .route("/admin/notifications/:id/retry", post(notifications::retry_notification))
        .layer(from_fn_with_state(admin_key, require_internal_api_key));

    Router::new()
        .route("/health", get(orders::health))
        .route("/webhook", post(webhook::payment_notification))
        .route("/webhook/midtrans", post(webhook::payment_notification))
        .route("/wapisender-webhook", post(delivery::wapisender_callback))
        .route("/create-payment-link", create_link)
        .route("/orders/:order_id/payment-link", post(orders::retry_payment_link))
        .route("/payment-status/:order_id", get(orders::payment_status))
        .route("/ops/readiness", get(ops::readiness))
        .route("/ops/liveness", get(ops::liveness))
        .merge(admin_routes)
        .with_state(state)
}
