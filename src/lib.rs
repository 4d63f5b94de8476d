//! Relays Midtrans payment notifications to customers over WhatsApp while
//! keeping each order's payment status.
//!
//! Inbound notifications are authenticated, reconciled against the stored
//! order, persisted with compare-and-set, and answered before the customer
//! message goes out on a background queue. A ledger keyed by
//! `(order_id, kind)` keeps provider retries from producing duplicate messages.

pub mod config;
pub mod domain {
    pub mod notification;
    pub mod order;
    pub mod webhook;
}
pub mod error;
pub mod gateways;
pub mod http {
    pub mod handlers {
        pub mod delivery;
        pub mod notifications;
        pub mod ops;
        pub mod orders;
        pub mod webhook;
    }
    pub mod middleware {
        pub mod admin_auth;
        pub mod rate_limit;
    }
    pub mod router;
}
pub mod notifier;
pub mod reconcile {
    pub mod transitions;
}
pub mod repo {
    pub mod in_memory;
    pub mod orders_repo;
    pub mod outbox_repo;
    pub mod store;
}
pub mod secret;
pub mod service {
    pub mod notification_dispatcher;
    pub mod order_ids;
    pub mod order_service;
    pub mod status_poller;
    pub mod webhook_service;
}
pub mod signature;

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub order_service: service::order_service::OrderService,
    pub webhook_service: service::webhook_service::WebhookService,
    pub dispatcher: service::notification_dispatcher::NotificationDispatcher,
    pub orders: Arc<dyn repo::store::OrderStore>,
    pub callback_verifier: notifier::wapisender::CallbackVerifier,
    pub redis_client: Option<redis::Client>,
}
