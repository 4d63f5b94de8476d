use crate::domain::order::{Order, PaymentStatus};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<()>;

    async fn get(&self, order_id: &str) -> Result<Option<Order>>;

    async fn set_payment_url(&self, order_id: &str, payment_url: &str) -> Result<()>;

    /// Writes `new` only if the stored status is still `expected`.
    /// Returns false when another writer got there first.
    async fn compare_and_set_status(
        &self,
        order_id: &str,
        expected: PaymentStatus,
        new: PaymentStatus,
    ) -> Result<bool>;

    /// Pending orders created at or before `created_before`, in
    /// `(created_at, order_id)` order, starting after `after` when given.
    async fn list_stale_pending(
        &self,
        created_before: DateTime<Utc>,
        after: Option<&StaleCursor>,
        limit: i64,
    ) -> Result<Vec<Order>>;

    async fn ping(&self) -> Result<()>;
}

/// Keyset position for paging through stale pending orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleCursor {
    pub created_at: DateTime<Utc>,
    pub order_id: String,
}

impl From<&Order> for StaleCursor {
    fn from(order: &Order) -> Self {
        Self {
            created_at: order.created_at,
            order_id: order.order_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboxStatus {
    Pending,
    Sent,
    Failed,
}

impl OutboxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OutboxStatus::Pending => "PENDING",
            OutboxStatus::Sent => "SENT",
            OutboxStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Some(OutboxStatus::Pending),
            "SENT" => Some(OutboxStatus::Sent),
            "FAILED" => Some(OutboxStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxRecord {
    pub id: i64,
    pub order_id: String,
    pub kind: String,
    pub payload_json: serde_json::Value,
    pub status: OutboxStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub receipt_json: Option<serde_json::Value>,
    /// Last delivery callback the messaging channel sent for this message.
    pub delivery_json: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ledger of outbound notifications, unique per (order_id, kind).
#[async_trait::async_trait]
pub trait NotificationOutbox: Send + Sync {
    /// Returns the new row id, or None if this (order_id, kind) was already claimed.
    async fn claim(&self, order_id: &str, kind: &str, payload_json: serde_json::Value) -> Result<Option<i64>>;

    async fn mark_sent(&self, id: i64, receipt_json: serde_json::Value) -> Result<()>;

    async fn mark_failed(&self, id: i64, error: &str) -> Result<()>;

    /// FAILED -> PENDING so the row can be replayed. False if it was not FAILED.
    async fn reopen(&self, id: i64) -> Result<bool>;

    async fn get(&self, id: i64) -> Result<Option<OutboxRecord>>;

    async fn list_by_status(&self, status: OutboxStatus, limit: i64) -> Result<Vec<OutboxRecord>>;

    /// Attaches a delivery callback to the row whose receipt carries
    /// `message_id`. Returns that row's id, or None if no row matches.
    async fn record_delivery(&self, message_id: &str, event: serde_json::Value) -> Result<Option<i64>>;
}
