use crate::domain::order::{Order, PaymentStatus};
use crate::repo::store::{NotificationOutbox, OrderStore, OutboxRecord, OutboxStatus, StaleCursor};
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Order store kept in process memory. Used by tests and database-less local runs.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<String, Order>>>,
    writes: Arc<RwLock<u64>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful mutations so far.
    pub async fn write_count(&self) -> u64 {
        *self.writes.read().await
    }

    async fn bump(&self) {
        *self.writes.write().await += 1;
    }
}

#[async_trait::async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        {
            let mut orders = self.orders.write().await;
            if orders.contains_key(&order.order_id) {
                bail!("duplicate order_id {}", order.order_id);
            }
            orders.insert(order.order_id.clone(), order.clone());
        }
        self.bump().await;
        Ok(())
    }

    async fn get(&self, order_id: &str) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(order_id).cloned())
    }

    async fn set_payment_url(&self, order_id: &str, payment_url: &str) -> Result<()> {
        {
            let mut orders = self.orders.write().await;
            let Some(order) = orders.get_mut(order_id) else {
                return Ok(());
            };
            order.payment_url = Some(payment_url.to_string());
            order.updated_at = Utc::now();
        }
        self.bump().await;
        Ok(())
    }

    async fn compare_and_set_status(
        &self,
        order_id: &str,
        expected: PaymentStatus,
        new: PaymentStatus,
    ) -> Result<bool> {
        {
            let mut orders = self.orders.write().await;
            match orders.get_mut(order_id) {
                Some(order) if order.payment_status == expected => {
                    order.payment_status = new;
                    order.updated_at = Utc::now();
                }
                _ => return Ok(false),
            }
        }
        self.bump().await;
        Ok(true)
    }

    async fn list_stale_pending(
        &self,
        created_before: DateTime<Utc>,
        after: Option<&StaleCursor>,
        limit: i64,
    ) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut stale: Vec<Order> = orders
            .values()
            .filter(|o| o.payment_status == PaymentStatus::Pending && o.created_at <= created_before)
            .filter(|o| match after {
                None => true,
                Some(c) => (o.created_at, o.order_id.as_str()) > (c.created_at, c.order_id.as_str()),
            })
            .cloned()
            .collect();
        stale.sort_by(|a, b| (a.created_at, &a.order_id).cmp(&(b.created_at, &b.order_id)));
        stale.truncate(limit.max(0) as usize);
        Ok(stale)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryOutbox {
    records: Arc<RwLock<Vec<OutboxRecord>>>,
}

impl InMemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<OutboxRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait::async_trait]
impl NotificationOutbox for InMemoryOutbox {
    async fn claim(&self, order_id: &str, kind: &str, payload_json: serde_json::Value) -> Result<Option<i64>> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.order_id == order_id && r.kind == kind) {
            return Ok(None);
        }
        let id = records.len() as i64 + 1;
        let now = Utc::now();
        records.push(OutboxRecord {
            id,
            order_id: order_id.to_string(),
            kind: kind.to_string(),
            payload_json,
            status: OutboxStatus::Pending,
            attempts: 0,
            last_error: None,
            receipt_json: None,
            delivery_json: None,
            created_at: now,
            updated_at: now,
        });
        Ok(Some(id))
    }

    async fn mark_sent(&self, id: i64, receipt_json: serde_json::Value) -> Result<()> {
        let mut records = self.records.write().await;
        if let Some(r) = records.iter_mut().find(|r| r.id == id) {
            r.status = OutboxStatus::Sent;
            r.attempts += 1;
            r.receipt_json = Some(receipt_json);
            r.last_error = None;
            r.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_failed(&self, id: i64, error: &str) -> Result<()> {
        let mut records = self.records.write().await;
        if let Some(r) = records.iter_mut().find(|r| r.id == id) {
            r.status = OutboxStatus::Failed;
            r.attempts += 1;
            r.last_error = Some(error.to_string());
            r.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn reopen(&self, id: i64) -> Result<bool> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.id == id) {
            Some(r) if r.status == OutboxStatus::Failed => {
                r.status = OutboxStatus::Pending;
                r.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get(&self, id: i64) -> Result<Option<OutboxRecord>> {
        Ok(self.records.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn list_by_status(&self, status: OutboxStatus, limit: i64) -> Result<Vec<OutboxRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.status == status)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn record_delivery(&self, message_id: &str, event: serde_json::Value) -> Result<Option<i64>> {
        let mut records = self.records.write().await;
        let matching = records.iter_mut().rev().find(|r| {
            r.receipt_json
                .as_ref()
                .and_then(|v| v.get("message_id"))
                .and_then(|v| v.as_str())
                == Some(message_id)
        });
        Ok(matching.map(|r| {
            r.delivery_json = Some(event);
            r.updated_at = Utc::now();
            r.id
        }))
    }
}
