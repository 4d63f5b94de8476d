use crate::repo::store::{NotificationOutbox, OutboxRecord, OutboxStatus};
use anyhow::{anyhow, Result};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const OUTBOX_COLUMNS: &str =
    "id, order_id, kind, payload_json, status, attempts, last_error, receipt_json, delivery_json, created_at, updated_at";

#[derive(Clone)]
pub struct OutboxRepo {
    pub pool: PgPool,
}

fn map_record(r: PgRow) -> Result<OutboxRecord> {
    let status: String = r.try_get("status")?;
    Ok(OutboxRecord {
        id: r.try_get("id")?,
        order_id: r.try_get("order_id")?,
        kind: r.try_get("kind")?,
        payload_json: r.try_get("payload_json")?,
        status: OutboxStatus::parse(&status).ok_or_else(|| anyhow!("unknown outbox status {status}"))?,
        attempts: r.try_get("attempts")?,
        last_error: r.try_get("last_error")?,
        receipt_json: r.try_get("receipt_json")?,
        delivery_json: r.try_get("delivery_json")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait::async_trait]
impl NotificationOutbox for OutboxRepo {
    async fn claim(&self, order_id: &str, kind: &str, payload_json: serde_json::Value) -> Result<Option<i64>> {
        let row = sqlx::query(
            r#"
            INSERT INTO notification_outbox (order_id, kind, payload_json, status, attempts)
            VALUES ($1, $2, $3, 'PENDING', 0)
            ON CONFLICT (order_id, kind) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(order_id)
        .bind(kind)
        .bind(payload_json)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("id")))
    }

    async fn mark_sent(&self, id: i64, receipt_json: serde_json::Value) -> Result<()> {
        sqlx::query(
            "UPDATE notification_outbox SET status='SENT', attempts=attempts+1, receipt_json=$2, last_error=NULL, updated_at=now() WHERE id=$1",
        )
        .bind(id)
        .bind(receipt_json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_failed(&self, id: i64, error: &str) -> Result<()> {
        sqlx::query(
            "UPDATE notification_outbox SET status='FAILED', attempts=attempts+1, last_error=$2, updated_at=now() WHERE id=$1",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reopen(&self, id: i64) -> Result<bool> {
        let res = sqlx::query(
            "UPDATE notification_outbox SET status='PENDING', updated_at=now() WHERE id=$1 AND status='FAILED'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn get(&self, id: i64) -> Result<Option<OutboxRecord>> {
        let row = sqlx::query(&format!("SELECT {OUTBOX_COLUMNS} FROM notification_outbox WHERE id=$1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(map_record).transpose()
    }

    async fn list_by_status(&self, status: OutboxStatus, limit: i64) -> Result<Vec<OutboxRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {OUTBOX_COLUMNS} FROM notification_outbox WHERE status=$1 ORDER BY id ASC LIMIT $2"
        ))
        .bind(status.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(map_record).collect()
    }

    async fn record_delivery(&self, message_id: &str, event: serde_json::Value) -> Result<Option<i64>> {
        let row = sqlx::query(
            r#"
            UPDATE notification_outbox
            SET delivery_json = $2, updated_at = now()
            WHERE id = (
                SELECT id FROM notification_outbox
                WHERE receipt_json ->> 'message_id' = $1
                ORDER BY id DESC
                LIMIT 1
            )
            RETURNING id
            "#,
        )
        .bind(message_id)
        .bind(event)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("id")))
    }
}
