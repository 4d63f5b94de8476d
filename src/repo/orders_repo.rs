use crate::domain::order::{Order, PaymentStatus};
use crate::repo::store::{OrderStore, StaleCursor};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const ORDER_COLUMNS: &str = "order_id, customer_name, phone_number, email, gross_amount, payment_url, payment_status, created_at, updated_at";

#[derive(Clone)]
pub struct OrdersRepo {
    pub pool: PgPool,
}

fn map_order(r: PgRow) -> Result<Order> {
    let status: String = r.try_get("payment_status")?;
    Ok(Order {
        order_id: r.try_get("order_id")?,
        customer_name: r.try_get("customer_name")?,
        phone_number: r.try_get("phone_number")?,
        email: r.try_get("email")?,
        gross_amount: r.try_get("gross_amount")?,
        payment_url: r.try_get("payment_url")?,
        payment_status: status.parse()?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait::async_trait]
impl OrderStore for OrdersRepo {
    async fn insert(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                order_id, customer_name, phone_number, email, gross_amount,
                payment_url, payment_status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&order.order_id)
        .bind(&order.customer_name)
        .bind(&order.phone_number)
        .bind(&order.email)
        .bind(order.gross_amount)
        .bind(&order.payment_url)
        .bind(order.payment_status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, order_id: &str) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1"))
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(map_order).transpose()
    }

    async fn set_payment_url(&self, order_id: &str, payment_url: &str) -> Result<()> {
        sqlx::query("UPDATE orders SET payment_url = $2, updated_at = now() WHERE order_id = $1")
            .bind(order_id)
            .bind(payment_url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn compare_and_set_status(
        &self,
        order_id: &str,
        expected: PaymentStatus,
        new: PaymentStatus,
    ) -> Result<bool> {
        let res = sqlx::query(
            "UPDATE orders SET payment_status = $3, updated_at = now() WHERE order_id = $1 AND payment_status = $2",
        )
        .bind(order_id)
        .bind(expected.as_str())
        .bind(new.as_str())
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn list_stale_pending(
        &self,
        created_before: DateTime<Utc>,
        after: Option<&StaleCursor>,
        limit: i64,
    ) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE payment_status = 'pending'
              AND created_at <= $1
              AND ($2::timestamptz IS NULL OR (created_at, order_id) > ($2, $3))
            ORDER BY created_at ASC, order_id ASC
            LIMIT $4
            "#
        ))
        .bind(created_before)
        .bind(after.map(|c| c.created_at))
        .bind(after.map(|c| c.order_id.clone()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(map_order).collect()
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
