use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Settlement,
    Failure,
    Expire,
}

impl PaymentStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Settlement => "settlement",
            PaymentStatus::Failure => "failure",
            PaymentStatus::Expire => "expire",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            // "success" is the legacy spelling of a settled payment
            "settlement" | "success" => Ok(PaymentStatus::Settlement),
            "failure" => Ok(PaymentStatus::Failure),
            "expire" => Ok(PaymentStatus::Expire),
            other => Err(anyhow::anyhow!("unknown payment status {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub customer_name: String,
    pub phone_number: String,
    pub email: String,
    pub gross_amount: i64,
    pub payment_url: Option<String>,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new_pending(order_id: String, req: &CreateOrderRequest, now: DateTime<Utc>) -> Self {
        Self {
            order_id,
            customer_name: req.customer_name.trim().to_string(),
            phone_number: req.phone_number.trim().to_string(),
            email: req.email.trim().to_string(),
            gross_amount: req.gross_amount,
            payment_url: None,
            payment_status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub phone_number: String,
    pub email: String,
    pub gross_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub payment_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub order_id: String,
    pub payment_status: PaymentStatus,
    pub payment_url: Option<String>,
}

impl From<&Order> for PaymentStatusResponse {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id.clone(),
            payment_status: order.payment_status,
            payment_url: order.payment_url.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}
