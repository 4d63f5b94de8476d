use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Capture,
    Settlement,
    Pending,
    Cancel,
    Deny,
    Expire,
    /// Anything else the provider may send (refund, authorize, ...).
    Unrecognized,
}

impl TransactionStatus {
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "capture" => TransactionStatus::Capture,
            "settlement" => TransactionStatus::Settlement,
            "pending" => TransactionStatus::Pending,
            "cancel" => TransactionStatus::Cancel,
            "deny" => TransactionStatus::Deny,
            "expire" => TransactionStatus::Expire,
            _ => TransactionStatus::Unrecognized,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudStatus {
    Accept,
    Challenge,
    Deny,
    Unrecognized,
}

impl FraudStatus {
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "accept" => FraudStatus::Accept,
            "challenge" => FraudStatus::Challenge,
            "deny" => FraudStatus::Deny,
            _ => FraudStatus::Unrecognized,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub phone: Option<String>,
    pub first_name: Option<String>,
}

/// Raw HTTP notification body as posted by Midtrans.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MidtransNotification {
    #[serde(default)]
    pub order_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub status_code: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub gross_amount: String,
    pub signature_key: Option<String>,
    #[serde(default)]
    pub transaction_status: String,
    pub fraud_status: Option<String>,
    pub transaction_id: Option<String>,
    pub payment_type: Option<String>,
    pub customer_details: Option<CustomerDetails>,
}

impl MidtransNotification {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.order_id.trim().is_empty() {
            missing.push("order_id");
        }
        if self.status_code.trim().is_empty() {
            missing.push("status_code");
        }
        if self.gross_amount.trim().is_empty() {
            missing.push("gross_amount");
        }
        if self.transaction_status.trim().is_empty() {
            missing.push("transaction_status");
        }
        missing
    }

    pub fn to_event(&self) -> WebhookEvent {
        WebhookEvent {
            order_id: self.order_id.clone(),
            transaction_status: TransactionStatus::from_wire(&self.transaction_status),
            fraud_status: self.fraud_status.as_deref().map(FraudStatus::from_wire),
            raw_transaction_status: self.transaction_status.clone(),
        }
    }
}

/// Transaction-status event for one order, whatever its source.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub order_id: String,
    pub transaction_status: TransactionStatus,
    pub fraud_status: Option<FraudStatus>,
    pub raw_transaction_status: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}
