use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Settlement,
    Pending,
    Expire,
    PaymentLink { url: String },
}

impl NotificationKind {
    /// Ledger key; at most one notification per (order, key) is ever sent.
    pub fn ledger_key(&self) -> &'static str {
        match self {
            NotificationKind::Settlement => "SETTLEMENT",
            NotificationKind::Pending => "PENDING",
            NotificationKind::Expire => "EXPIRE",
            NotificationKind::PaymentLink { .. } => "PAYMENT_LINK",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub order_id: String,
    pub phone_number: String,
    pub customer_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub message_id: Option<String>,
    pub status_code: u16,
    pub body: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_kind_carries_url() {
        let kind = NotificationKind::PaymentLink { url: "https://pay/x".to_string() };
        let v = serde_json::to_value(&kind).unwrap();
        assert_eq!(v, serde_json::json!({"kind": "PAYMENT_LINK", "url": "https://pay/x"}));
        assert_eq!(kind.ledger_key(), "PAYMENT_LINK");
    }
}
