use crate::domain::webhook::{FraudStatus, TransactionStatus};
use serde::{Deserialize, Serialize};

pub mod midtrans;
pub mod mock;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("payment provider timed out")]
    Timeout,
    #[error("payment provider unreachable: {0}")]
    Transport(String),
    #[error("payment provider returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("payment provider response malformed: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentLinkRequest {
    pub order_id: String,
    pub gross_amount: i64,
    pub customer_name: String,
    pub email: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentLink {
    pub redirect_url: String,
}

/// Provider's own view of a transaction, used as the authority over
/// whatever the notification body claims.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderStatus {
    pub transaction_status: TransactionStatus,
    pub fraud_status: Option<FraudStatus>,
    pub raw_transaction_status: String,
}

#[async_trait::async_trait]
pub trait PaymentProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_payment_link(&self, request: &PaymentLinkRequest) -> Result<PaymentLink, ProviderError>;

    async fn transaction_status(&self, order_id: &str) -> Result<ProviderStatus, ProviderError>;
}
