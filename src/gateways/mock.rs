use crate::domain::webhook::{FraudStatus, TransactionStatus};
use crate::gateways::{PaymentLink, PaymentLinkRequest, PaymentProvider, ProviderError, ProviderStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Scriptable stand-in for the payment provider.
///
/// `redirect_template` may contain `{order_id}`. Behaviour `ALWAYS_FAILURE`
/// makes link creation fail with HTTP 500, `ALWAYS_TIMEOUT` with a timeout.
#[derive(Clone)]
pub struct MockProvider {
    pub redirect_template: String,
    pub behavior: Arc<RwLock<String>>,
    statuses: Arc<RwLock<HashMap<String, ProviderStatus>>>,
    link_calls: Arc<RwLock<Vec<PaymentLinkRequest>>>,
}

impl MockProvider {
    pub fn new(redirect_template: &str) -> Self {
        Self {
            redirect_template: redirect_template.to_string(),
            behavior: Arc::new(RwLock::new("ALWAYS_SUCCESS".to_string())),
            statuses: Arc::new(RwLock::new(HashMap::new())),
            link_calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn set_behavior(&self, behavior: &str) {
        *self.behavior.write().await = behavior.to_string();
    }

    pub async fn set_status(&self, order_id: &str, transaction_status: &str, fraud_status: Option<&str>) {
        self.statuses.write().await.insert(
            order_id.to_string(),
            ProviderStatus {
                transaction_status: TransactionStatus::from_wire(transaction_status),
                fraud_status: fraud_status.map(FraudStatus::from_wire),
                raw_transaction_status: transaction_status.to_string(),
            },
        );
    }

    pub async fn link_calls(&self) -> Vec<PaymentLinkRequest> {
        self.link_calls.read().await.clone()
    }
}

#[async_trait::async_trait]
impl PaymentProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_payment_link(&self, request: &PaymentLinkRequest) -> Result<PaymentLink, ProviderError> {
        self.link_calls.write().await.push(request.clone());
        match self.behavior.read().await.as_str() {
            "ALWAYS_FAILURE" => Err(ProviderError::Rejected {
                status: 500,
                body: "mock provider failure".to_string(),
            }),
            "ALWAYS_TIMEOUT" => Err(ProviderError::Timeout),
            _ => Ok(PaymentLink {
                redirect_url: self.redirect_template.replace("{order_id}", &request.order_id),
            }),
        }
    }

    async fn transaction_status(&self, order_id: &str) -> Result<ProviderStatus, ProviderError> {
        self.statuses
            .read()
            .await
            .get(order_id)
            .cloned()
            .ok_or_else(|| ProviderError::Rejected {
                status: 404,
                body: "Transaction doesn't exist.".to_string(),
            })
    }
}
