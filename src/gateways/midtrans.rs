use crate::config::MidtransConfig;
use crate::domain::webhook::{FraudStatus, TransactionStatus};
use crate::gateways::{PaymentLink, PaymentLinkRequest, PaymentProvider, ProviderError, ProviderStatus};
use crate::secret::Secret;
use serde_json::json;
use std::time::Duration;

pub struct MidtransGateway {
    pub snap_base_url: String,
    pub api_base_url: String,
    pub server_key: Secret<String>,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

impl MidtransGateway {
    pub fn from_config(cfg: &MidtransConfig, timeout_ms: u64, client: reqwest::Client) -> Self {
        Self {
            snap_base_url: cfg.snap_base_url.trim_end_matches('/').to_string(),
            api_base_url: cfg.api_base_url.trim_end_matches('/').to_string(),
            server_key: cfg.server_key.clone(),
            timeout_ms,
            client,
        }
    }

    async fn read_json(resp: reqwest::Response) -> Result<serde_json::Value, ProviderError> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }
        serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}

#[async_trait::async_trait]
impl PaymentProvider for MidtransGateway {
    fn name(&self) -> &'static str {
        "midtrans"
    }

    async fn create_payment_link(&self, request: &PaymentLinkRequest) -> Result<PaymentLink, ProviderError> {
        let url = format!("{}/snap/v1/transactions", self.snap_base_url);
        let body = json!({
            "transaction_details": {
                "order_id": request.order_id,
                "gross_amount": request.gross_amount,
            },
            "customer_details": {
                "first_name": request.customer_name,
                "email": request.email,
                "phone": request.phone_number,
            },
        });

        let resp = self
            .client
            .post(url)
            .basic_auth(self.server_key.reveal(), Some(""))
            .header("Accept", "application/json")
            .json(&body)
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await?;

        let v = Self::read_json(resp).await?;
        let redirect_url = v
            .get("redirect_url")
            .and_then(|u| u.as_str())
            .ok_or_else(|| ProviderError::Malformed("missing redirect_url".to_string()))?;

        Ok(PaymentLink {
            redirect_url: redirect_url.to_string(),
        })
    }

    async fn transaction_status(&self, order_id: &str) -> Result<ProviderStatus, ProviderError> {
        let url = format!("{}/v2/{}/status", self.api_base_url, order_id);
        let resp = self
            .client
            .get(url)
            .basic_auth(self.server_key.reveal(), Some(""))
            .header("Accept", "application/json")
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await?;

        let v = Self::read_json(resp).await?;
        parse_status_body(&v)
    }
}

/// The Core API answers HTTP 200 even for unknown orders and puts the real
/// outcome in the body's `status_code`.
fn parse_status_body(v: &serde_json::Value) -> Result<ProviderStatus, ProviderError> {
    let body_code = v.get("status_code").and_then(|c| c.as_str()).unwrap_or("200");
    let raw = v
        .get("transaction_status")
        .and_then(|s| s.as_str())
        .ok_or_else(|| ProviderError::Rejected {
            status: body_code.parse().unwrap_or(404),
            body: v
                .get("status_message")
                .and_then(|m| m.as_str())
                .unwrap_or("no transaction_status")
                .to_string(),
        })?;

    Ok(ProviderStatus {
        transaction_status: TransactionStatus::from_wire(raw),
        fraud_status: v
            .get("fraud_status")
            .and_then(|f| f.as_str())
            .map(FraudStatus::from_wire),
        raw_transaction_status: raw.to_string(),
    })
}
