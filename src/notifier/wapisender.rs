use crate::config::WapisenderConfig;
use crate::domain::notification::{DeliveryReceipt, NotificationKind, Recipient};
use crate::notifier::message::render;
use crate::notifier::{Notifier, NotifyError};
use crate::secret::Secret;
use crate::signature::constant_time_eq;
use md5::{Digest, Md5};
use reqwest::multipart::Form;
use std::time::Duration;

pub struct WapisenderNotifier {
    pub base_url: String,
    pub api_key: Secret<String>,
    pub device_key: Secret<String>,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

impl WapisenderNotifier {
    pub fn from_config(cfg: &WapisenderConfig, timeout_ms: u64, client: reqwest::Client) -> Self {
        Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            device_key: cfg.device_key.clone(),
            timeout_ms,
            client,
        }
    }
}

#[async_trait::async_trait]
impl Notifier for WapisenderNotifier {
    async fn notify(&self, recipient: &Recipient, kind: &NotificationKind) -> Result<DeliveryReceipt, NotifyError> {
        let form = Form::new()
            .text("api_key", self.api_key.reveal().clone())
            .text("device_key", self.device_key.reveal().clone())
            .text("destination", recipient.phone_number.clone())
            .text("message", render(recipient, kind));

        let resp = self
            .client
            .post(format!("{}/message/text", self.base_url))
            .multipart(form)
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: text.chars().take(500).collect(),
            });
        }

        let body: serde_json::Value =
            serde_json::from_str(&text).unwrap_or_else(|_| serde_json::Value::String(text.clone()));
        Ok(DeliveryReceipt {
            message_id: extract_message_id(&body),
            status_code: status.as_u16(),
            body,
        })
    }
}

/// Checks the `hash` Wapisender puts on its delivery callbacks:
/// `md5(device_key + "#" + api_key + "#" + message_id)`, hex encoded.
#[derive(Clone)]
pub struct CallbackVerifier {
    api_key: Secret<String>,
}

impl CallbackVerifier {
    pub fn new(api_key: Secret<String>) -> Self {
        Self { api_key }
    }

    pub fn expected_hash(&self, device_key: &str, message_id: &str) -> String {
        let input = format!("{device_key}#{}#{message_id}", self.api_key.reveal());
        hex::encode(Md5::digest(input.as_bytes()))
    }

    /// Returns the callback's message id when its hash checks out.
    pub fn verified_message_id(&self, event: &serde_json::Value) -> Option<String> {
        let device_key = text_field(event, "device_key")?;
        let message_id = text_field(event, "message_id")?;
        let provided = text_field(event, "hash")?.trim().to_ascii_lowercase();
        let expected = self.expected_hash(&device_key, &message_id);
        constant_time_eq(expected.as_bytes(), provided.as_bytes()).then_some(message_id)
    }
}

fn text_field(event: &serde_json::Value, key: &str) -> Option<String> {
    match event.get(key)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn extract_message_id(body: &serde_json::Value) -> Option<String> {
    let data = body.get("data")?;
    ["id", "message_id"]
        .iter()
        .find_map(|k| data.get(*k))
        .map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
}
