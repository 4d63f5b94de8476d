use crate::domain::notification::{DeliveryReceipt, NotificationKind, Recipient};

pub mod message;
pub mod wapisender;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("messaging channel unreachable: {0}")]
    Transport(String),
    #[error("messaging channel returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// One call, one outbound message. Retrying is the caller's business.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: &Recipient, kind: &NotificationKind) -> Result<DeliveryReceipt, NotifyError>;
}
