use crate::domain::notification::{NotificationKind, Recipient};
use crate::notifier::Notifier;
use crate::repo::store::{NotificationOutbox, OutboxStatus};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationJob {
    pub outbox_id: i64,
    pub recipient: Recipient,
    pub kind: NotificationKind,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredPayload {
    recipient: Recipient,
    kind: NotificationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOutcome {
    Queued,
    NotFailed,
    NotFound,
}

/// Sends notifications off the request path.
///
/// Jobs go through a bounded queue drained by a single worker. The worker
/// stops once every dispatcher clone has been dropped and the queue is empty.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<NotificationJob>,
    outbox: Arc<dyn NotificationOutbox>,
}

impl NotificationDispatcher {
    pub fn spawn(
        notifier: Arc<dyn Notifier>,
        outbox: Arc<dyn NotificationOutbox>,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(rx, notifier, outbox.clone()));
        (Self { tx, outbox }, worker)
    }

    pub fn outbox(&self) -> &Arc<dyn NotificationOutbox> {
        &self.outbox
    }

    /// Records the notification in the ledger and queues it. Returns false
    /// when this (order, kind) was already claimed, in which case nothing is sent.
    pub async fn claim_and_dispatch(&self, recipient: Recipient, kind: NotificationKind) -> Result<bool> {
        let payload = serde_json::to_value(StoredPayload {
            recipient: recipient.clone(),
            kind: kind.clone(),
        })?;
        let Some(outbox_id) = self
            .outbox
            .claim(&recipient.order_id, kind.ledger_key(), payload)
            .await?
        else {
            tracing::debug!(order_id = %recipient.order_id, kind = kind.ledger_key(), "notification already claimed");
            return Ok(false);
        };

        self.enqueue(NotificationJob {
            outbox_id,
            recipient,
            kind,
        })
        .await?;
        Ok(true)
    }

    /// Puts a FAILED ledger row back on the queue.
    pub async fn replay(&self, outbox_id: i64) -> Result<ReplayOutcome> {
        let Some(record) = self.outbox.get(outbox_id).await? else {
            return Ok(ReplayOutcome::NotFound);
        };
        if record.status != OutboxStatus::Failed {
            return Ok(ReplayOutcome::NotFailed);
        }
        let payload: StoredPayload = serde_json::from_value(record.payload_json)
            .map_err(|e| anyhow!("outbox row {outbox_id} has unreadable payload: {e}"))?;
        if !self.outbox.reopen(outbox_id).await? {
            return Ok(ReplayOutcome::NotFailed);
        }

        self.enqueue(NotificationJob {
            outbox_id,
            recipient: payload.recipient,
            kind: payload.kind,
        })
        .await?;
        Ok(ReplayOutcome::Queued)
    }

    async fn enqueue(&self, job: NotificationJob) -> Result<()> {
        match self.tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(job)) => {
                tracing::warn!(order_id = %job.recipient.order_id, outbox_id = job.outbox_id, "notification queue full");
                self.outbox.mark_failed(job.outbox_id, "notification queue full").await
            }
            Err(TrySendError::Closed(job)) => {
                tracing::error!(order_id = %job.recipient.order_id, outbox_id = job.outbox_id, "notification worker stopped");
                self.outbox.mark_failed(job.outbox_id, "notification worker stopped").await
            }
        }
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<NotificationJob>,
    notifier: Arc<dyn Notifier>,
    outbox: Arc<dyn NotificationOutbox>,
) {
    while let Some(job) = rx.recv().await {
        if let Err(err) = deliver(notifier.as_ref(), outbox.as_ref(), &job).await {
            tracing::error!(outbox_id = job.outbox_id, "could not record notification outcome: {}", err);
        }
    }
    tracing::debug!("notification worker drained");
}

/// Sends one job and records the outcome in the ledger.
pub async fn deliver(notifier: &dyn Notifier, outbox: &dyn NotificationOutbox, job: &NotificationJob) -> Result<()> {
    match notifier.notify(&job.recipient, &job.kind).await {
        Ok(receipt) => {
            tracing::info!(
                order_id = %job.recipient.order_id,
                kind = job.kind.ledger_key(),
                message_id = receipt.message_id.as_deref().unwrap_or("-"),
                "notification sent"
            );
            outbox.mark_sent(job.outbox_id, serde_json::to_value(&receipt)?).await
        }
        Err(err) => {
            tracing::warn!(
                order_id = %job.recipient.order_id,
                kind = job.kind.ledger_key(),
                "notification failed: {}",
                err
            );
            outbox.mark_failed(job.outbox_id, &err.to_string()).await
        }
    }
}
