use crate::domain::notification::NotificationKind;
use crate::domain::order::PaymentStatus;
use crate::domain::webhook::{FraudStatus, TransactionStatus};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileRules {
    pub notify_on_pending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The event moves the order into a new state.
    Transition,
    /// Recognized event that leaves the state as is (pending, challenged capture, repeat).
    NoChange,
    /// The order is already terminal; the event is a replay or arrived out of order.
    AlreadyTerminal,
    /// Status the relay deliberately does not act on. Acknowledged, never mutated.
    Unhandled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub new_status: PaymentStatus,
    pub notification: Option<NotificationKind>,
    pub disposition: Disposition,
}

impl Reconciled {
    fn unchanged(current: PaymentStatus, disposition: Disposition) -> Self {
        Self {
            new_status: current,
            notification: None,
            disposition,
        }
    }

    pub fn changes(&self, current: PaymentStatus) -> bool {
        self.new_status != current
    }
}

pub fn reconcile(
    current: PaymentStatus,
    transaction_status: TransactionStatus,
    fraud_status: Option<FraudStatus>,
    rules: &ReconcileRules,
) -> Reconciled {
    if transaction_status == TransactionStatus::Unrecognized {
        return Reconciled::unchanged(current, Disposition::Unhandled);
    }
    if current.is_terminal() {
        return Reconciled::unchanged(current, Disposition::AlreadyTerminal);
    }

    let (target, notification) = match (transaction_status, fraud_status) {
        (TransactionStatus::Capture, Some(FraudStatus::Accept)) => {
            (PaymentStatus::Settlement, Some(NotificationKind::Settlement))
        }
        // challenged or unscored card captures wait for a follow-up event
        (TransactionStatus::Capture, _) => (current, None),
        (TransactionStatus::Settlement, _) => (PaymentStatus::Settlement, Some(NotificationKind::Settlement)),
        (TransactionStatus::Pending, _) => (
            PaymentStatus::Pending,
            rules.notify_on_pending.then_some(NotificationKind::Pending),
        ),
        (TransactionStatus::Expire, _) => (PaymentStatus::Expire, Some(NotificationKind::Expire)),
        (TransactionStatus::Cancel | TransactionStatus::Deny, _) => {
            (PaymentStatus::Failure, Some(NotificationKind::Expire))
        }
        (TransactionStatus::Unrecognized, _) => (current, None),
    };

    Reconciled {
        new_status: target,
        disposition: if target != current {
            Disposition::Transition
        } else {
            Disposition::NoChange
        },
        notification,
    }
}

/// Message a terminal status stands for. A redelivered event uses it to claim
/// a notification whose ledger row was never written.
pub fn terminal_notification(status: PaymentStatus) -> Option<NotificationKind> {
    match status {
        PaymentStatus::Settlement => Some(NotificationKind::Settlement),
        PaymentStatus::Failure | PaymentStatus::Expire => Some(NotificationKind::Expire),
        PaymentStatus::Pending => None,
    }
}
