use crate::domain::notification::{NotificationKind, Recipient};

pub fn render(recipient: &Recipient, kind: &NotificationKind) -> String {
    let name = display_name(&recipient.customer_name);
    let order_id = &recipient.order_id;
    match kind {
        NotificationKind::Settlement => format!(
            "Halo, {name}, pembayaran untuk order {order_id} berhasil. Terima kasih atas pembelian Anda."
        ),
        NotificationKind::Pending => {
            format!("Halo, {name}, pembayaran untuk order {order_id} sedang menunggu penyelesaian.")
        }
        NotificationKind::Expire => {
            format!("Halo, {name}, pembayaran untuk order {order_id} telah kedaluwarsa atau dibatalkan.")
        }
        NotificationKind::PaymentLink { url } => format!(
            "Halo, {name}, silakan selesaikan pembayaran untuk order {order_id} melalui tautan berikut: {url}"
        ),
    }
}

fn display_name(name: &str) -> &str {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        "Pelanggan"
    } else {
        trimmed
    }
}
