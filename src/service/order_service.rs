use crate::domain::notification::{NotificationKind, Recipient};
use crate::domain::order::{CreateOrderRequest, CreateOrderResponse, Order, PaymentStatusResponse};
use crate::error::AppError;
use crate::gateways::{PaymentLinkRequest, PaymentProvider};
use crate::repo::store::OrderStore;
use crate::service::notification_dispatcher::NotificationDispatcher;
use crate::service::order_ids::OrderIdGenerator;
use std::sync::Arc;

#[derive(Clone)]
pub struct OrderService {
    pub orders: Arc<dyn OrderStore>,
    pub provider: Arc<dyn PaymentProvider>,
    pub dispatcher: NotificationDispatcher,
    pub ids: OrderIdGenerator,
}

impl OrderService {
    /// Persists the order as pending first, then asks the provider for a link.
    /// A provider failure leaves the order stored without a URL; the caller
    /// can retry with [`OrderService::ensure_payment_link`].
    pub async fn create_order(&self, req: CreateOrderRequest) -> Result<CreateOrderResponse, AppError> {
        validate_request(&req)?;

        let order = Order::new_pending(self.ids.next_id(), &req, chrono::Utc::now());
        self.orders.insert(&order).await?;
        tracing::info!(order_id = %order.order_id, gross_amount = order.gross_amount, "order created");

        let payment_url = self.request_link(&order).await?;
        Ok(CreateOrderResponse {
            order_id: order.order_id,
            payment_url,
        })
    }

    pub async fn ensure_payment_link(&self, order_id: &str) -> Result<CreateOrderResponse, AppError> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(order_id.to_string()))?;

        if let Some(url) = &order.payment_url {
            return Ok(CreateOrderResponse {
                order_id: order.order_id.clone(),
                payment_url: url.clone(),
            });
        }
        if order.payment_status.is_terminal() {
            return Err(AppError::Validation(format!(
                "order {} is already {}",
                order.order_id, order.payment_status
            )));
        }

        let payment_url = self.request_link(&order).await?;
        Ok(CreateOrderResponse {
            order_id: order.order_id,
            payment_url,
        })
    }

    pub async fn payment_status(&self, order_id: &str) -> Result<PaymentStatusResponse, AppError> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(order_id.to_string()))?;
        Ok(PaymentStatusResponse::from(&order))
    }

    async fn request_link(&self, order: &Order) -> Result<String, AppError> {
        let request = PaymentLinkRequest {
            order_id: order.order_id.clone(),
            gross_amount: order.gross_amount,
            customer_name: order.customer_name.clone(),
            email: order.email.clone(),
            phone_number: order.phone_number.clone(),
        };

        let link = self.provider.create_payment_link(&request).await.map_err(|source| {
            tracing::warn!(order_id = %order.order_id, provider = self.provider.name(), "payment link request failed: {}", source);
            AppError::PaymentLink {
                order_id: order.order_id.clone(),
                source,
            }
        })?;

        self.orders
            .set_payment_url(&order.order_id, &link.redirect_url)
            .await?;

        let recipient = Recipient {
            order_id: order.order_id.clone(),
            phone_number: order.phone_number.clone(),
            customer_name: order.customer_name.clone(),
        };
        let kind = NotificationKind::PaymentLink {
            url: link.redirect_url.clone(),
        };
        if let Err(err) = self.dispatcher.claim_and_dispatch(recipient, kind).await {
            tracing::warn!(order_id = %order.order_id, "could not queue payment link message: {}", err);
        }

        Ok(link.redirect_url)
    }
}

fn validate_request(req: &CreateOrderRequest) -> Result<(), AppError> {
    if req.customer_name.trim().is_empty() {
        return Err(AppError::Validation("customerName must not be empty".to_string()));
    }
    if !is_valid_phone(req.phone_number.trim()) {
        return Err(AppError::Validation(
            "phoneNumber must be 8-15 digits, optionally prefixed with '+'".to_string(),
        ));
    }
    let email = req.email.trim();
    if email.len() < 3 || !email.contains('@') {
        return Err(AppError::Validation("email is not valid".to_string()));
    }
    if req.gross_amount <= 0 {
        return Err(AppError::Validation("grossAmount must be > 0".to_string()));
    }
    Ok(())
}

fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (8..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}
