use crate::domain::order::{ErrorEnvelope, ErrorPayload};
use crate::gateways::ProviderError;
use crate::signature::SignatureError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("webhook authentication failed: {0}")]
    Authentication(#[from] SignatureError),
    #[error("order {0} not found")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("payment link unavailable for order {order_id}: {source}")]
    PaymentLink {
        order_id: String,
        #[source]
        source: ProviderError,
    },
    #[error("upstream failure: {0}")]
    Upstream(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PaymentLink { .. } => StatusCode::BAD_GATEWAY,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Authentication(_) => "INVALID_SIGNATURE",
            AppError::NotFound(_) => "ORDER_NOT_FOUND",
            AppError::Validation(_) => "INVALID_REQUEST",
            AppError::PaymentLink { .. } => "PAYMENT_LINK_UNAVAILABLE",
            AppError::Upstream(_) => "INTERNAL_ERROR",
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        let details = match self {
            AppError::PaymentLink { order_id, .. } => Some(order_id.clone()),
            _ => None,
        };
        ErrorEnvelope {
            error: ErrorPayload {
                code: self.code().to_string(),
                message: self.to_string(),
                details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Upstream(e) = &self {
            tracing::error!(error = %e, "request failed on upstream dependency");
        }
        (self.status(), Json(self.envelope())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_status_codes() {
        assert_eq!(AppError::from(SignatureError::Mismatch).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("order-999".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Validation("bad".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::from(anyhow::anyhow!("db down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn payment_link_error_exposes_order_id() {
        let err = AppError::PaymentLink {
            order_id: "order-1".into(),
            source: ProviderError::Timeout,
        };
        let env = err.envelope();
        assert_eq!(env.error.code, "PAYMENT_LINK_UNAVAILABLE");
        assert_eq!(env.error.details.as_deref(), Some("order-1"));
    }
}
