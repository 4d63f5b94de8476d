use crate::error::AppError;
use crate::signature::SIGNATURE_HEADER;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

/// Midtrans retries until it sees a 2xx, so every outcome that should not be
/// redelivered (handled, replayed, unhandled status) answers 200.
pub async fn payment_notification(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let header_signature = headers.get(SIGNATURE_HEADER).and_then(|h| h.to_str().ok());
    let outcome = state.webhook_service.handle(&body, header_signature).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "order_id": outcome.order_id,
            "payment_status": outcome.current_status,
            "notification_scheduled": outcome.notification_scheduled,
        })),
    ))
}
