use crate::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// Wapisender delivery reports. Always answered 200 so the channel does not
/// retry; unverified or unmatched reports are only logged.
pub async fn wapisender_callback(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let ack = |verified: bool, recorded: bool| {
        (
            StatusCode::OK,
            Json(serde_json::json!({"received": true, "verified": verified, "recorded": recorded})),
        )
    };

    let event: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("unreadable delivery callback: {}", e);
            return ack(false, false);
        }
    };

    let Some(message_id) = state.callback_verifier.verified_message_id(&event) else {
        tracing::warn!("delivery callback hash verification failed");
        return ack(false, false);
    };

    match state.dispatcher.outbox().record_delivery(&message_id, event).await {
        Ok(Some(outbox_id)) => {
            tracing::info!(message_id = %message_id, outbox_id, "delivery callback recorded");
            ack(true, true)
        }
        Ok(None) => {
            tracing::info!(message_id = %message_id, "delivery callback for unknown message");
            ack(true, false)
        }
        Err(e) => {
            tracing::error!(message_id = %message_id, "could not record delivery callback: {}", e);
            ack(true, false)
        }
    }
}
