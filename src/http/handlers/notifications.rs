use crate::error::AppError;
use crate::repo::store::OutboxStatus;
use crate::service::notification_dispatcher::ReplayOutcome;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status = match q.status.as_deref() {
        None => OutboxStatus::Failed,
        Some(raw) => OutboxStatus::parse(raw)
            .ok_or_else(|| AppError::Validation(format!("unknown notification status {raw:?}")))?,
    };
    let limit = q.limit.unwrap_or(100).clamp(1, 500);
    let records = state.dispatcher.outbox().list_by_status(status, limit).await?;

    Ok(Json(serde_json::json!({
        "status": status,
        "count": records.len(),
        "notifications": records,
    })))
}

pub async fn retry_notification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let resp = match state.dispatcher.replay(id).await? {
        ReplayOutcome::Queued => (StatusCode::ACCEPTED, Json(serde_json::json!({"id": id, "queued": true}))),
        ReplayOutcome::NotFailed => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"id": id, "queued": false, "reason": "notification is not in FAILED state"})),
        ),
        ReplayOutcome::NotFound => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"id": id, "queued": false, "reason": "notification not found"})),
        ),
    };
    Ok(resp)
}
