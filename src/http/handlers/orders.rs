use crate::domain::order::CreateOrderRequest;
use crate::error::AppError;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

pub async fn create_payment_link(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let resp = state.order_service.create_order(req).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

pub async fn retry_payment_link(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let resp = state.order_service.ensure_payment_link(&order_id).await?;
    Ok(Json(resp))
}

pub async fn payment_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let resp = state.order_service.payment_status(&order_id).await?;
    Ok(Json(resp))
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
