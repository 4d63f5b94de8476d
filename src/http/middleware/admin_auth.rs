use crate::secret::Secret;
use crate::signature::constant_time_eq;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

pub const ADMIN_KEY_HEADER: &str = "X-Internal-Api-Key";

pub async fn require_internal_api_key(
    State(expected): State<Secret<String>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if provided.is_empty() || !constant_time_eq(provided.as_bytes(), expected.reveal().as_bytes()) {
        return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }

    next.run(request).await
}
