use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use redis::AsyncCommands;

#[derive(Clone)]
pub struct RateLimitState {
    pub redis_client: redis::Client,
    pub max_per_minute: i64,
    pub scope: &'static str,
}

/// Fixed one-minute window per client IP. Fails open when redis is unavailable.
pub async fn enforce(State(state): State<RateLimitState>, request: Request<Body>, next: Next) -> Response {
    let ip = client_ip(&request);
    let key = format!(
        "rate:{}:{}:{}",
        state.scope,
        ip,
        chrono::Utc::now().format("%Y%m%d%H%M")
    );

    match state.redis_client.get_multiplexed_async_connection().await {
        Ok(mut conn) => {
            let count: i64 = conn.incr(&key, 1).await.unwrap_or(1);
            if count == 1 {
                let _: bool = conn.expire(&key, 120).await.unwrap_or(false);
            }
            if count > state.max_per_minute {
                tracing::warn!(ip = %ip, scope = state.scope, "rate limit exceeded");
                return (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded").into_response();
            }
        }
        Err(e) => tracing::debug!("rate limiter unavailable: {}", e),
    }

    next.run(request).await
}

fn client_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}
