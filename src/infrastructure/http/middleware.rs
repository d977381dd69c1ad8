//! HTTP Middleware
//!
//! 记录 4xx/5xx 状态码和慢请求。
//! 业务错误（errno != 0）在 `ApiError::into_response()` 中记录。

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::{Duration, Instant};

/// 超过该耗时的请求记录 warn（生成类接口除外）
pub const SLOW_REQUEST_THRESHOLD: Duration = Duration::from_secs(2);

/// 生成类接口等待外部 webhook，耗时只记录 info
const GENERATION_PREFIX: &str = "/api/generate/";

pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP client error"
        );
    } else if uri.path().starts_with(GENERATION_PREFIX) {
        tracing::info!(method = %method, uri = %uri, elapsed_ms, "Generation request finished");
    } else if started.elapsed() > SLOW_REQUEST_THRESHOLD {
        tracing::warn!(method = %method, uri = %uri, elapsed_ms, "Slow request");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::{get, post},
        Router,
    };
    use tower::util::ServiceExt;

    fn router() -> Router {
        Router::new()
            .route("/api/ping", get(|| async { "pong" }))
            .route("/api/missing", get(|| async { StatusCode::NOT_FOUND }))
            .route(
                "/api/generate/story",
                post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
            )
            .layer(axum::middleware::from_fn(request_logging_middleware))
    }

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let request = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        router().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_passes_responses_through() {
        assert_eq!(status_of("GET", "/api/ping").await, StatusCode::OK);
        assert_eq!(status_of("GET", "/api/missing").await, StatusCode::NOT_FOUND);
        assert_eq!(
            status_of("POST", "/api/generate/story").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
