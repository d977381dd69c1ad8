//! Ping / Health Handlers

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::state::AppState;

/// Ping 响应
#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Ping endpoint - 存活检查
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// 依赖健康状态
#[derive(Serialize)]
pub struct HealthResponse {
    pub generation_service: bool,
}

/// Health endpoint - 检查生成服务是否可达
pub async fn health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthResponse>> {
    let generation_service = state.generation.health_check().await;
    if !generation_service {
        tracing::warn!("Generation service is unreachable");
    }

    Json(ApiResponse::success(HealthResponse { generation_service }))
}
