//! Generation HTTP Handlers
//!
//! 请求会一直挂起直到 webhook 返回（或超时），结果同时通过 `/ws/events` 广播

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    ContinueStory, GenerateStory, GenerationOperation, GenerationOutcome, RefineStory,
};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateStoryRequest {
    pub title: String,
    pub genre: String,
    pub tone: String,
    pub prompt: String,
    pub chapters: u32,
    pub words: u32,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RefineStoryRequest {
    pub story_id: Uuid,
    pub instructions: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ContinueStoryRequest {
    pub story_id: Uuid,
    pub prompt: String,
    pub words: u32,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct GenerationResponseDto {
    pub story_id: Uuid,
    pub operation: GenerationOperation,
    pub title: String,
    pub content: String,
    pub chapter_count: usize,
}

impl From<GenerationOutcome> for GenerationResponseDto {
    fn from(outcome: GenerationOutcome) -> Self {
        Self {
            story_id: outcome.story_id,
            operation: outcome.operation,
            title: outcome.title,
            content: outcome.content,
            chapter_count: outcome.chapter_count,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// 根据参数生成新故事
pub async fn generate_story(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateStoryRequest>,
) -> Result<Json<ApiResponse<GenerationResponseDto>>, ApiError> {
    let outcome = state
        .generate_story_handler
        .handle(GenerateStory {
            title: req.title,
            genre: req.genre,
            tone: req.tone,
            prompt: req.prompt,
            chapters: req.chapters,
            words: req.words,
            author_id: req.user_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(outcome.into())))
}

/// 按指示润色整篇故事
pub async fn refine_story(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefineStoryRequest>,
) -> Result<Json<ApiResponse<GenerationResponseDto>>, ApiError> {
    let outcome = state
        .refine_story_handler
        .handle(RefineStory {
            story_id: req.story_id,
            instructions: req.instructions,
            author_id: req.user_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(outcome.into())))
}

/// 续写故事
pub async fn continue_story(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContinueStoryRequest>,
) -> Result<Json<ApiResponse<GenerationResponseDto>>, ApiError> {
    let outcome = state
        .continue_story_handler
        .handle(ContinueStory {
            story_id: req.story_id,
            prompt: req.prompt,
            words: req.words,
            author_id: req.user_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(outcome.into())))
}
