//! Story HTTP Handlers

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    ChapterResponse, CreateStory, CreateStoryResponse, DeleteStory, GetStory, GetStoryChapters,
    ListStories, StoryResponse, StorySummary, UpdateStoryMeta,
};
use crate::infrastructure::http::dto::{ApiResponse, Empty};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateStoryRequest {
    pub title: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub content: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedStoryDto {
    pub id: Uuid,
    pub title: String,
    pub chapter_count: usize,
}

impl From<CreateStoryResponse> for CreatedStoryDto {
    fn from(r: CreateStoryResponse) -> Self {
        Self {
            id: r.id,
            title: r.title,
            chapter_count: r.chapter_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StoryRequest {
    pub id: Uuid,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListStoriesRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStoryRequest {
    pub id: Uuid,
    pub user_id: String,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub tone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StoryDto {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub genre: String,
    pub tone: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl From<StoryResponse> for StoryDto {
    fn from(r: StoryResponse) -> Self {
        Self {
            id: r.id,
            title: r.title,
            content: r.content,
            genre: r.genre,
            tone: r.tone,
            user_id: r.author_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
            last_saved_at: r.last_saved_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StorySummaryDto {
    pub id: Uuid,
    pub title: String,
    pub genre: String,
    pub tone: String,
    pub char_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<StorySummary> for StorySummaryDto {
    fn from(s: StorySummary) -> Self {
        Self {
            id: s.id,
            title: s.title,
            genre: s.genre,
            tone: s.tone,
            char_count: s.char_count,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChapterDto {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub chapter_number: u32,
}

impl From<ChapterResponse> for ChapterDto {
    fn from(c: ChapterResponse) -> Self {
        Self {
            id: c.id,
            title: c.title,
            content: c.content,
            chapter_number: c.chapter_number,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChaptersDto {
    pub story_id: Uuid,
    pub total: usize,
    pub chapters: Vec<ChapterDto>,
}

// ============================================================================
// Handlers
// ============================================================================

/// 创建故事
pub async fn create_story(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateStoryRequest>,
) -> Result<Json<ApiResponse<CreatedStoryDto>>, ApiError> {
    let response = state
        .create_story_handler
        .handle(CreateStory {
            title: req.title,
            genre: req.genre,
            tone: req.tone,
            content: req.content,
            author_id: req.user_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(response.into())))
}

/// 获取故事详情
pub async fn get_story(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StoryRequest>,
) -> Result<Json<ApiResponse<StoryDto>>, ApiError> {
    let story = state
        .get_story_handler
        .handle(GetStory {
            story_id: req.id,
            author_id: req.user_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(story.into())))
}

/// 列出用户的所有故事
pub async fn list_stories(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListStoriesRequest>,
) -> Result<Json<ApiResponse<Vec<StorySummaryDto>>>, ApiError> {
    let stories = state
        .list_stories_handler
        .handle(ListStories {
            author_id: req.user_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(
        stories.into_iter().map(StorySummaryDto::from).collect(),
    )))
}

/// 修改故事元数据（标题、类型、基调）
pub async fn update_story(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateStoryRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state
        .update_story_handler
        .handle(UpdateStoryMeta {
            story_id: req.id,
            author_id: req.user_id,
            title: req.title,
            genre: req.genre,
            tone: req.tone,
        })
        .await?;

    Ok(Json(ApiResponse::ok()))
}

/// 删除故事（连同章节，并关闭其编辑会话）
pub async fn delete_story(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StoryRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state
        .delete_story_handler
        .handle(DeleteStory {
            story_id: req.id,
            author_id: req.user_id,
        })
        .await?;

    Ok(Json(ApiResponse::ok()))
}

/// 获取故事章节列表
pub async fn get_story_chapters(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StoryRequest>,
) -> Result<Json<ApiResponse<ChaptersDto>>, ApiError> {
    let chapters = state
        .get_chapters_handler
        .handle(GetStoryChapters {
            story_id: req.id,
            author_id: req.user_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(ChaptersDto {
        story_id: req.id,
        total: chapters.len(),
        chapters: chapters.into_iter().map(ChapterDto::from).collect(),
    })))
}
