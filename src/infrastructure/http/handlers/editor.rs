//! Editor HTTP Handlers
//!
//! 分页编辑器：打开、翻页、编辑当前页、改标题、显式保存、关闭。
//! 编辑后的自动保存结果通过 `/ws/editor/{session_id}` 推送。

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    CloseEditor, EditPage, EditorPageView, FlushOutcome, GetEditorPage, GoToPage, OpenEditor,
    RenameStory, SaveStory,
};
use crate::infrastructure::http::dto::{ApiResponse, Empty};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct OpenEditorRequest {
    pub story_id: Uuid,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct EditPageRequest {
    pub session_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct GoToPageRequest {
    pub session_id: String,
    pub page: usize,
}

#[derive(Debug, Deserialize)]
pub struct RenameStoryRequest {
    pub session_id: String,
    pub title: String,
}

/// 当前页视图
#[derive(Debug, Serialize)]
pub struct EditorPageDto {
    pub session_id: String,
    pub story_id: Uuid,
    pub title: String,
    pub page: usize,
    pub total_pages: usize,
    pub text: String,
    pub dirty: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl From<EditorPageView> for EditorPageDto {
    fn from(view: EditorPageView) -> Self {
        Self {
            session_id: view.session_id,
            story_id: view.story_id,
            title: view.title,
            page: view.page,
            total_pages: view.total_pages,
            text: view.text,
            dirty: view.dirty,
            last_saved_at: view.last_saved_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub story_id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub chapter_count: usize,
}

impl From<FlushOutcome> for SaveResponse {
    fn from(outcome: FlushOutcome) -> Self {
        Self {
            story_id: outcome.story_id,
            saved_at: outcome.saved_at,
            chapter_count: outcome.chapter_count,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// 打开编辑器（创建编辑会话，返回第 1 页）
pub async fn open_editor(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OpenEditorRequest>,
) -> Result<Json<ApiResponse<EditorPageDto>>, ApiError> {
    let view = state
        .open_editor_handler
        .handle(OpenEditor {
            story_id: req.story_id,
            author_id: req.user_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(view.into())))
}

/// 获取当前页
pub async fn get_page(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<ApiResponse<EditorPageDto>>, ApiError> {
    let view = state
        .get_editor_page_handler
        .handle(GetEditorPage {
            session_id: req.session_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(view.into())))
}

/// 编辑当前页（触发防抖自动保存）
pub async fn edit_page(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EditPageRequest>,
) -> Result<Json<ApiResponse<EditorPageDto>>, ApiError> {
    let view = state
        .edit_page_handler
        .handle(EditPage {
            session_id: req.session_id,
            text: req.text,
        })
        .await?;

    Ok(Json(ApiResponse::success(view.into())))
}

/// 跳转页（越界时保持当前页）
pub async fn go_to_page(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GoToPageRequest>,
) -> Result<Json<ApiResponse<EditorPageDto>>, ApiError> {
    let view = state
        .go_to_page_handler
        .handle(GoToPage {
            session_id: req.session_id,
            page: req.page,
        })
        .await?;

    Ok(Json(ApiResponse::success(view.into())))
}

/// 修改标题（触发防抖自动保存）
pub async fn rename_story(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RenameStoryRequest>,
) -> Result<Json<ApiResponse<EditorPageDto>>, ApiError> {
    let view = state
        .rename_story_handler
        .handle(RenameStory {
            session_id: req.session_id,
            title: req.title,
        })
        .await?;

    Ok(Json(ApiResponse::success(view.into())))
}

/// 显式保存
pub async fn save_story(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<ApiResponse<SaveResponse>>, ApiError> {
    let outcome = state
        .save_story_handler
        .handle(SaveStory {
            session_id: req.session_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(outcome.into())))
}

/// 关闭编辑器（未保存的修改被丢弃）
pub async fn close_editor(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state
        .close_editor_handler
        .handle(CloseEditor {
            session_id: req.session_id,
        })
        .await?;

    Ok(Json(ApiResponse::ok()))
}
