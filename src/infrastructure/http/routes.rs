//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping               GET   存活检查
//! - /api/health             GET   生成服务可达性
//! - /api/story/create       POST  创建故事
//! - /api/story/get          POST  获取故事详情
//! - /api/story/list         POST  列出用户的故事
//! - /api/story/update       POST  修改标题/类型/基调
//! - /api/story/delete       POST  删除故事
//! - /api/story/chapters     POST  获取章节列表
//! - /api/editor/open        POST  打开编辑器（创建会话）
//! - /api/editor/page        POST  获取当前页
//! - /api/editor/edit        POST  编辑当前页
//! - /api/editor/goto        POST  跳转页
//! - /api/editor/rename      POST  修改标题
//! - /api/editor/save        POST  显式保存
//! - /api/editor/close       POST  关闭编辑器
//! - /api/generate/story     POST  生成新故事
//! - /api/generate/refine    POST  润色故事
//! - /api/generate/continue  POST  续写故事
//! - /api/upload/extract     POST  上传文件提取正文（multipart）
//! - /ws/editor/{id}         WS    编辑会话事件
//! - /ws/events              WS    全局事件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/editor/:session_id", get(handlers::editor_websocket_handler))
        .route("/ws/events", get(handlers::global_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/health", get(handlers::health))
        .nest("/story", story_routes())
        .nest("/editor", editor_routes())
        .nest("/generate", generation_routes())
        .route("/upload/extract", post(handlers::extract_text))
}

/// Story 路由
fn story_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(handlers::create_story))
        .route("/get", post(handlers::get_story))
        .route("/list", post(handlers::list_stories))
        .route("/update", post(handlers::update_story))
        .route("/delete", post(handlers::delete_story))
        .route("/chapters", post(handlers::get_story_chapters))
}

/// Editor 路由
fn editor_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/open", post(handlers::open_editor))
        .route("/page", post(handlers::get_page))
        .route("/edit", post(handlers::edit_page))
        .route("/goto", post(handlers::go_to_page))
        .route("/rename", post(handlers::rename_story))
        .route("/save", post(handlers::save_story))
        .route("/close", post(handlers::close_editor))
}

/// Generation 路由
fn generation_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/story", post(handlers::generate_story))
        .route("/refine", post(handlers::refine_story))
        .route("/continue", post(handlers::continue_story))
}
