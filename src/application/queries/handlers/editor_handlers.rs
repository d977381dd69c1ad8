//! Editor Query Handlers

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::error::ApplicationError;
use crate::application::ports::{EditorSession, EditorSessionManagerPort};
use crate::application::queries::GetEditorPage;

/// 编辑器当前页视图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorPageView {
    pub session_id: String,
    pub story_id: Uuid,
    pub title: String,
    /// 当前页码（从 1 开始）
    pub page: usize,
    pub total_pages: usize,
    pub text: String,
    /// 是否有未保存的修改
    pub dirty: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl From<&EditorSession> for EditorPageView {
    fn from(session: &EditorSession) -> Self {
        Self {
            session_id: session.id.clone(),
            story_id: session.story_id,
            title: session.title.clone(),
            page: session.document.current_page(),
            total_pages: session.document.total_pages(),
            text: session.document.current_page_text().to_string(),
            dirty: session.document.is_dirty(),
            last_saved_at: session.last_saved_at,
        }
    }
}

/// GetEditorPage Handler
pub struct GetEditorPageHandler {
    session_manager: Arc<dyn EditorSessionManagerPort>,
}

impl GetEditorPageHandler {
    pub fn new(session_manager: Arc<dyn EditorSessionManagerPort>) -> Self {
        Self { session_manager }
    }

    pub async fn handle(&self, query: GetEditorPage) -> Result<EditorPageView, ApplicationError> {
        let session = self.session_manager.get(&query.session_id)?;
        self.session_manager.touch(&query.session_id);
        Ok(EditorPageView::from(&session))
    }
}
