//! In-Memory Editor Session Manager Implementation

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::ports::{EditorSession, EditorSessionError, EditorSessionManagerPort};

/// 内存编辑会话管理器
pub struct InMemoryEditorSessionManager {
    sessions: DashMap<String, EditorSession>,
}

impl InMemoryEditorSessionManager {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 在会话上执行修改并刷新活动时间，返回修改后的副本
    fn modify<F>(&self, id: &str, f: F) -> Result<EditorSession, EditorSessionError>
    where
        F: FnOnce(&mut EditorSession),
    {
        let mut session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| EditorSessionError::NotFound(id.to_string()))?;
        f(&mut session);
        session.last_activity = Utc::now();
        Ok(session.clone())
    }
}

impl Default for InMemoryEditorSessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSessionManagerPort for InMemoryEditorSessionManager {
    fn create(&self, session: EditorSession) -> Result<String, EditorSessionError> {
        let session_id = session.id.clone();
        if self.sessions.contains_key(&session_id) {
            return Err(EditorSessionError::AlreadyExists(session_id));
        }
        let story_id = session.story_id;
        self.sessions.insert(session_id.clone(), session);
        tracing::info!(session_id = %session_id, story_id = %story_id, "Editor session created");
        Ok(session_id)
    }

    fn get(&self, id: &str) -> Result<EditorSession, EditorSessionError> {
        self.sessions
            .get(id)
            .map(|s| s.clone())
            .ok_or_else(|| EditorSessionError::NotFound(id.to_string()))
    }

    fn edit_page(&self, id: &str, text: &str) -> Result<EditorSession, EditorSessionError> {
        let session = self.modify(id, |s| s.document.edit_current_page(text))?;
        tracing::debug!(
            session_id = %id,
            page = session.document.current_page(),
            total_pages = session.document.total_pages(),
            "Page edited"
        );
        Ok(session)
    }

    fn go_to_page(&self, id: &str, page: usize) -> Result<bool, EditorSessionError> {
        let mut moved = false;
        self.modify(id, |s| moved = s.document.go_to_page(page))?;
        Ok(moved)
    }

    fn rename(&self, id: &str, title: &str) -> Result<EditorSession, EditorSessionError> {
        self.modify(id, |s| s.title = title.to_string())
    }

    fn replace_content(
        &self,
        id: &str,
        content: &str,
    ) -> Result<EditorSession, EditorSessionError> {
        self.modify(id, |s| s.document.replace_content(content))
    }

    fn mark_saved(&self, id: &str, at: DateTime<Utc>, saved_content: &str) {
        if let Some(mut session) = self.sessions.get_mut(id) {
            session.last_saved_at = Some(at);
            // 保存期间又有新修改时保留脏标记
            if session.document.content() == saved_content {
                session.document.take_dirty();
            }
        }
    }

    fn is_valid(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    fn close(&self, id: &str) -> Result<(), EditorSessionError> {
        self.sessions
            .remove(id)
            .map(|_| {
                tracing::info!(session_id = %id, "Editor session closed");
            })
            .ok_or_else(|| EditorSessionError::NotFound(id.to_string()))
    }

    fn touch(&self, id: &str) {
        if let Some(mut session) = self.sessions.get_mut(id) {
            session.last_activity = Utc::now();
        }
    }

    fn sessions_for_story(&self, story_id: Uuid) -> Vec<String> {
        self.sessions
            .iter()
            .filter(|entry| entry.story_id == story_id)
            .map(|entry| entry.key().clone())
            .collect()
    }

    fn get_expired_sessions(&self, idle_timeout_secs: u64) -> Vec<String> {
        let now = Utc::now();
        // 超出 chrono 可表示范围的超时等同于永不过期
        let Some(timeout) = i64::try_from(idle_timeout_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
        else {
            return Vec::new();
        };

        self.sessions
            .iter()
            .filter_map(|entry| {
                let elapsed = now - entry.last_activity;
                if elapsed > timeout {
                    Some(entry.key().clone())
                } else {
                    None
                }
            })
            .collect()
    }
}
