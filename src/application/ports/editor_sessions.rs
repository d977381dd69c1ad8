//! Editor Session Manager Port - 编辑会话生命周期管理
//!
//! 定义编辑会话管理的抽象接口，具体实现在 infrastructure/memory 层

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::StorySnapshot;
use crate::domain::editor::PagedDocument;

/// Editor Session 错误
#[derive(Debug, Error)]
pub enum EditorSessionError {
    #[error("Editor session not found: {0}")]
    NotFound(String),

    #[error("Editor session already exists: {0}")]
    AlreadyExists(String),
}

/// 编辑会话（in-memory）
///
/// 持有一个故事的全文缓冲区和分页视图，关闭时丢弃
#[derive(Debug, Clone)]
pub struct EditorSession {
    pub id: String,
    pub story_id: Uuid,
    pub author_id: String,
    pub title: String,
    pub genre: String,
    pub tone: String,
    pub document: PagedDocument,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl EditorSession {
    pub fn new(
        story_id: Uuid,
        author_id: impl Into<String>,
        title: impl Into<String>,
        genre: impl Into<String>,
        tone: impl Into<String>,
        document: PagedDocument,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            story_id,
            author_id: author_id.into(),
            title: title.into(),
            genre: genre.into(),
            tone: tone.into(),
            document,
            created_at: now,
            last_activity: now,
            last_saved_at: None,
        }
    }

    /// 当前内存状态的快照（用于刷写）
    pub fn snapshot(&self) -> StorySnapshot {
        StorySnapshot {
            session_id: self.id.clone(),
            story_id: self.story_id,
            title: self.title.clone(),
            genre: self.genre.clone(),
            tone: self.tone.clone(),
            content: self.document.content().to_string(),
        }
    }
}

/// Editor Session Manager Port
///
/// 所有编辑状态存储在内存中，每次修改都会重新分页
pub trait EditorSessionManagerPort: Send + Sync {
    /// 创建新会话
    fn create(&self, session: EditorSession) -> Result<String, EditorSessionError>;

    /// 获取会话副本
    fn get(&self, id: &str) -> Result<EditorSession, EditorSessionError>;

    /// 编辑当前页，返回修改后的会话
    fn edit_page(&self, id: &str, text: &str) -> Result<EditorSession, EditorSessionError>;

    /// 跳转页面，越界时返回 false 且不修改
    fn go_to_page(&self, id: &str, page: usize) -> Result<bool, EditorSessionError>;

    /// 修改标题
    fn rename(&self, id: &str, title: &str) -> Result<EditorSession, EditorSessionError>;

    /// 整体替换正文
    fn replace_content(&self, id: &str, content: &str)
        -> Result<EditorSession, EditorSessionError>;

    /// 记录最后保存时间；保存的内容与当前缓冲区一致时清除脏标记
    fn mark_saved(&self, id: &str, at: DateTime<Utc>, saved_content: &str);

    /// 检查会话是否有效
    fn is_valid(&self, id: &str) -> bool;

    /// 关闭会话（丢弃缓冲区）
    fn close(&self, id: &str) -> Result<(), EditorSessionError>;

    /// 更新最后活动时间
    fn touch(&self, id: &str);

    /// 获取打开指定故事的所有会话 ID
    fn sessions_for_story(&self, story_id: Uuid) -> Vec<String>;

    /// 获取所有过期会话的 ID
    fn get_expired_sessions(&self, idle_timeout_secs: u64) -> Vec<String>;
}
