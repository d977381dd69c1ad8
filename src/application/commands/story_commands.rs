//! Story Commands

use uuid::Uuid;

/// 创建故事命令
#[derive(Debug, Clone)]
pub struct CreateStory {
    pub title: String,
    pub genre: String,
    pub tone: String,
    pub content: String,
    pub author_id: String,
}

/// 修改故事元数据命令（不经过编辑会话）
#[derive(Debug, Clone)]
pub struct UpdateStoryMeta {
    pub story_id: Uuid,
    pub author_id: String,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub tone: Option<String>,
}

/// 删除故事命令
#[derive(Debug, Clone)]
pub struct DeleteStory {
    pub story_id: Uuid,
    pub author_id: String,
}
