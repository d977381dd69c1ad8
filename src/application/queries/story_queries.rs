//! Story Queries

use uuid::Uuid;

/// 获取故事详情查询
#[derive(Debug, Clone)]
pub struct GetStory {
    pub story_id: Uuid,
    pub author_id: String,
}

/// 列出作者所有故事查询
#[derive(Debug, Clone)]
pub struct ListStories {
    pub author_id: String,
}

/// 获取故事章节查询
#[derive(Debug, Clone)]
pub struct GetStoryChapters {
    pub story_id: Uuid,
    pub author_id: String,
}
