//! Generation Commands - 外部生成相关命令

use uuid::Uuid;

/// 生成新故事命令
#[derive(Debug, Clone)]
pub struct GenerateStory {
    pub title: String,
    pub genre: String,
    pub tone: String,
    pub prompt: String,
    pub chapters: u32,
    pub words: u32,
    pub author_id: String,
}

/// 润色故事命令
#[derive(Debug, Clone)]
pub struct RefineStory {
    pub story_id: Uuid,
    pub instructions: String,
    pub author_id: String,
}

/// 续写故事命令
#[derive(Debug, Clone)]
pub struct ContinueStory {
    pub story_id: Uuid,
    pub prompt: String,
    pub words: u32,
    pub author_id: String,
}
