//! Story Store Port - 远程文档存储抽象
//!
//! 故事文档 + 章节子集合，按文档 ID 读写。
//! 自动保存路径上不存在跨文档事务：故事与章节分别写入。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Store 错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// ============================================================================
// Story
// ============================================================================

/// 故事文档（权威数据）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRecord {
    pub id: Uuid,
    pub title: String,
    /// 全文缓冲区
    pub content: String,
    pub genre: String,
    pub tone: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_saved_at: Option<DateTime<Utc>>,
}

/// 故事字段补丁（merge 语义，None 表示保留原值）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub genre: Option<String>,
    pub tone: Option<String>,
    pub author_id: Option<String>,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl StoryPatch {
    /// 把补丁合并到已有文档
    pub fn apply_to(&self, record: &mut StoryRecord, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(content) = &self.content {
            record.content = content.clone();
        }
        if let Some(genre) = &self.genre {
            record.genre = genre.clone();
        }
        if let Some(tone) = &self.tone {
            record.tone = tone.clone();
        }
        if let Some(author_id) = &self.author_id {
            record.author_id = author_id.clone();
        }
        if self.last_saved_at.is_some() {
            record.last_saved_at = self.last_saved_at;
        }
        record.updated_at = now;
    }

    /// 文档不存在时，用补丁创建新文档
    pub fn into_record(self, id: Uuid, now: DateTime<Utc>) -> StoryRecord {
        StoryRecord {
            id,
            title: self.title.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            genre: self.genre.unwrap_or_default(),
            tone: self.tone.unwrap_or_default(),
            author_id: self.author_id.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            last_saved_at: self.last_saved_at,
        }
    }
}

// ============================================================================
// Chapter
// ============================================================================

/// 章节文档（由章节识别器生成，非权威数据）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub id: Uuid,
    pub story_id: Uuid,
    pub title: String,
    pub content: String,
    pub chapter_number: u32,
    pub created_at: DateTime<Utc>,
}

/// 待创建的章节
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChapter {
    pub title: String,
    pub content: String,
    pub chapter_number: u32,
}

impl From<crate::domain::DetectedChapter> for NewChapter {
    fn from(chapter: crate::domain::DetectedChapter) -> Self {
        Self {
            title: chapter.title,
            content: chapter.content,
            chapter_number: chapter.chapter_number,
        }
    }
}

/// Story Store Port
#[async_trait]
pub trait StoryStorePort: Send + Sync {
    /// 读取故事
    async fn get_story(&self, id: Uuid) -> Result<Option<StoryRecord>, StoreError>;

    /// 写入故事（merge 语义，不存在时创建）
    async fn set_story(&self, id: Uuid, patch: StoryPatch) -> Result<(), StoreError>;

    /// 删除故事及其章节
    async fn delete_story(&self, id: Uuid) -> Result<(), StoreError>;

    /// 列出作者的所有故事（按更新时间倒序）
    async fn list_stories(&self, author_id: &str) -> Result<Vec<StoryRecord>, StoreError>;

    /// 列出故事的章节（按章节号排序）
    async fn list_chapters(&self, story_id: Uuid) -> Result<Vec<ChapterRecord>, StoreError>;

    /// 创建章节，返回生成的 ID
    async fn create_chapter(&self, story_id: Uuid, chapter: NewChapter) -> Result<Uuid, StoreError>;

    /// 原地更新章节
    async fn update_chapter(&self, chapter: &ChapterRecord) -> Result<(), StoreError>;

    /// 删除章节
    async fn delete_chapter(&self, story_id: Uuid, chapter_id: Uuid) -> Result<(), StoreError>;
}
