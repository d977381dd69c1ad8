//! Story Query Handlers

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::error::ApplicationError;
use crate::application::ports::{ChapterRecord, StoryRecord, StoryStorePort};
use crate::application::queries::{GetStory, GetStoryChapters, ListStories};

// ============================================================================
// Response DTOs
// ============================================================================

/// 故事详情响应
#[derive(Debug, Clone)]
pub struct StoryResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub genre: String,
    pub tone: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl From<StoryRecord> for StoryResponse {
    fn from(record: StoryRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            content: record.content,
            genre: record.genre,
            tone: record.tone,
            author_id: record.author_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            last_saved_at: record.last_saved_at,
        }
    }
}

/// 故事列表项（不含正文）
#[derive(Debug, Clone)]
pub struct StorySummary {
    pub id: Uuid,
    pub title: String,
    pub genre: String,
    pub tone: String,
    pub char_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<StoryRecord> for StorySummary {
    fn from(record: StoryRecord) -> Self {
        Self {
            id: record.id,
            char_count: record.content.chars().count(),
            title: record.title,
            genre: record.genre,
            tone: record.tone,
            updated_at: record.updated_at,
        }
    }
}

/// 章节响应
#[derive(Debug, Clone)]
pub struct ChapterResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub chapter_number: u32,
}

impl From<ChapterRecord> for ChapterResponse {
    fn from(record: ChapterRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            content: record.content,
            chapter_number: record.chapter_number,
        }
    }
}

/// 读取故事并校验所有者
pub(crate) async fn load_owned_story(
    store: &dyn StoryStorePort,
    story_id: Uuid,
    author_id: &str,
) -> Result<StoryRecord, ApplicationError> {
    let story = store
        .get_story(story_id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Story", story_id))?;

    if story.author_id != author_id {
        return Err(ApplicationError::forbidden(format!(
            "Story {} belongs to another user",
            story_id
        )));
    }

    Ok(story)
}

// ============================================================================
// Handlers
// ============================================================================

/// GetStory Handler
pub struct GetStoryHandler {
    store: Arc<dyn StoryStorePort>,
}

impl GetStoryHandler {
    pub fn new(store: Arc<dyn StoryStorePort>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: GetStory) -> Result<StoryResponse, ApplicationError> {
        let story = load_owned_story(self.store.as_ref(), query.story_id, &query.author_id).await?;
        Ok(StoryResponse::from(story))
    }
}

/// ListStories Handler
pub struct ListStoriesHandler {
    store: Arc<dyn StoryStorePort>,
}

impl ListStoriesHandler {
    pub fn new(store: Arc<dyn StoryStorePort>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: ListStories) -> Result<Vec<StorySummary>, ApplicationError> {
        let stories = self.store.list_stories(&query.author_id).await?;
        Ok(stories.into_iter().map(StorySummary::from).collect())
    }
}

/// GetStoryChapters Handler
pub struct GetStoryChaptersHandler {
    store: Arc<dyn StoryStorePort>,
}

impl GetStoryChaptersHandler {
    pub fn new(store: Arc<dyn StoryStorePort>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        query: GetStoryChapters,
    ) -> Result<Vec<ChapterResponse>, ApplicationError> {
        load_owned_story(self.store.as_ref(), query.story_id, &query.author_id).await?;

        let chapters = self.store.list_chapters(query.story_id).await?;
        Ok(chapters.into_iter().map(ChapterResponse::from).collect())
    }
}
