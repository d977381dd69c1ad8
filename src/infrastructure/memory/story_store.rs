//! In-Memory Story Store Implementation

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::ports::{
    ChapterRecord, NewChapter, StoreError, StoryPatch, StoryRecord, StoryStorePort,
};

/// 内存故事存储
pub struct InMemoryStoryStore {
    stories: DashMap<Uuid, StoryRecord>,
    /// story_id -> chapters
    chapters: DashMap<Uuid, Vec<ChapterRecord>>,
}

impl InMemoryStoryStore {
    pub fn new() -> Self {
        Self {
            stories: DashMap::new(),
            chapters: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemoryStoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoryStorePort for InMemoryStoryStore {
    async fn get_story(&self, id: Uuid) -> Result<Option<StoryRecord>, StoreError> {
        Ok(self.stories.get(&id).map(|s| s.clone()))
    }

    async fn set_story(&self, id: Uuid, patch: StoryPatch) -> Result<(), StoreError> {
        let now = Utc::now();
        match self.stories.get_mut(&id) {
            Some(mut existing) => patch.apply_to(&mut existing, now),
            None => {
                self.stories.insert(id, patch.into_record(id, now));
            }
        }
        Ok(())
    }

    async fn delete_story(&self, id: Uuid) -> Result<(), StoreError> {
        self.chapters.remove(&id);
        self.stories
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list_stories(&self, author_id: &str) -> Result<Vec<StoryRecord>, StoreError> {
        let mut stories: Vec<StoryRecord> = self
            .stories
            .iter()
            .filter(|entry| entry.author_id == author_id)
            .map(|entry| entry.clone())
            .collect();
        stories.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(stories)
    }

    async fn list_chapters(&self, story_id: Uuid) -> Result<Vec<ChapterRecord>, StoreError> {
        let mut chapters = self
            .chapters
            .get(&story_id)
            .map(|c| c.clone())
            .unwrap_or_default();
        chapters.sort_by_key(|c| c.chapter_number);
        Ok(chapters)
    }

    async fn create_chapter(
        &self,
        story_id: Uuid,
        chapter: NewChapter,
    ) -> Result<Uuid, StoreError> {
        let record = ChapterRecord {
            id: Uuid::new_v4(),
            story_id,
            title: chapter.title,
            content: chapter.content,
            chapter_number: chapter.chapter_number,
            created_at: Utc::now(),
        };
        let id = record.id;
        self.chapters.entry(story_id).or_default().push(record);
        Ok(id)
    }

    async fn update_chapter(&self, chapter: &ChapterRecord) -> Result<(), StoreError> {
        let mut chapters = self
            .chapters
            .get_mut(&chapter.story_id)
            .ok_or_else(|| StoreError::NotFound(chapter.id.to_string()))?;
        let slot = chapters
            .iter_mut()
            .find(|c| c.id == chapter.id)
            .ok_or_else(|| StoreError::NotFound(chapter.id.to_string()))?;
        *slot = chapter.clone();
        Ok(())
    }

    async fn delete_chapter(&self, story_id: Uuid, chapter_id: Uuid) -> Result<(), StoreError> {
        let mut chapters = self
            .chapters
            .get_mut(&story_id)
            .ok_or_else(|| StoreError::NotFound(chapter_id.to_string()))?;
        let before = chapters.len();
        chapters.retain(|c| c.id != chapter_id);
        if chapters.len() == before {
            return Err(StoreError::NotFound(chapter_id.to_string()));
        }
        Ok(())
    }
}
