//! Story Flusher - 把编辑状态刷写到存储
//!
//! 自动保存、显式保存、生成写回共用同一刷写流程:
//! 1. merge 写入故事文档（正文 + 元数据 + last_saved_at）
//! 2. 重新识别章节，删除旧章节后重新创建（不做 diff）
//!
//! 两步是相互独立的调用，第二步失败时故事与章节会不一致，不做回滚。
//! 同一故事的刷写与删除在故事锁内串行执行；故事已被删除时刷写直接失败，不会重新创建文档。

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::application::error::ApplicationError;
use crate::application::ports::{StoreError, StoryPatch, StorySnapshot, StoryStorePort};
use crate::domain::{detect_chapters, ChapterDetectorConfig, DetectedChapter};

/// 刷写结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushOutcome {
    pub story_id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub chapter_count: usize,
}

/// 故事刷写器
pub struct StoryFlusher {
    store: Arc<dyn StoryStorePort>,
    detector: ChapterDetectorConfig,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl StoryFlusher {
    pub fn new(store: Arc<dyn StoryStorePort>, detector: ChapterDetectorConfig) -> Self {
        Self {
            store,
            detector,
            locks: DashMap::new(),
        }
    }

    async fn lock(&self, story_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(story_id).or_default().clone();
        lock.lock_owned().await
    }

    /// 刷写快照
    pub async fn flush(&self, snapshot: &StorySnapshot) -> Result<FlushOutcome, ApplicationError> {
        let patch = StoryPatch {
            title: Some(snapshot.title.clone()),
            genre: Some(snapshot.genre.clone()),
            tone: Some(snapshot.tone.clone()),
            ..Default::default()
        };
        let outcome = self
            .write(snapshot.story_id, patch, &snapshot.content)
            .await?;

        tracing::debug!(
            story_id = %snapshot.story_id,
            session_id = %snapshot.session_id,
            content_chars = snapshot.content.chars().count(),
            chapter_count = outcome.chapter_count,
            "Story flushed"
        );

        Ok(outcome)
    }

    /// 只替换正文（生成结果写回）
    pub async fn write_content(
        &self,
        story_id: Uuid,
        content: &str,
    ) -> Result<FlushOutcome, ApplicationError> {
        self.write(story_id, StoryPatch::default(), content).await
    }

    async fn write(
        &self,
        story_id: Uuid,
        mut patch: StoryPatch,
        content: &str,
    ) -> Result<FlushOutcome, ApplicationError> {
        let _guard = self.lock(story_id).await;

        if self.store.get_story(story_id).await?.is_none() {
            tracing::warn!(story_id = %story_id, "Story no longer exists, flush skipped");
            return Err(ApplicationError::not_found("Story", story_id));
        }

        let saved_at = Utc::now();
        patch.content = Some(content.to_string());
        patch.last_saved_at = Some(saved_at);
        self.store.set_story(story_id, patch).await?;

        let chapters = detect_chapters(content, &self.detector);
        let chapter_count = match self.replace_chapters(story_id, chapters).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(
                    story_id = %story_id,
                    error = %e,
                    "Story saved but chapter replacement failed, chapters may be stale"
                );
                return Err(e.into());
            }
        };

        Ok(FlushOutcome {
            story_id,
            saved_at,
            chapter_count,
        })
    }

    /// 识别全文章节并替换
    pub async fn rebuild_chapters(&self, story_id: Uuid, content: &str) -> Result<usize, StoreError> {
        let _guard = self.lock(story_id).await;
        let chapters = detect_chapters(content, &self.detector);
        self.replace_chapters(story_id, chapters).await
    }

    /// 删除故事；等待进行中的刷写结束后再删除
    pub async fn delete_story(&self, story_id: Uuid) -> Result<(), StoreError> {
        let guard = self.lock(story_id).await;
        let result = self.store.delete_story(story_id).await;
        drop(guard);
        self.locks.remove(&story_id);
        result
    }

    /// 用新识别的章节替换已保存的章节（先删后建），调用方持有故事锁
    async fn replace_chapters(
        &self,
        story_id: Uuid,
        chapters: Vec<DetectedChapter>,
    ) -> Result<usize, StoreError> {
        let existing = self.store.list_chapters(story_id).await?;
        for chapter in existing {
            self.store.delete_chapter(story_id, chapter.id).await?;
        }

        let count = chapters.len();
        for chapter in chapters {
            self.store.create_chapter(story_id, chapter.into()).await?;
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ChapterRecord, NewChapter, StoryRecord};
    use crate::infrastructure::memory::InMemoryStoryStore;
    use async_trait::async_trait;
    use std::time::Duration;

    /// 可注入延迟与章节写入失败的存储
    struct TestStore {
        inner: InMemoryStoryStore,
        delay: Duration,
        broken_chapters: bool,
    }

    impl TestStore {
        fn new() -> Self {
            Self {
                inner: InMemoryStoryStore::new(),
                delay: Duration::ZERO,
                broken_chapters: false,
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::new()
            }
        }

        fn broken_chapters() -> Self {
            Self {
                broken_chapters: true,
                ..Self::new()
            }
        }

        async fn pause(&self) {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
    }

    #[async_trait]
    impl StoryStorePort for TestStore {
        async fn get_story(&self, id: Uuid) -> Result<Option<StoryRecord>, StoreError> {
            self.inner.get_story(id).await
        }

        async fn set_story(&self, id: Uuid, patch: StoryPatch) -> Result<(), StoreError> {
            self.pause().await;
            self.inner.set_story(id, patch).await
        }

        async fn delete_story(&self, id: Uuid) -> Result<(), StoreError> {
            self.inner.delete_story(id).await
        }

        async fn list_stories(&self, author_id: &str) -> Result<Vec<StoryRecord>, StoreError> {
            self.inner.list_stories(author_id).await
        }

        async fn list_chapters(&self, story_id: Uuid) -> Result<Vec<ChapterRecord>, StoreError> {
            self.pause().await;
            self.inner.list_chapters(story_id).await
        }

        async fn create_chapter(
            &self,
            story_id: Uuid,
            chapter: NewChapter,
        ) -> Result<Uuid, StoreError> {
            if self.broken_chapters {
                return Err(StoreError::DatabaseError("connection reset".to_string()));
            }
            self.inner.create_chapter(story_id, chapter).await
        }

        async fn update_chapter(&self, chapter: &ChapterRecord) -> Result<(), StoreError> {
            self.inner.update_chapter(chapter).await
        }

        async fn delete_chapter(&self, story_id: Uuid, chapter_id: Uuid) -> Result<(), StoreError> {
            self.inner.delete_chapter(story_id, chapter_id).await
        }
    }

    async fn seed(store: &TestStore) -> Uuid {
        let story_id = Uuid::new_v4();
        store
            .inner
            .set_story(
                story_id,
                StoryPatch {
                    title: Some("Tale".to_string()),
                    author_id: Some("alice".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        story_id
    }

    fn snapshot(story_id: Uuid, content: &str) -> StorySnapshot {
        StorySnapshot {
            session_id: "session-1".to_string(),
            story_id,
            title: "Tale".to_string(),
            genre: "fantasy".to_string(),
            tone: "light".to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_flush_writes_story_and_chapters() {
        let store = Arc::new(TestStore::new());
        let flusher = StoryFlusher::new(store.clone(), ChapterDetectorConfig::default());
        let story_id = seed(&store).await;

        let outcome = flusher
            .flush(&snapshot(story_id, "CHAPTER 1: A\nhello\nCHAPTER 2: B\nworld"))
            .await
            .unwrap();

        assert_eq!(outcome.chapter_count, 2);
        let story = store.get_story(story_id).await.unwrap().unwrap();
        assert_eq!(story.title, "Tale");
        assert_eq!(story.author_id, "alice");
        assert_eq!(story.last_saved_at, Some(outcome.saved_at));

        let chapters = store.list_chapters(story_id).await.unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "CHAPTER 1: A");
        assert_eq!(chapters[0].content, "hello");
        assert_eq!(chapters[1].content, "world");
    }

    #[tokio::test]
    async fn test_flush_replaces_previous_chapters() {
        let store = Arc::new(TestStore::new());
        let flusher = StoryFlusher::new(store.clone(), ChapterDetectorConfig::default());
        let story_id = seed(&store).await;

        flusher
            .flush(&snapshot(story_id, "Chapter 1\na\nChapter 2\nb\nChapter 3\nc"))
            .await
            .unwrap();
        let first_ids: Vec<Uuid> = store
            .list_chapters(story_id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();

        flusher
            .flush(&snapshot(story_id, "Chapter 1\nonly one"))
            .await
            .unwrap();
        let chapters = store.list_chapters(story_id).await.unwrap();

        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].content, "only one");
        assert!(!first_ids.contains(&chapters[0].id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_flushes_do_not_duplicate_chapters() {
        let store = Arc::new(TestStore::slow(Duration::from_millis(50)));
        let flusher = StoryFlusher::new(store.clone(), ChapterDetectorConfig::default());
        let story_id = seed(&store).await;
        let content = "Chapter 1\na\nChapter 2\nb!";

        let edited = snapshot(story_id, content);

        let (autosave, explicit) = tokio::join!(
            flusher.flush(&edited),
            flusher.write_content(story_id, content),
        );
        assert_eq!(autosave.unwrap().chapter_count, 2);
        assert_eq!(explicit.unwrap().chapter_count, 2);

        assert_eq!(store.list_chapters(story_id).await.unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_waits_for_in_flight_flush() {
        let store = Arc::new(TestStore::slow(Duration::from_millis(50)));
        let flusher = Arc::new(StoryFlusher::new(
            store.clone(),
            ChapterDetectorConfig::default(),
        ));
        let story_id = seed(&store).await;

        let in_flight = {
            let flusher = flusher.clone();
            let edited = snapshot(story_id, "Chapter 1\nxy");
            tokio::spawn(async move { flusher.flush(&edited).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        flusher.delete_story(story_id).await.unwrap();
        assert!(in_flight.await.unwrap().is_ok());

        assert!(store.get_story(story_id).await.unwrap().is_none());
        assert!(store.list_chapters(story_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_flush_after_delete_does_not_recreate_story() {
        let store = Arc::new(TestStore::new());
        let flusher = StoryFlusher::new(store.clone(), ChapterDetectorConfig::default());
        let story_id = seed(&store).await;

        flusher.delete_story(story_id).await.unwrap();
        let result = flusher.flush(&snapshot(story_id, "xy")).await;

        assert!(matches!(result, Err(ApplicationError::NotFound { .. })));
        assert!(store.get_story(story_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_partial_failure_is_not_rolled_back() {
        let store = Arc::new(TestStore::broken_chapters());
        let flusher = StoryFlusher::new(store.clone(), ChapterDetectorConfig::default());
        let story_id = seed(&store).await;

        let result = flusher
            .flush(&snapshot(story_id, "Chapter 1\nkept text"))
            .await;

        assert!(matches!(result, Err(ApplicationError::StoreError(_))));
        let story = store.get_story(story_id).await.unwrap().unwrap();
        assert_eq!(story.content, "Chapter 1\nkept text");
        assert!(store.list_chapters(story_id).await.unwrap().is_empty());
    }
}
