//! Story Command Handlers

use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{CreateStory, DeleteStory, UpdateStoryMeta};
use crate::application::error::ApplicationError;
use crate::application::flush::StoryFlusher;
use crate::application::ports::{
    AutosavePort, EditorSessionManagerPort, StoryPatch, StoryStorePort,
};
use crate::application::queries::handlers::load_owned_story;
use crate::domain::story::Title;
use crate::infrastructure::events::EventPublisher;

// ============================================================================
// CreateStory
// ============================================================================

/// 创建故事响应
#[derive(Debug, Clone)]
pub struct CreateStoryResponse {
    pub id: Uuid,
    pub title: String,
    pub chapter_count: usize,
}

/// CreateStory Handler
pub struct CreateStoryHandler {
    store: Arc<dyn StoryStorePort>,
    flusher: Arc<StoryFlusher>,
}

impl CreateStoryHandler {
    pub fn new(store: Arc<dyn StoryStorePort>, flusher: Arc<StoryFlusher>) -> Self {
        Self { store, flusher }
    }

    pub async fn handle(&self, command: CreateStory) -> Result<CreateStoryResponse, ApplicationError> {
        let title = Title::new(command.title)?;
        if command.author_id.trim().is_empty() {
            return Err(ApplicationError::validation("author_id is required"));
        }

        let story_id = Uuid::new_v4();
        let patch = StoryPatch {
            title: Some(title.as_str().to_string()),
            content: Some(command.content.clone()),
            genre: Some(command.genre.trim().to_string()),
            tone: Some(command.tone.trim().to_string()),
            author_id: Some(command.author_id.clone()),
            last_saved_at: None,
        };
        self.store.set_story(story_id, patch).await?;

        let chapter_count = self
            .flusher
            .rebuild_chapters(story_id, &command.content)
            .await?;

        tracing::info!(
            story_id = %story_id,
            title = %title,
            author_id = %command.author_id,
            chapter_count = chapter_count,
            "Story created"
        );

        Ok(CreateStoryResponse {
            id: story_id,
            title: title.into_inner(),
            chapter_count,
        })
    }
}

// ============================================================================
// UpdateStoryMeta
// ============================================================================

/// UpdateStoryMeta Handler
pub struct UpdateStoryMetaHandler {
    store: Arc<dyn StoryStorePort>,
}

impl UpdateStoryMetaHandler {
    pub fn new(store: Arc<dyn StoryStorePort>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, command: UpdateStoryMeta) -> Result<(), ApplicationError> {
        load_owned_story(self.store.as_ref(), command.story_id, &command.author_id).await?;

        let title = command
            .title
            .map(Title::new)
            .transpose()?
            .map(Title::into_inner);

        let patch = StoryPatch {
            title,
            genre: command.genre.map(|g| g.trim().to_string()),
            tone: command.tone.map(|t| t.trim().to_string()),
            ..Default::default()
        };
        self.store.set_story(command.story_id, patch).await?;

        tracing::info!(story_id = %command.story_id, "Story metadata updated");
        Ok(())
    }
}

// ============================================================================
// DeleteStory
// ============================================================================

/// DeleteStory Handler
///
/// 先关闭该故事的编辑会话，再在故事锁内删除存储（等待进行中的刷写结束）
pub struct DeleteStoryHandler {
    store: Arc<dyn StoryStorePort>,
    session_manager: Arc<dyn EditorSessionManagerPort>,
    autosave: Arc<dyn AutosavePort>,
    flusher: Arc<StoryFlusher>,
    event_publisher: Arc<EventPublisher>,
}

impl DeleteStoryHandler {
    pub fn new(
        store: Arc<dyn StoryStorePort>,
        session_manager: Arc<dyn EditorSessionManagerPort>,
        autosave: Arc<dyn AutosavePort>,
        flusher: Arc<StoryFlusher>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            store,
            session_manager,
            autosave,
            flusher,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: DeleteStory) -> Result<(), ApplicationError> {
        let story =
            load_owned_story(self.store.as_ref(), command.story_id, &command.author_id).await?;

        for session_id in self.session_manager.sessions_for_story(command.story_id) {
            self.autosave.release(&session_id);
            if self.session_manager.close(&session_id).is_ok() {
                self.event_publisher
                    .publish_session_closed(&session_id, "story_deleted");
            }
        }

        self.flusher.delete_story(command.story_id).await?;
        self.event_publisher.publish_story_deleted(command.story_id);

        tracing::info!(
            story_id = %command.story_id,
            title = %story.title,
            "Story deleted"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{AutosavePort, EditorSession};
    use crate::domain::editor::PagedDocument;
    use crate::domain::ChapterDetectorConfig;
    use crate::infrastructure::memory::{InMemoryEditorSessionManager, InMemoryStoryStore};
    use crate::infrastructure::{AutosaveConfig, AutosaveScheduler};

    fn create_command(content: &str) -> CreateStory {
        CreateStory {
            title: "The Long Night".to_string(),
            genre: "fantasy".to_string(),
            tone: "dark".to_string(),
            content: content.to_string(),
            author_id: "alice".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_story_detects_chapters() {
        let store = Arc::new(InMemoryStoryStore::new());
        let flusher = Arc::new(StoryFlusher::new(
            store.clone(),
            ChapterDetectorConfig::default(),
        ));
        let handler = CreateStoryHandler::new(store.clone(), flusher);

        let response = handler
            .handle(create_command("Chapter 1\nfirst\nChapter 2\nsecond"))
            .await
            .unwrap();

        assert_eq!(response.chapter_count, 2);
        let story = store.get_story(response.id).await.unwrap().unwrap();
        assert_eq!(story.author_id, "alice");
        assert_eq!(store.list_chapters(response.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_story_rejects_empty_title() {
        let store = Arc::new(InMemoryStoryStore::new());
        let flusher = Arc::new(StoryFlusher::new(
            store.clone(),
            ChapterDetectorConfig::default(),
        ));
        let handler = CreateStoryHandler::new(store, flusher);

        let mut command = create_command("");
        command.title = "  ".to_string();
        let result = handler.handle(command).await;
        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_update_meta_keeps_content() {
        let store = Arc::new(InMemoryStoryStore::new());
        let flusher = Arc::new(StoryFlusher::new(
            store.clone(),
            ChapterDetectorConfig::default(),
        ));
        let created = CreateStoryHandler::new(store.clone(), flusher)
            .handle(create_command("body text"))
            .await
            .unwrap();

        UpdateStoryMetaHandler::new(store.clone())
            .handle(UpdateStoryMeta {
                story_id: created.id,
                author_id: "alice".to_string(),
                title: Some("Dawn".to_string()),
                genre: None,
                tone: Some("hopeful".to_string()),
            })
            .await
            .unwrap();

        let story = store.get_story(created.id).await.unwrap().unwrap();
        assert_eq!(story.title, "Dawn");
        assert_eq!(story.tone, "hopeful");
        assert_eq!(story.genre, "fantasy");
        assert_eq!(story.content, "body text");
    }

    #[tokio::test]
    async fn test_delete_story_closes_sessions_and_blocks_late_flush() {
        let store = Arc::new(InMemoryStoryStore::new());
        let sessions = Arc::new(InMemoryEditorSessionManager::new());
        let publisher = Arc::new(EventPublisher::new());
        let flusher = Arc::new(StoryFlusher::new(
            store.clone(),
            ChapterDetectorConfig::default(),
        ));
        let autosave = Arc::new(AutosaveScheduler::new(
            AutosaveConfig::default(),
            flusher.clone(),
            sessions.clone(),
            publisher.clone(),
        ));
        let created = CreateStoryHandler::new(store.clone(), flusher.clone())
            .handle(create_command("Chapter 1\nx"))
            .await
            .unwrap();

        let session_id = sessions
            .create(EditorSession::new(
                created.id,
                "alice",
                "The Long Night",
                "fantasy",
                "dark",
                PagedDocument::new("Chapter 1\nx", 1800),
            ))
            .unwrap();
        let edited = sessions.edit_page(&session_id, "Chapter 1\nxy").unwrap();
        autosave.schedule(edited.snapshot());

        DeleteStoryHandler::new(
            store.clone(),
            sessions.clone(),
            autosave.clone(),
            flusher.clone(),
            publisher,
        )
        .handle(DeleteStory {
            story_id: created.id,
            author_id: "alice".to_string(),
        })
        .await
        .unwrap();

        assert!(!sessions.is_valid(&session_id));
        assert!(!autosave.is_pending(&session_id));

        let late = flusher.flush(&edited.snapshot()).await;
        assert!(matches!(late, Err(ApplicationError::NotFound { .. })));
        assert!(store.get_story(created.id).await.unwrap().is_none());
        assert!(store.list_stories("alice").await.unwrap().is_empty());
    }
}
