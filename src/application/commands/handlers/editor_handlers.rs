//! Editor Command Handlers
//!
//! 所有修改编辑缓冲区的命令都会重新启动自动保存的防抖计时器

use std::sync::Arc;

use crate::application::commands::{
    CloseEditor, EditPage, GoToPage, OpenEditor, RenameStory, SaveStory,
};
use crate::application::error::ApplicationError;
use crate::application::flush::{FlushOutcome, StoryFlusher};
use crate::application::ports::{
    AutosavePort, EditorSession, EditorSessionManagerPort, StoryStorePort,
};
use crate::application::queries::handlers::{load_owned_story, EditorPageView};
use crate::domain::editor::PagedDocument;
use crate::domain::story::Title;
use crate::infrastructure::events::EventPublisher;

// ============================================================================
// OpenEditor
// ============================================================================

/// OpenEditor Handler
pub struct OpenEditorHandler {
    store: Arc<dyn StoryStorePort>,
    session_manager: Arc<dyn EditorSessionManagerPort>,
    page_size: usize,
}

impl OpenEditorHandler {
    pub fn new(
        store: Arc<dyn StoryStorePort>,
        session_manager: Arc<dyn EditorSessionManagerPort>,
        page_size: usize,
    ) -> Self {
        Self {
            store,
            session_manager,
            page_size,
        }
    }

    pub async fn handle(&self, command: OpenEditor) -> Result<EditorPageView, ApplicationError> {
        let story =
            load_owned_story(self.store.as_ref(), command.story_id, &command.author_id).await?;

        let document = PagedDocument::new(story.content, self.page_size);
        let mut session = EditorSession::new(
            story.id,
            command.author_id,
            story.title,
            story.genre,
            story.tone,
            document,
        );
        session.last_saved_at = story.last_saved_at;

        let view = EditorPageView::from(&session);
        let session_id = self.session_manager.create(session)?;

        tracing::info!(
            session_id = %session_id,
            story_id = %view.story_id,
            total_pages = view.total_pages,
            "Editor opened"
        );

        Ok(view)
    }
}

// ============================================================================
// EditPage
// ============================================================================

/// EditPage Handler
pub struct EditPageHandler {
    session_manager: Arc<dyn EditorSessionManagerPort>,
    autosave: Arc<dyn AutosavePort>,
}

impl EditPageHandler {
    pub fn new(
        session_manager: Arc<dyn EditorSessionManagerPort>,
        autosave: Arc<dyn AutosavePort>,
    ) -> Self {
        Self {
            session_manager,
            autosave,
        }
    }

    pub async fn handle(&self, command: EditPage) -> Result<EditorPageView, ApplicationError> {
        let session = self
            .session_manager
            .edit_page(&command.session_id, &command.text)?;
        self.autosave.schedule(session.snapshot());
        Ok(EditorPageView::from(&session))
    }
}

// ============================================================================
// GoToPage
// ============================================================================

/// GoToPage Handler
///
/// 越界页码不报错，返回未变化的当前页
pub struct GoToPageHandler {
    session_manager: Arc<dyn EditorSessionManagerPort>,
}

impl GoToPageHandler {
    pub fn new(session_manager: Arc<dyn EditorSessionManagerPort>) -> Self {
        Self { session_manager }
    }

    pub async fn handle(&self, command: GoToPage) -> Result<EditorPageView, ApplicationError> {
        let moved = self
            .session_manager
            .go_to_page(&command.session_id, command.page)?;
        if !moved {
            tracing::debug!(
                session_id = %command.session_id,
                page = command.page,
                "Page out of range, ignored"
            );
        }

        let session = self.session_manager.get(&command.session_id)?;
        Ok(EditorPageView::from(&session))
    }
}

// ============================================================================
// RenameStory
// ============================================================================

/// RenameStory Handler
pub struct RenameStoryHandler {
    session_manager: Arc<dyn EditorSessionManagerPort>,
    autosave: Arc<dyn AutosavePort>,
}

impl RenameStoryHandler {
    pub fn new(
        session_manager: Arc<dyn EditorSessionManagerPort>,
        autosave: Arc<dyn AutosavePort>,
    ) -> Self {
        Self {
            session_manager,
            autosave,
        }
    }

    pub async fn handle(&self, command: RenameStory) -> Result<EditorPageView, ApplicationError> {
        let title = Title::new(command.title)?;
        let session = self
            .session_manager
            .rename(&command.session_id, title.as_str())?;
        self.autosave.schedule(session.snapshot());
        Ok(EditorPageView::from(&session))
    }
}

// ============================================================================
// SaveStory
// ============================================================================

/// SaveStory Handler
///
/// 与自动保存走同一刷写流程，但错误返回给调用方
pub struct SaveStoryHandler {
    session_manager: Arc<dyn EditorSessionManagerPort>,
    autosave: Arc<dyn AutosavePort>,
    flusher: Arc<StoryFlusher>,
    event_publisher: Arc<EventPublisher>,
}

impl SaveStoryHandler {
    pub fn new(
        session_manager: Arc<dyn EditorSessionManagerPort>,
        autosave: Arc<dyn AutosavePort>,
        flusher: Arc<StoryFlusher>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            session_manager,
            autosave,
            flusher,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: SaveStory) -> Result<FlushOutcome, ApplicationError> {
        let session = self.session_manager.get(&command.session_id)?;
        let snapshot = session.snapshot();

        // 显式保存覆盖待触发的自动保存
        self.autosave.cancel(&command.session_id);

        let outcome = match self.flusher.flush(&snapshot).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    session_id = %command.session_id,
                    story_id = %snapshot.story_id,
                    error = %e,
                    "Explicit save failed"
                );
                return Err(e);
            }
        };

        self.session_manager
            .mark_saved(&command.session_id, outcome.saved_at, &snapshot.content);
        self.event_publisher.publish_story_saved(
            &command.session_id,
            outcome.story_id,
            outcome.saved_at,
            outcome.chapter_count,
        );

        tracing::info!(
            session_id = %command.session_id,
            story_id = %outcome.story_id,
            chapter_count = outcome.chapter_count,
            "Story saved"
        );

        Ok(outcome)
    }
}

// ============================================================================
// CloseEditor
// ============================================================================

/// CloseEditor Handler
///
/// 取消待触发的自动保存并丢弃缓冲区，未保存的修改不会写入
pub struct CloseEditorHandler {
    session_manager: Arc<dyn EditorSessionManagerPort>,
    autosave: Arc<dyn AutosavePort>,
    event_publisher: Arc<EventPublisher>,
}

impl CloseEditorHandler {
    pub fn new(
        session_manager: Arc<dyn EditorSessionManagerPort>,
        autosave: Arc<dyn AutosavePort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            session_manager,
            autosave,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: CloseEditor) -> Result<(), ApplicationError> {
        if !self.session_manager.is_valid(&command.session_id) {
            return Err(ApplicationError::not_found_str(
                "Editor session",
                &command.session_id,
            ));
        }

        if self.autosave.is_pending(&command.session_id) {
            tracing::warn!(
                session_id = %command.session_id,
                "Closing editor with unsaved changes, pending autosave discarded"
            );
        }
        self.autosave.release(&command.session_id);
        self.session_manager.close(&command.session_id)?;

        self.event_publisher
            .publish_session_closed(&command.session_id, "closed");
        self.event_publisher.unregister_session(&command.session_id);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{StoryPatch, StorySnapshot};
    use crate::domain::ChapterDetectorConfig;
    use crate::infrastructure::memory::{InMemoryEditorSessionManager, InMemoryStoryStore};
    use std::sync::Mutex;
    use uuid::Uuid;

    /// 只记录调用的自动保存
    #[derive(Default)]
    struct RecordingAutosave {
        scheduled: Mutex<Vec<StorySnapshot>>,
        cancelled: Mutex<Vec<String>>,
        released: Mutex<Vec<String>>,
    }

    impl AutosavePort for RecordingAutosave {
        fn schedule(&self, snapshot: StorySnapshot) {
            self.scheduled.lock().unwrap().push(snapshot);
        }

        fn cancel(&self, session_id: &str) {
            self.cancelled.lock().unwrap().push(session_id.to_string());
        }

        fn release(&self, session_id: &str) {
            self.released.lock().unwrap().push(session_id.to_string());
        }

        fn is_pending(&self, session_id: &str) -> bool {
            self.scheduled
                .lock()
                .unwrap()
                .iter()
                .any(|s| s.session_id == session_id)
        }
    }

    struct Fixture {
        store: Arc<InMemoryStoryStore>,
        sessions: Arc<InMemoryEditorSessionManager>,
        autosave: Arc<RecordingAutosave>,
        publisher: Arc<EventPublisher>,
        story_id: Uuid,
    }

    async fn fixture(content: &str) -> Fixture {
        let store = Arc::new(InMemoryStoryStore::new());
        let story_id = Uuid::new_v4();
        store
            .set_story(
                story_id,
                StoryPatch {
                    title: Some("Tale".to_string()),
                    content: Some(content.to_string()),
                    genre: Some("fantasy".to_string()),
                    tone: Some("light".to_string()),
                    author_id: Some("alice".to_string()),
                    last_saved_at: None,
                },
            )
            .await
            .unwrap();

        Fixture {
            store,
            sessions: Arc::new(InMemoryEditorSessionManager::new()),
            autosave: Arc::new(RecordingAutosave::default()),
            publisher: Arc::new(EventPublisher::new()),
            story_id,
        }
    }

    async fn open(f: &Fixture, page_size: usize) -> EditorPageView {
        OpenEditorHandler::new(f.store.clone(), f.sessions.clone(), page_size)
            .handle(OpenEditor {
                story_id: f.story_id,
                author_id: "alice".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_editor_paginates_story() {
        let f = fixture(&"x".repeat(3000)).await;
        let view = open(&f, 1800).await;

        assert_eq!(view.page, 1);
        assert_eq!(view.total_pages, 2);
        assert_eq!(view.text.len(), 1800);
        assert!(!view.dirty);
    }

    #[tokio::test]
    async fn test_open_editor_rejects_other_author() {
        let f = fixture("text").await;
        let result = OpenEditorHandler::new(f.store.clone(), f.sessions.clone(), 1800)
            .handle(OpenEditor {
                story_id: f.story_id,
                author_id: "mallory".to_string(),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_edit_page_arms_autosave() {
        let f = fixture("aaaabbbb").await;
        let view = open(&f, 4).await;

        GoToPageHandler::new(f.sessions.clone())
            .handle(GoToPage {
                session_id: view.session_id.clone(),
                page: 2,
            })
            .await
            .unwrap();

        let edited = EditPageHandler::new(f.sessions.clone(), f.autosave.clone())
            .handle(EditPage {
                session_id: view.session_id.clone(),
                text: "BB".to_string(),
            })
            .await
            .unwrap();

        assert!(edited.dirty);
        let scheduled = f.autosave.scheduled.lock().unwrap();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].content, "aaaaBB");
    }

    #[tokio::test]
    async fn test_go_to_invalid_page_is_noop() {
        let f = fixture("aaaabbbb").await;
        let view = open(&f, 4).await;

        let after = GoToPageHandler::new(f.sessions.clone())
            .handle(GoToPage {
                session_id: view.session_id.clone(),
                page: 9,
            })
            .await
            .unwrap();

        assert_eq!(after.page, 1);
        assert_eq!(after.text, "aaaa");
    }

    #[tokio::test]
    async fn test_rename_validates_title() {
        let f = fixture("text").await;
        let view = open(&f, 1800).await;
        let handler = RenameStoryHandler::new(f.sessions.clone(), f.autosave.clone());

        let result = handler
            .handle(RenameStory {
                session_id: view.session_id.clone(),
                title: "".to_string(),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
        assert!(f.autosave.scheduled.lock().unwrap().is_empty());

        let renamed = handler
            .handle(RenameStory {
                session_id: view.session_id.clone(),
                title: "New Name".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(renamed.title, "New Name");
        assert_eq!(f.autosave.scheduled.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_story_flushes_and_clears_dirty() {
        let f = fixture("Chapter 1\nold").await;
        let view = open(&f, 1800).await;

        EditPageHandler::new(f.sessions.clone(), f.autosave.clone())
            .handle(EditPage {
                session_id: view.session_id.clone(),
                text: "Chapter 1\nnew\nChapter 2\nmore".to_string(),
            })
            .await
            .unwrap();

        let flusher = Arc::new(StoryFlusher::new(
            f.store.clone(),
            ChapterDetectorConfig::default(),
        ));
        let outcome = SaveStoryHandler::new(
            f.sessions.clone(),
            f.autosave.clone(),
            flusher,
            f.publisher.clone(),
        )
        .handle(SaveStory {
            session_id: view.session_id.clone(),
        })
        .await
        .unwrap();

        assert_eq!(outcome.chapter_count, 2);
        assert_eq!(
            f.autosave.cancelled.lock().unwrap().as_slice(),
            [view.session_id.clone()]
        );

        let story = f.store.get_story(f.story_id).await.unwrap().unwrap();
        assert_eq!(story.content, "Chapter 1\nnew\nChapter 2\nmore");

        let session = f.sessions.get(&view.session_id).unwrap();
        assert!(!session.document.is_dirty());
        assert_eq!(session.last_saved_at, Some(outcome.saved_at));
    }

    #[tokio::test]
    async fn test_close_editor_discards_buffer() {
        let f = fixture("original").await;
        let view = open(&f, 1800).await;

        EditPageHandler::new(f.sessions.clone(), f.autosave.clone())
            .handle(EditPage {
                session_id: view.session_id.clone(),
                text: "unsaved".to_string(),
            })
            .await
            .unwrap();

        let handler =
            CloseEditorHandler::new(f.sessions.clone(), f.autosave.clone(), f.publisher.clone());
        handler
            .handle(CloseEditor {
                session_id: view.session_id.clone(),
            })
            .await
            .unwrap();

        assert!(!f.sessions.is_valid(&view.session_id));
        assert_eq!(f.autosave.released.lock().unwrap().len(), 1);
        let story = f.store.get_story(f.story_id).await.unwrap().unwrap();
        assert_eq!(story.content, "original");

        let again = handler
            .handle(CloseEditor {
                session_id: view.session_id.clone(),
            })
            .await;
        assert!(matches!(again, Err(ApplicationError::NotFound { .. })));
    }
}
