//! Generation Command Handlers
//!
//! 生成、润色、续写：校验 → 调用 webhook → 写回故事与章节 → 发布事件。
//! 校验失败时不会发出任何网络请求。

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{ContinueStory, GenerateStory, RefineStory};
use crate::application::error::ApplicationError;
use crate::application::flush::StoryFlusher;
use crate::application::ports::{
    AutosavePort, EditorSessionManagerPort, GenerationOperation, GenerationPort,
    GenerationRequest, StoryPatch, StoryRecord, StoryStorePort,
};
use crate::application::queries::handlers::load_owned_story;
use crate::domain::story::{append_continuation, StoryBrief, MAX_WORDS};
use crate::infrastructure::events::EventPublisher;

/// 生成结果
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub story_id: Uuid,
    pub operation: GenerationOperation,
    pub title: String,
    pub content: String,
    pub chapter_count: usize,
}

/// 生成类 Handler 共享的依赖
pub struct GenerationDeps {
    pub generation: Arc<dyn GenerationPort>,
    pub store: Arc<dyn StoryStorePort>,
    pub session_manager: Arc<dyn EditorSessionManagerPort>,
    pub autosave: Arc<dyn AutosavePort>,
    pub flusher: Arc<StoryFlusher>,
    pub event_publisher: Arc<EventPublisher>,
}

impl GenerationDeps {
    /// 调用 webhook，失败时发布 GenerationFailed
    async fn submit(
        &self,
        request: GenerationRequest,
        story_id: Option<Uuid>,
    ) -> Result<String, ApplicationError> {
        let operation = request.operation();
        let started = std::time::Instant::now();

        match self.generation.submit(request).await {
            Ok(response) => {
                tracing::info!(
                    operation = operation.as_str(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    text_chars = response.text.chars().count(),
                    "Generation completed"
                );
                Ok(response.text)
            }
            Err(e) => {
                tracing::warn!(
                    operation = operation.as_str(),
                    story_id = ?story_id,
                    error = %e,
                    "Generation failed"
                );
                self.event_publisher
                    .publish_generation_failed(operation, story_id, &e.to_string());
                Err(e.into())
            }
        }
    }

    /// 打开中的编辑会话优先于已保存的正文
    fn current_content(&self, story: &StoryRecord) -> String {
        self.session_manager
            .sessions_for_story(story.id)
            .into_iter()
            .find_map(|id| self.session_manager.get(&id).ok())
            .map(|session| session.document.content().to_string())
            .unwrap_or_else(|| story.content.clone())
    }

    /// 写回生成的正文，并同步到该故事所有打开的编辑会话
    async fn apply_content(
        &self,
        story: &StoryRecord,
        content: &str,
    ) -> Result<usize, ApplicationError> {
        let sessions = self.session_manager.sessions_for_story(story.id);
        for session_id in &sessions {
            // 旧缓冲区的待触发保存会覆盖生成结果
            self.autosave.cancel(session_id);
            self.session_manager.replace_content(session_id, content)?;
        }

        // 与进行中的自动保存在故事锁内串行
        let outcome = self.flusher.write_content(story.id, content).await?;
        let saved_at = outcome.saved_at;
        let chapter_count = outcome.chapter_count;

        for session_id in &sessions {
            self.session_manager.mark_saved(session_id, saved_at, content);
            if let Ok(session) = self.session_manager.get(session_id) {
                self.event_publisher.publish_content_replaced(
                    session_id,
                    story.id,
                    session.document.total_pages(),
                );
            }
        }

        Ok(chapter_count)
    }
}

// ============================================================================
// GenerateStory
// ============================================================================

/// GenerateStory Handler
pub struct GenerateStoryHandler {
    deps: Arc<GenerationDeps>,
}

impl GenerateStoryHandler {
    pub fn new(deps: Arc<GenerationDeps>) -> Self {
        Self { deps }
    }

    pub async fn handle(&self, command: GenerateStory) -> Result<GenerationOutcome, ApplicationError> {
        let brief = StoryBrief::new(
            &command.title,
            &command.genre,
            &command.tone,
            &command.prompt,
            command.chapters,
            command.words,
        )?;
        if command.author_id.trim().is_empty() {
            return Err(ApplicationError::validation("author_id is required"));
        }

        let request = GenerationRequest::Generate {
            title: brief.title.as_str().to_string(),
            genre: brief.genre.clone(),
            tone: brief.tone.clone(),
            prompt: brief.prompt.clone(),
            chapters: brief.chapters,
            words: brief.words,
            user_id: command.author_id.clone(),
        };
        let text = self.deps.submit(request, None).await?;

        let story_id = Uuid::new_v4();
        self.deps
            .store
            .set_story(
                story_id,
                StoryPatch {
                    title: Some(brief.title.as_str().to_string()),
                    content: Some(text.clone()),
                    genre: Some(brief.genre),
                    tone: Some(brief.tone),
                    author_id: Some(command.author_id),
                    last_saved_at: Some(Utc::now()),
                },
            )
            .await?;
        let chapter_count = self.deps.flusher.rebuild_chapters(story_id, &text).await?;

        let title = brief.title.into_inner();
        self.deps.event_publisher.publish_generation_completed(
            GenerationOperation::Generate,
            story_id,
            &title,
        );

        Ok(GenerationOutcome {
            story_id,
            operation: GenerationOperation::Generate,
            title,
            content: text,
            chapter_count,
        })
    }
}

// ============================================================================
// RefineStory
// ============================================================================

/// RefineStory Handler - 用润色结果替换全文
pub struct RefineStoryHandler {
    deps: Arc<GenerationDeps>,
}

impl RefineStoryHandler {
    pub fn new(deps: Arc<GenerationDeps>) -> Self {
        Self { deps }
    }

    pub async fn handle(&self, command: RefineStory) -> Result<GenerationOutcome, ApplicationError> {
        let instructions = command.instructions.trim();
        if instructions.is_empty() {
            return Err(ApplicationError::validation("Refinement instructions are required"));
        }

        let story =
            load_owned_story(self.deps.store.as_ref(), command.story_id, &command.author_id)
                .await?;
        let content = self.deps.current_content(&story);
        if content.trim().is_empty() {
            return Err(ApplicationError::validation("Cannot refine an empty story"));
        }

        let request = GenerationRequest::Refine {
            story_id: story.id,
            content,
            instructions: instructions.to_string(),
            user_id: command.author_id,
        };
        let refined = self.deps.submit(request, Some(story.id)).await?;

        let chapter_count = self.deps.apply_content(&story, &refined).await?;
        self.deps.event_publisher.publish_generation_completed(
            GenerationOperation::Refine,
            story.id,
            &story.title,
        );

        Ok(GenerationOutcome {
            story_id: story.id,
            operation: GenerationOperation::Refine,
            title: story.title,
            content: refined,
            chapter_count,
        })
    }
}

// ============================================================================
// ContinueStory
// ============================================================================

/// ContinueStory Handler - 在正文后追加续写（空行分隔）
pub struct ContinueStoryHandler {
    deps: Arc<GenerationDeps>,
}

impl ContinueStoryHandler {
    pub fn new(deps: Arc<GenerationDeps>) -> Self {
        Self { deps }
    }

    pub async fn handle(
        &self,
        command: ContinueStory,
    ) -> Result<GenerationOutcome, ApplicationError> {
        let prompt = command.prompt.trim();
        if prompt.is_empty() {
            return Err(ApplicationError::validation("Continuation prompt is required"));
        }
        if command.words == 0 || command.words > MAX_WORDS {
            return Err(ApplicationError::validation(format!(
                "words must be between 1 and {}, got {}",
                MAX_WORDS, command.words
            )));
        }

        let story =
            load_owned_story(self.deps.store.as_ref(), command.story_id, &command.author_id)
                .await?;
        let content = self.deps.current_content(&story);

        let request = GenerationRequest::Continue {
            story_id: story.id,
            content: content.clone(),
            prompt: prompt.to_string(),
            words: command.words,
            user_id: command.author_id,
        };
        let addition = self.deps.submit(request, Some(story.id)).await?;

        let combined = append_continuation(&content, &addition);
        let chapter_count = self.deps.apply_content(&story, &combined).await?;
        self.deps.event_publisher.publish_generation_completed(
            GenerationOperation::Continue,
            story.id,
            &story.title,
        );

        Ok(GenerationOutcome {
            story_id: story.id,
            operation: GenerationOperation::Continue,
            title: story.title,
            content: combined,
            chapter_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        EditorSession, GenerationError, GenerationResponse, StorySnapshot,
    };
    use crate::domain::editor::PagedDocument;
    use crate::domain::ChapterDetectorConfig;
    use crate::infrastructure::events::WsEvent;
    use crate::infrastructure::memory::{InMemoryEditorSessionManager, InMemoryStoryStore};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 返回固定文本或错误的生成服务
    struct FakeGeneration {
        reply: Result<String, u64>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl FakeGeneration {
        fn text(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn timeout(secs: u64) -> Self {
            Self {
                reply: Err(secs),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GenerationPort for FakeGeneration {
        async fn submit(
            &self,
            request: GenerationRequest,
        ) -> Result<GenerationResponse, GenerationError> {
            let operation = request.operation();
            self.requests.lock().unwrap().push(request);
            match &self.reply {
                Ok(text) => Ok(GenerationResponse {
                    operation,
                    text: text.clone(),
                }),
                Err(secs) => Err(GenerationError::Timeout(*secs)),
            }
        }
    }

    struct NoopAutosave;

    impl AutosavePort for NoopAutosave {
        fn schedule(&self, _snapshot: StorySnapshot) {}
        fn cancel(&self, _session_id: &str) {}
        fn release(&self, _session_id: &str) {}
        fn is_pending(&self, _session_id: &str) -> bool {
            false
        }
    }

    struct Fixture {
        generation: Arc<FakeGeneration>,
        store: Arc<InMemoryStoryStore>,
        sessions: Arc<InMemoryEditorSessionManager>,
        publisher: Arc<EventPublisher>,
        deps: Arc<GenerationDeps>,
    }

    fn fixture(generation: FakeGeneration) -> Fixture {
        let generation = Arc::new(generation);
        let store = Arc::new(InMemoryStoryStore::new());
        let sessions = Arc::new(InMemoryEditorSessionManager::new());
        let publisher = Arc::new(EventPublisher::new());
        let deps = Arc::new(GenerationDeps {
            generation: generation.clone(),
            store: store.clone(),
            session_manager: sessions.clone(),
            autosave: Arc::new(NoopAutosave),
            flusher: Arc::new(StoryFlusher::new(
                store.clone(),
                ChapterDetectorConfig::default(),
            )),
            event_publisher: publisher.clone(),
        });
        Fixture {
            generation,
            store,
            sessions,
            publisher,
            deps,
        }
    }

    fn generate_command() -> GenerateStory {
        GenerateStory {
            title: "Starfall".to_string(),
            genre: "sci-fi".to_string(),
            tone: "grim".to_string(),
            prompt: "A colony ship loses power".to_string(),
            chapters: 2,
            words: 1000,
            author_id: "alice".to_string(),
        }
    }

    async fn seed_story(store: &InMemoryStoryStore, content: &str) -> Uuid {
        let id = Uuid::new_v4();
        store
            .set_story(
                id,
                StoryPatch {
                    title: Some("Tale".to_string()),
                    content: Some(content.to_string()),
                    author_id: Some("alice".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn test_generate_creates_story_with_chapters() {
        let f = fixture(FakeGeneration::text(
            "Chapter 1: Dark\nlights out\nChapter 2: Light\npower back",
        ));
        let mut events = f.publisher.subscribe_global();

        let outcome = GenerateStoryHandler::new(f.deps.clone())
            .handle(generate_command())
            .await
            .unwrap();

        assert_eq!(outcome.chapter_count, 2);
        let story = f.store.get_story(outcome.story_id).await.unwrap().unwrap();
        assert_eq!(story.title, "Starfall");
        assert_eq!(story.author_id, "alice");
        assert!(matches!(
            events.try_recv(),
            Ok(WsEvent::GenerationCompleted { .. })
        ));
    }

    #[tokio::test]
    async fn test_generate_validation_precedes_network() {
        let f = fixture(FakeGeneration::text("unused"));
        let mut command = generate_command();
        command.words = 0;

        let result = GenerateStoryHandler::new(f.deps.clone())
            .handle(command)
            .await;

        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
        assert!(f.generation.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_timeout_is_surfaced() {
        let f = fixture(FakeGeneration::timeout(900));
        let mut events = f.publisher.subscribe_global();

        let result = GenerateStoryHandler::new(f.deps.clone())
            .handle(generate_command())
            .await;

        assert!(matches!(result, Err(ApplicationError::Timeout(_))));
        assert!(matches!(
            events.try_recv(),
            Ok(WsEvent::GenerationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_continue_appends_with_blank_line() {
        let f = fixture(FakeGeneration::text("and then it rained."));
        let story_id = seed_story(&f.store, "It was sunny.").await;

        let outcome = ContinueStoryHandler::new(f.deps.clone())
            .handle(ContinueStory {
                story_id,
                prompt: "weather turns".to_string(),
                words: 200,
                author_id: "alice".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(outcome.content, "It was sunny.\n\nand then it rained.");
        let story = f.store.get_story(story_id).await.unwrap().unwrap();
        assert_eq!(story.content, outcome.content);
    }

    #[tokio::test]
    async fn test_refine_uses_and_updates_open_session() {
        let f = fixture(FakeGeneration::text("Polished text."));
        let story_id = seed_story(&f.store, "saved text").await;

        let mut session = EditorSession::new(
            story_id,
            "alice",
            "Tale",
            "",
            "",
            PagedDocument::new("saved text", 1800),
        );
        session.document.edit_current_page("unsaved draft");
        let session_id = f.sessions.create(session).unwrap();

        RefineStoryHandler::new(f.deps.clone())
            .handle(RefineStory {
                story_id,
                instructions: "tighten prose".to_string(),
                author_id: "alice".to_string(),
            })
            .await
            .unwrap();

        let requests = f.generation.requests.lock().unwrap();
        match &requests[0] {
            GenerationRequest::Refine { content, .. } => assert_eq!(content, "unsaved draft"),
            other => panic!("unexpected request: {:?}", other),
        }

        let session = f.sessions.get(&session_id).unwrap();
        assert_eq!(session.document.content(), "Polished text.");
        assert!(!session.document.is_dirty());
    }

    #[tokio::test]
    async fn test_refine_requires_ownership() {
        let f = fixture(FakeGeneration::text("x"));
        let story_id = seed_story(&f.store, "text").await;

        let result = RefineStoryHandler::new(f.deps.clone())
            .handle(RefineStory {
                story_id,
                instructions: "shorter".to_string(),
                author_id: "bob".to_string(),
            })
            .await;

        assert!(matches!(result, Err(ApplicationError::Forbidden(_))));
        assert!(f.generation.requests.lock().unwrap().is_empty());
    }
}
