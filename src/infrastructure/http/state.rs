//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CloseEditorHandler, ContinueStoryHandler, CreateStoryHandler, DeleteStoryHandler,
    EditPageHandler, GenerateStoryHandler, GenerationDeps, GoToPageHandler, OpenEditorHandler,
    RefineStoryHandler, RenameStoryHandler, SaveStoryHandler, UpdateStoryMetaHandler,
    // Query handlers
    GetEditorPageHandler, GetStoryChaptersHandler, GetStoryHandler, ListStoriesHandler,
    // Ports
    AutosavePort, EditorSessionManagerPort, GenerationPort, StoryFlusher, StoryStorePort,
    TextExtractorPort,
};
use crate::infrastructure::events::EventPublisher;

/// 应用状态
///
/// 编辑会话为内存实现，故事存储可替换（SQLite / 内存）
pub struct AppState {
    // ========== Ports ==========
    pub store: Arc<dyn StoryStorePort>,
    pub session_manager: Arc<dyn EditorSessionManagerPort>,
    pub autosave: Arc<dyn AutosavePort>,
    pub generation: Arc<dyn GenerationPort>,
    pub extractor: Arc<dyn TextExtractorPort>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub create_story_handler: CreateStoryHandler,
    pub update_story_handler: UpdateStoryMetaHandler,
    pub delete_story_handler: DeleteStoryHandler,
    pub open_editor_handler: OpenEditorHandler,
    pub edit_page_handler: EditPageHandler,
    pub go_to_page_handler: GoToPageHandler,
    pub rename_story_handler: RenameStoryHandler,
    pub save_story_handler: SaveStoryHandler,
    pub close_editor_handler: CloseEditorHandler,
    pub generate_story_handler: GenerateStoryHandler,
    pub refine_story_handler: RefineStoryHandler,
    pub continue_story_handler: ContinueStoryHandler,

    // ========== Query Handlers ==========
    pub get_story_handler: GetStoryHandler,
    pub list_stories_handler: ListStoriesHandler,
    pub get_chapters_handler: GetStoryChaptersHandler,
    pub get_editor_page_handler: GetEditorPageHandler,
}

impl AppState {
    /// 创建应用状态
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn StoryStorePort>,
        session_manager: Arc<dyn EditorSessionManagerPort>,
        autosave: Arc<dyn AutosavePort>,
        generation: Arc<dyn GenerationPort>,
        extractor: Arc<dyn TextExtractorPort>,
        event_publisher: Arc<EventPublisher>,
        flusher: Arc<StoryFlusher>,
        page_size: usize,
    ) -> Self {
        let generation_deps = Arc::new(GenerationDeps {
            generation: generation.clone(),
            store: store.clone(),
            session_manager: session_manager.clone(),
            autosave: autosave.clone(),
            flusher: flusher.clone(),
            event_publisher: event_publisher.clone(),
        });

        Self {
            // Ports
            store: store.clone(),
            session_manager: session_manager.clone(),
            autosave: autosave.clone(),
            generation,
            extractor,
            event_publisher: event_publisher.clone(),

            // Command handlers
            create_story_handler: CreateStoryHandler::new(store.clone(), flusher.clone()),
            update_story_handler: UpdateStoryMetaHandler::new(store.clone()),
            delete_story_handler: DeleteStoryHandler::new(
                store.clone(),
                session_manager.clone(),
                autosave.clone(),
                flusher.clone(),
                event_publisher.clone(),
            ),
            open_editor_handler: OpenEditorHandler::new(
                store.clone(),
                session_manager.clone(),
                page_size,
            ),
            edit_page_handler: EditPageHandler::new(session_manager.clone(), autosave.clone()),
            go_to_page_handler: GoToPageHandler::new(session_manager.clone()),
            rename_story_handler: RenameStoryHandler::new(
                session_manager.clone(),
                autosave.clone(),
            ),
            save_story_handler: SaveStoryHandler::new(
                session_manager.clone(),
                autosave.clone(),
                flusher,
                event_publisher.clone(),
            ),
            close_editor_handler: CloseEditorHandler::new(
                session_manager.clone(),
                autosave,
                event_publisher,
            ),
            generate_story_handler: GenerateStoryHandler::new(generation_deps.clone()),
            refine_story_handler: RefineStoryHandler::new(generation_deps.clone()),
            continue_story_handler: ContinueStoryHandler::new(generation_deps),

            // Query handlers
            get_story_handler: GetStoryHandler::new(store.clone()),
            list_stories_handler: ListStoriesHandler::new(store.clone()),
            get_chapters_handler: GetStoryChaptersHandler::new(store),
            get_editor_page_handler: GetEditorPageHandler::new(session_manager),
        }
    }
}
