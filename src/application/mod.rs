//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（StoryStore、Generation、EditorSessionManager、Autosave 等）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - flush: 自动保存与显式保存共用的刷写流程
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod flush;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    // Story commands
    CreateStory,
    DeleteStory,
    UpdateStoryMeta,
    // Editor commands
    CloseEditor,
    EditPage,
    GoToPage,
    OpenEditor,
    RenameStory,
    SaveStory,
    // Generation commands
    ContinueStory,
    GenerateStory,
    RefineStory,
    // Handlers
    handlers::{
        CloseEditorHandler, ContinueStoryHandler, CreateStoryHandler, CreateStoryResponse,
        DeleteStoryHandler, EditPageHandler, GenerateStoryHandler, GenerationDeps,
        GenerationOutcome, GoToPageHandler, OpenEditorHandler, RefineStoryHandler,
        RenameStoryHandler, SaveStoryHandler, UpdateStoryMetaHandler,
    },
};

pub use error::ApplicationError;
pub use flush::{FlushOutcome, StoryFlusher};

pub use ports::{
    // Autosave
    AutosavePort,
    StorySnapshot,
    // Editor sessions
    EditorSession,
    EditorSessionError,
    EditorSessionManagerPort,
    // Generation
    GenerationError,
    GenerationOperation,
    GenerationPort,
    GenerationRequest,
    GenerationResponse,
    // Story store
    ChapterRecord,
    NewChapter,
    StoreError,
    StoryPatch,
    StoryRecord,
    StoryStorePort,
    // Text extraction
    DocumentFormat,
    ExtractError,
    TextExtractorPort,
};

pub use queries::{
    GetEditorPage,
    GetStory,
    GetStoryChapters,
    ListStories,
    // Handlers
    handlers::{
        ChapterResponse, EditorPageView, GetEditorPageHandler, GetStoryChaptersHandler,
        GetStoryHandler, ListStoriesHandler, StoryResponse, StorySummary,
    },
};
