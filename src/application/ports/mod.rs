//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod autosave;
mod editor_sessions;
mod generation;
mod story_store;
mod text_extractor;

pub use autosave::{AutosavePort, StorySnapshot};
pub use editor_sessions::{EditorSession, EditorSessionError, EditorSessionManagerPort};
pub use generation::{
    GenerationError, GenerationOperation, GenerationPort, GenerationRequest, GenerationResponse,
};
pub use story_store::{
    ChapterRecord, NewChapter, StoreError, StoryPatch, StoryRecord, StoryStorePort,
};
pub use text_extractor::{DocumentFormat, ExtractError, TextExtractorPort};
