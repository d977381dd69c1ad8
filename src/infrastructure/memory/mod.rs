//! Memory Layer - In-Memory State Management
//!
//! 实现 EditorSessionManager（打开中的编辑会话）和内存版 StoryStore（测试与本地开发）

mod editor_session_manager;
mod story_store;

pub use editor_session_manager::InMemoryEditorSessionManager;
pub use story_store::InMemoryStoryStore;
