//! AI Novel Crafter - 分页编辑、章节识别与防抖自动保存
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - 分页器 `split_pages` 与章节识别器 `detect_chapters`（纯函数）
//! - Editor Context: `PagedDocument` 分页编辑模型
//! - Story Context: 标题、生成参数校验
//!
//! 应用层 (application/):
//! - Ports: StoryStore, EditorSessionManager, Autosave, Generation, TextExtractor
//! - Commands / Queries: CQRS 处理器
//! - Flush: 自动保存与显式保存共用的刷写流程
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: JSON API + WebSocket
//! - Memory: 编辑会话与内存版故事存储
//! - Worker: 防抖自动保存、空闲会话清理
//! - Persistence: SQLite
//! - Adapters: 生成 webhook 客户端、上传文件文本提取
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
