//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Story Context: 故事元数据与生成参数
//! - Editor Context: 分页编辑模型
//!
//! 以及共享的纯函数: 分页器、章节识别器

pub mod editor;
pub mod story;

mod chapter_detector;
mod pagination;

pub use chapter_detector::{
    detect_chapters, is_heading, ChapterDetectorConfig, DetectedChapter, PREAMBLE_TITLE,
};
pub use pagination::{split_pages, Page, DEFAULT_PAGE_SIZE};
