//! Editor Context - 编辑器页面模型
//!
//! 职责:
//! - 全文缓冲区与分页视图
//! - 当前页编辑与翻页

mod document;

pub use document::PagedDocument;
