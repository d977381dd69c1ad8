//! Story Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoryError {
    #[error("无效的标题: {0}")]
    InvalidTitle(String),

    #[error("无效的提示词: {0}")]
    InvalidPrompt(String),

    #[error("无效的章节数: {0}")]
    InvalidChapterCount(u32),

    #[error("无效的字数: {0}")]
    InvalidWordCount(u32),

    #[error("缺少必填字段: {0}")]
    MissingField(&'static str),
}
