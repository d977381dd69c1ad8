//! Extractor Adapter - 上传文件文本提取

mod file_text_extractor;

pub use file_text_extractor::*;
