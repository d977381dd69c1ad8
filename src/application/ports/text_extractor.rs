//! Text Extractor Port - 上传文件文本提取
//!
//! 定义从上传文件中提取纯文本的抽象接口

use thiserror::Error;

/// 文本提取错误
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("File is not valid UTF-8 text")]
    InvalidEncoding,

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("File too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },
}

/// 支持的上传格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Markdown,
    Docx,
    Pdf,
}

impl DocumentFormat {
    /// 根据文件名后缀或 content-type 判断格式
    pub fn detect(filename: Option<&str>, content_type: Option<&str>) -> Option<Self> {
        let extension = filename
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("txt") => return Some(Self::PlainText),
            Some("md") | Some("markdown") => return Some(Self::Markdown),
            Some("docx") => return Some(Self::Docx),
            Some("pdf") => return Some(Self::Pdf),
            _ => {}
        }

        match content_type? {
            "text/plain" => Some(Self::PlainText),
            "text/markdown" => Some(Self::Markdown),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Docx)
            }
            "application/pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::PlainText => "txt",
            DocumentFormat::Markdown => "md",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Pdf => "pdf",
        }
    }
}

/// Text Extractor Port
pub trait TextExtractorPort: Send + Sync {
    /// 从文件字节中提取纯文本
    fn extract(&self, format: DocumentFormat, bytes: &[u8]) -> Result<String, ExtractError>;
}
