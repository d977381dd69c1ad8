//! File Text Extractor - 从上传文件提取纯文本
//!
//! - txt / md: 按 UTF-8 解码（去掉 BOM）
//! - docx: 解压 word/document.xml，按段落 `<w:p>` 拼接 `<w:t>` 文本
//! - pdf: 按页提取文本层（扫描件没有文本层，结果为空）

use std::io::{Cursor, Read};

use crate::application::ports::{DocumentFormat, ExtractError, TextExtractorPort};

/// 默认最大上传大小：10MB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const DOCX_BODY_PART: &str = "word/document.xml";

/// 文件文本提取器
#[derive(Debug, Clone)]
pub struct FileTextExtractor {
    max_bytes: usize,
}

impl FileTextExtractor {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    fn decode_text(bytes: &[u8]) -> Result<String, ExtractError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let text = std::str::from_utf8(bytes).map_err(|_| ExtractError::InvalidEncoding)?;
        Ok(text.replace("\r\n", "\n"))
    }

    fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractError::Malformed(format!("Not a docx archive: {}", e)))?;

        let mut xml = String::new();
        archive
            .by_name(DOCX_BODY_PART)
            .map_err(|_| ExtractError::Malformed(format!("Missing {}", DOCX_BODY_PART)))?
            .read_to_string(&mut xml)
            .map_err(|e| ExtractError::Malformed(e.to_string()))?;

        let doc = roxmltree::Document::parse(&xml)
            .map_err(|e| ExtractError::Malformed(format!("Invalid document XML: {}", e)))?;

        let paragraphs: Vec<String> = doc
            .descendants()
            .filter(|node| node.is_element() && node.tag_name().name() == "p")
            .map(|paragraph| paragraph_text(&paragraph))
            .collect();

        Ok(paragraphs.join("\n").trim().to_string())
    }

    fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
        // 解析器遇到部分损坏的文件会 panic
        let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
            .map_err(|_| ExtractError::Malformed("Unreadable PDF".to_string()))?
            .map_err(|e| ExtractError::Malformed(format!("Invalid PDF: {}", e)))?;

        let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
        Ok(lines.join("\n").trim().to_string())
    }
}

impl Default for FileTextExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

/// 段落内的 run 直接拼接（run 边界可能落在单词中间）
fn paragraph_text(paragraph: &roxmltree::Node) -> String {
    let mut text = String::new();
    for node in paragraph.descendants().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            "t" => {
                if let Some(t) = node.text() {
                    text.push_str(t);
                }
            }
            "tab" => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            _ => {}
        }
    }
    text
}

impl TextExtractorPort for FileTextExtractor {
    fn extract(&self, format: DocumentFormat, bytes: &[u8]) -> Result<String, ExtractError> {
        if bytes.len() > self.max_bytes {
            return Err(ExtractError::TooLarge {
                size: bytes.len(),
                max: self.max_bytes,
            });
        }

        let text = match format {
            DocumentFormat::PlainText | DocumentFormat::Markdown => Self::decode_text(bytes)?,
            DocumentFormat::Docx => Self::extract_docx(bytes)?,
            DocumentFormat::Pdf => Self::extract_pdf(bytes)?,
        };

        tracing::debug!(
            format = format.as_str(),
            size = bytes.len(),
            chars = text.chars().count(),
            "Text extracted"
        );

        Ok(text)
    }
}
