//! 章节识别器
//!
//! 逐行扫描全文，按标题行启发式规则划分章节

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 前言章节标题（仅在 keep_preamble 开启时使用）
pub const PREAMBLE_TITLE: &str = "Prologue";

static CHAPTER_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(CHAPTER|Chapter)\s+\d+").unwrap());
static CHAPTER_COLON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^Chapter\s+\d+:").unwrap());
static NUMBERED_HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s+[A-Z]").unwrap());
static ALL_CAPS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][A-Z\s]+$").unwrap());

/// 章节识别配置
#[derive(Debug, Clone, Default)]
pub struct ChapterDetectorConfig {
    /// 是否保留第一个标题之前的内容（作为 Prologue 章节）
    pub keep_preamble: bool,
}

/// 识别出的章节
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedChapter {
    pub title: String,
    pub content: String,
    /// 从 1 开始递增
    pub chapter_number: u32,
}

/// 判断一行（已去除首尾空白）是否为章节标题
pub fn is_heading(line: &str) -> bool {
    CHAPTER_NUMBER_RE.is_match(line)
        || CHAPTER_COLON_RE.is_match(line)
        || NUMBERED_HEADING_RE.is_match(line)
        || ALL_CAPS_RE.is_match(line)
}

/// 识别章节
///
/// 没有标题行时返回空列表。默认丢弃第一个标题之前的内容。
pub fn detect_chapters(buffer: &str, config: &ChapterDetectorConfig) -> Vec<DetectedChapter> {
    let mut chapters: Vec<DetectedChapter> = Vec::new();
    let mut preamble: Vec<&str> = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in buffer.lines() {
        let trimmed = line.trim();

        if is_heading(trimmed) {
            if let Some((title, lines)) = current.take() {
                push_chapter(&mut chapters, title, &lines);
            }
            current = Some((trimmed.to_string(), Vec::new()));
            continue;
        }

        match current.as_mut() {
            Some((_, lines)) => lines.push(line),
            None => preamble.push(line),
        }
    }

    if let Some((title, lines)) = current.take() {
        push_chapter(&mut chapters, title, &lines);
    }

    let preamble_text = preamble.join("\n");
    let preamble_text = preamble_text.trim();
    if !preamble_text.is_empty() && !chapters.is_empty() {
        if config.keep_preamble {
            chapters.insert(
                0,
                DetectedChapter {
                    title: PREAMBLE_TITLE.to_string(),
                    content: preamble_text.to_string(),
                    chapter_number: 0,
                },
            );
            for (index, chapter) in chapters.iter_mut().enumerate() {
                chapter.chapter_number = index as u32 + 1;
            }
        } else {
            tracing::debug!(
                discarded_lines = preamble.len(),
                "Content before first chapter heading discarded"
            );
        }
    }

    chapters
}

fn push_chapter(chapters: &mut Vec<DetectedChapter>, title: String, lines: &[&str]) {
    let chapter_number = chapters.len() as u32 + 1;
    chapters.push(DetectedChapter {
        title,
        content: lines.join("\n").trim().to_string(),
        chapter_number,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(buffer: &str) -> Vec<DetectedChapter> {
        detect_chapters(buffer, &ChapterDetectorConfig::default())
    }

    #[test]
    fn test_two_chapter_scenario() {
        let chapters = detect("CHAPTER 1: A\nhello\nCHAPTER 2: B\nworld");

        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "CHAPTER 1: A");
        assert_eq!(chapters[0].content, "hello");
        assert_eq!(chapters[0].chapter_number, 1);
        assert_eq!(chapters[1].title, "CHAPTER 2: B");
        assert_eq!(chapters[1].content, "world");
        assert_eq!(chapters[1].chapter_number, 2);
    }

    #[test]
    fn test_no_headings_yields_no_chapters() {
        let chapters = detect("once upon a time\nthere was a story\nthe end.");
        assert!(chapters.is_empty());
        assert!(detect("").is_empty());
    }

    #[test]
    fn test_heading_patterns() {
        assert!(is_heading("Chapter 3"));
        assert!(is_heading("CHAPTER 12 The Storm"));
        assert!(is_heading("chapter 4: lowercase"));
        assert!(is_heading("1. Beginnings"));
        assert!(is_heading("THE LONG NIGHT"));

        assert!(!is_heading("chapter four"));
        assert!(!is_heading("1. lowercase start"));
        assert!(!is_heading("The long night"));
        assert!(!is_heading("I"));
        assert!(!is_heading(""));
    }

    #[test]
    fn test_n_headings_produce_n_numbered_chapters() {
        let buffer = "Chapter 1\nalpha\n2. Second\nbeta\nTHE THIRD\ngamma\nchapter 4: fourth\ndelta";
        let chapters = detect(buffer);

        assert_eq!(chapters.len(), 4);
        for (index, chapter) in chapters.iter().enumerate() {
            assert_eq!(chapter.chapter_number, index as u32 + 1);
            assert!(!chapter.content.is_empty());
        }
        assert_eq!(chapters[3].content, "delta");
    }

    #[test]
    fn test_multiline_content_is_trimmed() {
        let chapters = detect("Chapter 1\n\n  first line\nsecond line\n\n");
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].content, "first line\nsecond line");
    }

    #[test]
    fn test_preamble_discarded_by_default() {
        let chapters = detect("Foreword text\nChapter 1\nbody");
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Chapter 1");
    }

    #[test]
    fn test_preamble_kept_when_configured() {
        let config = ChapterDetectorConfig {
            keep_preamble: true,
        };
        let chapters = detect_chapters("Foreword text\nChapter 1\nbody", &config);

        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, PREAMBLE_TITLE);
        assert_eq!(chapters[0].content, "Foreword text");
        assert_eq!(chapters[0].chapter_number, 1);
        assert_eq!(chapters[1].chapter_number, 2);
    }

    #[test]
    fn test_keep_preamble_without_headings_still_empty() {
        let config = ChapterDetectorConfig {
            keep_preamble: true,
        };
        assert!(detect_chapters("just prose", &config).is_empty());
    }
}
