//! 生成请求参数与续写规则

use super::{StoryError, Title};

/// 单次生成允许的最大章节数
pub const MAX_CHAPTERS: u32 = 50;

/// 单次生成允许的最大字数
pub const MAX_WORDS: u32 = 100_000;

/// 故事生成参数
///
/// 在调用外部生成服务之前完成所有校验
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryBrief {
    pub title: Title,
    pub genre: String,
    pub tone: String,
    pub prompt: String,
    pub chapters: u32,
    pub words: u32,
}

impl StoryBrief {
    pub fn new(
        title: &str,
        genre: &str,
        tone: &str,
        prompt: &str,
        chapters: u32,
        words: u32,
    ) -> Result<Self, StoryError> {
        let title = Title::new(title)?;

        let genre = genre.trim();
        if genre.is_empty() {
            return Err(StoryError::MissingField("genre"));
        }
        let tone = tone.trim();
        if tone.is_empty() {
            return Err(StoryError::MissingField("tone"));
        }
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(StoryError::InvalidPrompt("提示词不能为空".to_string()));
        }
        if chapters == 0 || chapters > MAX_CHAPTERS {
            return Err(StoryError::InvalidChapterCount(chapters));
        }
        if words == 0 || words > MAX_WORDS {
            return Err(StoryError::InvalidWordCount(words));
        }

        Ok(Self {
            title,
            genre: genre.to_string(),
            tone: tone.to_string(),
            prompt: prompt.to_string(),
            chapters,
            words,
        })
    }
}

/// 把续写文本接到正文末尾，中间空一行
pub fn append_continuation(content: &str, addition: &str) -> String {
    let head = content.trim_end();
    let tail = addition.trim();
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (false, true) => head.to_string(),
        (false, false) => format!("{}\n\n{}", head, tail),
    }
}
