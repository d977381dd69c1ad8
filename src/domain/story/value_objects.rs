//! Story Context - Value Objects

use serde::{Deserialize, Serialize};

use super::StoryError;

/// 标题最大字符数
pub const MAX_TITLE_CHARS: usize = 200;

/// 故事标题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title(String);

impl Title {
    pub fn new(title: impl Into<String>) -> Result<Self, StoryError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(StoryError::InvalidTitle("标题不能为空".to_string()));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(StoryError::InvalidTitle(format!(
                "标题长度不能超过{}字符",
                MAX_TITLE_CHARS
            )));
        }
        Ok(Self(title))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Title {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
