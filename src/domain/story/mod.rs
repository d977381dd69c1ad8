//! Story Context - 故事限界上下文
//!
//! 职责:
//! - 标题等值对象校验
//! - 生成请求参数（brief）校验
//! - 续写文本拼接规则

mod brief;
mod errors;
mod value_objects;

pub use brief::{append_continuation, StoryBrief, MAX_CHAPTERS, MAX_WORDS};
pub use errors::StoryError;
pub use value_objects::{Title, MAX_TITLE_CHARS};
