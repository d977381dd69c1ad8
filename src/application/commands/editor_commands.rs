//! Editor Commands - 编辑会话相关命令

use uuid::Uuid;

/// 打开编辑器命令 - 加载故事并创建会话
#[derive(Debug, Clone)]
pub struct OpenEditor {
    pub story_id: Uuid,
    pub author_id: String,
}

/// 编辑当前页命令
#[derive(Debug, Clone)]
pub struct EditPage {
    pub session_id: String,
    pub text: String,
}

/// 翻页命令
#[derive(Debug, Clone)]
pub struct GoToPage {
    pub session_id: String,
    pub page: usize,
}

/// 修改标题命令
#[derive(Debug, Clone)]
pub struct RenameStory {
    pub session_id: String,
    pub title: String,
}

/// 显式保存命令 - 失败时返回错误给用户
#[derive(Debug, Clone)]
pub struct SaveStory {
    pub session_id: String,
}

/// 关闭编辑器命令
#[derive(Debug, Clone)]
pub struct CloseEditor {
    pub session_id: String,
}
