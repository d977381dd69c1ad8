//! Editor Queries

/// 获取编辑会话当前页查询
#[derive(Debug, Clone)]
pub struct GetEditorPage {
    pub session_id: String,
}
