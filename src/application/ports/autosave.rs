//! Autosave Port - 防抖自动保存
//!
//! 每次修改都会（重新）启动防抖计时器，安静期结束后刷写一次

use uuid::Uuid;

/// 待刷写的编辑状态快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorySnapshot {
    pub session_id: String,
    pub story_id: Uuid,
    pub title: String,
    pub genre: String,
    pub tone: String,
    pub content: String,
}

/// Autosave Port
pub trait AutosavePort: Send + Sync {
    /// 记录一次修改，（重新）启动该会话的防抖计时器
    fn schedule(&self, snapshot: StorySnapshot);

    /// 取消会话尚未触发的刷写（进行中的刷写不会被中断）
    fn cancel(&self, session_id: &str);

    /// 停止会话的自动保存（会话关闭时调用），未触发的修改被丢弃
    fn release(&self, session_id: &str);

    /// 会话是否有尚未触发的刷写
    fn is_pending(&self, session_id: &str) -> bool;
}
