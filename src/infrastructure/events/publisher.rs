//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::application::ports::GenerationOperation;

/// WebSocket 事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum WsEvent {
    /// 自动保存完成（前端据此更新 lastSaved 显示）
    AutosaveCompleted {
        session_id: String,
        story_id: Uuid,
        saved_at: DateTime<Utc>,
        chapter_count: usize,
    },
    /// 自动保存失败（不重试）
    AutosaveFailed {
        session_id: String,
        story_id: Uuid,
        error: String,
    },
    /// 显式保存完成
    StorySaved {
        session_id: String,
        story_id: Uuid,
        saved_at: DateTime<Utc>,
        chapter_count: usize,
    },
    /// 正文被生成结果整体替换
    ContentReplaced {
        session_id: String,
        story_id: Uuid,
        total_pages: usize,
    },
    /// 会话关闭
    SessionClosed {
        session_id: String,
        reason: String,
    },
    /// 生成/润色/续写完成
    GenerationCompleted {
        operation: GenerationOperation,
        story_id: Uuid,
        title: String,
    },
    /// 生成/润色/续写失败
    GenerationFailed {
        operation: GenerationOperation,
        #[serde(skip_serializing_if = "Option::is_none")]
        story_id: Option<Uuid>,
        error: String,
    },
    /// 故事删除完成
    StoryDeleted {
        story_id: Uuid,
    },
}

/// 事件发布器
pub struct EventPublisher {
    /// session_id -> broadcast sender (for editor-session events)
    session_channels: DashMap<String, broadcast::Sender<WsEvent>>,
    /// Global broadcast channel for story events (generation, deletion)
    global_channel: broadcast::Sender<WsEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(100);
        Self {
            session_channels: DashMap::new(),
            global_channel: global_tx,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅全局事件
    pub fn subscribe_global(&self) -> broadcast::Receiver<WsEvent> {
        self.global_channel.subscribe()
    }

    /// 注册会话的事件通道
    pub fn register_session(&self, session_id: &str) -> broadcast::Receiver<WsEvent> {
        if let Some(sender) = self.session_channels.get(session_id) {
            return sender.subscribe();
        }

        let (tx, rx) = broadcast::channel(100);
        self.session_channels.insert(session_id.to_string(), tx);
        rx
    }

    /// 取消注册会话
    pub fn unregister_session(&self, session_id: &str) {
        self.session_channels.remove(session_id);
    }

    /// 获取会话的事件接收器
    pub fn subscribe(&self, session_id: &str) -> Option<broadcast::Receiver<WsEvent>> {
        self.session_channels.get(session_id).map(|s| s.subscribe())
    }

    /// 发布自动保存完成事件
    pub fn publish_autosave_completed(
        &self,
        session_id: &str,
        story_id: Uuid,
        saved_at: DateTime<Utc>,
        chapter_count: usize,
    ) {
        self.publish_to_session(
            session_id,
            WsEvent::AutosaveCompleted {
                session_id: session_id.to_string(),
                story_id,
                saved_at,
                chapter_count,
            },
        );
    }

    /// 发布自动保存失败事件
    pub fn publish_autosave_failed(&self, session_id: &str, story_id: Uuid, error: &str) {
        self.publish_to_session(
            session_id,
            WsEvent::AutosaveFailed {
                session_id: session_id.to_string(),
                story_id,
                error: error.to_string(),
            },
        );
    }

    /// 发布显式保存完成事件
    pub fn publish_story_saved(
        &self,
        session_id: &str,
        story_id: Uuid,
        saved_at: DateTime<Utc>,
        chapter_count: usize,
    ) {
        self.publish_to_session(
            session_id,
            WsEvent::StorySaved {
                session_id: session_id.to_string(),
                story_id,
                saved_at,
                chapter_count,
            },
        );
    }

    /// 发布正文替换事件
    pub fn publish_content_replaced(&self, session_id: &str, story_id: Uuid, total_pages: usize) {
        self.publish_to_session(
            session_id,
            WsEvent::ContentReplaced {
                session_id: session_id.to_string(),
                story_id,
                total_pages,
            },
        );
    }

    /// 发布会话关闭事件
    pub fn publish_session_closed(&self, session_id: &str, reason: &str) {
        self.publish_to_session(
            session_id,
            WsEvent::SessionClosed {
                session_id: session_id.to_string(),
                reason: reason.to_string(),
            },
        );
    }

    /// 发布生成完成事件（全局广播）
    pub fn publish_generation_completed(
        &self,
        operation: GenerationOperation,
        story_id: Uuid,
        title: &str,
    ) {
        self.publish_global(WsEvent::GenerationCompleted {
            operation,
            story_id,
            title: title.to_string(),
        });
    }

    /// 发布生成失败事件（全局广播）
    pub fn publish_generation_failed(
        &self,
        operation: GenerationOperation,
        story_id: Option<Uuid>,
        error: &str,
    ) {
        self.publish_global(WsEvent::GenerationFailed {
            operation,
            story_id,
            error: error.to_string(),
        });
    }

    /// 发布故事删除完成事件（全局广播）
    pub fn publish_story_deleted(&self, story_id: Uuid) {
        self.publish_global(WsEvent::StoryDeleted { story_id });
    }

    fn publish_global(&self, event: WsEvent) {
        if let Err(e) = self.global_channel.send(event) {
            tracing::debug!(error = %e, "Failed to publish global event (no receivers)");
        }
    }

    /// 发布事件到指定会话
    fn publish_to_session(&self, session_id: &str, event: WsEvent) {
        if let Some(sender) = self.session_channels.get(session_id) {
            if let Err(e) = sender.send(event) {
                tracing::debug!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to publish event (no receivers)"
                );
            }
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
