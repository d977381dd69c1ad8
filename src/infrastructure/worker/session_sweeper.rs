//! Session Sweeper - 关闭长时间无活动的编辑会话

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::application::ports::{AutosavePort, EditorSessionManagerPort};
use crate::infrastructure::events::EventPublisher;

/// Sweeper 配置
#[derive(Debug, Clone)]
pub struct SessionSweeperConfig {
    /// 空闲多久后关闭会话
    pub idle_timeout_secs: u64,
    /// 扫描间隔
    pub interval: Duration,
}

impl Default for SessionSweeperConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 3600,
            interval: Duration::from_secs(60),
        }
    }
}

/// 空闲会话清理器
pub struct SessionSweeper {
    config: SessionSweeperConfig,
    session_manager: Arc<dyn EditorSessionManagerPort>,
    autosave: Arc<dyn AutosavePort>,
    event_publisher: Arc<EventPublisher>,
}

impl SessionSweeper {
    pub fn new(
        config: SessionSweeperConfig,
        session_manager: Arc<dyn EditorSessionManagerPort>,
        autosave: Arc<dyn AutosavePort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            config,
            session_manager,
            autosave,
            event_publisher,
        }
    }

    /// 启动清理循环，直到 token 被取消
    pub async fn run(self, token: CancellationToken) {
        tracing::info!(
            idle_timeout_secs = self.config.idle_timeout_secs,
            interval_secs = self.config.interval.as_secs(),
            "SessionSweeper started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    self.sweep();
                }
            }
        }

        tracing::info!("SessionSweeper stopped");
    }

    /// 执行一次清理，返回关闭的会话数
    ///
    /// 有待触发自动保存的会话不视为空闲
    pub fn sweep(&self) -> usize {
        let expired = self
            .session_manager
            .get_expired_sessions(self.config.idle_timeout_secs);

        let mut closed = 0;
        for session_id in expired {
            if self.autosave.is_pending(&session_id) {
                continue;
            }
            self.autosave.release(&session_id);
            if self.session_manager.close(&session_id).is_ok() {
                self.event_publisher
                    .publish_session_closed(&session_id, "idle_timeout");
                self.event_publisher.unregister_session(&session_id);
                closed += 1;
            }
        }

        if closed > 0 {
            tracing::info!(closed = closed, "Idle editor sessions closed");
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{EditorSession, StorySnapshot};
    use crate::domain::editor::PagedDocument;
    use crate::infrastructure::memory::InMemoryEditorSessionManager;
    use uuid::Uuid;

    struct NoopAutosave;

    impl AutosavePort for NoopAutosave {
        fn schedule(&self, _snapshot: StorySnapshot) {}
        fn cancel(&self, _session_id: &str) {}
        fn release(&self, _session_id: &str) {}
        fn is_pending(&self, _session_id: &str) -> bool {
            false
        }
    }

    fn session() -> EditorSession {
        EditorSession::new(
            Uuid::new_v4(),
            "alice",
            "Tale",
            "",
            "",
            PagedDocument::new("text", 1800),
        )
    }

    #[test]
    fn test_sweep_closes_idle_sessions_only() {
        let sessions = Arc::new(InMemoryEditorSessionManager::new());
        let publisher = Arc::new(EventPublisher::new());

        let mut idle = session();
        idle.last_activity = chrono::Utc::now() - chrono::Duration::seconds(7200);
        let idle_id = sessions.create(idle).unwrap();
        let active_id = sessions.create(session()).unwrap();
        let mut events = publisher.register_session(&idle_id);

        let sweeper = SessionSweeper::new(
            SessionSweeperConfig::default(),
            sessions.clone(),
            Arc::new(NoopAutosave),
            publisher,
        );

        assert_eq!(sweeper.sweep(), 1);
        assert!(!sessions.is_valid(&idle_id));
        assert!(sessions.is_valid(&active_id));
        assert!(events.try_recv().is_ok());
    }
}
