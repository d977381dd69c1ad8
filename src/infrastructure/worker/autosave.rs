//! Autosave Worker - 防抖自动保存
//!
//! 每个编辑会话一个后台任务。修改通过 mpsc 通道到达，每次到达都会重置计时器；
//! 计时器触发时把最近一次快照刷写到存储。
//!
//! 同一会话同时最多只有一个刷写在进行：刷写在独立任务中执行，
//! 下一次触发会先等待上一次刷写结束。

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::application::flush::StoryFlusher;
use crate::application::ports::{AutosavePort, EditorSessionManagerPort, StorySnapshot};
use crate::infrastructure::events::EventPublisher;

/// 默认防抖时间
pub const DEFAULT_DEBOUNCE_MS: u64 = 800;

/// 自动保存配置
#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    /// 最后一次修改后的安静期
    pub debounce: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

enum AutosaveMessage {
    Mutation(StorySnapshot),
    Cancel,
}

/// 待保存状态：通道中尚未处理的修改数，以及 Worker 是否持有未触发的计时器
#[derive(Default)]
struct PendingState {
    queued: AtomicUsize,
    armed: AtomicBool,
}

impl PendingState {
    fn is_pending(&self) -> bool {
        self.queued.load(Ordering::SeqCst) > 0 || self.armed.load(Ordering::SeqCst)
    }
}

/// 刷写依赖
#[derive(Clone)]
struct FlushContext {
    flusher: Arc<StoryFlusher>,
    session_manager: Arc<dyn EditorSessionManagerPort>,
    event_publisher: Arc<EventPublisher>,
}

impl FlushContext {
    /// 刷写失败只记录日志并发布事件，不重试
    async fn flush(self, snapshot: StorySnapshot) {
        match self.flusher.flush(&snapshot).await {
            Ok(outcome) => {
                self.session_manager.mark_saved(
                    &snapshot.session_id,
                    outcome.saved_at,
                    &snapshot.content,
                );
                self.event_publisher.publish_autosave_completed(
                    &snapshot.session_id,
                    outcome.story_id,
                    outcome.saved_at,
                    outcome.chapter_count,
                );
                tracing::info!(
                    session_id = %snapshot.session_id,
                    story_id = %outcome.story_id,
                    chapter_count = outcome.chapter_count,
                    "Autosave completed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %snapshot.session_id,
                    story_id = %snapshot.story_id,
                    error = %e,
                    "Autosave failed, edits remain in memory"
                );
                self.event_publisher.publish_autosave_failed(
                    &snapshot.session_id,
                    snapshot.story_id,
                    &e.to_string(),
                );
            }
        }
    }
}

/// 单个会话的自动保存 Worker
pub struct AutosaveWorker {
    session_id: String,
    debounce: Duration,
    receiver: mpsc::UnboundedReceiver<AutosaveMessage>,
    token: CancellationToken,
    pending: Arc<PendingState>,
    context: FlushContext,
}

impl AutosaveWorker {
    /// 启动 Worker
    pub async fn run(mut self) {
        tracing::debug!(session_id = %self.session_id, "AutosaveWorker started");

        let mut latest: Option<StorySnapshot> = None;
        let mut deadline: Option<Instant> = None;
        let mut in_flight: Option<JoinHandle<()>> = None;

        loop {
            tokio::select! {
                biased;

                _ = self.token.cancelled() => break,

                message = self.receiver.recv() => match message {
                    Some(AutosaveMessage::Mutation(snapshot)) => {
                        // 先置 armed 再减 queued，两者不会同时为空
                        self.pending.armed.store(true, Ordering::SeqCst);
                        self.pending.queued.fetch_sub(1, Ordering::SeqCst);
                        latest = Some(snapshot);
                        deadline = Some(Instant::now() + self.debounce);
                    }
                    Some(AutosaveMessage::Cancel) => {
                        self.pending.armed.store(false, Ordering::SeqCst);
                        latest = None;
                        deadline = None;
                    }
                    None => break,
                },

                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;

                    if let Some(previous) = in_flight.take() {
                        if let Err(e) = previous.await {
                            tracing::error!(session_id = %self.session_id, error = %e, "Flush task panicked");
                        }
                    }

                    if let Some(snapshot) = latest.take() {
                        self.pending.armed.store(false, Ordering::SeqCst);
                        in_flight = Some(tokio::spawn(self.context.clone().flush(snapshot)));
                    }
                }
            }
        }

        if latest.is_some() {
            tracing::debug!(
                session_id = %self.session_id,
                "AutosaveWorker stopped with unsaved changes discarded"
            );
        }
        tracing::debug!(session_id = %self.session_id, "AutosaveWorker stopped");
    }
}

struct WorkerHandle {
    sender: mpsc::UnboundedSender<AutosaveMessage>,
    token: CancellationToken,
    pending: Arc<PendingState>,
}

/// 自动保存调度器
///
/// 按需为每个会话启动 AutosaveWorker，会话关闭时停止
pub struct AutosaveScheduler {
    config: AutosaveConfig,
    context: FlushContext,
    workers: DashMap<String, WorkerHandle>,
}

impl AutosaveScheduler {
    pub fn new(
        config: AutosaveConfig,
        flusher: Arc<StoryFlusher>,
        session_manager: Arc<dyn EditorSessionManagerPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            config,
            context: FlushContext {
                flusher,
                session_manager,
                event_publisher,
            },
            workers: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn spawn_worker(&self, session_id: &str) -> WorkerHandle {
        let (sender, receiver) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let pending = Arc::new(PendingState::default());

        let worker = AutosaveWorker {
            session_id: session_id.to_string(),
            debounce: self.config.debounce,
            receiver,
            token: token.clone(),
            pending: pending.clone(),
            context: self.context.clone(),
        };
        tokio::spawn(worker.run());

        WorkerHandle {
            sender,
            token,
            pending,
        }
    }

    /// 停止所有 Worker（服务关闭时调用）
    pub fn shutdown(&self) {
        for entry in self.workers.iter() {
            entry.token.cancel();
        }
        self.workers.clear();
    }

    /// 当前活跃的 Worker 数
    pub fn active_workers(&self) -> usize {
        self.workers.len()
    }
}

impl AutosavePort for AutosaveScheduler {
    fn schedule(&self, snapshot: StorySnapshot) {
        let session_id = snapshot.session_id.clone();
        let handle = self
            .workers
            .entry(session_id.clone())
            .or_insert_with(|| self.spawn_worker(&session_id));

        handle.pending.queued.fetch_add(1, Ordering::SeqCst);
        if handle
            .sender
            .send(AutosaveMessage::Mutation(snapshot))
            .is_err()
        {
            handle.pending.queued.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!(session_id = %session_id, "AutosaveWorker gone, mutation dropped");
        }
    }

    fn cancel(&self, session_id: &str) {
        if let Some(handle) = self.workers.get(session_id) {
            let _ = handle.sender.send(AutosaveMessage::Cancel);
        }
    }

    fn release(&self, session_id: &str) {
        if let Some((_, handle)) = self.workers.remove(session_id) {
            handle.token.cancel();
        }
    }

    fn is_pending(&self, session_id: &str) -> bool {
        self.workers
            .get(session_id)
            .map(|h| h.pending.is_pending())
            .unwrap_or(false)
    }
}
