//! Worker Layer - Background Task Processing
//!
//! 实现 AutosaveWorker（防抖自动保存）和 SessionSweeper（空闲会话清理）

mod autosave;
mod session_sweeper;

pub use autosave::{AutosaveConfig, AutosaveScheduler, AutosaveWorker, DEFAULT_DEBOUNCE_MS};
pub use session_sweeper::{SessionSweeper, SessionSweeperConfig};
