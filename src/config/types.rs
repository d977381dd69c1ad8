//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 编辑器配置
    #[serde(default)]
    pub editor: EditorConfig,

    /// 自动保存配置
    #[serde(default)]
    pub autosave: AutosaveConfig,

    /// 章节识别配置
    #[serde(default)]
    pub chapters: ChaptersConfig,

    /// 外部生成服务配置
    #[serde(default)]
    pub generation: GenerationConfig,

    /// 上传配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/crafter.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// 编辑器配置
#[derive(Debug, Clone, Deserialize)]
pub struct EditorConfig {
    /// 每页字符数
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// 编辑会话空闲过期时间（秒）
    #[serde(default = "default_session_idle")]
    pub session_idle_secs: u64,

    /// 过期会话扫描间隔（秒）
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_page_size() -> usize {
    1800
}

fn default_session_idle() -> u64 {
    3600
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            session_idle_secs: default_session_idle(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// 自动保存配置
#[derive(Debug, Clone, Deserialize)]
pub struct AutosaveConfig {
    /// 防抖窗口（毫秒）
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    800
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// 章节识别配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChaptersConfig {
    /// 第一个章节标题之前的内容是否保留为 Prologue 章节
    #[serde(default)]
    pub keep_preamble: bool,
}

/// 外部生成服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// webhook URL
    #[serde(default = "default_generation_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

fn default_generation_url() -> String {
    "http://localhost:5678/webhook/novel-crafter".to_string()
}

fn default_generation_timeout() -> u64 {
    900 // 15 分钟
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            url: default_generation_url(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

/// 上传配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 上传文件最大大小（字节），默认 10MB
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

fn default_max_upload_size() -> u64 {
    10 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_upload_size: default_max_upload_size(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
