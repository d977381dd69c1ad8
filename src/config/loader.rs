//! Configuration Loader
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml / config.local.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "CRAFTER";

/// 编辑会话空闲过期时间上限（30 天）
const MAX_SESSION_IDLE_SECS: u64 = 30 * 24 * 3600;

/// 加载应用配置
///
/// # 环境变量示例
/// - `CRAFTER_SERVER__PORT=8080`
/// - `CRAFTER_GENERATION__URL=http://n8n:5678/webhook/novel-crafter`
/// - `CRAFTER_AUTOSAVE__DEBOUNCE_MS=1500`
/// - `CRAFTER_CHAPTERS__KEEP_PREAMBLE=true`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置，`None` 时搜索默认文件名
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("database.path", "data/crafter.db")?
        .set_default("database.max_connections", 5)?
        .set_default("editor.page_size", 1800)?
        .set_default("editor.session_idle_secs", 3600)?
        .set_default("editor.sweep_interval_secs", 60)?
        .set_default("autosave.debounce_ms", 800)?
        .set_default("chapters.keep_preamble", false)?
        .set_default("generation.url", "http://localhost:5678/webhook/novel-crafter")?
        .set_default("generation.timeout_secs", 900)?
        .set_default("storage.max_upload_size", 10 * 1024 * 1024)?
        .set_default("log.level", "info")?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 层级分隔符为双下划线: CRAFTER_EDITOR__PAGE_SIZE
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let app_config: AppConfig = builder.build()?.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    if config.editor.page_size == 0 {
        return Err(ConfigError::ValidationError(
            "Editor page size must be at least 1 character".to_string(),
        ));
    }

    if config.editor.session_idle_secs == 0
        || config.editor.session_idle_secs > MAX_SESSION_IDLE_SECS
    {
        return Err(ConfigError::ValidationError(format!(
            "Session idle timeout must be between 1 and {} seconds",
            MAX_SESSION_IDLE_SECS
        )));
    }

    if config.editor.sweep_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Session sweep interval cannot be 0".to_string(),
        ));
    }

    if config.autosave.debounce_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Autosave debounce cannot be 0".to_string(),
        ));
    }

    let url = config.generation.url.as_str();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "Generation URL must be http(s): {:?}",
            url
        )));
    }

    if config.generation.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Generation timeout cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Database Max Connections: {}", config.database.max_connections);
    tracing::info!("Page Size: {} chars", config.editor.page_size);
    tracing::info!("Session Idle Timeout: {}s", config.editor.session_idle_secs);
    tracing::info!("Autosave Debounce: {}ms", config.autosave.debounce_ms);
    tracing::info!("Keep Preamble: {}", config.chapters.keep_preamble);
    tracing::info!("Generation URL: {}", config.generation.url);
    tracing::info!("Generation Timeout: {}s", config.generation.timeout_secs);
    tracing::info!("Max Upload Size: {} bytes", config.storage.max_upload_size);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
