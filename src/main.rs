//! AI Novel Crafter - 分页编辑 + 自动保存 + 外部生成
//!
//! - Domain: pagination, chapter detection, editor/, story/
//! - Application: commands, queries, ports, flush
//! - Infrastructure: http, memory, worker, persistence, adapters, events

use std::sync::Arc;
use std::time::Duration;

use novel_crafter::application::StoryFlusher;
use novel_crafter::config::{load_config, print_config};
use novel_crafter::domain::ChapterDetectorConfig;
use novel_crafter::infrastructure::adapters::{
    FileTextExtractor, HttpGenerationClient, HttpGenerationClientConfig,
};
use novel_crafter::infrastructure::events::EventPublisher;
use novel_crafter::infrastructure::http::{AppState, HttpServer, ServerConfig};
use novel_crafter::infrastructure::memory::InMemoryEditorSessionManager;
use novel_crafter::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteStoryStore,
};
use novel_crafter::infrastructure::worker::{
    AutosaveConfig, AutosaveScheduler, SessionSweeper, SessionSweeperConfig,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},novel_crafter={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("AI Novel Crafter");
    print_config(&config);

    // 确保数据目录存在
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    let store = Arc::new(SqliteStoryStore::new(pool));

    // 外部生成服务
    let generation_config = HttpGenerationClientConfig::new(&config.generation.url)
        .with_timeout(config.generation.timeout_secs);
    let generation = Arc::new(HttpGenerationClient::new(generation_config)?);

    let extractor = Arc::new(FileTextExtractor::new(config.storage.max_upload_size as usize));
    let event_publisher = Arc::new(EventPublisher::new());
    let session_manager = Arc::new(InMemoryEditorSessionManager::new());

    let flusher = Arc::new(StoryFlusher::new(
        store.clone(),
        ChapterDetectorConfig {
            keep_preamble: config.chapters.keep_preamble,
        },
    ));

    // 自动保存调度器（每个编辑会话一个防抖 Worker）
    let autosave = Arc::new(AutosaveScheduler::new(
        AutosaveConfig {
            debounce: Duration::from_millis(config.autosave.debounce_ms),
        },
        flusher.clone(),
        session_manager.clone(),
        event_publisher.clone(),
    ));

    // 空闲会话清理
    let shutdown_token = CancellationToken::new();
    let sweeper = SessionSweeper::new(
        SessionSweeperConfig {
            idle_timeout_secs: config.editor.session_idle_secs,
            interval: Duration::from_secs(config.editor.sweep_interval_secs),
        },
        session_manager.clone(),
        autosave.clone(),
        event_publisher.clone(),
    );
    tokio::spawn(sweeper.run(shutdown_token.clone()));

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port)
        .with_max_upload_size(config.storage.max_upload_size as usize);
    let state = AppState::new(
        store,
        session_manager,
        autosave.clone(),
        generation,
        extractor,
        event_publisher,
        flusher,
        config.editor.page_size,
    );

    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    // 停止后台任务，未到期的自动保存被丢弃
    shutdown_token.cancel();
    autosave.shutdown();

    tracing::info!("Server shutdown complete");

    Ok(())
}
