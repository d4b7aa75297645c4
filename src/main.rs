use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use minutes::application::ports::{
    AiGateway, ChatRepository, ChunkRepository, MeetingRepository, StagingStore, TaskQueue,
};
use minutes::application::services::{
    ChatConfig, ChatService, MeetingService, ProcessingWorker, WorkerConfig,
};
use minutes::infrastructure::ai::GeminiGateway;
use minutes::infrastructure::observability::{init_tracing, TracingConfig};
use minutes::infrastructure::persistence::{
    create_pool, PgChatRepository, PgChunkRepository, PgMeetingRepository, PgTaskQueue,
};
use minutes::infrastructure::storage::LocalStagingStore;
use minutes::presentation::config::{Environment, Settings};
use minutes::presentation::state::AppState;
use minutes::presentation::create_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".to_string())
        .try_into()
        .map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("failed to load settings")?;

    init_tracing(
        TracingConfig::new(
            environment.to_string(),
            settings.logging.level.clone(),
            settings.logging.enable_json,
        ),
        settings.server.port,
    );

    let pool = create_pool(&settings.database.url, settings.database.max_connections)
        .await
        .context("failed to connect to PostgreSQL")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let meetings: Arc<dyn MeetingRepository> = Arc::new(PgMeetingRepository::new(pool.clone()));
    let chunks: Arc<dyn ChunkRepository> = Arc::new(PgChunkRepository::new(pool.clone()));
    let chat: Arc<dyn ChatRepository> = Arc::new(PgChatRepository::new(pool.clone()));
    let queue: Arc<dyn TaskQueue> =
        Arc::new(PgTaskQueue::new(pool.clone(), settings.queue.max_attempts));

    let staging: Arc<dyn StagingStore> = Arc::new(
        LocalStagingStore::new(PathBuf::from(&settings.staging.dir))
            .context("failed to initialize staging store")?,
    );

    let gateway: Arc<dyn AiGateway> = Arc::new(
        GeminiGateway::new(
            settings.ai.api_key.clone(),
            settings.ai.generation_model.clone(),
            settings.ai.embedding_model.clone(),
            Duration::from_secs(settings.ai.request_timeout_secs),
        )
        .context("failed to build AI gateway")?,
    );

    let worker = ProcessingWorker::new(
        queue.clone(),
        gateway.clone(),
        meetings.clone(),
        chunks.clone(),
        staging.clone(),
        WorkerConfig {
            chunk_size: settings.chunking.size,
            chunk_overlap: settings.chunking.overlap,
            visibility: Duration::from_secs(settings.queue.visibility_timeout_secs),
            poll_interval: Duration::from_secs(settings.queue.poll_interval_secs),
            ..WorkerConfig::default()
        },
    )
    .context("invalid chunking configuration")?;
    tokio::spawn(worker.run());

    let meeting_service = Arc::new(MeetingService::new(
        meetings.clone(),
        queue.clone(),
        staging,
        gateway.clone(),
        settings.retrieval.search_threshold,
    ));
    let chat_service = Arc::new(ChatService::new(
        gateway,
        meetings,
        chunks,
        chat,
        ChatConfig {
            top_k: settings.retrieval.top_k,
            chunk_threshold: settings.retrieval.chunk_threshold,
            history_turns: settings.chat.history_turns,
            context_budget_chars: settings.chat.context_budget_chars,
        },
    ));

    let state = AppState {
        meeting_service,
        chat_service,
        task_queue: queue,
    };
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("invalid server address")?;
    tracing::info!(address = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind server address")?;
    axum::serve(listener, router)
        .await
        .context("server error")?;

    Ok(())
}
