use config::{Config, File};
use serde::Deserialize;

use super::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub ai: AiSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub chat: ChatSettings,
    pub queue: QueueSettings,
    pub staging: StagingSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Layer `appsettings.{env}` (optional) under `APP_`-prefixed
    /// environment variables. Sections are addressed with a double
    /// underscore so snake_case keys survive: `APP_AI__API_KEY`
    /// overrides `ai.api_key`.
    pub fn load(environment: Environment) -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str())).required(false),
            )
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiSettings {
    pub api_key: String,
    pub generation_model: String,
    pub embedding_model: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkingSettings {
    pub size: usize,
    pub overlap: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalSettings {
    /// Meeting-level search cutoff. Looser: whole-document embeddings are
    /// comparatively clean.
    pub search_threshold: f32,
    /// Chunk-level cutoff for chat retrieval. Tighter: chunk text is
    /// noisier.
    pub chunk_threshold: f32,
    pub top_k: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSettings {
    pub history_turns: usize,
    pub context_budget_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueSettings {
    pub visibility_timeout_secs: u64,
    pub max_attempts: u32,
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StagingSettings {
    pub dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}
