mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    AiSettings, ChatSettings, ChunkingSettings, DatabaseSettings, LoggingSettings, QueueSettings,
    RetrievalSettings, ServerSettings, Settings, StagingSettings,
};
