mod ai_gateway;
mod chat_repository;
mod chunk_repository;
mod meeting_repository;
mod repository_error;
mod staging_store;
mod task_queue;

pub use ai_gateway::{AiGateway, AiGatewayError, AudioAnalysis};
pub use chat_repository::ChatRepository;
pub use chunk_repository::ChunkRepository;
pub use meeting_repository::MeetingRepository;
pub use repository_error::RepositoryError;
pub use staging_store::{StagingStore, StagingStoreError};
pub use task_queue::{
    LeasedTask, QueueTaskStatus, TaskDisposition, TaskQueue, TaskQueueError, TaskState,
};
