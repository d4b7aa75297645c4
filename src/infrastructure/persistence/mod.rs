mod memory;
mod pg_chat_repository;
mod pg_chunk_repository;
mod pg_meeting_repository;
mod pg_pool;
mod pg_task_queue;

pub use memory::{
    InMemoryChatRepository, InMemoryChunkRepository, InMemoryMeetingRepository, InMemoryTaskQueue,
};
pub use pg_chat_repository::PgChatRepository;
pub use pg_chunk_repository::PgChunkRepository;
pub use pg_meeting_repository::PgMeetingRepository;
pub use pg_pool::create_pool;
pub use pg_task_queue::PgTaskQueue;
