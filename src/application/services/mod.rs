pub mod chunker;
pub mod ranking;

mod chat_service;
mod meeting_service;
mod processing_worker;

pub use chat_service::{assemble_context, ChatAnswer, ChatConfig, ChatError, ChatService};
pub use chunker::{chunk_text, ChunkWindow, ChunkerError, TranscriptChunker};
pub use meeting_service::{MeetingService, MeetingServiceError};
pub use processing_worker::{ProcessingWorker, WorkerConfig, WorkerError};
pub use ranking::{rank_by_similarity, Ranked};
