mod chat_message;
mod chunk;
mod embedding;
mod meeting;
mod meeting_status;
mod storage_path;
mod summary;
mod task;

pub use chat_message::{ChatMessage, MessageId, MessageRole, SourceRef};
pub use chunk::{Chunk, ChunkId};
pub use embedding::Embedding;
pub use meeting::{Meeting, MeetingId};
pub use meeting_status::MeetingStatus;
pub use storage_path::StoragePath;
pub use summary::{Sentiment, Summary};
pub use task::{ProcessingTask, TaskId};
